use quarry::collection::{AccessPath, FindOptions};
use quarry::common::{SortOrder, Value};
use quarry::doc;
use quarry::errors::ErrorKind;
use quarry::filter::{field, Filter};
use quarry::index::IndexDescriptor;
use quarry_int_test::test_util::{
    cleanup, create_test_context, create_uncached_test_context, insert_books, random_docs,
    run_test,
};

fn equivalence_filters() -> Vec<Filter> {
    let specs = vec![
        doc! { a: 2 },
        doc! { a: { "$gt": 1 } },
        doc! { a: { "$lte": 3 }, color: "red" },
        doc! { color: "blue", a: 4 },
        doc! { color: "green", b: { "$gte": 4.5 } },
        doc! { color: "red", a: 1, b: { "$lt": 6 } },
        doc! { b: null },
        doc! { tags: 2 },
        doc! { tags: { "$gt": 1 } },
        doc! { a: { "$in": [0, 4] } },
        doc! { "$or": [{ a: 0 }, { color: "blue" }] },
        doc! { a: { "$ne": 2 }, color: { "$nin": ["red"] } },
    ];
    specs
        .iter()
        .map(|spec| Filter::from_spec(spec).unwrap())
        .collect()
}

#[test]
fn test_index_and_scan_agree() {
    run_test(
        create_uncached_test_context,
        |ctx| {
            let documents = random_docs(42, 120);
            let scanned = ctx.db().collection("scanned")?;
            let indexed = ctx.db().collection("indexed")?;
            scanned.insert_many(documents.clone())?;
            indexed.insert_many(documents)?;

            indexed.create_index_from_spec(&doc! { a: 1 })?;
            indexed.create_index_from_spec(&doc! { color: 1, a: -1 })?;
            indexed.create_index_from_spec(&doc! { color: 1, b: 1 })?;
            indexed.create_index_from_spec(&doc! { tags: 1 })?;

            let mut index_scans = 0;
            for filter in equivalence_filters() {
                let mut expected = scanned.find(filter.clone())?.to_vec()?;
                let mut actual = indexed.find(filter.clone())?.to_vec()?;
                expected.sort_by_key(|d| d.id());
                actual.sort_by_key(|d| d.id());
                assert_eq!(actual, expected, "filter {}", filter);

                let plan = indexed.explain(filter, &FindOptions::new())?;
                if matches!(plan.plan().access_path(), AccessPath::IndexScan(_)) {
                    index_scans += 1;
                }
            }
            assert!(index_scans >= 7);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_maintained_through_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let documents = random_docs(5, 50);
            let scanned = ctx.db().collection("scanned")?;
            let indexed = ctx.db().collection("indexed")?;
            indexed.create_index_from_spec(&doc! { a: 1, b: -1 })?;
            scanned.insert_many(documents.clone())?;
            indexed.insert_many(documents)?;

            for collection in [&scanned, &indexed] {
                collection.update(field("color").eq("red"), &doc! { "$inc": { a: 10 } })?;
                collection.update(field("a").eq(3), &doc! { "$unset": { b: 1 } })?;
                collection.remove(field("color").eq("green").and(field("a").lt(2)), false)?;
            }

            for filter in [
                field("a").eq(3),
                field("a").gte(10),
                field("a").eq(12).and(field("b").lt(5.0)),
                field("b").eq(Value::Null),
            ] {
                let expected = scanned.find(filter.clone())?.to_vec()?;
                let actual = indexed.find(filter.clone())?.to_vec()?;
                assert_eq!(actual.len(), expected.len(), "filter {}", filter);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explain_books() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;
            let filter = Filter::from_spec(&doc! { author: "Jane Austen", published_year: { "$gt": 1816 } })?;

            let scan = books.explain(filter.clone(), &FindOptions::new())?;
            let scan_doc = scan.to_document();
            assert_eq!(scan_doc.get("stage"), Some(&Value::from("COLLSCAN")));
            assert_eq!(scan_doc.get("docsExamined"), Some(&Value::I64(8)));
            assert_eq!(scan_doc.get("nReturned"), Some(&Value::I64(1)));

            books.create_index_from_spec(&doc! { author: 1, published_year: -1 })?;
            let indexed = books.explain(filter, &FindOptions::new())?;
            let indexed_doc = indexed.to_document();
            assert_eq!(indexed_doc.get("stage"), Some(&Value::from("IXSCAN")));
            assert_eq!(
                indexed_doc.get("index"),
                Some(&Value::from(doc! { author: 1, published_year: -1 }))
            );
            assert_eq!(indexed_doc.get("docsExamined"), Some(&Value::I64(1)));
            assert_eq!(indexed_doc.get("nReturned"), Some(&Value::I64(1)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_planner_prefers_longest_prefix() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;
            let genre = IndexDescriptor::on_field("genre")?;
            let genre_year = IndexDescriptor::new(vec![
                ("genre".to_string(), SortOrder::Ascending),
                ("published_year".to_string(), SortOrder::Ascending),
            ])?;
            books.create_index(genre.clone())?;
            books.create_index(genre_year.clone())?;

            let plan_for = |spec: quarry::collection::Document| -> quarry::errors::QuarryResult<Option<IndexDescriptor>> {
                let explanation = books.explain(Filter::from_spec(&spec)?, &FindOptions::new())?;
                Ok(match explanation.plan().access_path() {
                    AccessPath::IndexScan(scan) => Some(scan.descriptor().clone()),
                    _ => None,
                })
            };

            assert_eq!(plan_for(doc! { genre: "Sci-Fi" })?, Some(genre.clone()));
            assert_eq!(
                plan_for(doc! { genre: "Sci-Fi", published_year: { "$gte": 1965 } })?,
                Some(genre_year.clone())
            );
            assert_eq!(plan_for(doc! { published_year: 1965 })?, None);

            books.drop_index(&genre_year)?;
            assert_eq!(
                plan_for(doc! { genre: "Sci-Fi", published_year: { "$gte": 1965 } })?,
                Some(genre)
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_management() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            books.create_index_from_spec(&doc! { price: 1 })?;
            books.create_index_from_spec(&doc! { price: 1 })?;
            books.create_index_from_spec(&doc! { genre: -1, price: 1 })?;
            assert_eq!(books.list_indexes()?.len(), 2);

            let price = IndexDescriptor::from_spec(&doc! { price: 1 })?;
            assert!(books.has_index(&price)?);
            books.drop_index(&price)?;
            books.drop_index(&price)?;
            assert!(!books.has_index(&price)?);

            books.drop_all_indexes()?;
            assert!(books.list_indexes()?.is_empty());
            assert_eq!(books.count(field("price").gt(10))?, 4);

            for spec in [doc! {}, doc! { price: 2 }, doc! { price: "asc" }] {
                let err = books.create_index_from_spec(&spec).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidSpecification);
            }
            Ok(())
        },
        cleanup,
    )
}
