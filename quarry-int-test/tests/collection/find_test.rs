use icu_collator::options::CollatorOptions;
use quarry::collection::{limit_to, order_by, skip_by, FindOptions};
use quarry::common::{InterruptHandle, SortOrder, Value};
use quarry::doc;
use quarry::errors::ErrorKind;
use quarry::filter::{all, and, by_id, field, or, Filter};
use quarry_int_test::test_util::{
    book_docs, cleanup, create_test_context, insert_books, is_sorted, random_docs, run_test,
    titles,
};

#[test]
fn test_books_scenario() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let filter = Filter::from_spec(&doc! { genre: "Sci-Fi", published_year: { "$lt": 1970 } })?;
            let options = FindOptions::new()
                .sort_spec(&doc! { published_year: -1 })?
                .limit(2)
                .project(&doc! { _id: 0, title: 1, published_year: 1 })?;

            let found = books.find_with_options(filter, &options)?.to_vec()?;
            assert_eq!(
                found,
                vec![
                    doc! { title: "Ubik", published_year: 1969 },
                    doc! { title: "Dune", published_year: 1965 },
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_all_in_insertion_order() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let found = books.find(all())?.to_vec()?;
            assert_eq!(titles(&found), titles(&book_docs()));
            assert!(found.iter().all(|doc| doc.id().is_some()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_logical_filters() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            assert_eq!(books.count(field("price").gt(10))?, 4);
            assert_eq!(books.count(field("price").gte(10))?, 5);
            assert_eq!(
                books.count(field("genre").eq("Fiction").and(field("price").lt(7)))?,
                1
            );
            assert_eq!(
                books.count(or(vec![field("stock").eq(0), field("author").eq("Jane Austen")]))?,
                3
            );
            assert_eq!(
                books.count(and(vec![
                    field("genre").ne("Sci-Fi"),
                    field("tags").in_array(vec!["classic"]),
                ]))?,
                3
            );
            assert_eq!(books.count(field("tags").exists(false))?, 1);

            let spec = doc! { "$nor": [{ genre: "Sci-Fi" }, { stock: { "$lte": 3 } }] };
            assert_eq!(books.count(Filter::from_spec(&spec)?)?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_multikey_and_regex() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            assert_eq!(books.count(field("tags").eq("classic"))?, 4);
            assert_eq!(books.count(field("tags").eq(Value::Array(vec![])))?, 1);
            assert_eq!(books.count(field("title").regex("^The ")?)?, 1);
            assert_eq!(
                books.count(Filter::from_spec(&doc! { author: { "$regex": "austen", "$options": "i" } })?)?,
                2
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_filter_specs() {
    run_test(
        create_test_context,
        |_ctx| {
            let invalid = vec![
                doc! { price: { "$foo": 1 } },
                doc! { price: { "$gt": 1, amount: 2 } },
                doc! { price: { "$in": 1 } },
                doc! { price: { "$exists": 1 } },
                doc! { title: { "$regex": "(" } },
            ];
            for spec in invalid {
                let err = Filter::from_spec(&spec).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidSpecification);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_skip_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let found = books
                .find_with_options(all(), &order_by("price", SortOrder::Descending))?
                .to_vec()?;
            assert!(is_sorted(&found, "price", SortOrder::Descending));

            let page = books
                .find_with_options(all(), &order_by("price", SortOrder::Ascending).skip(2).limit(3))?
                .to_vec()?;
            assert_eq!(titles(&page), vec!["Dune", "The Hobbit", "Ubik"]);

            assert_eq!(books.find_with_options(all(), &skip_by(6))?.size()?, 2);
            assert_eq!(books.find_with_options(all(), &skip_by(100))?.size()?, 0);
            assert_eq!(books.find_with_options(all(), &limit_to(0))?.size()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pages_slice_the_full_sort() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("random")?;
            collection.insert_many(random_docs(7, 60))?;
            let filter = field("a").gte(1);

            let sorted = || FindOptions::new().sort_spec(&doc! { b: 1, color: -1 });
            let everything = collection.find_with_options(filter.clone(), &sorted()?)?.to_vec()?;

            for (skip, limit) in [(0, 5), (3, 7), (10, 100), (50, 1), (100, 3)] {
                let page = collection
                    .find_with_options(filter.clone(), &sorted()?.skip(skip).limit(limit))?
                    .to_vec()?;
                let expected: Vec<_> = everything
                    .iter()
                    .skip(skip as usize)
                    .take(limit as usize)
                    .cloned()
                    .collect();
                assert_eq!(page, expected, "skip {} limit {}", skip, limit);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_ties_and_missing_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("ties")?;
            collection.insert_many(vec![
                doc! { n: "first", rank: 2 },
                doc! { n: "second" },
                doc! { n: "third", rank: 1 },
                doc! { n: "fourth", rank: 2 },
                doc! { n: "fifth", rank: null },
            ])?;

            let names: Vec<Value> = collection
                .find_with_options(all(), &order_by("rank", SortOrder::Ascending))?
                .map(|doc| doc.map(|d| d.get_or_null("n")))
                .collect::<Result<_, _>>()?;
            assert_eq!(
                names,
                vec![
                    Value::from("second"),
                    Value::from("fifth"),
                    Value::from("third"),
                    Value::from("first"),
                    Value::from("fourth"),
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_projection() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;
            let dune = field("title").eq("Dune");

            let included = books
                .find_with_options(dune.clone(), &FindOptions::new().project(&doc! { stock: 1, title: 1 })?)?
                .first()?
                .unwrap();
            let keys: Vec<&String> = included.keys().collect();
            assert_eq!(keys, vec!["_id", "title", "stock"]);

            let excluded = books
                .find_with_options(dune, &FindOptions::new().project(&doc! { tags: 0, _id: 0 })?)?
                .first()?
                .unwrap();
            assert!(!excluded.contains_key("tags"));
            assert!(!excluded.contains_key("_id"));
            assert_eq!(excluded.size(), 6);

            let err = FindOptions::new().project(&doc! { title: 1, price: 0 }).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidSpecification);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_get_by_id() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            let result = insert_books(&books)?;
            let ids = result.affected_record_ids();

            let emma = books.get_by_id(&ids[1])?.unwrap();
            assert_eq!(emma.get("title"), Some(&Value::from("Emma")));

            let by_filter = books.find(by_id(ids[1]))?.to_vec()?;
            assert_eq!(by_filter, vec![emma]);

            let first = books.find_one(field("genre").eq("Sci-Fi"))?.unwrap();
            assert_eq!(first.get("title"), Some(&Value::from("Dune")));
            assert!(books.find_one(field("genre").eq("Poetry"))?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collation() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("fruits")?;
            collection.insert_many(vec![
                doc! { fruit: "Ôrange" },
                doc! { fruit: "Zucchini" },
                doc! { fruit: "Apple" },
            ])?;

            let plain = collection
                .find_with_options(all(), &order_by("fruit", SortOrder::Ascending))?
                .to_vec()?;
            assert_eq!(plain[2].get("fruit"), Some(&Value::from("Ôrange")));

            let options =
                order_by("fruit", SortOrder::Ascending).collator_options(CollatorOptions::default());
            let collated = collection.find_with_options(all(), &options)?.to_vec()?;
            assert_eq!(collated[1].get("fruit"), Some(&Value::from("Ôrange")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_interrupted_scan() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let handle = InterruptHandle::new();
            let options = FindOptions::new().interrupt_handle(handle.clone());
            let mut cursor = books.find_with_options(all(), &options)?;
            assert!(cursor.next().unwrap().is_ok());

            handle.interrupt();
            let err = cursor.next().unwrap().err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::Interrupted);
            assert_eq!(books.size()?, book_docs().len());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_matches_is_deterministic() {
    run_test(
        create_test_context,
        |_ctx| {
            let filters = vec![
                Filter::from_spec(&doc! { a: { "$in": [1, 3] }, b: { "$gte": 2.5 } })?,
                Filter::from_spec(&doc! { "$or": [{ color: "red" }, { tags: 2 }] })?,
                Filter::from_spec(&doc! { b: { "$not": { "$lt": 4 } } })?,
            ];
            for document in random_docs(11, 40) {
                for filter in &filters {
                    assert_eq!(filter.apply(&document), filter.apply(&document));
                }
            }
            Ok(())
        },
        cleanup,
    )
}
