use quarry::aggregation::{Accumulator, Expression, GroupStage, Pipeline, Stage};
use quarry::common::Value;
use quarry::doc;
use quarry::errors::ErrorKind;
use quarry::filter::Filter;
use quarry_int_test::test_util::{
    cleanup, create_test_context, insert_books, random_docs, run_test,
};

#[test]
fn test_books_by_genre() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let pipeline = Pipeline::from_stages(&[
                doc! { "$group": {
                    _id: "$genre",
                    count: { "$sum": 1 },
                    avg_price: { "$avg": "$price" },
                    stock: { "$sum": "$stock" },
                    oldest: { "$min": "$published_year" },
                } },
                doc! { "$sort": { count: -1, _id: 1 } },
            ])?;

            let out = books.aggregate(&pipeline)?;
            assert_eq!(out.len(), 3);
            assert_eq!(out[0].get("_id"), Some(&Value::from("Sci-Fi")));
            assert_eq!(out[0].get("count"), Some(&Value::I64(4)));
            assert_eq!(out[0].get("stock"), Some(&Value::I64(24)));
            assert_eq!(out[0].get("oldest"), Some(&Value::I64(1961)));
            let avg = out[0].get("avg_price").and_then(|v| v.as_f64()).unwrap();
            assert!((avg - 11.935).abs() < 1e-9);

            assert_eq!(out[1].get("_id"), Some(&Value::from("Fiction")));
            assert_eq!(out[2], doc! { _id: "Fantasy", count: 1, avg_price: 10.0, stock: 20, oldest: 1937 });
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_books_by_decade() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let pipeline = Pipeline::from_stages(&[
                doc! { "$match": { published_year: { "$gte": 1900 } } },
                doc! { "$addFields": {
                    decade: { "$multiply": [{ "$floor": { "$divide": ["$published_year", 10] } }, 10] },
                } },
                doc! { "$group": { _id: "$decade", titles: { "$push": "$title" } } },
                doc! { "$sort": { _id: 1 } },
            ])?;

            let out = books.aggregate(&pipeline)?;
            assert_eq!(
                out,
                vec![
                    doc! { _id: 1930, titles: ["The Hobbit"] },
                    doc! { _id: 1960, titles: ["Dune", "Ubik", "Solaris"] },
                    doc! { _id: 1980, titles: ["Neuromancer", "Beloved"] },
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unwind_and_count_tags() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let pipeline = Pipeline::from_stages(&[
                doc! { "$unwind": "$tags" },
                doc! { "$group": { _id: "$tags", n: { "$sum": 1 }, authors: { "$addToSet": "$author" } } },
                doc! { "$match": { n: { "$gt": 1 } } },
                doc! { "$project": { n: 1, authors: 1 } },
            ])?;

            let out = books.aggregate(&pipeline)?;
            assert_eq!(
                out,
                vec![doc! {
                    _id: "classic",
                    n: 4,
                    authors: ["Frank Herbert", "Jane Austen", "J. R. R. Tolkien"],
                }]
            );

            let count = Pipeline::from_stages(&[
                doc! { "$unwind": { path: "$tags", preserveNullAndEmptyArrays: true } },
                doc! { "$count": "rows" },
            ])?;
            assert_eq!(books.aggregate(&count)?, vec![doc! { rows: 11 }]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_after_group_keeps_first_seen_order_on_ties() {
    run_test(
        create_test_context,
        |ctx| {
            let loans = ctx.db().collection("loans")?;
            loans.insert_many(vec![
                doc! { author: "Zola" },
                doc! { author: "Austen" },
                doc! { author: "Balzac" },
                doc! { author: "Austen" },
                doc! { author: "Zola" },
            ])?;

            let ranked = Pipeline::from_stages(&[
                doc! { "$group": { _id: "$author", n: { "$sum": 1 } } },
                doc! { "$sort": { n: -1 } },
            ])?;
            assert_eq!(
                loans.aggregate(&ranked)?,
                vec![
                    doc! { _id: "Zola", n: 2 },
                    doc! { _id: "Austen", n: 2 },
                    doc! { _id: "Balzac", n: 1 },
                ]
            );

            let top = Pipeline::from_stages(&[
                doc! { "$group": { _id: "$author", n: { "$sum": 1 } } },
                doc! { "$sort": { n: -1 } },
                doc! { "$limit": 1 },
            ])?;
            assert_eq!(loans.aggregate(&top)?, vec![doc! { _id: "Zola", n: 2 }]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_group_counts_add_up_to_matches() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("random")?;
            collection.insert_many(random_docs(3, 200))?;
            collection.create_index_from_spec(&doc! { color: 1 })?;

            for spec in [doc! { color: "red" }, doc! { a: { "$gte": 2 } }, doc! {}] {
                let matched = collection.count(Filter::from_spec(&spec)?)?;
                let pipeline = Pipeline::new(vec![
                    Stage::Match(Filter::from_spec(&spec)?),
                    Stage::Group(
                        GroupStage::new(Expression::field("a"))
                            .accumulate("n", Accumulator::sum(Expression::literal(1))),
                    ),
                ])?;
                let total: i64 = collection
                    .aggregate(&pipeline)?
                    .iter()
                    .filter_map(|group| group.get("n").and_then(|n| n.as_i64()))
                    .sum();
                assert_eq!(total as usize, matched, "filter {}", spec);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_input() {
    run_test(
        create_test_context,
        |ctx| {
            let empty = ctx.db().collection("empty")?;
            let pipeline = Pipeline::from_stages(&[
                doc! { "$group": { _id: null, total: { "$sum": "$x" }, avg: { "$avg": "$x" } } },
            ])?;
            assert!(empty.aggregate(&pipeline)?.is_empty());

            let count = Pipeline::from_stages(&[doc! { "$count": "n" }])?;
            assert!(empty.aggregate(&count)?.is_empty());

            let books = ctx.books()?;
            insert_books(&books)?;
            let none = Pipeline::from_stages(&[
                doc! { "$match": { genre: "Poetry" } },
                doc! { "$group": { _id: "$author", n: { "$sum": 1 } } },
            ])?;
            assert!(books.aggregate(&none)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_leading_match_uses_index_without_changing_results() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;
            let pipeline = Pipeline::from_stages(&[
                doc! { "$match": { author: "Jane Austen" } },
                doc! { "$sort": { published_year: -1 } },
                doc! { "$limit": 1 },
                doc! { "$project": { _id: 0, title: 1 } },
            ])?;

            let scanned = books.aggregate(&pipeline)?;
            books.create_index_from_spec(&doc! { author: 1 })?;
            let indexed = books.aggregate(&pipeline)?;
            assert_eq!(scanned, vec![doc! { title: "Persuasion" }]);
            assert_eq!(indexed, scanned);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_pipelines() {
    run_test(
        create_test_context,
        |_ctx| {
            let err = Pipeline::from_stages(&[doc! { "$lookup": { from: "authors" } }]).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::UnknownStage);

            for stage in [
                doc! { "$limit": 0 },
                doc! { "$group": { total: { "$sum": 1 } } },
                doc! { "$match": { price: { "$between": [1, 2] } } },
                doc! { "$sort": { price: 1 }, "$limit": 1 },
                doc! { "$addFields": { x: { "$pow": [2, 3] } } },
            ] {
                let err = Pipeline::from_stages(&[stage]).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidSpecification);
            }
            Ok(())
        },
        cleanup,
    )
}
