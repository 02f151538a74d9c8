use quarry::collection::{insert_if_absent, just_once, UpdateOptions};
use quarry::common::Value;
use quarry::doc;
use quarry::errors::ErrorKind;
use quarry::filter::{all, field};
use quarry_int_test::test_util::{book_docs, cleanup, create_test_context, insert_books, run_test};

#[test]
fn test_set_unset_inc() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let result = books.update(
                field("title").eq("Dune"),
                &doc! {
                    "$set": { price: 10.99, "meta.edition": 2 },
                    "$unset": { tags: 1 },
                    "$inc": { stock: -2 },
                },
            )?;
            assert_eq!(result.affected_count(), 1);

            let dune = books.find_one(field("title").eq("Dune"))?.unwrap();
            assert_eq!(dune.get("price"), Some(&Value::F64(10.99)));
            assert_eq!(dune.get("meta.edition"), Some(&Value::I64(2)));
            assert_eq!(dune.get("tags"), None);
            assert_eq!(dune.get("stock"), Some(&Value::I64(10)));
            assert_eq!(dune.get("author"), Some(&Value::from("Frank Herbert")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many_and_once() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let all_fiction = books.update(field("genre").eq("Fiction"), &doc! { "$inc": { stock: 1 } })?;
            assert_eq!(all_fiction.affected_count(), 3);

            let once = books.update_with_options(
                field("genre").eq("Fiction"),
                &doc! { "$set": { featured: true } },
                &just_once(),
            )?;
            assert_eq!(once.affected_count(), 1);
            let featured = books.find_one(field("featured").eq(true))?.unwrap();
            assert_eq!(featured.get("title"), Some(&Value::from("Emma")));

            let none = books.update(field("genre").eq("Poetry"), &doc! { "$set": { x: 1 } })?;
            assert!(none.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_upsert() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let filter = field("title").eq("Ubik").and(field("genre").eq("Sci-Fi"));
            let matched = books.update_with_options(filter, &doc! { "$inc": { stock: 1 } }, &insert_if_absent())?;
            assert_eq!(matched.affected_count(), 1);
            assert_eq!(books.size()?, book_docs().len());

            let filter = field("title").eq("Kindred").and(field("published_year").gt(1970));
            let inserted = books.update_with_options(
                filter,
                &doc! { "$set": { author: "Octavia E. Butler" }, "$inc": { stock: 4 } },
                &UpdateOptions::new(true, false),
            )?;
            assert_eq!(inserted.affected_count(), 1);
            assert_eq!(books.size()?, book_docs().len() + 1);

            let kindred = books.get_by_id(&inserted.affected_record_ids()[0])?.unwrap();
            assert_eq!(kindred.get("title"), Some(&Value::from("Kindred")));
            assert_eq!(kindred.get("stock"), Some(&Value::I64(4)));
            assert_eq!(kindred.get("published_year"), None);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_updates_touch_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;
            let before = books.find(all())?.to_vec()?;

            let invalid = vec![
                doc! {},
                doc! { price: 1 },
                doc! { "$rename": { price: "cost" } },
                doc! { "$set": { _id: 1 } },
                doc! { "$inc": { stock: "one" } },
                doc! { "$set": { a: 1 }, "$unset": { "a.b": 1 } },
            ];
            for spec in invalid {
                let err = books.update(all(), &spec).err().unwrap();
                assert_eq!(err.kind(), &ErrorKind::InvalidSpecification, "{}", spec);
            }

            let err = books.update(all(), &doc! { "$inc": { title: 1 } }).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            assert_eq!(books.find(all())?.to_vec()?, before);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_and_remove() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            let result = insert_books(&books)?;
            let ids = result.affected_record_ids();
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

            let err = books
                .insert_many(vec![doc! { title: "Valid" }, doc! { _id: 1, title: "Invalid" }])
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);
            assert_eq!(books.size()?, book_docs().len());

            let removed = books.remove(field("genre").eq("Sci-Fi"), true)?;
            assert_eq!(removed.affected_record_ids(), &ids[..1]);

            let removed = books.remove(field("genre").eq("Sci-Fi"), false)?;
            assert_eq!(removed.affected_count(), 3);
            assert_eq!(books.count(field("genre").eq("Sci-Fi"))?, 0);

            assert!(books.remove(field("genre").eq("Sci-Fi"), false)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
