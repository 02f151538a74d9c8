use quarry::doc;
use quarry::filter::{all, field};
use quarry_int_test::test_util::{book_docs, cleanup, create_test_context, insert_books, run_test};
use std::thread;

#[test]
fn test_cursor_reads_its_snapshot() {
    run_test(
        create_test_context,
        |ctx| {
            let books = ctx.books()?;
            insert_books(&books)?;

            let mut cursor = books.find(all())?;
            let first = cursor.next().unwrap()?;

            books.remove(all(), false)?;
            books.insert(doc! { title: "Late arrival" })?;

            let rest = cursor.to_vec()?;
            assert_eq!(rest.len() + 1, book_docs().len());
            assert_eq!(first.get("title"), book_docs()[0].get("title"));
            assert_eq!(books.size()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_readers_see_whole_batches() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.db().collection("batches")?;
            collection.create_index_from_spec(&doc! { batch: 1 })?;

            let writer = {
                let collection = collection.clone();
                thread::spawn(move || {
                    for batch in 0..50i64 {
                        let docs = (0..10).map(|i| doc! { batch: (batch), n: (i) }).collect();
                        collection.insert_many(docs).unwrap();
                        if batch % 5 == 4 {
                            collection
                                .update(field("batch").eq(batch), &doc! { "$set": { done: true } })
                                .unwrap();
                        }
                    }
                })
            };

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let collection = collection.clone();
                    thread::spawn(move || {
                        for _ in 0..100 {
                            let total = collection.count(all()).unwrap();
                            assert_eq!(total % 10, 0, "saw a partial batch");
                            let done = collection.count(field("done").eq(true)).unwrap();
                            assert_eq!(done % 10, 0, "saw a partial update");
                        }
                    })
                })
                .collect();

            writer.join().unwrap();
            for reader in readers {
                reader.join().unwrap();
            }

            assert_eq!(collection.size()?, 500);
            assert_eq!(collection.count(field("done").eq(true))?, 100);
            assert_eq!(collection.count(field("batch").eq(49))?, 10);
            Ok(())
        },
        cleanup,
    )
}
