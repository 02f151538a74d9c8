use quarry::collection::{Document, QuarryCollection, WriteResult};
use quarry::common::{SortOrder, Value};
use quarry::doc;
use quarry::errors::QuarryResult;
use quarry::Quarry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs `test` between `before` and `after`, reporting which phase failed.
/// `after` also runs when the test itself fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> QuarryResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> QuarryResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> QuarryResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let failure = match result {
        Ok(Ok(_)) => return,
        Ok(Err((error, backtrace))) => (error, backtrace),
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", message), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", failure.0);
    if !failure.1.is_empty() && !failure.1.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", failure.1);
    }
    eprintln!("=====================================================\n");
    panic!("{}", failure.0);
}

#[derive(Clone)]
pub struct TestContext {
    db: Quarry,
}

impl TestContext {
    pub fn new(db: Quarry) -> Self {
        Self { db }
    }

    pub fn db(&self) -> Quarry {
        self.db.clone()
    }

    pub fn books(&self) -> QuarryResult<QuarryCollection> {
        self.db.collection("books")
    }
}

pub fn create_test_context() -> QuarryResult<TestContext> {
    Ok(TestContext::new(Quarry::builder().open()?))
}

/// A context whose collections never cache query plans.
pub fn create_uncached_test_context() -> QuarryResult<TestContext> {
    Ok(TestContext::new(Quarry::builder().plan_cache_limit(0).open()?))
}

pub fn cleanup(ctx: TestContext) -> QuarryResult<()> {
    let db = ctx.db();
    for name in db.list_collection_names() {
        db.drop_collection(&name)?;
    }
    Ok(())
}

pub fn book_docs() -> Vec<Document> {
    vec![
        doc! { title: "Dune", author: "Frank Herbert", genre: "Sci-Fi", published_year: 1965, price: 9.99, tags: ["classic", "desert"], stock: 12 },
        doc! { title: "Emma", author: "Jane Austen", genre: "Fiction", published_year: 1815, price: 6.5, tags: ["classic"], stock: 3 },
        doc! { title: "Ubik", author: "Philip K. Dick", genre: "Sci-Fi", published_year: 1969, price: 11, tags: ["reality"], stock: 0 },
        doc! { title: "Solaris", author: "Stanislaw Lem", genre: "Sci-Fi", published_year: 1961, price: 14.25, stock: 5 },
        doc! { title: "Persuasion", author: "Jane Austen", genre: "Fiction", published_year: 1817, price: 7, tags: ["classic", "romance"], stock: 8 },
        doc! { title: "Neuromancer", author: "William Gibson", genre: "Sci-Fi", published_year: 1984, price: 12.5, tags: ["cyberpunk"], stock: 7 },
        doc! { title: "Beloved", author: "Toni Morrison", genre: "Fiction", published_year: 1987, price: 13, tags: [], stock: 2 },
        doc! { title: "The Hobbit", author: "J. R. R. Tolkien", genre: "Fantasy", published_year: 1937, price: 10, tags: ["classic", "dragons"], stock: 20 },
    ]
}

pub fn insert_books(collection: &QuarryCollection) -> QuarryResult<WriteResult> {
    collection.insert_many(book_docs())
}

/// Documents with small value domains so that filters hit, miss and
/// collide. The same seed always yields the same documents.
pub fn random_docs(seed: u64, count: usize) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(seed);
    let colors = ["red", "green", "blue"];
    (0..count)
        .map(|_| {
            let mut document = doc! {
                a: (rng.random_range(0..5i64)),
                color: (colors[rng.random_range(0..colors.len())]),
            };
            if rng.random_bool(0.8) {
                document.insert("b", Value::F64(rng.random_range(0..20) as f64 / 2.0));
            }
            if rng.random_bool(0.3) {
                let tags: Vec<Value> = (0..rng.random_range(0..3))
                    .map(|_| Value::from(rng.random_range(0..4i64)))
                    .collect();
                document.insert("tags", Value::Array(tags));
            }
            document
        })
        .collect()
}

pub fn is_sorted(documents: &[Document], field: &str, sort_order: SortOrder) -> bool {
    documents.windows(2).all(|pair| {
        let left = pair[0].get_or_null(field);
        let right = pair[1].get_or_null(field);
        match sort_order {
            SortOrder::Ascending => left <= right,
            SortOrder::Descending => left >= right,
        }
    })
}

pub fn titles(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|d| d.get("title").and_then(|t| t.as_str()).map(String::from))
        .collect()
}
