use std::fmt::Display;

use crate::collection::{AccessPath, Document, FindPlan};
use crate::common::{ExecutionStats, Value};

/// The outcome of `explain`: the plan a query ran with and the work it did.
#[derive(Debug, Clone)]
pub struct QueryExplanation {
    plan: FindPlan,
    stats: ExecutionStats,
}

impl QueryExplanation {
    pub(crate) fn new(plan: FindPlan, stats: ExecutionStats) -> Self {
        QueryExplanation { plan, stats }
    }

    pub fn plan(&self) -> &FindPlan {
        &self.plan
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Renders the explanation as a document, e.g.
    /// `{stage: "IXSCAN", index: {price: 1}, filter: "(price > 10)",
    /// keysExamined: 3, docsExamined: 3, nReturned: 3}`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert("stage", self.plan.access_path().stage());
        match self.plan.access_path() {
            AccessPath::IndexScan(scan) => {
                let index: Document = scan
                    .descriptor()
                    .fields()
                    .iter()
                    .map(|(field, order)| (field.clone(), Value::I64(order.direction())))
                    .collect();
                document.insert("index", index);
            }
            AccessPath::IdLookup(id) => {
                document.insert("id", *id);
            }
            AccessPath::CollectionScan => {}
        }
        document.insert("filter", self.plan.filter().to_string());
        document.insert("keysExamined", count(self.stats.keys_examined));
        document.insert("docsExamined", count(self.stats.docs_examined));
        document.insert("nReturned", count(self.stats.returned));
        document
    }
}

fn count(n: usize) -> Value {
    Value::I64(i64::try_from(n).unwrap_or(i64::MAX))
}

impl Display for QueryExplanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} keysExamined={} docsExamined={} nReturned={}",
            self.plan, self.stats.keys_examined, self.stats.docs_examined, self.stats.returned
        )
    }
}
