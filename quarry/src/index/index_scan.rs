use std::fmt::Display;

use crate::common::Value;
use crate::filter::ComparisonMode;

use super::IndexDescriptor;

/// The bounds of an index lookup: equality values for the leading index
/// fields, then an optional range on the field right after them.
#[derive(Clone, Debug)]
pub struct IndexScan {
    descriptor: IndexDescriptor,
    equality: Vec<Value>,
    range: Option<(ComparisonMode, Value)>,
}

impl IndexScan {
    pub(crate) fn new(
        descriptor: IndexDescriptor,
        equality: Vec<Value>,
        range: Option<(ComparisonMode, Value)>,
    ) -> Self {
        IndexScan {
            descriptor,
            equality,
            range,
        }
    }

    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    pub fn equality(&self) -> &[Value] {
        &self.equality
    }

    pub fn range(&self) -> Option<(ComparisonMode, &Value)> {
        self.range.as_ref().map(|(mode, bound)| (*mode, bound))
    }
}

impl Display for IndexScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor)?;
        let fields = self.descriptor.fields();
        for ((name, _), value) in fields.iter().zip(self.equality.iter()) {
            write!(f, " ({} == {})", name, value)?;
        }
        if let Some((mode, bound)) = &self.range {
            if let Some((name, _)) = fields.get(self.equality.len()) {
                write!(f, " ({} {} {})", name, mode, bound)?;
            }
        }
        Ok(())
    }
}
