use crate::collection::{Document, Projection};
use crate::common::{InterruptHandle, SortOrder, SortableFields};
use crate::errors::QuarryResult;
use icu_collator::options::CollatorOptions;

/// Shapes the output of a find: sort, skip, limit and projection.
///
/// Options always apply in the same order regardless of how they were set:
/// filter, then sort, then skip, then limit, then projection.
///
/// ```rust
/// use quarry::collection::{order_by, FindOptions};
/// use quarry::common::SortOrder;
/// use quarry::doc;
///
/// let page_two = order_by("price", SortOrder::Descending).skip(10).limit(10);
/// let titles = FindOptions::new().project(&doc! { title: 1, _id: 0 }).unwrap();
/// ```
#[derive(Clone, Default)]
pub struct FindOptions {
    pub(crate) projection: Option<Projection>,
    pub(crate) sort_by: Option<SortableFields>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) collator_options: Option<CollatorOptions>,
    pub(crate) interrupt: Option<InterruptHandle>,
}

pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Caps the number of results. A limit of zero returns nothing.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Appends a sort key after any keys already set.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let fields = self.sort_by.take().unwrap_or_default();
        self.sort_by = Some(fields.add_sorted_field(field_name.to_string(), sort_order));
        self
    }

    pub fn sort(mut self, fields: SortableFields) -> FindOptions {
        self.sort_by = Some(fields);
        self
    }

    /// Sets the sort from a specification such as `{price: -1, title: 1}`.
    pub fn sort_spec(self, spec: &Document) -> QuarryResult<FindOptions> {
        Ok(self.sort(SortableFields::from_spec(spec)?))
    }

    pub fn projection(mut self, projection: Projection) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    /// Sets the projection from a specification such as `{title: 1, _id: 0}`.
    pub fn project(self, spec: &Document) -> QuarryResult<FindOptions> {
        Ok(self.projection(Projection::from_spec(spec)?))
    }

    /// Compares strings with an ICU collator while sorting.
    pub fn collator_options(mut self, options: CollatorOptions) -> FindOptions {
        self.collator_options = Some(options);
        self
    }

    pub fn interrupt_handle(mut self, handle: InterruptHandle) -> FindOptions {
        self.interrupt = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn helpers_set_single_option() {
        let options = order_by("price", SortOrder::Descending);
        let sort = options.sort_by.as_ref().unwrap();
        assert_eq!(sort.sorting_order()[0], ("price".to_string(), SortOrder::Descending));
        assert!(options.skip.is_none() && options.limit.is_none());

        assert_eq!(skip_by(5).skip, Some(5));
        assert_eq!(limit_to(3).limit, Some(3));
        assert!(limit_to(3).collator_options.is_none());
    }

    #[test]
    fn sort_by_appends_keys() {
        let options = order_by("author", SortOrder::Ascending).sort_by("year", SortOrder::Descending);
        assert_eq!(options.sort_by.unwrap().to_string(), "{author: 1, year: -1}");
    }

    #[test]
    fn spec_helpers_validate() {
        assert!(FindOptions::new().sort_spec(&doc! { price: 2 }).is_err());
        assert!(FindOptions::new().project(&doc! { a: 1, b: 0 }).is_err());
        let options = FindOptions::new().project(&doc! { title: 1 }).unwrap();
        assert!(options.projection.is_some());
    }
}
