use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::collection::{AccessPath, FindOptions, FindPlan};
use crate::common::{Value, DOC_ID};
use crate::errors::QuarryResult;
use crate::filter::{ComparisonMode, Filter};
use crate::index::{IndexDescriptor, IndexScan};

type EqualityTerms<'a> = SmallVec<[(&'a str, &'a Value); 4]>;
type RangeTerms<'a> = SmallVec<[(&'a str, ComparisonMode, &'a Value); 4]>;

/// Chooses the access path of a query and caches the resulting plans.
#[derive(Clone)]
pub(crate) struct FindOptimizer {
    inner: Arc<FindOptimizerInner>,
}

impl FindOptimizer {
    pub fn new(cache_limit: usize) -> Self {
        FindOptimizer {
            inner: Arc::new(FindOptimizerInner {
                plan_cache: DashMap::new(),
                cache_limit,
            }),
        }
    }

    /// Plans a query against the indexes of one snapshot.
    ///
    /// `index_generation` identifies that index set. A cached plan is only
    /// reused by queries planned against the same generation.
    pub fn create_find_plan(
        &self,
        filter: &Filter,
        find_options: &FindOptions,
        index_descriptors: &[IndexDescriptor],
        index_generation: u64,
    ) -> QuarryResult<FindPlan> {
        self.inner
            .create_find_plan(filter, find_options, index_descriptors, index_generation)
    }

    /// Drops every cached plan. Called under the collection's write lock
    /// whenever an index is created or dropped.
    pub fn invalidate_cache(&self) {
        self.inner.plan_cache.clear();
    }

    pub fn cached_plan_count(&self) -> usize {
        self.inner.plan_cache.len()
    }
}

struct FindOptimizerInner {
    plan_cache: DashMap<String, (u64, FindPlan)>,
    cache_limit: usize,
}

impl FindOptimizerInner {
    fn create_find_plan(
        &self,
        filter: &Filter,
        find_options: &FindOptions,
        index_descriptors: &[IndexDescriptor],
        index_generation: u64,
    ) -> QuarryResult<FindPlan> {
        let cache_key = self.compute_cache_key(filter, find_options);

        if let Some(cached) = self.plan_cache.get(&cache_key) {
            let (generation, plan) = cached.value();
            if *generation == index_generation {
                return Ok(plan.clone());
            }
        }

        let access_path = plan_access_path(filter, index_descriptors);
        log::debug!("Planned {} for filter {}", access_path, filter);

        let mut find_plan = FindPlan::new(access_path, filter.clone());
        find_plan.set_sort_by(find_options.sort_by.clone());
        find_plan.set_skip(find_options.skip);
        find_plan.set_limit(find_options.limit);
        find_plan.set_projection(find_options.projection.clone());
        find_plan.set_collator_options(find_options.collator_options);

        if self.cache_limit > 0
            && (self.plan_cache.len() < self.cache_limit || self.plan_cache.contains_key(&cache_key))
        {
            self.plan_cache
                .insert(cache_key, (index_generation, find_plan.clone()));
        }
        Ok(find_plan)
    }

    fn compute_cache_key(&self, filter: &Filter, find_options: &FindOptions) -> String {
        let mut key = filter.to_string();
        if let Some(sort_by) = &find_options.sort_by {
            key.push_str(&format!("|sort={}", sort_by));
        }
        key.push_str(&format!(
            "|skip={:?}|limit={:?}",
            find_options.skip, find_options.limit
        ));
        if let Some(projection) = &find_options.projection {
            key.push_str(&format!("|project={}", projection));
        }
        if let Some(collator_options) = &find_options.collator_options {
            key.push_str(&format!("|collate={:?}", collator_options));
        }
        key
    }
}

/// Picks the access path for a filter.
///
/// An `_id` equality on a record identity becomes a direct lookup. Otherwise
/// every index is scored by how many of its leading fields are pinned by
/// equality terms, plus one for a range term on the field that follows. The
/// highest score wins and ties go to the index declared first. A range on the
/// leading field alone is enough to use an index.
pub(crate) fn plan_access_path(filter: &Filter, index_descriptors: &[IndexDescriptor]) -> AccessPath {
    let conjuncts = filter.conjuncts();

    let mut equalities = EqualityTerms::new();
    let mut ranges = RangeTerms::new();
    for conjunct in &conjuncts {
        if let Some((field, value)) = conjunct.equality_term() {
            if field == DOC_ID {
                if let Value::Id(id) = value {
                    return AccessPath::IdLookup(*id);
                }
            }
            if !equalities.iter().any(|(f, _)| *f == field) {
                equalities.push((field, value));
            }
        } else if let Some(term) = conjunct.range_term() {
            ranges.push(term);
        }
    }

    if equalities.is_empty() && ranges.is_empty() {
        return AccessPath::CollectionScan;
    }

    let mut best: Option<(usize, IndexScan)> = None;
    for descriptor in index_descriptors {
        let mut prefix = Vec::new();
        for (field, _) in descriptor.fields() {
            match equalities.iter().find(|(f, _)| *f == field.as_str()) {
                Some((_, value)) => prefix.push((*value).clone()),
                None => break,
            }
        }

        let range = descriptor
            .fields()
            .get(prefix.len())
            .and_then(|(next_field, _)| ranges.iter().find(|(f, _, _)| *f == next_field.as_str()))
            .map(|(_, mode, bound)| (*mode, (*bound).clone()));

        let score = prefix.len() * 2 + usize::from(range.is_some());
        if score == 0 {
            continue;
        }
        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((score, IndexScan::new(descriptor.clone(), prefix, range)));
        }
    }

    match best {
        Some((_, scan)) => AccessPath::IndexScan(scan),
        None => AccessPath::CollectionScan,
    }
}
