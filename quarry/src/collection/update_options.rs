/// Options controlling an update.
///
/// - `insert_if_absent`: when no record matches, insert one seeded from the
///   filter's equality terms and apply the update to it (upsert).
/// - `just_once`: update at most the first matching record in identity order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    insert_if_absent: bool,
    just_once: bool,
}

impl UpdateOptions {
    pub fn new(insert_if_absent: bool, just_once: bool) -> Self {
        Self {
            insert_if_absent,
            just_once,
        }
    }

    pub fn is_insert_if_absent(&self) -> bool {
        self.insert_if_absent
    }

    pub fn is_just_once(&self) -> bool {
        self.just_once
    }
}

/// Options for an upsert.
pub fn insert_if_absent() -> UpdateOptions {
    UpdateOptions::new(true, false)
}

/// Options for updating a single record.
pub fn just_once() -> UpdateOptions {
    UpdateOptions::new(false, true)
}
