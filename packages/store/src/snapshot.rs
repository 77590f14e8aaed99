//! # Directory snapshot: the client's cached copy of a user's contacts
//!
//! A [`Snapshot`] holds the *base sequence* of records last received from the
//! server (or from an import), kept in the order of the active sort, plus the
//! derived view state: the active search string and the active sort key and
//! direction. The server-held collection stays authoritative; the snapshot is
//! only ever replaced wholesale or patched with records the server returned.
//!
//! ## View derivation
//!
//! [`visible`](Snapshot::visible) is the base sequence filtered by the search
//! string (case-insensitive substring match on `name`). Filtering never
//! touches the base sequence, so clearing the search restores the full set in
//! its current sort order without a reload.
//!
//! ## Ordering
//!
//! Text columns compare with a collation key (compatibility decomposition,
//! combining marks stripped, lowercased), falling back to the raw text to
//! break ties, which approximates locale-aware ordering. Phone numbers compare
//! by numeric value; values that do not parse as a number sort after every
//! numeric one. Sorting is stable and is reapplied every time the base
//! sequence changes.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Contact, ContactId, SortDirection, SortKey};

/// Active sort column and direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    base: Vec<Contact>,
    query: String,
    sort: Option<SortState>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base sequence in its current sort order, ignoring the search filter.
    pub fn base(&self) -> &[Contact] {
        &self.base
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Records matching the active search, in sort order.
    pub fn visible(&self) -> Vec<Contact> {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return self.base.clone();
        }
        self.base
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return self.base.len();
        }
        self.base
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .count()
    }

    pub fn get(&self, id: &ContactId) -> Option<&Contact> {
        self.base.iter().find(|c| c.id.as_ref() == Some(id))
    }

    pub fn contains(&self, id: &ContactId) -> bool {
        self.get(id).is_some()
    }

    /// Replace the base sequence wholesale, keeping the search string and
    /// reapplying the active sort.
    pub fn replace_base(&mut self, records: Vec<Contact>) {
        self.base = records;
        self.apply_sort();
    }

    /// Set the search string and return the matching records.
    pub fn search(&mut self, query: &str) -> Vec<Contact> {
        self.query = query.to_string();
        self.visible()
    }

    pub fn clear_search(&mut self) {
        self.query.clear();
    }

    /// Sort by `key`. Repeating the active key toggles the direction; a new
    /// key starts ascending.
    pub fn sort(&mut self, key: SortKey) -> SortState {
        let next = match self.sort {
            Some(active) if active.key == key => SortState {
                key,
                direction: active.direction.toggled(),
            },
            _ => SortState {
                key,
                direction: SortDirection::Ascending,
            },
        };
        self.sort = Some(next);
        self.apply_sort();
        next
    }

    /// Insert a record returned by the server, replacing the entry with the
    /// same id if there is one.
    pub fn upsert(&mut self, record: Contact) {
        let existing = record
            .id
            .as_ref()
            .and_then(|id| self.base.iter().position(|c| c.id.as_ref() == Some(id)));
        match existing {
            Some(index) => self.base[index] = record,
            None => self.base.push(record),
        }
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        if let Some(SortState { key, direction }) = self.sort {
            self.base.sort_by(|a, b| {
                let ordering = compare(key, a, b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
    }
}

/// Compare two records on one column.
pub fn compare(key: SortKey, a: &Contact, b: &Contact) -> Ordering {
    match key {
        SortKey::Phone => compare_phone(&a.phone, &b.phone),
        _ => compare_text(a.field(key), b.field(key)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_phone(a: &str, b: &str) -> Ordering {
    match (phone_value(a), phone_value(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_text(a, b),
    }
}

fn phone_value(phone: &str) -> Option<f64> {
    phone
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
