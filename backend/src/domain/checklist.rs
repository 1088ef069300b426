//! Legacy goal/todo upgrades.
//!
//! Early documents stored list entries as bare strings. Reads decode both
//! shapes into `ListEntry` and this module upgrades them to structured
//! items for display. The upgrade is one-way and in-memory only: nothing
//! is written back unless the caller upserts.

use chrono::Utc;
use shared::{ChecklistItem, ListEntry};

/// Normalize a decoded entry list into structured checklist items.
///
/// Structured entries pass through unchanged. Legacy strings get a fresh
/// id, their text, and `completed: false`. Fresh ids combine the current
/// epoch millis with a random tiebreaker, so a single pass over a list of
/// legacy entries never collides with itself.
pub fn normalize(entries: &[ListEntry]) -> Vec<ChecklistItem> {
    let now_millis = Utc::now().timestamp_millis().max(0) as u64;

    entries
        .iter()
        .map(|entry| match entry {
            ListEntry::Item(item) => item.clone(),
            ListEntry::Legacy(text) => ChecklistItem {
                id: ChecklistItem::generate_id(now_millis),
                text: text.clone(),
                completed: false,
            },
        })
        .collect()
}
