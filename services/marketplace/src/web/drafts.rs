//! services/marketplace/src/web/drafts.rs
//!
//! The pending-lesson buffer: lessons staged for a course that have not been
//! written to the store yet. Entries live only in process memory and are lost
//! on restart.

use course_market_core::domain::LessonDraft;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Identifies one buffer entry. Scoping by owner keeps two users from ever
/// sharing an entry, even for the same course id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub owner_id: i64,
    pub course_id: i64,
}

impl DraftKey {
    pub fn new(owner_id: i64, course_id: i64) -> Self {
        Self { owner_id, course_id }
    }
}

/// Ordered lesson drafts per (owner, course), shared by all request handlers.
///
/// An entry lives until it is published or the process exits; drafts for a
/// course that is never published are never evicted.
#[derive(Default)]
pub struct LessonDraftBuffer {
    entries: Mutex<HashMap<DraftKey, Vec<LessonDraft>>>,
}

impl LessonDraftBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a draft and returns how many drafts the entry now holds.
    pub async fn stage(&self, key: DraftKey, draft: LessonDraft) -> usize {
        let mut entries = self.entries.lock().await;
        let drafts = entries.entry(key).or_default();
        drafts.push(draft);
        drafts.len()
    }

    /// A snapshot of the drafts for `key`, in staging order.
    pub async fn drafts(&self, key: DraftKey) -> Vec<LessonDraft> {
        let entries = self.entries.lock().await;
        entries.get(&key).cloned().unwrap_or_default()
    }

    /// Removes and returns the entry for `key`.
    pub async fn take(&self, key: DraftKey) -> Vec<LessonDraft> {
        let mut entries = self.entries.lock().await;
        entries.remove(&key).unwrap_or_default()
    }

    /// Puts drafts back after a failed flush. They go ahead of anything staged
    /// since they were taken, so the original order survives.
    pub async fn restore(&self, key: DraftKey, mut drafts: Vec<LessonDraft>) {
        if drafts.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(key).or_default();
        drafts.append(entry);
        *entry = drafts;
    }
}
