use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::path::PathBuf;

pub type NoteId = String;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NotFound(NoteId),
    #[error("a note named {0} already exists")]
    Conflict(NoteId),
    #[error("not a usable note name: {0:?}")]
    InvalidName(NoteId),
    #[error("not a usable notes directory: {0:?}")]
    InvalidDirectory(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    ids: Vec<NoteId>,
}

impl Listing {
    pub fn new(mut ids: Vec<NoteId>) -> Self {
        ids.sort();
        Listing { ids }
    }

    pub fn ids(&self) -> &[NoteId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|n| n == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|n| n == id)
    }

    pub fn get(&self, index: usize) -> Option<&NoteId> {
        self.ids.get(index)
    }

    pub fn resolve(&self, current: &str) -> Option<&NoteId> {
        if self.ids.is_empty() {
            return None;
        }
        match self.position(current) {
            Some(idx) => self.ids.get(idx),
            None => self.ids.first(),
        }
    }

    pub fn previous(&self, current: &str) -> Option<&NoteId> {
        if self.ids.is_empty() {
            return None;
        }
        match self.position(current) {
            Some(idx) => self.ids.get(idx.saturating_sub(1)),
            None => self.ids.first(),
        }
    }

    pub fn next(&self, current: &str) -> Option<&NoteId> {
        if self.ids.is_empty() {
            return None;
        }
        let last = self.ids.len() - 1;
        match self.position(current) {
            Some(idx) => self.ids.get((idx + 1).min(last)),
            None => self.ids.last(),
        }
    }

    pub fn index_label(&self, current: &str) -> String {
        match self.position(current) {
            Some(idx) => format!("{}/{}", idx + 1, self.ids.len()),
            None => "New".to_string(),
        }
    }
}

pub fn synthesize_id(listing: &Listing) -> NoteId {
    let base = format!("Note_{}", Utc::now().timestamp());
    if !listing.contains(&base) {
        return base;
    }
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("{}_{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(ids: &[&str]) -> Listing {
        Listing::new(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn listing_sorts_ids() {
        let l = listing(&["c", "a", "b"]);
        assert_eq!(l.ids(), &["a", "b", "c"]);
    }

    #[test]
    fn resolve_keeps_present_id() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.resolve("b").map(String::as_str), Some("b"));
    }

    #[test]
    fn resolve_falls_back_to_first() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.resolve("missing").map(String::as_str), Some("a"));
    }

    #[test]
    fn resolve_empty_listing_is_none() {
        let l = listing(&[]);
        assert_eq!(l.resolve("anything"), None);
        assert_eq!(l.previous("anything"), None);
        assert_eq!(l.next("anything"), None);
    }

    #[test]
    fn previous_clamps_at_start() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.previous("a").map(String::as_str), Some("a"));
        assert_eq!(l.previous("b").map(String::as_str), Some("a"));
    }

    #[test]
    fn next_clamps_at_end() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.next("c").map(String::as_str), Some("c"));
        assert_eq!(l.next("b").map(String::as_str), Some("c"));
    }

    #[test]
    fn previous_with_unknown_id_lands_on_first() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.previous("zzz").map(String::as_str), Some("a"));
    }

    #[test]
    fn next_with_unknown_id_lands_on_last() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.next("zzz").map(String::as_str), Some("c"));
    }

    #[test]
    fn index_label_is_one_based() {
        let l = listing(&["a", "b", "c"]);
        assert_eq!(l.index_label("a"), "1/3");
        assert_eq!(l.index_label("c"), "3/3");
    }

    #[test]
    fn index_label_for_unknown_id_is_new() {
        let l = listing(&["a", "b"]);
        assert_eq!(l.index_label("draft"), "New");
        assert_eq!(listing(&[]).index_label("anything"), "New");
    }

    #[test]
    fn synthesized_id_carries_timestamp_prefix() {
        let id = synthesize_id(&listing(&[]));
        assert!(id.starts_with("Note_"));
    }

    #[test]
    fn synthesized_id_avoids_taken_names() {
        let first = synthesize_id(&listing(&[]));
        let second = synthesize_id(&listing(&[first.as_str()]));
        assert_ne!(first, second);
    }
}
