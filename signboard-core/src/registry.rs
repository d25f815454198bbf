//! Live notice registry.
//!
//! The ordered list of [`RenderableNotice`]s that renderers read from. Index 0
//! is the newest notice. The list is only ever swapped wholesale under the
//! write lock, so a reader sees either the complete old list or the complete
//! new one. Readers hold the lock only long enough to clone one entry.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::RenderableNotice;

#[derive(Debug, Default)]
pub struct LiveRegistry {
    notices: RwLock<Vec<RenderableNotice>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list in one critical section.
    pub fn replace(&self, notices: Vec<RenderableNotice>) {
        *self.write() = notices;
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Zero-based read.
    pub fn get(&self, index: usize) -> Option<RenderableNotice> {
        self.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current list.
    pub fn snapshot(&self) -> Vec<RenderableNotice> {
        self.read().clone()
    }

    /// Resolve a 1-based notice number.
    ///
    /// `None` unless `1 <= number <= max_count` and `number <= len`, so a
    /// configured maximum above the synced count never indexes out of bounds.
    pub fn lookup_by_number(&self, number: i32, max_count: u32) -> Option<RenderableNotice> {
        let number = u32::try_from(number).ok().filter(|n| (1..=max_count).contains(n))?;
        let index = usize::try_from(number - 1).ok()?;
        self.get(index)
    }

    // Replacement is a single assignment, so a poisoned lock never guards a
    // half-built list and can be used as-is.
    fn read(&self) -> RwLockReadGuard<'_, Vec<RenderableNotice>> {
        self.notices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<RenderableNotice>> {
        self.notices.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::types::NoticeRecord;

    fn notices(n: usize) -> Vec<RenderableNotice> {
        (0..n)
            .map(|i| {
                RenderableNotice::from_record(&NoticeRecord::new(
                    Utc::now(),
                    "News",
                    format!("author{i}"),
                    format!("body {i}"),
                ))
            })
            .collect()
    }

    fn registry_with(n: usize) -> LiveRegistry {
        let registry = LiveRegistry::new();
        registry.replace(notices(n));
        registry
    }

    #[rstest]
    #[case(0, 5, 5)]
    #[case(-1, 5, 5)]
    #[case(6, 5, 5)]
    #[case(6, 10, 5)]
    #[case(1, 0, 5)]
    #[case(1, 5, 0)]
    fn lookup_rejects_out_of_range(#[case] number: i32, #[case] max: u32, #[case] len: usize) {
        let registry = registry_with(len);
        assert!(registry.lookup_by_number(number, max).is_none());
    }

    #[test]
    fn lookup_is_one_based() {
        let registry = registry_with(5);
        let second = registry.lookup_by_number(2, 5).expect("second notice");
        assert_eq!(second.line(0), Some("[News] author1"));
        let last = registry.lookup_by_number(5, 5).expect("last notice");
        assert_eq!(last.line(0), Some("[News] author4"));
    }

    #[test]
    fn max_count_above_len_is_safe() {
        let registry = registry_with(3);
        assert!(registry.lookup_by_number(3, 10).is_some());
        assert!(registry.lookup_by_number(4, 10).is_none());
    }

    #[test]
    fn replace_swaps_whole_list() {
        let registry = registry_with(5);
        registry.replace(notices(2));
        assert_eq!(registry.len(), 2);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_readers_never_see_a_mixed_list() {
        let registry = Arc::new(LiveRegistry::new());
        let short = notices(2);
        let long = notices(7);
        registry.replace(short.clone());

        let writer = {
            let registry = Arc::clone(&registry);
            let (short, long) = (short.clone(), long.clone());
            thread::spawn(move || {
                for i in 0..500 {
                    registry.replace(if i % 2 == 0 { long.clone() } else { short.clone() });
                }
            })
        };

        for _ in 0..500 {
            let seen = registry.snapshot();
            assert!(seen == short || seen == long, "observed a partial list");
        }
        writer.join().expect("writer thread");
    }
}
