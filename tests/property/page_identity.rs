//! Page id allocation under churn

use navrelay::identity::PageIdAllocator;
use navrelay::types::PageId;
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    /// Live ids never repeat and never use the sentinel, whatever gets released.
    #[test]
    fn live_ids_are_unique(releases in prop::collection::vec(any::<bool>(), 1..200)) {
        let allocator = PageIdAllocator::new();
        let mut live: HashSet<PageId> = HashSet::new();
        for release in releases {
            let id = allocator.allocate().unwrap();
            prop_assert!(!id.is_none());
            prop_assert!(live.insert(id));
            if release {
                prop_assert!(allocator.release(id));
                live.remove(&id);
            }
        }
        prop_assert_eq!(allocator.live_count(), live.len());
    }
}
