//! Route table invariants under arbitrary operation sequences

use navrelay::route::{RouteEntry, RouteTable};
use navrelay::types::{Arguments, ContextKey, PageId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Push(u64),
    Pop(u64),
    Remove(u64),
    PopTo(u64),
    DropContext(u64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (1u64..=3).prop_map(Step::Push),
        2 => (1u64..=3).prop_map(Step::Pop),
        1 => (1u64..=40).prop_map(Step::Remove),
        1 => (1u64..=40).prop_map(Step::PopTo),
        1 => (1u64..=3).prop_map(Step::DropContext),
    ]
}

fn apply(table: &mut RouteTable, next_page: &mut u64, step: &Step) {
    match *step {
        Step::Push(context) => {
            let key = ContextKey::from_raw(context);
            table.add_context(key);
            *next_page += 1;
            let entry = RouteEntry::new(PageId::from_raw(*next_page), "prop", Arguments::new());
            table.push(key, entry).unwrap();
        }
        Step::Pop(context) => {
            table.pop(ContextKey::from_raw(context));
        }
        Step::Remove(page) => {
            table.remove(PageId::from_raw(page));
        }
        Step::PopTo(page) => {
            let _ = table.pop_to(PageId::from_raw(page));
        }
        Step::DropContext(context) => {
            table.remove_context(ContextKey::from_raw(context));
        }
    }
}

proptest! {
    /// Every page is indexed under the context whose stack holds it.
    #[test]
    fn registry_matches_stacks(steps in prop::collection::vec(step(), 0..60)) {
        let mut table = RouteTable::new();
        let mut next_page = 0;
        for step in &steps {
            apply(&mut table, &mut next_page, step);
            prop_assert!(table.is_consistent());
        }
        for page in 1..=next_page {
            let page = PageId::from_raw(page);
            prop_assert_eq!(table.last_route_holder(page), table.owner_of(page));
            prop_assert_eq!(table.contains(page), table.get(page).is_some());
        }
    }

    /// The front entry is the most recently pushed stack top.
    #[test]
    fn front_is_latest_top(steps in prop::collection::vec(step(), 1..60)) {
        let mut table = RouteTable::new();
        let mut next_page = 0;
        for step in &steps {
            apply(&mut table, &mut next_page, step);
        }

        let latest = (1..=3u64)
            .filter_map(|raw| table.top(ContextKey::from_raw(raw)))
            .max_by_key(|entry| entry.sequence)
            .map(|entry| entry.page_id);
        prop_assert_eq!(table.front().map(|(_, entry)| entry.page_id), latest);
        prop_assert_eq!(
            table.last_route_holder(PageId::NONE),
            table.front().map(|(key, _)| key)
        );
    }

    /// Pushing an id that is already live anywhere fails and changes nothing.
    #[test]
    fn duplicate_push_is_rejected(target in 1u64..=3, other in 1u64..=3) {
        let mut table = RouteTable::new();
        for raw in 1..=3 {
            table.add_context(ContextKey::from_raw(raw));
        }
        let page = PageId::from_raw(7);
        table
            .push(ContextKey::from_raw(target), RouteEntry::new(page, "prop", Arguments::new()))
            .unwrap();
        prop_assert!(table
            .push(ContextKey::from_raw(other), RouteEntry::new(page, "prop", Arguments::new()))
            .is_err());
        prop_assert_eq!(table.page_count(), 1);
        prop_assert_eq!(table.owner_of(page), Some(ContextKey::from_raw(target)));
    }
}
