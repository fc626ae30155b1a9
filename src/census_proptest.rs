#![cfg(test)]

// Property tests over random, possibly cyclic table graphs, kept inside the
// crate next to the census they model.
//
// Model: node i is table ids[i]; an edge (from, key, to) assigns
// ids[from][key] = ids[to], later edges on the same slot overwriting
// earlier ones. Node 0 is the root.
//  - census count of a reachable node == number of slots in reachable
//    nodes pointing at it, plus one for the root; unreachable nodes absent.
//  - serialize_deep terminates, defines one `<N>` per ref-worthy table and
//    emits one `&N` per extra arrival at one.
//  - comparing the root with itself terminates and is true, cycles and
//    shared nodes included.

use crate::arena::{TableArena, TableId};
use crate::census::census;
use crate::compare::{deep_equal, is_subset, Comparator};
use crate::serialize::serialize_deep;
use crate::value::{Key, Value};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, i64, usize)>)> {
    (1usize..=8).prop_flat_map(|n| {
        let edge = (0..n, 0i64..4, 0..n);
        (Just(n), proptest::collection::vec(edge, 0..24))
    })
}

struct Built {
    arena: TableArena,
    ids: Vec<TableId>,
    expected: BTreeMap<usize, usize>,
}

fn build(n: usize, edges: &[(usize, i64, usize)]) -> Built {
    let mut arena = TableArena::new();
    let ids: Vec<TableId> = (0..n).map(|_| arena.create()).collect();
    let mut slots: BTreeMap<(usize, i64), usize> = BTreeMap::new();
    for &(from, key, to) in edges {
        arena
            .set(ids[from], Key::Int(key), Value::Table(ids[to]))
            .expect("ids come from this arena");
        slots.insert((from, key), to);
    }

    let mut reachable = BTreeSet::from([0usize]);
    let mut frontier = vec![0usize];
    while let Some(node) = frontier.pop() {
        for (&(from, _), &to) in &slots {
            if from == node && reachable.insert(to) {
                frontier.push(to);
            }
        }
    }

    let mut expected: BTreeMap<usize, usize> = reachable.iter().map(|&r| (r, 0)).collect();
    *expected.entry(0).or_default() += 1;
    for (&(from, _), &to) in &slots {
        if reachable.contains(&from) {
            *expected.entry(to).or_default() += 1;
        }
    }
    Built {
        arena,
        ids,
        expected,
    }
}

proptest! {
    #[test]
    fn prop_census_counts_reachable_edges((n, edges) in arb_graph()) {
        let built = build(n, &edges);
        let c = census(&built.arena, &Value::Table(built.ids[0])).unwrap();

        prop_assert_eq!(c.len(), built.expected.len());
        for (i, id) in built.ids.iter().enumerate() {
            let want = built.expected.get(&i).copied().unwrap_or(0);
            prop_assert_eq!(c.count(*id), want, "node {}", i);
        }
    }

    #[test]
    fn prop_serialize_deep_references((n, edges) in arb_graph()) {
        let built = build(n, &edges);
        let root = Value::Table(built.ids[0]);
        let out = serialize_deep(&built.arena, &root).unwrap();

        let worthy: Vec<usize> = built.expected.values().copied().filter(|&c| c >= 2).collect();
        let defs = out.matches('<').count();
        let backrefs = out.matches('&').count();
        prop_assert_eq!(defs, worthy.len());
        prop_assert_eq!(backrefs, worthy.iter().map(|c| c - 1).sum::<usize>());

        // Same graph, same string.
        prop_assert_eq!(serialize_deep(&built.arena, &root).unwrap(), out);
    }

    #[test]
    fn prop_self_comparison_terminates((n, edges) in arb_graph()) {
        let built = build(n, &edges);
        let root = Value::Table(built.ids[0]);
        prop_assert!(deep_equal(&built.arena, &root, &root));
        prop_assert!(is_subset(&built.arena, &root, &root));
        let bounded = Comparator::new(&built.arena).with_max_depth(0);
        prop_assert_eq!(bounded.deep_equal(&root, &root), Ok(true));
    }
}
