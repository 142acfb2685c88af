use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn validate_trie<V>(t: &Trie<V>) {
    let count = t.nodes.len();
    assert!(count >= 1, "root cell must always exist");
    assert!(count <= t.nodes.capacity(), "count must never exceed capacity");
    assert_eq!(
        t.nodes[NodeRef::ROOT.index()].character, ROOT_CHARACTER,
        "root cell must keep its seed character"
    );

    for (i, node) in t.nodes.iter().enumerate() {
        let links = match &node.slot {
            Slot::Branch { child, sibling } => {
                assert_ne!(
                    node.character, TERMINATOR,
                    "branch cell {i} carries the terminator character"
                );
                vec![*child, *sibling]
            }
            Slot::Terminal { sibling, .. } => {
                assert_eq!(
                    node.character, TERMINATOR,
                    "terminal cell {i} carries a non-terminator character"
                );
                vec![*sibling]
            }
        };
        for link in links {
            if !link.is_none() {
                assert!(
                    link.index() < count,
                    "cell {i} links to {} but only {count} cells exist",
                    link.index()
                );
            }
        }
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, u64),
    Get(Vec<u8>),
    Suggest(Vec<u8>),
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // Keys never contain 0x00: that byte is the terminator symbol, so
    // anything after an interior zero would be unreachable. The narrow
    // alphabet forces long sibling chains and shared prefixes.
    prop_oneof![
        prop::collection::vec(b'a'..=b'e', 1..=8),
        prop::collection::vec(1u8..=255, 1..=16),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        35 => key.clone().prop_map(Op::Get),
        15 => key.clone().prop_map(Op::Suggest),
    ];
    prop::collection::vec(op, 0..=1000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreemap(ops in ops_strategy()) {
        let mut t: Trie<u64> = Trie::with_node_capacity(2).unwrap();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(&key, value).unwrap();
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(key.as_slice()));
                }
                Op::Suggest(key) => {
                    let got = t.suggest(&key).unwrap();
                    if m.contains_key(key.as_slice()) {
                        // A stored key suggests itself, or a stored
                        // extension of it when a longer key was first to
                        // claim the cell at which the input exhausts.
                        prop_assert!(
                            got.starts_with(&key),
                            "suggestion {:?} does not extend stored key {:?}", got, key
                        );
                        prop_assert!(
                            m.contains_key(got.as_slice()),
                            "suggestion {:?} is not a stored key", got
                        );
                    }
                }
            }
        }

        validate_trie(&t);
        for (key, value) in &m {
            prop_assert_eq!(t.get(key), Some(value));
        }
    }

    #[test]
    fn prop_growth_is_loss_free(keys in prop::collection::vec(key_strategy(), 1..=64)) {
        let mut t: Trie<u64> = Trie::with_node_capacity(1).unwrap();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, key) in keys.into_iter().enumerate() {
            let v = i as u64;
            prop_assert_eq!(t.insert(&key, v).unwrap(), m.insert(key, v));
        }

        validate_trie(&t);
        prop_assert!(t.node_count() <= t.node_capacity());
        for (key, value) in &m {
            prop_assert_eq!(t.get(key), Some(value));
        }
    }

    #[test]
    fn prop_suggest_returns_stored_key(
        keys in prop::collection::vec(key_strategy(), 1..=24),
        pick in any::<prop::sample::Index>(),
        suffix in prop::collection::vec(1u8..=255, 1..=6),
    ) {
        let mut t: Trie<u64> = Trie::new();
        let mut stored: BTreeSet<Vec<u8>> = BTreeSet::new();
        for (i, key) in keys.iter().enumerate() {
            t.insert(key, i as u64).unwrap();
            stored.insert(key.clone());
        }

        let stem = pick.get(&keys);
        let mut input = stem.clone();
        input.extend_from_slice(&suffix);

        let got = t.suggest(&input).unwrap();
        prop_assert!(
            stored.contains(&got),
            "suggestion {:?} is not a stored key", got
        );
        prop_assert!(
            got.starts_with(stem),
            "suggestion {:?} does not extend the stem {:?}", got, stem
        );
        validate_trie(&t);
    }

    #[test]
    fn prop_copy_preserves_structure(
        src_keys in prop::collection::vec(key_strategy(), 1..=32),
        dst_keys in prop::collection::vec(key_strategy(), 0..=8),
    ) {
        let mut src: Trie<u64> = Trie::with_node_capacity(2).unwrap();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        for (i, key) in src_keys.into_iter().enumerate() {
            let v = i as u64;
            src.insert(&key, v).unwrap();
            m.insert(key, v);
        }

        // The destination's own contents must be fully discarded.
        let mut dst: Trie<u64> = Trie::with_node_capacity(2).unwrap();
        for (i, key) in dst_keys.iter().enumerate() {
            dst.insert(key, 1000 + i as u64).unwrap();
        }

        dst.copy_from(&src).unwrap();

        prop_assert_eq!(dst.node_count(), src.node_count());
        prop_assert!(dst.node_capacity() >= src.node_count());
        prop_assert_eq!(&dst.nodes, &src.nodes);
        validate_trie(&dst);
        for (key, value) in &m {
            prop_assert_eq!(dst.get(key), Some(value));
        }
    }
}
