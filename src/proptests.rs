use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Check every structural invariant reachable from the root.
fn validate_tree<P: Storage>(t: &TernaryTree<P>) {
    // (node, exclusive lower bound, exclusive upper bound) on this level's key.
    let mut stack: Vec<(NodeId, Option<u8>, Option<u8>)> = Vec::new();
    if let Some(root) = t.root {
        stack.push((root, None, None));
    }

    let mut reachable = 0usize;
    let mut terminals = 0usize;
    while let Some((id, above, below)) = stack.pop() {
        reachable += 1;
        let node = t.nodes.get(id);
        let key = node.key();
        if let Some(above) = above {
            assert!(key > above, "key {key} must sort after {above}");
        }
        if let Some(below) = below {
            assert!(key < below, "key {key} must sort before {below}");
        }

        match node {
            Node::Branch {
                low, equal, high, ..
            } => {
                assert_ne!(key, 0, "branch keys are never the sentinel");
                assert!(
                    low.is_some() || equal.is_some() || high.is_some(),
                    "branch {:?} has no children",
                    key as char
                );
                assert!(equal.is_some(), "branch {:?} lost its middle subtree", key as char);
                stack.extend(low.map(|c| (c, above, Some(key))));
                stack.extend(high.map(|c| (c, Some(key), below)));
                stack.extend(equal.map(|c| (c, None, None)));
            }
            Node::Terminal {
                occurrences,
                payload,
                high,
            } => {
                terminals += 1;
                assert!(*occurrences > 0, "reachable terminal with zero occurrences");
                let word = payload.as_ref();
                assert_eq!(
                    t.search(word),
                    Some(word),
                    "reachable terminal must be searchable"
                );
                stack.extend(high.map(|c| (c, Some(key), below)));
            }
        }
    }

    assert_eq!(terminals, t.len(), "reachable terminals must match len");
    assert_eq!(reachable, t.node_count(), "every live node must be reachable");

    let words: Vec<&str> = t.iter().map(|e| e.word()).collect();
    assert!(
        words.windows(2).all(|w| w[0].as_bytes() < w[1].as_bytes()),
        "traversal must be strictly ascending"
    );
}

fn word_strategy() -> impl Strategy<Value = String> {
    // A small alphabet makes shared prefixes, sibling chains and rotations
    // common.
    prop::collection::vec(b'a'..=b'f', 1..=6)
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "word_strategy()")] String),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "word_strategy()")] String),
    #[proptest(weight = 2)]
    Search(#[proptest(strategy = "word_strategy()")] String),
    Suggest(
        #[proptest(strategy = "word_strategy()")] String,
        #[proptest(strategy = "1usize..8")] usize,
    ),
}

/// Apply `ops` to `t`, checking each result against a multiset model.
fn run_against_model<'w, P>(t: &mut TernaryTree<P>, ops: &'w [Op]) -> Result<(), TestCaseError>
where
    P: Payload<'w>,
{
    let mut m: BTreeMap<&str, u32> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(word) => {
                let got = t.insert(word).expect("valid word").occurrences();
                let count = m.entry(word).or_insert(0);
                *count += 1;
                prop_assert_eq!(got, *count);
            }
            Op::Remove(word) => match t.remove(word) {
                Ok(Removal::NotFound) => prop_assert!(!m.contains_key(word.as_str())),
                Ok(Removal::Retained(entry)) => {
                    let left = entry.occurrences();
                    let count = m.get_mut(word.as_str()).expect("retained word is modelled");
                    *count -= 1;
                    prop_assert_eq!(left, *count);
                }
                Ok(Removal::Removed(payload)) => {
                    prop_assert_eq!(payload.as_ref(), word.as_str());
                    prop_assert_eq!(m.remove(word.as_str()), Some(1));
                }
                Err(TstError::Unrotatable { .. }) => {
                    // Refused removals leave the word in place.
                    prop_assert_eq!(t.occurrences(word), m[word.as_str()]);
                }
                Err(err) => return Err(TestCaseError::fail(format!("remove failed: {err}"))),
            },
            Op::Search(word) => {
                prop_assert_eq!(t.search(word).is_some(), m.contains_key(word.as_str()));
                prop_assert_eq!(t.occurrences(word), m.get(word.as_str()).copied().unwrap_or(0));
            }
            Op::Suggest(prefix, max) => {
                let expected: Vec<&str> = m
                    .keys()
                    .copied()
                    .filter(|w| w.starts_with(prefix.as_str()))
                    .take(*max)
                    .collect();
                match t.suggest(prefix, *max) {
                    Some(got) => prop_assert_eq!(got, expected),
                    None => prop_assert!(expected.is_empty()),
                }
            }
        }

        prop_assert_eq!(t.len(), m.len());
    }

    validate_tree(t);
    let got: Vec<(&str, u32)> = t.iter().map(|e| (e.word(), e.occurrences())).collect();
    let expected: Vec<(&str, u32)> = m.into_iter().collect();
    prop_assert_eq!(got, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_copy(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t = CopyTree::new();
        run_against_model(&mut t, &ops)?;
    }

    #[test]
    fn prop_equivalence_reference(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t = RefTree::new();
        run_against_model(&mut t, &ops)?;
    }

    #[test]
    fn prop_insert_n_remove_n(word in word_strategy(), n in 1u32..6, others in prop::collection::vec(word_strategy(), 0..20)) {
        let mut t = CopyTree::new();
        for other in &others {
            if *other != word {
                t.insert(other).unwrap();
            }
        }
        for _ in 0..n {
            t.insert(&word).unwrap();
        }
        for left in (1..n).rev() {
            match t.remove(&word) {
                Ok(Removal::Retained(entry)) => prop_assert_eq!(entry.occurrences(), left),
                other => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
            }
            prop_assert_eq!(t.search(&word), Some(word.as_str()));
        }
        match t.remove(&word) {
            Ok(Removal::Removed(payload)) => {
                prop_assert_eq!(&*payload, word.as_str());
                prop_assert_eq!(t.search(&word), None);
            }
            Err(TstError::Unrotatable { .. }) => prop_assert_eq!(t.occurrences(&word), 1),
            other => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
        }
        validate_tree(&t);
    }

    #[test]
    fn prop_prefix_completeness(words in prop::collection::vec(word_strategy(), 1..60), pick in any::<prop::sample::Index>()) {
        let mut t = CopyTree::new();
        for w in &words {
            t.insert(w).unwrap();
        }
        let word = pick.get(&words);
        for end in 1..=word.len() {
            let prefix = &word[..end];
            let found = t.suggest(prefix, usize::MAX).expect("prefix of a stored word");
            prop_assert_eq!(found.iter().filter(|w| **w == word.as_str()).count(), 1);
            prop_assert!(found.iter().all(|w| w.starts_with(prefix)));
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&str; 6] = ["a", "b", "c", "aa", "ab", "ba"];

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = RefTree::new();
        for w in &perm {
            t.insert(w).unwrap();
        }

        validate_tree(&t);
        let got: Vec<&str> = t.iter().map(|e| e.word()).collect();
        let mut expected = SMALL_SET.to_vec();
        expected.sort_unstable();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Insert in a fixed order, then remove in all permutations.
    let mut base = CopyTree::new();
    for w in SMALL_SET {
        base.insert(w).unwrap();
    }

    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = base.clone();
        let mut left = SMALL_SET.len();

        for w in perm {
            assert!(
                matches!(t.remove(w), Ok(Removal::Removed(_))),
                "removing {w:?}"
            );
            left -= 1;
            assert_eq!(t.len(), left);
            assert_eq!(t.search(w), None);
            validate_tree(&t);
        }
        assert!(t.is_empty());
        assert!(t.root.is_none());
        assert_eq!(t.node_count(), 0);
    });
}

#[test]
fn exhaustive_rotations_keep_structure() {
    // Every insert order of one sibling family, then every removal order.
    // Refused removals must leave a valid tree.
    let words = ["m", "f", "t", "h", "p"];
    for_each_permutation(&words, |inserts| {
        let mut base = CopyTree::new();
        for w in &inserts {
            base.insert(w).unwrap();
        }
        for_each_permutation(&words, |removals| {
            let mut t = base.clone();
            for w in removals {
                match t.remove(w) {
                    Ok(Removal::Removed(_)) => assert_eq!(t.search(w), None),
                    Err(TstError::Unrotatable { .. }) => assert_eq!(t.search(w), Some(w)),
                    other => panic!("unexpected {other:?}"),
                }
                validate_tree(&t);
            }
        });
    });
}

#[test]
fn unrotatable_shape_is_reported() {
    let mut t = CopyTree::new();
    for w in ["m", "f", "t", "h", "p"] {
        t.insert(w).unwrap();
    }
    assert_eq!(t.remove("m").unwrap_err(), TstError::Unrotatable { key: 'm' });
    validate_tree(&t);
    assert_eq!(
        t.iter().map(|e| e.word()).collect::<Vec<_>>(),
        vec!["f", "h", "m", "p", "t"]
    );
}
