//! Greedy decision-tree induction over a fixed list of cases.
//!
//! Used to synthesize dispatch over overloaded operations: the cases are
//! overload signatures and the discriminants are probes such as "arity" or
//! "type of argument 2". At every node the discriminant whose partition has
//! the highest score is chosen; the tree narrows the candidate set but does
//! not promise a unique match, so leaves may hold several cases.
//!
//! Building is total: it always terminates and never fails.
//!
//! # Example
//!
//! ```
//! use strata_registry::{DecisionTree, build_decision_tree};
//!
//! let tree = build_decision_tree(vec![1, 2, 3, 4], vec!["even", "small"], |case, probe| {
//!     match *probe {
//!         "even" => vec![case % 2 == 0],
//!         _ => vec![*case <= 2],
//!     }
//! });
//! assert_eq!(tree.discriminant(), Some(&"even"));
//! assert_eq!(tree.leaves().len(), 4);
//! ```

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// A classification tree over cases `C`, split by discriminants `D` whose
/// categories are keys `K`.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionTree<C, D, K> {
    /// The cases that remain once no further split helps.
    Leaf { cases: Vec<C> },
    /// A split on `discriminant`. `cases` is every case reaching this node;
    /// `choices` maps category keys to subtrees in first-seen order.
    Inner {
        discriminant: D,
        cases: Vec<C>,
        choices: Vec<(K, DecisionTree<C, D, K>)>,
    },
}

impl<C, D, K> DecisionTree<C, D, K> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, DecisionTree::Leaf { .. })
    }

    /// Every case reaching this node.
    pub fn cases(&self) -> &[C] {
        match self {
            DecisionTree::Leaf { cases } | DecisionTree::Inner { cases, .. } => cases,
        }
    }

    pub fn discriminant(&self) -> Option<&D> {
        match self {
            DecisionTree::Leaf { .. } => None,
            DecisionTree::Inner { discriminant, .. } => Some(discriminant),
        }
    }

    pub fn choices(&self) -> &[(K, DecisionTree<C, D, K>)] {
        match self {
            DecisionTree::Leaf { .. } => &[],
            DecisionTree::Inner { choices, .. } => choices,
        }
    }

    /// Subtree for category `key`, if this node splits on it.
    pub fn choice(&self, key: &K) -> Option<&DecisionTree<C, D, K>>
    where
        K: PartialEq,
    {
        self.choices()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, subtree)| subtree)
    }

    /// Number of splits on the longest path to a leaf.
    pub fn depth(&self) -> usize {
        self.choices()
            .iter()
            .map(|(_, subtree)| subtree.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Case lists of every leaf, left to right.
    pub fn leaves(&self) -> Vec<&[C]> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a [C]>) {
        match self {
            DecisionTree::Leaf { cases } => out.push(cases),
            DecisionTree::Inner { choices, .. } => {
                for (_, subtree) in choices {
                    subtree.collect_leaves(out);
                }
            }
        }
    }

    /// Walk the tree for one concrete input.
    ///
    /// `probe` classifies the input under a discriminant. When it cannot
    /// (`None`), the walk stops and every case reaching that node is
    /// returned. An input whose category has no branch matches nothing.
    pub fn select(&self, mut probe: impl FnMut(&D) -> Option<K>) -> &[C]
    where
        K: PartialEq,
    {
        let mut node = self;
        loop {
            match node {
                DecisionTree::Leaf { cases } => return cases,
                DecisionTree::Inner {
                    discriminant,
                    cases,
                    ..
                } => {
                    let Some(key) = probe(discriminant) else {
                        return cases;
                    };
                    match node.choice(&key) {
                        Some(next) => node = next,
                        None => return &[],
                    }
                }
            }
        }
    }
}

/// Build a decision tree by greedy induction.
///
/// `categorize(case, discriminant)` returns the category keys of a case
/// under a discriminant. A case with several keys is ambiguous and is
/// placed under each of them; a case with none is placed under every key.
///
/// 1. One case or fewer, or no discriminants left: a leaf.
/// 2. Score each discriminant as the entropy of its partition minus the
///    entropy of the undivided case set; the first maximal score wins.
/// 3. A winning partition with a single bucket cannot separate anything: a leaf.
/// 4. Otherwise split, and recurse into each bucket without that discriminant.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn build_decision_tree<C, D, K, F>(
    cases: Vec<C>,
    discriminants: Vec<D>,
    mut categorize: F,
) -> DecisionTree<C, D, K>
where
    C: Clone,
    D: Clone,
    K: Eq + Hash + Clone,
    F: FnMut(&C, &D) -> Vec<K>,
{
    let candidates: Vec<usize> = (0..discriminants.len()).collect();
    build(cases, &discriminants, &candidates, &mut categorize)
}

/// Cases split by category key; `buckets[i]` holds indices of the cases under `keys[i]`.
struct Partition<K> {
    keys: Vec<K>,
    buckets: Vec<Vec<usize>>,
}

impl<K: Eq + Hash + Clone> Partition<K> {
    fn new<C, D, F>(cases: &[C], discriminant: &D, categorize: &mut F) -> Self
    where
        F: FnMut(&C, &D) -> Vec<K>,
    {
        let mut index: FxHashMap<K, usize> = FxHashMap::default();
        let mut keys = Vec::new();
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut uncategorized = Vec::new();

        for (i, case) in cases.iter().enumerate() {
            let categories = categorize(case, discriminant);
            if categories.is_empty() {
                uncategorized.push(i);
                continue;
            }
            for key in categories {
                let slot = *index.entry(key.clone()).or_insert_with(|| {
                    keys.push(key);
                    buckets.push(Vec::new());
                    buckets.len() - 1
                });
                // A case listing the same key twice still lands in the bucket once.
                if buckets[slot].last() != Some(&i) {
                    buckets[slot].push(i);
                }
            }
        }

        for bucket in &mut buckets {
            bucket.extend_from_slice(&uncategorized);
            bucket.sort_unstable();
        }

        Self { keys, buckets }
    }

    fn entropy(&self) -> f64 {
        entropy(self.buckets.iter().map(Vec::len))
    }
}

/// Shannon entropy, in bits, of a partition with the given bucket sizes.
fn entropy(sizes: impl Iterator<Item = usize>) -> f64 {
    // Sorted so that partitions with equal size multisets score identically.
    let mut sizes: Vec<usize> = sizes.filter(|&n| n > 0).collect();
    sizes.sort_unstable();
    let total: usize = sizes.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    sizes
        .into_iter()
        .map(|n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

fn build<C, D, K, F>(
    cases: Vec<C>,
    discriminants: &[D],
    candidates: &[usize],
    categorize: &mut F,
) -> DecisionTree<C, D, K>
where
    C: Clone,
    D: Clone,
    K: Eq + Hash + Clone,
    F: FnMut(&C, &D) -> Vec<K>,
{
    if cases.len() <= 1 || candidates.is_empty() {
        return DecisionTree::Leaf { cases };
    }

    let baseline = entropy(std::iter::once(cases.len()));
    let mut best: Option<(f64, usize, Partition<K>)> = None;
    for (position, &candidate) in candidates.iter().enumerate() {
        let partition = Partition::new(&cases, &discriminants[candidate], categorize);
        let score = partition.entropy() - baseline;
        if best.as_ref().is_none_or(|(best_score, _, _)| score > *best_score) {
            best = Some((score, position, partition));
        }
    }

    let Some((_, position, partition)) = best else {
        return DecisionTree::Leaf { cases };
    };
    if partition.keys.len() <= 1 {
        return DecisionTree::Leaf { cases };
    }

    let discriminant = discriminants[candidates[position]].clone();
    let remaining: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != position)
        .map(|(_, &candidate)| candidate)
        .collect();

    let choices = partition
        .keys
        .into_iter()
        .zip(partition.buckets)
        .map(|(key, bucket)| {
            let bucket_cases = bucket.iter().map(|&i| cases[i].clone()).collect();
            (key, build(bucket_cases, discriminants, &remaining, categorize))
        })
        .collect();

    DecisionTree::Inner {
        discriminant,
        cases,
        choices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fmt::Display;

    /// `(discriminant: key => subtree; ...)` with leaves as `[case, ...]`.
    fn render<C: Display, D, K>(
        tree: &DecisionTree<C, D, K>,
        describe: &impl Fn(&D) -> String,
        key: &impl Fn(&K) -> String,
    ) -> String {
        match tree {
            DecisionTree::Leaf { cases } => {
                let cases: Vec<String> = cases.iter().map(ToString::to_string).collect();
                format!("[{}]", cases.join(", "))
            }
            DecisionTree::Inner {
                discriminant,
                choices,
                ..
            } => {
                let choices: Vec<String> = choices
                    .iter()
                    .map(|(k, subtree)| format!("{} => {}", key(k), render(subtree, describe, key)))
                    .collect();
                format!("({}: {})", describe(discriminant), choices.join("; "))
            }
        }
    }

    fn char_at(s: &str, index: usize) -> Option<char> {
        s.chars().nth(index)
    }

    /// One `case[i] <= pivot` probe per distinct character at each index.
    fn comparison_tree(cases: &[&'static str]) -> String {
        let max_len = cases.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut probes: Vec<(usize, Option<char>)> = Vec::new();
        for index in 0..max_len {
            for case in cases {
                let probe = (index, char_at(case, index));
                if !probes.contains(&probe) {
                    probes.push(probe);
                }
            }
        }
        let tree = build_decision_tree(cases.to_vec(), probes, |case, &(index, pivot)| {
            vec![char_at(case, index) <= pivot]
        });
        render(
            &tree,
            &|&(index, pivot)| match pivot {
                Some(c) => format!("case[{index}] <= {c:?}"),
                None => format!("case[{index}] <= none"),
            },
            &|k: &bool| k.to_string(),
        )
    }

    #[test]
    fn binary_search_is_found_for_sorted_letters() {
        assert_eq!(
            comparison_tree(&["a", "b", "c", "d", "e", "f", "g", "h"]),
            "(case[0] <= 'd': \
             true => (case[0] <= 'b': \
               true => (case[0] <= 'a': true => [a]; false => [b]); \
               false => (case[0] <= 'c': true => [c]; false => [d])); \
             false => (case[0] <= 'f': \
               true => (case[0] <= 'e': true => [e]; false => [f]); \
               false => (case[0] <= 'g': true => [g]; false => [h])))"
        );
    }

    #[test]
    fn uneven_split_of_short_words() {
        assert_eq!(
            comparison_tree(&["one", "two", "three", "four", "five"]),
            "(case[0] <= 'o': true => (case[0] <= 'f': false => [one]; \
             true => (case[1] <= 'n': false => [four]; true => [five])); \
             false => (case[1] <= 'n': false => [two]; true => [three]))"
        );
    }

    #[test]
    fn indistinguishable_cases_share_a_leaf() {
        assert_eq!(
            comparison_tree(&["feed", "food", "good", "gold", "food", "glad"]),
            "(case[0] <= 'f': true => (case[1] <= 'e': true => [feed]; false => [food, food]); \
             false => (case[1] <= 'l': false => (case[2] <= 'l': false => [good]; true => [gold]); \
             true => [glad]))"
        );
    }

    #[test]
    fn switching_on_exact_characters() {
        let words = vec![
            "anthropomorphologically",
            "blepharosphincterectomy",
            "epididymodeferentectomy",
            "formaldehydesulphoxylic",
            "gastroenteroanastomosis",
            "hematospectrophotometer",
            "macracanthrorhynchiasis",
            "pancreaticoduodenostomy",
            "pathologicohistological",
            "pericardiomediastinitis",
            "phenolsulphonephthalein",
            "philosophicotheological",
            "pseudolamellibranchiate",
            "scientificogeographical",
            "thymolsulphonephthalein",
            "transubstantiationalist",
        ];
        let tree = build_decision_tree(words, (0..23).collect(), |case, &index| {
            vec![char_at(case, index)]
        });
        let rendered = render(
            &tree,
            &|index: &usize| format!("case[{index}]"),
            &|k: &Option<char>| k.map_or("none".to_string(), |c| format!("{c:?}")),
        );
        assert_eq!(
            rendered,
            "(case[3]: \
             'h' => (case[0]: 'a' => [anthropomorphologically]; 'p' => [pathologicohistological]); \
             'p' => [blepharosphincterectomy]; \
             'd' => [epididymodeferentectomy]; \
             'm' => (case[0]: 'f' => [formaldehydesulphoxylic]; 't' => [thymolsulphonephthalein]); \
             't' => [gastroenteroanastomosis]; \
             'a' => [hematospectrophotometer]; \
             'r' => [macracanthrorhynchiasis]; \
             'c' => [pancreaticoduodenostomy]; \
             'i' => [pericardiomediastinitis]; \
             'n' => (case[0]: 'p' => [phenolsulphonephthalein]; 't' => [transubstantiationalist]); \
             'l' => [philosophicotheological]; \
             'u' => [pseudolamellibranchiate]; \
             'e' => [scientificogeographical])"
        );
    }

    #[test]
    fn uncategorized_cases_go_to_every_bucket() {
        let tree = build_decision_tree(vec!["x", "y", "*"], vec![()], |case, _| match *case {
            "*" => vec![],
            other => vec![other.to_string()],
        });
        assert_eq!(tree.leaves(), vec![&["x", "*"][..], &["y", "*"][..]]);
    }

    #[test]
    fn single_bucket_is_a_leaf() {
        let tree = build_decision_tree(vec![1, 2, 3], vec!["constant"], |_, _| vec![0]);
        assert!(tree.is_leaf());
        assert_eq!(tree.cases(), &[1, 2, 3]);
    }

    #[test]
    fn no_cases_is_an_empty_leaf() {
        let tree = build_decision_tree(Vec::<u8>::new(), vec![0], |c, _| vec![*c]);
        assert!(tree.is_leaf());
        assert!(tree.cases().is_empty());
    }

    #[test]
    fn select_follows_probe_and_stops_when_unknown() {
        let tree = build_decision_tree(vec![1, 2, 3, 4], vec!["parity"], |c, _| vec![c % 2]);
        assert_eq!(tree.select(|_| Some(0)), &[2, 4]);
        assert_eq!(tree.select(|_| None), &[1, 2, 3, 4]);
        assert!(tree.select(|_| Some(7)).is_empty());
    }

    #[test]
    fn zero_baseline_keeps_partition_entropy_as_score() {
        assert_eq!(entropy(std::iter::once(5)), 0.0);
        assert!((entropy([2usize, 2].into_iter()) - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn building_terminates_with_non_empty_leaves(
            cases in proptest::collection::vec(0u8..16, 0..24),
            probes in proptest::collection::vec(1u8..5, 0..6),
        ) {
            let was_empty = cases.is_empty();
            let tree = build_decision_tree(cases, probes, |case, modulus| {
                if case % 7 == 0 { Vec::new() } else { vec![case % modulus] }
            });
            for leaf in tree.leaves() {
                prop_assert!(was_empty || !leaf.is_empty());
            }
        }
    }
}
