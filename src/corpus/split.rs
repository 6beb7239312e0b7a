//! Graph-level train/test split: a random subset of graph ids is reserved
//! for testing, reshuffled until both sides are non-empty.

use crate::ids::Id16;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::BTreeSet;

const TEST_GRAPH_FRACTION: f64 = 0.25;

pub fn split_graphs(graphs: &[Id16], rng: &mut impl RngCore) -> (BTreeSet<Id16>, BTreeSet<Id16>) {
    if graphs.len() < 2 {
        return (graphs.iter().copied().collect(), BTreeSet::new());
    }
    let test_count = ((graphs.len() as f64 * TEST_GRAPH_FRACTION).round() as usize).clamp(1, graphs.len() - 1);
    loop {
        let mut shuffled = graphs.to_vec();
        shuffled.shuffle(rng);
        let test: BTreeSet<Id16> = shuffled[..test_count].iter().copied().collect();
        let train: BTreeSet<Id16> = shuffled[test_count..].iter().copied().collect();
        if !test.is_empty() && !train.is_empty() {
            return (train, test);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn single_graph_goes_entirely_to_training() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let ids = vec![Id16::random(&mut rng)];
        let (train, test) = split_graphs(&ids, &mut rng);
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn both_sides_nonempty_for_several_graphs() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let ids: Vec<Id16> = (0..8).map(|_| Id16::random(&mut rng)).collect();
        let (train, test) = split_graphs(&ids, &mut rng);
        assert!(!train.is_empty());
        assert!(!test.is_empty());
        assert_eq!(train.len() + test.len(), ids.len());
    }
}
