//! Re-running the evaluation baselines over an unchanged test corpus must not
//! grow the `test_scores` table: the "idempotence" testable property,
//! exercised here at the crate's public boundary rather than through a
//! private `#[cfg(test)]` module since it spans `store`, `corpus`, and
//! `baselines` together.

use graphstudy::baselines;
use graphstudy::constants::Generator;
use graphstudy::corpus::LabeledPair;
use graphstudy::ids::Id16;
use graphstudy::store::Graph;
use graphstudy::store::Store;

fn sample_graph(id: Id16) -> Graph {
    Graph {
        id,
        generator: Generator::Rome,
        file: "graphs/sample.xml.gz".into(),
        nodes: 12,
        edges: 20,
        native: true,
        seed: None,
        fingerprint: None,
        poisoned: false,
    }
}

#[test]
fn evaluating_the_expected_baseline_twice_adds_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();

    let graph = Id16::random(&mut rand::rng());
    let lhs = Id16::random(&mut rand::rng());
    let rhs = Id16::random(&mut rand::rng());
    {
        let txn = store.begin().unwrap();
        txn.insert_graph(&sample_graph(graph)).unwrap();
        txn.commit().unwrap();
    }

    let pair = LabeledPair { graph, lhs, rhs, label: 0.5 };

    baselines::evaluate_expected(&mut store, &[pair.clone()]).unwrap();
    baselines::evaluate_expected(&mut store, &[pair]).unwrap();

    let scores = store.all_test_scores().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].lhs, lhs);
    assert_eq!(scores[0].rhs, rhs);
}
