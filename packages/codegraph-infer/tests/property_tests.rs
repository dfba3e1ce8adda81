//! Property-based tests
//!
//! Invariants that must hold for arbitrary weights and labelings:
//! - Score consistency: tracked score == recomputed score after any moves
//! - Index agreement: every ranked list is the top-K of the weight store
//! - Legality: inference only assigns candidate labels (or `unknown`)
//! - Monotonic local search: every pass with accepted moves raises the score
//! - SSVM: one update widens the gold/violator gap by at least
//!   `learning_rate` per changed feature

mod common;

use codegraph_infer::config::{IndexConfig, InferenceConfig, SolverKind};
use codegraph_infer::pipeline::SolverStats;
use codegraph_infer::{Assignment, FactorFeature, FeatureIndex, QueryBuilder, WeightStore};
use common::*;
use proptest::prelude::*;

fn weights_strategy() -> impl Strategy<Value = Vec<((u32, u32, u32), f64)>> {
    prop::collection::vec(((0u32..5, 0u32..5, 0u32..2), -5.0f64..5.0), 0..40)
}

fn store_from(weights: &[((u32, u32, u32), f64)], factors: &[(Vec<u32>, f64)]) -> WeightStore {
    let store = WeightStore::new();
    for &((a, b, kind), w) in weights {
        store.set(&pair(a, b, kind), w);
    }
    for (labels, w) in factors {
        store.set(&FactorFeature::from_labels(labels.iter().copied()).into(), *w);
    }
    store
}

proptest! {
    #[test]
    fn prop_incremental_score_matches_recompute(
        weights in weights_strategy(),
        factors in prop::collection::vec((prop::collection::vec(0u32..5, 3), -3.0f64..3.0), 0..10),
        moves in prop::collection::vec((0usize..5, 0u32..5), 1..30),
    ) {
        let store = store_from(&weights, &factors);

        let mut builder = QueryBuilder::new(UNKNOWN);
        for _ in 0..5 {
            builder.add_node(0, 1..5);
        }
        builder.add_arc(0, 1, 0).unwrap();
        builder.add_arc(1, 2, 1).unwrap();
        builder.add_arc(2, 3, 0).unwrap();
        builder.add_arc(3, 3, 1).unwrap();
        builder.add_arc(4, 0, 0).unwrap();
        builder.add_factor([0, 2, 4]).unwrap();
        builder.add_factor([1, 3, 4]).unwrap();
        let query = builder.build();

        let mut a = Assignment::new(&query, &store);
        for chunk in moves.chunks(3) {
            a.apply_moves(chunk, &store);
            prop_assert!((a.score() - a.recompute_score(&store)).abs() < 1e-9);
        }

        a.enable_gold_penalty(0.7);
        a.set_label(2, 4, &store);
        prop_assert!((a.score() - a.recompute_score(&store)).abs() < 1e-9);
    }

    #[test]
    fn prop_index_lists_are_top_k(weights in weights_strategy(), top_k in 1usize..6) {
        let store = store_from(&weights, &[]);
        let index = FeatureIndex::build(&store, IndexConfig::default().pairwise_top_k(top_k));

        for kind in 0..2u32 {
            for label in 0..5u32 {
                let mut expected: Vec<f64> = store
                    .pairwise()
                    .entries()
                    .into_iter()
                    .filter(|(f, _)| f.kind == kind && f.a == label)
                    .map(|(_, w)| w)
                    .collect();
                expected.sort_by(|x, y| y.total_cmp(x));
                expected.truncate(top_k);

                let actual: Vec<f64> = index
                    .top_pairwise(kind, Some(label), None)
                    .map(|r| r.weight)
                    .collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }

    #[test]
    fn prop_inference_assigns_only_candidates(
        weights in weights_strategy(),
        candidates in prop::collection::vec(prop::collection::btree_set(1u32..5, 0..4), 4),
    ) {
        let mut builder = QueryBuilder::new(UNKNOWN);
        for set in &candidates {
            builder.add_node(0, set.iter().copied());
        }
        for i in 0..4 {
            builder.add_arc(i, (i + 1) % 4, (i % 2) as u32).unwrap();
        }
        let query = builder.build();

        for solver in [SolverKind::LocalSearch, SolverKind::LoopyBp] {
            let engine = engine_with(InferenceConfig::default().solver(solver), &weights);
            let mut a = engine.create_assignment(&query);
            engine.map_inference(&mut a);

            for (node, set) in candidates.iter().enumerate() {
                let label = a.label(node);
                if set.is_empty() {
                    prop_assert_eq!(label, UNKNOWN);
                } else {
                    prop_assert!(set.contains(&label), "{:?} gave {} for node {}", solver, label, node);
                }
            }
            prop_assert!((a.score() - engine.get_assignment_score(&a)).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_local_search_is_monotone(
        weights in weights_strategy(),
        max_passes in 1usize..6,
        arc_pass in any::<bool>(),
    ) {
        let engine = engine_with(
            InferenceConfig::default().local_search(|c| c.max_passes(max_passes).arc_pass(arc_pass)),
            &weights,
        );
        let mut builder = QueryBuilder::new(UNKNOWN);
        for _ in 0..6 {
            builder.add_node(0, 1..5);
        }
        for i in 1..6 {
            builder.add_arc(i - 1, i, (i % 2) as u32).unwrap();
        }
        builder.add_arc(5, 0, 0).unwrap();
        let query = builder.build();

        let mut a = engine.create_assignment(&query);
        let stats = match engine.map_inference(&mut a) {
            SolverStats::LocalSearch(stats) => stats,
            other => panic!("expected local search, got {:?}", other),
        };

        prop_assert!(stats.final_score >= stats.initial_score);
        prop_assert_eq!(stats.pass_log.len(), stats.passes);
        let mut previous = stats.initial_score;
        for record in &stats.pass_log {
            if record.moves > 0 {
                prop_assert!(record.score > previous, "{} -> {}", previous, record.score);
            } else {
                prop_assert_eq!(record.score, previous);
            }
            previous = record.score;
        }
        prop_assert_eq!(previous, stats.final_score);
    }

    #[test]
    fn prop_ssvm_update_widens_gap(
        weights in weights_strategy(),
        gold_labels in prop::collection::vec(1u32..4, 5),
        learning_rate in 0.01f64..1.0,
        margin in 0.0f64..2.0,
    ) {
        let engine = engine_with(
            InferenceConfig::default().learning(|c| c.svm_margin(margin)),
            &weights,
        );
        let query = chain_query(5, &[1, 2, 3], 0);
        let moves: Vec<_> = gold_labels.iter().copied().enumerate().collect();
        let mut gold = engine.create_assignment(&query);
        gold.apply_moves(&moves, engine.weights());

        let outcome = engine.ssvm_learn(&gold, learning_rate);
        let gap_before = outcome.gold_score - outcome.violator_score;

        let mut violator = engine.create_assignment(&query);
        let violator_moves: Vec<_> = outcome.violator_labels.iter().copied().enumerate().collect();
        violator.apply_moves(&violator_moves, engine.weights());
        let gap_after =
            engine.get_assignment_score(&gold) - engine.get_assignment_score(&violator);

        let required = learning_rate * outcome.updated_features as f64;
        prop_assert!(
            gap_after - gap_before >= required - 1e-9,
            "gap {} -> {}, required {}",
            gap_before,
            gap_after,
            required
        );
    }
}
