//! # Property-Based Tests
//!
//! Invariants of the exposure-weighted sampler and the practice loop.

#![allow(clippy::float_arithmetic)]

use proptest::collection::vec;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use recital_core::{Candidate, Library, SelectionRequest, Title, WeightedSampler};
use std::collections::BTreeSet;

fn candidates_from(weights: &[u64]) -> Vec<Candidate> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| Candidate::new(format!("poem-{i}"), format!("content {i}"), *w))
        .collect()
}

proptest! {
    /// A draw returns exactly min(count, N) items.
    #[test]
    fn selection_size_is_clamped(
        weights in vec(0u64..1000, 0..40),
        count in 0usize..60,
        seed in any::<u64>(),
    ) {
        let candidates = candidates_from(&weights);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selection = WeightedSampler::select_with_rng(&candidates, count, &mut rng);

        prop_assert_eq!(selection.len(), count.min(candidates.len()));
    }

    /// No candidate is drawn twice, and the reweight set equals the selection.
    #[test]
    fn selection_has_no_duplicates(
        weights in vec(0u64..u64::MAX, 1..40),
        count in 0usize..60,
        seed in any::<u64>(),
    ) {
        let candidates = candidates_from(&weights);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selection = WeightedSampler::select_with_rng(&candidates, count, &mut rng);

        let titles: BTreeSet<Title> = selection.titles().cloned().collect();
        prop_assert_eq!(titles.len(), selection.len());
        prop_assert_eq!(&titles, &selection.reweight);
    }

    /// Every selected excerpt comes from the candidate pool with its own content.
    #[test]
    fn selection_is_drawn_from_pool(
        weights in vec(0u64..50, 1..20),
        count in 1usize..20,
        seed in any::<u64>(),
    ) {
        let candidates = candidates_from(&weights);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selection = WeightedSampler::select_with_rng(&candidates, count, &mut rng);

        for excerpt in &selection.selected {
            let source = candidates.iter().find(|c| c.title == excerpt.title);
            prop_assert!(source.is_some());
            if let Some(source) = source {
                prop_assert_eq!(&source.content, &excerpt.content);
            }
        }
    }

    /// The single-draw distribution is a probability distribution,
    /// and lower weight never means lower probability.
    #[test]
    fn distribution_is_normalized_and_monotone(weights in vec(0u64..10_000, 1..30)) {
        let candidates = candidates_from(&weights);
        let dist = WeightedSampler::distribution(&candidates);

        let total: f64 = dist.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);

        for i in 0..weights.len() {
            prop_assert!(dist[i] > 0.0);
            for j in 0..weights.len() {
                if weights[i] < weights[j] {
                    prop_assert!(dist[i] > dist[j]);
                }
            }
        }
    }

    /// Same seed, same input, same draw.
    #[test]
    fn seeded_selection_is_reproducible(
        weights in vec(0u64..100, 1..30),
        count in 0usize..30,
        seed in any::<u64>(),
    ) {
        let candidates = candidates_from(&weights);
        let mut rng1 = ChaCha8Rng::seed_from_u64(seed);
        let mut rng2 = ChaCha8Rng::seed_from_u64(seed);

        prop_assert_eq!(
            WeightedSampler::select_with_rng(&candidates, count, &mut rng1),
            WeightedSampler::select_with_rng(&candidates, count, &mut rng2)
        );
    }

    /// Negative requested counts behave like zero.
    #[test]
    fn negative_counts_clamp_to_zero(count in i64::MIN..0) {
        prop_assert_eq!(SelectionRequest::clamped(count).count, 0);
    }

    /// Total exposure grows by exactly the number of poems served.
    #[test]
    fn library_weights_track_draws(
        poem_count in 1usize..8,
        draws in vec(0i64..5, 1..20),
        seed in any::<u64>(),
    ) {
        let mut library = Library::new();
        for i in 0..poem_count {
            let title = format!("poem-{i}");
            library.add(&title, "text").expect("add");
            library.study(&title).expect("study");
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut served = 0u64;
        for count in draws {
            let outcome = library.draw_with_rng(Some(count), &mut rng).expect("draw");
            prop_assert!(outcome.unpersisted.is_empty());
            served += outcome.selection.len() as u64;
        }

        let mut total = 0u64;
        for i in 0..poem_count {
            let poem = library.poem(&format!("poem-{i}")).expect("get").expect("present");
            total += poem.weight.value();
        }
        prop_assert_eq!(total, served);
    }
}
