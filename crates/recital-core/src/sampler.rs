//! # Weighted Sampler
//!
//! Exposure-weighted selection without replacement.
//!
//! Every candidate gets an unnormalized mass of `1 / (weight + 1)`: a poem
//! never served has mass 1, a poem served once 0.5, and so on. Mass decays
//! harmonically and never reaches zero, so well-practiced poems become rare
//! but stay reachable.
//!
//! A draw of `k` items repeats `k` times: normalize the masses of the
//! remaining pool, pick one index from that distribution, remove it. The
//! sampler is pure. It reports the titles whose weight must go up by one
//! (`Selection::reweight`) and leaves persisting that to the caller.
//!
//! Functions without `_with_rng` use `rand::rng()` and are not reproducible.
//! Tests pass a seeded RNG.

// Probability math is the one place floats are allowed in this workspace.
#![allow(clippy::float_arithmetic)]

use crate::{Candidate, ExposureWeight, Selection};
use rand::Rng;

// =============================================================================
// SELECTION REQUEST
// =============================================================================

/// Requested draw size, clamped at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRequest {
    pub count: usize,
}

impl SelectionRequest {
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self { count }
    }

    /// Build a request from untrusted signed input. Negative counts become 0.
    #[must_use]
    pub fn clamped(count: i64) -> Self {
        Self {
            count: usize::try_from(count.max(0)).unwrap_or(usize::MAX),
        }
    }
}

// =============================================================================
// SAMPLER
// =============================================================================

/// Stateless exposure-weighted sampler.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedSampler;

impl WeightedSampler {
    /// Unnormalized selection mass for a given exposure weight.
    #[must_use]
    pub fn mass(weight: ExposureWeight) -> f64 {
        1.0 / (weight.value() as f64 + 1.0)
    }

    /// Normalized single-draw probabilities for `candidates`, in input order.
    #[must_use]
    pub fn distribution(candidates: &[Candidate]) -> Vec<f64> {
        let masses: Vec<f64> = candidates.iter().map(|c| Self::mass(c.weight)).collect();
        normalize(&masses)
    }

    /// Select `min(count, candidates.len())` distinct candidates.
    pub fn select(candidates: &[Candidate], count: usize) -> Selection {
        let mut rng = rand::rng();
        Self::select_with_rng(candidates, count, &mut rng)
    }

    /// Select with a caller-supplied RNG (deterministic for a seeded RNG).
    pub fn select_with_rng<R: Rng + ?Sized>(
        candidates: &[Candidate],
        count: usize,
        rng: &mut R,
    ) -> Selection {
        let effective = count.min(candidates.len());
        if effective == 0 {
            return Selection::empty();
        }

        let mut pool: Vec<(&Candidate, f64)> = candidates
            .iter()
            .map(|c| (c, Self::mass(c.weight)))
            .collect();
        let mut drawn = Vec::with_capacity(effective);

        for _ in 0..effective {
            let masses: Vec<f64> = pool.iter().map(|(_, m)| *m).collect();
            let index = draw_index(&normalize(&masses), rng);
            let (candidate, _) = pool.remove(index);
            drawn.push(candidate.clone());
        }

        Selection::from_drawn(drawn)
    }
}

/// Divide each mass by the total. A zero, NaN, or infinite total
/// yields the uniform distribution instead.
fn normalize(masses: &[f64]) -> Vec<f64> {
    if masses.is_empty() {
        return Vec::new();
    }

    let total: f64 = masses.iter().sum();
    if !total.is_finite() || total <= 0.0 || masses.iter().any(|m| !m.is_finite() || *m < 0.0) {
        let uniform = 1.0 / masses.len() as f64;
        return vec![uniform; masses.len()];
    }

    masses.iter().map(|m| m / total).collect()
}

/// Pick one index from a normalized, non-empty distribution.
fn draw_index<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> usize {
    let last = probabilities.len().saturating_sub(1);
    let target: f64 = rng.random();

    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if target < cumulative {
            return i;
        }
    }

    // Rounding left the cumulative sum just under 1.0.
    last
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Title;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{BTreeMap, BTreeSet};

    fn pool(weights: &[(&str, u64)]) -> Vec<Candidate> {
        weights
            .iter()
            .map(|(t, w)| Candidate::new(*t, format!("text of {t}"), *w))
            .collect()
    }

    #[test]
    fn mass_decays_harmonically() {
        assert!((WeightedSampler::mass(ExposureWeight::new(0)) - 1.0).abs() < 1e-12);
        assert!((WeightedSampler::mass(ExposureWeight::new(1)) - 0.5).abs() < 1e-12);
        assert!((WeightedSampler::mass(ExposureWeight::new(3)) - 0.25).abs() < 1e-12);
        assert!(WeightedSampler::mass(ExposureWeight::new(u64::MAX)) > 0.0);
    }

    #[test]
    fn distribution_matches_worked_example() {
        let candidates = pool(&[("A", 0), ("B", 1), ("C", 3)]);
        let dist = WeightedSampler::distribution(&candidates);

        assert!((dist[0] - 1.0 / 1.75).abs() < 1e-9);
        assert!((dist[1] - 0.5 / 1.75).abs() < 1e-9);
        assert!((dist[2] - 0.25 / 1.75).abs() < 1e-9);
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_mass_falls_back_to_uniform() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
        assert_eq!(normalize(&[f64::NAN, 1.0]), vec![0.5; 2]);
        assert_eq!(normalize(&[f64::INFINITY, 1.0]), vec![0.5; 2]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn empty_pool_returns_empty_selection() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let selection = WeightedSampler::select_with_rng(&[], 5, &mut rng);
        assert!(selection.is_empty());
        assert!(selection.reweight.is_empty());
    }

    #[test]
    fn zero_count_returns_empty_selection() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let candidates = pool(&[("A", 0), ("B", 0), ("C", 0)]);
        let selection = WeightedSampler::select_with_rng(&candidates, 0, &mut rng);
        assert!(selection.is_empty());
        assert!(selection.reweight.is_empty());
    }

    #[test]
    fn count_is_clamped_to_pool_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let candidates = pool(&[("only", 9)]);
        let selection = WeightedSampler::select_with_rng(&candidates, 5, &mut rng);

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.selected[0].title, Title::new("only"));
        assert_eq!(selection.selected[0].content, "text of only");
    }

    #[test]
    fn full_draw_returns_every_candidate_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let candidates = pool(&[("A", 0), ("B", 7), ("C", 2), ("D", 100)]);
        let selection = WeightedSampler::select_with_rng(&candidates, 4, &mut rng);

        let titles: BTreeSet<&str> = selection.titles().map(Title::as_str).collect();
        assert_eq!(titles.len(), 4);
        assert_eq!(selection.reweight.len(), 4);
    }

    #[test]
    fn negative_request_clamps_to_zero() {
        assert_eq!(SelectionRequest::clamped(-4).count, 0);
        assert_eq!(SelectionRequest::clamped(0).count, 0);
        assert_eq!(SelectionRequest::clamped(6).count, 6);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let candidates = pool(&[("A", 0), ("B", 1), ("C", 3), ("D", 2), ("E", 0)]);

        let mut rng1 = ChaCha8Rng::seed_from_u64(42);
        let mut rng2 = ChaCha8Rng::seed_from_u64(42);
        let first = WeightedSampler::select_with_rng(&candidates, 3, &mut rng1);
        let second = WeightedSampler::select_with_rng(&candidates, 3, &mut rng2);

        assert_eq!(first, second);
    }

    #[test]
    fn equal_weights_converge_to_uniform() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let candidates = pool(&[("A", 5), ("B", 5), ("C", 5), ("D", 5)]);
        let trials = 20_000;

        let mut hits: BTreeMap<Title, usize> = BTreeMap::new();
        for _ in 0..trials {
            let selection = WeightedSampler::select_with_rng(&candidates, 1, &mut rng);
            for title in selection.titles() {
                *hits.entry(title.clone()).or_default() += 1;
            }
        }

        for count in hits.values() {
            let freq = *count as f64 / trials as f64;
            assert!((freq - 0.25).abs() < 0.02, "frequency {freq} too far from 1/4");
        }
    }

    #[test]
    fn fresh_poem_beats_well_practiced_poem() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let candidates = pool(&[("fresh", 0), ("worn", 10)]);

        let mut fresh = 0usize;
        let mut worn = 0usize;
        for _ in 0..5_000 {
            let selection = WeightedSampler::select_with_rng(&candidates, 1, &mut rng);
            match selection.selected[0].title.as_str() {
                "fresh" => fresh += 1,
                _ => worn += 1,
            }
        }

        assert!(fresh > worn * 5, "fresh={fresh} worn={worn}");
        assert!(worn > 0, "a practiced poem must stay reachable");
    }

    #[test]
    fn worked_example_prefers_lowest_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let candidates = pool(&[("A", 0), ("B", 1), ("C", 3)]);

        let mut a = 0usize;
        let mut c = 0usize;
        for _ in 0..10_000 {
            let selection = WeightedSampler::select_with_rng(&candidates, 2, &mut rng);
            assert_eq!(selection.len(), 2);
            if selection.reweight.contains(&Title::new("A")) {
                a += 1;
            }
            if selection.reweight.contains(&Title::new("C")) {
                c += 1;
            }
        }

        assert!(a > c, "A={a} C={c}");
    }

    #[test]
    fn draw_index_respects_point_mass() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(draw_index(&[0.0, 1.0, 0.0], &mut rng), 1);
        }
    }
}
