//! Property tests for CPU peak ranking.
//!
//! Invariants tested:
//! - One entry per core, each core exactly once
//! - Entries are sorted by descending peak
//! - Each peak is the maximum of that core's readings
//! - Compacting the sample log never changes the ranking

use proptest::prelude::*;
use stress_injector_cpu::{SampleLog, rank_cores};

fn rows(cores: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(0.0f32..=100.0, cores), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: ranking is a descending permutation of per-core maxima
    #[test]
    fn ranking_is_sorted_per_core_maxima(
        samples in (1usize..16).prop_flat_map(rows),
    ) {
        let cores = samples[0].len();
        let ranking = rank_cores(&samples).ranking().to_vec();

        prop_assert_eq!(ranking.len(), cores);
        for pair in ranking.windows(2) {
            prop_assert!(pair[0].percent >= pair[1].percent);
        }

        let mut seen: Vec<usize> = ranking.iter().map(|peak| peak.core).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..cores).collect::<Vec<_>>());

        for peak in &ranking {
            let max = samples.iter().map(|row| row[peak.core]).fold(f32::MIN, f32::max);
            prop_assert_eq!(peak.percent, max);
        }
    }

    /// Property: a bounded log ranks the same as the unbounded history
    #[test]
    fn compaction_preserves_ranking(
        samples in (1usize..8).prop_flat_map(rows),
        capacity in 2usize..10,
    ) {
        let mut log = SampleLog::with_capacity(capacity);
        for row in &samples {
            log.record(row.clone());
        }

        prop_assert!(log.len() <= capacity);
        prop_assert_eq!(rank_cores(&log.rows()), rank_cores(&samples));
    }
}
