//! Property-Based Tests for Votes Module
//!
//! Replays random vote sequences against a plain set-based model.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::votes::{VoteCoordinator, VoteKind, VoteOutcome};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Counts, duplicates and resolutions follow the one-vote-per-user model,
    // and a single tally never grows past the quorum.
    #[test]
    fn prop_votes_follow_model(
        required in 0usize..6,
        voters in prop::collection::vec(0u64..8, 1..60)
    ) {
        let votes = VoteCoordinator::default();
        let mut model: HashSet<u64> = HashSet::new();

        for user in voters {
            let outcome = tokio_test::block_on(votes.cast_vote(7, VoteKind::Skip, user, required));

            let expected = if model.contains(&user) {
                VoteOutcome { already_voted: true, current_count: model.len(), threshold_met: false }
            } else {
                model.insert(user);
                let count = model.len();
                let met = count >= required;
                if met {
                    model.clear();
                }
                VoteOutcome { already_voted: false, current_count: count, threshold_met: met }
            };

            prop_assert_eq!(outcome, expected);
            prop_assert!(outcome.current_count <= required.max(1));
            prop_assert_eq!(votes.vote_count(7, VoteKind::Skip), model.len());
        }
    }

    // Votes of one kind never affect another kind's tally.
    #[test]
    fn prop_kinds_isolated(
        skips in prop::collection::vec(0u64..8, 0..20),
        previous in prop::collection::vec(0u64..8, 0..20)
    ) {
        let votes = VoteCoordinator::default();

        for user in &skips {
            tokio_test::block_on(votes.cast_vote(1, VoteKind::Skip, *user, 100));
        }
        for user in &previous {
            tokio_test::block_on(votes.cast_vote(1, VoteKind::Previous, *user, 100));
        }

        let distinct_skips: HashSet<_> = skips.iter().collect();
        let distinct_previous: HashSet<_> = previous.iter().collect();
        prop_assert_eq!(votes.vote_count(1, VoteKind::Skip), distinct_skips.len());
        prop_assert_eq!(votes.vote_count(1, VoteKind::Previous), distinct_previous.len());
    }
}
