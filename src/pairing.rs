use {
    crate::*,
    rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    std::cmp::Reverse,
};

/// One enumerated activation run: which sources it activated and what they earned. The order
/// of activation is deliberately forgotten; only the set matters when pairing agents.
#[cfg_attr(test, derive(Debug))]
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Sequence {
    pub activated: NodeSet,
    pub payoff: Payoff,
}

impl Sequence {
    pub fn single(node_index: NodeIndex, payoff: Payoff) -> Self {
        let mut activated: NodeSet = NodeSet::ZERO;

        activated.set(node_index.get(), true);

        Self { activated, payoff }
    }

    pub fn preceded_by(self, node_index: NodeIndex, contribution: Payoff) -> Self {
        let mut activated: NodeSet = self.activated;

        activated.set(node_index.get(), true);

        Self {
            activated,
            payoff: add_payoffs(self.payoff, contribution),
        }
    }

    pub fn activated_count(&self) -> usize {
        self.activated.count_ones()
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let mut intersection: NodeSet = self.activated;

        intersection &= &other.activated;

        intersection.not_any()
    }
}

/// The deduplicated sequence frontier, sorted by descending payoff.
///
/// `complete` records whether every feasible sequence is present. `retain_top` and the
/// expanded-state budget both clear it, and answers derived from an incomplete frontier are
/// lower bounds: the true optimum pair is found only if both of its halves survived.
#[cfg_attr(test, derive(Debug))]
pub struct Frontier {
    sequences: Vec<Sequence>,
    complete: bool,
}

impl Frontier {
    pub fn new(mut sequences: Vec<Sequence>, complete: bool) -> Self {
        sequences
            .sort_unstable_by_key(|sequence| (Reverse(sequence.payoff), sequence.activated.data));

        Self {
            sequences,
            complete,
        }
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn max_payoff(&self) -> Payoff {
        self.sequences
            .first()
            .map_or(0_u64, |sequence| sequence.payoff)
    }

    /// Keep only the `cap` highest-payoff sequences ahead of the quadratic pairing scan.
    pub fn retain_top(&mut self, cap: usize) {
        if cap < self.sequences.len() {
            self.sequences.truncate(cap);
            self.complete = false;
        }
    }

    /// The best pair of sequences whose activated sets are disjoint, as the two `Sequence`
    /// halves. The size filter only skips pairs that could never fit `node_count` nodes
    /// between them; it never changes the result.
    pub fn best_disjoint_pair_sequences(&self, node_count: usize) -> Option<(Sequence, Sequence)> {
        self.sequences
            .par_iter()
            .enumerate()
            .filter_map(|(first_index, first)| {
                self.sequences
                    .iter()
                    .enumerate()
                    .filter(|&(second_index, second)| {
                        second_index != first_index
                            && first.activated_count() <= node_count - second.activated_count()
                            && first.is_disjoint(second)
                    })
                    .max_by_key(|(_, second)| second.payoff)
                    .map(|(_, second)| (*first, *second))
            })
            .max_by_key(|(first, second)| add_payoffs(first.payoff, second.payoff))
    }

    /// The combined payoff of the best disjoint pair, or zero when no such pair exists.
    pub fn best_disjoint_pair(&self, node_count: usize) -> Payoff {
        self.best_disjoint_pair_sequences(node_count)
            .map_or(0_u64, |(first, second)| {
                add_payoffs(first.payoff, second.payoff)
            })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            distance::tests::distances,
            network::tests::{network, node_set},
            search::tests::{fixture, start_state, CHAIN_STR, STAR_STR},
        },
    };

    fn example_frontier(time_remaining: Time) -> Frontier {
        PayoffSearch::new(network(), distances(), None)
            .frontier(start_state(network(), time_remaining))
    }

    fn fixture_pair(network_str: &str, time_remaining: Time) -> Payoff {
        let (network, distances): (Network, DistanceTable) = fixture(network_str);
        let mut search: PayoffSearch = PayoffSearch::new(&network, &distances, None);

        search
            .frontier(start_state(&network, time_remaining))
            .best_disjoint_pair(network.node_count())
    }

    #[test]
    fn test_sequence_is_disjoint() {
        let first: Sequence = Sequence {
            activated: node_set(&[1_usize, 3_usize]),
            payoff: 60_u64,
        };
        let second: Sequence = Sequence {
            activated: node_set(&[2_usize, 4_usize]),
            payoff: 45_u64,
        };
        let third: Sequence = Sequence {
            activated: node_set(&[3_usize, 4_usize]),
            payoff: 45_u64,
        };

        assert!(first.is_disjoint(&second));
        assert!(second.is_disjoint(&first));
        assert!(!first.is_disjoint(&third));
        assert!(!second.is_disjoint(&third));
    }

    #[test]
    fn test_frontier_sorting_and_cap() {
        let mut frontier: Frontier = Frontier::new(
            vec![
                Sequence {
                    activated: node_set(&[1_usize]),
                    payoff: 20_u64,
                },
                Sequence {
                    activated: node_set(&[2_usize]),
                    payoff: 40_u64,
                },
                Sequence {
                    activated: node_set(&[1_usize, 2_usize]),
                    payoff: 30_u64,
                },
            ],
            true,
        );

        assert_eq!(
            frontier
                .sequences()
                .iter()
                .map(|sequence| sequence.payoff)
                .collect::<Vec<Payoff>>(),
            vec![40_u64, 30_u64, 20_u64]
        );

        frontier.retain_top(5_usize);

        assert!(frontier.is_complete());

        frontier.retain_top(1_usize);

        assert!(!frontier.is_complete());
        assert_eq!(frontier.len(), 1_usize);
        assert_eq!(frontier.max_payoff(), 40_u64);
    }

    #[test]
    fn test_best_disjoint_pair_star() {
        // Budget 6 with a setup cost of 2 leaves each agent 4 units: one activation apiece.
        assert_eq!(fixture_pair(STAR_STR, 4_u16), 60_u64);
    }

    #[test]
    fn test_best_disjoint_pair_chain() {
        // The farther source costs an extra unit of travel, so the second agent only accrues
        // one unit of payoff from it.
        assert_eq!(fixture_pair(CHAIN_STR, 4_u16), 40_u64);
    }

    #[test]
    fn test_best_disjoint_pair_example_network() {
        assert_eq!(
            example_frontier(26_u16).best_disjoint_pair(network().node_count()),
            1707_u64
        );
    }

    #[test]
    fn test_best_disjoint_pair_sequences_are_disjoint() {
        let frontier: Frontier = example_frontier(26_u16);
        let (first, second): (Sequence, Sequence) = frontier
            .best_disjoint_pair_sequences(network().node_count())
            .unwrap();

        assert!(first.is_disjoint(&second));
        assert_eq!(
            add_payoffs(first.payoff, second.payoff),
            frontier.best_disjoint_pair(network().node_count())
        );
    }

    #[test]
    fn test_best_disjoint_pair_is_monotone_in_time() {
        let mut previous: Payoff = 0_u64;

        for time_remaining in 2_u16..=10_u16 {
            let pair_payoff: Payoff = fixture_pair(STAR_STR, time_remaining);

            assert!(
                pair_payoff >= previous,
                "pair payoff dropped from {previous} to {pair_payoff} at time {time_remaining}"
            );

            previous = pair_payoff;
        }
    }

    #[test]
    fn test_size_filter_is_pure_pruning() {
        let frontier: Frontier = example_frontier(26_u16);

        let unfiltered_best: Payoff = frontier
            .sequences()
            .iter()
            .enumerate()
            .flat_map(|(first_index, first)| {
                frontier
                    .sequences()
                    .iter()
                    .enumerate()
                    .filter(move |&(second_index, second)| {
                        second_index != first_index && first.is_disjoint(second)
                    })
                    .map(move |(_, second)| add_payoffs(first.payoff, second.payoff))
            })
            .max()
            .unwrap_or(0_u64);

        assert_eq!(
            frontier.best_disjoint_pair(network().node_count()),
            unfiltered_best
        );
    }

    #[test]
    fn test_capped_frontier_never_beats_uncapped() {
        let node_count: usize = network().node_count();
        let uncapped: Payoff = example_frontier(26_u16).best_disjoint_pair(node_count);

        for cap in [1_usize, 5_usize, 50_usize] {
            let mut frontier: Frontier = example_frontier(26_u16);

            frontier.retain_top(cap);

            assert!(frontier.best_disjoint_pair(node_count) <= uncapped);
        }
    }

    #[test]
    fn test_no_pair_without_disjoint_sequences() {
        // A single rated source can't be split between two agents.
        let (network, distances): (Network, DistanceTable) = fixture(
            "Valve AA has flow rate=0; tunnel leads to valve BB\n\
            Valve BB has flow rate=10; tunnel leads to valve AA\n",
        );
        let mut search: PayoffSearch = PayoffSearch::new(&network, &distances, None);
        let frontier: Frontier = search.frontier(start_state(&network, 10_u16));

        assert!(!frontier.is_empty());
        assert_eq!(frontier.best_disjoint_pair_sequences(network.node_count()), None);
        assert_eq!(frontier.best_disjoint_pair(network.node_count()), 0_u64);
    }
}
