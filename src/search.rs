use {
    crate::*,
    std::collections::{HashMap, HashSet},
};

/// With two or fewer units left, any move spends at least travel plus activation and leaves the
/// new source no time to accrue, so cutting the recursion off here is exact, not heuristic.
const ZERO_PAYOFF_HORIZON: Time = 2_u16;

/// The memoization key: where the agent stands, which sources it has already activated, and how
/// much of the budget is left. Transitions build new states; a state is never mutated.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct SearchState {
    pub position: NodeIndex,
    pub activated: NodeSet,
    pub time_remaining: Time,
}

impl SearchState {
    pub fn start(position: NodeIndex, time_remaining: Time) -> Self {
        Self {
            position,
            activated: NodeSet::ZERO,
            time_remaining,
        }
    }

    pub fn after_activating(self, node_index: NodeIndex, time_taken: Time) -> Self {
        let mut activated: NodeSet = self.activated;

        activated.set(node_index.get(), true);

        Self {
            position: node_index,
            activated,
            time_remaining: self.time_remaining - time_taken,
        }
    }
}

struct Candidate {
    node_index: NodeIndex,
    time_taken: Time,
    contribution: Payoff,
}

/// A memoized recursive search over `SearchState`s. Each instance owns its caches outright, so
/// concurrent scenario runs can't interfere with each other; build a fresh one per invocation.
///
/// `max_expanded_states`, when set, bounds how many distinct states `frontier` will expand
/// before giving up on the remainder; the resulting `Frontier` is then marked incomplete and
/// downstream answers are lower bounds. `best_payoff` is cheap enough that it never consults
/// the bound.
pub struct PayoffSearch<'n> {
    network: &'n Network,
    distances: &'n DistanceTable,
    max_expanded_states: Option<usize>,
    expanded_states: usize,
    truncated: bool,
    payoff_cache: HashMap<SearchState, Payoff>,
    sequence_cache: HashMap<SearchState, Vec<Sequence>>,
}

impl<'n> PayoffSearch<'n> {
    pub fn new(
        network: &'n Network,
        distances: &'n DistanceTable,
        max_expanded_states: Option<usize>,
    ) -> Self {
        Self {
            network,
            distances,
            max_expanded_states,
            expanded_states: 0_usize,
            truncated: false,
            payoff_cache: HashMap::new(),
            sequence_cache: HashMap::new(),
        }
    }

    /// The moves available from `state`: every unactivated positive-rate source reachable in
    /// time to accrue at least one unit of payoff. Travel costs come from the precomputed
    /// table; an absent entry means unreachable and the move is excluded.
    fn candidates(&self, state: SearchState) -> Vec<Candidate> {
        self.network
            .iter_rated_node_indices()
            .filter(|node_index| !state.activated[node_index.get()])
            .filter_map(|node_index| {
                self.distances
                    .cost(state.position, node_index)
                    .and_then(|cost| {
                        let time_taken: Time = cost + 1_u16;

                        (time_taken < state.time_remaining).then(|| Candidate {
                            node_index,
                            time_taken,
                            contribution: (state.time_remaining - time_taken) as Payoff
                                * self.network.node(node_index).rate() as Payoff,
                        })
                    })
            })
            .collect()
    }

    /// The maximum payoff accruable from `state`. Sitting idle for the rest of the budget is
    /// always valid, so the floor is zero rather than an enumerated branch.
    pub fn best_payoff(&mut self, state: SearchState) -> Payoff {
        if state.time_remaining <= ZERO_PAYOFF_HORIZON {
            return 0_u64;
        }

        if let Some(&payoff) = self.payoff_cache.get(&state) {
            return payoff;
        }

        let mut best: Payoff = 0_u64;

        for candidate in self.candidates(state) {
            best = best.max(add_payoffs(
                candidate.contribution,
                self.best_payoff(
                    state.after_activating(candidate.node_index, candidate.time_taken),
                ),
            ));
        }

        self.payoff_cache.insert(state, best);

        best
    }

    fn expanded_state_budget_is_exhausted(&self) -> bool {
        self.max_expanded_states
            .map_or(false, |max_expanded_states| {
                self.expanded_states >= max_expanded_states
            })
    }

    /// Every feasible activation sequence from `state`, deduplicated by (activated set,
    /// payoff). Prefixes are members too: a pairing of two agents may well use a sequence
    /// that a lone agent would have kept extending.
    fn sequences(&mut self, state: SearchState) -> Vec<Sequence> {
        if state.time_remaining <= ZERO_PAYOFF_HORIZON {
            return Vec::new();
        }

        if let Some(sequences) = self.sequence_cache.get(&state) {
            return sequences.clone();
        }

        if self.expanded_state_budget_is_exhausted() {
            self.truncated = true;

            return Vec::new();
        }

        self.expanded_states += 1_usize;

        let mut sequences: HashSet<Sequence> = HashSet::new();

        for candidate in self.candidates(state) {
            let child_state: SearchState =
                state.after_activating(candidate.node_index, candidate.time_taken);

            sequences.insert(Sequence::single(candidate.node_index, candidate.contribution));

            for child_sequence in self.sequences(child_state) {
                sequences.insert(
                    child_sequence.preceded_by(candidate.node_index, candidate.contribution),
                );
            }
        }

        let sequences: Vec<Sequence> = sequences.into_iter().collect();

        // A subtree cut off by the expanded-state budget must not be reused as if complete.
        if !self.truncated {
            self.sequence_cache.insert(state, sequences.clone());
        }

        sequences
    }

    pub fn frontier(&mut self, state: SearchState) -> Frontier {
        let sequences: Vec<Sequence> = self.sequences(state);

        Frontier::new(sequences, !self.truncated)
    }
}
