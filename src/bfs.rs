use {
    crate::*,
    std::{
        collections::{HashSet, VecDeque},
        hash::Hash,
    },
};

pub struct FloodState<V> {
    queue: VecDeque<(V, Time)>,
    explored: HashSet<V>,
    neighbors: Vec<V>,
}

impl<V> FloodState<V> {
    fn clear(&mut self) {
        self.queue.clear();
        self.explored.clear();
        self.neighbors.clear();
    }
}

impl<V> Default for FloodState<V> {
    fn default() -> Self {
        Self {
            queue: Default::default(),
            explored: Default::default(),
            neighbors: Default::default(),
        }
    }
}

/// A breadth-first flood over unit-cost edges: every vertex reachable from the start is visited
/// exactly once, with its edge-count cost from the start. There is no early exit and no path
/// reconstruction; consumers that want either should record what they need in `visit`.
pub trait BreadthFirstFlood {
    type Vertex: Clone + Eq + Hash;

    fn start(&self) -> &Self::Vertex;
    fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>);
    fn visit(&mut self, vertex: &Self::Vertex, cost: Time);
    fn reset(&mut self);

    fn run_internal(&mut self, state: &mut FloodState<Self::Vertex>) {
        self.reset();

        state.clear();

        let start: Self::Vertex = self.start().clone();

        self.visit(&start, 0_u16);
        state.explored.insert(start.clone());
        state.queue.push_back((start, 0_u16));

        while let Some((current, cost)) = state.queue.pop_front() {
            let neighbor_cost: Time = cost + 1_u16;

            self.neighbors(&current, &mut state.neighbors);

            for neighbor in state.neighbors.drain(..) {
                if state.explored.insert(neighbor.clone()) {
                    self.visit(&neighbor, neighbor_cost);
                    state.queue.push_back((neighbor, neighbor_cost));
                }
            }
        }
    }

    fn run(&mut self) {
        self.run_internal(&mut FloodState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RingFlood {
        len: usize,
        start: usize,
        costs: Vec<Time>,
    }

    impl BreadthFirstFlood for RingFlood {
        type Vertex = usize;

        fn start(&self) -> &usize {
            &self.start
        }

        fn neighbors(&self, vertex: &usize, neighbors: &mut Vec<usize>) {
            neighbors.clear();
            neighbors.push((vertex + 1_usize) % self.len);
            neighbors.push((vertex + self.len - 1_usize) % self.len);
        }

        fn visit(&mut self, vertex: &usize, cost: Time) {
            self.costs[*vertex] = cost;
        }

        fn reset(&mut self) {
            self.costs.fill(Time::MAX);
        }
    }

    #[test]
    fn test_ring_flood_costs() {
        let mut ring_flood: RingFlood = RingFlood {
            len: 6_usize,
            start: 0_usize,
            costs: Vec::new(),
        };

        ring_flood.costs.resize(6_usize, Time::MAX);
        ring_flood.run();

        assert_eq!(
            ring_flood.costs,
            vec![0_u16, 1_u16, 2_u16, 3_u16, 2_u16, 1_u16]
        );
    }
}
