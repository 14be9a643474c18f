use crate::*;

/// All-pairs shortest travel costs, precomputed once so the search never re-walks raw edges.
///
/// Rows are sources, columns targets. `Time::MAX` marks an unreachable pair; `cost` surfaces
/// that as `None` and callers must exclude the move rather than treat the sentinel as a cost.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct DistanceTable {
    costs: Vec<Time>,
    node_count: usize,
}

struct NetworkFlood<'n, 'r> {
    network: &'n Network,
    source: NodeIndex,
    row: &'r mut [Time],
}

impl<'n, 'r> BreadthFirstFlood for NetworkFlood<'n, 'r> {
    type Vertex = NodeIndex;

    fn start(&self) -> &NodeIndex {
        &self.source
    }

    fn neighbors(&self, vertex: &NodeIndex, neighbors: &mut Vec<NodeIndex>) {
        neighbors.clear();
        neighbors.extend_from_slice(self.network.node(*vertex).exits());
    }

    fn visit(&mut self, vertex: &NodeIndex, cost: Time) {
        self.row[vertex.get()] = cost;
    }

    fn reset(&mut self) {
        self.row.fill(Time::MAX);
    }
}

impl DistanceTable {
    pub fn for_network(network: &Network) -> Self {
        let node_count: usize = network.node_count();
        let mut costs: Vec<Time> = vec![Time::MAX; node_count * node_count];
        let mut flood_state: FloodState<NodeIndex> = FloodState::default();

        for (source, row) in costs.chunks_mut(node_count).enumerate() {
            NetworkFlood {
                network,
                source: source.into(),
                row,
            }
            .run_internal(&mut flood_state);
        }

        Self { costs, node_count }
    }

    pub fn cost(&self, from: NodeIndex, to: NodeIndex) -> Option<Time> {
        let cost: Time = self.costs[from.get() * self.node_count + to.get()];

        (cost != Time::MAX).then_some(cost)
    }
}
