use payoff_search::*;

/// Arguments for program execution
#[derive(Debug, Parser)]
struct Args {
    /// Input file path
    #[arg(short, long, default_value_t)]
    input_file_path: String,

    /// Node both scenarios start from
    #[arg(long, default_value = "AA")]
    start: String,

    /// Single-agent time budget
    #[arg(short, long, default_value_t = 30_u16)]
    time_budget: Time,

    /// Fixed setup cost subtracted from the budget before the two agents act
    #[arg(short, long, default_value_t = 4_u16)]
    setup_cost: Time,

    /// Keep only this many top sequences ahead of the pairing scan
    #[arg(short, long, default_value_t = 1500_usize)]
    frontier_cap: usize,

    /// Give up on frontier enumeration after this many expanded states
    #[arg(long)]
    max_expanded_states: Option<usize>,

    /// Print extra information
    #[arg(short, long, default_value_t)]
    verbose: bool,
}

impl Args {
    /// Returns the input file path, or a provided default if the field is empty
    fn input_file_path<'a>(&'a self, default: &'a str) -> &'a str {
        if self.input_file_path.is_empty() {
            default
        } else {
            &self.input_file_path
        }
    }
}

fn run(args: &Args, input: &str) {
    let network: Network = match Network::try_from(input) {
        Ok(network) => network,
        Err(error) => {
            eprintln!("Failed to parse network description:\n{error:#?}");

            return;
        }
    };

    let start: NodeIndex = NodeName::try_from(args.start.as_str())
        .map_or_else(|_| NodeIndex::INVALID, |name| network.find_index(name));

    if !start.is_valid() {
        eprintln!("Start node \"{}\" is not declared in the input", args.start);

        return;
    }

    let distances: DistanceTable = DistanceTable::for_network(&network);

    let mut single_agent_search: PayoffSearch = PayoffSearch::new(&network, &distances, None);
    let single_agent_payoff: Payoff =
        single_agent_search.best_payoff(SearchState::start(start, args.time_budget));

    let mut pair_search: PayoffSearch =
        PayoffSearch::new(&network, &distances, args.max_expanded_states);
    let mut frontier: Frontier = pair_search.frontier(SearchState::start(
        start,
        args.time_budget.saturating_sub(args.setup_cost),
    ));

    if args.verbose {
        eprintln!(
            "{} sequences enumerated{}",
            frontier.len(),
            if frontier.is_complete() {
                ""
            } else {
                " (cut off by the expanded-state budget)"
            }
        );
    }

    frontier.retain_top(args.frontier_cap);

    if args.verbose && !frontier.is_complete() {
        eprintln!(
            "pair payoff is a lower bound; it is exact only if both halves of the optimal pair \
            were retained"
        );
    }

    let pair: Option<(Sequence, Sequence)> =
        frontier.best_disjoint_pair_sequences(network.node_count());
    let pair_payoff: Payoff =
        pair.map_or(0_u64, |(first, second)| add_payoffs(first.payoff, second.payoff));

    if args.verbose {
        if let Some((first, second)) = pair {
            eprintln!(
                "agent activation sets: [{}] / [{}]",
                network.set_names(first.activated),
                network.set_names(second.activated)
            );
        }
    }

    println!("{single_agent_payoff}");
    println!("{pair_payoff}");
}

fn main() {
    let args: Args = Args::parse();

    // SAFETY: This isn't truly safe, we're just hoping nobody touches our file before we're
    // done with it
    if let Err(error) = unsafe {
        open_utf8_file(args.input_file_path("input.txt"), |input| run(&args, input))
    } {
        eprintln!(
            "Failed to open UTF-8 file \"{}\":\n{error}",
            args.input_file_path("input.txt")
        );
    }
}
