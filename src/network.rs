use {
    crate::*,
    bitvec::prelude::*,
    nom::{
        bytes::complete::{tag, take_while_m_n},
        character::complete::line_ending,
        combinator::{map, map_res, opt, success, verify},
        error::Error,
        multi::separated_list1,
        sequence::{preceded, tuple},
        Err, IResult,
    },
    static_assertions::const_assert,
    std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        str::from_utf8_unchecked,
    },
};

/// Discrete travel/activation time units.
pub type Time = u16;

/// Per-time-unit value accrued by an activated node.
pub type PayoffRate = u16;

/// Accumulated value. Wide enough that realistic inputs cannot overflow it; `add_payoffs`
/// guards the rest.
pub type Payoff = u64;

type NodeIndexRaw = u8;
type NodeNameLen = u8;

pub const NODE_NAME_CAPACITY: usize = 8_usize;

/// One block backs the whole activated-set bit array, which keeps `NodeSet` `Copy` and
/// trivially hashable.
pub type NodeSetBlock = u64;

pub const MAX_NODE_COUNT: usize = 64_usize;

pub type NodeSet = BitArr!(for MAX_NODE_COUNT, in NodeSetBlock);

const_assert!(MAX_NODE_COUNT <= NodeSetBlock::BITS as usize);

// Every valid node index must be representable, with `!0` left over as the invalid sentinel.
const_assert!(MAX_NODE_COUNT <= NodeIndexRaw::MAX as usize);

/// A fixed-capacity inline node name. The wire format only produces short alphanumeric tokens,
/// so there's no reason to pay for heap-allocated strings in parse output or lookups.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeName {
    bytes: [u8; NODE_NAME_CAPACITY],
    len: NodeNameLen,
}

impl NodeName {
    pub fn as_str(&self) -> &str {
        // SAFETY: This always holding a valid UTF-8 prefix is an invariant of the type
        unsafe { from_utf8_unchecked(&self.bytes[..self.len as usize]) }
    }
}

impl Debug for NodeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Default for NodeName {
    fn default() -> Self {
        Self {
            bytes: [0_u8; NODE_NAME_CAPACITY],
            len: 0 as NodeNameLen,
        }
    }
}

impl Parse for NodeName {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map_res(
            take_while_m_n(1_usize, NODE_NAME_CAPACITY, |c: char| {
                c.is_ascii_alphanumeric()
            }),
            Self::try_from,
        )(input)
    }
}

impl TryFrom<&str> for NodeName {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        (value.len() <= NODE_NAME_CAPACITY)
            .then(|| {
                let mut bytes: [u8; NODE_NAME_CAPACITY] = [0_u8; NODE_NAME_CAPACITY];

                bytes[..value.len()].copy_from_slice(value.as_bytes());

                Self {
                    bytes,
                    len: value.len() as NodeNameLen,
                }
            })
            .ok_or(())
    }
}

/// A dense node index assigned in declaration order by the parser.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeIndex(NodeIndexRaw);

impl NodeIndex {
    pub const INVALID: Self = Self(!0);

    pub fn new(index: usize) -> Self {
        assert!(index < MAX_NODE_COUNT);

        Self(index as NodeIndexRaw)
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn get(self) -> usize {
        assert!(self.is_valid());

        self.0 as usize
    }

    pub fn opt(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

impl Debug for NodeIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_valid() {
            f.write_fmt(format_args!("{:?}", self.0))
        } else {
            f.write_str("<invalid>")
        }
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<usize> for NodeIndex {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Node {
    name: NodeName,
    rate: PayoffRate,
    exits: Vec<NodeIndex>,
}

impl Node {
    pub fn name(&self) -> NodeName {
        self.name
    }

    pub fn rate(&self) -> PayoffRate {
        self.rate
    }

    pub fn exits(&self) -> &[NodeIndex] {
        &self.exits
    }
}

struct RawNode {
    name: NodeName,
    rate: PayoffRate,
    exit_names: Vec<NodeName>,
}

/// A fixed directed graph over named nodes, read-only once parsed. Every exit references a
/// declared node; the parser rejects anything else, so the search layers never need to handle
/// dangling indices.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Network {
    nodes: Vec<Node>,
}

impl Network {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, node_index: NodeIndex) -> &Node {
        &self.nodes[node_index.get()]
    }

    pub fn find_index(&self, name: NodeName) -> NodeIndex {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map_or_else(NodeIndex::default, NodeIndex::new)
    }

    /// Nodes worth activating: a zero-rate node never contributes payoff, so the search never
    /// targets one.
    pub fn iter_rated_node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| (node.rate > 0_u16).then(|| NodeIndex::new(index)))
    }

    pub fn set_names(&self, node_set: NodeSet) -> String {
        node_set
            .iter_ones()
            .map(|index| self.nodes[index].name.as_str())
            .collect::<Vec<&str>>()
            .join(", ")
    }

    fn parse_node_line<'i>(input: &'i str) -> IResult<&'i str, RawNode> {
        map(
            tuple((
                preceded(tag("Valve "), NodeName::parse),
                preceded(tag(" has flow rate="), parse_integer::<PayoffRate>),
                preceded(
                    tuple((
                        tag("; tunnel"),
                        opt(tag("s")),
                        tag(" lead"),
                        opt(tag("s")),
                        tag(" to valve"),
                        opt(tag("s")),
                        tag(" "),
                    )),
                    separated_list1(tag(", "), NodeName::parse),
                ),
            )),
            |(name, rate, exit_names)| RawNode {
                name,
                rate,
                exit_names,
            },
        )(input)
    }
}

impl Parse for Network {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        let (input, raw_nodes): (&str, Vec<RawNode>) =
            separated_list1(line_ending, Self::parse_node_line)(input)?;

        verify(success(()), |_| raw_nodes.len() <= MAX_NODE_COUNT)(
            "more nodes were declared than allowed",
        )?;

        verify(success(()), |_| {
            let mut names: Vec<NodeName> = raw_nodes.iter().map(|raw_node| raw_node.name).collect();

            names.sort();

            names.windows(2_usize).all(|pair| pair[0_usize] != pair[1_usize])
        })("a node was declared twice")?;

        verify(success(()), |_| {
            raw_nodes.iter().all(|raw_node| {
                raw_node.exit_names.iter().all(|exit_name| {
                    raw_nodes
                        .iter()
                        .any(|candidate| candidate.name == *exit_name)
                })
            })
        })("an exit does not name a declared node")?;

        let nodes: Vec<Node> = raw_nodes
            .iter()
            .map(|raw_node| Node {
                name: raw_node.name,
                rate: raw_node.rate,
                exits: raw_node
                    .exit_names
                    .iter()
                    .map(|exit_name| {
                        raw_nodes
                            .iter()
                            .position(|candidate| candidate.name == *exit_name)
                            .unwrap()
                            .into()
                    })
                    .collect(),
            })
            .collect();

        Ok((input, Self { nodes }))
    }
}

impl<'i> TryFrom<&'i str> for Network {
    type Error = Err<Error<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}
