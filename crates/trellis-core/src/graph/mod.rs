//! # Trellis Directed Graph
//!
//! A generic, arena-backed directed graph with weighted edges. Nodes are
//! addressed by [`NodeIndex`], which stays valid for the lifetime of the graph
//! (there is no node removal). Each node keeps an ordered set of outgoing
//! edges; incoming edges are not indexed and [`DirectedGraph::predecessors`]
//! scans the node set instead.
//!
//! The graph carries no plugin semantics. The plugin system builds its
//! dependency graph on top of it (see [`crate::plugin_system::graph`]).
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Stable handle to a node inside a [`DirectedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Position of the node in insertion order
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node holding a value and its outgoing `(successor, cost)` edges
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    value: T,
    edges: Vec<(NodeIndex, f64)>,
}

impl<T> GraphNode<T> {
    fn new(value: T) -> Self {
        Self { value, edges: Vec::new() }
    }

    /// The value stored in this node
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the stored value
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Successor handles in edge insertion order
    pub fn successors(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.edges.iter().map(|(to, _)| *to)
    }

    /// Outgoing edges with their costs
    pub fn edges(&self) -> &[(NodeIndex, f64)] {
        &self.edges
    }

    /// Whether `to` is a direct successor of this node
    pub fn has_successor(&self, to: NodeIndex) -> bool {
        self.edges.iter().any(|(idx, _)| *idx == to)
    }

    /// Cost of the edge to `to`, if present
    pub fn cost(&self, to: NodeIndex) -> Option<f64> {
        self.edges.iter().find(|(idx, _)| *idx == to).map(|(_, cost)| *cost)
    }

    /// Adds or re-weights the edge to `to`. Returns true if the edge is new.
    fn add_successor(&mut self, to: NodeIndex, cost: f64) -> bool {
        match self.edges.iter_mut().find(|(idx, _)| *idx == to) {
            Some(edge) => {
                edge.1 = cost;
                false
            }
            None => {
                self.edges.push((to, cost));
                true
            }
        }
    }
}

/// Generic directed, edge-weighted graph
#[derive(Debug, Clone)]
pub struct DirectedGraph<T> {
    nodes: Vec<GraphNode<T>>,
}

impl<T> Default for DirectedGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DirectedGraph<T> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node holding `value` and return its handle
    pub fn add_node(&mut self, value: T) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        self.nodes.push(GraphNode::new(value));
        idx
    }

    /// Add a directed edge `from -> to` with the given cost.
    ///
    /// An existing edge between the same nodes is re-weighted instead of
    /// duplicated. Returns true if a new edge was created.
    ///
    /// # Panics
    ///
    /// Panics if either handle does not belong to this graph.
    pub fn add_directed_edge(&mut self, from: NodeIndex, to: NodeIndex, cost: f64) -> bool {
        assert!(to.0 < self.nodes.len(), "edge target {} is not part of this graph", to);
        match self.nodes.get_mut(from.0) {
            Some(node) => node.add_successor(to, cost),
            None => panic!("edge source {} is not part of this graph", from),
        }
    }

    /// Add a directed edge `from -> to` with cost 0
    pub fn add_successor(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        self.add_directed_edge(from, to, 0.0)
    }

    /// Add edges in both directions with the same cost
    pub fn add_undirected_edge(&mut self, a: NodeIndex, b: NodeIndex, cost: f64) {
        self.add_directed_edge(a, b, cost);
        self.add_directed_edge(b, a, cost);
    }

    /// Node behind `idx`, if it belongs to this graph
    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode<T>> {
        self.nodes.get(idx.0)
    }

    /// Mutable node behind `idx`
    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut GraphNode<T>> {
        self.nodes.get_mut(idx.0)
    }

    /// Value behind `idx`
    pub fn value(&self, idx: NodeIndex) -> Option<&T> {
        self.node(idx).map(GraphNode::value)
    }

    /// Mutable value behind `idx`
    pub fn value_mut(&mut self, idx: NodeIndex) -> Option<&mut T> {
        self.node_mut(idx).map(GraphNode::value_mut)
    }

    /// All node handles in insertion order
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len()).map(NodeIndex)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode<T>)> + '_ {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeIndex(i), node))
    }

    /// All values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes.iter().map(GraphNode::value)
    }

    /// First node whose value matches the predicate
    pub fn position<F>(&self, mut predicate: F) -> Option<NodeIndex>
    where
        F: FnMut(&T) -> bool,
    {
        self.nodes.iter().position(|node| predicate(&node.value)).map(NodeIndex)
    }

    /// Successors of `idx` in edge insertion order
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.node(idx).map(|node| node.successors().collect()).unwrap_or_default()
    }

    /// Nodes that have an edge into `idx`.
    ///
    /// Computed by scanning every node; there is no reverse index.
    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, node)| node.has_successor(idx))
            .map(|(i, _)| i)
            .collect()
    }

    /// Cost of the edge `from -> to`
    pub fn cost(&self, from: NodeIndex, to: NodeIndex) -> Option<f64> {
        self.node(from).and_then(|node| node.cost(to))
    }

    /// Every edge as `(from, to, cost)`, grouped by source in insertion order
    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex, f64)> {
        self.nodes()
            .flat_map(|(from, node)| node.edges().iter().map(move |(to, cost)| (from, *to, *cost)))
            .collect()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if the graph contains a directed cycle (self-loops included)
    pub fn has_cycle(&self) -> bool {
        self.topological_order().is_none()
    }

    /// Nodes ordered so that every edge points forward (Kahn's algorithm).
    ///
    /// Ties are broken by insertion order. Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeIndex>> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            for to in node.successors() {
                in_degree[to.0] += 1;
            }
        }

        let mut queue: VecDeque<NodeIndex> = self
            .indices()
            .filter(|idx| in_degree[idx.0] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for to in self.nodes[idx.0].successors() {
                in_degree[to.0] -= 1;
                if in_degree[to.0] == 0 {
                    queue.push_back(to);
                }
            }
        }

        (order.len() == self.nodes.len()).then_some(order)
    }

    /// Nodes reachable from `start` by following edges, excluding `start`
    /// unless it lies on a cycle through itself
    pub fn reachable_from(&self, start: NodeIndex) -> HashSet<NodeIndex> {
        let mut seen = HashSet::new();
        let mut stack = self.successors(start);
        while let Some(idx) = stack.pop() {
            if seen.insert(idx) {
                stack.extend(self.successors(idx));
            }
        }
        seen
    }
}

impl<T: PartialEq> DirectedGraph<T> {
    /// Check whether a node holds `value`
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Handle of the first node holding `value`
    pub fn find(&self, value: &T) -> Option<NodeIndex> {
        self.position(|v| v == value)
    }
}
