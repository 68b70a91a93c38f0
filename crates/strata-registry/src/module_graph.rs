//! Module dependency graph.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: [`ModuleName`]
//! - Edges: importer -> exporter ("depends on")
//!
//! The scheduler reads it to gate stages on dependencies and searches it
//! for cycles when nothing can advance.

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use strata_core::ModuleName;

#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    graph: DiGraph<ModuleName, ()>,
    nodes: FxHashMap<ModuleName, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module; returns its node, existing or new.
    pub fn add_module(&mut self, module: &ModuleName) -> NodeIndex {
        if let Some(&node) = self.nodes.get(module) {
            return node;
        }
        let node = self.graph.add_node(module.clone());
        self.nodes.insert(module.clone(), node);
        node
    }

    pub fn contains(&self, module: &ModuleName) -> bool {
        self.nodes.contains_key(module)
    }

    /// Record that `importer` depends on `exporter`. Repeated edges are ignored.
    pub fn add_dependency(&mut self, importer: &ModuleName, exporter: &ModuleName) {
        let from = self.add_module(importer);
        let to = self.add_module(exporter);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Modules `module` imports from, sorted by name.
    pub fn dependencies(&self, module: &ModuleName) -> Vec<ModuleName> {
        self.neighbors(module, Direction::Outgoing)
    }

    /// Modules importing from `module`, sorted by name.
    pub fn dependents(&self, module: &ModuleName) -> Vec<ModuleName> {
        self.neighbors(module, Direction::Incoming)
    }

    fn neighbors(&self, module: &ModuleName, direction: Direction) -> Vec<ModuleName> {
        let Some(&node) = self.nodes.get(module) else {
            return Vec::new();
        };
        let mut out: Vec<ModuleName> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Find a dependency cycle among the modules accepted by `include`.
    ///
    /// The cycle is listed in dependency order starting from its
    /// lowest-named member; among several cycles, the one containing the
    /// lowest-named module is reported.
    pub fn find_cycle(&self, include: impl Fn(&ModuleName) -> bool) -> Option<Vec<ModuleName>> {
        let included = |n: NodeIndex| include(&self.graph[n]);
        let mut best: Option<Vec<ModuleName>> = None;

        for component in tarjan_scc(&self.graph) {
            let members: Vec<NodeIndex> = component.into_iter().filter(|&n| included(n)).collect();
            let Some(&start) = members.iter().min_by(|a, b| self.graph[**a].cmp(&self.graph[**b])) else {
                continue;
            };
            let Some(cycle) = self.shortest_cycle_through(start, &members) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| cycle[0] < b[0]) {
                best = Some(cycle);
            }
        }
        best
    }

    /// Breadth-first search from `start` back to itself through `members`,
    /// visiting successors in name order.
    fn shortest_cycle_through(&self, start: NodeIndex, members: &[NodeIndex]) -> Option<Vec<ModuleName>> {
        let mut previous: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
        let mut queue = std::collections::VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            let mut successors: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .filter(|n| members.contains(n))
                .collect();
            successors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
            successors.dedup();

            for next in successors {
                if next == start {
                    let mut path = vec![self.graph[node].clone()];
                    let mut cursor = node;
                    while cursor != start {
                        cursor = *previous.get(&cursor)?;
                        path.push(self.graph[cursor].clone());
                    }
                    path.reverse();
                    return Some(path);
                }
                if !previous.contains_key(&next) {
                    previous.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Modules ordered so that exporters come before their importers.
    /// Members of a cycle are kept together in name order.
    pub fn dependency_order(&self) -> Vec<ModuleName> {
        // tarjan_scc yields components in reverse topological order of the
        // condensed graph; with importer -> exporter edges that is exporters first.
        tarjan_scc(&self.graph)
            .into_iter()
            .flat_map(|component| {
                let mut names: Vec<ModuleName> =
                    component.into_iter().map(|n| self.graph[n].clone()).collect();
                names.sort();
                names
            })
            .collect()
    }
}
