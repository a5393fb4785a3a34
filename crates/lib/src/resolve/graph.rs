//! Per-target dependency graph.
//!
//! Built fresh for every target over the projects that survive exclusion.
//! Edges run from dependency to dependent, so a topological order lists
//! every dependency before the projects that need it.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::context::Context;

use super::types::ResolveError;

/// Dependency graph over project slots.
pub struct DependencyGraph {
  graph: DiGraph<usize, ()>,
  nodes: HashMap<usize, NodeIndex>,
}

impl DependencyGraph {
  /// Build the graph over `included` slots.
  ///
  /// Every dependency of an included project must itself be included; the
  /// exclusion cascade guarantees that.
  pub fn build(ctx: &Context, included: &[usize]) -> Self {
    let mut graph = DiGraph::with_capacity(included.len(), included.len());
    let mut nodes = HashMap::with_capacity(included.len());

    for &slot in included {
      nodes.insert(slot, graph.add_node(slot));
    }

    for &slot in included {
      let dependent = nodes[&slot];
      for dep in ctx.dependencies_of(slot) {
        if let Some(&dependency) = nodes.get(dep) {
          graph.update_edge(dependency, dependent, ());
        }
      }
    }

    Self { graph, nodes }
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  /// Slots of projects that depend directly on `slot`, ascending.
  pub fn dependents(&self, slot: usize) -> Vec<usize> {
    self.neighbors(slot, Direction::Outgoing)
  }

  /// Slots `slot` depends on directly, ascending.
  pub fn dependencies(&self, slot: usize) -> Vec<usize> {
    self.neighbors(slot, Direction::Incoming)
  }

  fn neighbors(&self, slot: usize, direction: Direction) -> Vec<usize> {
    let Some(&idx) = self.nodes.get(&slot) else {
      return Vec::new();
    };
    let mut slots: Vec<usize> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n])
      .collect();
    slots.sort_unstable();
    slots
  }

  /// Topological order using Kahn's algorithm.
  ///
  /// Ready projects are taken lowest slot first, so the order only depends on
  /// declaration order.
  ///
  /// # Errors
  ///
  /// Returns `CyclicDependency` naming one cycle when no order exists.
  pub fn topological_order(&self, ctx: &Context) -> Result<Vec<usize>, ResolveError> {
    let mut in_degree: HashMap<usize, usize> = self
      .nodes
      .iter()
      .map(|(&slot, &idx)| (slot, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
      .iter()
      .filter(|(_, degree)| **degree == 0)
      .map(|(&slot, _)| Reverse(slot))
      .collect();

    let mut order = Vec::with_capacity(self.nodes.len());
    while let Some(Reverse(slot)) = ready.pop() {
      order.push(slot);
      for dependent in self.dependents(slot) {
        if let Some(degree) = in_degree.get_mut(&dependent) {
          *degree -= 1;
          if *degree == 0 {
            ready.push(Reverse(dependent));
          }
        }
      }
    }

    if order.len() == self.nodes.len() {
      return Ok(order);
    }

    let placed: HashSet<usize> = order.into_iter().collect();
    let remaining: HashSet<usize> = self.nodes.keys().copied().filter(|s| !placed.contains(s)).collect();
    Err(ResolveError::CyclicDependency {
      cycle: self.find_cycle(ctx, &remaining),
    })
  }

  /// Walk dependencies from the lowest unplaced slot until a project repeats.
  ///
  /// Every project Kahn's algorithm could not place still waits on another
  /// unplaced project, so the walk always closes a loop.
  fn find_cycle(&self, ctx: &Context, remaining: &HashSet<usize>) -> Vec<String> {
    let Some(&start) = remaining.iter().min() else {
      return Vec::new();
    };

    let mut path: Vec<usize> = vec![start];
    let mut visited: HashSet<usize> = HashSet::from([start]);
    let mut current = start;

    loop {
      let next = ctx
        .dependencies_of(current)
        .iter()
        .copied()
        .find(|dep| remaining.contains(dep));

      let Some(next) = next else {
        break;
      };

      if visited.contains(&next) {
        let from = path.iter().position(|&s| s == next).unwrap_or(0);
        path.drain(..from);
        break;
      }

      visited.insert(next);
      path.push(next);
      current = next;
    }

    path
      .into_iter()
      .filter_map(|slot| ctx.projects().get(slot).map(|p| p.id.clone()))
      .collect()
  }
}
