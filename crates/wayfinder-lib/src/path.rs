use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cost::CostPolicy;
use crate::db::NodeId;
use crate::error::{Error, Result};
use crate::graph::{Direction, Graph};

/// How often (in queue pops) the wall-clock deadline is checked.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Limits on the work a single batched search may perform.
///
/// Both limits are cumulative over every start candidate in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    /// Fail once this instant has passed.
    pub deadline: Option<Instant>,
    /// Fail once more than this many nodes have been settled.
    pub max_settled: Option<usize>,
}

impl SearchBudget {
    /// No limits.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            max_settled: None,
        }
    }

    pub fn with_max_settled(mut self, max_settled: usize) -> Self {
        self.max_settled = Some(max_settled);
        self
    }
}

/// One edge walked as part of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
    /// Index into [`Graph::edges`].
    pub edge: usize,
    pub direction: Direction,
    /// Effective cost under the active policy.
    pub cost: f64,
}

/// Minimum-cost path for one (start, end) candidate pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairPath {
    pub start: NodeId,
    pub end: NodeId,
    pub total_cost: f64,
    /// Edges in traversal order; empty when `start == end`.
    pub steps: Vec<PathStep>,
}

/// Compute the minimum-cost path for every reachable (start, end) pair.
///
/// Runs one single-source Dijkstra per distinct start candidate and stops each
/// run as soon as every end candidate is settled. Unreachable pairs are absent
/// from the result. Results are ordered by start candidate order, then end
/// candidate order.
///
/// Equal-cost alternatives are resolved deterministically: the queue breaks
/// ties on node id, relaxation is strict, and adjacency follows edge id order.
pub fn shortest_paths(
    graph: &Graph,
    starts: &[NodeId],
    ends: &[NodeId],
    policy: &CostPolicy,
    budget: &SearchBudget,
) -> Result<Vec<PairPath>> {
    let started = Instant::now();
    let starts = dedup_in_order(starts);
    let ends = dedup_in_order(ends);

    let mut meter = BudgetMeter::new(budget, started);
    let mut results = Vec::new();

    for &start in &starts {
        let tree = search_from(graph, start, &ends, policy, &mut meter)?;
        for &end in &ends {
            if let Some(path) = tree.path_to(graph, start, end) {
                results.push(path);
            }
        }
    }

    debug!(
        starts = starts.len(),
        ends = ends.len(),
        reachable_pairs = results.len(),
        settled = meter.settled,
        elapsed_us = started.elapsed().as_micros() as u64,
        "batched shortest path search finished"
    );

    Ok(results)
}

fn dedup_in_order(ids: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

struct BudgetMeter<'a> {
    budget: &'a SearchBudget,
    started: Instant,
    settled: usize,
    pops: usize,
}

impl<'a> BudgetMeter<'a> {
    fn new(budget: &'a SearchBudget, started: Instant) -> Self {
        Self {
            budget,
            started,
            settled: 0,
            pops: 0,
        }
    }

    fn on_pop(&mut self) -> Result<()> {
        self.pops += 1;
        if self.pops % DEADLINE_CHECK_INTERVAL == 0 {
            self.check_deadline()?;
        }
        Ok(())
    }

    fn on_settle(&mut self) -> Result<()> {
        self.settled += 1;
        if let Some(limit) = self.budget.max_settled {
            if self.settled > limit {
                return Err(self.timeout());
            }
        }
        Ok(())
    }

    fn check_deadline(&self) -> Result<()> {
        match self.budget.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(self.timeout()),
            _ => Ok(()),
        }
    }

    fn timeout(&self) -> Error {
        Error::SearchTimeout {
            elapsed: self.started.elapsed(),
        }
    }
}

/// Shortest-path tree rooted at one start node.
struct SearchTree {
    distances: HashMap<NodeId, f64>,
    /// Node -> (predecessor, step used to reach it).
    parents: HashMap<NodeId, (NodeId, PathStep)>,
    settled: HashSet<NodeId>,
}

impl SearchTree {
    fn path_to(&self, graph: &Graph, start: NodeId, end: NodeId) -> Option<PairPath> {
        if !self.settled.contains(&end) {
            return None;
        }
        let total_cost = *self.distances.get(&end)?;

        let mut steps = Vec::new();
        let mut current = end;
        while current != start {
            let (previous, step) = self.parents.get(&current)?;
            debug_assert_eq!(graph.edge(step.edge).head(step.direction), current);
            steps.push(*step);
            current = *previous;
        }
        steps.reverse();

        Some(PairPath {
            start,
            end,
            total_cost,
            steps,
        })
    }
}

fn search_from(
    graph: &Graph,
    start: NodeId,
    targets: &[NodeId],
    policy: &CostPolicy,
    meter: &mut BudgetMeter<'_>,
) -> Result<SearchTree> {
    meter.check_deadline()?;

    let mut remaining: HashSet<NodeId> = targets.iter().copied().collect();
    let mut distances: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, (NodeId, PathStep)> = HashMap::new();
    let mut settled: HashSet<NodeId> = HashSet::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start, 0.0);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        meter.on_pop()?;

        if settled.contains(&entry.node) {
            continue;
        }
        let current_distance = match distances.get(&entry.node) {
            Some(distance) if *distance < entry.cost.0 => continue,
            Some(distance) => *distance,
            None => continue,
        };

        settled.insert(entry.node);
        meter.on_settle()?;

        remaining.remove(&entry.node);
        if remaining.is_empty() {
            break;
        }

        for traversal in graph.traversals(entry.node) {
            if settled.contains(&traversal.target) {
                continue;
            }
            let edge = graph.edge(traversal.edge);
            let Some(step_cost) = policy.effective_cost(edge, traversal.direction) else {
                continue;
            };

            let next_cost = current_distance + step_cost;
            if next_cost < *distances.get(&traversal.target).unwrap_or(&f64::INFINITY) {
                distances.insert(traversal.target, next_cost);
                parents.insert(
                    traversal.target,
                    (
                        entry.node,
                        PathStep {
                            edge: traversal.edge,
                            direction: traversal.direction,
                            cost: step_cost,
                        },
                    ),
                );
                queue.push(QueueEntry::new(traversal.target, next_cost));
            }
        }
    }

    Ok(SearchTree {
        distances,
        parents,
        settled,
    })
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the cheapest entry, lowest node id first.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
