//! Marginal Decomposer: constrained Birkhoff-von Neumann
//! decomposition of a fractional assignment matrix into a
//! probability-weighted set of integral basis matrices, grounded on
//! the original's `constrained_birkhoff_von_neumann.py` (Budish, Che,
//! Kojima, Milgrom 2013).
//!
//! The original represents the bihierarchy as two `networkx.DiGraph`
//! Hasse diagrams glued along a diagonal of singleton cells; this
//! module ports that to `petgraph::graphmap::DiGraphMap`, trading the
//! original's frozenset node keys for small integer ids resolved
//! through `CellSet`/`NodeTable`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use ndarray::Array2;
use petgraph::graphmap::DiGraphMap;
use rand::Rng;

use crate::error::Error;

/// A matrix cell `(row, col)`.
pub type Cell = (usize, usize);
/// A constraint's cell set, keyed the way the original keys a
/// `frozenset` of cells.
pub type CellSet = BTreeSet<Cell>;

/// `[lo, hi]` capacity a cell set's entries must sum to in every basis
/// matrix.
#[derive(Debug, Clone, Copy)]
pub struct Capacity {
    pub lo: f64,
    pub hi: f64,
}

/// The full bihierarchy constraint structure supplied by a caller
/// (the Orchestrator, for the O-SCHED/O-WTF "assign resources/targets
/// to a singleton schedule" constraints).
#[derive(Debug, Clone, Default)]
pub struct ConstraintStructure {
    pub sets: Vec<(CellSet, Capacity)>,
}

impl ConstraintStructure {
    pub fn push(&mut self, cells: CellSet, lo: f64, hi: f64) {
        self.sets.push((cells, Capacity { lo, hi }));
    }
}

/// One basis matrix and the probability the decomposition assigns it.
#[derive(Debug, Clone)]
pub struct BasisMatrix {
    pub probability: f64,
    pub matrix: Array2<f64>,
}

/// A full decomposition: a probability distribution over basis
/// matrices whose expectation reconstructs the input matrix.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub components: Vec<BasisMatrix>,
}

impl Decomposition {
    /// Sample one basis matrix according to the decomposition's
    /// probability weights. Supplements the original, which only ever
    /// printed the full decomposition.
    pub fn sample(&self, rng: &mut impl Rng) -> &Array2<f64> {
        let draw: f64 = rng.gen();
        let mut acc = 0.0;
        for c in &self.components {
            acc += c.probability;
            if draw <= acc {
                return &c.matrix;
            }
        }
        &self
            .components
            .last()
            .expect("decomposition has at least one component")
            .matrix
    }

    /// Reconstructed expectation, used to check drift against the
    /// original marginal matrix.
    pub fn expectation(&self, shape: (usize, usize)) -> Array2<f64> {
        let mut acc = Array2::<f64>::zeros(shape);
        for c in &self.components {
            acc = acc + &c.matrix * c.probability;
        }
        acc
    }
}

const TOLERANCE: f64 = 1e-6;

fn is_integral(w: f64) -> bool {
    (w - w.round()).abs() < TOLERANCE
}

/// Check every entry is in `[0, 1]` and every constrained cell set
/// respects its capacity.
pub fn feasibility_test(x: &Array2<f64>, structure: &ConstraintStructure) -> Result<(), Error> {
    for &v in x.iter() {
        if !(0.0..=1.0).contains(&v) {
            return Err(Error::CapacityViolation { lo: 0.0, hi: 1.0, sum: v });
        }
    }
    for (cells, cap) in &structure.sets {
        let sum: f64 = cells.iter().map(|&(r, c)| x[(r, c)]).sum();
        if sum < cap.lo - TOLERANCE || sum > cap.hi + TOLERANCE {
            return Err(Error::CapacityViolation { lo: cap.lo, hi: cap.hi, sum });
        }
    }
    Ok(())
}

/// Split `structure`'s cell sets into two laminar families (a
/// bihierarchy), trying every ordering: exhaustive permutation search,
/// not greedy-with-backtracking — the constraint structures here never
/// need the larger-scale fallback.
pub fn bihierarchy_test(structure: &ConstraintStructure) -> Result<(Vec<CellSet>, Vec<CellSet>), Error> {
    let sets: Vec<CellSet> = structure.sets.iter().map(|(s, _)| s.clone()).collect();
    for ordering in permutations(&sets) {
        let mut family_a: Vec<usize> = Vec::new();
        let mut family_b: Vec<usize> = Vec::new();
        let mut placed = true;
        for (idx, x) in ordering.iter().enumerate() {
            if family_a.iter().all(|&i| laminar_pair(x, &ordering[i])) {
                family_a.push(idx);
            } else if family_b.iter().all(|&i| laminar_pair(x, &ordering[i])) {
                family_b.push(idx);
            } else {
                placed = false;
                break;
            }
        }
        if placed && family_a.len() + family_b.len() == ordering.len() {
            let a = family_a.iter().map(|&i| ordering[i].clone()).collect();
            let b = family_b.iter().map(|&i| ordering[i].clone()).collect();
            return Ok((a, b));
        }
    }
    Err(Error::NotBihierarchy)
}

fn laminar_pair(x: &CellSet, y: &CellSet) -> bool {
    x.is_subset(y) || y.is_subset(x) || x.is_disjoint(y)
}

/// Heap's algorithm permutation generator; the constraint structures
/// this crate builds (singleton schedule rows/columns) stay small
/// enough for this to terminate quickly.
fn permutations(items: &[CellSet]) -> Vec<Vec<CellSet>> {
    let n = items.len();
    let mut result = Vec::new();
    let mut items = items.to_vec();
    let mut c = vec![0usize; n];
    result.push(items.clone());
    let mut i = 0;
    while i < n {
        if c[i] < i {
            if i % 2 == 0 {
                items.swap(0, i);
            } else {
                items.swap(c[i], i);
            }
            result.push(items.clone());
            c[i] += 1;
            i = 0;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
    result
}

#[derive(Debug, Clone, Copy)]
struct EdgeAttr {
    weight: f64,
    lo: f64,
    hi: f64,
}

/// A graph node: either an A-family cell set, or a B-family ("prime")
/// cell set, identified by index into the relevant `NodeTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NodeId(u32);

struct NodeTable {
    a: Vec<CellSet>,
    bp: Vec<CellSet>,
}

impl NodeTable {
    fn a_id(&self, idx: usize) -> NodeId {
        NodeId(idx as u32)
    }
    fn bp_id(&self, idx: usize) -> NodeId {
        NodeId((self.a.len() + idx) as u32)
    }
    fn find_a(&self, cells: &CellSet) -> Option<NodeId> {
        self.a.iter().position(|s| s == cells).map(|i| self.a_id(i))
    }
    fn find_bp(&self, cells: &CellSet) -> Option<NodeId> {
        self.bp.iter().position(|s| s == cells).map(|i| self.bp_id(i))
    }
}

fn default_capacity(cells: &CellSet, caps: &BTreeMap<CellSet, Capacity>) -> Capacity {
    caps.get(cells).copied().unwrap_or(Capacity { lo: 0.0, hi: 1.0 })
}

/// Build a family's Hasse-diagram edges: `y -> x` whenever `x` is a
/// proper subset of `y` with nothing else in the family strictly
/// between them.
fn covering_edges(
    family: &[CellSet],
    id_of: impl Fn(usize) -> NodeId,
    caps: &BTreeMap<CellSet, Capacity>,
    x: &Array2<f64>,
) -> Vec<(NodeId, NodeId, EdgeAttr)> {
    let mut edges = Vec::new();
    for (yi, y) in family.iter().enumerate() {
        for (xi, xs) in family.iter().enumerate() {
            if xi == yi || !xs.is_subset(y) || xs.len() == y.len() {
                continue;
            }
            let between = family.iter().enumerate().any(|(zi, z)| {
                zi != xi && zi != yi && xs.is_subset(z) && z.is_subset(y) && z.len() != xs.len() && z.len() != y.len()
            });
            if between {
                continue;
            }
            let cap = default_capacity(xs, caps);
            let weight: f64 = xs.iter().map(|&c| x[c]).sum();
            edges.push((id_of(yi), id_of(xi), EdgeAttr { weight, lo: cap.lo, hi: cap.hi }));
        }
    }
    edges
}

fn dedup_with_extras(family: &[CellSet], universe: &CellSet) -> Vec<CellSet> {
    let mut out: Vec<CellSet> = family.to_vec();
    if !out.iter().any(|s| s == universe) {
        out.push(universe.clone());
    }
    for &cell in universe {
        let singleton: CellSet = [cell].into_iter().collect();
        if !out.iter().any(|s| s == &singleton) {
            out.push(singleton);
        }
    }
    out
}

/// Build the combined directed graph
/// from the target matrix and a bihierarchy `(family_a, family_b)`.
fn graph_constructor(
    x: &Array2<f64>,
    family_a: &[CellSet],
    family_b: &[CellSet],
    caps: &BTreeMap<CellSet, Capacity>,
) -> (DiGraphMap<u32, EdgeAttr>, NodeTable) {
    let universe: CellSet = x.indexed_iter().map(|(idx, _)| idx).collect();
    let a_nodes = dedup_with_extras(family_a, &universe);
    let bp_nodes = dedup_with_extras(family_b, &universe);
    let table = NodeTable { a: a_nodes.clone(), bp: bp_nodes.clone() };

    let mut g = DiGraphMap::new();
    for (u, v, attr) in covering_edges(&a_nodes, |i| table.a_id(i), caps, x) {
        g.add_edge(u.0, v.0, attr);
    }
    for (u, v, attr) in covering_edges(&bp_nodes, |i| table.bp_id(i), caps, x) {
        g.add_edge(u.0, v.0, attr);
    }
    for &cell in &universe {
        let singleton: CellSet = [cell].into_iter().collect();
        let a = table.find_a(&singleton).expect("singleton present in A");
        let b = table.find_bp(&singleton).expect("singleton present in B");
        g.add_edge(a.0, b.0, EdgeAttr { weight: x[cell], lo: 0.0, hi: 1.0 });
    }
    (g, table)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// Find an undirected cycle among `eligible`, tagging each traversed
/// edge with whether it was walked along or against its stored
/// direction (mirrors `nx.find_cycle(..., orientation='ignore')`).
fn find_cycle(eligible: &[(u32, u32, EdgeAttr)]) -> Option<Vec<(u32, u32, Direction)>> {
    let mut adj: BTreeMap<u32, Vec<(u32, Direction)>> = BTreeMap::new();
    for &(u, v, _) in eligible {
        adj.entry(u).or_default().push((v, Direction::Forward));
        adj.entry(v).or_default().push((u, Direction::Reverse));
    }
    let start = *adj.keys().next()?;
    let mut visited: BTreeMap<u32, usize> = BTreeMap::new();
    let mut path: Vec<(u32, u32, Direction)> = Vec::new();
    let mut on_path: Vec<u32> = Vec::new();

    fn dfs(
        node: u32,
        parent: Option<u32>,
        adj: &BTreeMap<u32, Vec<(u32, Direction)>>,
        visited: &mut BTreeMap<u32, usize>,
        on_path: &mut Vec<u32>,
        path: &mut Vec<(u32, u32, Direction)>,
    ) -> Option<Vec<(u32, u32, Direction)>> {
        visited.insert(node, on_path.len());
        on_path.push(node);
        if let Some(neighbors) = adj.get(&node) {
            for &(next, dir) in neighbors {
                if Some(next) == parent {
                    continue;
                }
                if let Some(&pos) = visited.get(&next) {
                    let mut cycle = path[pos..].to_vec();
                    cycle.push((*on_path.last().unwrap(), next, dir));
                    return Some(cycle);
                }
                path.push((node, next, dir));
                if let Some(found) = dfs(next, Some(node), adj, visited, on_path, path) {
                    return Some(found);
                }
                path.pop();
            }
        }
        on_path.pop();
        None
    }

    dfs(start, None, &adj, &mut visited, &mut on_path, &mut path)
}

/// One step of the decomposition: pop a `(graph, probability)` pair,
/// split it along a found cycle, or declare it terminal.
fn iterator_step(
    queue: &mut Vec<(DiGraphMap<u32, EdgeAttr>, f64)>,
    solution: &mut Vec<(DiGraphMap<u32, EdgeAttr>, f64)>,
) {
    let (g, p) = queue.remove(0);

    let eligible: Vec<(u32, u32, EdgeAttr)> = g
        .all_edges()
        .filter(|&(_, _, attr)| !is_integral(attr.weight))
        .map(|(u, v, attr)| (u, v, *attr))
        .collect();

    if eligible.is_empty() {
        solution.push((g, p));
        return;
    }

    let cycle = match find_cycle(&eligible) {
        Some(c) => c,
        None => {
            // Should not happen for a genuine bihierarchy (Budish et
            // al. Lemma 1); treat as terminal rather than looping.
            solution.push((g, p));
            return;
        }
    };

    let edge_attr = |u: u32, v: u32| -> EdgeAttr {
        if let Some(a) = g.edge_weight(u, v) {
            *a
        } else {
            *g.edge_weight(v, u).expect("cycle edge present in one direction")
        }
    };

    let mut push_forward = f64::INFINITY;
    let mut pull_reverse = f64::INFINITY;
    let mut push_reverse = f64::INFINITY;
    let mut pull_forward = f64::INFINITY;
    for &(u, v, dir) in &cycle {
        let a = edge_attr(u, v);
        match dir {
            Direction::Forward => {
                push_forward = push_forward.min(a.hi - a.weight);
                pull_forward = pull_forward.min(a.weight - a.lo);
            }
            Direction::Reverse => {
                push_reverse = push_reverse.min(a.hi - a.weight);
                pull_reverse = pull_reverse.min(a.weight - a.lo);
            }
        }
    }

    let push_forward_pull_reverse = push_forward.min(pull_reverse);
    let push_reverse_pull_forward = pull_forward.min(push_reverse);
    let denom = push_forward_pull_reverse + push_reverse_pull_forward;
    let gamma = if denom <= TOLERANCE {
        0.5
    } else {
        (push_reverse_pull_forward / denom).clamp(0.0, 1.0)
    };

    let mut g1 = g.clone();
    let mut g2 = g.clone();
    for &(u, v, dir) in &cycle {
        let delta1 = match dir {
            Direction::Forward => push_forward_pull_reverse,
            Direction::Reverse => -push_forward_pull_reverse,
        };
        let delta2 = match dir {
            Direction::Forward => -push_reverse_pull_forward,
            Direction::Reverse => push_reverse_pull_forward,
        };
        apply_delta(&mut g1, u, v, delta1);
        apply_delta(&mut g2, u, v, delta2);
    }

    queue.push((g1, p * gamma));
    queue.push((g2, p * (1.0 - gamma)));
}

fn apply_delta(g: &mut DiGraphMap<u32, EdgeAttr>, u: u32, v: u32, delta: f64) {
    if let Some(a) = g.edge_weight_mut(u, v) {
        a.weight += delta;
    } else if let Some(a) = g.edge_weight_mut(v, u) {
        a.weight -= delta;
    }
}

/// Clean a raw solution list into rounded, merged basis matrices
/// by rounding near-integral weights and merging duplicate matrices.
fn solution_cleaner(
    shape: (usize, usize),
    table: &NodeTable,
    raw: Vec<(DiGraphMap<u32, EdgeAttr>, f64)>,
) -> Decomposition {
    let universe: Vec<Cell> = (0..shape.0).flat_map(|r| (0..shape.1).map(move |c| (r, c))).collect();

    let mut merged: BTreeMap<Vec<(Cell, u8)>, f64> = BTreeMap::new();
    for (g, p) in raw {
        let mut cells: Vec<(Cell, u8)> = Vec::with_capacity(universe.len());
        for &cell in &universe {
            let singleton: CellSet = [cell].into_iter().collect();
            let a = table.find_a(&singleton).expect("singleton in A");
            let b = table.find_bp(&singleton).expect("singleton in B");
            let weight = g
                .edge_weight(a.0, b.0)
                .map(|a| a.weight)
                .unwrap_or(0.0);
            let rounded = if weight > 1.0 - TOLERANCE { 1 } else { 0 };
            cells.push((cell, rounded));
        }
        *merged.entry(cells).or_insert(0.0) += p;
    }

    let components = merged
        .into_iter()
        .map(|(cells, probability)| {
            let mut matrix = Array2::<f64>::zeros(shape);
            for (cell, v) in cells {
                matrix[cell] = v as f64;
            }
            BasisMatrix { probability, matrix }
        })
        .collect();

    Decomposition { components }
}

/// Decompose `x` under `structure` into a probability-weighted set of
/// integral basis matrices consistent with the bihierarchy's capacity
/// bounds.
pub fn decompose(x: &Array2<f64>, structure: &ConstraintStructure) -> Result<Decomposition, Error> {
    feasibility_test(x, structure)?;
    let (family_a, family_b) = bihierarchy_test(structure)?;
    let caps: BTreeMap<CellSet, Capacity> = structure.sets.iter().cloned().collect();
    let (g, table) = graph_constructor(x, &family_a, &family_b, &caps);

    let mut queue = vec![(g, 1.0)];
    let mut solution = Vec::new();
    while !queue.is_empty() {
        iterator_step(&mut queue, &mut solution);
    }

    let decomposition = solution_cleaner(x.dim(), &table, solution);

    let reconstructed = decomposition.expectation(x.dim());
    let drift: f64 = (reconstructed - x).iter().map(|v| v.abs()).fold(0.0, f64::max);
    if drift > 10.0 * TOLERANCE {
        return Err(Error::NumericalDrift { drift, eps: TOLERANCE });
    }

    Ok(decomposition)
}
