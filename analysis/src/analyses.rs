use super::cfg::{CfgNode, ControlFlowGraph};
use super::domains::{BitSetDomain, BitSetTop, Flipped};
use super::solvers::{Direction, NodeTransfer, SolveMonotone};

/// Calculate the dominator set of every node: the set of nodes every path
/// from the entry has to pass through to reach it. A node dominates
/// itself. The analysis is a forward must-analysis, so the lattice is the
/// flipped power set: every node starts from the full universe and merge
/// points intersect. Returns `None` when the solver did not converge
/// within the node limit.
pub fn calculate_dominators<Cfg: ControlFlowGraph>(
    cfg: &Cfg,
    node_limit: usize,
) -> Option<Vec<Flipped<BitSetDomain>>> {
    let ctx = BitSetTop(cfg.nodes().len());
    let boundary = Flipped(BitSetDomain::from(&ctx, &[cfg.entry()]));
    let mut transfer = NodeTransfer::new(
        |id: usize, _cfg: &Cfg, _ctx: &BitSetTop, pre_state: &Flipped<BitSetDomain>| {
            let mut result = pre_state.clone();
            result.insert(id);
            result
        },
    );
    let solver = SolveMonotone { node_limit };
    let result = solver.solve(cfg, Direction::Forward, boundary, &ctx, &mut transfer)?;
    Some(result.into_post_states())
}

/// Whether node `a` dominates node `b` according to the dominator sets
/// computed by [`calculate_dominators`].
pub fn dominates(doms: &[Flipped<BitSetDomain>], a: usize, b: usize) -> bool {
    doms[b].contains(a)
}

/// The edges whose target dominates their source. Every such edge closes
/// a natural loop with the target as the loop header. The result is in a
/// deterministic order: sources ascending, and for a given source the
/// successor order of the graph.
pub fn get_dominance_back_edges<Cfg: ControlFlowGraph>(
    cfg: &Cfg,
    doms: &[Flipped<BitSetDomain>],
) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for (source, node) in cfg.nodes().iter().enumerate() {
        for &target in node.successors() {
            if dominates(doms, target, source) {
                edges.push((source, target));
            }
        }
    }
    edges
}
