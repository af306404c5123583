use core::marker::PhantomData;
use std::collections::HashSet;

use super::cfg::{CfgNode, ControlFlowGraph, RPOWorklist};
use super::domains::JoinSemiLattice;

/// The direction a data-flow analysis propagates facts in. Forward
/// analyses merge over predecessors and start from the entry node,
/// backward analyses merge over successors and start from the exit node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Transfer functions need to implement this trait and define
/// [`TransferFunction::node`]. For simple cases creating a [`NodeTransfer`]
/// from a closure should be sufficient.
pub trait TransferFunction<Cfg, D>
where
    Cfg: ControlFlowGraph,
    D: JoinSemiLattice,
{
    /// Apply the effects of a node to the analysis state. The node id can
    /// be used to look up the statement in the graph; synthetic nodes
    /// usually leave the state unchanged.
    fn node(&mut self, id: usize, cfg: &Cfg, ctx: &D::LatticeContext, pre_state: &D) -> D;

    /// Optional function to apply the effects of traversing an edge. The
    /// edge is always given in its natural direction, `from` -> `to`; for
    /// backward analyses the state still flows from the target towards the
    /// source. Returning `None` means the edge contributes nothing to the
    /// merged state, the most common use case is to refine the state using
    /// branch conditions.
    fn edge(
        &mut self,
        _from: usize,
        _to: usize,
        _cfg: &Cfg,
        _ctx: &D::LatticeContext,
        pre_state: &D,
    ) -> Option<D> {
        Some(pre_state.clone())
    }
}

/// Small utility so users do not need to create a new struct for every
/// transfer function.
pub struct NodeTransfer<F, Cfg, D>
where
    Cfg: ControlFlowGraph,
    D: JoinSemiLattice,
    F: FnMut(usize, &Cfg, &D::LatticeContext, &D) -> D,
{
    func: F,
    phantom: PhantomData<(Cfg, D)>,
}

impl<F, Cfg, D> NodeTransfer<F, Cfg, D>
where
    Cfg: ControlFlowGraph,
    D: JoinSemiLattice,
    F: FnMut(usize, &Cfg, &D::LatticeContext, &D) -> D,
{
    /// Create a new transfer function from a closure or function.
    pub fn new(func: F) -> Self {
        Self {
            func,
            phantom: PhantomData,
        }
    }
}

impl<F, Cfg, D> TransferFunction<Cfg, D> for NodeTransfer<F, Cfg, D>
where
    Cfg: ControlFlowGraph,
    D: JoinSemiLattice,
    F: FnMut(usize, &Cfg, &D::LatticeContext, &D) -> D,
{
    fn node(&mut self, id: usize, cfg: &Cfg, ctx: &D::LatticeContext, pre_state: &D) -> D {
        (self.func)(id, cfg, ctx, pre_state)
    }
}

/// The per-node facts computed by a solver run. For forward analyses the
/// pre state of a node is the merge over its predecessors and the post
/// state is the result of its transfer function; for backward analyses
/// pre is the merged state *after* the node in execution order and post
/// the state before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataflowResult<D> {
    pre_states: Vec<D>,
    post_states: Vec<D>,
}

impl<D> DataflowResult<D> {
    pub fn pre_state(&self, node: usize) -> &D {
        &self.pre_states[node]
    }

    pub fn post_state(&self, node: usize) -> &D {
        &self.post_states[node]
    }

    pub fn pre_states(&self) -> &[D] {
        &self.pre_states
    }

    pub fn post_states(&self) -> &[D] {
        &self.post_states
    }

    pub fn into_post_states(self) -> Vec<D> {
        self.post_states
    }
}

/// A basic solver for monotonic transfer functions. It is also doing
/// widening on loop heads. The solver visits the queued nodes in reverse
/// post-order with respect to the traversal direction.
///
/// Requirements:
/// * The transfer functions must be monotone and the lattice of finite
///   height (or the widen operation must enforce convergence); this is an
///   obligation on the analysis author, the solver cannot check it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SolveMonotone {
    /// Set the approximate iteration limit per node. If the limit is
    /// reached (the analysis did not converge in the permitted number of
    /// steps), the solver terminates without a result.
    pub node_limit: usize,
}

impl Default for SolveMonotone {
    fn default() -> Self {
        Self { node_limit: 20 }
    }
}

impl SolveMonotone {
    /// Run the solver to a fixed point. The boundary state seeds the entry
    /// node (exit node for backward analyses); every other node starts
    /// from bottom. Returns `None` when the analysis did not converge
    /// within the node limit.
    pub fn solve<Cfg, D, F>(
        self,
        cfg: &Cfg,
        direction: Direction,
        boundary: D,
        lat_ctx: &D::LatticeContext,
        transfer: &mut F,
    ) -> Option<DataflowResult<D>>
    where
        Cfg: ControlFlowGraph,
        D: JoinSemiLattice,
        F: TransferFunction<Cfg, D>,
    {
        let node_num = cfg.nodes().len();
        let start = match direction {
            Direction::Forward => cfg.entry(),
            Direction::Backward => cfg.exit(),
        };

        // Loop heads are targets of edges that close a cycle with respect
        // to the traversal direction; they are the widening points.
        let loop_heads = back_edge_targets(cfg, direction);

        let mut pre_states = vec![D::bottom(lat_ctx); node_num];
        let mut post_states = vec![D::bottom(lat_ctx); node_num];
        let mut visited = vec![false; node_num];

        let mut worklist = match direction {
            Direction::Forward => RPOWorklist::new(cfg),
            Direction::Backward => RPOWorklist::backward(cfg),
        };
        worklist.push_all();

        let limit = self.node_limit * node_num;
        let mut processed_nodes = 0_usize;
        while let Some(current) = worklist.pop() {
            if limit > 0 && processed_nodes >= limit {
                return None;
            }
            processed_nodes += 1;

            let mut pre_state = if current == start {
                boundary.clone()
            } else {
                D::bottom(lat_ctx)
            };
            let sources = match direction {
                Direction::Forward => cfg.nodes()[current].predecessors(),
                Direction::Backward => cfg.nodes()[current].successors(),
            };
            for &source in sources {
                let (from, to) = match direction {
                    Direction::Forward => (source, current),
                    Direction::Backward => (current, source),
                };
                if let Some(transferred) =
                    transfer.edge(from, to, cfg, lat_ctx, &post_states[source])
                {
                    pre_state = pre_state.join(&transferred, lat_ctx);
                }
            }

            let mut post_state = transfer.node(current, cfg, lat_ctx, &pre_state);
            if loop_heads.contains(&current) {
                post_state =
                    post_state.widen(&post_states[current], lat_ctx, processed_nodes / node_num);
            }

            pre_states[current] = pre_state;
            if visited[current] && post_states[current] == post_state {
                continue;
            }

            visited[current] = true;
            post_states[current] = post_state;
            let dependents = match direction {
                Direction::Forward => cfg.nodes()[current].successors(),
                Direction::Backward => cfg.nodes()[current].predecessors(),
            };
            for &next in dependents {
                worklist.push(next);
            }
        }

        Some(DataflowResult {
            pre_states,
            post_states,
        })
    }
}

fn back_edge_targets<Cfg: ControlFlowGraph>(cfg: &Cfg, direction: Direction) -> HashSet<usize> {
    if direction == Direction::Forward {
        return super::cfg::get_back_edges(cfg)
            .iter()
            .map(|&(_, target)| target)
            .collect();
    }

    // The same depth-first search against the edges, from the exit.
    let node_num = cfg.nodes().len();
    let mut targets = HashSet::new();
    let mut visited = vec![false; node_num];
    let mut on_stack = vec![false; node_num];
    let start = cfg.exit();
    let mut stack = vec![(start, 0_usize)];
    visited[start] = true;
    on_stack[start] = true;
    while let Some((node, child)) = stack.last_mut() {
        let node = *node;
        match cfg.nodes()[node].predecessors().get(*child) {
            Some(&next) => {
                *child += 1;
                if on_stack[next] {
                    targets.insert(next);
                } else if !visited[next] {
                    visited[next] = true;
                    on_stack[next] = true;
                    stack.push((next, 0));
                }
            }
            None => {
                on_stack[node] = false;
                stack.pop();
            }
        }
    }
    targets
}
