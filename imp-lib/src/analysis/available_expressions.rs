use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};
use std::collections::HashMap;

use analysis::cfg::{CfgNode, ControlFlowGraph};
use analysis::domains::JoinSemiLattice;
use analysis::solvers::{DataflowResult, Direction, SolveMonotone, TransferFunction};
use itertools::Itertools;

use crate::cfg::Cfg;
use crate::ir::{Expr, StmtIdx};

/// Maps every available expression to the statement that first made it
/// available, the candidate a later occurrence can be replaced with.
/// The empty map doubles as bottom, so a node none of whose
/// predecessors were processed yet does not wipe out the intersection.
/// Joining two occurrences of the same expression keeps the smaller
/// index, which makes the join commutative and the result independent
/// of the order the predecessors are merged in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AvailEnv(pub(crate) HashMap<Expr, StmtIdx>);

impl AvailEnv {
    pub fn get(&self, expr: &Expr) -> Option<StmtIdx> {
        self.0.get(expr).copied()
    }

    pub fn contains(&self, expr: &Expr) -> bool {
        self.0.contains_key(expr)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Expr, StmtIdx)> {
        self.0.iter().map(|(expr, idx)| (expr, *idx))
    }
}

impl Debug for AvailEnv {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let entries = self
            .0
            .iter()
            .map(|(expr, idx)| format!("{expr:?} @ {idx}"))
            .sorted()
            .join(", ");
        write!(f, "{{{entries}}}")
    }
}

impl PartialOrd for AvailEnv {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        if self.is_empty() {
            return Some(Ordering::Less);
        }
        if other.is_empty() {
            return Some(Ordering::Greater);
        }
        // Larger sets of available expressions carry more information,
        // so they sit lower; for a shared expression the later index is
        // the lower one, matching the join keeping the minimum.
        let le = |lhs: &Self, rhs: &Self| {
            rhs.0
                .iter()
                .all(|(expr, rhs_idx)| lhs.0.get(expr).is_some_and(|lhs_idx| lhs_idx >= rhs_idx))
        };
        match (le(self, other), le(other, self)) {
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            _ => None,
        }
    }
}

impl JoinSemiLattice for AvailEnv {
    type LatticeContext = ();

    fn bottom(_ctx: &Self::LatticeContext) -> Self {
        Self::default()
    }

    fn join(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let intersection = self
            .0
            .iter()
            .filter_map(|(expr, &idx)| {
                other
                    .0
                    .get(expr)
                    .map(|&other_idx| (expr.clone(), idx.min(other_idx)))
            })
            .collect();
        Self(intersection)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvailableExpressions;

impl AvailableExpressions {
    pub fn analyze(cfg: &Cfg, node_limit: usize) -> Option<DataflowResult<AvailEnv>> {
        let solver = SolveMonotone { node_limit };
        solver.solve(
            cfg,
            Direction::Forward,
            AvailEnv::bottom(&()),
            &(),
            &mut AvailableExpressions,
        )
    }
}

impl TransferFunction<Cfg, AvailEnv> for AvailableExpressions {
    fn node(&mut self, id: usize, cfg: &Cfg, _ctx: &(), pre_state: &AvailEnv) -> AvailEnv {
        let (Some(stmt), Some(idx)) = (cfg.nodes()[id].stmt(), cfg.stmt_of(id)) else {
            return pre_state.clone();
        };
        let mut post = pre_state.clone();
        // An expression already available keeps its earlier source.
        if let Some(expr) = stmt.expression() {
            if !post.contains(&expr) {
                post.0.insert(expr, idx);
            }
        }
        // Redefining a variable invalidates every expression reading it,
        // including the one generated above when the statement reads its
        // own result.
        if let Some(def) = stmt.def() {
            post.0.retain(|expr, _| !expr.references(def));
        }
        post
    }
}
