use std::collections::{BTreeSet, HashSet, VecDeque};

use analysis::cfg::{CfgNode, ControlFlowGraph};
use analysis::domains::{BitSetDomain, Flat};
use analysis::solvers::DataflowResult;

use crate::analysis::constant_propagation::{self, ConstCtx, ConstEnv};
use crate::cfg::{Cfg, EdgeKind};
use crate::ir::{Stmt, StmtIdx};

/// Statements that can never execute or whose results are never
/// observed, sorted by index. Reachability follows the constant
/// propagation results, so a branch on a known condition only keeps the
/// taken side alive. A reached assignment is dead when its result is
/// not live afterwards and computing it cannot fault or call anything.
pub fn find_dead_code(
    cfg: &Cfg,
    constants: &DataflowResult<ConstEnv>,
    liveness: &DataflowResult<BitSetDomain>,
) -> BTreeSet<StmtIdx> {
    let reachable = reachable_nodes(cfg, constants);
    let mut dead = BTreeSet::new();
    for (id, node) in cfg.nodes().iter().enumerate() {
        let (Some(stmt), Some(idx)) = (node.stmt(), cfg.stmt_of(id)) else {
            continue;
        };
        if !reachable.contains(&id) {
            dead.insert(idx);
            continue;
        }
        if let Some(def) = stmt.def() {
            if !liveness.pre_state(id).contains(def.0) && !stmt.has_side_effect() {
                dead.insert(idx);
            }
        }
    }
    dead
}

fn reachable_nodes(cfg: &Cfg, constants: &DataflowResult<ConstEnv>) -> HashSet<usize> {
    let ctx = ConstCtx::new(());
    let mut reachable = HashSet::from([cfg.entry()]);
    let mut worklist = VecDeque::from([cfg.entry()]);
    while let Some(id) = worklist.pop_front() {
        for &succ in cfg.nodes()[id].successors() {
            if reachable.contains(&succ) || edge_is_infeasible(cfg, id, succ, constants, &ctx) {
                continue;
            }
            reachable.insert(succ);
            worklist.push_back(succ);
        }
    }
    reachable
}

fn edge_is_infeasible(
    cfg: &Cfg,
    from: usize,
    to: usize,
    constants: &DataflowResult<ConstEnv>,
    ctx: &ConstCtx,
) -> bool {
    let Some(Stmt::If { cond, .. }) = cfg.nodes()[from].stmt() else {
        return false;
    };
    // When the true and fall-through targets coincide the edge kind is
    // ambiguous; the edge stays feasible.
    let Some(kind) = cfg.edge_kind(from, to) else {
        return false;
    };
    let value = constant_propagation::eval_condition(cond, constants.pre_state(from), ctx);
    match (value, kind) {
        (Flat::Element(c), EdgeKind::IfTrue) => c == 0,
        (Flat::Element(c), EdgeKind::IfFalse) => c != 0,
        _ => false,
    }
}
