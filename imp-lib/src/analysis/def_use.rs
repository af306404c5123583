use std::collections::{BTreeSet, HashMap};

use analysis::cfg::{CfgNode, ControlFlowGraph};
use analysis::domains::{BitSetDomain, BitSetTop, JoinSemiLattice};
use analysis::solvers::{DataflowResult, Direction, NodeTransfer, SolveMonotone};

use crate::cfg::Cfg;
use crate::ir::{Stmt, StmtIdx};

/// Def-use chains: which statements may read the value a definition
/// wrote, and which definitions may have produced the value a use
/// reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefUseChains {
    uses_of_def: HashMap<StmtIdx, BTreeSet<StmtIdx>>,
    defs_of_use: HashMap<StmtIdx, BTreeSet<StmtIdx>>,
}

impl DefUseChains {
    pub fn uses_of(&self, def: StmtIdx) -> Option<&BTreeSet<StmtIdx>> {
        self.uses_of_def.get(&def)
    }

    pub fn defs_of(&self, use_site: StmtIdx) -> Option<&BTreeSet<StmtIdx>> {
        self.defs_of_use.get(&use_site)
    }
}

/// Solve reaching definitions: per node, the set of definition sites
/// (statement indices) that may have produced the current value of any
/// variable. A definition kills every other definition site of the same
/// variable.
pub fn reaching_definitions(cfg: &Cfg, node_limit: usize) -> Option<DataflowResult<BitSetDomain>> {
    let ctx = BitSetTop(cfg.stmt_count());
    let mut def_sites = vec![BitSetDomain::bottom(&ctx); cfg.var_count()];
    for idx in 0..cfg.stmt_count() {
        if let Some(def) = cfg.nodes()[Cfg::node_of(idx)].stmt().and_then(Stmt::def) {
            def_sites[def.0].insert(idx);
        }
    }
    let mut transfer = NodeTransfer::new(
        |id: usize, cfg: &Cfg, _ctx: &BitSetTop, pre_state: &BitSetDomain| {
            let (Some(stmt), Some(idx)) = (cfg.nodes()[id].stmt(), cfg.stmt_of(id)) else {
                return pre_state.clone();
            };
            let Some(def) = stmt.def() else {
                return pre_state.clone();
            };
            let mut post = pre_state.clone();
            post.difference_with(&def_sites[def.0]);
            post.insert(idx);
            post
        },
    );
    let solver = SolveMonotone { node_limit };
    solver.solve(
        cfg,
        Direction::Forward,
        BitSetDomain::bottom(&ctx),
        &ctx,
        &mut transfer,
    )
}

/// Pair every use with the reaching definitions of the variable it
/// reads.
pub fn build_def_use_chains(
    cfg: &Cfg,
    reaching: &DataflowResult<BitSetDomain>,
) -> DefUseChains {
    let mut chains = DefUseChains::default();
    for (id, node) in cfg.nodes().iter().enumerate() {
        let (Some(stmt), Some(use_idx)) = (node.stmt(), cfg.stmt_of(id)) else {
            continue;
        };
        for var in stmt.used_vars() {
            for def_idx in reaching.pre_state(id).ones() {
                let def_stmt = cfg.nodes()[Cfg::node_of(def_idx)].stmt();
                if def_stmt.and_then(Stmt::def) == Some(var) {
                    chains.uses_of_def.entry(def_idx).or_default().insert(use_idx);
                    chains.defs_of_use.entry(use_idx).or_default().insert(def_idx);
                }
            }
        }
    }
    chains
}
