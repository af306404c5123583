use analysis::cfg::{CfgNode, ControlFlowGraph};
use analysis::domains::{BitSetDomain, BitSetTop, JoinSemiLattice};
use analysis::solvers::{DataflowResult, Direction, SolveMonotone, TransferFunction};

use crate::cfg::Cfg;
use crate::ir::Stmt;

/// Live variable analysis. In `strong` mode a copy reads its source
/// only when its own target is live after the statement, so chains of
/// copies feeding nothing but each other die together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveVariables {
    pub strong: bool,
}

impl LiveVariables {
    pub fn analyze(self, cfg: &Cfg, node_limit: usize) -> Option<DataflowResult<BitSetDomain>> {
        let ctx = BitSetTop(cfg.var_count());
        let boundary = BitSetDomain::bottom(&ctx);
        let solver = SolveMonotone { node_limit };
        let mut transfer = self;
        solver.solve(cfg, Direction::Backward, boundary, &ctx, &mut transfer)
    }
}

impl TransferFunction<Cfg, BitSetDomain> for LiveVariables {
    fn node(
        &mut self,
        id: usize,
        cfg: &Cfg,
        _ctx: &BitSetTop,
        pre_state: &BitSetDomain,
    ) -> BitSetDomain {
        let Some(stmt) = cfg.nodes()[id].stmt() else {
            return pre_state.clone();
        };
        let mut live = pre_state.clone();
        if self.strong {
            if let Stmt::Copy { result, operand } = stmt {
                let target_live = pre_state.contains(result.0);
                live.set(result.0, false);
                if target_live {
                    live.insert(operand.0);
                }
                return live;
            }
        }
        // Kill before gen, a statement reading its own result keeps it
        // live across itself.
        if let Some(def) = stmt.def() {
            live.set(def.0, false);
        }
        for var in stmt.used_vars() {
            live.insert(var.0);
        }
        live
    }
}
