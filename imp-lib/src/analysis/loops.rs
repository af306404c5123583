use std::collections::{BTreeSet, HashMap};

use analysis::analyses::get_dominance_back_edges;
use analysis::cfg::{CfgNode, ControlFlowGraph};

use crate::analysis::dominators::DominatorSets;
use crate::cfg::Cfg;
use crate::ir::{Stmt, StmtIdx};

/// A natural loop. The body is the contiguous statement range from the
/// header to the latest latch, which assumes structured control flow
/// lays loop bodies out contiguously in program order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loop {
    pub header: StmtIdx,
    /// The branches inside the body that jump back to the header.
    pub tails: BTreeSet<StmtIdx>,
    pub body: BTreeSet<StmtIdx>,
}

/// Find the natural loops of the graph, one per header, sorted by
/// header index. When a header has several back edges, the one whose
/// source has the greatest index delimits the body.
pub fn find_loops(cfg: &Cfg, doms: &DominatorSets) -> Vec<Loop> {
    let mut latest_tail: HashMap<StmtIdx, StmtIdx> = HashMap::new();
    for (source, target) in get_dominance_back_edges(cfg, doms) {
        let (Some(source), Some(target)) = (cfg.stmt_of(source), cfg.stmt_of(target)) else {
            continue;
        };
        let tail = latest_tail.entry(target).or_insert(source);
        *tail = (*tail).max(source);
    }

    let mut headers: Vec<_> = latest_tail.keys().copied().collect();
    headers.sort_unstable();
    headers
        .into_iter()
        .map(|header| {
            let body: BTreeSet<_> = (header..=latest_tail[&header]).collect();
            let tails = body
                .iter()
                .copied()
                .filter(|&idx| {
                    matches!(
                        cfg.nodes()[Cfg::node_of(idx)].stmt(),
                        Some(Stmt::Jump { target } | Stmt::If { target, .. }) if *target == header
                    )
                })
                .collect();
            Loop {
                header,
                tails,
                body,
            }
        })
        .collect()
}
