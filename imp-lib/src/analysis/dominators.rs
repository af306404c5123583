use analysis::analyses::calculate_dominators;
use analysis::domains::{BitSetDomain, Flipped};

use crate::cfg::Cfg;

/// The dominator set of every node, indexed by node id. Node `a`
/// dominates node `b` when `doms[b]` contains `a`; every node dominates
/// itself.
pub type DominatorSets = Vec<Flipped<BitSetDomain>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DominatorAnalysis;

impl DominatorAnalysis {
    pub fn analyze(cfg: &Cfg, node_limit: usize) -> Option<DominatorSets> {
        calculate_dominators(cfg, node_limit)
    }
}
