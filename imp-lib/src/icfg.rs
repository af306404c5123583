use core::fmt::{self, Display, Formatter};
use std::collections::{HashMap, HashSet};

use analysis::cfg::{CfgNode, ControlFlowGraph};
use itertools::Itertools;

use crate::cfg::{Cfg, EdgeKind};
use crate::ir::{self, FuncId, Program, Stmt, StmtIdx};

/// A call statement within a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSite {
    pub func: FuncId,
    pub stmt: StmtIdx,
}

/// Caller/callee edges provided by an external call graph builder. Call
/// sites the builder could not resolve are simply absent and keep only
/// their intraprocedural edges in the ICFG.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    callees: HashMap<CallSite, FuncId>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_call(&mut self, site: CallSite, callee: FuncId) {
        self.callees.insert(site, callee);
    }

    pub fn callee_of(&self, site: CallSite) -> Option<FuncId> {
        self.callees.get(&site).copied()
    }

    pub fn callers_of(&self, func: FuncId) -> Vec<CallSite> {
        self.callees
            .iter()
            .filter(|&(_, &callee)| callee == func)
            .map(|(&site, _)| site)
            .sorted()
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IcfgEdgeKind {
    /// An edge within a single function.
    Intra(EdgeKind),
    /// Call site to callee entry.
    Call,
    /// Callee exit to a return site.
    Return,
    /// Call site directly to its return site, the "skip the callee"
    /// path.
    CallToReturn,
}

impl Display for IcfgEdgeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IcfgEdgeKind::Intra(kind) => kind.fmt(f),
            IcfgEdgeKind::Call => write!(f, "call"),
            IcfgEdgeKind::Return => write!(f, "return"),
            IcfgEdgeKind::CallToReturn => write!(f, "call-to-return"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IcfgNode {
    stmt: Option<Stmt>,
    func: FuncId,
    succs: Vec<usize>,
    preds: Vec<usize>,
}

impl CfgNode for IcfgNode {
    type Stmt = Stmt;

    fn stmt(&self) -> Option<&Stmt> {
        self.stmt.as_ref()
    }

    fn successors(&self) -> &[usize] {
        &self.succs
    }

    fn predecessors(&self) -> &[usize] {
        &self.preds
    }
}

/// The union of every function's CFG with interprocedural edges for
/// each resolved call site. Node ids are global: a function's nodes
/// occupy a dense range starting at its offset, in the same order as in
/// its own CFG. A resolved call's fall-through edge becomes its
/// call-to-return edge rather than appearing twice.
#[derive(Clone, Debug)]
pub struct Icfg {
    nodes: Vec<IcfgNode>,
    offsets: Vec<usize>,
    edge_kinds: HashMap<(usize, usize), Vec<IcfgEdgeKind>>,
    call_sites: HashSet<usize>,
}

impl Icfg {
    pub fn new(cfgs: &[Cfg], call_graph: &CallGraph) -> Self {
        let mut offsets = Vec::with_capacity(cfgs.len());
        let mut nodes = Vec::new();
        for (f, cfg) in cfgs.iter().enumerate() {
            offsets.push(nodes.len());
            for node in cfg.nodes() {
                nodes.push(IcfgNode {
                    stmt: node.stmt().cloned(),
                    func: FuncId(f),
                    succs: Vec::new(),
                    preds: Vec::new(),
                });
            }
        }
        let mut icfg = Self {
            nodes,
            offsets,
            edge_kinds: HashMap::new(),
            call_sites: HashSet::new(),
        };

        for (f, cfg) in cfgs.iter().enumerate() {
            let func = FuncId(f);
            let resolved = |local: usize| -> Option<FuncId> {
                if !matches!(cfg.nodes()[local].stmt(), Some(Stmt::Call { .. })) {
                    return None;
                }
                let stmt = cfg.stmt_of(local)?;
                call_graph.callee_of(CallSite { func, stmt })
            };
            for &(from, to, kind) in cfg.edges() {
                let kind = match kind {
                    // The local skip-over path of a resolved call.
                    EdgeKind::FallThrough if resolved(from).is_some() => {
                        IcfgEdgeKind::CallToReturn
                    }
                    other => IcfgEdgeKind::Intra(other),
                };
                icfg.add_edge(icfg.global(func, from), icfg.global(func, to), kind);
            }
            for local in 0..cfg.nodes().len() {
                let Some(callee) = resolved(local) else {
                    continue;
                };
                let from = icfg.global(func, local);
                icfg.call_sites.insert(from);
                icfg.add_edge(from, icfg.entry_of(callee), IcfgEdgeKind::Call);
                // Return sites are the call's intraprocedural
                // successors.
                let exit = icfg.exit_of(callee);
                for &ret in cfg.nodes()[local].successors() {
                    icfg.add_edge(exit, icfg.global(func, ret), IcfgEdgeKind::Return);
                }
            }
        }
        icfg
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: IcfgEdgeKind) {
        self.nodes[from].succs.push(to);
        self.nodes[to].preds.push(from);
        self.edge_kinds.entry((from, to)).or_default().push(kind);
    }

    /// Global node id of a function-local node.
    pub fn global(&self, func: FuncId, local: usize) -> usize {
        self.offsets[func.0] + local
    }

    pub fn containing_function(&self, node: usize) -> FuncId {
        self.nodes[node].func
    }

    pub fn is_call_site(&self, node: usize) -> bool {
        self.call_sites.contains(&node)
    }

    pub fn entry_of(&self, func: FuncId) -> usize {
        self.offsets[func.0]
    }

    pub fn exit_of(&self, func: FuncId) -> usize {
        match self.offsets.get(func.0 + 1) {
            Some(&next) => next - 1,
            None => self.nodes.len() - 1,
        }
    }

    /// The kind of the edge between two nodes, `None` when there is no
    /// such edge or parallel edges of different kinds connect the pair.
    pub fn edge_kind(&self, from: usize, to: usize) -> Option<IcfgEdgeKind> {
        match self.edge_kinds.get(&(from, to))?.as_slice() {
            [kind] => Some(*kind),
            _ => None,
        }
    }
}

impl ControlFlowGraph for Icfg {
    type Node = IcfgNode;

    fn nodes(&self) -> &[IcfgNode] {
        &self.nodes
    }
}

/// Render the whole-program graph in graphviz dot format.
pub fn print(icfg: &Icfg, program: &Program) -> String {
    analysis::cfg::print(
        Some("ICFG"),
        icfg,
        |id, node: &IcfgNode| {
            let func = icfg.containing_function(id);
            match node.stmt() {
                Some(stmt) => ir::print_stmt(stmt, program.function(func), program),
                None if id == icfg.entry_of(func) => {
                    format!("Entry({})", program.function(func).name())
                }
                None => format!("Exit({})", program.function(func).name()),
            }
        },
        |from, to| {
            let kinds = icfg.edge_kinds.get(&(from, to))?;
            Some(kinds.iter().map(IcfgEdgeKind::to_string).join(", "))
        },
    )
}
