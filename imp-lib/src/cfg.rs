use core::fmt::{self, Display, Formatter};
use std::collections::HashMap;

use analysis::cfg::{CfgNode, ControlFlowGraph};
use itertools::Itertools;

use crate::ir::{self, Function, Program, Stmt, StmtIdx, Variable};

/// How control reaches the target of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// The synthetic entry node to the first statement.
    Entry,
    /// Sequential execution.
    FallThrough,
    /// An unconditional `goto`.
    Jump,
    /// A taken conditional branch.
    IfTrue,
    /// A fallen-through conditional branch.
    IfFalse,
    /// A `ret` to the synthetic exit node.
    Return,
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            EdgeKind::Entry => "entry",
            EdgeKind::FallThrough => "fall-through",
            EdgeKind::Jump => "jump",
            EdgeKind::IfTrue => "true",
            EdgeKind::IfFalse => "false",
            EdgeKind::Return => "return",
        };
        write!(f, "{text}")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    stmt: Option<Stmt>,
    succs: Vec<usize>,
    preds: Vec<usize>,
}

impl CfgNode for Node {
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

/// A statement-level control flow graph. Node 0 is a synthetic entry,
/// the last node a synthetic exit; statement `i` lives in node `i + 1`.
/// Edges are never added for targets outside the function body, and a
/// final statement that would fall off the end simply gets no outgoing
/// edge, so malformed bodies degrade to partial graphs instead of
/// panics.
#[derive(Clone, Debug)]
pub struct Cfg {
    nodes: Vec<Node>,
    edges: Vec<(usize, usize, EdgeKind)>,
    edge_kinds: HashMap<(usize, usize), Vec<EdgeKind>>,
    formals: Vec<Variable>,
    var_count: usize,
}

impl Cfg {
    pub fn new(func: &Function) -> Self {
        let stmts = func.stmts();
        let mut nodes = vec![Node::default(); stmts.len() + 2];
        for (idx, stmt) in stmts.iter().enumerate() {
            nodes[Self::node_of(idx)].stmt = Some(stmt.clone());
        }
        let mut cfg = Self {
            nodes,
            edges: Vec::new(),
            edge_kinds: HashMap::new(),
            formals: func.formals().to_vec(),
            var_count: func.var_count(),
        };
        let exit = cfg.exit();
        if stmts.is_empty() {
            cfg.add_edge(cfg.entry(), exit, EdgeKind::Entry);
            return cfg;
        }
        cfg.add_edge(cfg.entry(), Self::node_of(0), EdgeKind::Entry);
        for (idx, stmt) in stmts.iter().enumerate() {
            let from = Self::node_of(idx);
            let next = (idx + 1 < stmts.len()).then(|| Self::node_of(idx + 1));
            match stmt {
                Stmt::Jump { target } => {
                    if *target < stmts.len() {
                        cfg.add_edge(from, Self::node_of(*target), EdgeKind::Jump);
                    }
                }
                Stmt::If { target, .. } => {
                    if *target < stmts.len() {
                        cfg.add_edge(from, Self::node_of(*target), EdgeKind::IfTrue);
                    }
                    if let Some(next) = next {
                        cfg.add_edge(from, next, EdgeKind::IfFalse);
                    }
                }
                Stmt::Ret { .. } => cfg.add_edge(from, exit, EdgeKind::Return),
                _ => {
                    if let Some(next) = next {
                        cfg.add_edge(from, next, EdgeKind::FallThrough);
                    }
                }
            }
        }
        cfg
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: EdgeKind) {
        self.nodes[from].succs.push(to);
        self.nodes[to].preds.push(from);
        self.edges.push((from, to, kind));
        self.edge_kinds.entry((from, to)).or_default().push(kind);
    }

    /// Node id of the statement with the given index.
    pub fn node_of(stmt: StmtIdx) -> usize {
        stmt + 1
    }

    /// Statement index of a node, `None` for the entry and the exit.
    pub fn stmt_of(&self, node: usize) -> Option<StmtIdx> {
        (node != self.entry() && node != self.exit()).then(|| node - 1)
    }

    pub fn stmt_count(&self) -> usize {
        self.nodes.len() - 2
    }

    pub fn formals(&self) -> &[Variable] {
        &self.formals
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[(usize, usize, EdgeKind)] {
        &self.edges
    }

    /// The kind of the edge between two nodes. `None` when there is no
    /// such edge, or when parallel edges of different kinds connect the
    /// pair (an `if` whose true target is the next statement); callers
    /// relying on the kind have to stay conservative for those.
    pub fn edge_kind(&self, from: usize, to: usize) -> Option<EdgeKind> {
        match self.edge_kinds.get(&(from, to))?.as_slice() {
            [kind] => Some(*kind),
            _ => None,
        }
    }
}

impl ControlFlowGraph for Cfg {
    type Node = Node;

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Render the graph in graphviz dot format.
pub fn print(cfg: &Cfg, func: &Function, program: &Program) -> String {
    let name = format!("\"{}\"", func.name());
    analysis::cfg::print(
        Some(&name),
        cfg,
        |id, node: &Node| match node.stmt() {
            Some(stmt) => ir::print_stmt(stmt, func, program),
            None if id == cfg.entry() => "Entry".to_owned(),
            None => "Exit".to_owned(),
        },
        |from, to| {
            let kinds = cfg.edge_kinds.get(&(from, to))?;
            Some(kinds.iter().map(EdgeKind::to_string).join(", "))
        },
    )
}
