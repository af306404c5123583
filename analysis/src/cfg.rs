use core::cmp::Reverse;
use core::fmt::Write;
use std::collections::HashSet;

use priority_queue::PriorityQueue;

/// A node of a statement-level control flow graph. Each node carries at
/// most one statement; synthetic nodes like the entry or the exit carry
/// none.
pub trait CfgNode {
    type Stmt;

    fn stmt(&self) -> Option<&Self::Stmt>;
    fn successors(&self) -> &[usize];
    fn predecessors(&self) -> &[usize];
}

/// A control flow graph over dense node indices. By convention the entry
/// node is the first and the exit node is the last one, so graphs can be
/// traversed in either direction without extra bookkeeping.
pub trait ControlFlowGraph {
    type Node: CfgNode;

    fn nodes(&self) -> &[Self::Node];

    fn entry(&self) -> usize {
        0
    }

    fn exit(&self) -> usize {
        self.nodes().len() - 1
    }
}

/// A worklist that pops the queued nodes in reverse post-order. For
/// forward analyses this approximates program order, so most nodes have
/// their predecessors processed before they are visited. The
/// [`RPOWorklist::backward`] constructor numbers the nodes against the
/// edges starting from the exit, which gives the symmetric property for
/// backward analyses.
pub struct RPOWorklist {
    queue: PriorityQueue<usize, Reverse<usize>>,
    rpo_order: Vec<usize>,
}

impl RPOWorklist {
    pub fn new<Cfg: ControlFlowGraph>(cfg: &Cfg) -> Self {
        Self::with_order(cfg, cfg.entry(), false)
    }

    pub fn backward<Cfg: ControlFlowGraph>(cfg: &Cfg) -> Self {
        Self::with_order(cfg, cfg.exit(), true)
    }

    fn with_order<Cfg: ControlFlowGraph>(cfg: &Cfg, start: usize, reversed: bool) -> Self {
        let node_num = cfg.nodes().len();
        let neighbors = |node: usize| -> &[usize] {
            if reversed {
                cfg.nodes()[node].predecessors()
            } else {
                cfg.nodes()[node].successors()
            }
        };

        let mut visited = vec![false; node_num];
        let mut post_order = Vec::with_capacity(node_num);
        let mut stack = vec![(start, 0_usize)];
        visited[start] = true;
        while let Some((node, child)) = stack.last_mut() {
            let node = *node;
            match neighbors(node).get(*child) {
                Some(&next) => {
                    *child += 1;
                    if !visited[next] {
                        visited[next] = true;
                        stack.push((next, 0));
                    }
                }
                None => {
                    post_order.push(node);
                    stack.pop();
                }
            }
        }

        let mut rpo_order = vec![usize::MAX; node_num];
        for (order, &node) in post_order.iter().rev().enumerate() {
            rpo_order[node] = order;
        }
        // Nodes unreachable from the starting point are queued after all
        // reachable ones, in index order.
        let mut next_order = post_order.len();
        for order in rpo_order.iter_mut() {
            if *order == usize::MAX {
                *order = next_order;
                next_order += 1;
            }
        }

        Self {
            queue: PriorityQueue::new(),
            rpo_order,
        }
    }

    pub fn push(&mut self, node: usize) {
        self.queue.push(node, Reverse(self.rpo_order[node]));
    }

    pub fn push_all(&mut self) {
        for node in 0..self.rpo_order.len() {
            self.push(node);
        }
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.queue.pop().map(|(node, _)| node)
    }

    pub fn get_rpo_order(&self, node: usize) -> usize {
        self.rpo_order[node]
    }
}

/// Returns the edges closing a cycle during a depth-first traversal from
/// the entry. Every loop has at least one such edge; the solvers use their
/// targets as widening points.
pub fn get_back_edges<Cfg: ControlFlowGraph>(cfg: &Cfg) -> HashSet<(usize, usize)> {
    let node_num = cfg.nodes().len();
    let mut back_edges = HashSet::new();
    let mut visited = vec![false; node_num];
    let mut on_stack = vec![false; node_num];
    let start = cfg.entry();
    let mut stack = vec![(start, 0_usize)];
    visited[start] = true;
    on_stack[start] = true;
    while let Some((node, child)) = stack.last_mut() {
        let node = *node;
        match cfg.nodes()[node].successors().get(*child) {
            Some(&next) => {
                *child += 1;
                if on_stack[next] {
                    back_edges.insert((node, next));
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
    back_edges
}

/// Render the graph in graphviz dot format. The node printer receives
/// the node id so synthetic nodes can be labeled; the edge printer can
/// return `None` for edges that need no label.
pub fn print<Cfg, NodePrinter, EdgePrinter>(
    name: Option<&str>,
    cfg: &Cfg,
    node_printer: NodePrinter,
    edge_printer: EdgePrinter,
) -> String
where
    Cfg: ControlFlowGraph,
    NodePrinter: Fn(usize, &Cfg::Node) -> String,
    EdgePrinter: Fn(usize, usize) -> Option<String>,
{
    let mut output = match name {
        Some(name) => format!("digraph {name} {{\n"),
        None => "digraph CFG {\n".to_owned(),
    };
    for (counter, node) in cfg.nodes().iter().enumerate() {
        writeln!(
            output,
            "  Node_{}[label=\"{}\"]",
            counter,
            node_printer(counter, node)
        )
        .unwrap();
    }
    output.push('\n');
    for (counter, node) in cfg.nodes().iter().enumerate() {
        for &next in node.successors() {
            match edge_printer(counter, next) {
                Some(label) => {
                    writeln!(output, "  Node_{counter} -> Node_{next} [label=\"{label}\"]")
                        .unwrap();
                }
                None => writeln!(output, "  Node_{counter} -> Node_{next}").unwrap(),
            }
        }
    }
    output.push_str("}\n");
    output
}
