use super::cfg::*;

#[derive(Default, Clone)]
pub(crate) struct TestNode {
    succs: Vec<usize>,
    preds: Vec<usize>,
}

impl CfgNode for TestNode {
    type Stmt = ();

    fn stmt(&self) -> Option<&()> {
        None
    }

    fn successors(&self) -> &[usize] {
        &self.succs
    }

    fn predecessors(&self) -> &[usize] {
        &self.preds
    }
}

pub(crate) struct TestCfg {
    nodes: Vec<TestNode>,
}

impl ControlFlowGraph for TestCfg {
    type Node = TestNode;

    fn nodes(&self) -> &[Self::Node] {
        &self.nodes
    }
}

impl TestCfg {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            nodes: vec![TestNode::default(); size],
        }
    }

    pub(crate) fn add_edge(&mut self, from: usize, to: usize) -> &mut Self {
        self.nodes[from].succs.push(to);
        self.nodes[to].preds.push(from);
        self
    }
}

#[test]
fn test_cfg_print() {
    //     0
    //    / \
    //   1   2
    //   |   |
    //   |   3
    //    \ /
    //     4
    let mut cfg = TestCfg::new(5);
    cfg.add_edge(0, 1)
        .add_edge(0, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(3, 4);

    let printed = print(None, &cfg, |_, _| "".to_owned(), |_, _| None);
    let expected = r#"digraph CFG {
  Node_0[label=""]
  Node_1[label=""]
  Node_2[label=""]
  Node_3[label=""]
  Node_4[label=""]

  Node_0 -> Node_1
  Node_0 -> Node_2
  Node_1 -> Node_4
  Node_2 -> Node_3
  Node_3 -> Node_4
}
"#;
    assert_eq!(printed, expected);
}

#[test]
fn test_cfg_print_with_name_and_edge_labels() {
    let mut cfg = TestCfg::new(3);
    cfg.add_edge(0, 1).add_edge(0, 2);

    let printed = print(
        Some("\"branchy\""),
        &cfg,
        |id, _| format!("n{id}"),
        |from, to| Some(format!("{from}->{to}")),
    );
    let expected = r#"digraph "branchy" {
  Node_0[label="n0"]
  Node_1[label="n1"]
  Node_2[label="n2"]

  Node_0 -> Node_1 [label="0->1"]
  Node_0 -> Node_2 [label="0->2"]
}
"#;
    assert_eq!(printed, expected);
}

#[test]
fn test_rpo_order() {
    //     0
    //    / \
    //   1   2
    //   |   |
    //   |   3
    //    \ /
    //     4
    let mut cfg = TestCfg::new(5);
    cfg.add_edge(0, 1)
        .add_edge(0, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(3, 4);

    // The first-explored subtree finishes first in post-order, so the
    // branch through node 1 is numbered after the one through 2 and 3.
    let worklist = RPOWorklist::new(&cfg);
    assert_eq!(worklist.get_rpo_order(0), 0);
    assert_eq!(worklist.get_rpo_order(2), 1);
    assert_eq!(worklist.get_rpo_order(3), 2);
    assert_eq!(worklist.get_rpo_order(1), 3);
    assert_eq!(worklist.get_rpo_order(4), 4);

    // Every node is numbered before its successors in this acyclic graph.
    for (id, node) in cfg.nodes().iter().enumerate() {
        for &next in node.successors() {
            assert!(worklist.get_rpo_order(id) < worklist.get_rpo_order(next));
        }
    }
}

#[test]
fn test_rpo_order_mirrored() {
    //     0
    //    / \
    //   2   1
    //   |   |
    //   3   |
    //    \ /
    //     4
    let mut cfg = TestCfg::new(5);
    cfg.add_edge(0, 2)
        .add_edge(0, 1)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(3, 4);

    // Mirroring the edge insertion order flips which branch is explored
    // first, and with it the numbering of the two arms.
    let worklist = RPOWorklist::new(&cfg);
    assert_eq!(worklist.get_rpo_order(0), 0);
    assert_eq!(worklist.get_rpo_order(1), 1);
    assert_eq!(worklist.get_rpo_order(2), 2);
    assert_eq!(worklist.get_rpo_order(3), 3);
    assert_eq!(worklist.get_rpo_order(4), 4);
}

#[test]
fn test_rpo_pop_order() {
    let mut cfg = TestCfg::new(5);
    cfg.add_edge(0, 1)
        .add_edge(0, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(3, 4);

    let mut worklist = RPOWorklist::new(&cfg);
    worklist.push(4);
    worklist.push(2);
    worklist.push(0);
    assert_eq!(worklist.pop(), Some(0));
    assert_eq!(worklist.pop(), Some(2));
    assert_eq!(worklist.pop(), Some(4));
    assert_eq!(worklist.pop(), None);

    // Pushing a node twice only queues it once.
    worklist.push(3);
    worklist.push(3);
    assert_eq!(worklist.pop(), Some(3));
    assert_eq!(worklist.pop(), None);
}

#[test]
fn test_backward_rpo_order() {
    //     0
    //    / \
    //   1   2
    //   |   |
    //   |   3
    //    \ /
    //     4
    let mut cfg = TestCfg::new(5);
    cfg.add_edge(0, 1)
        .add_edge(0, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(3, 4);

    let worklist = RPOWorklist::backward(&cfg);
    // Numbered against the edges from the exit: every node is visited
    // before its predecessors in the original graph.
    assert_eq!(worklist.get_rpo_order(4), 0);
    assert!(worklist.get_rpo_order(1) < worklist.get_rpo_order(0));
    assert!(worklist.get_rpo_order(3) < worklist.get_rpo_order(2));
    assert_eq!(worklist.get_rpo_order(0), 4);
}

#[test]
fn test_rpo_order_unreachable_nodes() {
    // Node 2 has no incoming edges.
    let mut cfg = TestCfg::new(3);
    cfg.add_edge(0, 1);

    let worklist = RPOWorklist::new(&cfg);
    assert_eq!(worklist.get_rpo_order(0), 0);
    assert_eq!(worklist.get_rpo_order(1), 1);
    assert_eq!(worklist.get_rpo_order(2), 2);
}

#[test]
fn test_get_back_edges() {
    //      0  <----
    //     / \   | |
    //    1   2--| |
    //    |   |    |
    //    |   3----|
    //     \ /
    //      4
    let mut cfg = TestCfg::new(5);
    cfg.add_edge(0, 1)
        .add_edge(0, 2)
        .add_edge(1, 4)
        .add_edge(2, 3)
        .add_edge(2, 0)
        .add_edge(3, 4)
        .add_edge(3, 0);

    let edges = get_back_edges(&cfg);
    assert_eq!(edges.len(), 2);
    assert!(edges.contains(&(2_usize, 0_usize)));
    assert!(edges.contains(&(3_usize, 0_usize)));
}

#[test]
fn test_get_back_edges_acyclic() {
    let mut cfg = TestCfg::new(4);
    cfg.add_edge(0, 1).add_edge(0, 2).add_edge(1, 3).add_edge(2, 3);

    assert!(get_back_edges(&cfg).is_empty());
}
