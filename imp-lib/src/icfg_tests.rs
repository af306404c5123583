use analysis::cfg::{CfgNode, ControlFlowGraph};

use crate::cfg::{Cfg, EdgeKind};
use crate::icfg::{CallGraph, CallSite, Icfg, IcfgEdgeKind, print};
use crate::ir::{FuncId, Program, Stmt, Variable};
use crate::test_utils::{func, lit, program, var};

fn caller_and_callee() -> Program {
    program(vec![
        // main:    0: v0 = call callee(1);  1: ret v0;
        func(
            "main",
            0,
            1,
            vec![
                Stmt::Call {
                    result: Some(Variable(0)),
                    callee: FuncId(1),
                    args: vec![lit(1)],
                },
                Stmt::Ret {
                    operand: Some(var(0)),
                },
            ],
        ),
        // callee:  0: ret v0;
        func(
            "callee",
            1,
            1,
            vec![Stmt::Ret {
                operand: Some(var(0)),
            }],
        ),
    ])
}

fn build(prog: &Program, call_graph: &CallGraph) -> Icfg {
    let cfgs: Vec<_> = prog.functions().iter().map(Cfg::new).collect();
    Icfg::new(&cfgs, call_graph)
}

fn resolved_call_graph() -> CallGraph {
    let mut call_graph = CallGraph::new();
    call_graph.add_call(
        CallSite {
            func: FuncId(0),
            stmt: 0,
        },
        FuncId(1),
    );
    call_graph
}

#[test]
fn resolved_call_gets_interprocedural_edges() {
    let prog = caller_and_callee();
    let icfg = build(&prog, &resolved_call_graph());

    assert_eq!(icfg.nodes().len(), 7);
    assert_eq!(icfg.entry_of(FuncId(1)), 4);
    assert_eq!(icfg.exit_of(FuncId(0)), 3);
    assert_eq!(icfg.exit_of(FuncId(1)), 6);

    // The call site keeps a skip-over path and gains a call edge.
    assert_eq!(icfg.edge_kind(1, 2), Some(IcfgEdgeKind::CallToReturn));
    assert_eq!(icfg.edge_kind(1, 4), Some(IcfgEdgeKind::Call));
    assert_eq!(icfg.edge_kind(6, 2), Some(IcfgEdgeKind::Return));
    assert_eq!(
        icfg.edge_kind(0, 1),
        Some(IcfgEdgeKind::Intra(EdgeKind::Entry))
    );

    assert_eq!(icfg.nodes()[1].successors(), &[2, 4]);
    assert_eq!(icfg.nodes()[2].predecessors(), &[1, 6]);

    assert!(icfg.is_call_site(1));
    assert!(!icfg.is_call_site(2));
    assert_eq!(icfg.containing_function(2), FuncId(0));
    assert_eq!(icfg.containing_function(5), FuncId(1));
}

#[test]
fn unresolved_call_keeps_only_local_edges() {
    let prog = caller_and_callee();
    let icfg = build(&prog, &CallGraph::new());

    assert_eq!(
        icfg.edge_kind(1, 2),
        Some(IcfgEdgeKind::Intra(EdgeKind::FallThrough))
    );
    assert_eq!(icfg.edge_kind(1, 4), None);
    assert!(!icfg.is_call_site(1));
}

#[test]
fn call_graph_tracks_callers() {
    let call_graph = resolved_call_graph();

    let site = CallSite {
        func: FuncId(0),
        stmt: 0,
    };
    assert_eq!(call_graph.callee_of(site), Some(FuncId(1)));
    assert_eq!(call_graph.callers_of(FuncId(1)), vec![site]);
    assert!(call_graph.callers_of(FuncId(0)).is_empty());
}

#[test]
fn print_icfg() {
    let prog = caller_and_callee();
    let icfg = build(&prog, &resolved_call_graph());

    let printed = print(&icfg, &prog);
    let expected = r#"digraph ICFG {
  Node_0[label="Entry(main)"]
  Node_1[label="v0 = call callee(1);"]
  Node_2[label="ret v0;"]
  Node_3[label="Exit(main)"]
  Node_4[label="Entry(callee)"]
  Node_5[label="ret v0;"]
  Node_6[label="Exit(callee)"]

  Node_0 -> Node_1 [label="entry"]
  Node_1 -> Node_2 [label="call-to-return"]
  Node_1 -> Node_4 [label="call"]
  Node_2 -> Node_3 [label="return"]
  Node_4 -> Node_5 [label="entry"]
  Node_5 -> Node_6 [label="return"]
  Node_6 -> Node_2 [label="return"]
}
"#;
    assert_eq!(printed, expected);
}
