use analysis::domains::BitSetDomain;
use analysis::solvers::{DataflowResult, SolveMonotone};

use crate::analysis::liveness::LiveVariables;
use crate::cfg::Cfg;
use crate::ir::{BinaryOpKind, Condition, Function, Stmt, Variable};
use crate::test_utils::{func, lit, var};

fn run(function: &Function, strong: bool) -> DataflowResult<BitSetDomain> {
    let cfg = Cfg::new(function);
    LiveVariables { strong }
        .analyze(&cfg, SolveMonotone::default().node_limit)
        .expect("finite powersets converge")
}

fn live_before(result: &DataflowResult<BitSetDomain>, node: usize) -> Vec<usize> {
    result.post_state(node).ones().collect()
}

fn copy_chain() -> Function {
    // 0: v0 = 1;  1: v1 = v0;  2: ret;
    func(
        "chain",
        0,
        2,
        vec![
            Stmt::Assign {
                result: Variable(0),
                literal: 1,
            },
            Stmt::Copy {
                result: Variable(1),
                operand: Variable(0),
            },
            Stmt::Ret { operand: None },
        ],
    )
}

#[test]
fn plain_liveness_counts_every_copy_source() {
    let result = run(&copy_chain(), false);

    // The copy keeps its source alive even though the target is dead.
    assert_eq!(live_before(&result, 2), vec![0]);
    assert_eq!(live_before(&result, 3), Vec::<usize>::new());
}

#[test]
fn strong_liveness_ignores_dead_copy_targets() {
    let result = run(&copy_chain(), true);

    assert_eq!(live_before(&result, 2), Vec::<usize>::new());
    // With the copy discounted, the initial assignment is dead too.
    assert_eq!(live_before(&result, 1), Vec::<usize>::new());
}

#[test]
fn used_value_is_live_up_to_its_definition() {
    // 0: v0 = 1;  1: v1 = v0 + 2;  2: ret v1;
    let function = func(
        "useful",
        0,
        2,
        vec![
            Stmt::Assign {
                result: Variable(0),
                literal: 1,
            },
            Stmt::Binary {
                result: Variable(1),
                op: BinaryOpKind::Add,
                lhs: var(0),
                rhs: lit(2),
            },
            Stmt::Ret {
                operand: Some(var(1)),
            },
        ],
    );
    let result = run(&function, true);

    assert_eq!(live_before(&result, 2), vec![0]);
    assert_eq!(live_before(&result, 3), vec![1]);
    // Nothing is live before the first definition.
    assert_eq!(live_before(&result, 1), Vec::<usize>::new());
}

#[test]
fn self_referencing_statement_keeps_its_variable_live() {
    // 0: v0 = v0 + 1;  1: ret v0;
    let function = func(
        "increment",
        1,
        1,
        vec![
            Stmt::Binary {
                result: Variable(0),
                op: BinaryOpKind::Add,
                lhs: var(0),
                rhs: lit(1),
            },
            Stmt::Ret {
                operand: Some(var(0)),
            },
        ],
    );
    let result = run(&function, true);

    assert_eq!(live_before(&result, 1), vec![0]);
}

#[test]
fn loop_keeps_the_counter_live() {
    // 0: v0 = 0;  1: v0 = v0 + 1;  2: if v0 < 10 goto 1;  3: ret;
    let function = func(
        "loopy",
        0,
        1,
        vec![
            Stmt::Assign {
                result: Variable(0),
                literal: 0,
            },
            Stmt::Binary {
                result: Variable(0),
                op: BinaryOpKind::Add,
                lhs: var(0),
                rhs: lit(1),
            },
            Stmt::If {
                cond: Condition {
                    op: BinaryOpKind::LessThan,
                    lhs: var(0),
                    rhs: lit(10),
                },
                target: 1,
            },
            Stmt::Ret { operand: None },
        ],
    );
    let result = run(&function, true);

    // The counter flows around the back edge into its own increment.
    assert_eq!(live_before(&result, 2), vec![0]);
    assert_eq!(live_before(&result, 3), vec![0]);
}
