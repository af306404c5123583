use analysis::cfg::{CfgNode, ControlFlowGraph};
use analysis::domains::{Flat, JoinSemiLattice, Lattice, Map, MapCtx};
use analysis::solvers::{DataflowResult, Direction, SolveMonotone, TransferFunction};

use crate::cfg::{Cfg, EdgeKind};
use crate::ir::{BinaryOpKind, Condition, Operand, Stmt, UnaryOpKind, Variable};

/// The abstract value of a variable: bottom when no executed path has
/// produced a value yet, top when the value is not a compile-time
/// constant.
pub type Value = Flat<i64>;

pub type ConstEnv = Map<Variable, Value>;
pub type ConstCtx = MapCtx<Variable, Value>;

fn eval_operand(op: Operand, state: &ConstEnv, ctx: &ConstCtx) -> Value {
    match op {
        Operand::Var(var) => state.get_or_bottom(&var, ctx),
        Operand::Literal(literal) => Flat::Element(literal),
    }
}

fn eval_unary(op: UnaryOpKind, operand: Value) -> Value {
    match operand {
        Flat::Element(value) => Flat::Element(match op {
            UnaryOpKind::Neg => value.wrapping_neg(),
            UnaryOpKind::Not => i64::from(value == 0),
        }),
        other => other,
    }
}

fn eval_binary(op: BinaryOpKind, lhs: Value, rhs: Value) -> Value {
    use Flat::{Bottom, Element, Top};
    // Short circuits that stay precise with one unknown operand. Each
    // of them agrees with the fully evaluated result for every concrete
    // value the unknown side could take, so monotonicity holds.
    let nonzero = |v: Value| matches!(v, Element(x) if x != 0);
    match op {
        BinaryOpKind::Mul | BinaryOpKind::And
            if lhs == Element(0) || rhs == Element(0) =>
        {
            return Element(0);
        }
        BinaryOpKind::Or if nonzero(lhs) || nonzero(rhs) => return Element(1),
        // A constant zero divisor means the statement always faults, so
        // no value ever flows out of it.
        BinaryOpKind::Div | BinaryOpKind::Rem if rhs == Element(0) => return Bottom,
        _ => {}
    }
    match (lhs, rhs) {
        (Element(l), Element(r)) => Element(match op {
            BinaryOpKind::Add => l.wrapping_add(r),
            BinaryOpKind::Sub => l.wrapping_sub(r),
            BinaryOpKind::Mul => l.wrapping_mul(r),
            BinaryOpKind::Div => l.wrapping_div(r),
            BinaryOpKind::Rem => l.wrapping_rem(r),
            BinaryOpKind::Eq => i64::from(l == r),
            BinaryOpKind::NotEq => i64::from(l != r),
            BinaryOpKind::LessThan => i64::from(l < r),
            BinaryOpKind::LessThanOrEq => i64::from(l <= r),
            BinaryOpKind::GreaterThan => i64::from(l > r),
            BinaryOpKind::GreaterThanOrEq => i64::from(l >= r),
            BinaryOpKind::And => i64::from(l != 0 && r != 0),
            BinaryOpKind::Or => i64::from(l != 0 || r != 0),
        }),
        (Top, _) | (_, Top) => Top,
        _ => Bottom,
    }
}

/// Evaluate a branch condition in the given abstract state.
pub fn eval_condition(cond: &Condition, state: &ConstEnv, ctx: &ConstCtx) -> Value {
    eval_binary(
        cond.op,
        eval_operand(cond.lhs, state, ctx),
        eval_operand(cond.rhs, state, ctx),
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantPropagation;

impl ConstantPropagation {
    pub fn analyze(cfg: &Cfg, node_limit: usize) -> Option<DataflowResult<ConstEnv>> {
        let ctx = ConstCtx::new(());
        let mut boundary = ConstEnv::bottom(&ctx);
        // Parameter values are unknown at the entry.
        for &formal in cfg.formals() {
            boundary.insert(formal, Value::Top, &ctx);
        }
        let solver = SolveMonotone { node_limit };
        solver.solve(cfg, Direction::Forward, boundary, &ctx, &mut ConstantPropagation)
    }
}

impl TransferFunction<Cfg, ConstEnv> for ConstantPropagation {
    fn node(&mut self, id: usize, cfg: &Cfg, ctx: &ConstCtx, pre_state: &ConstEnv) -> ConstEnv {
        let Some(stmt) = cfg.nodes()[id].stmt() else {
            return pre_state.clone();
        };
        let mut post = pre_state.clone();
        match stmt {
            Stmt::Assign { result, literal } => {
                post.insert(*result, Flat::Element(*literal), ctx);
            }
            Stmt::Copy { result, operand } => {
                let value = pre_state.get_or_bottom(operand, ctx);
                post.insert(*result, value, ctx);
            }
            Stmt::Unary {
                result,
                op,
                operand,
            } => {
                let value = eval_unary(*op, eval_operand(*operand, pre_state, ctx));
                post.insert(*result, value, ctx);
            }
            Stmt::Binary {
                result,
                op,
                lhs,
                rhs,
            } => {
                let value = eval_binary(
                    *op,
                    eval_operand(*lhs, pre_state, ctx),
                    eval_operand(*rhs, pre_state, ctx),
                );
                post.insert(*result, value, ctx);
            }
            // Without interprocedural reasoning a call can return
            // anything.
            Stmt::Call {
                result: Some(result),
                ..
            } => post.insert(*result, Value::Top, ctx),
            Stmt::Call { result: None, .. }
            | Stmt::If { .. }
            | Stmt::Jump { .. }
            | Stmt::Ret { .. }
            | Stmt::Nop => {}
        }
        post
    }

    fn edge(
        &mut self,
        from: usize,
        to: usize,
        cfg: &Cfg,
        ctx: &ConstCtx,
        pre_state: &ConstEnv,
    ) -> Option<ConstEnv> {
        let Some(Stmt::If { cond, .. }) = cfg.nodes()[from].stmt() else {
            return Some(pre_state.clone());
        };
        // An equality the branch establishes lets both sides be
        // narrowed to the meet of their values. Edges with ambiguous
        // kinds are left alone.
        let established = matches!(
            (cfg.edge_kind(from, to), cond.op),
            (Some(EdgeKind::IfTrue), BinaryOpKind::Eq)
                | (Some(EdgeKind::IfFalse), BinaryOpKind::NotEq)
        );
        if !established {
            return Some(pre_state.clone());
        }
        let met = eval_operand(cond.lhs, pre_state, ctx)
            .meet(&eval_operand(cond.rhs, pre_state, ctx), &());
        let mut refined = pre_state.clone();
        if let Operand::Var(var) = cond.lhs {
            refined.insert(var, met, ctx);
        }
        if let Operand::Var(var) = cond.rhs {
            refined.insert(var, met, ctx);
        }
        Some(refined)
    }
}
