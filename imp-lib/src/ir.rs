use core::fmt::{self, Display, Formatter};

use itertools::Itertools;

/// Index of a variable in the enclosing function. The front end assigns
/// dense, zero-based indices; the formal parameters come first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub usize);

/// Index of a function in the enclosing [`Program`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub usize);

/// Position of a statement in its function body. Statement indices are
/// the identities all analysis results are expressed in.
pub type StmtIdx = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    Var(Variable),
    Literal(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOpKind {
    Neg,
    Not,
}

impl Display for UnaryOpKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOpKind::Neg => write!(f, "-"),
            UnaryOpKind::Not => write!(f, "!"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    And,
    Or,
}

impl Display for BinaryOpKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOpKind::Add => "+",
            BinaryOpKind::Sub => "-",
            BinaryOpKind::Mul => "*",
            BinaryOpKind::Div => "/",
            BinaryOpKind::Rem => "%",
            BinaryOpKind::Eq => "==",
            BinaryOpKind::NotEq => "!=",
            BinaryOpKind::LessThan => "<",
            BinaryOpKind::LessThanOrEq => "<=",
            BinaryOpKind::GreaterThan => ">",
            BinaryOpKind::GreaterThanOrEq => ">=",
            BinaryOpKind::And => "&&",
            BinaryOpKind::Or => "||",
        };
        write!(f, "{text}")
    }
}

/// A branch condition. Conditions are not materialized into variables,
/// the comparison is part of the [`Stmt::If`] that consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Condition {
    pub op: BinaryOpKind,
    pub lhs: Operand,
    pub rhs: Operand,
}

/// Statements of the language. Every statement reads at most a couple of
/// operands and defines at most one variable, so the analyses never have
/// to recurse into expression trees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stmt {
    /// `x = 5;`
    Assign { result: Variable, literal: i64 },
    /// `x = y;`
    Copy { result: Variable, operand: Variable },
    /// `x = -y;`
    Unary {
        result: Variable,
        op: UnaryOpKind,
        operand: Operand,
    },
    /// `x = y + z;`
    Binary {
        result: Variable,
        op: BinaryOpKind,
        lhs: Operand,
        rhs: Operand,
    },
    /// `x = call f(y, z);` where the result is optional.
    Call {
        result: Option<Variable>,
        callee: FuncId,
        args: Vec<Operand>,
    },
    /// `if x < y goto 7;` falls through when the condition is false.
    If { cond: Condition, target: StmtIdx },
    /// `goto 3;`
    Jump { target: StmtIdx },
    /// `ret x;` or `ret;`
    Ret { operand: Option<Operand> },
    /// `nop;`
    Nop,
}

impl Stmt {
    /// The variable this statement defines, if any.
    pub fn def(&self) -> Option<Variable> {
        match self {
            Stmt::Assign { result, .. }
            | Stmt::Copy { result, .. }
            | Stmt::Unary { result, .. }
            | Stmt::Binary { result, .. } => Some(*result),
            Stmt::Call { result, .. } => *result,
            Stmt::If { .. } | Stmt::Jump { .. } | Stmt::Ret { .. } | Stmt::Nop => None,
        }
    }

    /// The operands this statement reads, in syntactic order.
    pub fn uses(&self) -> Vec<Operand> {
        match self {
            Stmt::Copy { operand, .. } => vec![Operand::Var(*operand)],
            Stmt::Unary { operand, .. } => vec![*operand],
            Stmt::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Stmt::Call { args, .. } => args.clone(),
            Stmt::If { cond, .. } => vec![cond.lhs, cond.rhs],
            Stmt::Ret {
                operand: Some(operand),
            } => vec![*operand],
            Stmt::Assign { .. } | Stmt::Jump { .. } | Stmt::Ret { operand: None } | Stmt::Nop => {
                Vec::new()
            }
        }
    }

    /// The variables this statement reads. May repeat a variable that
    /// appears in multiple operand positions.
    pub fn used_vars(&self) -> impl Iterator<Item = Variable> {
        self.uses().into_iter().filter_map(|op| match op {
            Operand::Var(var) => Some(var),
            Operand::Literal(_) => None,
        })
    }

    /// Whether execution can continue with the next statement in
    /// program order.
    pub fn can_fall_through(&self) -> bool {
        !matches!(self, Stmt::Jump { .. } | Stmt::Ret { .. })
    }

    /// The value this statement computes, in a form suitable for
    /// availability tracking. Branch conditions count, result-less
    /// calls do not.
    pub fn expression(&self) -> Option<Expr> {
        match self {
            Stmt::Unary { op, operand, .. } => Some(Expr::Unary {
                op: *op,
                operand: *operand,
            }),
            Stmt::Binary { op, lhs, rhs, .. } => Some(Expr::Binary {
                op: *op,
                lhs: *lhs,
                rhs: *rhs,
            }),
            Stmt::Call {
                result: Some(_),
                callee,
                args,
            } => Some(Expr::Call {
                callee: *callee,
                args: args.clone(),
            }),
            Stmt::If { cond, .. } => Some(Expr::Binary {
                op: cond.op,
                lhs: cond.lhs,
                rhs: cond.rhs,
            }),
            _ => None,
        }
    }

    /// Whether removing this statement could change observable behavior
    /// beyond the defined variable. Division and remainder can fault at
    /// run time and a callee can do anything.
    pub fn has_side_effect(&self) -> bool {
        matches!(
            self,
            Stmt::Binary {
                op: BinaryOpKind::Div | BinaryOpKind::Rem,
                ..
            } | Stmt::Call { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    Unary {
        op: UnaryOpKind,
        operand: Operand,
    },
    Binary {
        op: BinaryOpKind,
        lhs: Operand,
        rhs: Operand,
    },
    Call {
        callee: FuncId,
        args: Vec<Operand>,
    },
}

impl Expr {
    /// Whether the expression reads the given variable.
    pub fn references(&self, var: Variable) -> bool {
        let reads = |op: &Operand| *op == Operand::Var(var);
        match self {
            Expr::Unary { operand, .. } => reads(operand),
            Expr::Binary { lhs, rhs, .. } => reads(lhs) || reads(rhs),
            Expr::Call { args, .. } => args.iter().any(reads),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Function {
    name: String,
    formals: Vec<Variable>,
    var_names: Vec<String>,
    stmts: Vec<Stmt>,
}

impl Function {
    pub fn new(
        name: String,
        formals: Vec<Variable>,
        var_names: Vec<String>,
        stmts: Vec<Stmt>,
    ) -> Self {
        debug_assert!(formals.iter().all(|v| v.0 < var_names.len()));
        Self {
            name,
            formals,
            var_names,
            stmts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formals(&self) -> &[Variable] {
        &self.formals
    }

    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    pub fn var_name(&self, var: Variable) -> &str {
        &self.var_names[var.0]
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }
}

#[derive(Clone, Debug, Default)]
pub struct Program {
    functions: Vec<Function>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        Self { functions }
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0]
    }

    pub fn function_id(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name() == name)
            .map(FuncId)
    }
}

/// Render a statement the way the parser would accept it back.
pub fn print_stmt(stmt: &Stmt, func: &Function, program: &Program) -> String {
    let opnd = |op: &Operand| match op {
        Operand::Var(var) => func.var_name(*var).to_owned(),
        Operand::Literal(literal) => literal.to_string(),
    };
    match stmt {
        Stmt::Assign { result, literal } => {
            format!("{} = {literal};", func.var_name(*result))
        }
        Stmt::Copy { result, operand } => {
            format!("{} = {};", func.var_name(*result), func.var_name(*operand))
        }
        Stmt::Unary {
            result,
            op,
            operand,
        } => format!("{} = {op}{};", func.var_name(*result), opnd(operand)),
        Stmt::Binary {
            result,
            op,
            lhs,
            rhs,
        } => format!(
            "{} = {} {op} {};",
            func.var_name(*result),
            opnd(lhs),
            opnd(rhs)
        ),
        Stmt::Call {
            result,
            callee,
            args,
        } => {
            let args = args.iter().map(opnd).join(", ");
            let call = format!("call {}({args});", program.function(*callee).name());
            match result {
                Some(result) => format!("{} = {call}", func.var_name(*result)),
                None => call,
            }
        }
        Stmt::If { cond, target } => format!(
            "if {} {} {} goto {target};",
            opnd(&cond.lhs),
            cond.op,
            opnd(&cond.rhs)
        ),
        Stmt::Jump { target } => format!("goto {target};"),
        Stmt::Ret {
            operand: Some(operand),
        } => format!("ret {};", opnd(operand)),
        Stmt::Ret { operand: None } => "ret;".to_owned(),
        Stmt::Nop => "nop;".to_owned(),
    }
}
