use crate::ir::{Function, Operand, Program, Stmt, Variable};

pub(crate) fn var(index: usize) -> Operand {
    Operand::Var(Variable(index))
}

pub(crate) fn lit(value: i64) -> Operand {
    Operand::Literal(value)
}

/// A function whose variables are named `v0`, `v1`, ... with the first
/// `formal_count` of them being the parameters.
pub(crate) fn func(
    name: &str,
    formal_count: usize,
    var_count: usize,
    stmts: Vec<Stmt>,
) -> Function {
    let formals = (0..formal_count).map(Variable).collect();
    let var_names = (0..var_count).map(|i| format!("v{i}")).collect();
    Function::new(name.to_owned(), formals, var_names, stmts)
}

pub(crate) fn program(functions: Vec<Function>) -> Program {
    Program::new(functions)
}
