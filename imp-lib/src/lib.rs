//! A small imperative intermediate language and a collection of
//! dataflow analyses over it. Functions are flat lists of statements
//! with explicit jump targets; the [`cfg`] module exposes them as
//! statement-level graphs the solvers from the `analysis` crate run
//! on, and [`context`] ties the program, the graphs and the computed
//! results together.

/// The concrete analyses and their result types.
pub mod analysis;
/// Statement-level control flow graphs.
pub mod cfg;
/// The analysis driver and result store.
pub mod context;
/// The interprocedural control flow graph.
pub mod icfg;
/// The intermediate representation of programs.
pub mod ir;

#[cfg(test)]
mod icfg_tests;
#[cfg(test)]
pub(crate) mod test_utils;
