//! This crate contains a set of helpers to build data-flow based static
//! analysis tools. The building blocks include traits for
//! [control flow graphs](https://en.wikipedia.org/wiki/Control-flow_graph),
//! a curated collection of [lattice](https://en.wikipedia.org/wiki/Lattice_(order))
//! domains, a generic fixed-point solver, and common analyses like
//! calculating the [dominator sets](https://en.wikipedia.org/wiki/Dominator_(graph_theory)).
//!
//! Look at the imp-lib crate for an example how to define analyses using
//! the helpers in this crate.
//!
//! Some resources to learn more about data-flow analysis:
//! * [Static Program Analysis, Anders Møller and Michael I. Schwartzbach](https://cs.au.dk/~amoeller/spa/)
//! * [Data Flow Analysis: Theory and Practice](https://www.amazon.com/Data-Flow-Analysis-Theory-Practice/dp/0849328802)
//! * [Data flow analysis: an informal introduction](https://clang.llvm.org/docs/DataFlowAnalysisIntro.html)

/// Collection of commonly used analyses like dominator sets. Most of these
/// are independent of the actual statements, only based on the shape of
/// the control flow graph.
pub mod analyses;

/// Traits for defining a control flow graph, and some algorithms and data
/// structures to make it easier to work with them.
pub mod cfg;

/// A curated collection of semi-lattices and lattices, including some
/// transformers to help building larger lattices from smaller ones.
pub mod domains;

/// Implementations of fixed-point iteration algorithms using worklists.
pub mod solvers;

#[cfg(test)]
mod cfg_tests;

#[cfg(test)]
mod domains_tests;
