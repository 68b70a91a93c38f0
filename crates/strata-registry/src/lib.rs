//! Dispatch and dependency structures shared by the interpreter and the scheduler.
//!
//! - [`build_decision_tree`] / [`DecisionTree`]: greedy information-gain
//!   classification trees
//! - [`OverloadRegistry`]: overloaded operations dispatched through those trees
//! - [`ModuleGraph`]: the module dependency graph

pub mod decision_tree;
pub mod module_graph;
pub mod overloads;

pub use decision_tree::{DecisionTree, build_decision_tree};
pub use module_graph::ModuleGraph;
pub use overloads::{
    Discriminant, DispatchError, DispatchKey, Overload, OverloadRegistry, ShapeClass, Signature,
};
