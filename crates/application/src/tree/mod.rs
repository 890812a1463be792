//! The suite/spec test tree
//!
//! Trees are built bottom-up with owned children and never mutated after
//! construction. Inherited context is computed from the chain of enclosing
//! suites at run time rather than through parent pointers.

mod node;
mod source;
mod validate;

pub use node::{Assertion, Spec, Suite, SuiteMode, TestNode};
pub use source::{DependentRef, ValueSource};
pub use validate::validate;
