//! Result tree of spec outcomes and its textual report.

mod outcome;
mod tree;

pub use outcome::{Failure, Outcome, SpecError};
pub use tree::{
    ALL_PASSED, BANNER, FAILURE_TERMINATOR, REQUEST_SEPARATOR, RESPONSE_SEPARATOR, ResultNode,
    ResultTree,
};
