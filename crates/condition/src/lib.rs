//! `recordflow-condition` — boolean condition trees over records.
//!
//! Permission and notification rules carry an optional condition: either a
//! single field comparison or an AND/OR tree of them. Evaluation is a pure
//! function of (condition, record) with no side effects. A malformed rule
//! never raises here: unknown operators evaluate to `false` (fail closed),
//! and an absent condition evaluates to `true` (the rule is unconditional).

pub mod eval;
pub mod tree;

pub use eval::evaluate;
pub use tree::{Comparison, Condition, Logic, Operator};
