//! `recordflow-core` — shared foundation for the rule engine.
//!
//! This crate contains **pure domain** primitives (no storage, no HTTP):
//! strongly-typed identifiers, the engine error taxonomy, and the opaque
//! record representation every other crate evaluates rules against.

pub mod error;
pub mod id;
pub mod record;

pub use error::{EngineError, EngineResult};
pub use id::{
    ActionId, AppId, DefinitionId, OrgId, RecordId, RoleId, RuleId, StatusId, TenantId, UserId,
};
pub use record::Record;
