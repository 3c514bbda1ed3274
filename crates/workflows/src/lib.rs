//! Workflows domain module.
//!
//! Workflow *definitions* only: trigger kind plus an opaque JSON step list,
//! stored verbatim. Nothing in this service executes them.

pub mod workflow;

pub use workflow::{NewWorkflow, TriggerKind, Workflow, WorkflowId, WorkflowUpdate};
