//! Messaging domain module.
//!
//! Email templates and merge-field rendering. Actual delivery (the email
//! provider HTTP client) is an infra concern.

pub mod template;

pub use template::{EmailTemplate, NewTemplate, RenderedEmail, TemplateId, TemplateUpdate};
