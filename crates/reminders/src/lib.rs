//! Reminders domain module.
//!
//! The reminder lifecycle (pending → in-flight → sent, with lease-based
//! reclaim) and the pure run-outcome aggregation live here. Dispatch IO and
//! persistence are infra concerns.

pub mod reminder;
pub mod run;

pub use reminder::{NewReminder, Reminder, ReminderId, ReminderStatus};
pub use run::{DispatchOutcome, DispatchResult, RunStatus, RunSummary, summarize};
