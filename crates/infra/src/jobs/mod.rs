//! Batch jobs triggered by an external scheduler.

pub mod process_reminders;

pub use process_reminders::{REMINDER_JOB_NAME, ReminderRun, RunError, RunReport};
