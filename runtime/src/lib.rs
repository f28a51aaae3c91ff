//! Runtime initialization for a workspace.
//!
//! [`RuntimeInitializer`] polls the Workbench API until the workspace runtime reaches
//! a goal state, nudging it along (create, resume, delete) within fixed budgets.
//! Results are optionally published to a [`RuntimeStore`] so other parts of the
//! application can follow along.

mod backoff;
mod error;
mod initializer;
mod store;

pub use backoff::{BACKOFF_MULTIPLIER, PollingBackoff};
pub use error::{InitializerError, RuntimeAction};
pub use initializer::{InitializerOptions, RuntimeInitializer, initialize};
pub use store::{RuntimeSnapshot, RuntimeStore};
