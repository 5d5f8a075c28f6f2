//! Domain models for the chore bot.
//!
//! # Core Concepts
//!
//! ## Permanent Entities
//!
//! - [`Household`]: The two people sharing chores and the rotation cursor (singleton).
//! - [`Chore`]: A recurring task with an assignee, a rolling interval and a reminder time.
//! - [`Completion`]: Append-only log of who did which chore and when.
//!
//! ## Ephemeral Entities
//!
//! - [`Session`]: Add-chore wizard state for one user in one chat, deleted when
//!   the wizard finishes or is cancelled.

mod chore;
mod completion;
mod household;
mod session;

pub use chore::*;
pub use completion::*;
pub use household::*;
pub use session::*;
