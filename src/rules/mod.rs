//! Pure decisions over issues.
//!
//! Rules never perform I/O. They take the facts a plugin fetched and return
//! data describing what to do, which the [`crate::actuator`] executes.

pub mod auto_close;
pub mod release;

pub use auto_close::{AutoCloseSettings, ScanPlan, StaleQuery};
pub use release::{FollowUpAction, ReleaseRule};
