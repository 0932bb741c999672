mod action;
mod budget;
mod controller;
mod outcome;

pub use action::{RecoveryAction, RecoveryStep};
pub use budget::RecoveryLimits;
pub use controller::{RecoveryController, RecoveryHandler};
pub use outcome::RecoveryOutcome;
