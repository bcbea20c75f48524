//! Study session driver: runs the core state machine against storage and the
//! AI oracles.

pub mod controller;
pub mod persist;

pub use controller::SessionController;
pub use persist::{persist_review, SavedReview};
