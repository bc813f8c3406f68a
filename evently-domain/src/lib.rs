//! Domain layer for the Evently booking backend: entities, the admission and
//! cancellation rule sequences, capability checks and the repository seams.
//! Everything here is pure; persistence and HTTP live in the sibling crates.

pub mod admission;
pub mod authz;
pub mod booking;
pub mod cancellation;
pub mod error;
pub mod event;
pub mod ids;
pub mod repository;

pub use error::{Error, Result};
