//! Manager scenarios
//!
//! Each module exercises one area against a shared workspace fixture.

pub mod concurrency;
pub mod container_lifecycle;
pub mod moves;
pub mod registry;
