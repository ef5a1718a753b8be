//! # System Unit Tests
//!
//! Main memory, backing stores and the thread registry.



/// Thread → store registry.
pub mod spaces;
