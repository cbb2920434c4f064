//! Core systems
//!
//! Cross-cutting infrastructure shared by all gateway subsystems.

pub mod logging;
