//! Helpers shared by the exclusion strategies.

pub mod fs;
