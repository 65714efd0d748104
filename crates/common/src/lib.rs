//! Shared building blocks for the document cache workspace:
//! response types and logging initialisation.

pub mod types;
pub mod utils;
