//! Cross-cutting support: error types and shutdown coordination

pub mod errors;
pub mod shutdown;
