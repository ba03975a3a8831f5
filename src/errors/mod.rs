//! Error types reported by bound streams and by resolvers.
mod lifecycle_errors;

pub use lifecycle_errors::*;
