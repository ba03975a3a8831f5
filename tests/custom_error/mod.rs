use std::error::Error;

/// Failure of the bound operation itself, as opposed to a lifecycle error.
#[derive(Debug)]
pub struct CustomError;

impl std::fmt::Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream operation failed")
    }
}

impl Error for CustomError {}
