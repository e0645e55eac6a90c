use thiserror::Error;

/// Errors raised while compiling a filter configuration.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
