use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Trace decode error at byte {offset}: {message}")]
    DecodeError { offset: usize, message: String },

    #[error("Static region {0:#018x} not found in catalog")]
    UnresolvedStaticRegion(u64),

    #[error("Call site {0:#018x} not found in catalog")]
    UnresolvedCallSite(u64),

    #[error("Recursion sink {sink} has unresolved recursion target {target}")]
    UnresolvedRecursionTarget { sink: u64, target: u64 },

    #[error("Malformed region graph: {0}")]
    MalformedGraph(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Catalog error on line {line}: {message}")]
    CatalogError { line: usize, message: String },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl Error {
    pub(crate) fn decode(offset: usize, message: impl Into<String>) -> Self {
        Error::DecodeError {
            offset,
            message: message.into(),
        }
    }
}
