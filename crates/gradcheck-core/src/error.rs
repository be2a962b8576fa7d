use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Data model errors
    #[error("Invalid station: {code} (expected 1-3)")]
    InvalidStation { code: u8 },

    #[error("Invalid capture mode: {0}")]
    InvalidMode(String),

    #[error("Invalid queue flag: {0} (expected Y or N)")]
    InvalidQueueFlag(String),

    #[error("Invalid model selector: {0}")]
    InvalidModel(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
