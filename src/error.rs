#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Envelope is missing `Head`, `Head.Timestamp` or `Body.Data`.
    #[error("response structure is not healthy: {0}")]
    StructuralData(String),
    /// Body could not be read or decoded as JSON. Holds the body and the parser message.
    #[error("invalid response ({1}): {0}")]
    InvalidResponse(String, String),
    #[error("connection error: {0}")]
    Connection(String),
    /// Non-2xx HTTP status from the inverter.
    #[error("API error: {0}")]
    ApiError(String),
    #[error("sun is down")]
    SunIsDown,
    #[error("sink error: {0}")]
    Sink(String),
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Configuration(e.to_string())
    }
}
