//! Service bus errors

/// Errors from bus setup and message handling
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("bus connection failed: {0}")]
    Connection(#[from] zbus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("name {0} is already owned on the bus")]
    NameTaken(String),

    #[error("method table is sealed; register methods before processing")]
    Sealed,

    #[error("argument {index}: expected {expected}")]
    BadArgument { index: usize, expected: &'static str },

    #[error("transport closed")]
    Closed,

    #[error("no pending call with token {0}")]
    UnknownCall(u64),
}
