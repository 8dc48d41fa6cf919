//! Error types for Costbook services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CostbookError>;

#[derive(Error, Debug)]
pub enum CostbookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CostbookError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for CostbookError {
    fn from(err: std::io::Error) -> Self {
        CostbookError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CostbookError::Config("port".into()).error_code(), "CONFIG_ERROR");
        assert_eq!(CostbookError::Internal("x".into()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: CostbookError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use").into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("address in use"));
    }
}
