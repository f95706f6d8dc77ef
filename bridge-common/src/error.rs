//! Common error types for the bridge health services

use thiserror::Error;

/// Common result type for bridge health operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the bridge health crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML configuration file could not be parsed
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Resampling frequency string did not parse
    #[error("Invalid frequency '{0}'. Use a fixed duration such as '15min', '30s', '1h', '1h30min' or '1d'")]
    InvalidFrequency(String),

    /// Unknown smoothing method
    #[error("Invalid smooth_method '{0}'. Expected one of: ema, rolling")]
    InvalidSmoothMethod(String),

    /// Smoothing span outside the accepted range
    #[error("Invalid span {value}: must be between 1 and {max}")]
    InvalidSpan { value: i64, max: u32 },

    /// Outlier filter window parameters are unusable
    #[error("Invalid outlier window: {0}")]
    InvalidWindow(String),
}

impl Error {
    /// True for errors caused by caller-supplied query parameters
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidFrequency(_)
                | Error::InvalidSmoothMethod(_)
                | Error::InvalidSpan { .. }
                | Error::InvalidWindow(_)
        )
    }
}
