//! Platform geolocation capability.
//!
//! The resolver only talks to a [`GeolocationProvider`]; hosts plug in
//! whatever the platform offers. [`FixedGeolocation`] serves a known
//! position (command-line coordinates, tests).

use std::future::Future;
use std::time::Duration;

use crate::error::LocationError;

/// Options passed to every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the platform may return.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Error reported by the platform, using the W3C numeric codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPositionError {
    pub code: u16,
    pub message: String,
}

impl PlatformPositionError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<PlatformPositionError> for LocationError {
    fn from(err: PlatformPositionError) -> Self {
        match err.code {
            PlatformPositionError::PERMISSION_DENIED => LocationError::PermissionDenied,
            PlatformPositionError::POSITION_UNAVAILABLE => LocationError::PositionUnavailable,
            PlatformPositionError::TIMEOUT => LocationError::Timeout,
            _ => LocationError::NetworkError,
        }
    }
}

pub trait GeolocationProvider: Send + Sync {
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<Position, PlatformPositionError>> + Send;
}

/// Stands in for a platform without any geolocation capability.
#[derive(Debug, Clone, Copy)]
pub enum NoGeolocation {}

impl GeolocationProvider for NoGeolocation {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Position, PlatformPositionError> {
        match *self {}
    }
}

/// Always answers with the same outcome.
#[derive(Debug, Clone)]
pub struct FixedGeolocation {
    outcome: Result<Position, PlatformPositionError>,
}

impl FixedGeolocation {
    #[must_use]
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            outcome: Ok(Position {
                latitude,
                longitude,
            }),
        }
    }

    #[must_use]
    pub fn failing(error: PlatformPositionError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

impl GeolocationProvider for FixedGeolocation {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Position, PlatformPositionError> {
        self.outcome.clone()
    }
}
