use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    /// The signing primitive could not produce or encode a keypair.
    #[error("Failed to generate keypair: {0}")]
    KeyGeneration(String),
}

/// Reasons the location collaborator can fail to produce a position.
/// All of these are fatal to starting a session; retry is caller policy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a position fix")]
    Timeout,

    #[error("Geolocation is not supported on this device")]
    NotSupported,
}
