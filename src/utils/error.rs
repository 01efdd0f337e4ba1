use thiserror::Error;

use crate::models::filter::FilterError;

/// Capture device failures; all of them end the session
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The requested interface is not among the capture devices
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Device enumeration failed
    #[error("Failed to list capture devices: {0}")]
    List(#[source] pcap::Error),

    /// Opening or activating the capture failed
    #[error("Failed to open capture on '{interface}': {source}")]
    Open {
        interface: String,
        #[source]
        source: pcap::Error,
    },

    /// Reading a frame failed
    #[error("Error capturing packet: {0}")]
    Read(#[source] pcap::Error),

    /// The device was used outside its lifecycle
    #[error("Capture device is not started")]
    NotStarted,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid filter flags
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Error from the capture device
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Error from I/O operations, e.g. writing a report
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from capture operations
    #[error("Capture error: {0}")]
    Capture(String),
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
