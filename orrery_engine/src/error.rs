//! Error types for the Orrery engine
//!
//! Device setup, swapchain management and staged uploads all report failures
//! through the single [`Error`] enum. Driver failures keep the name of the
//! operation that failed next to the driver status so that the session
//! boundary can log something actionable before terminating.

use std::fmt;

/// Result type for Orrery engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Orrery engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Every enumerated adapter was rejected during device selection
    NoSuitableDevice,

    /// Instance, debug messenger or surface creation failed in the driver
    InstanceCreationFailed { operation: String, status: String },

    /// Adapter enumeration, logical device, queue or allocator creation failed
    DeviceCreationFailed { operation: String, status: String },

    /// Swapchain (or one of its per-image views) could not be created
    SwapchainCreationFailed { operation: String, status: String },

    /// A buffer, image or device memory allocation failed
    ResourceAllocationFailed { operation: String, status: String },

    /// Host-visible staging memory could not be mapped
    MapFailed { operation: String, status: String },

    /// Command buffer recording or queue submission failed
    SubmitFailed { operation: String, status: String },

    /// Waiting on (or resetting) a fence failed
    FenceWaitFailed { operation: String, status: String },

    /// Acquire or present returned a hard driver error
    PresentationFailed { operation: String, status: String },

    /// The surface currently has a zero extent (minimized window).
    /// Not fatal: the chain cannot be rebuilt until the window is restored.
    SurfaceMinimized,

    /// Invalid resource description (bad dimensions, payload size, etc.)
    InvalidResource(String),

    /// Instance, surface or window setup failed
    InitializationFailed(String),

    /// Backend-specific error without a dedicated variant
    BackendError(String),
}

impl Error {
    /// Name of the driver operation that failed, when the error carries one
    pub fn operation(&self) -> Option<&str> {
        match self {
            Error::InstanceCreationFailed { operation, .. }
            | Error::DeviceCreationFailed { operation, .. }
            | Error::SwapchainCreationFailed { operation, .. }
            | Error::ResourceAllocationFailed { operation, .. }
            | Error::MapFailed { operation, .. }
            | Error::SubmitFailed { operation, .. }
            | Error::FenceWaitFailed { operation, .. }
            | Error::PresentationFailed { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Driver status text, when the error carries one
    pub fn status(&self) -> Option<&str> {
        match self {
            Error::InstanceCreationFailed { status, .. }
            | Error::DeviceCreationFailed { status, .. }
            | Error::SwapchainCreationFailed { status, .. }
            | Error::ResourceAllocationFailed { status, .. }
            | Error::MapFailed { status, .. }
            | Error::SubmitFailed { status, .. }
            | Error::FenceWaitFailed { status, .. }
            | Error::PresentationFailed { status, .. } => Some(status),
            _ => None,
        }
    }

    /// True for conditions that clear up on their own and only postpone work
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::SurfaceMinimized)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoSuitableDevice => write!(f, "No suitable graphics device found"),
            Error::InstanceCreationFailed { operation, status } => {
                write!(f, "Instance creation failed: {} ({})", operation, status)
            }
            Error::DeviceCreationFailed { operation, status } => {
                write!(f, "Device creation failed: {} ({})", operation, status)
            }
            Error::SwapchainCreationFailed { operation, status } => {
                write!(f, "Swapchain creation failed: {} ({})", operation, status)
            }
            Error::ResourceAllocationFailed { operation, status } => {
                write!(f, "Resource allocation failed: {} ({})", operation, status)
            }
            Error::MapFailed { operation, status } => {
                write!(f, "Memory map failed: {} ({})", operation, status)
            }
            Error::SubmitFailed { operation, status } => {
                write!(f, "Submit failed: {} ({})", operation, status)
            }
            Error::FenceWaitFailed { operation, status } => {
                write!(f, "Fence wait failed: {} ({})", operation, status)
            }
            Error::PresentationFailed { operation, status } => {
                write!(f, "Presentation failed: {} ({})", operation, status)
            }
            Error::SurfaceMinimized => write!(f, "Surface has a zero extent (window minimized)"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
