/// GraphicsDevice trait - staged upload entry point and device configuration

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{Buffer, BufferUsage, Texture, TextureDesc};

// ============================================================================
// Configuration
// ============================================================================

/// Which validation messages are forwarded to the engine logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything including info and verbose messages
    All,
}

/// Graphics device configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable validation layers and the debug messenger
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Minimum API version (major, minor) an adapter must report
    pub min_api_version: (u32, u32),
    /// Validation message filter
    pub debug_severity: DebugSeverity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Orrery Application".to_string(),
            app_version: (1, 0, 0),
            min_api_version: (1, 2),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
        }
    }
}

/// Counters of validation messages received since device creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    /// Total number of messages
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Device-side upload interface
///
/// Every upload is synchronous: when the call returns, the data is resident
/// in device-local memory, the transfer has been observed complete, and all
/// staging resources have been released.
pub trait GraphicsDevice: Send + Sync {
    /// Upload `data` into a new device-local buffer
    ///
    /// # Arguments
    ///
    /// * `usage` - Final usage of the buffer (selects the consumer barrier)
    /// * `data` - Payload, must not be empty
    fn upload_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn Buffer>>;

    /// Upload an RGBA8 image and build its mip chain
    ///
    /// All mip levels are left ready for shader sampling.
    fn upload_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;
}
