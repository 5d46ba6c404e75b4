/*!
# Orrery Engine

Core traits and types for the Orrery renderer's device layer.

This crate is backend-agnostic. It defines what a graphics backend must
provide to bring up a device, present to a window and move asset data into
device memory, plus the pieces that can be written once on top of that:

- **GraphicsDevice**: synchronous staged uploads (buffers, textures with mip chains)
- **Swapchain**: acquire / present / recreate with explicit stale-chain reporting
- **FrameDriver**: the presentation protocol with deferred recreation
- **MeshBuffers**: per-attribute upload of loaded meshes
- **Logging** and the **Error** type shared by every backend

The Vulkan implementation lives in `orrery_engine_renderer_vulkan`.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod frame;
pub mod resource;

// Main orrery namespace module
pub mod orrery {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging front
    pub use crate::engine::Engine;

    // Device trait
    pub use crate::graphics_device::GraphicsDevice;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with all device-facing types
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Frame sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}

// Re-export math library at crate root
pub use glam;
