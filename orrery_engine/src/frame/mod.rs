/// Frame module - presentation protocol on top of the Swapchain trait

pub mod frame_driver;

pub use frame_driver::*;
