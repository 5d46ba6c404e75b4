/// InstanceContext - Vulkan entry, instance, debug messenger and window surface
///
/// Owns everything that lives at instance level. The window is held until the
/// very end so the surface never outlives it.

use orrery_engine::orrery::{Error, Result};
use orrery_engine::orrery::render::{Config, FramebufferSource};
use orrery_engine::{engine_error, engine_fail, engine_info, engine_warn};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

/// Name of the Khronos validation layer
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Which validation pieces can actually be enabled on this system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationSetup {
    /// Enable VK_LAYER_KHRONOS_validation
    pub layer: bool,
    /// Enable VK_EXT_debug_utils and install the messenger
    pub debug_utils: bool,
}

/// Decide which validation pieces to enable
///
/// Each piece is enabled only if requested and installed; a requested but
/// missing piece is skipped rather than failing instance creation.
pub fn plan_validation(requested: bool, layers: &[&CStr], extensions: &[&CStr]) -> ValidationSetup {
    if !requested {
        return ValidationSetup::default();
    }
    ValidationSetup {
        layer: layers.contains(&VALIDATION_LAYER),
        debug_utils: extensions.contains(&ash::ext::debug_utils::NAME),
    }
}

/// Instance-level Vulkan state
pub struct InstanceContext {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    /// Declared last: released after the surface is destroyed
    window: Arc<dyn FramebufferSource>,
}

impl InstanceContext {
    /// Create the instance, the optional debug messenger and the window surface
    ///
    /// # Arguments
    ///
    /// * `window` - Window to present to (kept alive by the context)
    /// * `config` - Device configuration
    pub fn new<W>(window: Arc<W>, config: &Config) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle + FramebufferSource + 'static,
    {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("orrery::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let display_handle = window.display_handle().map_err(|e| {
                engine_error!("orrery::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;

            // Supported layers and extensions
            let layer_properties = entry.enumerate_instance_layer_properties().map_err(|e| {
                engine_fail!("orrery::vulkan", InstanceCreationFailed, "vkEnumerateInstanceLayerProperties", e)
            })?;
            let extension_properties = entry.enumerate_instance_extension_properties(None).map_err(|e| {
                engine_fail!("orrery::vulkan", InstanceCreationFailed, "vkEnumerateInstanceExtensionProperties", e)
            })?;
            let supported_layers: Vec<&CStr> = layer_properties
                .iter()
                .filter_map(|p| p.layer_name_as_c_str().ok())
                .collect();
            let supported_extensions: Vec<&CStr> = extension_properties
                .iter()
                .filter_map(|p| p.extension_name_as_c_str().ok())
                .collect();

            // Extensions required by the window system
            let required = ash_window::enumerate_required_extensions(display_handle.as_raw()).map_err(|e| {
                engine_error!("orrery::vulkan", "Failed to get required extensions: {}", e);
                Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
            })?;

            let mut extension_names: Vec<*const c_char> = Vec::with_capacity(required.len() + 1);
            for &name_ptr in required {
                let name = CStr::from_ptr(name_ptr);
                if !supported_extensions.contains(&name) {
                    engine_error!("orrery::vulkan", "Required instance extension {:?} is not supported", name);
                    return Err(Error::InitializationFailed(format!(
                        "Required instance extension {:?} is not supported",
                        name
                    )));
                }
                extension_names.push(name_ptr);
            }

            let validation = plan_validation(config.enable_validation, &supported_layers, &supported_extensions);
            if config.enable_validation && !validation.layer {
                engine_warn!("orrery::vulkan", "Validation requested but VK_LAYER_KHRONOS_validation is not installed");
            }
            if validation.debug_utils {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names: Vec<*const c_char> = if validation.layer {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            for &layer in &layer_names {
                engine_info!("orrery::vulkan", "Enabling layer: {}", CStr::from_ptr(layer).to_string_lossy());
            }
            for &extension in &extension_names {
                engine_info!("orrery::vulkan", "Enabling instance extension: {}", CStr::from_ptr(extension).to_string_lossy());
            }

            // Application info
            let app_name = CString::new(config.app_name.clone()).map_err(|e| {
                engine_error!("orrery::vulkan", "Invalid application name: {}", e);
                Error::InitializationFailed(format!("Invalid application name: {}", e))
            })?;
            let (major, minor, patch) = config.app_version;
            let (api_major, api_minor) = config.min_api_version;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Orrery")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::make_api_version(0, api_major, api_minor, 0));

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| engine_fail!("orrery::vulkan", InstanceCreationFailed, "vkCreateInstance", e))?;

            // Debug messenger
            let debug_messenger = if validation.debug_utils {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                crate::debug::init_debug_config(config.debug_severity);

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => Some((debug_utils, messenger)),
                    Err(e) => {
                        crate::debug::cleanup_debug_config();
                        instance.destroy_instance(None);
                        return Err(engine_fail!(
                            "orrery::vulkan",
                            InstanceCreationFailed,
                            "vkCreateDebugUtilsMessengerEXT",
                            e
                        ));
                    }
                }
            } else {
                None
            };

            // Window surface
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = window
                .window_handle()
                .map_err(|e| {
                    engine_error!("orrery::vulkan", "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })
                .and_then(|window_handle| {
                    ash_window::create_surface(
                        &entry,
                        &instance,
                        display_handle.as_raw(),
                        window_handle.as_raw(),
                        None,
                    )
                    .map_err(|e| engine_fail!("orrery::vulkan", InstanceCreationFailed, "vkCreateSurfaceKHR", e))
                });

            let surface = match surface {
                Ok(surface) => surface,
                Err(error) => {
                    if let Some((debug_utils, messenger)) = &debug_messenger {
                        crate::debug::cleanup_debug_config();
                        debug_utils.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(error);
                }
            };

            Ok(Self {
                entry,
                instance,
                debug_messenger,
                surface_loader,
                surface,
                window,
            })
        }
    }

    /// Vulkan entry points
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Vulkan instance
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Surface extension loader
    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }

    /// Window surface
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// True if validation messages are routed to the logger
    pub fn has_debug_messenger(&self) -> bool {
        self.debug_messenger.is_some()
    }

    /// Live framebuffer size of the window
    pub fn framebuffer_size(&self) -> (u32, u32) {
        self.window.framebuffer_size()
    }
}

impl Drop for InstanceContext {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);

            // Stop forwarding before the messenger goes away
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                crate::debug::cleanup_debug_config();
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
