//! Vulkan instance creation
//!
//! Declares exactly the extensions the window system requires and, when
//! diagnostics are enabled, the validation layers after checking they exist.

use std::ffi::{CStr, CString};

use ash::{vk, Entry, Instance};

use crate::error::{VulkanError, VulkanResult};

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Layers the instance was created with
    pub enabled_layers: Vec<CString>,
}

impl VulkanInstance {
    /// Create the instance
    ///
    /// `required_extensions` is the windowing system's list, passed through
    /// untouched. `validation_layers` is only consulted when
    /// `enable_diagnostics` is set.
    pub fn new(
        app_name: &str,
        engine_name: &str,
        required_extensions: &[String],
        enable_diagnostics: bool,
        validation_layers: &[&str],
    ) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::LoaderUnavailable(e.to_string()))?;

        let enabled_layers = if enable_diagnostics {
            let available = unsafe { entry.enumerate_instance_layer_properties() }
                .map_err(VulkanError::Api)?;
            check_layer_support(validation_layers, &available)?;
            validation_layers
                .iter()
                .map(|name| CString::new(*name))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        if log::log_enabled!(log::Level::Debug) {
            let available = unsafe { entry.enumerate_instance_extension_properties(None) }
                .map_err(VulkanError::Api)?;
            log::debug!("extension count: {}", available.len());
        }

        let app_name_cstr = CString::new(app_name)?;
        let engine_name_cstr = CString::new(engine_name)?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let extension_names = required_extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let extension_ptrs: Vec<*const std::os::raw::c_char> =
            extension_names.iter().map(|ext| ext.as_ptr()).collect();
        let layer_ptrs: Vec<*const std::os::raw::c_char> =
            enabled_layers.iter().map(|layer| layer.as_ptr()).collect();

        log::debug!("Instance extensions: {:?}", required_extensions);
        log::debug!("Instance layers: {:?}", enabled_layers);

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::InstanceCreationFailed)?
        };

        log::info!(
            "Created Vulkan instance for \"{}\" (validation {})",
            app_name,
            if enable_diagnostics { "on" } else { "off" }
        );

        Ok(Self {
            entry,
            instance,
            enabled_layers,
        })
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

/// Fixed-size, NUL-terminated name array as reported by the driver
pub(crate) fn raw_name(raw: &[std::os::raw::c_char]) -> &CStr {
    // The driver guarantees NUL termination within the array
    unsafe { CStr::from_ptr(raw.as_ptr()) }
}

/// Verify every requested layer is in `available`
///
/// Names are compared exactly. Fails on the first missing name.
pub fn check_layer_support(
    requested: &[&str],
    available: &[vk::LayerProperties],
) -> VulkanResult<()> {
    for name in requested {
        let found = available
            .iter()
            .any(|layer| raw_name(&layer.layer_name).to_bytes() == name.as_bytes());

        if !found {
            log::error!("Validation layer {} is not installed", name);
            return Err(VulkanError::UnavailableLayer((*name).to_string()));
        }
    }
    Ok(())
}
