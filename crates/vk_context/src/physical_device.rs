//! Physical device selection
//!
//! Candidates are checked in enumeration order and the first one that passes
//! every requirement wins. There is no scoring.

use std::collections::HashSet;
use std::ffi::{CStr, CString};

use ash::vk;

use crate::error::{VulkanError, VulkanResult};
use crate::instance::raw_name;
use crate::queue_family::{find_queue_families, QueueFamilies, QueueFamilyIndices};
use crate::surface::SurfaceHandle;
use crate::swapchain::SwapchainSupport;

/// Per-device queries needed to judge a candidate
///
/// [`SurfaceProbe`] answers them from the driver; tests answer them from
/// memory.
pub trait DeviceProbe {
    /// Device identifier
    type Device: Copy;

    /// Human-readable device name for logs
    fn name(&self, device: Self::Device) -> String;

    /// Device category
    fn device_type(&self, device: Self::Device) -> vk::PhysicalDeviceType;

    /// Queue families in index order
    fn queue_families(&self, device: Self::Device) -> Vec<vk::QueueFamilyProperties>;

    /// Whether `family` can present to the surface
    fn supports_present(&self, device: Self::Device, family: u32) -> VulkanResult<bool>;

    /// Names of the supported device extensions
    fn extensions(&self, device: Self::Device) -> VulkanResult<Vec<CString>>;

    /// Surface capabilities, formats and present modes
    fn swapchain_support(&self, device: Self::Device) -> VulkanResult<SwapchainSupport>;
}

/// Why a candidate was passed over
#[derive(Debug)]
pub enum Rejection {
    /// Not a discrete GPU
    NotDiscrete(vk::PhysicalDeviceType),
    /// No graphics family or no present family
    IncompleteQueueFamilies(QueueFamilyIndices),
    /// Required extensions that are missing
    MissingExtensions(Vec<String>),
    /// No surface formats or no present modes
    InadequateSwapchain,
    /// A driver query about the candidate failed
    QueryFailed(VulkanError),
}

/// Names in `required` that `available` lacks, sorted
pub fn missing_extensions(required: &[&CStr], available: &[CString]) -> Vec<String> {
    let mut missing: HashSet<&CStr> = required.iter().copied().collect();
    for name in available {
        missing.remove(name.as_c_str());
    }

    let mut names: Vec<String> = missing
        .into_iter()
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Judge one candidate
///
/// A driver query that fails counts against the candidate; the search moves
/// on to the next one.
pub fn evaluate_device<P: DeviceProbe>(
    probe: &P,
    device: P::Device,
    required_extensions: &[&CStr],
) -> Result<QueueFamilies, Rejection> {
    let device_type = probe.device_type(device);
    if device_type != vk::PhysicalDeviceType::DISCRETE_GPU {
        return Err(Rejection::NotDiscrete(device_type));
    }

    let indices = find_queue_families(&probe.queue_families(device), |family| {
        probe.supports_present(device, family)
    })
    .map_err(Rejection::QueryFailed)?;
    let Some(families) = indices.complete() else {
        return Err(Rejection::IncompleteQueueFamilies(indices));
    };

    let available = probe.extensions(device).map_err(Rejection::QueryFailed)?;
    let missing = missing_extensions(required_extensions, &available);
    if !missing.is_empty() {
        return Err(Rejection::MissingExtensions(missing));
    }

    // Only meaningful once the swapchain extension is known to exist
    let support = probe
        .swapchain_support(device)
        .map_err(Rejection::QueryFailed)?;
    if !support.is_adequate() {
        return Err(Rejection::InadequateSwapchain);
    }

    Ok(families)
}

/// Pick the first suitable device from `candidates`
pub fn select_physical_device<P: DeviceProbe>(
    probe: &P,
    candidates: &[P::Device],
    required_extensions: &[&CStr],
) -> VulkanResult<(P::Device, QueueFamilies)> {
    if candidates.is_empty() {
        return Err(VulkanError::NoVulkanCapableDevice);
    }

    for &device in candidates {
        match evaluate_device(probe, device, required_extensions) {
            Ok(families) => {
                log::info!("Selected GPU: {}", probe.name(device));
                return Ok((device, families));
            }
            Err(reason) => log::debug!("Skipping GPU {}: {:?}", probe.name(device), reason),
        }
    }

    Err(VulkanError::NoSuitableDevice)
}

/// Answers [`DeviceProbe`] queries from the driver for one surface
pub struct SurfaceProbe<'a> {
    instance: &'a ash::Instance,
    surface: &'a SurfaceHandle,
}

impl<'a> SurfaceProbe<'a> {
    /// Probe devices of `instance` against `surface`
    pub const fn new(instance: &'a ash::Instance, surface: &'a SurfaceHandle) -> Self {
        Self { instance, surface }
    }

    /// Every physical device the driver reports
    pub fn enumerate(&self) -> VulkanResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }.map_err(VulkanError::Api)
    }
}

impl DeviceProbe for SurfaceProbe<'_> {
    type Device = vk::PhysicalDevice;

    fn name(&self, device: vk::PhysicalDevice) -> String {
        let properties = unsafe { self.instance.get_physical_device_properties(device) };
        raw_name(&properties.device_name).to_string_lossy().into_owned()
    }

    fn device_type(&self, device: vk::PhysicalDevice) -> vk::PhysicalDeviceType {
        unsafe { self.instance.get_physical_device_properties(device) }.device_type
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe { self.instance.get_physical_device_queue_family_properties(device) }
    }

    fn supports_present(&self, device: vk::PhysicalDevice, family: u32) -> VulkanResult<bool> {
        self.surface.supports_present(device, family)
    }

    fn extensions(&self, device: vk::PhysicalDevice) -> VulkanResult<Vec<CString>> {
        let properties = unsafe { self.instance.enumerate_device_extension_properties(device) }
            .map_err(VulkanError::Api)?;
        Ok(properties
            .iter()
            .map(|extension| raw_name(&extension.extension_name).to_owned())
            .collect())
    }

    fn swapchain_support(&self, device: vk::PhysicalDevice) -> VulkanResult<SwapchainSupport> {
        Ok(SwapchainSupport {
            capabilities: self.surface.capabilities(device)?,
            formats: self.surface.formats(device)?,
            present_modes: self.surface.present_modes(device)?,
        })
    }
}

/// The chosen GPU and the queue families it will use
#[derive(Debug, Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle, owned by the driver
    pub device: vk::PhysicalDevice,
    /// Device name as reported by the driver
    pub name: String,
    /// Graphics and present families found during selection
    pub queue_families: QueueFamilies,
}

impl PhysicalDeviceInfo {
    /// Enumerate the driver's devices and select one for `surface`
    pub fn select(
        instance: &ash::Instance,
        surface: &SurfaceHandle,
        required_extensions: &[&CStr],
    ) -> VulkanResult<Self> {
        let probe = SurfaceProbe::new(instance, surface);
        let candidates = probe.enumerate()?;
        log::debug!("Driver reports {} physical device(s)", candidates.len());

        let (device, queue_families) =
            select_physical_device(&probe, &candidates, required_extensions)?;
        log::debug!(
            "Queue families: graphics {}, present {}",
            queue_families.graphics,
            queue_families.present
        );

        Ok(Self {
            device,
            name: probe.name(device),
            queue_families,
        })
    }
}
