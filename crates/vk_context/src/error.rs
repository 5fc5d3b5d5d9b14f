//! Vulkan bring-up errors
//!
//! Every failure during context bring-up is fatal: it aborts the sequence and
//! propagates to the process entry point unchanged.

use ash::vk;
use thiserror::Error;

use crate::lifecycle::{LifecycleState, ResourceKind};

/// Vulkan context errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// The platform windowing system could not open the window
    #[error("Window creation failed: {0}")]
    WindowCreationFailed(String),

    /// The Vulkan loader library could not be loaded
    #[error("Vulkan loader unavailable: {0}")]
    LoaderUnavailable(String),

    /// The windowing system reports no way to present through Vulkan
    #[error("Windowing system exposes no Vulkan instance extensions")]
    MissingWindowExtensions,

    /// A requested validation layer is not installed
    #[error("Validation layer requested but not available: {0}")]
    UnavailableLayer(String),

    /// `vkCreateInstance` reported a non-success status
    #[error("Instance creation failed: {0:?}")]
    InstanceCreationFailed(vk::Result),

    /// Binding the window to a surface failed
    #[error("Surface creation failed: {0:?}")]
    SurfaceCreationFailed(vk::Result),

    /// The driver enumerated zero physical devices
    #[error("No Vulkan capable device found")]
    NoVulkanCapableDevice,

    /// Devices exist but none meets the selection requirements
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// `vkCreateDevice` reported a non-success status
    #[error("Logical device creation failed: {0:?}")]
    DeviceCreationFailed(vk::Result),

    /// The surface reports no formats at all
    #[error("Surface reports no supported formats")]
    NoCompatibleFormat,

    /// Swap-chain creation (or its image/view retrieval) failed
    #[error("Swap-chain creation failed: {0:?}")]
    SwapChainCreationFailed(vk::Result),

    /// A query entry point failed
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// An application or engine name contained an interior NUL byte
    #[error("Invalid name: {0}")]
    InvalidName(#[from] std::ffi::NulError),

    /// A lifecycle step ran out of order
    #[error("Lifecycle violation: expected {expected}, found {found}")]
    LifecycleViolation {
        /// What the ledger expected next
        expected: String,
        /// What was actually requested
        found: String,
    },
}

impl VulkanError {
    pub(crate) fn out_of_order_state(
        expected: Option<LifecycleState>,
        found: LifecycleState,
    ) -> Self {
        Self::LifecycleViolation {
            expected: expected.map_or_else(|| "no further state".to_string(), |s| format!("{s:?}")),
            found: format!("{found:?}"),
        }
    }

    pub(crate) fn out_of_order_release(
        expected: Option<ResourceKind>,
        found: ResourceKind,
    ) -> Self {
        Self::LifecycleViolation {
            expected: expected.map_or_else(
                || "no live resource".to_string(),
                |k| format!("release of {k:?}"),
            ),
            found: format!("release of {found:?}"),
        }
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
