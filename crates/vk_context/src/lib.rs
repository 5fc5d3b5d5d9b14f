//! # vk_context
//!
//! Vulkan bring-up for a single fixed-size GLFW window: instance (with
//! validation layers in debug builds), surface, physical device selection,
//! logical device and queues, and swapchain.
//!
//! ```rust,no_run
//! use vk_context::{logging, run, ContextConfig};
//!
//! fn main() -> Result<(), vk_context::VulkanError> {
//!     let _logging = logging::init();
//!     run(ContextConfig::default())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod logging;
pub mod physical_device;
pub mod queue_family;
pub mod surface;
pub mod swapchain;
pub mod window;

pub use config::{Config, ConfigError, ContextConfig};
pub use context::{run, GraphicsContext};
pub use error::{VulkanError, VulkanResult};
pub use lifecycle::{LifecycleState, ResourceKind, ResourceLedger};
