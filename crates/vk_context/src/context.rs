//! Graphics context bring-up and teardown
//!
//! Each stage type owns everything acquired so far and can only turn into the
//! next stage, so steps cannot run out of order. Fields are declared newest
//! first: dropping a stage early (because a later step failed) releases its
//! handles in reverse creation order. Destructuring binds oldest first for the
//! same reason, since locals drop in reverse declaration order.

use ash::vk;

use crate::config::{device_extensions, ContextConfig, VALIDATION_LAYERS};
use crate::device::LogicalDevice;
use crate::error::{VulkanError, VulkanResult};
use crate::instance::VulkanInstance;
use crate::lifecycle::{LifecycleState, ResourceKind, ResourceLedger};
use crate::physical_device::{DeviceProbe, PhysicalDeviceInfo, SurfaceProbe};
use crate::surface::SurfaceHandle;
use crate::swapchain::Swapchain;
use crate::window::Window;

const TEARDOWN_ORDER: [ResourceKind; 5] = [
    ResourceKind::Swapchain,
    ResourceKind::Device,
    ResourceKind::Surface,
    ResourceKind::Instance,
    ResourceKind::Window,
];

/// Hand each live resource to `release`, newest first, recording it in `ledger`
///
/// Nothing is released unless the ledger holds exactly the full context.
fn release_in_order(
    ledger: &mut ResourceLedger,
    mut release: impl FnMut(ResourceKind),
) -> VulkanResult<()> {
    if !ledger.teardown_order().eq(TEARDOWN_ORDER) {
        return Err(VulkanError::out_of_order_release(
            ledger.teardown_order().next(),
            TEARDOWN_ORDER[0],
        ));
    }

    for kind in TEARDOWN_ORDER {
        release(kind);
        ledger.release(kind)?;
    }
    Ok(())
}

/// Window is open, nothing Vulkan exists yet
pub struct WindowOpen {
    window: Window,
    ledger: ResourceLedger,
    config: ContextConfig,
}

impl WindowOpen {
    /// Open the configured window
    pub fn open(config: ContextConfig) -> VulkanResult<Self> {
        let mut ledger = ResourceLedger::new();
        let window = Window::open(config.width, config.height, &config.title)?;
        ledger.acquire(ResourceKind::Window);
        ledger.advance(LifecycleState::WindowOpen)?;

        Ok(Self { window, ledger, config })
    }

    /// Create the instance with the window system's extensions
    pub fn create_instance(self) -> VulkanResult<InstanceReady> {
        let Self { config, mut ledger, window } = self;

        let extensions = window.required_instance_extensions()?;
        let instance = VulkanInstance::new(
            &config.application_name,
            &config.engine_name,
            &extensions,
            config.enable_validation,
            VALIDATION_LAYERS,
        )?;
        ledger.acquire(ResourceKind::Instance);
        ledger.advance(LifecycleState::InstanceReady)?;

        Ok(InstanceReady {
            instance,
            window,
            ledger,
            config,
        })
    }
}

/// Instance exists
pub struct InstanceReady {
    instance: VulkanInstance,
    window: Window,
    ledger: ResourceLedger,
    config: ContextConfig,
}

impl InstanceReady {
    /// Bind the window to a surface
    pub fn create_surface(self) -> VulkanResult<SurfaceReady> {
        let Self { config, mut ledger, mut window, instance } = self;

        let surface = SurfaceHandle::new(&instance, &mut window)?;
        ledger.acquire(ResourceKind::Surface);
        ledger.advance(LifecycleState::SurfaceReady)?;

        Ok(SurfaceReady {
            surface,
            instance,
            window,
            ledger,
            config,
        })
    }
}

/// Surface exists
pub struct SurfaceReady {
    surface: SurfaceHandle,
    instance: VulkanInstance,
    window: Window,
    ledger: ResourceLedger,
    config: ContextConfig,
}

impl SurfaceReady {
    /// Choose the GPU that will drive the surface
    pub fn select_physical_device(self) -> VulkanResult<DeviceSelected> {
        let Self { config, mut ledger, window, instance, surface } = self;

        let physical_device =
            PhysicalDeviceInfo::select(&instance.instance, &surface, &device_extensions())?;
        ledger.advance(LifecycleState::DeviceSelected)?;

        Ok(DeviceSelected {
            physical_device,
            surface,
            instance,
            window,
            ledger,
            config,
        })
    }
}

/// A physical device has been chosen
pub struct DeviceSelected {
    physical_device: PhysicalDeviceInfo,
    surface: SurfaceHandle,
    instance: VulkanInstance,
    window: Window,
    ledger: ResourceLedger,
    config: ContextConfig,
}

impl DeviceSelected {
    /// The chosen GPU
    pub const fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Create the logical device and fetch its queues
    pub fn create_device(self) -> VulkanResult<DeviceReady> {
        let Self { config, mut ledger, window, instance, surface, physical_device } = self;

        let device =
            LogicalDevice::new(&instance.instance, &physical_device, &device_extensions())?;
        ledger.acquire(ResourceKind::Device);
        ledger.advance(LifecycleState::DeviceReady)?;

        Ok(DeviceReady {
            device,
            physical_device,
            surface,
            instance,
            window,
            ledger,
            config,
        })
    }
}

/// Logical device and queues exist
pub struct DeviceReady {
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    surface: SurfaceHandle,
    instance: VulkanInstance,
    window: Window,
    ledger: ResourceLedger,
    config: ContextConfig,
}

impl DeviceReady {
    /// Negotiate and create the swapchain
    pub fn create_swap_chain(self) -> VulkanResult<GraphicsContext> {
        let Self {
            config,
            mut ledger,
            window,
            instance,
            surface,
            physical_device,
            device,
        } = self;

        let support = SurfaceProbe::new(&instance.instance, &surface)
            .swapchain_support(physical_device.device)?;
        // Framebuffer pixels can differ from window units on high-DPI displays
        let (width, height) = window.framebuffer_size();
        let preferred = vk::Extent2D { width, height };
        let swapchain = Swapchain::new(
            &instance.instance,
            &device.device,
            surface.handle(),
            &support,
            physical_device.queue_families,
            preferred,
        )?;
        ledger.acquire(ResourceKind::Swapchain);
        ledger.advance(LifecycleState::SwapChainReady)?;

        Ok(GraphicsContext {
            swapchain,
            device,
            physical_device,
            surface,
            instance,
            window,
            ledger,
            config,
        })
    }
}

/// Fully initialized context: window, instance, surface, device and swapchain
pub struct GraphicsContext {
    swapchain: Swapchain,
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    surface: SurfaceHandle,
    instance: VulkanInstance,
    window: Window,
    ledger: ResourceLedger,
    config: ContextConfig,
}

impl GraphicsContext {
    /// Run every bring-up step in order, stopping at the first failure
    pub fn initialize(config: ContextConfig) -> VulkanResult<Self> {
        WindowOpen::open(config)?
            .create_instance()?
            .create_surface()?
            .select_physical_device()?
            .create_device()?
            .create_swap_chain()
    }

    /// Poll window events until close is requested
    pub fn run_until_closed(&mut self) -> VulkanResult<()> {
        self.ledger.advance(LifecycleState::Running)?;
        log::info!("Running; close the window or press Escape to exit");

        while !self.window.should_close() {
            self.window.poll_events();
        }
        Ok(())
    }

    /// Release every handle in reverse creation order
    ///
    /// Only valid after [`Self::run_until_closed`]; otherwise the ledger
    /// refuses the transition and the handles are released by drop instead.
    pub fn teardown(mut self) -> VulkanResult<()> {
        self.ledger.advance(LifecycleState::TornDown)?;
        self.device.wait_idle()?;

        let Self {
            config: _,
            mut ledger,
            window,
            instance,
            surface,
            physical_device: _,
            device,
            swapchain,
        } = self;
        let mut window = Some(window);
        let mut instance = Some(instance);
        let mut surface = Some(surface);
        let mut device = Some(device);
        let mut swapchain = Some(swapchain);

        release_in_order(&mut ledger, |kind| match kind {
            ResourceKind::Swapchain => drop(swapchain.take()),
            ResourceKind::Device => drop(device.take()),
            ResourceKind::Surface => drop(surface.take()),
            ResourceKind::Instance => drop(instance.take()),
            ResourceKind::Window => {
                if let Some(window) = window.take() {
                    window.close();
                }
            }
        })?;

        log::info!("Released {:?}", ledger.released());
        Ok(())
    }

    /// Configuration the context was built from
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The chosen GPU
    pub const fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Logical device and its queues
    pub const fn device(&self) -> &LogicalDevice {
        &self.device
    }

    /// The swapchain
    pub const fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// The surface
    pub const fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// The instance
    pub const fn instance(&self) -> &VulkanInstance {
        &self.instance
    }

    /// Current lifecycle state
    pub const fn state(&self) -> LifecycleState {
        self.ledger.state()
    }
}

/// Bring the context up, run until the window closes, then tear it down
pub fn run(config: ContextConfig) -> VulkanResult<()> {
    let mut context = GraphicsContext::initialize(config)?;
    context.run_until_closed()?;
    context.teardown()
}
