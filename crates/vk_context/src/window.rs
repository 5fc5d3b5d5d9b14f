//! Window management using GLFW
//!
//! Opens a fixed-size, non-resizable window with no client API so that
//! Vulkan owns presentation.

use ash::vk;
use glfw::{Action, Key, WindowEvent};

use crate::error::{VulkanError, VulkanResult};

/// GLFW window wrapper
///
/// Dropping it destroys the window; GLFW terminates once the `Glfw` handle
/// goes away with it.
pub struct Window {
    // Declared before `glfw` so the window is destroyed before termination.
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
    glfw: glfw::Glfw,
}

impl Window {
    /// Initialize GLFW and open a window
    pub fn open(width: u32, height: u32, title: &str) -> VulkanResult<Self> {
        let mut glfw = glfw::init(glfw::log_errors)
            .map_err(|e| {
                VulkanError::WindowCreationFailed(format!("GLFW initialization failed: {e:?}"))
            })?;

        if !glfw.vulkan_supported() {
            return Err(VulkanError::WindowCreationFailed(
                "GLFW found no Vulkan loader".to_string(),
            ));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| {
                VulkanError::WindowCreationFailed(format!("could not open {width}x{height} window"))
            })?;

        window.set_key_polling(true);
        window.set_close_polling(true);

        log::info!("Opened {}x{} window \"{}\"", width, height, title);

        Ok(Self { window, events, glfw })
    }

    /// Whether the user asked for the window to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Pump the event queue once; Escape requests close
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            if let WindowEvent::Key(Key::Escape, _, Action::Press, _) = event {
                log::debug!("Escape pressed, closing window");
                self.window.set_should_close(true);
            }
        }
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }

    /// Instance extensions GLFW needs to present to this windowing system
    pub fn required_instance_extensions(&self) -> VulkanResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .filter(|extensions| !extensions.is_empty())
            .ok_or(VulkanError::MissingWindowExtensions)
    }

    /// Bind this window to a new Vulkan surface
    pub fn create_surface(&mut self, instance: vk::Instance) -> VulkanResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(VulkanError::SurfaceCreationFailed(result))
        }
    }

    /// Destroy the window and release GLFW
    pub fn close(self) {
        log::info!("Closing window");
        drop(self);
    }
}
