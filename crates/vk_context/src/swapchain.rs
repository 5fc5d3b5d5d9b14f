//! Vulkan swapchain management
//!
//! Negotiates format, present mode, extent and image count against what the
//! surface supports, then creates the swapchain and one view per image.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use crate::error::{VulkanError, VulkanResult};
use crate::queue_family::QueueFamilies;

/// What a surface supports on one physical device
///
/// Query-time only; nothing keeps it after the swapchain exists.
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupport {
    /// Image count, extent and transform limits
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported format / color space pairs
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// At least one format and one present mode
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Pick BGRA8 sRGB with the sRGB non-linear color space
///
/// Falls back to the first listed format when the preferred pair is absent.
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> VulkanResult<vk::SurfaceFormatKHR> {
    let first = formats.first().copied().ok_or(VulkanError::NoCompatibleFormat)?;

    let preferred = formats.iter().copied().find(|sf| {
        sf.format == vk::Format::B8G8R8A8_SRGB
            && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    Ok(preferred.unwrap_or_else(|| {
        log::warn!(
            "B8G8R8A8_SRGB/SRGB_NONLINEAR not offered, using {:?}/{:?}",
            first.format,
            first.color_space
        );
        first
    }))
}

/// Mailbox when available, FIFO otherwise
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Use the surface's current extent unless it is the `u32::MAX` sentinel, in
/// which case clamp `preferred` into the allowed range per axis
///
/// An inverted range (minimum above maximum) resolves to the maximum.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    preferred: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (min, max) = (capabilities.min_image_extent, capabilities.max_image_extent);
    vk::Extent2D {
        width: preferred.width.max(min.width).min(max.width),
        height: preferred.height.max(min.height).min(max.height),
    }
}

/// One more than the minimum, capped by the maximum (0 means unbounded)
pub const fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && desired > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        desired
    }
}

/// How swapchain images are shared between queue families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    /// One family owns the images
    Exclusive,
    /// Graphics and present families both access the images
    Concurrent([u32; 2]),
}

impl ImageSharing {
    /// Concurrent only when the families differ
    pub const fn for_families(families: QueueFamilies) -> Self {
        if families.is_shared() {
            Self::Exclusive
        } else {
            Self::Concurrent([families.graphics, families.present])
        }
    }

    /// Vulkan sharing mode
    pub const fn mode(&self) -> vk::SharingMode {
        match self {
            Self::Exclusive => vk::SharingMode::EXCLUSIVE,
            Self::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    /// Family indices to list in the create info
    pub fn family_indices(&self) -> &[u32] {
        match self {
            Self::Exclusive => &[],
            Self::Concurrent(indices) => indices,
        }
    }
}

/// Swapchain management wrapper with RAII cleanup
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for `surface`
    ///
    /// `preferred_extent` is only used when the surface leaves the extent to
    /// the application.
    pub fn new(
        instance: &ash::Instance,
        device: &Device,
        surface: vk::SurfaceKHR,
        support: &SwapchainSupport,
        families: QueueFamilies,
        preferred_extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let format = choose_surface_format(&support.formats)?;
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, preferred_extent);
        let image_count = choose_image_count(&support.capabilities);
        let sharing = ImageSharing::for_families(families);

        log::info!(
            "Swapchain: {:?}/{:?}, {:?}, {}x{}, {} images, {:?}",
            format.format,
            format.color_space,
            present_mode,
            extent.width,
            extent.height,
            image_count,
            sharing
        );

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing.mode())
            .queue_family_indices(sharing.family_indices())
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain_loader = SwapchainLoader::new(instance, device);
        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::SwapChainCreationFailed)?
        };

        // From here on `Self` owns the handle so any failure below cleans up.
        let mut chain = Self {
            device: device.clone(),
            swapchain_loader,
            swapchain,
            images: Vec::new(),
            image_views: Vec::new(),
            format,
            present_mode,
            extent,
        };

        chain.images = unsafe {
            chain
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::SwapChainCreationFailed)?
        };

        for &image in &chain.images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe {
                chain
                    .device
                    .create_image_view(&view_info, None)
                    .map_err(VulkanError::SwapChainCreationFailed)?
            };
            chain.image_views.push(view);
        }

        log::debug!("Swapchain holds {} images", chain.images.len());

        Ok(chain)
    }

    /// Get swapchain handle
    pub const fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Get surface format
    pub const fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Get present mode
    pub const fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Get swapchain extent
    pub const fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Presentable images owned by the swapchain
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// Get image views
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFERRED: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    fn surface_format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR { format, color_space }
    }

    fn capabilities(min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        }
    }

    #[test]
    fn test_preferred_format_found_at_any_position() {
        let others = [
            surface_format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            surface_format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            surface_format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
        ];

        for position in 0..=others.len() {
            let mut formats = others.to_vec();
            formats.insert(position, PREFERRED);
            assert_eq!(choose_surface_format(&formats).unwrap(), PREFERRED);
        }
    }

    #[test]
    fn test_format_falls_back_to_first_entry() {
        let formats = [
            surface_format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            surface_format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        assert_eq!(choose_surface_format(&formats).unwrap(), formats[0]);
    }

    #[test]
    fn test_empty_format_list_is_an_error() {
        assert!(matches!(choose_surface_format(&[]), Err(VulkanError::NoCompatibleFormat)));
    }

    #[test]
    fn test_mailbox_preferred() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_fifo_when_no_mailbox() {
        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO_RELAXED];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&[]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_defined_current_extent_used_verbatim() {
        let mut caps = capabilities(2, 0);
        caps.current_extent = vk::Extent2D { width: 1024, height: 768 };
        caps.max_image_extent = vk::Extent2D { width: 400, height: 400 };

        let extent = choose_extent(&caps, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent, vk::Extent2D { width: 1024, height: 768 });
    }

    #[test]
    fn test_undefined_extent_clamped_per_axis() {
        let mut caps = capabilities(2, 0);
        caps.min_image_extent = vk::Extent2D { width: 1, height: 1 };
        caps.max_image_extent = vk::Extent2D { width: 400, height: 1080 };

        let extent = choose_extent(&caps, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent, vk::Extent2D { width: 400, height: 600 });
    }

    #[test]
    fn test_undefined_extent_raised_to_minimum() {
        let mut caps = capabilities(2, 0);
        caps.min_image_extent = vk::Extent2D { width: 1000, height: 700 };

        let extent = choose_extent(&caps, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent, vk::Extent2D { width: 1000, height: 700 });
    }

    #[test]
    fn test_inverted_extent_range_does_not_panic() {
        let mut caps = capabilities(2, 0);
        caps.min_image_extent = vk::Extent2D { width: 900, height: 700 };
        caps.max_image_extent = vk::Extent2D { width: 500, height: 500 };

        let extent = choose_extent(&caps, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent, vk::Extent2D { width: 500, height: 500 });
    }

    #[test]
    fn test_image_count_unbounded_maximum() {
        assert_eq!(choose_image_count(&capabilities(2, 0)), 3);
    }

    #[test]
    fn test_image_count_clamped_to_maximum() {
        assert_eq!(choose_image_count(&capabilities(2, 2)), 2);
        assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
    }

    #[test]
    fn test_sharing_follows_family_split() {
        let shared = QueueFamilies { graphics: 0, present: 0 };
        assert_eq!(ImageSharing::for_families(shared), ImageSharing::Exclusive);
        assert_eq!(ImageSharing::Exclusive.mode(), vk::SharingMode::EXCLUSIVE);
        assert!(ImageSharing::Exclusive.family_indices().is_empty());

        let split = ImageSharing::for_families(QueueFamilies { graphics: 0, present: 2 });
        assert_eq!(split, ImageSharing::Concurrent([0, 2]));
        assert_eq!(split.mode(), vk::SharingMode::CONCURRENT);
        assert_eq!(split.family_indices(), &[0, 2]);
    }

    #[test]
    fn test_support_adequacy() {
        let mut support = SwapchainSupport::default();
        assert!(!support.is_adequate());
        support.formats.push(PREFERRED);
        assert!(!support.is_adequate());
        support.present_modes.push(vk::PresentModeKHR::FIFO);
        assert!(support.is_adequate());
    }
}
