//! Context configuration
//!
//! The binary always runs with [`ContextConfig::default`]; file loading is
//! available to embedders that want a different window or application name.

use std::ffi::CStr;
use std::path::Path;

use ash::extensions::khr::Swapchain as SwapchainLoader;
use serde::{Deserialize, Serialize};

/// Window width in pixels
pub const WINDOW_WIDTH: u32 = 800;
/// Window height in pixels
pub const WINDOW_HEIGHT: u32 = 600;
/// Window title
pub const WINDOW_TITLE: &str = "vulkan window";

/// Validation layers requested when diagnostics are enabled
pub const VALIDATION_LAYERS: &[&str] = &["VK_LAYER_KHRONOS_validation"];

/// Device extensions every selected GPU must support
pub fn device_extensions() -> [&'static CStr; 1] {
    [SwapchainLoader::name()]
}

/// Configuration loaded from or saved to a file
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Failures while loading or saving a [`ContextConfig`] file
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this config
    #[error("invalid TOML config: {0}")]
    Parse(String),

    /// The config could not be rendered as TOML
    #[error("could not write config as TOML: {0}")]
    Serialize(String),

    /// The path does not end in `.toml`
    #[error("config path must end in .toml: {0}")]
    UnsupportedFormat(String),
}

/// Everything the bring-up sequence needs to know up front
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Window width in pixels, also the preferred swap-chain width
    pub width: u32,
    /// Window height in pixels, also the preferred swap-chain height
    pub height: u32,
    /// Window title
    pub title: String,
    /// Application name reported to the driver
    pub application_name: String,
    /// Engine name reported to the driver
    pub engine_name: String,
    /// Request [`VALIDATION_LAYERS`] at instance creation
    pub enable_validation: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            title: WINDOW_TITLE.to_string(),
            application_name: "Vulkan Window".to_string(),
            engine_name: "No Engine".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl Config for ContextConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("vk_context_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_default_matches_fixed_window() {
        let config = ContextConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.title, "vulkan window");
        assert_eq!(config.enable_validation, cfg!(debug_assertions));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: ContextConfig =
            toml::from_str("title = \"bring-up\"\nenable_validation = false\n").unwrap();
        assert_eq!(config.title, "bring-up");
        assert!(!config.enable_validation);
        assert_eq!(config.width, WINDOW_WIDTH);
        assert_eq!(config.height, WINDOW_HEIGHT);
    }

    #[test]
    fn test_save_then_load_toml() {
        let path = scratch_path("roundtrip.toml");
        let config = ContextConfig {
            application_name: "Bring-up".to_string(),
            ..ContextConfig::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = ContextConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let path = scratch_path("config.yaml");
        let err = ContextConfig::default().save_to_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
        assert!(err.to_string().contains(".toml"));
        assert!(!path.exists());

        let err = ContextConfig::load_from_file(scratch_path("config")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let path = scratch_path("malformed.toml");
        std::fs::write(&path, "width = \"wide\"\n").unwrap();
        let err = ContextConfig::load_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid TOML config"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ContextConfig::load_from_file(scratch_path("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_device_extensions_require_swapchain() {
        assert_eq!(device_extensions()[0].to_str().unwrap(), "VK_KHR_swapchain");
    }
}
