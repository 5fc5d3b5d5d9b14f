//! Opens a window, brings up Vulkan on it, waits for the window to close and
//! tears everything down again.

use std::process::ExitCode;

use vk_context::{logging, ContextConfig};

fn main() -> ExitCode {
    let _logging = logging::init();

    log::info!("Starting Vulkan window");

    match vk_context::run(ContextConfig::default()) {
        Ok(()) => {
            log::info!("Vulkan window finished successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Vulkan bring-up failed: {e}");
            ExitCode::FAILURE
        }
    }
}
