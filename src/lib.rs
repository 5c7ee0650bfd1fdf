//! Tethercam: tethered camera control for Tauri applications
//!
//! This crate bridges a Tauri frontend to a libgphoto2-style tethered
//! camera: connection lifecycle, typed configuration access and in-memory
//! preview capture, all behind a single serialized session.
//!
//! # Features
//! - Lazy connect with automatic reconnection after device errors
//! - Typed config reads and writes (float, integer, string-choice)
//! - Two-phase config commits (the device never sees a partial change)
//! - In-memory preview frames (nothing written to disk)
//! - `tether` feature for real hardware via the `gphoto2` crate; default
//!   builds run against a simulated camera
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! tethercam = { version = "0.3" }
//! tauri = { version = "2.0", features = ["protocol-asset"] }
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! use tethercam;
//!
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(tethercam::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod commands;
pub mod config;
pub mod errors;
pub mod port;
pub mod session;
pub mod testing;
pub mod types;

// Re-exports for convenience
pub use config::{BridgeConfig, PreviewConfig, SessionConfig};
pub use errors::ControlError;
pub use session::CameraSession;
pub use types::{ConfigItem, ConfigKind, PreviewFrame};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the Tethercam plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("tethercam")
        .invoke_handler(tauri::generate_handler![
            // Config widget commands
            commands::config::get_config_item,
            commands::config::set_config_item,
            commands::config::list_config,
            // Capture commands
            commands::capture::capture_preview,
            commands::capture::capture_image,
            // Bridge configuration commands
            commands::config::get_bridge_config,
            commands::config::update_bridge_config,
        ])
        .build()
}

/// Initialize logging for the camera bridge
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "tethercam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "tethercam");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_logging_init_is_reentrant() {
        init_logging();
        init_logging();
    }
}
