//! Tauri command surface.
//!
//! Every command funnels through [`with_session`]: one global session,
//! serialized by a sync mutex, driven from blocking tasks so camera I/O
//! never stalls the async runtime.

pub mod capture;
pub mod config;

pub use capture::*;
pub use config::*;

use crate::config::BridgeConfig;
use crate::errors::ControlError;
use crate::session::CameraSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as SyncMutex, RwLock};
use std::time::Duration;

#[cfg(feature = "tether")]
pub type DefaultPort = crate::port::gphoto::TetherPort;
#[cfg(not(feature = "tether"))]
pub type DefaultPort = crate::testing::SimulatedCamera;

#[cfg(feature = "tether")]
fn default_port() -> DefaultPort {
    crate::port::gphoto::TetherPort::new()
}

#[cfg(not(feature = "tether"))]
fn default_port() -> DefaultPort {
    crate::testing::SimulatedCamera::new()
}

lazy_static::lazy_static! {
    pub(crate) static ref GLOBAL_CONFIG: Arc<RwLock<BridgeConfig>> =
        Arc::new(RwLock::new(BridgeConfig::load_or_default()));

    static ref SESSION: Arc<SyncMutex<CameraSession<DefaultPort>>> = {
        let preview = GLOBAL_CONFIG
            .read()
            .map(|config| config.preview.clone())
            .unwrap_or_default();
        Arc::new(SyncMutex::new(
            CameraSession::new(default_port()).with_preview(preview),
        ))
    };
}

/// Set when an operation times out while still holding the camera. The
/// next operation drops the connection before doing anything else, since
/// the abandoned one may have left the device mid-transaction.
static SESSION_STALE: AtomicBool = AtomicBool::new(false);

/// Run one operation against the global session.
///
/// Serializes on the session mutex inside a blocking task and bounds the
/// whole thing with the configured timeout (0 disables it).
pub(crate) async fn with_session<T, F>(op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&mut CameraSession<DefaultPort>) -> Result<T, ControlError> + Send + 'static,
{
    let timeout_ms = GLOBAL_CONFIG
        .read()
        .map(|config| config.session.operation_timeout_ms)
        .unwrap_or(0);
    let session = Arc::clone(&SESSION);

    let work = tokio::task::spawn_blocking(move || {
        let mut session = session.lock().map_err(|e| e.to_string())?;
        if SESSION_STALE.swap(false, Ordering::SeqCst) {
            log::warn!("previous operation timed out; dropping the stale connection");
            session.disconnect();
        }
        op(&mut session).map_err(|e| e.to_string())
    });

    let joined = if timeout_ms == 0 {
        work.await
    } else {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), work).await {
            Ok(joined) => joined,
            Err(_) => {
                SESSION_STALE.store(true, Ordering::SeqCst);
                log::error!("camera operation exceeded {}ms", timeout_ms);
                return Err(format!("Camera operation timed out after {}ms", timeout_ms));
            }
        }
    };

    joined.map_err(|e| format!("Camera task failed: {}", e))?
}
