use crate::commands::with_session;
use crate::types::PreviewFrame;
use tauri::command;

/// Capture one preview frame and return its bytes in-memory. The frame
/// never lands on disk; failures tear the camera connection down so the
/// next call starts clean.
#[command]
pub async fn capture_preview() -> Result<PreviewFrame, String> {
    with_session(|session| session.capture_preview()).await
}

/// Trigger a full-resolution capture to camera storage.
///
/// The storage transfer itself is not wired up yet; today this verifies
/// the camera is reachable and leaves the connection up.
#[command]
pub async fn capture_image() -> Result<String, String> {
    with_session(|session| session.capture_image()).await?;
    Ok("Success!".to_string())
}
