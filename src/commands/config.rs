use crate::commands::{with_session, GLOBAL_CONFIG};
use crate::config::BridgeConfig;
use crate::types::ConfigItem;
use tauri::command;

/// Read one camera configuration item by its node name.
#[command]
pub async fn get_config_item(name: String) -> Result<ConfigItem, String> {
    with_session(move |session| session.get_config_item(&name)).await
}

/// Write one camera configuration item, taking the value as its wire
/// string ("0.005", "400", "JPEG Fine").
#[command]
pub async fn set_config_item(name: String, value: String) -> Result<String, String> {
    with_session(move |session| session.set_config_item(&name, &value)).await?;
    Ok("Success!".to_string())
}

/// List the names of every configuration node the camera exposes.
#[command]
pub async fn list_config() -> Result<Vec<String>, String> {
    with_session(|session| session.list_config()).await
}

/// Get the current bridge configuration.
#[command]
pub async fn get_bridge_config() -> Result<BridgeConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

/// Replace the bridge configuration and persist it.
#[command]
pub async fn update_bridge_config(new_config: BridgeConfig) -> Result<(), String> {
    new_config.validate()?;

    {
        let mut config = GLOBAL_CONFIG.write().map_err(|e| e.to_string())?;
        *config = new_config.clone();
    }

    // The running session keeps its own copy of the preview strings.
    let preview = new_config.preview.clone();
    with_session(move |session| {
        session.set_preview(preview);
        Ok(())
    })
    .await?;

    new_config.save_to_file(BridgeConfig::default_path())?;

    Ok(())
}
