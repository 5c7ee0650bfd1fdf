use crate::port::PortError;
use crate::types::ConfigKind;
use thiserror::Error;

/// Everything that can go wrong while driving the camera.
///
/// Each variant keeps the node name and/or the native failure so callers
/// and tests can branch on kind instead of scraping message strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("Unable to connect to camera. Result: {source}")]
    ConnectionFailed { source: PortError },

    #[error("Unable to get camera config. Result: {source}")]
    ConfigFetchFailed { source: PortError },

    #[error("There is no camera config with the name of '{name}'. Result: {source}")]
    ConfigNotFound { name: String, source: PortError },

    #[error("Unable to get camera config ({name}) value. Result: {source}")]
    ConfigReadFailed { name: String, source: PortError },

    #[error("Unable to set camera config ({name}) value. Result: {source}")]
    ConfigWriteFailed { name: String, source: PortError },

    #[error("Unable to write camera config back to the device. Result: {source}")]
    ConfigCommitFailed { source: PortError },

    #[error("Unable to set camera config ({name}): this config is readonly")]
    ReadOnlyViolation { name: String },

    #[error("Value '{value}' cannot be parsed as {kind} for config ({name})")]
    ValueFormatError {
        name: String,
        kind: ConfigKind,
        value: String,
    },

    #[error("Unable to capture image. Result: {source}")]
    CaptureFailed { source: PortError },

    #[error("Could not apply preview setup value for '{name}'. Result: {source}")]
    PreviewSetupFailed { name: String, source: PortError },

    #[error("Unable to fetch the captured preview from the camera. Result: {source}")]
    PreviewFetchFailed { source: PortError },
}

impl ControlError {
    pub fn connection(source: PortError) -> Self {
        Self::ConnectionFailed { source }
    }

    pub fn fetch(source: PortError) -> Self {
        Self::ConfigFetchFailed { source }
    }

    pub fn not_found(name: &str, source: PortError) -> Self {
        Self::ConfigNotFound {
            name: name.to_string(),
            source,
        }
    }

    pub fn read_failed(name: &str, source: PortError) -> Self {
        Self::ConfigReadFailed {
            name: name.to_string(),
            source,
        }
    }

    pub fn write_failed(name: &str, source: PortError) -> Self {
        Self::ConfigWriteFailed {
            name: name.to_string(),
            source,
        }
    }

    pub fn commit_failed(source: PortError) -> Self {
        Self::ConfigCommitFailed { source }
    }

    pub fn read_only(name: &str) -> Self {
        Self::ReadOnlyViolation {
            name: name.to_string(),
        }
    }

    pub fn bad_value(name: &str, kind: ConfigKind, value: &str) -> Self {
        Self::ValueFormatError {
            name: name.to_string(),
            kind,
            value: value.to_string(),
        }
    }

    pub fn capture_failed(source: PortError) -> Self {
        Self::CaptureFailed { source }
    }

    pub fn preview_setup(name: &str, source: PortError) -> Self {
        Self::PreviewSetupFailed {
            name: name.to_string(),
            source,
        }
    }

    pub fn preview_fetch(source: PortError) -> Self {
        Self::PreviewFetchFailed { source }
    }

    /// Whether the session must drop its connection after this error.
    ///
    /// Any device-communication failure is treated as evidence the handle
    /// is unreliable. Caller-input mistakes leave the connection alone.
    pub fn invalidates_session(&self) -> bool {
        !matches!(
            self,
            ControlError::ReadOnlyViolation { .. } | ControlError::ValueFormatError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readonly_message_names_the_node() {
        let err = ControlError::read_only("whitebalance");
        let msg = err.to_string();
        assert!(msg.contains("whitebalance"));
        assert!(msg.contains("readonly"));
    }

    #[test]
    fn caller_input_errors_keep_the_session() {
        assert!(!ControlError::read_only("iso").invalidates_session());
        assert!(
            !ControlError::bad_value("iso", ConfigKind::IntegerLike, "abc").invalidates_session()
        );
    }

    #[test]
    fn device_errors_invalidate_the_session() {
        let native = PortError::new(-1, "I/O problem");
        assert!(ControlError::connection(native.clone()).invalidates_session());
        assert!(ControlError::fetch(native.clone()).invalidates_session());
        assert!(ControlError::not_found("iso", native.clone()).invalidates_session());
        assert!(ControlError::read_failed("iso", native.clone()).invalidates_session());
        assert!(ControlError::write_failed("iso", native.clone()).invalidates_session());
        assert!(ControlError::commit_failed(native.clone()).invalidates_session());
        assert!(ControlError::capture_failed(native.clone()).invalidates_session());
        assert!(ControlError::preview_setup("viewfinder", native.clone()).invalidates_session());
        assert!(ControlError::preview_fetch(native).invalidates_session());
    }

    #[test]
    fn messages_carry_the_native_code() {
        let err = ControlError::fetch(PortError::new(-7, "I/O problem"));
        assert!(err.to_string().contains("I/O problem (-7)"));
    }
}
