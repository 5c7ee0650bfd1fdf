//! The camera session: connection lifecycle, typed config access and the
//! preview-capture sequence.
//!
//! One session exists per process (see [`crate::commands`]); every public
//! operation is self-contained: it reconnects if a previous operation tore
//! the connection down, does its work against a freshly fetched config
//! tree, and drops the connection again on any device-communication
//! failure so the next call starts clean.

use crate::config::PreviewConfig;
use crate::errors::ControlError;
use crate::port::{CaptureKind, DeviceLink, DevicePort, FileVariant, NodeHandle, PortError};
use crate::types::{ConfigItem, ConfigKind, NativeValue, PreviewFrame};

/// Node driving where captures land (device storage vs. internal RAM).
pub const CAPTURE_TARGET_NODE: &str = "capturetarget";
/// Node toggling the live sensor readout.
pub const VIEWFINDER_NODE: &str = "viewfinder";
/// Node selecting the output format/quality.
pub const IMAGE_QUALITY_NODE: &str = "imagequality";

/// Viewfinder value that activates live sensor readout instead of the
/// optical path. The body rejects quality changes while the mirror is down.
const VIEWFINDER_LIVE: i32 = 0;

pub struct CameraSession<P: DevicePort> {
    port: P,
    link: Option<P::Link>,
    preview: PreviewConfig,
}

impl<P: DevicePort> CameraSession<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            link: None,
            preview: PreviewConfig::default(),
        }
    }

    pub fn with_preview(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }

    /// Swap the preview choice strings; takes effect on the next preview.
    pub fn set_preview(&mut self, preview: PreviewConfig) {
        self.preview = preview;
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Establish the device connection if none exists. Safe to call
    /// redundantly; a failure leaves the session absent.
    ///
    /// The link owns both the native context and the connection handle, so
    /// the two always appear and disappear together.
    pub fn connect(&mut self) -> Result<(), ControlError> {
        if self.link.is_some() {
            return Ok(());
        }

        match self.port.connect() {
            Ok(link) => {
                log::info!("camera connected");
                self.link = Some(link);
                Ok(())
            }
            Err(e) => {
                log::error!("Unable to connect to camera. Result: {}", e);
                Err(ControlError::connection(e))
            }
        }
    }

    /// Release the device connection. Always succeeds; no-op when nothing
    /// is connected.
    pub fn disconnect(&mut self) {
        if self.link.take().is_some() {
            log::info!("camera disconnected");
        }
    }

    /// Read one configuration item by name.
    pub fn get_config_item(&mut self, name: &str) -> Result<ConfigItem, ControlError> {
        log::info!("get_config_item({})", name);

        self.run(|link| {
            let tree = link.fetch_config_tree().map_err(ControlError::fetch)?;
            let node = link
                .find_node(tree, name)
                .map_err(|e| ControlError::not_found(name, e))?;

            let kind = link
                .node_kind(node)
                .map_err(|e| ControlError::read_failed(name, e))?;
            let read_only = link
                .node_read_only(node)
                .map_err(|e| ControlError::read_failed(name, e))?;
            let value =
                read_value(link, node, kind).map_err(|e| ControlError::read_failed(name, e))?;
            let choices =
                collect_choices(link, node).map_err(|e| ControlError::read_failed(name, e))?;

            Ok(ConfigItem {
                value,
                choices,
                read_only,
            })
        })
    }

    /// Write one configuration item by name, taking the new value as its
    /// wire string. Two phases: mutate the in-memory node, then commit the
    /// whole tree; the caller never observes a partial commit.
    pub fn set_config_item(&mut self, name: &str, value: &str) -> Result<(), ControlError> {
        log::info!("set_config_item({}, {})", name, value);

        self.run(|link| {
            let tree = link.fetch_config_tree().map_err(ControlError::fetch)?;
            let node = link
                .find_node(tree, name)
                .map_err(|e| ControlError::not_found(name, e))?;

            let read_only = link
                .node_read_only(node)
                .map_err(|e| ControlError::read_failed(name, e))?;
            if read_only {
                return Err(ControlError::read_only(name));
            }

            let kind = link
                .node_kind(node)
                .map_err(|e| ControlError::read_failed(name, e))?;
            let native = NativeValue::parse(name, kind, value)?;

            write_value(link, node, &native).map_err(|e| ControlError::write_failed(name, e))?;
            link.commit_tree(tree).map_err(ControlError::commit_failed)
        })
    }

    /// List the names of every configuration node the device exposes.
    pub fn list_config(&mut self) -> Result<Vec<String>, ControlError> {
        log::info!("list_config()");

        self.run(|link| {
            let tree = link.fetch_config_tree().map_err(ControlError::fetch)?;
            link.list_nodes(tree).map_err(ControlError::fetch)
        })
    }

    /// Produce a single in-memory preview frame.
    ///
    /// The device must be walked into preview mode first: capture target to
    /// internal RAM, then live viewfinder, then JPEG quality. The order is
    /// fixed; the body rejects out-of-order mode changes.
    pub fn capture_preview(&mut self) -> Result<PreviewFrame, ControlError> {
        log::info!("capture_preview()");

        self.connect()?;
        let link = match self.link.as_mut() {
            Some(link) => link,
            None => return Err(missing_link()),
        };

        let outcome = run_preview_sequence(link, &self.preview);
        if let Err(err) = &outcome {
            log::error!("{}", err);
            if matches!(err, ControlError::PreviewFetchFailed { .. }) {
                // Failing to read back a file we just captured means the
                // session is beyond salvage; exit the camera outright.
                self.disconnect();
            } else if err.invalidates_session() {
                log::warn!("camera session invalidated");
                self.link = None;
            }
        }
        outcome
    }

    /// Trigger a capture to device storage. The storage path is not
    /// implemented; this only validates that the camera is reachable.
    pub fn capture_image(&mut self) -> Result<(), ControlError> {
        log::info!("capture_image()");
        self.connect()
    }

    /// Run a device-touching operation: ensure connected, execute, and tear
    /// the connection down if the failure implicates the device link.
    fn run<T>(
        &mut self,
        op: impl FnOnce(&mut P::Link) -> Result<T, ControlError>,
    ) -> Result<T, ControlError> {
        self.connect()?;
        let link = match self.link.as_mut() {
            Some(link) => link,
            None => return Err(missing_link()),
        };

        let outcome = op(link);
        if let Err(err) = &outcome {
            log::error!("{}", err);
            if err.invalidates_session() {
                log::warn!("camera session invalidated");
                self.link = None;
            }
        }
        outcome
    }
}

fn missing_link() -> ControlError {
    ControlError::connection(PortError::internal("connection handle missing after connect"))
}

fn read_value<L: DeviceLink>(
    link: &mut L,
    node: NodeHandle,
    kind: ConfigKind,
) -> Result<String, PortError> {
    let value = match kind {
        ConfigKind::Float => NativeValue::Float(link.read_float(node)?),
        ConfigKind::IntegerLike => NativeValue::Integer(link.read_integer(node)?),
        ConfigKind::StringChoice => NativeValue::Text(link.read_text(node)?),
    };
    Ok(value.render())
}

fn write_value<L: DeviceLink>(
    link: &mut L,
    node: NodeHandle,
    value: &NativeValue,
) -> Result<(), PortError> {
    match value {
        NativeValue::Float(v) => link.write_float(node, *v),
        NativeValue::Integer(v) => link.write_integer(node, *v),
        NativeValue::Text(v) => link.write_text(node, v),
    }
}

fn collect_choices<L: DeviceLink>(link: &mut L, node: NodeHandle) -> Result<Vec<String>, PortError> {
    let count = link.choice_count(node)?;
    let mut choices = Vec::with_capacity(count);
    for index in 0..count {
        choices.push(link.choice_at(node, index)?);
    }
    Ok(choices)
}

fn run_preview_sequence<L: DeviceLink>(
    link: &mut L,
    preview: &PreviewConfig,
) -> Result<PreviewFrame, ControlError> {
    let tree = link.fetch_config_tree().map_err(ControlError::fetch)?;

    // Resolve all three required nodes up front, aborting at the first
    // miss, before any of them is written.
    let capture_target = link
        .find_node(tree, CAPTURE_TARGET_NODE)
        .map_err(|e| ControlError::not_found(CAPTURE_TARGET_NODE, e))?;
    let viewfinder = link
        .find_node(tree, VIEWFINDER_NODE)
        .map_err(|e| ControlError::not_found(VIEWFINDER_NODE, e))?;
    let image_quality = link
        .find_node(tree, IMAGE_QUALITY_NODE)
        .map_err(|e| ControlError::not_found(IMAGE_QUALITY_NODE, e))?;

    link.write_text(capture_target, &preview.capture_target)
        .map_err(|e| ControlError::preview_setup(CAPTURE_TARGET_NODE, e))?;
    link.write_integer(viewfinder, VIEWFINDER_LIVE)
        .map_err(|e| ControlError::preview_setup(VIEWFINDER_NODE, e))?;
    link.write_text(image_quality, &preview.image_quality)
        .map_err(|e| ControlError::preview_setup(IMAGE_QUALITY_NODE, e))?;

    link.commit_tree(tree).map_err(ControlError::commit_failed)?;

    let location = link
        .trigger_capture(CaptureKind::Image)
        .map_err(ControlError::capture_failed)?;
    log::info!(
        "capture stored on device at {}/{}",
        location.folder,
        location.name
    );

    let data = link
        .fetch_file(&location, FileVariant::Normal)
        .map_err(ControlError::preview_fetch)?;

    Ok(PreviewFrame::new(data))
}
