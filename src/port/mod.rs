//! Capability interface over the native tethering library.
//!
//! Everything the session needs from libgphoto2 is expressed through the
//! [`DevicePort`]/[`DeviceLink`] pair so the session logic stays identical
//! whether it talks to a real body (the `tether` feature) or to the
//! in-memory [`SimulatedCamera`](crate::testing::SimulatedCamera).

use crate::types::ConfigKind;
use std::fmt;

#[cfg(feature = "tether")]
pub mod gphoto;

/// Opaque handle to one fetched configuration tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHandle(pub(crate) u64);

/// Opaque handle to one resolved node inside a fetched tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub(crate) u64);

/// Device-side location of a captured file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub folder: String,
    pub name: String,
}

/// Capture flavours understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Single still image held in-camera.
    Image,
}

/// Which rendition of a device-side file to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileVariant {
    Normal,
    Thumbnail,
    Raw,
}

/// Failure reported by the native library: a numeric result code plus its
/// human-readable rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortError {
    pub code: i32,
    pub message: String,
}

impl PortError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Failure manufactured on our side of the boundary (no native code).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({})", self.message, self.code)
        }
    }
}

impl std::error::Error for PortError {}

/// Factory for live device connections.
///
/// `connect` acquires the native communication context and initializes the
/// connection handle; both are owned by the returned link, so they exist
/// and disappear together. Dropping the link releases them.
pub trait DevicePort: Send {
    type Link: DeviceLink;

    fn connect(&mut self) -> Result<Self::Link, PortError>;
}

/// One live connection to a device.
///
/// Tree and node handles are only meaningful against the link that issued
/// them and only until the next `fetch_config_tree` call.
pub trait DeviceLink: Send {
    /// Fetch the device's full configuration tree.
    fn fetch_config_tree(&mut self) -> Result<TreeHandle, PortError>;

    /// Resolve a named node within a fetched tree.
    fn find_node(&mut self, tree: TreeHandle, name: &str) -> Result<NodeHandle, PortError>;

    /// List the names of all nodes in a fetched tree, device order.
    fn list_nodes(&mut self, tree: TreeHandle) -> Result<Vec<String>, PortError>;

    /// Map the node's native type tag onto a [`ConfigKind`].
    fn node_kind(&mut self, node: NodeHandle) -> Result<ConfigKind, PortError>;

    fn node_read_only(&mut self, node: NodeHandle) -> Result<bool, PortError>;

    fn read_float(&mut self, node: NodeHandle) -> Result<f32, PortError>;
    fn read_integer(&mut self, node: NodeHandle) -> Result<i32, PortError>;
    fn read_text(&mut self, node: NodeHandle) -> Result<String, PortError>;

    /// Write into the in-memory node; nothing reaches the device until
    /// [`commit_tree`](Self::commit_tree).
    fn write_float(&mut self, node: NodeHandle, value: f32) -> Result<(), PortError>;
    fn write_integer(&mut self, node: NodeHandle, value: i32) -> Result<(), PortError>;
    fn write_text(&mut self, node: NodeHandle, value: &str) -> Result<(), PortError>;

    fn choice_count(&mut self, node: NodeHandle) -> Result<usize, PortError>;
    fn choice_at(&mut self, node: NodeHandle, index: usize) -> Result<String, PortError>;

    /// Commit the modified tree back to the device.
    fn commit_tree(&mut self, tree: TreeHandle) -> Result<(), PortError>;

    /// Trigger a capture, returning where the device stored the result.
    fn trigger_capture(&mut self, kind: CaptureKind) -> Result<FileLocation, PortError>;

    /// Fetch a device-side file's bytes.
    fn fetch_file(
        &mut self,
        location: &FileLocation,
        variant: FileVariant,
    ) -> Result<Vec<u8>, PortError>;
}
