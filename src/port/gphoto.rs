//! libgphoto2-backed implementation of the capability interface, via the
//! `gphoto2` crate. Compiled only with the `tether` feature; untethered
//! builds use [`SimulatedCamera`](crate::testing::SimulatedCamera) instead.

use crate::port::{
    CaptureKind, DeviceLink, DevicePort, FileLocation, FileVariant, NodeHandle, PortError,
    TreeHandle,
};
use crate::types::ConfigKind;
use gphoto2::{widget::Widget, Camera, Context};
use std::collections::HashMap;

fn native(err: gphoto2::Error) -> PortError {
    PortError::new(-1, err.to_string())
}

fn mismatch() -> PortError {
    PortError::new(-2, "widget type does not match the requested value shape")
}

/// Date widgets carry an i64 timestamp but the integer value shape is i32;
/// clamp rather than wrap for out-of-range dates.
fn clamp_timestamp(timestamp: i64) -> i32 {
    timestamp.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Factory for autodetected camera connections.
#[derive(Debug, Default)]
pub struct TetherPort;

impl TetherPort {
    pub fn new() -> Self {
        Self
    }
}

impl DevicePort for TetherPort {
    type Link = TetherLink;

    fn connect(&mut self) -> Result<TetherLink, PortError> {
        let context = Context::new().map_err(native)?;
        let camera = context.autodetect_camera().wait().map_err(native)?;
        Ok(TetherLink {
            context,
            camera,
            widgets: HashMap::new(),
            touched: Vec::new(),
            next_token: 1,
        })
    }
}

/// Context plus camera handle; both live and die with this value.
pub struct TetherLink {
    context: Context,
    camera: Camera,
    widgets: HashMap<u64, Widget>,
    touched: Vec<u64>,
    next_token: u64,
}

impl TetherLink {
    fn store(&mut self, widget: Widget) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.widgets.insert(token, widget);
        token
    }

    fn widget(&self, node: NodeHandle) -> Result<&Widget, PortError> {
        self.widgets
            .get(&node.0)
            .ok_or_else(|| PortError::internal("stale widget handle"))
    }

    fn mark_touched(&mut self, node: NodeHandle) {
        if !self.touched.contains(&node.0) {
            self.touched.push(node.0);
        }
    }
}

impl DeviceLink for TetherLink {
    fn fetch_config_tree(&mut self) -> Result<TreeHandle, PortError> {
        // A fresh fetch invalidates all handles from the previous tree.
        self.widgets.clear();
        self.touched.clear();
        let root = self.camera.config().wait().map_err(native)?;
        Ok(TreeHandle(self.store(root)))
    }

    fn find_node(&mut self, _tree: TreeHandle, name: &str) -> Result<NodeHandle, PortError> {
        let widget = self
            .camera
            .config_key::<Widget>(name)
            .wait()
            .map_err(native)?;
        Ok(NodeHandle(self.store(widget)))
    }

    fn list_nodes(&mut self, tree: TreeHandle) -> Result<Vec<String>, PortError> {
        match self.widget(NodeHandle(tree.0))? {
            Widget::Group(group) => Ok(group.children_iter().map(|child| child.name()).collect()),
            _ => Err(PortError::internal("config root is not a group widget")),
        }
    }

    fn node_kind(&mut self, node: NodeHandle) -> Result<ConfigKind, PortError> {
        Ok(match self.widget(node)? {
            Widget::Range(_) => ConfigKind::Float,
            Widget::Toggle(_) | Widget::Date(_) => ConfigKind::IntegerLike,
            _ => ConfigKind::StringChoice,
        })
    }

    fn node_read_only(&mut self, node: NodeHandle) -> Result<bool, PortError> {
        Ok(match self.widget(node)? {
            Widget::Group(w) => w.readonly(),
            Widget::Text(w) => w.readonly(),
            Widget::Range(w) => w.readonly(),
            Widget::Toggle(w) => w.readonly(),
            Widget::Radio(w) => w.readonly(),
            Widget::Button(w) => w.readonly(),
            Widget::Date(w) => w.readonly(),
        })
    }

    fn read_float(&mut self, node: NodeHandle) -> Result<f32, PortError> {
        match self.widget(node)? {
            Widget::Range(w) => Ok(w.value()),
            _ => Err(mismatch()),
        }
    }

    fn read_integer(&mut self, node: NodeHandle) -> Result<i32, PortError> {
        match self.widget(node)? {
            Widget::Toggle(w) => Ok(w.toggled().map(i32::from).unwrap_or(0)),
            Widget::Date(w) => Ok(clamp_timestamp(w.timestamp())),
            _ => Err(mismatch()),
        }
    }

    fn read_text(&mut self, node: NodeHandle) -> Result<String, PortError> {
        match self.widget(node)? {
            Widget::Text(w) => Ok(w.value()),
            Widget::Radio(w) => Ok(w.choice()),
            _ => Err(mismatch()),
        }
    }

    fn write_float(&mut self, node: NodeHandle, value: f32) -> Result<(), PortError> {
        match self.widget(node)? {
            Widget::Range(w) => w.set_value(value).map_err(native)?,
            _ => return Err(mismatch()),
        }
        self.mark_touched(node);
        Ok(())
    }

    fn write_integer(&mut self, node: NodeHandle, value: i32) -> Result<(), PortError> {
        match self.widget(node)? {
            Widget::Toggle(w) => w.set_toggled(value != 0),
            // Date fields read as integers but the library offers no
            // reliable timestamp write; refuse instead of corrupting.
            Widget::Date(_) => return Err(PortError::internal("date widgets cannot be written")),
            _ => return Err(mismatch()),
        }
        self.mark_touched(node);
        Ok(())
    }

    fn write_text(&mut self, node: NodeHandle, value: &str) -> Result<(), PortError> {
        match self.widget(node)? {
            Widget::Text(w) => w.set_value(value).map_err(native)?,
            Widget::Radio(w) => w.set_choice(value).map_err(native)?,
            _ => return Err(mismatch()),
        }
        self.mark_touched(node);
        Ok(())
    }

    fn choice_count(&mut self, node: NodeHandle) -> Result<usize, PortError> {
        Ok(match self.widget(node)? {
            Widget::Radio(w) => w.choices_iter().count(),
            _ => 0,
        })
    }

    fn choice_at(&mut self, node: NodeHandle, index: usize) -> Result<String, PortError> {
        match self.widget(node)? {
            Widget::Radio(w) => w
                .choices_iter()
                .nth(index)
                .ok_or_else(|| PortError::new(-2, "choice index out of range")),
            _ => Err(mismatch()),
        }
    }

    fn commit_tree(&mut self, _tree: TreeHandle) -> Result<(), PortError> {
        // The library commits per widget; replay the touched widgets in
        // write order so the device sees the same sequence.
        let touched = std::mem::take(&mut self.touched);
        for token in touched {
            let widget = self
                .widgets
                .get(&token)
                .ok_or_else(|| PortError::internal("stale widget handle"))?;
            let committed = match widget {
                Widget::Text(w) => self.camera.set_config(w).wait(),
                Widget::Range(w) => self.camera.set_config(w).wait(),
                Widget::Toggle(w) => self.camera.set_config(w).wait(),
                Widget::Radio(w) => self.camera.set_config(w).wait(),
                Widget::Date(w) => self.camera.set_config(w).wait(),
                Widget::Group(w) => self.camera.set_config(w).wait(),
                Widget::Button(w) => self.camera.set_config(w).wait(),
            };
            committed.map_err(native)?;
        }
        Ok(())
    }

    fn trigger_capture(&mut self, kind: CaptureKind) -> Result<FileLocation, PortError> {
        let CaptureKind::Image = kind;
        let path = self.camera.capture_image().wait().map_err(native)?;
        Ok(FileLocation {
            folder: path.folder().to_string(),
            name: path.name().to_string(),
        })
    }

    fn fetch_file(
        &mut self,
        location: &FileLocation,
        variant: FileVariant,
    ) -> Result<Vec<u8>, PortError> {
        if variant != FileVariant::Normal {
            return Err(PortError::internal(
                "only the normal file variant is supported by this backend",
            ));
        }
        let file = self
            .camera
            .fs()
            .download(&location.folder, &location.name)
            .wait()
            .map_err(native)?;
        let data = file.get_data(&self.context).wait().map_err(native)?;
        Ok(data.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_timestamps_saturate_instead_of_wrapping() {
        assert_eq!(clamp_timestamp(0), 0);
        assert_eq!(clamp_timestamp(1_700_000_000), 1_700_000_000);
        assert_eq!(clamp_timestamp(i64::from(i32::MAX) + 1), i32::MAX);
        assert_eq!(clamp_timestamp(i64::from(i32::MIN) - 1), i32::MIN);
    }
}
