//! An in-memory stand-in for a tethered body.
//!
//! Implements the full [`DevicePort`]/[`DeviceLink`] surface against a
//! fixture tree modeled on a Nikon D90, with one-shot failure injection
//! per call site and probe counters, so session behavior can be exercised
//! without hardware.

use crate::port::{
    CaptureKind, DeviceLink, DevicePort, FileLocation, FileVariant, NodeHandle, PortError,
    TreeHandle,
};
use crate::types::{ConfigKind, NativeValue};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Call sites where a native failure can be injected (one-shot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailSite {
    Connect,
    FetchTree,
    ReadValue,
    WriteValue,
    Commit,
    Capture,
    FileFetch,
}

/// One write observed by the simulator, with the value already rendered to
/// its wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub node: String,
    pub value: String,
}

#[derive(Debug, Clone)]
struct SimNode {
    kind: ConfigKind,
    read_only: bool,
    value: NativeValue,
    choices: Vec<String>,
}

struct SimState {
    order: Vec<String>,
    nodes: HashMap<String, SimNode>,
    staged: Vec<(String, NativeValue)>,
    fail: HashSet<FailSite>,
    connects: u64,
    releases: u64,
    commits: u64,
    writes: Vec<WriteRecord>,
    file_payload: Vec<u8>,
    node_tokens: HashMap<u64, String>,
    next_token: u64,
}

impl SimState {
    fn trip(&mut self, site: FailSite, code: i32, message: &str) -> Result<(), PortError> {
        if self.fail.remove(&site) {
            Err(PortError::new(code, message))
        } else {
            Ok(())
        }
    }

    fn node_name(&self, node: NodeHandle) -> Result<String, PortError> {
        self.node_tokens
            .get(&node.0)
            .cloned()
            .ok_or_else(|| PortError::internal("stale node handle"))
    }

    fn node(&self, name: &str) -> Result<&SimNode, PortError> {
        self.nodes
            .get(name)
            .ok_or_else(|| PortError::new(-2, "Bad parameters"))
    }

    fn stage(&mut self, node: NodeHandle, value: NativeValue) -> Result<(), PortError> {
        self.trip(FailSite::WriteValue, -1, "Unspecified error")?;
        let name = self.node_name(node)?;
        let existing = self.node(&name)?;

        let compatible = matches!(
            (&existing.value, &value),
            (NativeValue::Float(_), NativeValue::Float(_))
                | (NativeValue::Integer(_), NativeValue::Integer(_))
                | (NativeValue::Text(_), NativeValue::Text(_))
        );
        if !compatible {
            return Err(PortError::new(-2, "Bad parameters"));
        }
        if let NativeValue::Text(text) = &value {
            if !existing.choices.is_empty() && !existing.choices.iter().any(|c| c == text) {
                return Err(PortError::new(-2, "Bad parameters"));
            }
        }

        self.writes.push(WriteRecord {
            node: name.clone(),
            value: value.render(),
        });
        self.staged.push((name, value));
        Ok(())
    }
}

/// Cloneable handle to the simulated body. Clones share state, so a clone
/// kept by a test keeps its probes readable after the simulator has been
/// moved into a session.
#[derive(Clone)]
pub struct SimulatedCamera {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    /// Simulator with the default fixture tree.
    pub fn new() -> Self {
        let sim = Self::empty();
        sim.insert_node("iso", ConfigKind::IntegerLike, NativeValue::Integer(400), false, &[]);
        sim.insert_node(
            "shutterspeed",
            ConfigKind::Float,
            NativeValue::Float(0.005),
            false,
            &[],
        );
        sim.insert_node(
            "exposurecompensation",
            ConfigKind::Float,
            NativeValue::Float(0.0),
            false,
            &[],
        );
        sim.insert_node(
            "whitebalance",
            ConfigKind::StringChoice,
            NativeValue::Text("Auto".to_string()),
            true,
            &["Auto", "Daylight", "Cloudy", "Tungsten"],
        );
        sim.insert_node(
            "imagequality",
            ConfigKind::StringChoice,
            NativeValue::Text("JPEG Fine".to_string()),
            false,
            &["JPEG Basic", "JPEG Normal", "JPEG Fine", "NEF (Raw)"],
        );
        sim.insert_node(
            "capturetarget",
            ConfigKind::StringChoice,
            NativeValue::Text("Memory card".to_string()),
            false,
            &["Internal RAM", "Memory card"],
        );
        sim.insert_node(
            "viewfinder",
            ConfigKind::IntegerLike,
            NativeValue::Integer(1),
            false,
            &[],
        );
        sim.insert_node(
            "focusmode",
            ConfigKind::StringChoice,
            NativeValue::Text("AF-S".to_string()),
            false,
            &["AF-S", "AF-C", "MF"],
        );
        sim.insert_node(
            "burstnumber",
            ConfigKind::IntegerLike,
            NativeValue::Integer(1),
            false,
            &[],
        );
        sim.insert_node(
            "artist",
            ConfigKind::StringChoice,
            NativeValue::Text(String::new()),
            false,
            &[],
        );
        sim
    }

    /// Simulator with no configuration nodes at all.
    pub fn empty() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                order: Vec::new(),
                nodes: HashMap::new(),
                staged: Vec::new(),
                fail: HashSet::new(),
                connects: 0,
                releases: 0,
                commits: 0,
                writes: Vec::new(),
                file_payload: default_jpeg(),
                node_tokens: HashMap::new(),
                next_token: 1,
            })),
        }
    }

    pub fn insert_node(
        &self,
        name: &str,
        kind: ConfigKind,
        value: NativeValue,
        read_only: bool,
        choices: &[&str],
    ) {
        let mut state = self.lock();
        if !state.nodes.contains_key(name) {
            state.order.push(name.to_string());
        }
        state.nodes.insert(
            name.to_string(),
            SimNode {
                kind,
                read_only,
                value,
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        );
    }

    pub fn remove_node(&self, name: &str) {
        let mut state = self.lock();
        state.order.retain(|n| n != name);
        state.nodes.remove(name);
    }

    /// Make the next call at `site` fail with a native-looking error.
    pub fn fail_next(&self, site: FailSite) {
        self.lock().fail.insert(site);
    }

    /// Bytes handed back for the captured preview file.
    pub fn set_file_payload(&self, payload: Vec<u8>) {
        self.lock().file_payload = payload;
    }

    pub fn connect_count(&self) -> u64 {
        self.lock().connects
    }

    pub fn release_count(&self) -> u64 {
        self.lock().releases
    }

    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }

    /// All writes seen so far, in order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Committed value of a node, rendered to its wire string.
    pub fn committed_value(&self, name: &str) -> Option<String> {
        self.lock().nodes.get(name).map(|n| n.value.render())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().expect("simulator state lock poisoned")
    }
}

impl DevicePort for SimulatedCamera {
    type Link = SimLink;

    fn connect(&mut self) -> Result<SimLink, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::Connect, -105, "Unknown model")?;
        state.connects += 1;
        Ok(SimLink {
            state: self.state.clone(),
        })
    }
}

/// Live connection to the simulator; releases itself on drop.
pub struct SimLink {
    state: Arc<Mutex<SimState>>,
}

impl SimLink {
    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().expect("simulator state lock poisoned")
    }
}

impl Drop for SimLink {
    fn drop(&mut self) {
        self.lock().releases += 1;
    }
}

impl DeviceLink for SimLink {
    fn fetch_config_tree(&mut self) -> Result<TreeHandle, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::FetchTree, -1, "Unspecified error")?;
        state.staged.clear();
        let token = state.next_token;
        state.next_token += 1;
        Ok(TreeHandle(token))
    }

    fn find_node(&mut self, _tree: TreeHandle, name: &str) -> Result<NodeHandle, PortError> {
        let mut state = self.lock();
        if !state.nodes.contains_key(name) {
            return Err(PortError::new(-2, "Bad parameters"));
        }
        let token = state.next_token;
        state.next_token += 1;
        state.node_tokens.insert(token, name.to_string());
        Ok(NodeHandle(token))
    }

    fn list_nodes(&mut self, _tree: TreeHandle) -> Result<Vec<String>, PortError> {
        Ok(self.lock().order.clone())
    }

    fn node_kind(&mut self, node: NodeHandle) -> Result<ConfigKind, PortError> {
        let state = self.lock();
        let name = state.node_name(node)?;
        Ok(state.node(&name)?.kind)
    }

    fn node_read_only(&mut self, node: NodeHandle) -> Result<bool, PortError> {
        let state = self.lock();
        let name = state.node_name(node)?;
        Ok(state.node(&name)?.read_only)
    }

    fn read_float(&mut self, node: NodeHandle) -> Result<f32, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::ReadValue, -1, "Unspecified error")?;
        let name = state.node_name(node)?;
        match &state.node(&name)?.value {
            NativeValue::Float(v) => Ok(*v),
            _ => Err(PortError::new(-2, "Bad parameters")),
        }
    }

    fn read_integer(&mut self, node: NodeHandle) -> Result<i32, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::ReadValue, -1, "Unspecified error")?;
        let name = state.node_name(node)?;
        match &state.node(&name)?.value {
            NativeValue::Integer(v) => Ok(*v),
            _ => Err(PortError::new(-2, "Bad parameters")),
        }
    }

    fn read_text(&mut self, node: NodeHandle) -> Result<String, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::ReadValue, -1, "Unspecified error")?;
        let name = state.node_name(node)?;
        match &state.node(&name)?.value {
            NativeValue::Text(v) => Ok(v.clone()),
            _ => Err(PortError::new(-2, "Bad parameters")),
        }
    }

    fn write_float(&mut self, node: NodeHandle, value: f32) -> Result<(), PortError> {
        self.lock().stage(node, NativeValue::Float(value))
    }

    fn write_integer(&mut self, node: NodeHandle, value: i32) -> Result<(), PortError> {
        self.lock().stage(node, NativeValue::Integer(value))
    }

    fn write_text(&mut self, node: NodeHandle, value: &str) -> Result<(), PortError> {
        self.lock().stage(node, NativeValue::Text(value.to_string()))
    }

    fn choice_count(&mut self, node: NodeHandle) -> Result<usize, PortError> {
        let state = self.lock();
        let name = state.node_name(node)?;
        Ok(state.node(&name)?.choices.len())
    }

    fn choice_at(&mut self, node: NodeHandle, index: usize) -> Result<String, PortError> {
        let state = self.lock();
        let name = state.node_name(node)?;
        state
            .node(&name)?
            .choices
            .get(index)
            .cloned()
            .ok_or_else(|| PortError::new(-2, "Bad parameters"))
    }

    fn commit_tree(&mut self, _tree: TreeHandle) -> Result<(), PortError> {
        let mut state = self.lock();
        if let Err(e) = state.trip(FailSite::Commit, -1, "Unspecified error") {
            state.staged.clear();
            return Err(e);
        }
        state.commits += 1;
        let staged = std::mem::take(&mut state.staged);
        for (name, value) in staged {
            if let Some(node) = state.nodes.get_mut(&name) {
                node.value = value;
            }
        }
        Ok(())
    }

    fn trigger_capture(&mut self, _kind: CaptureKind) -> Result<FileLocation, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::Capture, -1, "Unspecified error")?;
        Ok(FileLocation {
            folder: "/store_00010001/DCIM/100NCD90".to_string(),
            name: "DSC_0001.JPG".to_string(),
        })
    }

    fn fetch_file(
        &mut self,
        _location: &FileLocation,
        _variant: FileVariant,
    ) -> Result<Vec<u8>, PortError> {
        let mut state = self.lock();
        state.trip(FailSite::FileFetch, -1, "Unspecified error")?;
        Ok(state.file_payload.clone())
    }
}

/// A minimal but structurally valid JPEG payload.
fn default_jpeg() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend(std::iter::repeat(0x42).take(58));
    bytes.extend([0xFF, 0xD9]);
    bytes
}
