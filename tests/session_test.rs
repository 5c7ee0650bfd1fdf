//! End-to-end session behavior against the simulated camera: typed config
//! round trips, readonly and parse rejection, connection invalidation and
//! the preview sequence.

use proptest::prelude::*;
use tethercam::session::CameraSession;
use tethercam::testing::{FailSite, SimulatedCamera};
use tethercam::ControlError;

fn session_with_probe() -> (CameraSession<SimulatedCamera>, SimulatedCamera) {
    let sim = SimulatedCamera::new();
    let probe = sim.clone();
    (CameraSession::new(sim), probe)
}

#[test]
fn integer_config_round_trips_as_wire_strings() {
    let (mut session, _probe) = session_with_probe();

    let item = session.get_config_item("iso").unwrap();
    assert_eq!(item.value, "400");
    assert!(item.choices.is_empty());
    assert!(!item.read_only);

    session.set_config_item("iso", "800").unwrap();
    assert_eq!(session.get_config_item("iso").unwrap().value, "800");
}

#[test]
fn float_config_round_trips_as_wire_strings() {
    let (mut session, _probe) = session_with_probe();

    assert_eq!(session.get_config_item("shutterspeed").unwrap().value, "0.005");

    session.set_config_item("shutterspeed", "0.008").unwrap();
    assert_eq!(session.get_config_item("shutterspeed").unwrap().value, "0.008");
}

#[test]
fn choice_config_reports_the_full_choice_list() {
    let (mut session, _probe) = session_with_probe();

    let item = session.get_config_item("imagequality").unwrap();
    assert_eq!(item.value, "JPEG Fine");
    assert_eq!(
        item.choices,
        vec!["JPEG Basic", "JPEG Normal", "JPEG Fine", "NEF (Raw)"]
    );
}

#[test]
fn empty_string_is_a_legitimate_text_value() {
    let (mut session, _probe) = session_with_probe();

    let item = session.get_config_item("artist").unwrap();
    assert_eq!(item.value, "");
    assert!(!item.read_only);

    session.set_config_item("artist", "A. Adams").unwrap();
    session.set_config_item("artist", "").unwrap();
    assert_eq!(session.get_config_item("artist").unwrap().value, "");
}

#[test]
fn readonly_rejection_keeps_the_connection() {
    let (mut session, probe) = session_with_probe();

    let err = session.set_config_item("whitebalance", "Daylight").unwrap_err();
    assert!(matches!(err, ControlError::ReadOnlyViolation { .. }));
    assert!(err.to_string().contains("readonly"));

    // No reconnect and no write reached the device.
    assert!(session.is_connected());
    assert!(probe.writes().is_empty());
    assert_eq!(probe.committed_value("whitebalance").unwrap(), "Auto");

    session.get_config_item("whitebalance").unwrap();
    assert_eq!(probe.connect_count(), 1);
}

#[test]
fn unparseable_value_keeps_the_connection() {
    let (mut session, probe) = session_with_probe();

    let err = session.set_config_item("iso", "fast").unwrap_err();
    assert!(matches!(err, ControlError::ValueFormatError { .. }));
    assert!(session.is_connected());
    assert!(probe.writes().is_empty());

    session.set_config_item("iso", "200").unwrap();
    assert_eq!(probe.connect_count(), 1);
}

#[test]
fn unknown_node_reports_not_found() {
    let (mut session, _probe) = session_with_probe();

    let err = session.get_config_item("bulbmode").unwrap_err();
    assert!(matches!(err, ControlError::ConfigNotFound { .. }));
    assert!(err.to_string().contains("bulbmode"));
}

#[test]
fn device_error_forces_a_reconnect_on_the_next_operation() {
    let (mut session, probe) = session_with_probe();

    session.get_config_item("iso").unwrap();
    assert_eq!(probe.connect_count(), 1);

    probe.fail_next(FailSite::FetchTree);
    assert!(session.get_config_item("iso").is_err());
    assert!(!session.is_connected());

    session.get_config_item("iso").unwrap();
    assert_eq!(probe.connect_count(), 2);
}

#[test]
fn failed_commit_leaves_the_old_value_and_invalidates() {
    let (mut session, probe) = session_with_probe();

    probe.fail_next(FailSite::Commit);
    let err = session.set_config_item("iso", "1600").unwrap_err();
    assert!(matches!(err, ControlError::ConfigCommitFailed { .. }));
    assert_eq!(probe.committed_value("iso").unwrap(), "400");
    assert!(!session.is_connected());
}

#[test]
fn failed_value_write_invalidates_the_set_path() {
    let (mut session, probe) = session_with_probe();

    probe.fail_next(FailSite::WriteValue);
    let err = session.set_config_item("iso", "800").unwrap_err();
    assert!(matches!(err, ControlError::ConfigWriteFailed { .. }));
    assert!(err.to_string().contains("iso"));
    assert!(!session.is_connected());
    assert_eq!(probe.committed_value("iso").unwrap(), "400");

    session.set_config_item("iso", "800").unwrap();
    assert_eq!(probe.connect_count(), 2);
}

#[test]
fn failed_read_invalidates_but_recovers() {
    let (mut session, probe) = session_with_probe();

    probe.fail_next(FailSite::ReadValue);
    assert!(session.get_config_item("iso").is_err());
    assert!(!session.is_connected());

    assert_eq!(session.get_config_item("iso").unwrap().value, "400");
    assert_eq!(probe.connect_count(), 2);
}

#[test]
fn connect_failure_surfaces_the_native_result() {
    let (mut session, probe) = session_with_probe();

    probe.fail_next(FailSite::Connect);
    let err = session.get_config_item("iso").unwrap_err();
    assert!(err.to_string().contains("Unable to connect to camera"));
    assert!(err.to_string().contains("Unknown model"));
    assert!(!session.is_connected());
}

#[test]
fn list_config_names_every_node() {
    let (mut session, _probe) = session_with_probe();

    let names = session.list_config().unwrap();
    assert!(names.contains(&"iso".to_string()));
    assert!(names.contains(&"viewfinder".to_string()));
    assert!(names.contains(&"capturetarget".to_string()));
}

#[test]
fn preview_walks_the_device_in_the_required_order() {
    let (mut session, probe) = session_with_probe();

    let frame = session.capture_preview().unwrap();
    assert_eq!(frame.size, frame.data.len());
    assert_eq!(&frame.data[..2], &[0xFF, 0xD8]);

    let writes = probe.writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0].node, "capturetarget");
    assert_eq!(writes[0].value, "Internal RAM");
    assert_eq!(writes[1].node, "viewfinder");
    assert_eq!(writes[1].value, "0");
    assert_eq!(writes[2].node, "imagequality");
    assert_eq!(writes[2].value, "JPEG Normal");

    // One commit for the whole setup, not one per node.
    assert_eq!(probe.commit_count(), 1);
    assert!(session.is_connected());
}

#[test]
fn preview_frame_carries_the_exact_payload() {
    let (mut session, probe) = session_with_probe();
    probe.set_file_payload(vec![0xAB; 5000]);

    let frame = session.capture_preview().unwrap();
    assert_eq!(frame.size, 5000);
    assert_eq!(frame.data.len(), 5000);
}

#[test]
fn preview_aborts_before_writing_when_a_node_is_missing() {
    let (mut session, probe) = session_with_probe();
    probe.remove_node("viewfinder");

    let err = session.capture_preview().unwrap_err();
    assert!(matches!(err, ControlError::ConfigNotFound { .. }));
    assert!(err.to_string().contains("viewfinder"));

    // Nothing was written: the capture target node exists but the sequence
    // resolves all three nodes before touching any of them.
    assert!(probe.writes().is_empty());
    assert_eq!(probe.commit_count(), 0);
}

#[test]
fn preview_setup_write_failure_names_the_node_and_invalidates() {
    let (mut session, probe) = session_with_probe();

    // The capture target is the first node the sequence writes, so an
    // injected write failure surfaces under its name.
    probe.fail_next(FailSite::WriteValue);
    let err = session.capture_preview().unwrap_err();
    assert!(matches!(err, ControlError::PreviewSetupFailed { .. }));
    assert!(err.to_string().contains("capturetarget"));
    assert!(!session.is_connected());

    session.capture_preview().unwrap();
    assert_eq!(probe.connect_count(), 2);
}

#[test]
fn preview_capture_failure_invalidates_the_session() {
    let (mut session, probe) = session_with_probe();

    probe.fail_next(FailSite::Capture);
    let err = session.capture_preview().unwrap_err();
    assert!(matches!(err, ControlError::CaptureFailed { .. }));
    assert!(!session.is_connected());

    session.capture_preview().unwrap();
    assert_eq!(probe.connect_count(), 2);
}

#[test]
fn preview_fetch_failure_releases_the_camera_outright() {
    let (mut session, probe) = session_with_probe();

    probe.fail_next(FailSite::FileFetch);
    let err = session.capture_preview().unwrap_err();
    assert!(matches!(err, ControlError::PreviewFetchFailed { .. }));
    assert!(!session.is_connected());
    assert_eq!(probe.release_count(), 1);

    // Recovery is the caller's next call, which reconnects transparently.
    session.capture_preview().unwrap();
    assert_eq!(probe.connect_count(), 2);
}

proptest! {
    #[test]
    fn float_values_survive_a_set_get_cycle(value in -5.0f32..5.0f32) {
        let (mut session, _probe) = session_with_probe();

        session
            .set_config_item("exposurecompensation", &value.to_string())
            .unwrap();
        let read: f32 = session
            .get_config_item("exposurecompensation")
            .unwrap()
            .value
            .parse()
            .unwrap();
        prop_assert!((read - value).abs() < 1e-6);
    }

    #[test]
    fn integer_values_survive_a_set_get_cycle(value in 0i32..=25_600) {
        let (mut session, _probe) = session_with_probe();

        session.set_config_item("iso", &value.to_string()).unwrap();
        prop_assert_eq!(session.get_config_item("iso").unwrap().value, value.to_string());
    }
}
