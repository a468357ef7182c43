use bikewatch_core::capabilities::{DevicePosition, GeolocationError, HttpOutput};
use bikewatch_core::storage::{RecordStore, StorageConfig, StorageMode};
use bikewatch_core::{
    App, CruxApp, Effect, Event, Model, ReadPurpose, RecordKind, ReportForm, Route, StagedImage,
    ToastKind, ViewState,
};
use crux_core::testing::AppTester;

fn image(name: &str) -> StagedImage {
    StagedImage {
        file_name: name.to_string(),
        mime_type: "image/png".to_string(),
        size_bytes: 4096,
    }
}

fn position(latitude: f64, longitude: f64) -> DevicePosition {
    DevicePosition {
        latitude,
        longitude,
        accuracy_m: Some(12.0),
        timestamp_ms: 1_700_000_000_000,
    }
}

#[test]
fn test_sighting_validation_blocks_storage_traffic() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);

    // No photo yet
    let update = app.update(Event::SubmitSightingRequested, &mut model);
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Kv(_))));
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Http(_))));

    let toast = model.active_toast.clone().unwrap();
    assert_eq!(toast.message, "Photo Required");
    assert_eq!(
        toast.detail.as_deref(),
        Some("Please upload a photo of the bike you spotted.")
    );
    assert_eq!(toast.kind, ToastKind::Error);

    // Photo staged, still no location
    let _ = app.update(
        Event::ImagesPicked {
            form: ReportForm::Sighting,
            images: vec![image("spotted.png")],
        },
        &mut model,
    );

    let update = app.update(Event::SubmitSightingRequested, &mut model);
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Kv(_))));

    let toast = model.active_toast.clone().unwrap();
    assert_eq!(toast.message, "Location Required");
    assert_eq!(
        toast.detail.as_deref(),
        Some("Please provide the location where you spotted the bike.")
    );
}

#[test]
fn test_device_location_fills_the_sighting_address() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);

    let update = app.update(
        Event::DeviceLocationRequested {
            form: ReportForm::Sighting,
        },
        &mut model,
    );
    assert!(model.sighting_locating);
    assert!(update
        .effects
        .iter()
        .any(|e| matches!(e, Effect::Geolocation(_))));

    let _ = app.update(
        Event::DeviceLocationResult {
            form: ReportForm::Sighting,
            result: Box::new(Ok(position(37.7749, -122.4194))),
        },
        &mut model,
    );

    assert!(!model.sighting_locating);
    assert_eq!(model.sighting_draft.location.address, "37.774900, -122.419400");
    assert_eq!(model.sighting_draft.location.lat, Some(37.7749));

    let vm = App.view(&model);
    match vm.state {
        ViewState::SightingForm { location, .. } => {
            assert_eq!(location.gps_label.as_deref(), Some("GPS: 37.7749, -122.4194"));
            assert!(!location.is_locating);
        }
        other => panic!("expected sighting view, got {other:?}"),
    }
}

#[test]
fn test_latest_location_resolution_wins() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);
    let _ = app.update(
        Event::DeviceLocationRequested {
            form: ReportForm::Sighting,
        },
        &mut model,
    );
    let _ = app.update(
        Event::DeviceLocationRequested {
            form: ReportForm::Sighting,
        },
        &mut model,
    );

    let _ = app.update(
        Event::DeviceLocationResult {
            form: ReportForm::Sighting,
            result: Box::new(Ok(position(37.7749, -122.4194))),
        },
        &mut model,
    );
    let _ = app.update(
        Event::DeviceLocationResult {
            form: ReportForm::Sighting,
            result: Box::new(Ok(position(40.7128, -74.006))),
        },
        &mut model,
    );

    assert_eq!(model.sighting_draft.location.address, "40.712800, -74.006000");
}

#[test]
fn test_location_failures_map_to_manual_entry_copy() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);
    let _ = app.update(
        Event::DeviceLocationRequested {
            form: ReportForm::Sighting,
        },
        &mut model,
    );
    let _ = app.update(
        Event::DeviceLocationResult {
            form: ReportForm::Sighting,
            result: Box::new(Err(GeolocationError::PermissionDenied)),
        },
        &mut model,
    );

    assert!(!model.sighting_locating);
    assert!(model.sighting_draft.location.address.is_empty());

    let vm = App.view(&model);
    let error = vm.error.unwrap();
    assert_eq!(error.error_code, "LOCATION_PERMISSION_DENIED");
    assert_eq!(
        error.message,
        "Unable to get your location. Please enter it manually."
    );

    // An unsupported shell gets its own copy
    let _ = app.update(
        Event::DeviceLocationResult {
            form: ReportForm::Sighting,
            result: Box::new(Err(GeolocationError::Unsupported)),
        },
        &mut model,
    );
    let vm = App.view(&model);
    assert_eq!(
        vm.error.unwrap().message,
        "Geolocation is not supported by your browser."
    );
}

#[test]
fn test_stale_location_result_is_dropped_after_navigation() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);
    let _ = app.update(
        Event::DeviceLocationRequested {
            form: ReportForm::Sighting,
        },
        &mut model,
    );
    let _ = app.update(Event::NavigationRequested(Route::Landing), &mut model);

    let _ = app.update(
        Event::DeviceLocationResult {
            form: ReportForm::Sighting,
            result: Box::new(Ok(position(37.7749, -122.4194))),
        },
        &mut model,
    );

    assert!(model.sighting_draft.location.address.is_empty());
    assert!(model.active_error.is_none());
}

#[test]
fn test_sighting_submission_in_local_mode() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);
    let _ = app.update(
        Event::ImagesPicked {
            form: ReportForm::Sighting,
            images: vec![image("spotted.png")],
        },
        &mut model,
    );
    let _ = app.update(
        Event::AddressChanged {
            form: ReportForm::Sighting,
            address: "Golden Gate Park".into(),
        },
        &mut model,
    );
    let _ = app.update(Event::NotesChanged("near the fountain".into()), &mut model);

    let update = app.update(Event::SubmitSightingRequested, &mut model);
    assert!(model.is_submitting);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Kv(_))));

    let update = app.update(
        Event::LocalReadResponse {
            kind: RecordKind::Sightings,
            purpose: ReadPurpose::Submission,
            result: Box::new(Ok(None)),
        },
        &mut model,
    );
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Kv(_))));

    let _ = app.update(
        Event::LocalWriteResponse {
            kind: RecordKind::Sightings,
            result: Box::new(Ok(None)),
        },
        &mut model,
    );

    assert_eq!(model.route, Route::Dashboard);
    assert!(model.sighting_draft.images.is_empty());
    assert!(model.sighting_draft.notes.is_empty());

    let toast = model.active_toast.clone().unwrap();
    assert_eq!(toast.message, "Sighting Reported");
    assert_eq!(
        toast.detail.as_deref(),
        Some("Thank you for helping the community!")
    );
    assert_eq!(toast.kind, ToastKind::Success);
}

#[test]
fn test_remote_mode_routes_traffic_through_http() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(
        Event::AppStarted {
            config: StorageConfig::remote(
                "https://example.supabase.co",
                Some("anon-key".to_string()),
            ),
        },
        &mut model,
    );
    assert_eq!(model.store.mode(), StorageMode::Remote);
    assert!(model.active_error.is_none());

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);
    let _ = app.update(
        Event::ImagesPicked {
            form: ReportForm::Sighting,
            images: vec![image("spotted.png")],
        },
        &mut model,
    );
    let _ = app.update(
        Event::AddressChanged {
            form: ReportForm::Sighting,
            address: "Golden Gate Park".into(),
        },
        &mut model,
    );

    let update = app.update(Event::SubmitSightingRequested, &mut model);
    assert!(model.is_submitting);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Kv(_))));

    // 201 Created completes the submission and lands on the dashboard
    let update = app.update(
        Event::RemoteInsertResponse {
            kind: RecordKind::Sightings,
            result: Box::new(Ok(HttpOutput {
                status: 201,
                body: None,
            })),
        },
        &mut model,
    );

    assert_eq!(model.route, Route::Dashboard);
    assert_eq!(model.active_toast.clone().unwrap().message, "Sighting Reported");
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::Kv(_))));

    // Both fetches resolve with empty tables
    let _ = app.update(
        Event::RemoteFetchResponse {
            kind: RecordKind::Reports,
            result: Box::new(Ok(HttpOutput {
                status: 200,
                body: Some(b"[]".to_vec()),
            })),
        },
        &mut model,
    );
    let _ = app.update(
        Event::RemoteFetchResponse {
            kind: RecordKind::Sightings,
            result: Box::new(Ok(HttpOutput {
                status: 200,
                body: Some(b"[]".to_vec()),
            })),
        },
        &mut model,
    );

    let vm = App.view(&model);
    match vm.state {
        ViewState::Dashboard {
            is_loading,
            reports_empty_state,
            sightings_empty_state,
            ..
        } => {
            assert!(!is_loading);
            assert!(reports_empty_state.is_some());
            assert!(sightings_empty_state.is_some());
        }
        other => panic!("expected dashboard view, got {other:?}"),
    }
}

#[test]
fn test_remote_insert_failure_preserves_the_draft() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(
        Event::AppStarted {
            config: StorageConfig::remote("https://example.supabase.co", None),
        },
        &mut model,
    );

    let _ = app.update(Event::NavigationRequested(Route::ReportSighting), &mut model);
    let _ = app.update(
        Event::ImagesPicked {
            form: ReportForm::Sighting,
            images: vec![image("spotted.png")],
        },
        &mut model,
    );
    let _ = app.update(
        Event::AddressChanged {
            form: ReportForm::Sighting,
            address: "Golden Gate Park".into(),
        },
        &mut model,
    );

    let _ = app.update(Event::SubmitSightingRequested, &mut model);

    let _ = app.update(
        Event::RemoteInsertResponse {
            kind: RecordKind::Sightings,
            result: Box::new(Ok(HttpOutput {
                status: 500,
                body: Some(br#"{"message": "database unavailable"}"#.to_vec()),
            })),
        },
        &mut model,
    );

    assert!(!model.is_submitting);
    assert!(model.pending_insert.is_none());
    assert_eq!(model.route, Route::ReportSighting);
    assert_eq!(model.sighting_draft.images.len(), 1);
    assert_eq!(model.sighting_draft.location.address, "Golden Gate Park");

    let toast = model.active_toast.clone().unwrap();
    assert_eq!(toast.message, "Submission Failed");

    let vm = App.view(&model);
    let error = vm.error.unwrap();
    assert_eq!(error.error_code, "SUBMISSION_ERROR");
    assert_eq!(
        error.message,
        "There was an error submitting your report. Please try again."
    );
}

#[test]
fn test_misconfigured_remote_falls_back_to_local() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let config = StorageConfig {
        mode: StorageMode::Remote,
        remote: None,
    };
    let _ = app.update(Event::AppStarted { config }, &mut model);

    assert_eq!(model.store.mode(), StorageMode::Local);

    let vm = App.view(&model);
    let error = vm.error.unwrap();
    assert_eq!(error.error_code, "INVALID_STATE");
}
