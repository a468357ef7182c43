// lib.rs - Complete Production Implementation

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use capabilities::{GeolocationResult, HttpResult, KvResult};
use storage::{LocalStore, RecordStore, StorageConfig};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;

pub const MAX_REPORT_IMAGES: usize = 5;
pub const MAX_SIGHTING_IMAGES: usize = 1;
pub const WIZARD_FIRST_STEP: u8 = 1;
pub const WIZARD_FINAL_STEP: u8 = 3;
pub const WIZARD_TOTAL_STEPS: u8 = 3;
pub const ADDRESS_PREVIEW_LENGTH: usize = 30;
pub const MAX_STORED_RECORDS_PER_KIND: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Storage,
    Serialization,
    Deserialization,
    Location,
    LocationPermissionDenied,
    Submission,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Submission => "SUBMISSION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Storage | Self::Location | Self::Submission => {
                ErrorSeverity::Transient
            }

            Self::Serialization | Self::Deserialization | Self::InvalidState | Self::Internal => {
                ErrorSeverity::Fatal
            }

            Self::Validation | Self::NotFound | Self::LocationPermissionDenied | Self::Unknown => {
                ErrorSeverity::Permanent
            }
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Storage | Self::Location | Self::Submission
        )
    }

    #[must_use]
    pub const fn http_status_hint(self) -> Option<u16> {
        match self {
            Self::Validation => Some(400),
            Self::NotFound => Some(404),
            Self::Timeout => Some(408),
            Self::Internal => Some(500),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation
            | ErrorKind::Location
            | ErrorKind::LocationPermissionDenied
            | ErrorKind::Submission => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Storage => {
                "Unable to save data locally. Please free up some storage space.".into()
            }
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::InvalidState => {
                "The app is in an invalid state. Please restart the app.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// PostgREST error body. Only `message` is surfaced; the rest is kept
/// for telemetry sinks that want the raw payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please add at least one photo of your bike.")]
    MissingReportPhotos,
    #[error("Please provide your bike's color.")]
    MissingColor,
    #[error("Please provide the date your bike was stolen.")]
    MissingStolenDate,
    #[error("Please provide the location your bike was stolen from.")]
    MissingStolenLocation,
    #[error("Please provide an email or phone number so we can contact you.")]
    MissingContact,
    #[error("Please upload a photo of the bike you spotted.")]
    MissingSightingPhoto,
    #[error("Please provide the location where you spotted the bike.")]
    MissingSightingLocation,
}

impl ValidationError {
    #[must_use]
    pub const fn toast_title(self) -> &'static str {
        match self {
            Self::MissingReportPhotos => "Photos Required",
            Self::MissingColor => "Color Required",
            Self::MissingStolenDate => "Date Required",
            Self::MissingStolenLocation | Self::MissingSightingLocation => "Location Required",
            Self::MissingContact => "Contact Required",
            Self::MissingSightingPhoto => "Photo Required",
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

/// A coordinate pair that has passed range checks. Shell-supplied
/// positions go through here before touching a draft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCoordinate {
    lat: f64,
    lng: f64,
}

impl ValidatedCoordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }
}

#[must_use]
pub fn format_coordinate_pair(lat: f64, lng: f64) -> String {
    format!("{lat:.6}, {lng:.6}")
}

#[must_use]
pub fn format_gps_label(lat: f64, lng: f64) -> String {
    format!("GPS: {lat:.4}, {lng:.4}")
}

/// Clips an address for list cards. The marker is appended even when
/// nothing was clipped; card layouts expect the fixed suffix.
#[must_use]
pub fn truncate_address(address: &str) -> String {
    let preview: String = address.chars().take(ADDRESS_PREVIEW_LENGTH).collect();
    format!("{preview}...")
}

#[must_use]
pub fn format_time_ago(timestamp_ms: u64, now_ms: u64) -> String {
    if timestamp_ms > now_ms {
        return "Just now".into();
    }

    let diff_secs = now_ms.saturating_sub(timestamp_ms) / 1000;
    if diff_secs < 60 {
        return "Just now".into();
    }

    let diff_mins = diff_secs / 60;
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 30 {
        return format!("{diff_days}d ago");
    }

    let diff_months = diff_days / 30;
    if diff_months < 12 {
        return format!("{diff_months}mo ago");
    }

    format!("{}y ago", diff_months / 12)
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Empty strings persist as nulls. Whitespace is not trimmed; only the
/// truly empty string maps to `None`.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A file handle staged in a draft. The core never holds image bytes;
/// shells keep those and address them by name at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl StagedImage {
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Appends image-like candidates in pick order, then clips to `max`.
/// Earliest-staged entries win; overflow is dropped silently.
#[must_use]
pub fn stage_images(
    existing: &[StagedImage],
    candidates: Vec<StagedImage>,
    max: usize,
) -> Vec<StagedImage> {
    let mut staged = existing.to_vec();
    staged.extend(candidates.into_iter().filter(StagedImage::is_image));
    staged.truncate(max);
    staged
}

#[must_use]
pub fn remove_image_at(existing: &[StagedImage], index: usize) -> Vec<StagedImage> {
    let mut staged = existing.to_vec();
    if index < staged.len() {
        staged.remove(index);
    }
    staged
}

/// Address text plus optional device coordinates. Typing over a
/// device-resolved address keeps the coordinates, so they may go stale
/// relative to the text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationField {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationField {
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn apply_device_position(&mut self, lat: f64, lng: f64) {
        self.address = format_coordinate_pair(lat, lng);
        self.lat = Some(lat);
        self.lng = Some(lng);
    }

    #[must_use]
    pub const fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }

    #[must_use]
    pub fn gps_label(&self) -> Option<String> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(format_gps_label(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StolenReportDraft {
    pub images: Vec<StagedImage>,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub unique_features: String,
    pub stolen_date: String,
    pub stolen_location: LocationField,
    pub contact_email: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SightingDraft {
    pub images: Vec<StagedImage>,
    pub location: LocationField,
    pub notes: String,
}

/// Step gating for the stolen-report wizard. Brand, model, and unique
/// features never gate.
#[must_use]
pub fn can_proceed(draft: &StolenReportDraft, step: u8) -> bool {
    match step {
        1 => !draft.images.is_empty(),
        2 => {
            !draft.color.is_empty()
                && !draft.stolen_date.is_empty()
                && !draft.stolen_location.address.is_empty()
        }
        3 => !draft.contact_email.is_empty() || !draft.contact_phone.is_empty(),
        _ => false,
    }
}

#[must_use]
pub const fn step_label(step: u8) -> &'static str {
    match step {
        1 => "Photos",
        2 => "Details",
        3 => "Contact",
        _ => "",
    }
}

/// Full-draft validation, independent of step gating. Fields are
/// checked in the order the wizard collects them.
pub fn validate_report(draft: &StolenReportDraft) -> Result<(), ValidationError> {
    if draft.images.is_empty() {
        return Err(ValidationError::MissingReportPhotos);
    }
    if draft.color.is_empty() {
        return Err(ValidationError::MissingColor);
    }
    if draft.stolen_date.is_empty() {
        return Err(ValidationError::MissingStolenDate);
    }
    if draft.stolen_location.address.is_empty() {
        return Err(ValidationError::MissingStolenLocation);
    }
    if draft.contact_email.is_empty() && draft.contact_phone.is_empty() {
        return Err(ValidationError::MissingContact);
    }
    Ok(())
}

/// The photo check precedes the location check.
pub fn validate_sighting(draft: &SightingDraft) -> Result<(), ValidationError> {
    if draft.images.is_empty() {
        return Err(ValidationError::MissingSightingPhoto);
    }
    if draft.location.address.is_empty() {
        return Err(ValidationError::MissingSightingLocation);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

impl ReportId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SightingId(pub Uuid);

impl SightingId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SightingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-shaped stolen report row. One serde representation serves
/// both the local collection arrays and the remote table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedReport {
    pub id: ReportId,
    pub created_at_ms: u64,
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub unique_features: Option<String>,
    pub stolen_date: Option<String>,
    pub stolen_location: Option<String>,
    pub stolen_lat: Option<f64>,
    pub stolen_lng: Option<f64>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl PersistedReport {
    #[must_use]
    pub fn from_draft(draft: &StolenReportDraft) -> Self {
        Self {
            id: ReportId::generate(),
            created_at_ms: get_current_time_ms(),
            images: draft.images.iter().map(|i| i.file_name.clone()).collect(),
            brand: non_empty(&draft.brand),
            model: non_empty(&draft.model),
            color: non_empty(&draft.color),
            unique_features: non_empty(&draft.unique_features),
            stolen_date: non_empty(&draft.stolen_date),
            stolen_location: non_empty(&draft.stolen_location.address),
            stolen_lat: draft.stolen_location.lat,
            stolen_lng: draft.stolen_location.lng,
            contact_email: non_empty(&draft.contact_email),
            contact_phone: non_empty(&draft.contact_phone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSighting {
    pub id: SightingId,
    pub created_at_ms: u64,
    pub image: Option<String>,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub notes: Option<String>,
}

impl PersistedSighting {
    #[must_use]
    pub fn from_draft(draft: &SightingDraft) -> Self {
        Self {
            id: SightingId::generate(),
            created_at_ms: get_current_time_ms(),
            image: draft.images.first().map(|i| i.file_name.clone()),
            location: non_empty(&draft.location.address),
            lat: draft.location.lat,
            lng: draft.location.lng,
            notes: non_empty(&draft.notes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Landing,
    ReportStolen,
    ReportSighting,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportForm {
    Stolen,
    Sighting,
}

impl ReportForm {
    #[must_use]
    pub const fn owning_route(self) -> Route {
        match self {
            Self::Stolen => Route::ReportStolen,
            Self::Sighting => Route::ReportSighting,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stolen => "stolen_report",
            Self::Sighting => "sighting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Reports,
    Sightings,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::Sightings => "sightings",
        }
    }
}

/// Why a local read was issued: to seed the dashboard lists, or as the
/// read half of a read-modify-write insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPurpose {
    Dashboard,
    Submission,
}

/// The record riding through an in-flight insert. At most one lives in
/// the model, which serializes submissions across both forms.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingInsert {
    Report(PersistedReport),
    Sighting(PersistedSighting),
}

/// `None` means the fetch has not answered yet. A failed fetch leaves
/// an empty list so the other tab still renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub reports: Option<Vec<PersistedReport>>,
    pub sightings: Option<Vec<PersistedSighting>>,
}

impl DashboardState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.reports.is_none() || self.sightings.is_none()
    }
}

pub struct Model {
    pub route: Route,
    pub wizard_step: u8,
    pub report_draft: StolenReportDraft,
    pub sighting_draft: SightingDraft,
    pub dashboard: DashboardState,
    pub store: Box<dyn RecordStore>,
    pub pending_insert: Option<PendingInsert>,
    pub is_submitting: bool,
    pub report_locating: bool,
    pub sighting_locating: bool,
    pub active_error: Option<AppError>,
    pub active_toast: Option<ToastMessage>,
    pub view_timestamp_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            route: Route::Landing,
            wizard_step: WIZARD_FIRST_STEP,
            report_draft: StolenReportDraft::default(),
            sighting_draft: SightingDraft::default(),
            dashboard: DashboardState::default(),
            store: Box::new(LocalStore),
            pending_insert: None,
            is_submitting: false,
            report_locating: false,
            sighting_locating: false,
            active_error: None,
            active_toast: None,
            view_timestamp_ms: get_current_time_ms(),
        }
    }
}

impl Model {
    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = get_current_time_ms();
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn show_toast_with_detail(
        &mut self,
        message: impl Into<String>,
        detail: impl Into<String>,
        kind: ToastKind,
    ) {
        self.active_toast = Some(ToastMessage::new(message, kind).with_detail(detail));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    pub fn location_field_mut(&mut self, form: ReportForm) -> &mut LocationField {
        match form {
            ReportForm::Stolen => &mut self.report_draft.stolen_location,
            ReportForm::Sighting => &mut self.sighting_draft.location,
        }
    }

    pub fn set_locating(&mut self, form: ReportForm, value: bool) {
        match form {
            ReportForm::Stolen => self.report_locating = value,
            ReportForm::Sighting => self.sighting_locating = value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub detail: Option<String>,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            detail: None,
            kind,
            created_at_ms: get_current_time_ms(),
            duration_ms: kind.default_duration_ms(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.duration_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    AppStarted {
        config: StorageConfig,
    },
    NavigationRequested(Route),

    NextStepRequested,
    PreviousStepRequested,

    BrandChanged(String),
    ModelChanged(String),
    ColorChanged(String),
    UniqueFeaturesChanged(String),
    StolenDateChanged(String),
    ContactEmailChanged(String),
    ContactPhoneChanged(String),
    NotesChanged(String),

    ImagesPicked {
        form: ReportForm,
        images: Vec<StagedImage>,
    },
    ImageRemoved {
        form: ReportForm,
        index: usize,
    },

    AddressChanged {
        form: ReportForm,
        address: String,
    },
    DeviceLocationRequested {
        form: ReportForm,
    },
    DeviceLocationResult {
        form: ReportForm,
        result: Box<GeolocationResult>,
    },

    SubmitReportRequested,
    SubmitSightingRequested,

    LocalReadResponse {
        kind: RecordKind,
        purpose: ReadPurpose,
        result: Box<KvResult>,
    },
    LocalWriteResponse {
        kind: RecordKind,
        result: Box<KvResult>,
    },
    RemoteInsertResponse {
        kind: RecordKind,
        result: Box<HttpResult>,
    },
    RemoteFetchResponse {
        kind: RecordKind,
        result: Box<HttpResult>,
    },

    DismissError,
    DismissToast,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted { .. } => "app_started",
            Self::NavigationRequested(_) => "navigation_requested",
            Self::NextStepRequested => "next_step_requested",
            Self::PreviousStepRequested => "previous_step_requested",
            Self::BrandChanged(_) => "brand_changed",
            Self::ModelChanged(_) => "model_changed",
            Self::ColorChanged(_) => "color_changed",
            Self::UniqueFeaturesChanged(_) => "unique_features_changed",
            Self::StolenDateChanged(_) => "stolen_date_changed",
            Self::ContactEmailChanged(_) => "contact_email_changed",
            Self::ContactPhoneChanged(_) => "contact_phone_changed",
            Self::NotesChanged(_) => "notes_changed",
            Self::ImagesPicked { .. } => "images_picked",
            Self::ImageRemoved { .. } => "image_removed",
            Self::AddressChanged { .. } => "address_changed",
            Self::DeviceLocationRequested { .. } => "device_location_requested",
            Self::DeviceLocationResult { .. } => "device_location_result",
            Self::SubmitReportRequested => "submit_report_requested",
            Self::SubmitSightingRequested => "submit_sighting_requested",
            Self::LocalReadResponse { .. } => "local_read_response",
            Self::LocalWriteResponse { .. } => "local_write_response",
            Self::RemoteInsertResponse { .. } => "remote_insert_response",
            Self::RemoteFetchResponse { .. } => "remote_fetch_response",
            Self::DismissError => "dismiss_error",
            Self::DismissToast => "dismiss_toast",
        }
    }

    /// High-frequency typing events are deliberately excluded.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::NavigationRequested(_)
                | Self::NextStepRequested
                | Self::PreviousStepRequested
                | Self::ImagesPicked { .. }
                | Self::ImageRemoved { .. }
                | Self::DeviceLocationRequested { .. }
                | Self::SubmitReportRequested
                | Self::SubmitSightingRequested
                | Self::DismissError
                | Self::DismissToast
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LocationView {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub gps_label: Option<String>,
    pub is_locating: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReportListItem {
    pub id: String,
    pub title: String,
    pub status_label: String,
    pub stolen_date: Option<String>,
    pub location_preview: Option<String>,
    pub unique_features: Option<String>,
    pub created_at_ms: u64,
    pub time_ago: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SightingListItem {
    pub id: String,
    pub title: String,
    pub status_label: String,
    pub location_preview: Option<String>,
    pub notes: Option<String>,
    pub created_at_ms: u64,
    pub time_ago: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmptyStateView {
    pub title: String,
    pub message: String,
    pub action_label: String,
    pub action_route: Route,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Landing,
    ReportWizard {
        title: String,
        step: u8,
        step_label: String,
        total_steps: u8,
        can_proceed: bool,
        images: Vec<StagedImage>,
        at_capacity: bool,
        brand: String,
        model: String,
        color: String,
        unique_features: String,
        stolen_date: String,
        location: LocationView,
        contact_email: String,
        contact_phone: String,
        is_submitting: bool,
    },
    SightingForm {
        image: Option<StagedImage>,
        at_capacity: bool,
        location: LocationView,
        notes: String,
        can_submit: bool,
        is_submitting: bool,
    },
    Dashboard {
        title: String,
        subtitle: String,
        is_loading: bool,
        reports_tab_label: String,
        sightings_tab_label: String,
        reports: Vec<ReportListItem>,
        sightings: Vec<SightingListItem>,
        reports_empty_state: Option<EmptyStateView>,
        sightings_empty_state: Option<EmptyStateView>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToastView {
    pub message: String,
    pub detail: Option<String>,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            detail: t.detail.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub state: ViewState,
    pub error: Option<UserFacingError>,
    pub toast: Option<ToastView>,
    pub is_busy: bool,
}

pub mod app {
    use super::*;
    use crate::capabilities::GeolocationError;

    #[derive(Default)]
    pub struct App;

    impl App {
        fn enter_route(route: Route, model: &mut Model, caps: &Capabilities) {
            model.route = route;

            match route {
                Route::Landing => {}

                Route::ReportStolen => {
                    model.report_draft = StolenReportDraft::default();
                    model.wizard_step = WIZARD_FIRST_STEP;
                    model.report_locating = false;
                }

                Route::ReportSighting => {
                    model.sighting_draft = SightingDraft::default();
                    model.sighting_locating = false;
                }

                Route::Dashboard => {
                    model.dashboard = DashboardState::default();

                    if let Err(e) = model.store.fetch_reports(caps) {
                        Self::fail_fetch(RecordKind::Reports, e.into(), model, caps);
                    }
                    if let Err(e) = model.store.fetch_sightings(caps) {
                        Self::fail_fetch(RecordKind::Sightings, e.into(), model, caps);
                    }
                }
            }
        }

        fn begin_submission(form: ReportForm, model: &mut Model, caps: &Capabilities) {
            if model.is_submitting || model.pending_insert.is_some() {
                caps.telemetry()
                    .warn("submit_ignored", "submission already in flight");
                return;
            }

            let validation = match form {
                ReportForm::Stolen => validate_report(&model.report_draft),
                ReportForm::Sighting => validate_sighting(&model.sighting_draft),
            };

            if let Err(e) = validation {
                caps.telemetry()
                    .warn("submit_validation_failed", e.toast_title());
                model.show_toast_with_detail(e.toast_title(), e.to_string(), ToastKind::Error);
                model.set_error(e.into());
                return;
            }

            match form {
                ReportForm::Stolen => {
                    let record = PersistedReport::from_draft(&model.report_draft);
                    match model.store.insert_report(&record, caps) {
                        Ok(()) => {
                            model.pending_insert = Some(PendingInsert::Report(record));
                            model.is_submitting = true;
                            caps.telemetry()
                                .event("submit_started", &[("kind", RecordKind::Reports.as_str())]);
                        }
                        Err(e) => Self::fail_submission(e.into(), model, caps),
                    }
                }
                ReportForm::Sighting => {
                    let record = PersistedSighting::from_draft(&model.sighting_draft);
                    match model.store.insert_sighting(&record, caps) {
                        Ok(()) => {
                            model.pending_insert = Some(PendingInsert::Sighting(record));
                            model.is_submitting = true;
                            caps.telemetry().event(
                                "submit_started",
                                &[("kind", RecordKind::Sightings.as_str())],
                            );
                        }
                        Err(e) => Self::fail_submission(e.into(), model, caps),
                    }
                }
            }
        }

        fn complete_submission(model: &mut Model, caps: &Capabilities) {
            let pending = match model.pending_insert.take() {
                Some(pending) => pending,
                None => return,
            };

            model.is_submitting = false;

            match pending {
                PendingInsert::Report(_) => {
                    model.report_draft = StolenReportDraft::default();
                    model.wizard_step = WIZARD_FIRST_STEP;
                    model.show_toast_with_detail(
                        "Report Submitted",
                        "We'll notify you if your bike is spotted.",
                        ToastKind::Success,
                    );
                    caps.telemetry()
                        .event("submit_succeeded", &[("kind", RecordKind::Reports.as_str())]);
                }
                PendingInsert::Sighting(_) => {
                    model.sighting_draft = SightingDraft::default();
                    model.show_toast_with_detail(
                        "Sighting Reported",
                        "Thank you for helping the community!",
                        ToastKind::Success,
                    );
                    caps.telemetry().event(
                        "submit_succeeded",
                        &[("kind", RecordKind::Sightings.as_str())],
                    );
                }
            }

            Self::enter_route(Route::Dashboard, model, caps);
        }

        /// The draft is left untouched so the user can retry.
        fn fail_submission(cause: AppError, model: &mut Model, caps: &Capabilities) {
            let internal = cause.to_string();
            caps.telemetry().error("submit_failed", &internal);

            model.is_submitting = false;
            model.pending_insert = None;
            model.show_toast_with_detail(
                "Submission Failed",
                "There was an error submitting your report. Please try again.",
                ToastKind::Error,
            );
            model.set_error(
                AppError::new(
                    ErrorKind::Submission,
                    "There was an error submitting your report. Please try again.",
                )
                .with_internal(internal),
            );
        }

        /// The failed side renders as an empty list; the other tab is
        /// unaffected.
        fn fail_fetch(kind: RecordKind, error: AppError, model: &mut Model, caps: &Capabilities) {
            caps.telemetry().error("fetch_failed", kind.as_str());

            match kind {
                RecordKind::Reports => model.dashboard.reports = Some(Vec::new()),
                RecordKind::Sightings => model.dashboard.sightings = Some(Vec::new()),
            }
            model.set_error(error);
        }

        fn handle_insert_read(
            kind: RecordKind,
            result: KvResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    Self::fail_submission(
                        AppError::new(ErrorKind::Storage, "Could not read stored records")
                            .with_internal(e.to_string()),
                        model,
                        caps,
                    );
                    return;
                }
            };

            let outcome = match (kind, &model.pending_insert) {
                (RecordKind::Reports, Some(PendingInsert::Report(record))) => {
                    LocalStore::decode_reports(bytes.as_deref()).and_then(|mut records| {
                        records.push(record.clone());
                        storage::trim_to_capacity(&mut records);
                        LocalStore::write_reports(&records, caps)
                    })
                }
                (RecordKind::Sightings, Some(PendingInsert::Sighting(record))) => {
                    LocalStore::decode_sightings(bytes.as_deref()).and_then(|mut records| {
                        records.push(record.clone());
                        storage::trim_to_capacity(&mut records);
                        LocalStore::write_sightings(&records, caps)
                    })
                }
                _ => {
                    caps.telemetry().warn("insert_read_unmatched", kind.as_str());
                    return;
                }
            };

            if let Err(e) = outcome {
                Self::fail_submission(e.into(), model, caps);
            }
        }

        fn handle_dashboard_read(
            kind: RecordKind,
            result: KvResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    Self::fail_fetch(
                        kind,
                        AppError::new(ErrorKind::Storage, "Could not read stored records")
                            .with_internal(e.to_string()),
                        model,
                        caps,
                    );
                    return;
                }
            };

            match kind {
                RecordKind::Reports => match LocalStore::decode_reports(bytes.as_deref()) {
                    Ok(mut records) => {
                        records.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
                        model.dashboard.reports = Some(records);
                        caps.telemetry()
                            .event("fetch_success", &[("kind", kind.as_str())]);
                    }
                    Err(e) => Self::fail_fetch(kind, e.into(), model, caps),
                },
                RecordKind::Sightings => match LocalStore::decode_sightings(bytes.as_deref()) {
                    Ok(mut records) => {
                        records.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
                        model.dashboard.sightings = Some(records);
                        caps.telemetry()
                            .event("fetch_success", &[("kind", kind.as_str())]);
                    }
                    Err(e) => Self::fail_fetch(kind, e.into(), model, caps),
                },
            }
        }

        fn handle_write_response(
            kind: RecordKind,
            result: KvResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match result {
                Ok(_) => Self::complete_submission(model, caps),
                Err(e) => {
                    caps.telemetry().error("local_write_failed", kind.as_str());
                    Self::fail_submission(
                        AppError::new(ErrorKind::Storage, "Could not save your report")
                            .with_internal(e.to_string()),
                        model,
                        caps,
                    );
                }
            }
        }

        fn handle_remote_insert(
            kind: RecordKind,
            result: HttpResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match result {
                Ok(output) if output.is_success() => {
                    Self::complete_submission(model, caps);
                }
                Ok(output) => {
                    caps.telemetry().error(
                        "remote_insert_failed",
                        &format!("{}: {}", kind.as_str(), output.status),
                    );
                    Self::fail_submission(
                        AppError::from_http_status(output.status, output.body_slice()),
                        model,
                        caps,
                    );
                }
                Err(e) => {
                    caps.telemetry().error("remote_insert_error", &e.to_string());
                    Self::fail_submission(
                        AppError::new(ErrorKind::Network, "Network request failed")
                            .with_internal(e.to_string()),
                        model,
                        caps,
                    );
                }
            }
        }

        fn handle_remote_fetch(
            kind: RecordKind,
            result: HttpResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match result {
                Ok(output) if output.is_success() => {
                    let body = output.body_slice().unwrap_or(b"[]");
                    match kind {
                        RecordKind::Reports => {
                            match serde_json::from_slice::<Vec<PersistedReport>>(body) {
                                Ok(mut records) => {
                                    records.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
                                    model.dashboard.reports = Some(records);
                                    caps.telemetry()
                                        .event("fetch_success", &[("kind", kind.as_str())]);
                                }
                                Err(e) => Self::fail_fetch(
                                    kind,
                                    AppError::new(
                                        ErrorKind::Deserialization,
                                        "Could not read your reports",
                                    )
                                    .with_internal(e.to_string()),
                                    model,
                                    caps,
                                ),
                            }
                        }
                        RecordKind::Sightings => {
                            match serde_json::from_slice::<Vec<PersistedSighting>>(body) {
                                Ok(mut records) => {
                                    records.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
                                    model.dashboard.sightings = Some(records);
                                    caps.telemetry()
                                        .event("fetch_success", &[("kind", kind.as_str())]);
                                }
                                Err(e) => Self::fail_fetch(
                                    kind,
                                    AppError::new(
                                        ErrorKind::Deserialization,
                                        "Could not read your sightings",
                                    )
                                    .with_internal(e.to_string()),
                                    model,
                                    caps,
                                ),
                            }
                        }
                    }
                }
                Ok(output) => {
                    Self::fail_fetch(
                        kind,
                        AppError::from_http_status(output.status, output.body_slice()),
                        model,
                        caps,
                    );
                }
                Err(e) => {
                    Self::fail_fetch(
                        kind,
                        AppError::new(ErrorKind::Network, "Network request failed")
                            .with_internal(e.to_string()),
                        model,
                        caps,
                    );
                }
            }
        }

        fn handle_location_result(
            form: ReportForm,
            result: GeolocationResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            model.set_locating(form, false);

            // A resolution for a form the user has already left is dropped.
            if model.route != form.owning_route() {
                caps.telemetry().warn("location_result_stale", form.as_str());
                return;
            }

            match result {
                Ok(position) => {
                    match ValidatedCoordinate::new(position.latitude, position.longitude) {
                        Ok(coordinate) => {
                            model
                                .location_field_mut(form)
                                .apply_device_position(coordinate.lat(), coordinate.lng());
                            caps.telemetry()
                                .event("location_resolved", &[("form", form.as_str())]);
                        }
                        Err(e) => {
                            model.set_error(
                                AppError::new(
                                    ErrorKind::Location,
                                    "Unable to get your location. Please enter it manually.",
                                )
                                .with_internal(e.to_string()),
                            );
                            caps.telemetry().error("location_invalid", &e.to_string());
                        }
                    }
                }
                Err(e) => {
                    let message = if matches!(e, GeolocationError::Unsupported) {
                        "Geolocation is not supported by your browser."
                    } else {
                        "Unable to get your location. Please enter it manually."
                    };
                    let kind = if e.is_permission_denied() {
                        ErrorKind::LocationPermissionDenied
                    } else {
                        ErrorKind::Location
                    };

                    model.set_error(AppError::new(kind, message).with_internal(e.to_string()));
                    caps.telemetry().warn("location_failed", &e.to_string());
                }
            }
        }

        fn build_location_view(field: &LocationField, is_locating: bool) -> LocationView {
            LocationView {
                address: field.address.clone(),
                lat: field.lat,
                lng: field.lng,
                gps_label: field.gps_label(),
                is_locating,
            }
        }

        fn build_wizard_view(model: &Model) -> ViewState {
            let draft = &model.report_draft;

            ViewState::ReportWizard {
                title: "Report Stolen Bike".into(),
                step: model.wizard_step,
                step_label: step_label(model.wizard_step).into(),
                total_steps: WIZARD_TOTAL_STEPS,
                can_proceed: can_proceed(draft, model.wizard_step),
                images: draft.images.clone(),
                at_capacity: draft.images.len() >= MAX_REPORT_IMAGES,
                brand: draft.brand.clone(),
                model: draft.model.clone(),
                color: draft.color.clone(),
                unique_features: draft.unique_features.clone(),
                stolen_date: draft.stolen_date.clone(),
                location: Self::build_location_view(&draft.stolen_location, model.report_locating),
                contact_email: draft.contact_email.clone(),
                contact_phone: draft.contact_phone.clone(),
                is_submitting: model.is_submitting,
            }
        }

        fn build_sighting_view(model: &Model) -> ViewState {
            let draft = &model.sighting_draft;

            ViewState::SightingForm {
                image: draft.images.first().cloned(),
                at_capacity: draft.images.len() >= MAX_SIGHTING_IMAGES,
                location: Self::build_location_view(&draft.location, model.sighting_locating),
                notes: draft.notes.clone(),
                can_submit: validate_sighting(draft).is_ok(),
                is_submitting: model.is_submitting,
            }
        }

        fn report_title(record: &PersistedReport) -> String {
            match (&record.brand, &record.model) {
                (Some(brand), Some(model)) => format!("{brand} {model}"),
                _ => match &record.color {
                    Some(color) => format!("{color} Bike"),
                    None => "Bike".to_string(),
                },
            }
        }

        pub(crate) fn build_report_item(record: &PersistedReport, now_ms: u64) -> ReportListItem {
            ReportListItem {
                id: record.id.to_string(),
                title: Self::report_title(record),
                status_label: "Active".into(),
                stolen_date: record.stolen_date.clone(),
                location_preview: record.stolen_location.as_deref().map(truncate_address),
                unique_features: record.unique_features.clone(),
                created_at_ms: record.created_at_ms,
                time_ago: format_time_ago(record.created_at_ms, now_ms),
            }
        }

        pub(crate) fn build_sighting_item(
            record: &PersistedSighting,
            now_ms: u64,
        ) -> SightingListItem {
            SightingListItem {
                id: record.id.to_string(),
                title: "Bike Sighting".into(),
                status_label: "Submitted".into(),
                location_preview: record.location.as_deref().map(truncate_address),
                notes: record.notes.clone(),
                created_at_ms: record.created_at_ms,
                time_ago: format_time_ago(record.created_at_ms, now_ms),
            }
        }

        fn build_dashboard_view(model: &Model, now_ms: u64) -> ViewState {
            let reports: Vec<ReportListItem> = model
                .dashboard
                .reports
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|r| Self::build_report_item(r, now_ms))
                .collect();

            let sightings: Vec<SightingListItem> = model
                .dashboard
                .sightings
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|s| Self::build_sighting_item(s, now_ms))
                .collect();

            let reports_loaded = model.dashboard.reports.is_some();
            let sightings_loaded = model.dashboard.sightings.is_some();

            let reports_empty_state =
                (reports_loaded && reports.is_empty()).then(|| EmptyStateView {
                    title: "No Reports Yet".into(),
                    message: "You haven't reported any stolen bikes yet.".into(),
                    action_label: "Report Stolen Bike".into(),
                    action_route: Route::ReportStolen,
                });

            let sightings_empty_state =
                (sightings_loaded && sightings.is_empty()).then(|| EmptyStateView {
                    title: "No Sightings Yet".into(),
                    message: "You haven't reported any bike sightings yet.".into(),
                    action_label: "Report Sighting".into(),
                    action_route: Route::ReportSighting,
                });

            ViewState::Dashboard {
                title: "My Reports".into(),
                subtitle: "Track your submitted reports and sightings.".into(),
                is_loading: model.dashboard.is_loading(),
                reports_tab_label: format!("Stolen Bikes ({})", reports.len()),
                sightings_tab_label: format!("Sightings ({})", sightings.len()),
                reports,
                sightings,
                reports_empty_state,
                sightings_empty_state,
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            model.update_timestamp();

            if model
                .active_toast
                .as_ref()
                .is_some_and(|t| t.is_expired(model.view_timestamp_ms))
            {
                model.clear_toast();
            }

            let event_name = event.name();
            caps.telemetry().counter(&format!("event.{event_name}"), 1);

            if event.is_user_initiated() {
                caps.telemetry().event("user_action", &[("event", event_name)]);
            }

            match event {
                Event::Noop => {}

                Event::AppStarted { config } => {
                    match storage::build_store(&config) {
                        Ok(store) => {
                            caps.telemetry()
                                .event("store_configured", &[("mode", store.mode().as_str())]);
                            model.store = store;
                        }
                        Err(e) => {
                            let detail = e.to_string();
                            caps.telemetry().error("store_config_invalid", &detail);
                            model.store = Box::new(LocalStore);
                            model.set_error(e.into());
                        }
                    }

                    caps.render().render();
                }

                Event::NavigationRequested(route) => {
                    Self::enter_route(route, model, caps);
                    caps.render().render();
                }

                Event::NextStepRequested => {
                    if model.wizard_step < WIZARD_FINAL_STEP
                        && can_proceed(&model.report_draft, model.wizard_step)
                    {
                        model.wizard_step += 1;
                    }
                    caps.render().render();
                }

                Event::PreviousStepRequested => {
                    if model.wizard_step > WIZARD_FIRST_STEP {
                        model.wizard_step -= 1;
                    }
                    caps.render().render();
                }

                Event::BrandChanged(value) => {
                    model.report_draft.brand = value;
                    caps.render().render();
                }

                Event::ModelChanged(value) => {
                    model.report_draft.model = value;
                    caps.render().render();
                }

                Event::ColorChanged(value) => {
                    model.report_draft.color = value;
                    caps.render().render();
                }

                Event::UniqueFeaturesChanged(value) => {
                    model.report_draft.unique_features = value;
                    caps.render().render();
                }

                Event::StolenDateChanged(value) => {
                    model.report_draft.stolen_date = value;
                    caps.render().render();
                }

                Event::ContactEmailChanged(value) => {
                    model.report_draft.contact_email = value;
                    caps.render().render();
                }

                Event::ContactPhoneChanged(value) => {
                    model.report_draft.contact_phone = value;
                    caps.render().render();
                }

                Event::NotesChanged(value) => {
                    model.sighting_draft.notes = value;
                    caps.render().render();
                }

                Event::ImagesPicked { form, images } => {
                    match form {
                        ReportForm::Stolen => {
                            model.report_draft.images =
                                stage_images(&model.report_draft.images, images, MAX_REPORT_IMAGES);
                        }
                        ReportForm::Sighting => {
                            model.sighting_draft.images = stage_images(
                                &model.sighting_draft.images,
                                images,
                                MAX_SIGHTING_IMAGES,
                            );
                        }
                    }
                    caps.render().render();
                }

                Event::ImageRemoved { form, index } => {
                    match form {
                        ReportForm::Stolen => {
                            model.report_draft.images =
                                remove_image_at(&model.report_draft.images, index);
                        }
                        ReportForm::Sighting => {
                            model.sighting_draft.images =
                                remove_image_at(&model.sighting_draft.images, index);
                        }
                    }
                    caps.render().render();
                }

                Event::AddressChanged { form, address } => {
                    model.location_field_mut(form).set_address(address);
                    caps.render().render();
                }

                Event::DeviceLocationRequested { form } => {
                    model.set_locating(form, true);
                    caps.geolocation()
                        .current_position_simple(move |result| Event::DeviceLocationResult {
                            form,
                            result: Box::new(result),
                        });
                    caps.render().render();
                }

                Event::DeviceLocationResult { form, result } => {
                    Self::handle_location_result(form, *result, model, caps);
                    caps.render().render();
                }

                Event::SubmitReportRequested => {
                    Self::begin_submission(ReportForm::Stolen, model, caps);
                    caps.render().render();
                }

                Event::SubmitSightingRequested => {
                    Self::begin_submission(ReportForm::Sighting, model, caps);
                    caps.render().render();
                }

                Event::LocalReadResponse {
                    kind,
                    purpose,
                    result,
                } => {
                    match purpose {
                        ReadPurpose::Submission => {
                            Self::handle_insert_read(kind, *result, model, caps);
                        }
                        ReadPurpose::Dashboard => {
                            Self::handle_dashboard_read(kind, *result, model, caps);
                        }
                    }
                    caps.render().render();
                }

                Event::LocalWriteResponse { kind, result } => {
                    Self::handle_write_response(kind, *result, model, caps);
                    caps.render().render();
                }

                Event::RemoteInsertResponse { kind, result } => {
                    Self::handle_remote_insert(kind, *result, model, caps);
                    caps.render().render();
                }

                Event::RemoteFetchResponse { kind, result } => {
                    Self::handle_remote_fetch(kind, *result, model, caps);
                    caps.render().render();
                }

                Event::DismissError => {
                    model.clear_error();
                    caps.render().render();
                }

                Event::DismissToast => {
                    model.clear_toast();
                    caps.render().render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let now_ms = model.view_timestamp_ms;

            let state = match model.route {
                Route::Landing => ViewState::Landing,
                Route::ReportStolen => Self::build_wizard_view(model),
                Route::ReportSighting => Self::build_sighting_view(model),
                Route::Dashboard => Self::build_dashboard_view(model, now_ms),
            };

            ViewModel {
                state,
                error: model.active_error.as_ref().map(UserFacingError::from),
                toast: model.active_toast.as_ref().map(ToastView::from),
                is_busy: model.is_submitting
                    || (matches!(model.route, Route::Dashboard) && model.dashboard.is_loading()),
            }
        }
    }
}
