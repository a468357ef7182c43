//! Record persistence behind an injectable repository seam.
//!
//! The submission pipeline and the dashboard talk to a `RecordStore`
//! chosen from `StorageConfig` at startup: either the local key-value
//! backend or the remote collaborator. Both stores speak the same
//! serde record shapes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::capabilities::http;
use crate::capabilities::kv::{
    decode_collection, encode_collection, REPORTS_STORE_KEY, SIGHTINGS_STORE_KEY,
};
use crate::capabilities::{Capabilities, HttpHeaders, UrlError, ValidatedUrl};
use crate::capabilities::{HeaderError, KvCodecError};
use crate::{
    AppError, ErrorKind, Event, PersistedReport, PersistedSighting, ReadPurpose, RecordKind,
    MAX_STORED_RECORDS_PER_KIND,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    #[default]
    Local,
    Remote,
}

impl StorageMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    pub mode: StorageMode,
    pub remote: Option<RemoteConfig>,
}

impl StorageConfig {
    #[must_use]
    pub const fn local() -> Self {
        Self {
            mode: StorageMode::Local,
            remote: None,
        }
    }

    #[must_use]
    pub fn remote(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            mode: StorageMode::Remote,
            remote: Some(RemoteConfig {
                base_url: base_url.into(),
                api_key,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Remote storage mode requires a remote configuration")]
    MissingRemoteConfig,
    #[error(transparent)]
    InvalidRemoteUrl(#[from] UrlError),
    #[error(transparent)]
    InvalidApiKey(#[from] HeaderError),
    #[error(transparent)]
    Codec(#[from] KvCodecError),
    #[error("Failed to encode record for transport: {message}")]
    Serialization { message: String },
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingRemoteConfig => {
                AppError::new(ErrorKind::InvalidState, "Remote storage is not configured")
            }
            StoreError::InvalidRemoteUrl(inner) => {
                AppError::new(ErrorKind::Validation, inner.to_string())
            }
            StoreError::InvalidApiKey(inner) => {
                AppError::new(ErrorKind::Validation, inner.to_string())
            }
            StoreError::Codec(KvCodecError::Serialization { message }) => {
                AppError::new(ErrorKind::Serialization, "Could not encode stored records")
                    .with_internal(message)
            }
            StoreError::Codec(KvCodecError::Deserialization { message }) => {
                AppError::new(ErrorKind::Deserialization, "Could not read stored records")
                    .with_internal(message)
            }
            StoreError::Codec(inner @ KvCodecError::ValueTooLarge { .. }) => {
                AppError::new(ErrorKind::Storage, "Local storage is full")
                    .with_internal(inner.to_string())
            }
            StoreError::Serialization { message } => {
                AppError::new(ErrorKind::Serialization, "Could not encode the record")
                    .with_internal(message)
            }
        }
    }
}

/// The repository seam. Implementations issue capability effects; the
/// resulting events are handled by the update loop.
pub trait RecordStore: Send + Sync {
    fn mode(&self) -> StorageMode;
    fn insert_report(&self, record: &PersistedReport, caps: &Capabilities)
        -> Result<(), StoreError>;
    fn insert_sighting(
        &self,
        record: &PersistedSighting,
        caps: &Capabilities,
    ) -> Result<(), StoreError>;
    fn fetch_reports(&self, caps: &Capabilities) -> Result<(), StoreError>;
    fn fetch_sightings(&self, caps: &Capabilities) -> Result<(), StoreError>;
}

/// Selects and constructs the store for the given configuration.
/// Credentials never reach the log fields.
#[instrument(skip_all)]
pub fn build_store(config: &StorageConfig) -> Result<Box<dyn RecordStore>, StoreError> {
    match config.mode {
        StorageMode::Local => {
            info!("Using local record store");
            Ok(Box::new(LocalStore))
        }
        StorageMode::Remote => {
            let remote = config.remote.as_ref().ok_or(StoreError::MissingRemoteConfig)?;
            let store = RemoteStore::new(remote)?;
            info!(host = store.host(), "Using remote record store");
            Ok(Box::new(store))
        }
    }
}

#[must_use]
pub const fn remote_table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Reports => "bike_reports",
        RecordKind::Sightings => "bike_sightings",
    }
}

#[must_use]
pub const fn local_key(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Reports => REPORTS_STORE_KEY,
        RecordKind::Sightings => SIGHTINGS_STORE_KEY,
    }
}

/// Drops the oldest entries (front of the list) until the collection
/// fits the per-kind capacity.
pub fn trim_to_capacity<T>(records: &mut Vec<T>) {
    if records.len() > MAX_STORED_RECORDS_PER_KIND {
        let excess = records.len() - MAX_STORED_RECORDS_PER_KIND;
        warn!(excess, "Dropping oldest records to stay under capacity");
        records.drain(..excess);
    }
}

/// Key-value backed store. Collections are JSON arrays under fixed
/// keys; a missing key is the empty collection.
///
/// Inserts are read-modify-write: the trait method issues the read,
/// and the update loop appends the pending record and calls
/// `write_reports` / `write_sightings` once the read resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    fn read_collection(kind: RecordKind, purpose: ReadPurpose, caps: &Capabilities) {
        caps.kv().get(local_key(kind).to_string(), move |result| {
            Event::LocalReadResponse {
                kind,
                purpose,
                result: Box::new(result),
            }
        });
    }

    pub fn decode_reports(bytes: Option<&[u8]>) -> Result<Vec<PersistedReport>, StoreError> {
        decode_collection(bytes).map_err(|e| {
            warn!(error = %e, "Stored reports failed to decode");
            StoreError::from(e)
        })
    }

    pub fn decode_sightings(bytes: Option<&[u8]>) -> Result<Vec<PersistedSighting>, StoreError> {
        decode_collection(bytes).map_err(|e| {
            warn!(error = %e, "Stored sightings failed to decode");
            StoreError::from(e)
        })
    }

    pub fn write_reports(
        records: &[PersistedReport],
        caps: &Capabilities,
    ) -> Result<(), StoreError> {
        let bytes = encode_collection(records)?;
        caps.kv()
            .set(REPORTS_STORE_KEY.to_string(), bytes, move |result| {
                Event::LocalWriteResponse {
                    kind: RecordKind::Reports,
                    result: Box::new(result),
                }
            });
        Ok(())
    }

    pub fn write_sightings(
        records: &[PersistedSighting],
        caps: &Capabilities,
    ) -> Result<(), StoreError> {
        let bytes = encode_collection(records)?;
        caps.kv()
            .set(SIGHTINGS_STORE_KEY.to_string(), bytes, move |result| {
                Event::LocalWriteResponse {
                    kind: RecordKind::Sightings,
                    result: Box::new(result),
                }
            });
        Ok(())
    }
}

impl RecordStore for LocalStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    fn insert_report(
        &self,
        _record: &PersistedReport,
        caps: &Capabilities,
    ) -> Result<(), StoreError> {
        Self::read_collection(RecordKind::Reports, ReadPurpose::Submission, caps);
        Ok(())
    }

    fn insert_sighting(
        &self,
        _record: &PersistedSighting,
        caps: &Capabilities,
    ) -> Result<(), StoreError> {
        Self::read_collection(RecordKind::Sightings, ReadPurpose::Submission, caps);
        Ok(())
    }

    fn fetch_reports(&self, caps: &Capabilities) -> Result<(), StoreError> {
        Self::read_collection(RecordKind::Reports, ReadPurpose::Dashboard, caps);
        Ok(())
    }

    fn fetch_sightings(&self, caps: &Capabilities) -> Result<(), StoreError> {
        Self::read_collection(RecordKind::Sightings, ReadPurpose::Dashboard, caps);
        Ok(())
    }
}

/// PostgREST-style remote store. Inserts never read the response body
/// back; the dashboard fetch is the read path.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    base_url: ValidatedUrl,
    auth_headers: HttpHeaders,
}

impl RemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let base_url = ValidatedUrl::new(config.base_url.clone())?;

        let mut auth_headers = HttpHeaders::new();
        if let Some(key) = &config.api_key {
            auth_headers.insert("apikey", key.clone())?;
            auth_headers.insert("Authorization", format!("Bearer {key}"))?;
        }

        Ok(Self {
            base_url,
            auth_headers,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.base_url.host()
    }

    #[must_use]
    pub fn insert_url(&self, kind: RecordKind) -> String {
        self.base_url
            .join_path(&format!("rest/v1/{}", remote_table(kind)))
    }

    #[must_use]
    pub fn fetch_url(&self, kind: RecordKind) -> String {
        format!("{}?select=*&order=created_at_ms.desc", self.insert_url(kind))
    }

    #[instrument(skip(self, caps, body))]
    fn send_insert(&self, kind: RecordKind, body: Vec<u8>, caps: &Capabilities) {
        let mut builder = caps.http().post(&self.insert_url(kind));
        builder = builder
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .body(body);

        for (name, value) in self.auth_headers.iter() {
            builder = builder.header(name.as_str(), value);
        }

        builder.send(move |result| Event::RemoteInsertResponse {
            kind,
            result: Box::new(http::into_output(result)),
        });
    }

    #[instrument(skip(self, caps))]
    fn send_fetch(&self, kind: RecordKind, caps: &Capabilities) {
        let mut builder = caps.http().get(&self.fetch_url(kind));

        for (name, value) in self.auth_headers.iter() {
            builder = builder.header(name.as_str(), value);
        }

        builder.send(move |result| Event::RemoteFetchResponse {
            kind,
            result: Box::new(http::into_output(result)),
        });
    }

    fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(record).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })
    }
}

impl RecordStore for RemoteStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Remote
    }

    fn insert_report(
        &self,
        record: &PersistedReport,
        caps: &Capabilities,
    ) -> Result<(), StoreError> {
        let body = Self::encode_record(record)?;
        self.send_insert(RecordKind::Reports, body, caps);
        Ok(())
    }

    fn insert_sighting(
        &self,
        record: &PersistedSighting,
        caps: &Capabilities,
    ) -> Result<(), StoreError> {
        let body = Self::encode_record(record)?;
        self.send_insert(RecordKind::Sightings, body, caps);
        Ok(())
    }

    fn fetch_reports(&self, caps: &Capabilities) -> Result<(), StoreError> {
        self.send_fetch(RecordKind::Reports, caps);
        Ok(())
    }

    fn fetch_sightings(&self, caps: &Capabilities) -> Result<(), StoreError> {
        self.send_fetch(RecordKind::Sightings, caps);
        Ok(())
    }
}
