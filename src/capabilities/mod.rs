//! Capability wiring for the BikeWatch core.
//!
//! The shell services five effects: render, HTTP (remote store),
//! key-value (local store), geolocation, and telemetry. Everything
//! crossing this boundary is serializable.

pub mod geolocation;
pub mod http;
pub mod kv;
pub mod telemetry;

pub use geolocation::{
    DevicePosition, Geolocation, GeolocationError, GeolocationOperation, GeolocationResult,
    PositionOptions,
};
pub use http::{HeaderError, HttpHeaders, HttpOutput, UrlError, ValidatedUrl};
pub use kv::{KvCodecError, REPORTS_STORE_KEY, SIGHTINGS_STORE_KEY};
pub use telemetry::{Telemetry, TelemetryOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;
use crux_kv::KeyValue as Kv;

use crate::app::App;
use crate::Event;

pub type AppRender = Render<Event>;
pub type AppHttp = Http<Event>;
pub type AppKv = KeyValue<Event>;
pub type AppGeolocation = Geolocation<Event>;
pub type AppTelemetry = Telemetry<Event>;

/// Result delivered by an HTTP send, collapsed to its owned form.
pub type HttpResult = Result<HttpOutput, crux_http::Error>;
/// Result delivered by a key-value get or set; `None` means absent.
pub type KvResult = Result<Option<Vec<u8>>, crux_kv::error::KeyValueError>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub geolocation: Geolocation<Event>,
    pub telemetry: Telemetry<Event>,
}

impl Capabilities {
    #[must_use]
    pub fn render(&self) -> &AppRender {
        &self.render
    }

    #[must_use]
    pub fn http(&self) -> &AppHttp {
        &self.http
    }

    #[must_use]
    pub fn kv(&self) -> &AppKv {
        &self.kv
    }

    #[must_use]
    pub fn geolocation(&self) -> &AppGeolocation {
        &self.geolocation
    }

    #[must_use]
    pub fn telemetry(&self) -> &AppTelemetry {
        &self.telemetry
    }
}
