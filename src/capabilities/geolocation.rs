use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_POSITION_TIMEOUT_MS: u64 = 10_000;
pub const MAX_POSITION_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_MAXIMUM_AGE_MS: u64 = 0;

/// Single-shot device positioning. The shell answers each request with
/// exactly one result; there is no watch/stream mode.
#[derive(Clone)]
pub struct Geolocation<E> {
    context: CapabilityContext<GeolocationOperation, E>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<E> Geolocation<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, E>) -> Self {
        Self { context }
    }

    pub fn current_position<F>(&self, options: PositionOptions, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        let options = options.validated();
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(GeolocationOperation::CurrentPosition { options })
                .await;
            context.update_app(callback(result));
        });
    }

    pub fn current_position_simple<F>(&self, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        self.current_position(PositionOptions::default(), callback);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationOperation {
    CurrentPosition { options: PositionOptions },
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: DEFAULT_POSITION_TIMEOUT_MS,
            maximum_age_ms: DEFAULT_MAXIMUM_AGE_MS,
        }
    }
}

impl PositionOptions {
    #[must_use]
    pub fn with_high_accuracy(mut self, enabled: bool) -> Self {
        self.enable_high_accuracy = enabled;
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_maximum_age_ms(mut self, maximum_age_ms: u64) -> Self {
        self.maximum_age_ms = maximum_age_ms;
        self
    }

    /// Clamps out-of-range values rather than rejecting the request. A
    /// zero timeout would never resolve, so it becomes the default.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if self.timeout_ms == 0 {
            self.timeout_ms = DEFAULT_POSITION_TIMEOUT_MS;
        }
        if self.timeout_ms > MAX_POSITION_TIMEOUT_MS {
            self.timeout_ms = MAX_POSITION_TIMEOUT_MS;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DevicePosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission was denied")]
    PermissionDenied,
    #[error("Device position is unavailable")]
    PositionUnavailable,
    #[error("Position request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("Geolocation is not supported on this device")]
    Unsupported,
    #[error("Geolocation failed: {message}")]
    Shell { message: String },
}

impl GeolocationError {
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PositionUnavailable | Self::Timeout { .. } | Self::Shell { .. }
        )
    }
}

pub type GeolocationResult = Result<DevicePosition, GeolocationError>;
