use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Fire-and-forget metrics and diagnostics. Operations are notified to
/// the shell and never produce a response event.
#[derive(Clone)]
pub struct Telemetry<E> {
    context: CapabilityContext<TelemetryOperation, E>,
}

impl<Ev> Capability<Ev> for Telemetry<Ev> {
    type Operation = TelemetryOperation;
    type MappedSelf<MappedEv> = Telemetry<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Telemetry::new(self.context.map_event(f))
    }
}

impl<E> Telemetry<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<TelemetryOperation, E>) -> Self {
        Self { context }
    }

    pub fn counter(&self, name: &str, value: u64) {
        self.notify(TelemetryOperation::Counter {
            name: name.to_string(),
            value,
        });
    }

    pub fn event(&self, name: &str, tags: &[(&str, &str)]) {
        self.notify(TelemetryOperation::Event {
            name: name.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
    }

    pub fn warn(&self, name: &str, detail: &str) {
        self.notify(TelemetryOperation::Warn {
            name: name.to_string(),
            detail: detail.to_string(),
        });
    }

    pub fn error(&self, name: &str, detail: &str) {
        self.notify(TelemetryOperation::Error {
            name: name.to_string(),
            detail: detail.to_string(),
        });
    }

    fn notify(&self, operation: TelemetryOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TelemetryOperation {
    Counter { name: String, value: u64 },
    Event { name: String, tags: Vec<(String, String)> },
    Warn { name: String, detail: String },
    Error { name: String, detail: String },
}

impl Operation for TelemetryOperation {
    type Output = ();
}
