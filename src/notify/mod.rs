pub mod diagnostics;
pub mod notifier;

pub use diagnostics::{DiagnosticRecord, DiagnosticSink, JsonlDiagnosticSink, LogDiagnosticSink};
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
