//! Debug output: an injectable line sink mirrored to `tracing`.

use std::fmt;
use std::sync::Arc;

/// Receives human-readable progress lines (candidate probed, outcome, ...).
pub trait DebugSink: Send + Sync {
    fn line(&self, line: &str);
}

impl<F> DebugSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn line(&self, line: &str) {
        self(line)
    }
}

/// Handle used internally to emit debug lines. Every line also goes to
/// `tracing` at debug level, whether or not a sink is registered.
#[derive(Clone, Default)]
pub struct DebugLog {
    sink: Option<Arc<dyn DebugSink>>,
}

impl DebugLog {
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn new(sink: Arc<dyn DebugSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "mailprobe", "{args}");
        if let Some(sink) = &self.sink {
            sink.line(&args.to_string());
        }
    }
}

impl fmt::Debug for DebugLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

macro_rules! debug_line {
    ($log:expr, $($arg:tt)*) => {
        $log.emit(format_args!($($arg)*))
    };
}
pub(crate) use debug_line;
