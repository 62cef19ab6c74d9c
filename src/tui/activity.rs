// Flowboard — Activity log fed by tracing while the dashboard owns the terminal

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Maximum log entries kept in memory.
const MAX_LOG_ENTRIES: usize = 200;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub fn symbol(&self) -> &str {
        match self {
            LogLevel::Info => "ℹ",
            LogLevel::Warn => "⚠",
            LogLevel::Error => "✖",
            LogLevel::Debug => "·",
        }
    }
}

/// Bounded, shareable ring of recent log lines.
#[derive(Clone, Default)]
pub struct ActivityLog {
    inner: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: LogLevel, message: impl Into<String>) {
        let Ok(mut logs) = self.inner.lock() else {
            return;
        };
        if logs.len() >= MAX_LOG_ENTRIES {
            logs.pop_front();
        }
        logs.push_back(LogEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        });
    }

    /// Most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        match self.inner.lock() {
            Ok(logs) => logs.iter().skip(logs.len().saturating_sub(n)).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tracing Integration
// ---------------------------------------------------------------------------

pub struct TuiLayer {
    activity: ActivityLog,
}

impl TuiLayer {
    pub fn new(activity: ActivityLog) -> Self {
        Self { activity }
    }
}

impl<S> tracing_subscriber::Layer<S> for TuiLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = LogVisitor::default();
        event.record(&mut visitor);

        let level = match *event.metadata().level() {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        };

        if !visitor.message.is_empty() {
            self.activity.push(level, visitor.message);
        }
    }
}

#[derive(Default)]
struct LogVisitor {
    message: String,
}

impl tracing::field::Visit for LogVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}
