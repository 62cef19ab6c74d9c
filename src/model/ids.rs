// Flowboard — Identifiers for workflows and steps

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend-assigned workflow identifier. Opaque; numbers are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for WorkflowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => WorkflowId(s),
            RawId::Number(n) => WorkflowId(n.to_string()),
        })
    }
}

/// Client-generated step identifier, unique within one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StepId(pub u64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => n
                .as_u64()
                .or_else(|| {
                    // Integral floats only; fractions would collide once truncated.
                    n.as_f64()
                        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                        .map(|f| f as u64)
                })
                .map(StepId)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid step id: {}", n))),
            RawId::Text(s) => s
                .trim()
                .parse()
                .map(StepId)
                .map_err(|_| serde::de::Error::custom(format!("invalid step id: {:?}", s))),
        }
    }
}

/// Monotonic step id source. Seeded from the wall clock so fresh ids look
/// like the timestamps older clients produced, but never repeats.
#[derive(Debug, Clone)]
pub struct StepIdGenerator {
    next: u64,
}

impl StepIdGenerator {
    /// Seed past both the current time and every id already in use.
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a StepId>) -> Self {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let floor = existing
            .into_iter()
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self {
            next: now.max(floor),
        }
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> StepId {
        let id = StepId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
