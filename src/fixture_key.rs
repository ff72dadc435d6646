//! Cache keys for fixture invocations
//!
//! A key is the fixture's name plus a canonical JSON rendering of its arguments.
//! Object members are sorted by key at every depth so two structurally equal
//! argument values always render identically; sequences keep their order.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureKey {
    fixture: String,
    args: String,
}

impl FixtureKey {
    /// Encode `args` for `fixture`.
    ///
    /// Fails when `args` cannot be represented as JSON (for example a map whose
    /// keys are not strings), rather than falling back to a key that might collide.
    pub fn new<A: Serialize + ?Sized>(fixture: &str, args: &A) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(args)?;
        let args = serde_json::to_string(&canonicalize(value))?;
        Ok(Self {
            fixture: fixture.to_string(),
            args,
        })
    }

    pub fn fixture(&self) -> &str {
        &self.fixture
    }

    /// Canonical JSON text of the arguments.
    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for FixtureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.fixture, self.args)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
