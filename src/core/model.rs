//! Result model
//!
//! Every CLI command maps its outcome to [`ResultItem`]s before rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A looked-up entry
    Entry,
    /// The outcome of a mutating operation
    Outcome,
    /// Counters and census data
    Stats,
    /// Activation state
    Status,
    Error,
}

/// Error information for a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
}

impl CliError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A single output record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub kind: Kind,

    /// Operation that produced this record (get, set, flush, ...)
    pub op: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Lookup result; `value` is only meaningful when this is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Success flag for mutations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,

    /// Activation state, only set on status records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Structured payload (stats, census, drop-in)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CliError>,
}

impl ResultItem {
    fn base(kind: Kind, op: &str) -> Self {
        Self {
            kind,
            op: op.to_string(),
            group: None,
            key: None,
            found: None,
            value: None,
            ok: None,
            active: None,
            data: None,
            errors: Vec::new(),
        }
    }

    /// A lookup result
    pub fn entry(op: &str, group: &str, key: &str, value: Option<Value>) -> Self {
        Self {
            group: Some(group.to_string()),
            key: Some(key.to_string()),
            found: Some(value.is_some()),
            value,
            ..Self::base(Kind::Entry, op)
        }
    }

    /// A mutation result
    pub fn outcome(op: &str, ok: bool) -> Self {
        Self {
            ok: Some(ok),
            ..Self::base(Kind::Outcome, op)
        }
    }

    pub fn stats(op: &str, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::base(Kind::Stats, op)
        }
    }

    pub fn status(op: &str, active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::base(Kind::Status, op)
        }
    }

    pub fn error(op: &str, error: CliError) -> Self {
        Self {
            ok: Some(false),
            errors: vec![error],
            ..Self::base(Kind::Error, op)
        }
    }

    pub fn with_target(mut self, group: &str, key: &str) -> Self {
        self.group = Some(group.to_string());
        self.key = Some(key.to_string());
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// A record counts as failed when it carries `ok: false`
    pub fn failed(&self) -> bool {
        self.ok == Some(false)
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    /// True when no item failed
    pub fn all_ok(&self) -> bool {
        !self.items.iter().any(ResultItem::failed)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
