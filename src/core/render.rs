//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, raw

use crate::core::model::{Kind, ResultItem, ResultSet};
use serde_json::Value;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Create a new render config with pretty option
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    /// Create a new renderer with render config
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Raw mode: bare values for lookups, short words for everything else
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .map(|item| self.render_item_raw(item))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_item_raw(&self, item: &ResultItem) -> String {
        match item.kind {
            Kind::Entry => match &item.value {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            },
            Kind::Outcome => match (&item.value, item.ok) {
                (Some(value), Some(true)) => value.to_string(),
                (_, Some(true)) => "ok".to_string(),
                _ => "failed".to_string(),
            },
            Kind::Status => {
                if item.active == Some(true) {
                    "active".to_string()
                } else {
                    "inactive".to_string()
                }
            }
            Kind::Stats => item
                .data
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            Kind::Error => item
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CliError, ResultItem};
    use serde_json::json;

    fn sample() -> ResultSet {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::entry("get", "g", "a", Some(json!("alpha"))));
        result_set.push(ResultItem::entry("get", "g", "b", None));
        result_set
    }

    #[test]
    fn test_render_jsonl() {
        let renderer = Renderer::new(OutputFormat::Jsonl);
        let output = renderer.render(&sample());

        assert!(output.contains("alpha"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_render_json() {
        let renderer = Renderer::new(OutputFormat::Json);
        let output = renderer.render(&sample());

        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
    }

    #[test]
    fn test_render_pretty_jsonl() {
        let renderer =
            Renderer::with_config(RenderConfig::with_pretty(OutputFormat::Jsonl, true));
        let output = renderer.render(&sample());
        assert!(output.contains("\n\n"));
        assert!(output.contains("  \"kind\""));
    }

    #[test]
    fn test_render_raw() {
        let mut result_set = sample();
        result_set.push(ResultItem::outcome("incr", true).with_value(json!(6)));
        result_set.push(ResultItem::outcome("delete", false));
        result_set.push(ResultItem::status("status", true));
        result_set.push(ResultItem::error("set", CliError::new("IO", "disk full")));

        let renderer = Renderer::new(OutputFormat::Raw);
        let output = renderer.render(&result_set);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines, vec!["alpha", "", "6", "failed", "active", "IO: disk full"]);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(
            "jsonl".parse::<OutputFormat>().unwrap(),
            OutputFormat::Jsonl
        );
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
    }

    #[test]
    fn test_output_format_parse_invalid() {
        let result = "md".parse::<OutputFormat>();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown format"));
    }
}
