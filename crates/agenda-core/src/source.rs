use std::fs;
use std::path::{Path, PathBuf};

use agenda_shared::RawEvent;
use anyhow::{Context, anyhow};
use serde_json::Value;
use tracing::{debug, info};

/// Where raw events come from. The engine only ever asks for the full list.
///
/// Records are handed over untyped so that one bad record is reported on
/// its own by the normalizer instead of failing the whole fetch.
pub trait EventSource {
    fn fetch(&self) -> anyhow::Result<Vec<Value>>;
}

/// Reads events exported by the backend: a JSON array, a single object,
/// an `{"events": [...]}` envelope, or one object per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for JsonFileSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch(&self) -> anyhow::Result<Vec<Value>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let records = parse_raw_events(&text)
            .with_context(|| format!("failed parsing events in {}", self.path.display()))?;
        info!(count = records.len(), "loaded raw event records");
        Ok(records)
    }
}

/// Events held in memory, handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<RawEvent>);

impl EventSource for StaticSource {
    fn fetch(&self) -> anyhow::Result<Vec<Value>> {
        self.0
            .iter()
            .map(|raw| serde_json::to_value(raw).context("failed encoding event"))
            .collect()
    }
}

/// Splits an export into one JSON value per record. Only the document
/// shape is checked here; record contents are left to the normalizer.
pub fn parse_raw_events(text: &str) -> anyhow::Result<Vec<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("failed parsing JSON array");
    }

    if trimmed.starts_with('{') {
        if let Ok(document) = serde_json::from_str::<Value>(trimmed) {
            return records_from_object(document);
        }
    }

    let mut out = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        let item: Value = serde_json::from_str(token)
            .with_context(|| format!("failed parsing event line {}", idx + 1))?;
        out.push(item);
    }

    if out.is_empty() {
        return Err(anyhow!("no events found"));
    }
    Ok(out)
}

fn records_from_object(mut document: Value) -> anyhow::Result<Vec<Value>> {
    match document.get_mut("events").map(Value::take) {
        Some(Value::Array(records)) => {
            debug!(count = records.len(), "parsed events envelope");
            Ok(records)
        }
        Some(other) => Err(anyhow!(
            "expected an array under \"events\", found {}",
            json_kind(&other)
        )),
        None => Ok(vec![document]),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_every_supported_shape() {
        let array = r#"[{"category":"Talleres","date":"2025-07-15","capacity":20}]"#;
        let envelope = r#"{"events":[{"category":"Talleres","date":"2025-07-15","capacity":20},
            {"category":"Conciertos","date":"2025-07-16","capacity":300}]}"#;
        let single = r#"{"category":"Talleres","date":"2025-07-15","capacity":20}"#;
        let lines = "{\"category\":\"Talleres\",\"capacity\":1}\n\n{\"category\":\"Cine\",\"capacity\":2}\n";

        assert_eq!(parse_raw_events(array).expect("array").len(), 1);
        assert_eq!(parse_raw_events(envelope).expect("envelope").len(), 2);
        assert_eq!(parse_raw_events(single).expect("single").len(), 1);
        let parsed = parse_raw_events(lines).expect("lines");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["capacity"], 2);
        assert!(parse_raw_events("   ").expect("empty").is_empty());
    }

    #[test]
    fn wrongly_typed_fields_do_not_fail_the_document() {
        let text = r#"[
          {"id":"ok","category":"Talleres","date":"2025-07-15","capacity":20},
          {"id":"null","category":"Talleres","date":"2025-07-15","capacity":null},
          {"id":"num","category":"Talleres","date":20250715,"capacity":"20"}
        ]"#;
        let records = parse_raw_events(text).expect("document parses");
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["id"], "num");
    }

    #[test]
    fn reports_the_bad_line() {
        let err = parse_raw_events("{\"capacity\":1}\nnot json\n").expect_err("bad line");
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn rejects_envelope_without_array() {
        let err = parse_raw_events(r#"{"events": {"id": "a"}}"#).expect_err("bad envelope");
        assert!(err.to_string().contains("found an object"));
    }

    #[test]
    fn json_file_source_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id":"a","category":"Conciertos","date":"2025-07-15","capacity":300}}]"#
        )
        .expect("write events");

        let source = JsonFileSource::new(file.path());
        let records = source.fetch().expect("fetch events");
        assert_eq!(records[0]["id"], "a");

        let missing = JsonFileSource::new(file.path().with_extension("missing"));
        assert!(missing.fetch().is_err());
    }

    #[test]
    fn static_source_round_trips_raw_events() {
        let source = StaticSource(vec![RawEvent {
            id: Some("s".to_string()),
            capacity: Some(4),
            ..RawEvent::default()
        }]);
        let records = source.fetch().expect("fetch");
        assert_eq!(records[0]["id"], "s");
        assert_eq!(records[0]["capacity"], 4);
    }
}
