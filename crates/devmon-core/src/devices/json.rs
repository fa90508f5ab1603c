// ── JSON file device ──
//
// Reads a flat JSON object and picks out a declared set of typed
// properties. Every declared property must be present with a matching
// JSON type; extra keys are ignored.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

use crate::device::DeviceId;
use crate::devices::source::{Extract, SourceDevice};
use crate::error::DeviceError;
use crate::value::{Status, Value, ValueKind};

/// A [`SourceDevice`] that reads its file as JSON.
pub type JsonFileDevice = SourceDevice<JsonExtractor>;

impl SourceDevice<JsonExtractor> {
    /// Convenience constructor for a JSON-backed device.
    pub fn json(
        id: DeviceId,
        path: impl Into<PathBuf>,
        properties: BTreeMap<String, ValueKind>,
    ) -> Self {
        Self::new(id, path, JsonExtractor::new(properties))
    }
}

/// Extracts declared properties from a JSON object.
///
/// A document that is not an object fails with [`DeviceError::Parse`], so
/// the device is absent from that cycle rather than present and empty.
#[derive(Debug, Clone, Default)]
pub struct JsonExtractor {
    properties: BTreeMap<String, ValueKind>,
}

impl JsonExtractor {
    pub fn new(properties: BTreeMap<String, ValueKind>) -> Self {
        Self { properties }
    }

    /// Declare one more property.
    pub fn with(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.properties.insert(name.into(), kind);
        self
    }

    pub fn properties(&self) -> &BTreeMap<String, ValueKind> {
        &self.properties
    }

    fn convert(name: &str, kind: ValueKind, raw: &serde_json::Value) -> Result<Value, DeviceError> {
        let converted = match kind {
            ValueKind::Float => raw.as_f64().map(Value::Float),
            ValueKind::Int => raw.as_i64().map(Value::Int),
            ValueKind::Bool => raw.as_bool().map(Value::Bool),
            ValueKind::Text => raw.as_str().map(|s| Value::Text(s.to_owned())),
        };
        converted.ok_or_else(|| DeviceError::TypeMismatch {
            name: name.to_owned(),
            expected: kind,
            found: json_type_name(raw).to_owned(),
        })
    }
}

impl Extract for JsonExtractor {
    fn extract(&self, reader: &mut dyn BufRead) -> Result<Status, DeviceError> {
        let document: serde_json::Value =
            serde_json::from_reader(reader).map_err(|e| DeviceError::Parse {
                detail: e.to_string(),
            })?;

        let fields = match document {
            serde_json::Value::Object(fields) => fields,
            other => {
                return Err(DeviceError::Parse {
                    detail: format!("expected a JSON object, found {}", json_type_name(&other)),
                });
            }
        };

        self.properties
            .iter()
            .map(|(name, kind)| -> Result<(String, Value), DeviceError> {
                let raw = fields
                    .get(name)
                    .ok_or_else(|| DeviceError::MissingProperty { name: name.clone() })?;
                Ok((name.clone(), Self::convert(name, *kind, raw)?))
            })
            .collect()
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "int",
        serde_json::Value::String(_) => "text",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::Device;
    use crate::value::status;

    fn lamp() -> JsonExtractor {
        JsonExtractor::default()
            .with("voltage", ValueKind::Float)
            .with("current", ValueKind::Float)
    }

    fn run(extractor: &JsonExtractor, input: &str) -> Result<Status, DeviceError> {
        extractor.extract(&mut Cursor::new(input.as_bytes()))
    }

    #[test]
    fn extracts_declared_properties_only() {
        let st = run(
            &lamp(),
            r#"{"voltage": 230.5, "current": 2, "serial": "LMP-1"}"#,
        )
        .unwrap();
        assert_eq!(
            st,
            status([("current", Value::Float(2.0)), ("voltage", Value::Float(230.5))])
        );
    }

    #[test]
    fn reads_every_kind() {
        let extractor = JsonExtractor::default()
            .with("f", ValueKind::Float)
            .with("i", ValueKind::Int)
            .with("b", ValueKind::Bool)
            .with("t", ValueKind::Text);
        let st = run(&extractor, r#"{"f": 1.5, "i": -3, "b": true, "t": "on"}"#).unwrap();
        assert_eq!(
            st,
            status([
                ("b", Value::Bool(true)),
                ("f", Value::Float(1.5)),
                ("i", Value::Int(-3)),
                ("t", Value::Text("on".into())),
            ])
        );
    }

    #[test]
    fn missing_property_fails() {
        let err = run(&lamp(), r#"{"voltage": 230.5}"#).unwrap_err();
        assert!(matches!(err, DeviceError::MissingProperty { ref name } if name == "current"));
    }

    #[test]
    fn kind_mismatch_fails() {
        let err = run(&lamp(), r#"{"voltage": "high", "current": 1.0}"#).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::TypeMismatch { ref name, expected: ValueKind::Float, ref found }
                if name == "voltage" && found == "text"
        ));

        let ints = JsonExtractor::default().with("n", ValueKind::Int);
        assert!(run(&ints, r#"{"n": 1.5}"#).is_err());
    }

    #[test]
    fn malformed_or_non_object_fails() {
        assert!(matches!(run(&lamp(), "{not json"), Err(DeviceError::Parse { .. })));
        assert!(matches!(run(&lamp(), "[1, 2]"), Err(DeviceError::Parse { .. })));
    }

    #[test]
    fn json_device_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lamp.json");
        std::fs::write(&path, r#"{"voltage": 12.0, "current": 0.5}"#).unwrap();

        let device = JsonFileDevice::json(DeviceId::new(2), &path, lamp().properties().clone());
        let st = device.fetch_current_state().unwrap();
        assert_eq!(st.len(), 2);
        assert_eq!(st["current"], Value::Float(0.5));
    }
}
