//! Parsing config files into flat property documents

use crate::{ConfigError, PropertyValue, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Flattened key-value pairs of one document
pub(crate) type Document = BTreeMap<String, PropertyValue>;

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    /// Extensions probed for each config name, earlier ones take precedence
    pub const EXTENSIONS: [&'static str; 4] = ["toml", "yml", "yaml", "json"];

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse file content into its documents
///
/// Only YAML can hold more than one document (separated by `---`).
/// Empty documents are dropped.
pub(crate) fn parse_documents(content: &str, format: FileFormat) -> Result<Vec<Document>> {
    let documents = match format {
        FileFormat::Toml => {
            let table: toml::Table = toml::from_str(content)?;
            vec![flatten_toml(table)]
        }
        FileFormat::Yaml => {
            let mut documents = Vec::new();
            for document in serde_yaml::Deserializer::from_str(content) {
                let value = serde_yaml::Value::deserialize(document)?;
                documents.push(flatten_yaml(value)?);
            }
            documents
        }
        FileFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(content)?;
            let mut document = Document::new();
            match value {
                serde_json::Value::Object(_) => flatten_json(&mut document, "", value),
                serde_json::Value::Null => {}
                _ => {
                    return Err(ConfigError::ParseError(
                        "JSON config root must be an object".to_string(),
                    ))
                }
            }
            vec![document]
        }
    };

    Ok(documents.into_iter().filter(|d| !d.is_empty()).collect())
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_toml(table: toml::Table) -> Document {
    let mut document = Document::new();
    for (key, value) in table {
        flatten_toml_value(&mut document, key, value);
    }
    document
}

fn flatten_toml_value(document: &mut Document, key: String, value: toml::Value) {
    match value {
        toml::Value::Table(table) if table.is_empty() => {
            document.insert(key, PropertyValue::empty_map());
        }
        toml::Value::Table(table) => {
            for (child, value) in table {
                flatten_toml_value(document, join(&key, &child), value);
            }
        }
        toml::Value::Array(items) if items.is_empty() => {
            document.insert(key, PropertyValue::empty_list());
        }
        toml::Value::Array(items) => {
            for (idx, value) in items.into_iter().enumerate() {
                flatten_toml_value(document, format!("{key}[{idx}]"), value);
            }
        }
        toml::Value::String(s) => {
            document.insert(key, PropertyValue::Text(s));
        }
        toml::Value::Integer(i) => {
            document.insert(key, PropertyValue::Integer(i));
        }
        toml::Value::Float(f) => {
            document.insert(key, PropertyValue::Float(f));
        }
        toml::Value::Boolean(b) => {
            document.insert(key, PropertyValue::Boolean(b));
        }
        toml::Value::Datetime(dt) => {
            document.insert(key, PropertyValue::other("Datetime", dt.to_string()));
        }
    }
}

fn flatten_yaml(value: serde_yaml::Value) -> Result<Document> {
    let mut document = Document::new();
    match value {
        serde_yaml::Value::Null => {}
        serde_yaml::Value::Mapping(_) => flatten_yaml_value(&mut document, String::new(), value),
        other => {
            return Err(ConfigError::ParseError(format!(
                "YAML document root must be a mapping, found {}",
                yaml_type_label(&other)
            )))
        }
    }
    Ok(document)
}

fn flatten_yaml_value(document: &mut Document, key: String, value: serde_yaml::Value) {
    use serde_yaml::Value;

    match value {
        Value::Mapping(mapping) if mapping.is_empty() && !key.is_empty() => {
            document.insert(key, PropertyValue::empty_map());
        }
        Value::Mapping(mapping) => {
            for (child, value) in mapping {
                let child = match child {
                    Value::String(s) => s,
                    other => yaml_scalar_display(&other),
                };
                flatten_yaml_value(document, join(&key, &child), value);
            }
        }
        Value::Sequence(items) if items.is_empty() => {
            document.insert(key, PropertyValue::empty_list());
        }
        Value::Sequence(items) => {
            for (idx, value) in items.into_iter().enumerate() {
                flatten_yaml_value(document, format!("{key}[{idx}]"), value);
            }
        }
        Value::Null => {
            document.insert(key, PropertyValue::Null);
        }
        Value::Bool(b) => {
            document.insert(key, PropertyValue::Boolean(b));
        }
        Value::Number(n) => {
            document.insert(key, yaml_number(&n));
        }
        Value::String(s) => {
            document.insert(key, PropertyValue::Text(s));
        }
        Value::Tagged(tagged) => {
            let label = tagged.tag.to_string();
            let display = yaml_scalar_display(&tagged.value);
            document.insert(key, PropertyValue::other(label, display));
        }
    }
}

fn yaml_number(n: &serde_yaml::Number) -> PropertyValue {
    if let Some(i) = n.as_i64() {
        PropertyValue::Integer(i)
    } else if n.is_f64() {
        PropertyValue::Float(n.as_f64().unwrap_or_default())
    } else {
        PropertyValue::other("BigInteger", n.to_string())
    }
}

fn yaml_scalar_display(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn yaml_type_label(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

fn flatten_json(document: &mut Document, key: &str, value: serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Object(map) if map.is_empty() && !key.is_empty() => {
            document.insert(key.to_string(), PropertyValue::empty_map());
        }
        Value::Object(map) => {
            for (child, value) in map {
                flatten_json(document, &join(key, &child), value);
            }
        }
        Value::Array(items) if items.is_empty() => {
            document.insert(key.to_string(), PropertyValue::empty_list());
        }
        Value::Array(items) => {
            for (idx, value) in items.into_iter().enumerate() {
                flatten_json(document, &format!("{key}[{idx}]"), value);
            }
        }
        Value::Null => {
            document.insert(key.to_string(), PropertyValue::Null);
        }
        Value::Bool(b) => {
            document.insert(key.to_string(), PropertyValue::Boolean(b));
        }
        Value::Number(n) => {
            let value = match (n.as_i64(), n.as_f64()) {
                (Some(i), _) if !n.is_f64() => PropertyValue::Integer(i),
                (_, Some(f)) if n.is_f64() => PropertyValue::Float(f),
                _ => PropertyValue::other("BigInteger", n.to_string()),
            };
            document.insert(key.to_string(), value);
        }
        Value::String(s) => {
            document.insert(key.to_string(), PropertyValue::Text(s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_toml() {
        let toml = r#"
            [server]
            port = 8888
            ratio = 0.5
            enabled = true
            released = 1979-05-27

            [spring.cloud.config.server.git]
            uri = "https://github.com/example/config-repo"
            search-paths = ["app-*", "shared"]
            empty = []
        "#;

        let docs = parse_documents(toml, FileFormat::Toml).unwrap();
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];

        assert_eq!(doc["server.port"], PropertyValue::Integer(8888));
        assert_eq!(doc["server.ratio"], PropertyValue::Float(0.5));
        assert_eq!(doc["server.enabled"], PropertyValue::Boolean(true));
        assert_eq!(doc["server.released"].type_name(), "Datetime");
        assert_eq!(
            doc["spring.cloud.config.server.git.search-paths[1]"],
            PropertyValue::from("shared")
        );
        assert_eq!(
            doc["spring.cloud.config.server.git.empty"],
            PropertyValue::empty_list()
        );
    }

    #[test]
    fn test_yaml_multiple_documents() {
        let yaml = r#"
app:
  name: demo
  tags: [a, b]
---
spring:
  config:
    activate:
      on-profile: prod
app:
  name: demo-prod
  missing: ~
---
"#;

        let docs = parse_documents(yaml, FileFormat::Yaml).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["app.name"], PropertyValue::from("demo"));
        assert_eq!(docs[0]["app.tags[0]"], PropertyValue::from("a"));
        assert_eq!(
            docs[1]["spring.config.activate.on-profile"],
            PropertyValue::from("prod")
        );
        assert_eq!(docs[1]["app.missing"], PropertyValue::Null);
    }

    #[test]
    fn test_yaml_scalar_root_is_rejected() {
        let result = parse_documents("just a string", FileFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_flatten_json() {
        let json = r#"{"server": {"port": 8888, "weight": 1.5, "hosts": ["a"]}, "name": null}"#;
        let docs = parse_documents(json, FileFormat::Json).unwrap();
        let doc = &docs[0];

        assert_eq!(doc["server.port"], PropertyValue::Integer(8888));
        assert_eq!(doc["server.weight"], PropertyValue::Float(1.5));
        assert_eq!(doc["server.hosts[0]"], PropertyValue::from("a"));
        assert_eq!(doc["name"], PropertyValue::Null);
    }

    #[test]
    fn test_empty_collections_keep_their_shape() {
        let yaml = "git:\n  search-paths: []\n  options: {}\n";
        let docs = parse_documents(yaml, FileFormat::Yaml).unwrap();
        assert_eq!(docs[0]["git.search-paths"], PropertyValue::empty_list());
        assert_eq!(docs[0]["git.options"], PropertyValue::empty_map());

        let json = r#"{"git": {"search-paths": [], "options": {}}}"#;
        let docs = parse_documents(json, FileFormat::Json).unwrap();
        assert_eq!(docs[0]["git.search-paths"], PropertyValue::empty_list());
        assert_eq!(docs[0]["git.options"], PropertyValue::empty_map());
    }

    #[test]
    fn test_malformed_content() {
        assert!(matches!(
            parse_documents("[server", FileFormat::Toml),
            Err(ConfigError::TomlError(_))
        ));
        assert!(matches!(
            parse_documents("{", FileFormat::Json),
            Err(ConfigError::JsonError(_))
        ));
        assert!(matches!(
            parse_documents("a: [", FileFormat::Yaml),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_empty_file_has_no_documents() {
        assert!(parse_documents("", FileFormat::Yaml).unwrap().is_empty());
        assert!(parse_documents("", FileFormat::Toml).unwrap().is_empty());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_extension("yml"), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_extension("properties"), None);
    }
}
