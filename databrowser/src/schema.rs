//! Snapshots of the models, fields and relations available to queries.

use std::path::Path;

use eyre::{Result, WrapErr};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::loader::{self, FileFormat};
use crate::{Error, FieldType};

/// The fields and foreign-key relations of a single model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Field names mapped to their declared types.
    #[serde(default)]
    pub fields: IndexMap<String, FieldType>,
    /// Relation names mapped to the fully-qualified names of the models they
    /// point to.
    #[serde(default)]
    pub fks: IndexMap<String, String>,
}

impl ModelSchema {
    /// Convenience method for adding a field while constructing a model.
    pub fn with_field<N: AsRef<str>>(mut self, name: N, field_type: FieldType) -> Self {
        self.fields.insert(name.as_ref().to_string(), field_type);
        self
    }

    /// Convenience method for adding a foreign-key relation while constructing
    /// a model.
    pub fn with_fk<N, M>(mut self, name: N, model: M) -> Self
    where
        N: AsRef<str>,
        M: AsRef<str>,
    {
        self.fks
            .insert(name.as_ref().to_string(), model.as_ref().to_string());
        self
    }

    pub fn field(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).copied()
    }

    /// The model targeted by the relation with the given name.
    pub fn fk(&self, name: &str) -> Option<&str> {
        self.fks.get(name).map(String::as_str)
    }
}

/// A read-only snapshot of all models known to the model registry, keyed by
/// fully-qualified model name (e.g. `app.Model`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(IndexMap<String, ModelSchema>);

impl Schema {
    /// Convenience method for adding a model while constructing a schema.
    pub fn with_model<N: AsRef<str>>(mut self, name: N, model: ModelSchema) -> Self {
        let _ = self.insert(name, model);
        self
    }

    /// Add or replace the model with the given name, returning the previous
    /// one if any.
    pub fn insert<N: AsRef<str>>(&mut self, name: N, model: ModelSchema) -> Option<ModelSchema> {
        self.0.insert(name.as_ref().to_string(), model)
    }

    pub fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.0.get(name)
    }

    pub fn contains_model(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// An iterator over all models, in the order in which they were defined.
    pub fn models(&self) -> impl Iterator<Item = (&String, &ModelSchema)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a schema from a string in the given format.
    pub fn load_as(fmt: FileFormat, content: &str) -> Result<Self, Error> {
        loader::load_as(fmt, content)
    }

    /// Load a schema from a JSON or YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let schema: Self = loader::load_from_file(path)
            .wrap_err_with(|| Error::FailedToLoadSchema(path.to_path_buf()))?;
        debug!(
            "Loaded schema with {} model(s) from {}",
            schema.len(),
            path.display()
        );
        Ok(schema)
    }
}

impl FromIterator<(String, ModelSchema)> for Schema {
    fn from_iter<I: IntoIterator<Item = (String, ModelSchema)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const SCHEMA_JSON: &str = r#"{
        "app.model": {
            "fields": {"fa": "string", "count": "number", "when": "time", "geom": "polygon"},
            "fks": {"tom": "app.Tom"}
        },
        "app.Tom": {"fields": {"jones": "boolean", "total": "calculated"}}
    }"#;

    const SCHEMA_YAML: &str = r#"
app.model:
  fields:
    fa: string
    count: number
    when: time
    geom: polygon
  fks:
    tom: app.Tom
app.Tom:
  fields:
    jones: boolean
    total: calculated
"#;

    fn expected() -> Schema {
        Schema::default()
            .with_model(
                "app.model",
                ModelSchema::default()
                    .with_field("fa", FieldType::String)
                    .with_field("count", FieldType::Number)
                    .with_field("when", FieldType::Time)
                    .with_field("geom", FieldType::Base)
                    .with_fk("tom", "app.Tom"),
            )
            .with_model(
                "app.Tom",
                ModelSchema::default()
                    .with_field("jones", FieldType::Boolean)
                    .with_field("total", FieldType::Calculated),
            )
    }

    #[test]
    fn load_json_and_yaml() {
        let from_json = Schema::load_as(FileFormat::Json, SCHEMA_JSON).unwrap();
        let from_yaml = Schema::load_as(FileFormat::Yaml, SCHEMA_YAML).unwrap();
        assert_eq!(from_json, expected());
        assert_eq!(from_yaml, expected());
        assert_eq!(
            from_json.models().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            vec!["app.model", "app.Tom"]
        );
    }

    #[test]
    fn lookups() {
        let schema = expected();
        let model = schema.model("app.model").unwrap();
        assert_eq!(model.field("count"), Some(FieldType::Number));
        assert_eq!(model.field("tom"), None);
        assert_eq!(model.fk("tom"), Some("app.Tom"));
        assert!(schema.model("app.Tom").unwrap().fks.is_empty());
        assert!(!schema.contains_model("app.Michael"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, SCHEMA_JSON).unwrap();
        assert_eq!(Schema::load_from_file(&path).unwrap(), expected());

        let path = dir.path().join("schema.yml");
        fs::write(&path, SCHEMA_YAML).unwrap();
        assert_eq!(Schema::load_from_file(&path).unwrap(), expected());

        let err = Schema::load_from_file("/nonexistent/schema.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to load schema"));
    }
}
