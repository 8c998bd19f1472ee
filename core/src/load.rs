//! Loading schemas from YAML or JSON files.
//!
//! # Example YAML
//!
//! ```yaml
//! program: parser_ana
//! description: Load, train, or validate a model
//! arguments:
//!   - flags: ["--model"]
//!     required: true
//! subcommands:
//!   - name: train
//!     arguments:
//!       - flags: ["--batchsize"]
//!         value_type: integer
//!         default: 64
//!       - flags: ["-lr"]
//!         required: true
//! ```
//!
//! Argument names may be omitted; they are derived from the flags the same
//! way [`ArgumentSpec::option`](crate::ArgumentSpec::option) derives them.

use std::path::Path;

use tracing::debug;

use crate::{Schema, SchemaError, validate_schema};

impl Schema {
    /// Parses and validates a YAML schema.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](SchemaError::Yaml) if the text does not deserialize,
    /// or [`Invalid`](SchemaError::Invalid) if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::Schema;
    ///
    /// let schema = Schema::from_yaml_str(
    ///     "program: prog\narguments:\n  - flags: [\"-n\", \"--name\"]\n",
    /// )
    /// .unwrap();
    /// assert_eq!(schema.arguments[0].name, "name");
    /// assert!(schema.allow_abbrev);
    /// ```
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        finish(serde_yaml::from_str(text)?)
    }

    /// Parses and validates a JSON schema.
    ///
    /// # Errors
    ///
    /// Returns [`Json`](SchemaError::Json) if the text does not deserialize,
    /// or [`Invalid`](SchemaError::Invalid) if validation fails.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        finish(serde_json::from_str(text)?)
    }

    /// Loads a schema file; `.json` files are read as JSON, anything else
    /// as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](SchemaError::Io) if the file cannot be read, otherwise
    /// as [`from_yaml_str`](Schema::from_yaml_str) /
    /// [`from_json_str`](Schema::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        debug!(path = %path.display(), is_json, "loading schema file");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }
}

fn finish(mut schema: Schema) -> Result<Schema, SchemaError> {
    schema.fill_derived_names();
    let errors = validate_schema(&schema);
    if errors.is_empty() {
        Ok(schema)
    } else {
        Err(SchemaError::Invalid(errors))
    }
}
