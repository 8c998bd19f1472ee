//! Error types for schema loading and command-line parsing.

use thiserror::Error;

use crate::ValidationError;

/// Exit status conventionally used for command-line usage errors.
pub const USAGE_EXIT_CODE: i32 = 2;

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while loading a schema file.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but describes an unusable schema.
    #[error("invalid schema: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

/// Failures reported by [`parse`](crate::parse).
///
/// Every command-line variant carries `usage`: the rendered diagnostic with
/// the usage line, ready to print on stderr. There is never a partial
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// One or more required arguments were not given.
    #[error("the following arguments are required: {}", .names.join(", "))]
    MissingRequired { names: Vec<String>, usage: String },

    /// A flag that consumes values was given none.
    #[error("argument {argument}: expected a value")]
    MissingValue { argument: String, usage: String },

    /// A token matched no declared flag or position.
    #[error("unrecognized argument: {token}")]
    UnknownArgument { token: String, usage: String },

    /// A bare token in subcommand position named no registered subcommand.
    #[error("invalid choice: '{name}' (choose from {})", .choices.join(", "))]
    UnknownSubcommand {
        name: String,
        choices: Vec<String>,
        usage: String,
    },

    /// A value failed conversion or fell outside its choices.
    #[error("argument {argument}: invalid value '{value}'")]
    InvalidValue {
        argument: String,
        value: String,
        usage: String,
    },

    /// The schema itself failed validation.
    #[error("invalid schema: {}", join_errors(.0))]
    InvalidSchema(Vec<ValidationError>),

    /// Any other rejection by the underlying parser.
    #[error("{message}")]
    Rejected { message: String, usage: String },
}

impl ParseError {
    /// Text to show the user: the rendered usage diagnostic, or the error
    /// itself when the schema was at fault.
    pub fn report(&self) -> String {
        match self {
            ParseError::MissingRequired { usage, .. }
            | ParseError::MissingValue { usage, .. }
            | ParseError::UnknownArgument { usage, .. }
            | ParseError::UnknownSubcommand { usage, .. }
            | ParseError::InvalidValue { usage, .. }
            | ParseError::Rejected { usage, .. } => usage.clone(),
            ParseError::InvalidSchema(_) => format!("error: {self}\n"),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        USAGE_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_messages() {
        let missing = ParseError::MissingRequired {
            names: vec!["model".into(), "out".into()],
            usage: "usage".into(),
        };
        assert_eq!(
            missing.to_string(),
            "the following arguments are required: model, out"
        );
        assert_eq!(missing.report(), "usage");
        assert_eq!(missing.exit_code(), 2);

        let bogus = ParseError::UnknownSubcommand {
            name: "bogus".into(),
            choices: vec!["train".into(), "valid".into()],
            usage: String::new(),
        };
        assert_eq!(
            bogus.to_string(),
            "invalid choice: 'bogus' (choose from train, valid)"
        );
    }

    #[test]
    fn test_invalid_schema_report() {
        let err = ParseError::InvalidSchema(vec![ValidationError::EmptyProgramName]);
        assert_eq!(err.report(), "error: invalid schema: program name cannot be empty\n");
    }
}
