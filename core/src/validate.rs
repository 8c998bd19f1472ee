//! Schema validation.
//!
//! Catches structural problems before a schema is used to parse anything:
//! malformed or duplicate flags, name collisions in the flat result,
//! contradictory settings such as a required option with a default, and
//! positional layouts that cannot be matched unambiguously.
//!
//! # Examples
//!
//! ```
//! use argspec_core::*;
//!
//! let schema = Schema::new("prog")
//!     .with_argument(ArgumentSpec::option(&["--model"]).required());
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Invalid: flag missing its leading dash
//! let bad = Schema::new("prog").with_argument(ArgumentSpec::option(&["model"]));
//! assert_eq!(
//!     validate_schema(&bad),
//!     vec![ValidationError::InvalidFlag("model".to_string())]
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::flag_form;
use crate::{Action, ArgumentSpec, Arity, Schema, Value, ValueType};

const RESERVED_FLAGS: &[&str] = &["-h", "--help"];
const RESERVED_NAMES: &[&str] = &["help"];

/// Schema validation errors.
///
/// Each variant names the offending flag, argument, or subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Program name is empty or whitespace-only.
    #[error("program name cannot be empty")]
    EmptyProgramName,
    /// Dispatch field name is empty.
    #[error("dispatch field cannot be empty")]
    EmptyDispatchField,
    /// An argument has no name and none could be derived from its flags.
    #[error("argument name cannot be empty")]
    EmptyArgumentName,
    /// A subcommand has an empty name.
    #[error("subcommand name cannot be empty")]
    EmptySubcommandName,
    /// Two subcommands share a name.
    #[error("duplicate subcommand: {0}")]
    DuplicateSubcommand(String),
    /// Flag token is not `-x`, `--long`, or `-long`.
    #[error("invalid flag format: {0}")]
    InvalidFlag(String),
    /// Flag or name is claimed by the help machinery.
    #[error("reserved for help output: {0}")]
    Reserved(String),
    /// Two arguments in one scope share a flag.
    #[error("duplicate flag in scope: {0}")]
    DuplicateFlag(String),
    /// Two arguments visible together share a result name.
    #[error("duplicate argument name: {0}")]
    DuplicateArgument(String),
    /// The dispatch field collides with an argument name.
    #[error("argument name collides with dispatch field: {0}")]
    DispatchFieldConflict(String),
    /// A required option also declares a default, which could never apply.
    #[error("argument {0} is required and cannot have a default")]
    RequiredWithDefault(String),
    /// Positionals cannot be marked required; their arity decides.
    #[error("positional argument {0} cannot be marked required")]
    RequiredPositional(String),
    /// Action and arity disagree (e.g. a counter that consumes values).
    #[error("action and arity disagree for argument {0}")]
    ArityMismatch(String),
    /// `store_const` without a constant.
    #[error("argument {0} stores a constant but declares none")]
    MissingConst(String),
    /// `version` action but the schema has no version string.
    #[error("argument {0} prints the version but the schema has none")]
    MissingVersion(String),
    /// A string default cannot be converted to the argument's value type.
    #[error("default for argument {0} does not convert to its value type")]
    InvalidDefault(String),
    /// A positional follows one that consumes a variable number of values.
    #[error("positional argument {0} must be last")]
    VariadicPositionalNotLast(String),
    /// A required positional follows an optional one.
    #[error("required positional argument {0} follows an optional one")]
    RequiredAfterOptional(String),
}

/// Validates a schema.
///
/// Returns an empty vector for a usable schema. Stops at the first problem
/// found, so at most one error is reported.
///
/// # Examples
///
/// ```
/// use argspec_core::*;
///
/// // Required and defaulted at once: the default could never apply.
/// let schema = Schema::new("prog").with_subcommand(
///     SubcommandSpec::new("train").with_argument(
///         ArgumentSpec::option(&["-lr"]).with_default("WarmUp").required(),
///     ),
/// );
/// assert_eq!(
///     validate_schema(&schema),
///     vec![ValidationError::RequiredWithDefault("lr".to_string())]
/// );
/// ```
pub fn validate_schema(schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.program.trim().is_empty() {
        errors.push(ValidationError::EmptyProgramName);
        return errors;
    }
    if schema.dispatch_field.trim().is_empty() {
        errors.push(ValidationError::EmptyDispatchField);
        return errors;
    }

    let mut top_names = HashSet::new();
    errors.extend(validate_arguments(&schema.arguments, schema, &mut top_names));
    if !errors.is_empty() {
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in &schema.subcommands {
        let name = sub.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptySubcommandName);
            return errors;
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateSubcommand(name.to_string()));
            return errors;
        }

        // Subcommands may reuse each other's names, never the top level's.
        let mut names = top_names.clone();
        errors.extend(validate_arguments(&sub.arguments, schema, &mut names));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

fn validate_arguments(
    arguments: &[ArgumentSpec],
    schema: &Schema,
    names: &mut HashSet<String>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut flags = HashSet::new();

    for argument in arguments {
        if let Some(error) = check_argument(argument, schema, names, &mut flags) {
            errors.push(error);
            return errors;
        }
    }

    if let Some(error) = check_positional_layout(arguments) {
        errors.push(error);
    }
    errors
}

fn check_argument(
    argument: &ArgumentSpec,
    schema: &Schema,
    names: &mut HashSet<String>,
    flags: &mut HashSet<String>,
) -> Option<ValidationError> {
    let name = argument.name.as_str();
    if name.trim().is_empty() {
        return Some(ValidationError::EmptyArgumentName);
    }
    if RESERVED_NAMES.contains(&name) {
        return Some(ValidationError::Reserved(name.to_string()));
    }
    if name == schema.dispatch_field {
        return Some(ValidationError::DispatchFieldConflict(name.to_string()));
    }
    if !names.insert(name.to_string()) {
        return Some(ValidationError::DuplicateArgument(name.to_string()));
    }

    for flag in &argument.flags {
        if RESERVED_FLAGS.contains(&flag.as_str()) {
            return Some(ValidationError::Reserved(flag.clone()));
        }
        let Some(form) = flag_form(flag).filter(|_| is_well_formed(flag)) else {
            return Some(ValidationError::InvalidFlag(flag.clone()));
        };
        if !flags.insert(form.key()) {
            return Some(ValidationError::DuplicateFlag(flag.clone()));
        }
    }

    let owned = || name.to_string();
    if argument.is_positional() {
        if argument.required {
            return Some(ValidationError::RequiredPositional(owned()));
        }
        if !argument.action.takes_values() {
            return Some(ValidationError::ArityMismatch(owned()));
        }
    }
    if argument.action.takes_values() != argument.arity.takes_values() {
        return Some(ValidationError::ArityMismatch(owned()));
    }
    if argument.required && argument.default.is_some() {
        return Some(ValidationError::RequiredWithDefault(owned()));
    }
    match argument.action {
        Action::StoreConst if argument.const_value.is_none() => {
            return Some(ValidationError::MissingConst(owned()));
        }
        Action::Version if schema.version.is_none() => {
            return Some(ValidationError::MissingVersion(owned()));
        }
        _ => {}
    }
    if let Some(default) = &argument.default {
        if argument.action.takes_values() && !string_default_converts(&argument.value_type, default)
        {
            return Some(ValidationError::InvalidDefault(owned()));
        }
    }

    None
}

fn is_well_formed(flag: &str) -> bool {
    let body = flag.trim_start_matches('-');
    !body.is_empty()
        && flag.len() - body.len() <= 2
        && !body.starts_with('-')
        && !body.contains(|c: char| c == '=' || c.is_whitespace())
}

/// String defaults are converted like command-line text; any other shape
/// is used as given.
fn string_default_converts(value_type: &ValueType, default: &Value) -> bool {
    match (value_type, default) {
        (ValueType::Integer | ValueType::Float, Value::Str(raw)) => {
            value_type.convert(raw).is_some()
        }
        (_, Value::List(items)) => items
            .iter()
            .all(|item| string_default_converts(value_type, item)),
        _ => true,
    }
}

fn check_positional_layout(arguments: &[ArgumentSpec]) -> Option<ValidationError> {
    let mut seen_optional = false;
    let mut variadic: Option<&str> = None;

    for positional in arguments.iter().filter(|a| a.is_positional()) {
        if let Some(previous) = variadic {
            return Some(ValidationError::VariadicPositionalNotLast(
                previous.to_string(),
            ));
        }
        let optional = positional.arity.allows_none();
        if !optional && seen_optional {
            return Some(ValidationError::RequiredAfterOptional(
                positional.name.clone(),
            ));
        }
        seen_optional |= optional;
        if positional.arity.is_multiple() && positional.arity != Arity::Exactly(1) {
            variadic = Some(&positional.name);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::SubcommandSpec;

    use super::*;

    fn schema_with(argument: ArgumentSpec) -> Schema {
        Schema::new("prog").with_argument(argument)
    }

    #[test]
    fn test_validate_accepts_training_schema() {
        let schema = Schema::new("prog")
            .with_argument(ArgumentSpec::option(&["--model"]).required())
            .with_subcommand(
                SubcommandSpec::new("train")
                    .with_argument(
                        ArgumentSpec::option(&["--batchsize"])
                            .with_type(ValueType::Integer)
                            .with_default(64),
                    )
                    .with_argument(ArgumentSpec::option(&["-lr"]).required()),
            )
            .with_subcommand(
                SubcommandSpec::new("valid")
                    .with_argument(
                        ArgumentSpec::option(&["--batchsize"])
                            .with_type(ValueType::Integer)
                            .with_default(64),
                    )
                    .with_argument(ArgumentSpec::option(&["--out"]).required()),
            );

        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        assert_eq!(
            validate_schema(&Schema::new("  ")),
            vec![ValidationError::EmptyProgramName]
        );
    }

    #[test]
    fn test_validate_rejects_malformed_flags() {
        for flag in ["---model", "--mo del", "--a=b", "-"] {
            let errors = validate_schema(&schema_with(
                ArgumentSpec::option(&[flag]).with_dest("x"),
            ));
            assert_eq!(errors, vec![ValidationError::InvalidFlag(flag.to_string())]);
        }
    }

    #[test]
    fn test_validate_rejects_single_and_double_dash_duplicates() {
        let schema = Schema::new("prog")
            .with_argument(ArgumentSpec::option(&["-lr"]))
            .with_argument(ArgumentSpec::option(&["--lr"]).with_dest("rate"));

        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DuplicateFlag("--lr".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_help_flag() {
        let errors = validate_schema(&schema_with(ArgumentSpec::flag(&["-h", "--hidden"])));
        assert_eq!(errors, vec![ValidationError::Reserved("-h".to_string())]);
    }

    #[test]
    fn test_validate_rejects_name_shadowing_top_level() {
        let schema = Schema::new("prog")
            .with_argument(ArgumentSpec::option(&["--model"]))
            .with_subcommand(
                SubcommandSpec::new("train")
                    .with_argument(ArgumentSpec::option(&["--weights"]).with_dest("model")),
            );

        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DuplicateArgument("model".to_string())]
        );
    }

    #[test]
    fn test_validate_allows_sibling_subcommands_to_share_names() {
        let batch = || ArgumentSpec::option(&["--batchsize"]).with_type(ValueType::Integer);
        let schema = Schema::new("prog")
            .with_subcommand(SubcommandSpec::new("train").with_argument(batch()))
            .with_subcommand(SubcommandSpec::new("valid").with_argument(batch()));

        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_subcommands() {
        let schema = Schema::new("prog")
            .with_subcommand(SubcommandSpec::new("train"))
            .with_subcommand(SubcommandSpec::new("train"));

        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DuplicateSubcommand("train".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_dispatch_field_collision() {
        let schema = schema_with(ArgumentSpec::option(&["--command"]))
            .with_subcommand(SubcommandSpec::new("train"));

        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::DispatchFieldConflict("command".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_required_positional() {
        let mut home = ArgumentSpec::positional("home");
        home.required = true;

        assert_eq!(
            validate_schema(&schema_with(home)),
            vec![ValidationError::RequiredPositional("home".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_counter_with_values() {
        let counter = ArgumentSpec::counter(&["-v"]).with_arity(Arity::One);
        assert_eq!(
            validate_schema(&schema_with(counter)),
            vec![ValidationError::ArityMismatch("v".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_missing_const_and_version() {
        let fast = ArgumentSpec::flag(&["--fast"]).with_action(Action::StoreConst);
        assert_eq!(
            validate_schema(&schema_with(fast)),
            vec![ValidationError::MissingConst("fast".to_string())]
        );

        let version = ArgumentSpec::version(&["-V"]);
        assert_eq!(
            validate_schema(&schema_with(version.clone())),
            vec![ValidationError::MissingVersion("V".to_string())]
        );
        assert!(validate_schema(&schema_with(version).with_version("1.0")).is_empty());
    }

    #[test]
    fn test_validate_checks_string_defaults_against_type() {
        let numeric = ArgumentSpec::option(&["--batchsize"])
            .with_type(ValueType::Integer)
            .with_default("64");
        assert!(validate_schema(&schema_with(numeric)).is_empty());

        let broken = ArgumentSpec::option(&["--batchsize"])
            .with_type(ValueType::Integer)
            .with_default("sixty-four");
        assert_eq!(
            validate_schema(&schema_with(broken)),
            vec![ValidationError::InvalidDefault("batchsize".to_string())]
        );

        // Non-string defaults pass through untouched.
        let heterogeneous = ArgumentSpec::option(&["--subject"])
            .with_arity(Arity::OneOrMore)
            .with_type(ValueType::Integer)
            .with_default(vec![1, 2]);
        assert!(validate_schema(&schema_with(heterogeneous)).is_empty());
    }

    #[test]
    fn test_validate_rejects_positional_after_variadic() {
        let schema = Schema::new("prog")
            .with_argument(ArgumentSpec::positional("files").with_arity(Arity::OneOrMore))
            .with_argument(ArgumentSpec::positional("dest"));

        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::VariadicPositionalNotLast("files".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_required_after_optional_positional() {
        let schema = Schema::new("prog")
            .with_argument(ArgumentSpec::positional("city").with_arity(Arity::Optional))
            .with_argument(ArgumentSpec::positional("home"));

        assert_eq!(
            validate_schema(&schema),
            vec![ValidationError::RequiredAfterOptional("home".to_string())]
        );
    }
}
