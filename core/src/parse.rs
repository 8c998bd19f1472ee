//! Command-line parsing against a [`Schema`].
//!
//! The schema is lowered onto a [`clap::Command`] built at parse time and
//! the matches are resolved back into a flat [`ParseResult`]. Parsing is a
//! single left-to-right pass: top-level tokens first, then, once a bare
//! token names a subcommand, that subcommand's tokens.
//!
//! # Examples
//!
//! ```
//! use argspec_core::*;
//!
//! let schema = Schema::new("prog")
//!     .with_argument(ArgumentSpec::option(&["--model"]).required())
//!     .with_subcommand(
//!         SubcommandSpec::new("train")
//!             .with_argument(
//!                 ArgumentSpec::option(&["--batchsize"])
//!                     .with_type(ValueType::Integer)
//!                     .with_default(64),
//!             )
//!             .with_argument(ArgumentSpec::option(&["-lr"]).required()),
//!     );
//!
//! let outcome = parse(&schema, ["--model", "m.pt", "train", "-lr", "0.1"]).unwrap();
//! let result = outcome.into_result().unwrap();
//! assert_eq!(result.subcommand(), Some("train"));
//! assert_eq!(result.get_str("lr"), Some("0.1"));
//! assert_eq!(result.get_int("batchsize"), Some(64));
//!
//! let err = parse(&schema, ["train", "-lr", "0.1"]).unwrap_err();
//! assert!(matches!(err, ParseError::MissingRequired { .. }));
//! ```

use std::any::Any;
use std::collections::HashSet;

use clap::builder::{PossibleValuesParser, ValueParser, ValueRange};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::types::{FlagForm, flag_form, is_single_dash_long};
use crate::{
    Action, ArgumentSpec, Arity, ParseError, ParseResult, Schema, Value, ValueType,
    validate_schema,
};

/// What a successful pass over the command line produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Arguments were resolved.
    Parsed(ParseResult),
    /// Help was requested; carries the rendered help text.
    Help(String),
    /// A `version` action fired; carries the schema's version string.
    Version(String),
}

impl ParseOutcome {
    /// Returns the result, or `None` for help and version requests.
    pub fn into_result(self) -> Option<ParseResult> {
        match self {
            ParseOutcome::Parsed(result) => Some(result),
            ParseOutcome::Help(_) | ParseOutcome::Version(_) => None,
        }
    }
}

/// Parses `tokens` (without the program name) against `schema`.
///
/// # Errors
///
/// Returns [`ParseError::InvalidSchema`] if the schema fails validation,
/// otherwise the variant matching the first problem found on the command
/// line.
pub fn parse<I, T>(schema: &Schema, tokens: I) -> Result<ParseOutcome, ParseError>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let errors = validate_schema(schema);
    if !errors.is_empty() {
        return Err(ParseError::InvalidSchema(errors));
    }

    let (tokens, rewritten) = normalize_tokens(schema, tokens.into_iter().map(Into::into));
    debug!(program = %schema.program, ?tokens, "parsing command line");

    let argv = std::iter::once(schema.program.clone()).chain(tokens);
    match build_command(schema).try_get_matches_from(argv) {
        Ok(matches) => Ok(ParseOutcome::Parsed(resolve(schema, &matches))),
        Err(err) => classify_error(schema, &err, &rewritten),
    }
}

/// Rewrites single-dash long flags (`-lr`, `-lr=0.1`) to their `--` form.
/// Tokens after a literal `--` are left alone. Also returns the rewritten
/// flags in their `--` spelling.
fn normalize_tokens(
    schema: &Schema,
    tokens: impl Iterator<Item = String>,
) -> (Vec<String>, HashSet<String>) {
    let single_dash: HashSet<&str> = schema
        .all_arguments()
        .flat_map(|a| a.flags.iter())
        .map(String::as_str)
        .filter(|f| is_single_dash_long(f))
        .collect();

    let mut terminated = false;
    let mut rewritten_flags = HashSet::new();
    let tokens: Vec<String> = tokens
        .map(|token| {
            if terminated {
                return token;
            }
            if token == "--" {
                terminated = true;
                return token;
            }
            let flag = token.split_once('=').map_or(token.as_str(), |(f, _)| f);
            if single_dash.contains(flag) {
                rewritten_flags.insert(format!("-{flag}"));
                let rewritten = format!("-{token}");
                debug!(%token, %rewritten, "normalized single-dash flag");
                rewritten
            } else {
                token
            }
        })
        .collect();
    (tokens, rewritten_flags)
}

/// Undoes [`normalize_tokens`] for a token quoted back to the user.
fn as_typed(token: &str, rewritten: &HashSet<String>) -> Option<String> {
    let flag = token.split_once('=').map_or(token, |(f, _)| f);
    rewritten
        .contains(flag)
        .then(|| token.strip_prefix('-').unwrap_or(token).to_string())
}

/// Once any flag in a scope looks like a negative number, tokens such as
/// `-1` are flags there. Otherwise they are values.
fn negative_numbers_are_values(arguments: &[ArgumentSpec]) -> bool {
    !arguments
        .iter()
        .flat_map(|a| a.flags.iter())
        .any(|flag| looks_like_negative_number(flag))
}

fn looks_like_negative_number(token: &str) -> bool {
    token.strip_prefix('-').is_some_and(|rest| {
        rest.chars().any(|c| c.is_ascii_digit())
            && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
            && rest.matches('.').count() <= 1
    })
}

fn build_command(schema: &Schema) -> Command {
    let mut command = scope_command(schema.program.clone(), schema)
        .disable_help_subcommand(true);
    if let Some(description) = &schema.description {
        command = command.about(description.clone());
    }
    if let Some(epilog) = &schema.epilog {
        command = command.after_help(epilog.clone());
    }
    let negatives = negative_numbers_are_values(&schema.arguments);
    command = command.args(schema.arguments.iter().map(|spec| build_arg(spec, negatives)));

    for sub in &schema.subcommands {
        let negatives = negative_numbers_are_values(&sub.arguments);
        let mut sub_command = scope_command(sub.name.clone(), schema)
            .args(sub.arguments.iter().map(|spec| build_arg(spec, negatives)));
        if let Some(help) = &sub.help {
            sub_command = sub_command.about(help.clone());
        }
        command = command.subcommand(sub_command);
    }
    debug!(
        program = %schema.program,
        subcommands = schema.subcommands.len(),
        "built command"
    );
    command
}

/// Settings shared by the root command and every subcommand.
fn scope_command(name: String, schema: &Schema) -> Command {
    let mut command = Command::new(name)
        .disable_version_flag(true)
        .args_override_self(true)
        .infer_long_args(schema.allow_abbrev);
    if let Some(version) = &schema.version {
        command = command.version(version.clone());
    }
    command
}

fn build_arg(spec: &ArgumentSpec, negative_numbers: bool) -> Arg {
    let mut arg = Arg::new(spec.name.clone());

    for flag in &spec.flags {
        arg = match flag_form(flag) {
            Some(FlagForm::Short(c)) if arg.get_short().is_none() => arg.short(c),
            Some(FlagForm::Short(c)) => arg.visible_short_alias(c),
            Some(FlagForm::Long(long)) if arg.get_long().is_none() => arg.long(long.to_string()),
            Some(FlagForm::Long(long)) => arg.visible_alias(long.to_string()),
            None => arg,
        };
    }

    arg = match spec.action {
        Action::Store => arg.action(ArgAction::Set),
        Action::Append => arg.action(ArgAction::Append),
        Action::StoreConst | Action::StoreTrue | Action::StoreFalse => {
            arg.action(ArgAction::SetTrue)
        }
        Action::Count => arg.action(ArgAction::Count),
        Action::Version => arg.action(ArgAction::Version),
    };

    if spec.action.takes_values() {
        // Positionals express optionality through `required` instead.
        let arity = match spec.arity {
            Arity::Optional if spec.is_positional() => Arity::One,
            Arity::ZeroOrMore if spec.is_positional() => Arity::OneOrMore,
            other => other,
        };
        arg = arg
            .num_args(value_range(arity))
            .value_parser(value_parser(&spec.value_type))
            .allow_negative_numbers(negative_numbers);
        if let Some(metavar) = &spec.metavar {
            arg = arg.value_name(metavar.clone());
        }
    }

    let required = if spec.is_positional() {
        !spec.arity.allows_none()
    } else {
        spec.required
    };
    arg = arg.required(required);

    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }
    arg
}

fn value_range(arity: Arity) -> ValueRange {
    match arity {
        Arity::One => ValueRange::new(1),
        Arity::Optional => ValueRange::new(0..=1),
        Arity::ZeroOrMore => ValueRange::new(0..),
        Arity::OneOrMore => ValueRange::new(1..),
        Arity::Exactly(n) => ValueRange::new(n),
    }
}

fn value_parser(value_type: &ValueType) -> ValueParser {
    match value_type {
        ValueType::String => ValueParser::string(),
        ValueType::Integer => ValueParser::new(clap::value_parser!(i64)),
        ValueType::Float => ValueParser::new(|raw: &str| raw.parse::<f64>()),
        ValueType::Choice(choices) => ValueParser::new(PossibleValuesParser::new(choices.clone())),
    }
}

fn resolve(schema: &Schema, matches: &ArgMatches) -> ParseResult {
    let mut result = ParseResult::new(&schema.dispatch_field);
    resolve_scope(&schema.arguments, matches, &mut result);

    if let Some((name, sub_matches)) = matches.subcommand() {
        debug!(subcommand = name, "selected subcommand");
        if let Some(sub) = schema.find_subcommand(name) {
            resolve_scope(&sub.arguments, sub_matches, &mut result);
        }
        result.select(name);
    }
    result
}

fn resolve_scope(arguments: &[ArgumentSpec], matches: &ArgMatches, result: &mut ParseResult) {
    for spec in arguments {
        if let Some(value) = resolve_argument(spec, matches) {
            result.insert(&spec.name, value);
        }
    }
}

fn resolve_argument(spec: &ArgumentSpec, matches: &ArgMatches) -> Option<Value> {
    let id = spec.name.as_str();
    let given = matches.value_source(id) == Some(ValueSource::CommandLine);

    match spec.action {
        Action::Version => None,
        Action::StoreTrue if given => Some(Value::Bool(true)),
        Action::StoreTrue => Some(spec.default.clone().unwrap_or(Value::Bool(false))),
        Action::StoreFalse if given => Some(Value::Bool(false)),
        Action::StoreFalse => Some(spec.default.clone().unwrap_or(Value::Bool(true))),
        Action::StoreConst if given => spec.const_value.clone(),
        Action::StoreConst => spec.default.clone(),
        Action::Count if given => {
            let base = spec.default.as_ref().and_then(Value::as_int).unwrap_or(0);
            Some(Value::Int(base.saturating_add(i64::from(matches.get_count(id)))))
        }
        Action::Count => spec.default.clone(),
        Action::Store | Action::Append if given => Some(shape(spec, typed_values(spec, matches))),
        Action::Store | Action::Append => absent_value(spec),
    }
}

/// Scalar for single-value arities, list otherwise. An optional-arity
/// argument given without a value takes its constant.
fn shape(spec: &ArgumentSpec, mut values: Vec<Value>) -> Value {
    if spec.action == Action::Append || spec.arity.is_multiple() {
        return Value::List(values);
    }
    match values.pop() {
        Some(value) => value,
        None => spec.const_value.clone().unwrap_or(Value::Null),
    }
}

fn absent_value(spec: &ArgumentSpec) -> Option<Value> {
    match &spec.default {
        Some(Value::Str(raw)) => Some(
            spec.value_type
                .convert(raw)
                .unwrap_or_else(|| Value::Str(raw.clone())),
        ),
        Some(Value::List(items)) => Some(Value::List(
            items
                .iter()
                .map(|item| match item {
                    Value::Str(raw) => spec
                        .value_type
                        .convert(raw)
                        .unwrap_or_else(|| item.clone()),
                    other => other.clone(),
                })
                .collect(),
        )),
        Some(other) => Some(other.clone()),
        None if spec.is_positional() && spec.arity == Arity::ZeroOrMore => {
            Some(Value::List(Vec::new()))
        }
        None => None,
    }
}

fn typed_values(spec: &ArgumentSpec, matches: &ArgMatches) -> Vec<Value> {
    let id = spec.name.as_str();
    match spec.value_type {
        ValueType::Integer => collect(matches, id, |n: &i64| Value::Int(*n)),
        ValueType::Float => collect(matches, id, |x: &f64| Value::Float(*x)),
        ValueType::String | ValueType::Choice(_) => {
            collect(matches, id, |s: &String| Value::Str(s.clone()))
        }
    }
}

fn collect<T>(matches: &ArgMatches, id: &str, convert: impl Fn(&T) -> Value) -> Vec<Value>
where
    T: Any + Clone + Send + Sync + 'static,
{
    matches
        .try_get_many::<T>(id)
        .ok()
        .flatten()
        .map(|values| values.map(&convert).collect())
        .unwrap_or_default()
}

fn classify_error(
    schema: &Schema,
    err: &clap::Error,
    rewritten: &HashSet<String>,
) -> Result<ParseOutcome, ParseError> {
    let mut usage = err.render().to_string();
    debug!(kind = ?err.kind(), "command line rejected");

    let error = match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            return Ok(ParseOutcome::Help(usage));
        }
        ErrorKind::DisplayVersion => {
            return Ok(ParseOutcome::Version(
                schema.version.clone().unwrap_or_default(),
            ));
        }
        ErrorKind::MissingRequiredArgument => ParseError::MissingRequired {
            names: context(err, ContextKind::InvalidArg)
                .iter()
                .map(|display| argument_name(schema, display))
                .collect(),
            usage,
        },
        ErrorKind::UnknownArgument => {
            let mut token = first_context(err, ContextKind::InvalidArg);
            if let Some(typed) = as_typed(&token, rewritten) {
                usage = usage.replacen(&format!("'{token}'"), &format!("'{typed}'"), 1);
                token = typed;
            }
            ParseError::UnknownArgument { token, usage }
        }
        ErrorKind::TooManyValues => ParseError::UnknownArgument {
            token: first_context(err, ContextKind::InvalidValue),
            usage,
        },
        ErrorKind::InvalidSubcommand => ParseError::UnknownSubcommand {
            name: first_context(err, ContextKind::InvalidSubcommand),
            choices: schema
                .subcommand_names()
                .into_iter()
                .map(String::from)
                .collect(),
            usage,
        },
        ErrorKind::InvalidValue | ErrorKind::ValueValidation => {
            let argument = argument_name(schema, &first_context(err, ContextKind::InvalidArg));
            let value = first_context(err, ContextKind::InvalidValue);
            if value.is_empty() && err.kind() == ErrorKind::InvalidValue {
                ParseError::MissingValue { argument, usage }
            } else {
                ParseError::InvalidValue {
                    argument,
                    value,
                    usage,
                }
            }
        }
        ErrorKind::TooFewValues | ErrorKind::WrongNumberOfValues => ParseError::MissingValue {
            argument: argument_name(schema, &first_context(err, ContextKind::InvalidArg)),
            usage,
        },
        _ => ParseError::Rejected {
            message: usage.lines().next().unwrap_or_default().to_string(),
            usage,
        },
    };
    Err(error)
}

fn context(err: &clap::Error, kind: ContextKind) -> Vec<String> {
    match err.get(kind) {
        Some(ContextValue::String(value)) => vec![value.clone()],
        Some(ContextValue::Strings(values)) => values.clone(),
        _ => Vec::new(),
    }
}

fn first_context(err: &clap::Error, kind: ContextKind) -> String {
    context(err, kind).into_iter().next().unwrap_or_default()
}

/// Maps clap's rendering of an argument (`--model <model>`, `<home>...`)
/// back to the schema's result name.
fn argument_name(schema: &Schema, display: &str) -> String {
    let head = display.split_whitespace().next().unwrap_or(display);
    let head = head
        .trim_end_matches("...")
        .trim_matches(|c: char| matches!(c, '<' | '>' | '[' | ']'));

    schema
        .all_arguments()
        .find(|spec| {
            if head.starts_with('-') {
                spec.matches(head)
            } else {
                spec.is_positional()
                    && (spec.name == head || spec.metavar.as_deref() == Some(head))
            }
        })
        .map_or_else(|| head.to_string(), |spec| spec.name.clone())
}
