//! The `parser-ana` command-line surface and its typed view.

use std::path::PathBuf;

use argspec_core::{ArgumentSpec, ParseResult, Schema, SubcommandSpec, ValueType};
use thiserror::Error;

const EPILOG: &str = "examples:
    parser-ana --model weights.pt train -lr 0.1
    parser-ana --model weights.pt valid --batchsize 32 --out result.json";

/// Batch size used by `train` and `valid` when `--batchsize` is absent.
pub const DEFAULT_BATCH_SIZE: i64 = 64;

fn batchsize(help: &str) -> ArgumentSpec {
    ArgumentSpec::option(&["--batchsize"])
        .with_type(ValueType::Integer)
        .with_default(DEFAULT_BATCH_SIZE)
        .with_help(help)
}

/// Builds the schema: a required `--model` and the `train`/`valid`
/// subcommands.
pub fn build_schema() -> Schema {
    Schema::new("parser-ana")
        .with_description("Command-line arguments for loading, training, and validating a model")
        .with_epilog(EPILOG)
        .with_argument(
            ArgumentSpec::option(&["--model"])
                .required()
                .with_help("Model load path"),
        )
        .with_subcommand(
            SubcommandSpec::new("train")
                .with_help("Train a model")
                .with_argument(batchsize("Train batch size"))
                .with_argument(
                    ArgumentSpec::option(&["-lr"])
                        .required()
                        .with_help("Learning rate of train"),
                ),
        )
        .with_subcommand(
            SubcommandSpec::new("valid")
                .with_help("Validate a model")
                .with_argument(batchsize("Valid batch size"))
                .with_argument(
                    ArgumentSpec::option(&["--out"])
                        .required()
                        .with_help("Result output path"),
                ),
        )
}

/// A parse result that does not fit the typed view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    /// A field the schema always produces was absent or mistyped.
    #[error("missing field: {0}")]
    Missing(&'static str),
    /// The result selected a subcommand this program does not define.
    #[error("unexpected subcommand: {0}")]
    UnknownCommand(String),
}

/// Arguments of the `train` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainArgs {
    pub batchsize: i64,
    pub lr: String,
}

/// Arguments of the `valid` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidArgs {
    pub batchsize: i64,
    pub out: PathBuf,
}

/// The selected subcommand with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Train(TrainArgs),
    Valid(ValidArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Train(_) => "train",
            Command::Valid(_) => "valid",
        }
    }
}

/// Typed form of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Model load path.
    pub model: String,
    /// `None` when no subcommand was given.
    pub command: Option<Command>,
}

impl Invocation {
    /// Reads the typed view out of a result parsed with [`build_schema`].
    pub fn from_result(result: &ParseResult) -> Result<Self, InvocationError> {
        let model = required_str(result, "model")?;
        let command = match result.subcommand() {
            None => None,
            Some("train") => Some(Command::Train(TrainArgs {
                batchsize: required_int(result, "batchsize")?,
                lr: required_str(result, "lr")?,
            })),
            Some("valid") => Some(Command::Valid(ValidArgs {
                batchsize: required_int(result, "batchsize")?,
                out: PathBuf::from(required_str(result, "out")?),
            })),
            Some(other) => return Err(InvocationError::UnknownCommand(other.to_string())),
        };
        Ok(Self { model, command })
    }
}

fn required_str(result: &ParseResult, name: &'static str) -> Result<String, InvocationError> {
    result
        .get_str(name)
        .map(String::from)
        .ok_or(InvocationError::Missing(name))
}

fn required_int(result: &ParseResult, name: &'static str) -> Result<i64, InvocationError> {
    result.get_int(name).ok_or(InvocationError::Missing(name))
}
