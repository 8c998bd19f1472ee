//! Declarative command-line schemas with one level of subcommand dispatch.
//!
//! This crate separates *declaring* a command-line surface from *parsing*
//! one:
//!
//! - [`Schema`]: the program, its top-level arguments, and its
//!   subcommands. Built once, never mutated by parsing.
//! - [`ArgumentSpec`]: an option or positional with its [`Arity`],
//!   [`Action`], [`ValueType`], default, and `required` flag.
//! - [`SubcommandSpec`]: a named group of arguments selected by a bare
//!   token.
//! - [`ParseResult`]: resolved [`Value`]s keyed by argument name plus the
//!   selected subcommand.
//!
//! [`parse`] turns process tokens into a [`ParseOutcome`] or a
//! [`ParseError`]. Schemas can be built in code or loaded from YAML/JSON
//! with [`Schema::load`]; either way [`validate_schema`] checks them first.
//!
//! # Example
//!
//! ```
//! use argspec_core::*;
//!
//! let schema = Schema::new("prog")
//!     .with_argument(ArgumentSpec::option(&["--model"]).required())
//!     .with_subcommand(
//!         SubcommandSpec::new("valid")
//!             .with_argument(ArgumentSpec::option(&["--out"]).required()),
//!     );
//! assert!(validate_schema(&schema).is_empty());
//!
//! let result = parse(&schema, ["--model", "m.pt", "valid", "--out", "r.json"])
//!     .unwrap()
//!     .into_result()
//!     .unwrap();
//! assert_eq!(result.get_str("out"), Some("r.json"));
//!
//! let err = parse(&schema, ["--model", "m.pt", "valid"]).unwrap_err();
//! assert_eq!(err.exit_code(), 2);
//! ```

mod error;
mod load;
mod parse;
mod result;
mod types;
mod validate;
mod value;

pub use error::{ParseError, SchemaError, USAGE_EXIT_CODE};
pub use parse::{ParseOutcome, parse};
pub use result::ParseResult;
pub use types::{
    Action, ArgumentSpec, Arity, DEFAULT_DISPATCH_FIELD, Schema, SubcommandSpec, ValueType,
    derive_name,
};
pub use validate::{ValidationError, validate_schema};
pub use value::Value;
