//! Schema type definitions for command-line surfaces.
//!
//! This module defines the declarative data model: a [`Schema`] holds
//! top-level [`ArgumentSpec`]s and named [`SubcommandSpec`]s. The types
//! serialize with [`serde`] so a schema can be written by hand in YAML or
//! JSON as well as built in code.

use serde::{Deserialize, Serialize};

use crate::Value;

/// Result key that records the selected subcommand unless overridden.
pub const DEFAULT_DISPATCH_FIELD: &str = "command";

/// How raw token text is converted into a [`Value`].
///
/// # Examples
///
/// ```
/// use argspec_core::ValueType;
///
/// assert_eq!(ValueType::default(), ValueType::String);
/// let fmt = ValueType::Choice(vec!["json".into(), "yaml".into()]);
/// assert!(matches!(fmt, ValueType::Choice(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Passed through unchanged (the default).
    #[default]
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// One of a fixed set of strings.
    Choice(Vec<String>),
}

impl ValueType {
    /// Converts raw text, returning `None` when the text does not fit.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::{Value, ValueType};
    ///
    /// assert_eq!(ValueType::Integer.convert("64"), Some(Value::Int(64)));
    /// assert_eq!(ValueType::Integer.convert("sixty"), None);
    /// assert_eq!(ValueType::String.convert("64"), Some(Value::from("64")));
    /// ```
    pub fn convert(&self, raw: &str) -> Option<Value> {
        match self {
            ValueType::String => Some(Value::Str(raw.to_string())),
            ValueType::Integer => raw.parse().ok().map(Value::Int),
            ValueType::Float => raw.parse().ok().map(Value::Float),
            ValueType::Choice(choices) => choices
                .iter()
                .any(|c| c == raw)
                .then(|| Value::Str(raw.to_string())),
        }
    }
}

/// How many value tokens an argument consumes when matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly one value, stored as a scalar (the default).
    #[default]
    One,
    /// Zero or one value.
    Optional,
    /// Any number of values, stored as a list.
    ZeroOrMore,
    /// At least one value, stored as a list.
    OneOrMore,
    /// A fixed number of values, stored as a list. `Exactly(0)` is used by
    /// flag-style actions that consume nothing.
    Exactly(usize),
}

impl Arity {
    /// Returns `true` if this arity consumes at least one token in some form.
    pub fn takes_values(self) -> bool {
        !matches!(self, Arity::Exactly(0))
    }

    /// Returns `true` if the resolved value is a list rather than a scalar.
    pub fn is_multiple(self) -> bool {
        match self {
            Arity::One | Arity::Optional => false,
            Arity::ZeroOrMore | Arity::OneOrMore => true,
            Arity::Exactly(n) => n >= 1,
        }
    }

    /// Returns `true` if a positional with this arity can be left out.
    pub fn allows_none(self) -> bool {
        matches!(self, Arity::Optional | Arity::ZeroOrMore | Arity::Exactly(0))
    }
}

/// What a matched argument does with the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Stores the converted value(s); the last occurrence wins.
    #[default]
    Store,
    /// Stores [`ArgumentSpec::const_value`] when the flag is present.
    StoreConst,
    /// Stores `true` when present, `false` otherwise.
    StoreTrue,
    /// Stores `false` when present, `true` otherwise.
    StoreFalse,
    /// Accumulates values across occurrences.
    Append,
    /// Counts occurrences.
    Count,
    /// Prints the schema version and stops.
    Version,
}

impl Action {
    /// Returns `true` if this action consumes value tokens.
    pub fn takes_values(self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }
}

/// Surface form of a flag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlagForm<'a> {
    Short(char),
    Long(&'a str),
}

impl FlagForm<'_> {
    /// Canonical double-dash/single-char spelling, used for duplicate checks.
    pub(crate) fn key(self) -> String {
        match self {
            FlagForm::Short(c) => format!("-{c}"),
            FlagForm::Long(long) => format!("--{long}"),
        }
    }
}

/// Classifies a flag token. Single-dash tokens longer than one character
/// (`-lr`) are long flags spelled with one dash.
pub(crate) fn flag_form(token: &str) -> Option<FlagForm<'_>> {
    if let Some(long) = token.strip_prefix("--") {
        return (!long.is_empty()).then_some(FlagForm::Long(long));
    }
    let rest = token.strip_prefix('-')?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(FlagForm::Short(c)),
        (Some(_), Some(_)) => Some(FlagForm::Long(rest)),
        _ => None,
    }
}

/// Returns `true` for multi-character flags written with a single dash.
pub(crate) fn is_single_dash_long(token: &str) -> bool {
    !token.starts_with("--") && matches!(flag_form(token), Some(FlagForm::Long(_)))
}

/// Derives a result name from flag tokens: the first `--` flag if any,
/// otherwise the first flag, with leading dashes removed and inner dashes
/// turned into underscores.
///
/// # Examples
///
/// ```
/// use argspec_core::derive_name;
///
/// assert_eq!(derive_name(&["-n", "--name"]), Some("name".to_string()));
/// assert_eq!(derive_name(&["-lr"]), Some("lr".to_string()));
/// assert_eq!(derive_name(&["-student-of-IBM"]), Some("student_of_IBM".to_string()));
/// assert_eq!(derive_name::<&str>(&[]), None);
/// ```
pub fn derive_name<S: AsRef<str>>(flags: &[S]) -> Option<String> {
    let chosen = flags
        .iter()
        .map(AsRef::as_ref)
        .find(|f| f.starts_with("--"))
        .or_else(|| flags.first().map(AsRef::as_ref))?;
    let stripped = chosen.trim_start_matches('-');
    (!stripped.is_empty()).then(|| stripped.replace('-', "_"))
}

/// One declared argument or option.
///
/// Options carry one or more flag tokens; positionals carry none and are
/// matched by order. Use the constructors ([`option`](ArgumentSpec::option),
/// [`positional`](ArgumentSpec::positional), [`flag`](ArgumentSpec::flag),
/// [`counter`](ArgumentSpec::counter), [`version`](ArgumentSpec::version))
/// and chain the `with_*` modifiers.
///
/// # Examples
///
/// ```
/// use argspec_core::{Arity, ArgumentSpec, Value, ValueType};
///
/// let batch = ArgumentSpec::option(&["--batchsize"])
///     .with_type(ValueType::Integer)
///     .with_default(64);
/// assert_eq!(batch.name, "batchsize");
/// assert_eq!(batch.default, Some(Value::Int(64)));
/// assert!(!batch.is_positional());
///
/// let home = ArgumentSpec::positional("home").with_arity(Arity::ZeroOrMore);
/// assert!(home.is_positional());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// Result key for this argument.
    #[serde(default)]
    pub name: String,
    /// Flag tokens; empty for positionals.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// Number of value tokens consumed.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub arity: Arity,
    /// What happens when the argument is matched.
    #[serde(default)]
    pub action: Action,
    /// How value tokens are converted.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub value_type: ValueType,
    /// Value used when the argument is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Value stored by `store_const`, or by an optional-arity option given
    /// without a value.
    #[serde(default, rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
    /// Must be present on the command line (options only).
    #[serde(default)]
    pub required: bool,
    /// Help text shown in usage output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Placeholder shown for the value in usage output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
}

impl ArgumentSpec {
    fn blank(name: String, flags: Vec<String>) -> Self {
        Self {
            name,
            flags,
            arity: Arity::One,
            action: Action::Store,
            value_type: ValueType::String,
            default: None,
            const_value: None,
            required: false,
            help: None,
            metavar: None,
        }
    }

    fn from_flags(flags: &[&str]) -> Self {
        let name = derive_name(flags).unwrap_or_default();
        Self::blank(name, flags.iter().map(|f| f.to_string()).collect())
    }

    /// Creates an option that stores exactly one string value.
    pub fn option(flags: &[&str]) -> Self {
        Self::from_flags(flags)
    }

    /// Creates a positional argument that takes exactly one value.
    pub fn positional(name: &str) -> Self {
        Self::blank(name.to_string(), Vec::new())
    }

    /// Creates a boolean switch (`store_true`).
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::{Action, ArgumentSpec, Arity};
    ///
    /// let dry = ArgumentSpec::flag(&["--dry-run"]);
    /// assert_eq!(dry.name, "dry_run");
    /// assert_eq!(dry.action, Action::StoreTrue);
    /// assert_eq!(dry.arity, Arity::Exactly(0));
    /// ```
    pub fn flag(flags: &[&str]) -> Self {
        Self::from_flags(flags)
            .with_action(Action::StoreTrue)
            .with_arity(Arity::Exactly(0))
    }

    /// Creates an occurrence counter (`-vvv` → 3).
    pub fn counter(flags: &[&str]) -> Self {
        Self::from_flags(flags)
            .with_action(Action::Count)
            .with_arity(Arity::Exactly(0))
    }

    /// Creates a flag that prints the schema version.
    pub fn version(flags: &[&str]) -> Self {
        Self::from_flags(flags)
            .with_action(Action::Version)
            .with_arity(Arity::Exactly(0))
    }

    /// Overrides the result name.
    pub fn with_dest(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sets the action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Sets the arity.
    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    /// Sets the value type.
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the constant value.
    pub fn with_const(mut self, value: impl Into<Value>) -> Self {
        self.const_value = Some(value.into());
        self
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the value placeholder.
    pub fn with_metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }

    /// Returns `true` if this argument is matched by position.
    pub fn is_positional(&self) -> bool {
        self.flags.is_empty()
    }

    /// Checks if a flag token names this argument. `--lr` and `-lr` are
    /// the same flag.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::ArgumentSpec;
    ///
    /// let lr = ArgumentSpec::option(&["-lr"]);
    /// assert!(lr.matches("-lr"));
    /// assert!(lr.matches("--lr"));
    /// assert!(!lr.matches("-l"));
    /// ```
    pub fn matches(&self, token: &str) -> bool {
        let Some(wanted) = flag_form(token).map(FlagForm::key) else {
            return false;
        };
        self.flags
            .iter()
            .filter_map(|f| flag_form(f))
            .any(|form| form.key() == wanted)
    }
}

/// A named sub-schema selected by the first bare token that names it.
///
/// # Examples
///
/// ```
/// use argspec_core::{ArgumentSpec, SubcommandSpec};
///
/// let valid = SubcommandSpec::new("valid")
///     .with_help("Validate a model")
///     .with_argument(ArgumentSpec::option(&["--out"]).required());
///
/// assert_eq!(valid.name, "valid");
/// assert!(valid.find_argument("out").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcommandSpec {
    /// Dispatch key.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Arguments local to this subcommand.
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

impl SubcommandSpec {
    /// Creates an empty subcommand.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a description.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Adds an argument.
    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Finds an argument by result name.
    pub fn find_argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

fn default_allow_abbrev() -> bool {
    true
}

fn default_dispatch_field() -> String {
    DEFAULT_DISPATCH_FIELD.to_string()
}

/// Complete declared command-line surface.
///
/// A schema is built once and treated as immutable; [`parse`](crate::parse)
/// only borrows it.
///
/// # Examples
///
/// ```
/// use argspec_core::*;
///
/// let schema = Schema::new("prog")
///     .with_argument(ArgumentSpec::option(&["--model"]).required())
///     .with_subcommand(
///         SubcommandSpec::new("train")
///             .with_argument(ArgumentSpec::option(&["-lr"]).required()),
///     );
///
/// assert_eq!(schema.subcommand_names(), vec!["train"]);
/// assert_eq!(schema.dispatch_field, "command");
/// assert_eq!(schema.arguments_for(Some("train")).len(), 2);
/// assert!(validate_schema(&schema).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Program name shown in usage output.
    pub program: String,
    /// Text shown above the argument list in help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Text shown after the argument list in help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epilog: Option<String>,
    /// Version string printed by a `version` action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Accept unambiguous prefixes of long flags.
    #[serde(default = "default_allow_abbrev")]
    pub allow_abbrev: bool,
    /// Arguments valid regardless of subcommand.
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    /// Registered subcommands, in declaration order.
    #[serde(default)]
    pub subcommands: Vec<SubcommandSpec>,
    /// Result key recording the selected subcommand.
    #[serde(default = "default_dispatch_field")]
    pub dispatch_field: String,
}

impl Schema {
    /// Creates an empty schema for `program`.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            description: None,
            epilog: None,
            version: None,
            allow_abbrev: default_allow_abbrev(),
            arguments: Vec::new(),
            subcommands: Vec::new(),
            dispatch_field: default_dispatch_field(),
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds an epilog.
    pub fn with_epilog(mut self, epilog: &str) -> Self {
        self.epilog = Some(epilog.to_string());
        self
    }

    /// Sets the version string.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Enables or disables long-flag prefix matching.
    pub fn with_abbrev(mut self, allow: bool) -> Self {
        self.allow_abbrev = allow;
        self
    }

    /// Adds a top-level argument.
    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Registers a subcommand.
    pub fn with_subcommand(mut self, subcommand: SubcommandSpec) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Renames the dispatch field.
    pub fn with_dispatch_field(mut self, field: &str) -> Self {
        self.dispatch_field = field.to_string();
        self
    }

    /// Finds a subcommand by name.
    pub fn find_subcommand(&self, name: &str) -> Option<&SubcommandSpec> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    /// Finds a top-level argument by result name.
    pub fn find_argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Gets all subcommand names, in declaration order.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }

    /// Gets the arguments in scope once `subcommand` is selected.
    ///
    /// Returns top-level arguments first, followed by the subcommand's own.
    pub fn arguments_for(&self, subcommand: Option<&str>) -> Vec<&ArgumentSpec> {
        let mut arguments: Vec<&ArgumentSpec> = self.arguments.iter().collect();
        if let Some(sub) = subcommand.and_then(|name| self.find_subcommand(name)) {
            arguments.extend(sub.arguments.iter());
        }
        arguments
    }

    /// Iterates over every argument in every scope.
    pub fn all_arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments
            .iter()
            .chain(self.subcommands.iter().flat_map(|s| s.arguments.iter()))
    }

    /// Fills in result names left empty, deriving them from flags.
    pub(crate) fn fill_derived_names(&mut self) {
        let scopes = std::iter::once(&mut self.arguments)
            .chain(self.subcommands.iter_mut().map(|s| &mut s.arguments));
        for arguments in scopes {
            for argument in arguments.iter_mut().filter(|a| a.name.is_empty()) {
                if let Some(name) = derive_name(&argument.flags) {
                    argument.name = name;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_form_classification() {
        assert_eq!(flag_form("-v"), Some(FlagForm::Short('v')));
        assert_eq!(flag_form("--verbose"), Some(FlagForm::Long("verbose")));
        assert_eq!(flag_form("-lr"), Some(FlagForm::Long("lr")));
        assert_eq!(flag_form("-"), None);
        assert_eq!(flag_form("--"), None);
        assert_eq!(flag_form("model"), None);
    }

    #[test]
    fn test_single_dash_long_detection() {
        assert!(is_single_dash_long("-lr"));
        assert!(!is_single_dash_long("--lr"));
        assert!(!is_single_dash_long("-l"));
    }

    #[test]
    fn test_option_derives_name_from_long_flag() {
        let name = ArgumentSpec::option(&["-n", "--name"]);
        assert_eq!(name.name, "name");
        assert_eq!(name.action, Action::Store);
        assert_eq!(name.arity, Arity::One);

        let renamed = ArgumentSpec::option(&["-n", "--name"]).with_dest("n");
        assert_eq!(renamed.name, "n");
    }

    #[test]
    fn test_arity_shapes() {
        assert!(!Arity::One.is_multiple());
        assert!(!Arity::Optional.is_multiple());
        assert!(Arity::ZeroOrMore.is_multiple());
        assert!(Arity::Exactly(1).is_multiple());
        assert!(!Arity::Exactly(0).takes_values());
        assert!(Arity::ZeroOrMore.allows_none());
        assert!(!Arity::OneOrMore.allows_none());
    }

    #[test]
    fn test_choice_conversion() {
        let ty = ValueType::Choice(vec!["cpu".into(), "cuda".into()]);
        assert_eq!(ty.convert("cuda"), Some(Value::from("cuda")));
        assert_eq!(ty.convert("tpu"), None);
    }

    #[test]
    fn test_arguments_for_subcommand() {
        let schema = Schema::new("prog")
            .with_argument(ArgumentSpec::option(&["--model"]))
            .with_subcommand(
                SubcommandSpec::new("valid").with_argument(ArgumentSpec::option(&["--out"])),
            );

        let names: Vec<&str> = schema
            .arguments_for(Some("valid"))
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["model", "out"]);
        assert_eq!(schema.arguments_for(None).len(), 1);
        assert_eq!(schema.arguments_for(Some("missing")).len(), 1);
    }

    #[test]
    fn test_fill_derived_names() {
        let mut schema = Schema::new("prog");
        let mut arg = ArgumentSpec::option(&["--batch-size"]);
        arg.name.clear();
        schema.subcommands.push(SubcommandSpec::new("train").with_argument(arg));

        schema.fill_derived_names();
        assert_eq!(schema.subcommands[0].arguments[0].name, "batch_size");
    }
}
