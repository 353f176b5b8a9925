/*!
Parameter descriptors: [`Opt`] and [`Argument`] are the builders a command
is declared with, and [`Parameter`] is the validated, immutable result that
the parser and the resolution pipeline work from.

All declaration mistakes (bad option names, colliding identifiers,
impossible flag configurations) are detected when the owning command is
built, and reported as [`DeclarationError`].
 */

use std::{fmt, rc::Rc};

use heck::{ToShoutySnakeCase as _, ToTitleCase as _};
use joinery::JoinableIterator;
use lazy_format::lazy_format;

use crate::{
    context::Context,
    errors::{DeclarationError, Error, ParamKind},
    types::{self, Bool, Integer, ParamType, TypeRef},
    util::is_identifier,
    value::Value,
};

/// How many values a single occurrence of a parameter consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),

    /// All remaining positional values. Only valid for the last argument.
    Variadic,
}

impl Arity {
    /// True if values are grouped (a tuple or a list) rather than single
    #[inline]
    #[must_use]
    pub fn is_grouped(self) -> bool {
        !matches!(self, Arity::Fixed(1))
    }
}

/// A parameter's default: either fixed, or computed from the context each
/// time it's needed. Computed defaults can read parameters that were
/// resolved before this one.
#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    Dynamic(Rc<dyn Fn(&Context<'_>) -> Result<Value, Error>>),
}

impl DefaultValue {
    pub(crate) fn produce(&self, ctx: &Context<'_>) -> Result<Value, Error> {
        match self {
            DefaultValue::Static(value) => Ok(value.clone()),
            DefaultValue::Dynamic(producer) => producer(ctx),
        }
    }

    #[must_use]
    pub fn as_static(&self) -> Option<&Value> {
        match self {
            DefaultValue::Static(value) => Some(value),
            DefaultValue::Dynamic(_) => None,
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A validation and transformation step that runs after a parameter's
/// value is converted. Returning [`Error::bad_parameter`] reports the
/// failure against this parameter.
pub type Callback = Rc<dyn Fn(&Context<'_>, &Parameter, Value) -> Result<Value, Error>>;

/// How an option asks for a missing value interactively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub text: String,
    pub hide_input: bool,
    pub confirmation: bool,

    /// When false, the option takes an optional value, and only prompts when
    /// it appears on the command line without one.
    pub required: bool,
}

/// What an occurrence of an option does
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    /// Takes `nargs` values
    Store,

    /// Takes one value if the next token isn't option shaped; otherwise
    /// produces this value (or prompts)
    OptionalValue(Value),

    /// A switch. The primary names produce `on`, the secondary names `off`.
    Flag { on: Value, off: Value },

    /// The value is the number of occurrences
    Count,
}

#[derive(Debug, Clone)]
pub(crate) struct OptionInfo {
    pub(crate) opts: Vec<String>,
    pub(crate) secondary_opts: Vec<String>,
    pub(crate) action: Action,
    pub(crate) prompt: Option<PromptSpec>,
}

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Option(OptionInfo),
    Argument,
}

/**
A validated parameter, owned by its [`Command`][crate::Command].

The accessors here are mostly interesting for custom type converters,
callbacks, and help formatting.
 */
#[derive(Clone)]
pub struct Parameter {
    pub(crate) name: String,
    pub(crate) kind: Kind,
    pub(crate) ty: TypeRef,
    pub(crate) arity: Arity,
    pub(crate) multiple: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) required: bool,
    pub(crate) envvars: Vec<String>,
    pub(crate) eager: bool,
    pub(crate) expose_value: bool,
    pub(crate) callback: Option<Callback>,
    pub(crate) help: Option<String>,
    pub(crate) metavar: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) show_default: Option<bool>,
    pub(crate) show_envvar: bool,
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("ty", &self.ty)
            .field("arity", &self.arity)
            .field("multiple", &self.multiple)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("envvars", &self.envvars)
            .field("eager", &self.eager)
            .finish_non_exhaustive()
    }
}

impl Parameter {
    /// The canonical identifier; resolved values are stored under this name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ParamKind {
        match self.kind {
            Kind::Option(_) => ParamKind::Option,
            Kind::Argument => ParamKind::Argument,
        }
    }

    pub(crate) fn option_info(&self) -> Option<&OptionInfo> {
        match &self.kind {
            Kind::Option(info) => Some(info),
            Kind::Argument => None,
        }
    }

    /// The primary option names, like `-v` and `--verbose`. Empty for
    /// arguments.
    #[must_use]
    pub fn opts(&self) -> &[String] {
        self.option_info().map_or(&[], |info| &info.opts)
    }

    /// The names of the disabling form of a flag, like `--no-verbose`
    #[must_use]
    pub fn secondary_opts(&self) -> &[String] {
        self.option_info().map_or(&[], |info| &info.secondary_opts)
    }

    #[must_use]
    pub fn ty(&self) -> &dyn ParamType {
        &*self.ty
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    #[must_use]
    pub fn multiple(&self) -> bool {
        self.multiple
    }

    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn eager(&self) -> bool {
        self.eager
    }

    #[must_use]
    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    #[must_use]
    pub fn envvars(&self) -> &[String] {
        &self.envvars
    }

    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    #[must_use]
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    #[must_use]
    pub fn is_flag(&self) -> bool {
        matches!(
            self.option_info(),
            Some(OptionInfo {
                action: Action::Flag { .. },
                ..
            })
        )
    }

    #[must_use]
    pub fn is_count(&self) -> bool {
        matches!(
            self.option_info(),
            Some(OptionInfo {
                action: Action::Count,
                ..
            })
        )
    }

    pub(crate) fn prompt(&self) -> Option<&PromptSpec> {
        self.option_info().and_then(|info| info.prompt.as_ref())
    }

    /// True if the resolved value is a list of occurrences or values
    pub(crate) fn is_list(&self) -> bool {
        self.multiple || self.arity == Arity::Variadic
    }

    /// True if this parameter never takes a value from the command line
    pub(crate) fn takes_no_value(&self) -> bool {
        self.is_flag() || self.is_count()
    }

    /// How the parameter is named in error messages: `'-c' / '--count'` for
    /// options, `'NAME'` for arguments.
    #[must_use]
    pub fn display_hint(&self) -> String {
        match &self.kind {
            Kind::Option(info) => info
                .opts
                .iter()
                .map(|opt| lazy_format!("'{opt}'"))
                .join_with(" / ")
                .to_string(),
            Kind::Argument => format!("'{}'", self.human_name()),
        }
    }

    /// The upper case name of an argument, without any decoration
    pub(crate) fn human_name(&self) -> String {
        match &self.metavar {
            Some(metavar) => metavar.clone(),
            None => self.name.to_shouty_snake_case(),
        }
    }

    /**
    The placeholder for this parameter's value in help and usage text.
    Arguments are decorated to show whether they're optional or variadic,
    like `[NAME]` or `FILES...`.
     */
    #[must_use]
    pub fn make_metavar(&self) -> String {
        match self.kind {
            Kind::Argument => {
                let name = match (&self.metavar, self.ty.metavar(self)) {
                    (Some(metavar), _) => metavar.clone(),
                    (None, Some(metavar)) if self.ty.arity().is_none() => metavar,
                    _ => self.human_name(),
                };

                let name = match self.required {
                    true => name,
                    false => format!("[{name}]"),
                };

                match self.arity {
                    Arity::Variadic => format!("{name}..."),
                    Arity::Fixed(_) => name,
                }
            }
            Kind::Option(_) => {
                let name = match &self.metavar {
                    Some(metavar) => metavar.clone(),
                    None => self
                        .ty
                        .metavar(self)
                        .unwrap_or_else(|| self.ty.name().to_uppercase()),
                };

                match (self.arity, self.ty.arity()) {
                    (Arity::Fixed(1), _) | (_, Some(_)) => name,
                    _ => format!("{name}..."),
                }
            }
        }
    }
}

#[derive(Clone)]
enum PromptText {
    Text(String),
    Auto,
}

/**
Builder for an option: a parameter introduced by a name like `-c` or
`--count`.

Names are given as strings. A name containing a `/` declares a flag with a
disabling form, like `--shout/--no-shout`. A bare identifier, with no
leading dashes, overrides the canonical identifier that would otherwise be
derived from the first long name.
 */
#[derive(Clone)]
#[must_use]
pub struct Opt {
    decls: Vec<String>,
    ty: Option<TypeRef>,
    nargs: Option<usize>,
    multiple: bool,
    default: Option<DefaultValue>,
    required: bool,
    prompt: Option<PromptText>,
    hide_input: bool,
    confirmation: bool,
    prompt_required: bool,
    envvars: Vec<String>,
    eager: bool,
    expose_value: bool,
    is_flag: bool,
    flag_value: Option<Value>,
    optional_value: Option<Value>,
    count: bool,
    callback: Option<Callback>,
    help: Option<String>,
    metavar: Option<String>,
    hidden: bool,
    show_default: Option<bool>,
    show_envvar: bool,
}

impl Opt {
    pub fn new<I>(decls: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            decls: decls.into_iter().map(Into::into).collect(),
            ty: None,
            nargs: None,
            multiple: false,
            default: None,
            required: false,
            prompt: None,
            hide_input: false,
            confirmation: false,
            prompt_required: true,
            envvars: Vec::new(),
            eager: false,
            expose_value: true,
            is_flag: false,
            flag_value: None,
            optional_value: None,
            count: false,
            callback: None,
            help: None,
            metavar: None,
            hidden: false,
            show_default: None,
            show_envvar: false,
        }
    }

    /// A `--version` flag that prints `prog, version X` and exits.
    pub fn version(version: impl Into<String>) -> Self {
        let version = version.into();

        Self::new(["--version"])
            .flag()
            .eager()
            .expose_value(false)
            .help("Show the version and exit.")
            .callback(move |ctx, _, value| match value {
                Value::Bool(true) => {
                    let prog = ctx.find_root().info_name();
                    let version = version.as_str();
                    ctx.echo(lazy_format!("{prog}, version {version}"))?;
                    Err(Error::Exit(0))
                }
                value => Ok(value),
            })
    }

    pub fn ty(self, ty: impl ParamType + 'static) -> Self {
        self.ty_ref(Rc::new(ty))
    }

    pub fn ty_ref(self, ty: TypeRef) -> Self {
        Self {
            ty: Some(ty),
            ..self
        }
    }

    /// The number of values each occurrence takes
    pub fn nargs(self, nargs: usize) -> Self {
        Self {
            nargs: Some(nargs),
            ..self
        }
    }

    /// Allow the option to appear more than once, collecting a list
    pub fn multiple(self) -> Self {
        Self {
            multiple: true,
            ..self
        }
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        Self {
            default: Some(DefaultValue::Static(value.into())),
            ..self
        }
    }

    pub fn default_with(
        self,
        producer: impl Fn(&Context<'_>) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            default: Some(DefaultValue::Dynamic(Rc::new(producer))),
            ..self
        }
    }

    pub fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Prompt for the value, with this text, if no other source has one
    pub fn prompt(self, text: impl Into<String>) -> Self {
        Self {
            prompt: Some(PromptText::Text(text.into())),
            ..self
        }
    }

    /// Prompt for the value, with text derived from the identifier
    pub fn prompt_auto(self) -> Self {
        Self {
            prompt: Some(PromptText::Auto),
            ..self
        }
    }

    pub fn hide_input(self) -> Self {
        Self {
            hide_input: true,
            ..self
        }
    }

    /// Ask for the value twice when prompting
    pub fn confirmation(self) -> Self {
        Self {
            confirmation: true,
            ..self
        }
    }

    /// Only prompt when the option is given without a value
    pub fn prompt_optional(self) -> Self {
        Self {
            prompt_required: false,
            ..self
        }
    }

    pub fn envvar(mut self, name: impl Into<String>) -> Self {
        self.envvars.push(name.into());
        self
    }

    pub fn eager(self) -> Self {
        Self {
            eager: true,
            ..self
        }
    }

    /// Whether the resolved value is stored in the context
    pub fn expose_value(self, expose: bool) -> Self {
        Self {
            expose_value: expose,
            ..self
        }
    }

    /// A boolean switch. Implied by a `--flag/--no-flag` name.
    pub fn flag(self) -> Self {
        Self {
            is_flag: true,
            ..self
        }
    }

    /// A switch that produces `value` when given
    pub fn flag_value(self, value: impl Into<Value>) -> Self {
        Self {
            is_flag: true,
            flag_value: Some(value.into()),
            ..self
        }
    }

    /// The option takes a value, but may also be given bare, in which case
    /// it produces `value`
    pub fn optional_value(self, value: impl Into<Value>) -> Self {
        Self {
            optional_value: Some(value.into()),
            ..self
        }
    }

    /// Count the occurrences, like `-vvv`
    pub fn count(self) -> Self {
        Self {
            count: true,
            ..self
        }
    }

    pub fn callback(
        self,
        callback: impl Fn(&Context<'_>, &Parameter, Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            callback: Some(Rc::new(callback)),
            ..self
        }
    }

    pub fn help(self, help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..self
        }
    }

    pub fn metavar(self, metavar: impl Into<String>) -> Self {
        Self {
            metavar: Some(metavar.into()),
            ..self
        }
    }

    pub fn hidden(self) -> Self {
        Self {
            hidden: true,
            ..self
        }
    }

    pub fn show_default(self, show: bool) -> Self {
        Self {
            show_default: Some(show),
            ..self
        }
    }

    pub fn show_envvar(self) -> Self {
        Self {
            show_envvar: true,
            ..self
        }
    }

    pub fn build(self) -> Result<Parameter, DeclarationError> {
        let Names {
            opts,
            secondary_opts,
            explicit,
        } = parse_names(&self.decls)?;

        let name = match explicit {
            Some(name) => name,
            None => derive_identifier(&opts, &secondary_opts)?,
        };

        let invalid = |message: &'static str| DeclarationError::InvalidOption {
            name: name.clone(),
            message,
        };

        let is_flag = self.is_flag || !secondary_opts.is_empty();
        let optional = self.optional_value.is_some() || !self.prompt_required;

        if self.nargs == Some(0) {
            return Err(invalid("an option must take at least one value"));
        }

        if self.count && self.multiple {
            return Err(invalid("a count option can't also be multiple"));
        }

        if self.count && is_flag {
            return Err(invalid("a count option can't also be a flag"));
        }

        if is_flag && self.nargs.is_some_and(|nargs| nargs > 1) {
            return Err(invalid("a flag can't take more than one value"));
        }

        if is_flag && optional {
            return Err(invalid("a flag can't take an optional value"));
        }

        if optional && self.nargs.is_some_and(|nargs| nargs != 1) {
            return Err(invalid("an option with an optional value takes exactly one value"));
        }

        if !secondary_opts.is_empty()
            && self.flag_value.as_ref().is_some_and(|value| value.as_bool().is_none())
        {
            return Err(invalid("only boolean flags can have a disabling form"));
        }

        if self.prompt.is_some() && self.multiple {
            return Err(invalid("a multiple option can't prompt"));
        }

        if self.prompt.is_some() && self.count {
            return Err(invalid("a count option can't prompt"));
        }

        let action = if self.count {
            Action::Count
        } else if is_flag {
            let on = self.flag_value.clone().unwrap_or(Value::Bool(true));
            let off = match on {
                Value::Bool(b) => Value::Bool(!b),
                _ => Value::None,
            };
            Action::Flag { on, off }
        } else if optional {
            Action::OptionalValue(self.optional_value.clone().unwrap_or_default())
        } else {
            Action::Store
        };

        let default = match (self.default, &action) {
            (Some(default), _) => Some(default),
            (None, Action::Flag { off: Value::Bool(off), .. }) if !self.multiple => {
                Some(DefaultValue::Static(Value::Bool(*off)))
            }
            (None, Action::Count) => Some(DefaultValue::Static(Value::Int(0))),
            (None, _) => None,
        };

        let ty: TypeRef = match self.ty {
            Some(ty) => ty,
            None => match &action {
                Action::Count => Rc::new(Integer),
                Action::Flag {
                    on: Value::Bool(_), ..
                } => Rc::new(Bool),
                Action::Flag { on, .. } => types::guess(Some(on)),
                _ => types::guess(default.as_ref().and_then(DefaultValue::as_static)),
            },
        };

        let arity = fixed_arity(&name, &*ty, self.nargs)?;

        let prompt = self.prompt.map(|text| PromptSpec {
            text: match text {
                PromptText::Text(text) => text,
                PromptText::Auto => name.to_title_case(),
            },
            hide_input: self.hide_input,
            confirmation: self.confirmation,
            required: self.prompt_required,
        });

        Ok(Parameter {
            kind: Kind::Option(OptionInfo {
                opts,
                secondary_opts,
                action,
                prompt,
            }),
            name,
            ty,
            arity,
            multiple: self.multiple,
            default,
            required: self.required,
            envvars: self.envvars,
            eager: self.eager,
            expose_value: self.expose_value,
            callback: self.callback,
            help: self.help,
            metavar: self.metavar,
            hidden: self.hidden,
            show_default: self.show_default,
            show_envvar: self.show_envvar,
        })
    }
}

/// Check the type, and reconcile an explicit `nargs` with a tuple type's
/// arity
fn fixed_arity(
    name: &str,
    ty: &dyn ParamType,
    nargs: Option<usize>,
) -> Result<Arity, DeclarationError> {
    ty.check_declaration()
        .map_err(|message| DeclarationError::InvalidType {
            name: name.to_owned(),
            message,
        })?;

    match (ty.arity(), nargs) {
        (Some(arity), Some(nargs)) if arity != nargs => Err(DeclarationError::InvalidType {
            name: name.to_owned(),
            message: format!("nargs is {nargs}, but the tuple type has {arity} items"),
        }),
        (Some(arity), _) => Ok(Arity::Fixed(arity)),
        (None, nargs) => Ok(Arity::Fixed(nargs.unwrap_or(1))),
    }
}

struct Names {
    opts: Vec<String>,
    secondary_opts: Vec<String>,
    explicit: Option<String>,
}

fn parse_names(decls: &[String]) -> Result<Names, DeclarationError> {
    let mut names = Names {
        opts: Vec::new(),
        secondary_opts: Vec::new(),
        explicit: None,
    };

    for decl in decls {
        if let Some((first, second)) = decl.split_once('/') {
            let (first, second) = (first.trim(), second.trim());

            if first == second {
                return Err(DeclarationError::InvalidOptionName { name: decl.clone() });
            }

            for (part, list) in [
                (first, &mut names.opts),
                (second, &mut names.secondary_opts),
            ] {
                if !part.is_empty() {
                    check_option_name(part)?;
                    list.push(part.to_owned());
                }
            }
        } else if decl.starts_with('-') {
            check_option_name(decl)?;
            names.opts.push(decl.clone());
        } else if is_identifier(decl) {
            if let Some(first) = names.explicit.replace(decl.clone()) {
                return Err(DeclarationError::MultipleIdentifiers {
                    first,
                    second: decl.clone(),
                });
            }
        } else {
            return Err(DeclarationError::InvalidOptionName { name: decl.clone() });
        }
    }

    match names.opts.is_empty() && names.secondary_opts.is_empty() {
        true => Err(DeclarationError::NoNames),
        false => Ok(names),
    }
}

/// Long names are `--` and at least one more character; short names are
/// `-` and exactly one character.
fn check_option_name(name: &str) -> Result<(), DeclarationError> {
    let valid = match name.strip_prefix("--") {
        Some(long) => {
            !long.is_empty()
                && !long.starts_with('-')
                && !long.contains(|c: char| c == '=' || c.is_whitespace())
        }
        None => match name.strip_prefix('-') {
            Some(short) => {
                let mut chars = short.chars();
                matches!(
                    (chars.next(), chars.next()),
                    (Some(c), None) if c != '-' && c != '=' && !c.is_whitespace()
                )
            }
            None => false,
        },
    };

    match valid {
        true => Ok(()),
        false => Err(DeclarationError::InvalidOptionName {
            name: name.to_owned(),
        }),
    }
}

/// The identifier for an option without an explicit one: the first long
/// name, else the first short name, with dashes stripped and `-` turned
/// into `_`.
fn derive_identifier(opts: &[String], secondary: &[String]) -> Result<String, DeclarationError> {
    let candidates = || opts.iter().chain(secondary);

    let chosen = candidates()
        .find(|opt| opt.starts_with("--"))
        .or_else(|| candidates().next())
        .ok_or(DeclarationError::NoNames)?;

    let identifier = chosen
        .trim_start_matches('-')
        .replace('-', "_")
        .to_lowercase();

    match is_identifier(&identifier) {
        true => Ok(identifier),
        false => Err(DeclarationError::NoIdentifier {
            names: candidates().cloned().collect(),
        }),
    }
}

/**
Builder for a positional argument. Arguments take exactly one value, or are
variadic and take all remaining positional values. An argument is required
unless it has a default or is variadic.
 */
#[derive(Clone)]
#[must_use]
pub struct Argument {
    decl: String,
    ty: Option<TypeRef>,
    variadic: bool,
    default: Option<DefaultValue>,
    required: Option<bool>,
    envvars: Vec<String>,
    eager: bool,
    expose_value: bool,
    callback: Option<Callback>,
    help: Option<String>,
    metavar: Option<String>,
    hidden: bool,
}

impl Argument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            decl: name.into(),
            ty: None,
            variadic: false,
            default: None,
            required: None,
            envvars: Vec::new(),
            eager: false,
            expose_value: true,
            callback: None,
            help: None,
            metavar: None,
            hidden: false,
        }
    }

    pub fn ty(self, ty: impl ParamType + 'static) -> Self {
        self.ty_ref(Rc::new(ty))
    }

    pub fn ty_ref(self, ty: TypeRef) -> Self {
        Self {
            ty: Some(ty),
            ..self
        }
    }

    /// Take all remaining positional values
    pub fn variadic(self) -> Self {
        Self {
            variadic: true,
            ..self
        }
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        Self {
            default: Some(DefaultValue::Static(value.into())),
            ..self
        }
    }

    pub fn default_with(
        self,
        producer: impl Fn(&Context<'_>) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            default: Some(DefaultValue::Dynamic(Rc::new(producer))),
            ..self
        }
    }

    pub fn required(self, required: bool) -> Self {
        Self {
            required: Some(required),
            ..self
        }
    }

    pub fn envvar(mut self, name: impl Into<String>) -> Self {
        self.envvars.push(name.into());
        self
    }

    pub fn eager(self) -> Self {
        Self {
            eager: true,
            ..self
        }
    }

    pub fn expose_value(self, expose: bool) -> Self {
        Self {
            expose_value: expose,
            ..self
        }
    }

    pub fn callback(
        self,
        callback: impl Fn(&Context<'_>, &Parameter, Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            callback: Some(Rc::new(callback)),
            ..self
        }
    }

    pub fn help(self, help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..self
        }
    }

    pub fn metavar(self, metavar: impl Into<String>) -> Self {
        Self {
            metavar: Some(metavar.into()),
            ..self
        }
    }

    pub fn hidden(self) -> Self {
        Self {
            hidden: true,
            ..self
        }
    }

    pub fn build(self) -> Result<Parameter, DeclarationError> {
        let name = self.decl.replace('-', "_").to_lowercase();

        if !is_identifier(&name) {
            return Err(DeclarationError::InvalidOptionName { name: self.decl });
        }

        let ty = match self.ty {
            Some(ty) => ty,
            None => types::guess(self.default.as_ref().and_then(DefaultValue::as_static)),
        };

        let arity = match (fixed_arity(&name, &*ty, None)?, self.variadic) {
            (Arity::Fixed(1), true) => Arity::Variadic,
            (Arity::Fixed(1), false) => Arity::Fixed(1),
            _ => return Err(DeclarationError::InvalidArgumentArity { name }),
        };

        let required = self
            .required
            .unwrap_or(self.default.is_none() && arity != Arity::Variadic);

        Ok(Parameter {
            name,
            kind: Kind::Argument,
            ty,
            arity,
            multiple: false,
            default: self.default,
            required,
            envvars: self.envvars,
            eager: self.eager,
            expose_value: self.expose_value,
            callback: self.callback,
            help: self.help,
            metavar: self.metavar,
            hidden: self.hidden,
            show_default: None,
            show_envvar: false,
        })
    }
}

/// Either kind of parameter builder, as accepted by
/// [`CommandBuilder::param`][crate::command::CommandBuilder::param]
#[derive(Clone)]
pub enum ParamDecl {
    Option(Opt),
    Argument(Argument),
}

impl ParamDecl {
    pub fn build(self) -> Result<Parameter, DeclarationError> {
        match self {
            ParamDecl::Option(opt) => opt.build(),
            ParamDecl::Argument(argument) => argument.build(),
        }
    }
}

impl From<Opt> for ParamDecl {
    fn from(opt: Opt) -> Self {
        ParamDecl::Option(opt)
    }
}

impl From<Argument> for ParamDecl {
    fn from(argument: Argument) -> Self {
        ParamDecl::Argument(argument)
    }
}
