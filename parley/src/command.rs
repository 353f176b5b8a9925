/*!
Commands and groups.

A [`Command`] is built once, through a [`CommandBuilder`], which performs
every declaration check up front; afterwards it's immutable. A group is a
command with subcommands. Invoking a group parses its own parameters, then
dispatches the leftover tokens to one subcommand, or with chaining, to a
sequence of them.
 */

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    process::ExitCode,
    rc::Rc,
};

use joinery::JoinableIterator;

use crate::{
    context::{Context, ParamValues},
    errors::{DeclarationError, Error, ParamKind, UsageErrorKind},
    invocation::Invocation,
    parameter::{Arity, Opt, ParamDecl, Parameter},
    parser::{self, ParseSettings},
    resolve,
    util,
    value::Value,
};

type ValuesFn = dyn Fn(&ParamValues) -> Result<Value, Error>;
type ContextFn = dyn Fn(&Context<'_>) -> Result<Value, Error>;

/// Post-processes a group's result: the subcommand's value, or for a chain,
/// the list of every subcommand's value
pub type ResultCallback = Rc<dyn Fn(&Context<'_>, Value) -> Result<Value, Error>>;

/// A command's handler. Handlers that don't need the context only see the
/// resolved values.
#[derive(Clone)]
pub enum Handler {
    Values(Rc<ValuesFn>),
    Context(Rc<ContextFn>),
}

impl Handler {
    fn call(&self, ctx: &Context<'_>) -> Result<Value, Error> {
        match self {
            Handler::Values(handler) => handler(&ctx.params()),
            Handler::Context(handler) => handler(ctx),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Handler::Values(_) => "Handler::Values(..)",
            Handler::Context(_) => "Handler::Context(..)",
        })
    }
}

/// A subcommand found by name. `name` becomes the subcommand context's
/// `info_name`.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub name: String,
    pub command: Rc<Command>,
}

/**
A source of subcommands that aren't known when the group is built, or are
expensive to build. Sources are consulted after the group's own
subcommands, in the order they were added.
 */
pub trait Subcommands {
    /// The names to show in help and offer for completion
    fn list(&self, ctx: &Context<'_>) -> Vec<String>;

    fn get(&self, ctx: &Context<'_>, name: &str) -> Option<Resolved>;
}

/// Subcommands built on first use, by name.
pub struct LazySubcommands {
    names: Vec<String>,
    loader: Box<dyn Fn(&str) -> Option<Command>>,
    loaded: RefCell<HashMap<String, Rc<Command>>>,
}

impl LazySubcommands {
    pub fn new<I>(names: I, loader: impl Fn(&str) -> Option<Command> + 'static) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            loader: Box::new(loader),
            loaded: RefCell::default(),
        }
    }
}

impl fmt::Debug for LazySubcommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySubcommands")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Subcommands for LazySubcommands {
    fn list(&self, _: &Context<'_>) -> Vec<String> {
        self.names.clone()
    }

    fn get(&self, _: &Context<'_>, name: &str) -> Option<Resolved> {
        if !self.names.iter().any(|candidate| candidate == name) {
            return None;
        }

        if let Some(command) = self.loaded.borrow().get(name) {
            return Some(Resolved {
                name: name.to_owned(),
                command: Rc::clone(command),
            });
        }

        tracing::debug!(subcommand = name, "loading lazy subcommand");
        let command = Rc::new((self.loader)(name)?);
        self.loaded
            .borrow_mut()
            .insert(name.to_owned(), Rc::clone(&command));

        Some(Resolved {
            name: name.to_owned(),
            command,
        })
    }
}

#[derive(Clone, Default)]
pub(crate) struct GroupInfo {
    commands: BTreeMap<String, Rc<Command>>,
    sources: Vec<Rc<dyn Subcommands>>,
    aliases: BTreeMap<String, String>,
    chain: bool,
    invoke_without_command: bool,
    result_callback: Option<ResultCallback>,
}

/// Settings that descendants inherit unless they set their own
#[derive(Debug, Clone, Default)]
pub(crate) struct Settings {
    pub auto_envvar_prefix: Option<String>,
    pub show_default: Option<bool>,
    pub max_content_width: Option<usize>,
}

#[derive(Clone)]
pub struct Command {
    name: String,
    params: Vec<Parameter>,
    handler: Option<Handler>,

    help: Option<String>,
    short_help: Option<String>,
    epilog: Option<String>,
    hidden: bool,
    options_metavar: String,

    ignore_unknown_options: bool,
    allow_interspersed_args: bool,
    allow_extra_args: bool,
    no_args_is_help: bool,
    help_option_names: Vec<String>,
    settings: Settings,

    group: Option<GroupInfo>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Command");
        debug
            .field("name", &self.name)
            .field("params", &self.params)
            .field("handler", &self.handler);

        if let Some(group) = &self.group {
            debug
                .field("commands", &group.commands.keys().collect::<Vec<_>>())
                .field("chain", &group.chain);
        }

        debug.finish_non_exhaustive()
    }
}

impl Command {
    /// Start declaring a command
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name.into(), false)
    }

    /// Start declaring a group
    pub fn group(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name.into(), true)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every parameter, in declaration order. The help option, if there is
    /// one, comes last.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /**
    The one line description shown in a parent group's command list. If
    none was declared, it's the first sentence of the help text, shortened
    to fit.
     */
    #[must_use]
    pub fn short_help(&self) -> Option<String> {
        match &self.short_help {
            Some(short_help) => Some(short_help.clone()),
            None => self.help.as_deref().map(make_short_help),
        }
    }

    #[must_use]
    pub fn epilog(&self) -> Option<&str> {
        self.epilog.as_deref()
    }

    #[must_use]
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    #[must_use]
    pub fn options_metavar(&self) -> &str {
        &self.options_metavar
    }

    #[must_use]
    pub fn help_option_names(&self) -> &[String] {
        &self.help_option_names
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.group.is_some()
    }

    #[must_use]
    pub fn is_chain(&self) -> bool {
        self.group.as_ref().is_some_and(|group| group.chain)
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start a library mode or standalone invocation of this command
    pub fn invocation(&self) -> Invocation<'_> {
        Invocation::new(self)
    }

    /// Run this command against the process's arguments, environment and
    /// standard streams, printing any error, and return the exit status.
    pub fn main(&self) -> ExitCode {
        self.invocation().main()
    }

    /// The names of every subcommand, sorted
    #[must_use]
    pub fn list_commands(&self, ctx: &Context<'_>) -> Vec<String> {
        let Some(group) = &self.group else {
            return Vec::new();
        };

        let mut names: BTreeSet<String> = group.commands.keys().cloned().collect();
        names.extend(group.sources.iter().flat_map(|source| source.list(ctx)));
        names.into_iter().collect()
    }

    /// Find a subcommand by name, or by alias
    #[must_use]
    pub fn get_command(&self, ctx: &Context<'_>, name: &str) -> Option<Resolved> {
        let group = self.group.as_ref()?;

        let (name, aliased) = match group.aliases.get(name) {
            Some(target) => (target.as_str(), true),
            None => (name, false),
        };

        let resolved = match group.commands.get(name) {
            Some(command) => Some(Resolved {
                name: name.to_owned(),
                command: Rc::clone(command),
            }),
            None => group
                .sources
                .iter()
                .find_map(|source| source.get(ctx, name)),
        };

        if aliased {
            tracing::debug!(alias = name, "resolved subcommand alias");
        }

        resolved
    }

    /// Like `get_command`, but an unknown name is a usage error
    fn require_command(&self, ctx: &Context<'_>, name: &str) -> Result<Resolved, Error> {
        match self.get_command(ctx, name) {
            Some(resolved) => {
                tracing::debug!(subcommand = %resolved.name, "resolved subcommand");
                Ok(resolved)
            }
            None => {
                let names = self.list_commands(ctx);
                let possibilities = util::suggestions(name, names.iter().map(String::as_str));

                Err(Error::from(UsageErrorKind::NoSuchCommand {
                    name: name.to_owned(),
                    possibilities,
                })
                .with_hint(|| ctx.usage_hint()))
            }
        }
    }

    /// The non-hidden subcommands, for help
    pub(crate) fn visible_commands(&self, ctx: &Context<'_>) -> Vec<Resolved> {
        self.list_commands(ctx)
            .into_iter()
            .filter_map(|name| self.get_command(ctx, &name))
            .filter(|resolved| !resolved.command.hidden)
            .collect()
    }

    // Invocation

    /// Parse `args` against this command's parameters and resolve them into
    /// `ctx`. Whatever the parameters didn't claim is stored as the
    /// context's leftover args.
    pub(crate) fn parse_args(&self, ctx: &Context<'_>, args: Vec<String>) -> Result<(), Error> {
        let shape = ArgsShape {
            interspersed: self.allow_interspersed_args,
            extra: self.allow_extra_args,
        };

        self.parse_args_inner(ctx, args, shape)
            .map_err(|error| error.with_hint(|| ctx.usage_hint()))
    }

    /// Parse `args` as one step of a chain. Option parsing stops at the
    /// first positional this command's arguments don't claim; everything
    /// from there on is returned, and starts the next step.
    pub(crate) fn parse_chained(
        &self,
        ctx: &Context<'_>,
        args: Vec<String>,
    ) -> Result<Vec<String>, Error> {
        let shape = ArgsShape {
            interspersed: false,
            extra: true,
        };

        self.parse_args_inner(ctx, args, shape)
            .map_err(|error| error.with_hint(|| ctx.usage_hint()))?;

        Ok(ctx.take_args())
    }

    fn parse_args_inner(
        &self,
        ctx: &Context<'_>,
        args: Vec<String>,
        shape: ArgsShape,
    ) -> Result<(), Error> {
        if args.is_empty() && self.no_args_is_help && !ctx.resilient_parsing() {
            ctx.write_help()?;
            return Err(Error::HelpShown);
        }

        let settings = ParseSettings {
            ignore_unknown_options: self.ignore_unknown_options,
            allow_interspersed_args: shape.interspersed,
            resilient: ctx.resilient_parsing(),
        };

        let mut outcome = parser::parse(&self.params, &args, settings)?;
        let leftover = std::mem::take(&mut outcome.leftover);
        ctx.set_args(leftover.clone());

        resolve::resolve_all(ctx, &self.params, outcome)?;

        if !leftover.is_empty() && !shape.extra && !ctx.resilient_parsing() {
            let joined = leftover.iter().join_with(" ");
            let message = match leftover.len() {
                1 => format!("Got unexpected extra argument ({joined})"),
                _ => format!("Got unexpected extra arguments ({joined})"),
            };

            return Err(UsageErrorKind::BadArgumentUsage { message }.into());
        }

        Ok(())
    }

    fn run_handler(&self, ctx: &Context<'_>) -> Result<Value, Error> {
        match &self.handler {
            Some(handler) => handler.call(ctx),
            None => Ok(Value::None),
        }
    }

    fn process_result(&self, ctx: &Context<'_>, value: Value) -> Result<Value, Error> {
        match self.group.as_ref().and_then(|group| group.result_callback.as_ref()) {
            Some(callback) => callback(ctx, value),
            None => Ok(value),
        }
    }

    /// Run this command, whose parameters have already been resolved into
    /// `ctx`. Groups dispatch their leftover args to subcommands.
    pub(crate) fn invoke(&self, ctx: &Context<'_>) -> Result<Value, Error> {
        let Some(group) = &self.group else {
            return self.run_handler(ctx);
        };

        let mut args = ctx.take_args().into_iter();

        let Some(name) = args.next() else {
            if group.invoke_without_command {
                let value = self.run_handler(ctx)?;
                let value = match group.chain {
                    true => Value::List(Vec::new()),
                    false => value,
                };
                return self.process_result(ctx, value);
            }

            ctx.write_help()?;
            return Err(Error::HelpShown);
        };

        match group.chain {
            false => {
                let Resolved { name, command } = self.require_command(ctx, &name)?;

                ctx.set_invoked_subcommand(name.as_str());
                self.run_handler(ctx)?;

                let sub_ctx = Context::child(ctx, &command, name);
                command.parse_args(&sub_ctx, args.collect())?;
                let value = command.invoke(&sub_ctx)?;

                self.process_result(ctx, value)
            }
            true => {
                let first = self.require_command(ctx, &name)?;

                ctx.set_invoked_subcommand("*");
                self.run_handler(ctx)?;

                let results = self.run_chain(ctx, first, args.collect())?;
                self.process_result(ctx, Value::List(results))
            }
        }
    }

    /// Run a chain one step at a time. Each step is parsed from where the
    /// previous one stopped, and its handler finishes before the next step
    /// is parsed, so later steps see whatever earlier ones left behind.
    fn run_chain(
        &self,
        ctx: &Context<'_>,
        first: Resolved,
        args: Vec<String>,
    ) -> Result<Vec<Value>, Error> {
        let mut results = Vec::new();
        let mut step = first;
        let mut args = args;

        loop {
            let Resolved { name, command } = step;

            let rest = {
                let sub_ctx = Context::child(ctx, &command, name);
                let rest = command.parse_chained(&sub_ctx, args)?;

                tracing::debug!(subcommand = sub_ctx.info_name(), "running chained subcommand");
                results.push(command.invoke(&sub_ctx)?);
                rest
            };

            let Some((head, tail)) = rest.split_first() else {
                break Ok(results);
            };

            step = self.require_command(ctx, head)?;
            args = tail.to_vec();
        }
    }
}

/// How leftover positionals are treated while parsing
#[derive(Debug, Clone, Copy)]
struct ArgsShape {
    interspersed: bool,
    extra: bool,
}

/// The first sentence of `help`, cut at a word boundary to fit in a command
/// list
fn make_short_help(help: &str) -> String {
    const LIMIT: usize = 45;

    let paragraph = help.trim().split("\n\n").next().unwrap_or_default();
    let paragraph = paragraph.split_whitespace().join_with(" ").to_string();
    let sentence = match paragraph.find(". ") {
        Some(end) => &paragraph[..=end],
        None => paragraph.as_str(),
    };

    if sentence.chars().count() <= LIMIT {
        return sentence.to_owned();
    }

    let mut short = String::new();
    for word in sentence.split(' ') {
        if short.chars().count() + word.chars().count() + 4 > LIMIT {
            break;
        }
        if !short.is_empty() {
            short.push(' ');
        }
        short.push_str(word);
    }

    short.push_str("...");
    short
}

fn help_option(names: Vec<String>) -> Opt {
    Opt::new(names.into_iter().chain(["help".to_owned()]))
        .flag()
        .eager()
        .expose_value(false)
        .help("Show this message and exit.")
        .callback(|ctx, _, value| match value {
            Value::Bool(true) => {
                ctx.write_help()?;
                Err(Error::HelpShown)
            }
            value => Ok(value),
        })
}

/**
Declares a [`Command`]. Every check happens in [`build`][Self::build].

Any of the subcommand methods turn the command into a group. Groups default
to stopping option parsing at the first positional and to passing extra
args on to their subcommands; plain commands allow options anywhere and
reject extra args.
 */
#[must_use]
pub struct CommandBuilder {
    name: String,
    params: Vec<ParamDecl>,
    handler: Option<Handler>,
    help: Option<String>,
    short_help: Option<String>,
    epilog: Option<String>,
    hidden: bool,
    options_metavar: String,
    ignore_unknown_options: bool,
    allow_interspersed_args: Option<bool>,
    allow_extra_args: Option<bool>,
    no_args_is_help: bool,
    add_help_option: bool,
    help_option_names: Vec<String>,
    settings: Settings,
    group: Option<GroupInfo>,
    subcommands: Vec<Command>,
}

impl CommandBuilder {
    fn new(name: String, group: bool) -> Self {
        Self {
            name,
            params: Vec::new(),
            handler: None,
            help: None,
            short_help: None,
            epilog: None,
            hidden: false,
            options_metavar: "[OPTIONS]".to_owned(),
            ignore_unknown_options: false,
            allow_interspersed_args: None,
            allow_extra_args: None,
            no_args_is_help: false,
            add_help_option: true,
            help_option_names: Vec::from(["--help".to_owned()]),
            settings: Settings::default(),
            group: group.then(GroupInfo::default),
            subcommands: Vec::new(),
        }
    }

    fn group_info(&mut self) -> &mut GroupInfo {
        self.group.get_or_insert_with(GroupInfo::default)
    }

    pub fn param(mut self, param: impl Into<ParamDecl>) -> Self {
        self.params.push(param.into());
        self
    }

    /// A handler that only needs the resolved values
    pub fn handler(self, handler: impl Fn(&ParamValues) -> Result<Value, Error> + 'static) -> Self {
        Self {
            handler: Some(Handler::Values(Rc::new(handler))),
            ..self
        }
    }

    /// A handler that gets the whole context
    pub fn context_handler(
        self,
        handler: impl Fn(&Context<'_>) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            handler: Some(Handler::Context(Rc::new(handler))),
            ..self
        }
    }

    pub fn help(self, help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..self
        }
    }

    pub fn short_help(self, short_help: impl Into<String>) -> Self {
        Self {
            short_help: Some(short_help.into()),
            ..self
        }
    }

    /// Text shown after everything else in the help page
    pub fn epilog(self, epilog: impl Into<String>) -> Self {
        Self {
            epilog: Some(epilog.into()),
            ..self
        }
    }

    /// Leave this command out of its parent's help and completion
    pub fn hidden(self) -> Self {
        Self {
            hidden: true,
            ..self
        }
    }

    pub fn options_metavar(self, metavar: impl Into<String>) -> Self {
        Self {
            options_metavar: metavar.into(),
            ..self
        }
    }

    /// Pass unknown option tokens through as positionals instead of failing
    pub fn ignore_unknown_options(self) -> Self {
        Self {
            ignore_unknown_options: true,
            ..self
        }
    }

    pub fn allow_interspersed_args(self, allow: bool) -> Self {
        Self {
            allow_interspersed_args: Some(allow),
            ..self
        }
    }

    /// Keep unclaimed tokens as leftover args instead of failing
    pub fn allow_extra_args(self, allow: bool) -> Self {
        Self {
            allow_extra_args: Some(allow),
            ..self
        }
    }

    /// Show the help page when invoked without any arguments
    pub fn no_args_is_help(self) -> Self {
        Self {
            no_args_is_help: true,
            ..self
        }
    }

    pub fn add_help_option(self, add: bool) -> Self {
        Self {
            add_help_option: add,
            ..self
        }
    }

    pub fn help_option_names<I>(self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            help_option_names: names.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Enable synthesized environment variable names, like
    /// `PREFIX_SUBCOMMAND_OPTION`, for this command and its descendants
    pub fn auto_envvar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.auto_envvar_prefix = Some(prefix.into());
        self
    }

    /// Show defaults in help, for this command and its descendants
    pub fn show_default(mut self, show: bool) -> Self {
        self.settings.show_default = Some(show);
        self
    }

    pub fn max_content_width(mut self, width: usize) -> Self {
        self.settings.max_content_width = Some(width);
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.group_info();
        self.subcommands.push(command);
        self
    }

    pub fn subcommands(mut self, source: impl Subcommands + 'static) -> Self {
        self.group_info().sources.push(Rc::new(source));
        self
    }

    /// Accept `alias` as another name for the subcommand `target`
    pub fn alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.group_info().aliases.insert(alias.into(), target.into());
        self
    }

    /// Allow several subcommands in one invocation, run one after another
    pub fn chain(mut self) -> Self {
        self.group_info().chain = true;
        self
    }

    /// Run the group's handler even when no subcommand is given
    pub fn invoke_without_command(mut self) -> Self {
        self.group_info().invoke_without_command = true;
        self
    }

    pub fn result_callback(
        mut self,
        callback: impl Fn(&Context<'_>, Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.group_info().result_callback = Some(Rc::new(callback));
        self
    }

    pub fn build(self) -> Result<Command, DeclarationError> {
        let mut decls = self.params;

        if self.add_help_option && !self.help_option_names.is_empty() {
            decls.push(help_option(self.help_option_names.clone()).into());
        }

        let params = decls
            .into_iter()
            .map(ParamDecl::build)
            .collect::<Result<Vec<_>, _>>()?;

        check_params(&self.name, &params)?;

        let mut group = self.group;

        if let Some(group) = &mut group {
            if group.chain
                && let Some(optional) = params
                    .iter()
                    .find(|param| param.kind() == ParamKind::Argument && !param.required())
            {
                return Err(DeclarationError::ChainedOptionalArgument {
                    command: self.name,
                    name: optional.name().to_owned(),
                });
            }

            for command in self.subcommands {
                let name = command.name.clone();

                if group.commands.insert(name.clone(), Rc::new(command)).is_some() {
                    return Err(DeclarationError::DuplicateSubcommand {
                        command: self.name,
                        name,
                    });
                }
            }
        }

        let is_group = group.is_some();

        Ok(Command {
            name: self.name,
            params,
            handler: self.handler,
            help: self.help,
            short_help: self.short_help,
            epilog: self.epilog,
            hidden: self.hidden,
            options_metavar: self.options_metavar,
            ignore_unknown_options: self.ignore_unknown_options,
            allow_interspersed_args: self.allow_interspersed_args.unwrap_or(!is_group),
            allow_extra_args: self.allow_extra_args.unwrap_or(is_group),
            no_args_is_help: self.no_args_is_help,
            help_option_names: match self.add_help_option {
                true => self.help_option_names,
                false => Vec::new(),
            },
            settings: self.settings,
            group,
        })
    }
}

/// Identifiers and option names must be unique, and only the last argument
/// may be variadic
fn check_params(command: &str, params: &[Parameter]) -> Result<(), DeclarationError> {
    let mut identifiers = HashSet::new();
    let mut names = HashSet::new();

    for param in params {
        if !identifiers.insert(param.name()) {
            return Err(DeclarationError::DuplicateIdentifier {
                command: command.to_owned(),
                identifier: param.name().to_owned(),
            });
        }

        for name in param.opts().iter().chain(param.secondary_opts()) {
            if !names.insert(name.as_str()) {
                return Err(DeclarationError::DuplicateOptionName {
                    command: command.to_owned(),
                    name: name.clone(),
                });
            }
        }
    }

    let mut arguments = params
        .iter()
        .filter(|param| param.kind() == ParamKind::Argument)
        .peekable();

    while let Some(argument) = arguments.next() {
        if argument.arity() == Arity::Variadic && arguments.peek().is_some() {
            return Err(DeclarationError::VariadicNotLast {
                name: argument.name().to_owned(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parameter::Argument;

    #[test]
    fn colliding_identifiers_are_declaration_errors() {
        let error = Command::new("tool")
            .param(Opt::new(["--dry-run"]))
            .param(Opt::new(["-d", "--dry_run"]))
            .build()
            .unwrap_err();

        assert_eq!(
            error,
            DeclarationError::DuplicateIdentifier {
                command: "tool".into(),
                identifier: "dry_run".into(),
            }
        );

        assert!(
            Command::new("tool")
                .param(Opt::new(["--dry-run"]))
                .param(Opt::new(["-d", "--dry_run", "other"]))
                .build()
                .is_ok()
        );
    }

    #[test]
    fn colliding_option_names() {
        let error = Command::new("tool")
            .param(Opt::new(["-v", "--verbose"]))
            .param(Opt::new(["-v", "--version", "ver"]))
            .build()
            .unwrap_err();

        assert_eq!(
            error,
            DeclarationError::DuplicateOptionName {
                command: "tool".into(),
                name: "-v".into(),
            }
        );
    }

    #[test]
    fn argument_shape_checks() {
        assert!(matches!(
            Command::new("tool")
                .param(Argument::new("files").variadic())
                .param(Argument::new("dest"))
                .build(),
            Err(DeclarationError::VariadicNotLast { .. })
        ));

        assert!(matches!(
            Command::group("tool")
                .chain()
                .param(Argument::new("maybe").required(false))
                .build(),
            Err(DeclarationError::ChainedOptionalArgument { .. })
        ));

        // Only a disabling form, but still an option
        let chain = Command::group("tool")
            .chain()
            .param(Opt::new(["/--no-color"]))
            .param(Argument::new("first"))
            .build()
            .unwrap();

        assert_eq!(chain.params()[0].kind(), ParamKind::Option);
    }

    #[test]
    fn duplicate_subcommands() {
        let error = Command::group("tool")
            .subcommand(Command::new("run").build().unwrap())
            .subcommand(Command::new("run").build().unwrap())
            .build()
            .unwrap_err();

        assert!(matches!(error, DeclarationError::DuplicateSubcommand { ref name, .. } if name == "run"));
    }

    #[test]
    fn help_option_is_appended() {
        let command = Command::new("tool")
            .param(Opt::new(["--name"]))
            .build()
            .unwrap();

        let names: Vec<&str> = command.params().iter().map(Parameter::name).collect();
        assert_eq!(names, ["name", "help"]);
        assert!(command.params()[1].eager());

        let bare = Command::new("tool").add_help_option(false).build().unwrap();
        assert!(bare.params().is_empty());
        assert!(bare.help_option_names().is_empty());
    }

    #[test]
    fn group_defaults() {
        let group = Command::group("tool").build().unwrap();
        assert!(!group.allow_interspersed_args);
        assert!(group.allow_extra_args);

        let leaf = Command::new("leaf").build().unwrap();
        assert!(leaf.allow_interspersed_args);
        assert!(!leaf.allow_extra_args);

        let promoted = Command::new("tool")
            .subcommand(Command::new("leaf").build().unwrap())
            .build()
            .unwrap();
        assert!(promoted.is_group());
    }

    #[test]
    fn short_help_is_the_first_sentence() {
        assert_eq!(make_short_help("Greets people. Loudly."), "Greets people.");
        assert_eq!(
            make_short_help(
                "Synchronize every configured remote repository with the local mirror"
            ),
            "Synchronize every configured remote..."
        );
    }
}
