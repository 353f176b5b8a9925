/*!
The shell completion requester.

Given the tokens typed so far and the incomplete token under the cursor,
[`complete`] finds the candidates a shell should offer. The command tree is
walked with resilient contexts: nothing is prompted for, callbacks and
handlers never run, and parse errors are ignored. Rendering the candidates
for a particular shell is up to the caller.
 */

use std::rc::Rc;

use crate::{
    command::{Command, Resolved},
    context::{Context, ParameterSource, RootSettings},
    errors::ParamKind,
    parameter::{Arity, Parameter},
    session::Session,
};

/// How a shell should treat a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompletionKind {
    /// Offer the value as is
    #[default]
    Plain,

    /// Let the shell complete file names
    File,

    /// Let the shell complete directory names
    Dir,
}

/// A single completion candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub value: String,
    pub kind: CompletionKind,
    pub help: Option<String>,
}

impl CompletionItem {
    pub fn new(value: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            value: value.into(),
            kind,
            help: None,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, CompletionKind::Plain)
    }

    #[must_use]
    pub fn with_help(self, help: Option<impl Into<String>>) -> Self {
        Self {
            help: help.map(Into::into),
            ..self
        }
    }
}

/**
Find completion candidates for `incomplete`, given the `args` that precede
it (not including the program name), against the process environment.
 */
#[must_use]
pub fn complete(command: &Command, args: &[String], incomplete: &str) -> Vec<CompletionItem> {
    complete_with(
        command,
        command.name().to_owned(),
        Session::process().into_shared(),
        RootSettings::default(),
        args,
        incomplete,
    )
}

pub(crate) fn complete_with(
    command: &Command,
    prog_name: String,
    session: Rc<Session>,
    settings: RootSettings,
    args: &[String],
    incomplete: &str,
) -> Vec<CompletionItem> {
    tracing::debug!(incomplete, args = args.len(), "completing");

    let settings = RootSettings {
        resilient: true,
        ..settings
    };

    let ctx = Context::root_with(command, prog_name, session, settings);
    complete_in(&ctx, args.to_vec(), incomplete)
}

/// Parse `args` at this level, then either descend into the subcommand they
/// name or complete here
fn complete_in(ctx: &Context<'_>, args: Vec<String>, incomplete: &str) -> Vec<CompletionItem> {
    let command = ctx.command();

    if let Err(error) = command.parse_args(ctx, args.clone()) {
        tracing::trace!(%error, "ignoring error while completing");
    }

    let leftover = ctx.args();

    if let Some((name, rest)) = leftover.split_first()
        && let Some(first) = command.get_command(ctx, name)
    {
        let (resolved, args) = match command.is_chain() {
            false => (first, rest.to_vec()),
            true => last_chained(ctx, first, rest.to_vec()),
        };

        tracing::trace!(subcommand = %resolved.name, "completing in subcommand");

        let sub_ctx = Context::child(ctx, &resolved.command, resolved.name.as_str());
        return complete_in(&sub_ctx, args, incomplete);
    }

    candidates(ctx, &args, incomplete)
}

/// Walk the steps of a chain the way invoking it would, and return the
/// step the incomplete token belongs to, with its args
fn last_chained(ctx: &Context<'_>, first: Resolved, args: Vec<String>) -> (Resolved, Vec<String>) {
    let mut current = (first, args);

    loop {
        let next = {
            let (resolved, args) = &current;
            let step_ctx = Context::child(ctx, &resolved.command, resolved.name.as_str());

            match resolved.command.parse_chained(&step_ctx, args.clone()) {
                Ok(rest) => rest.split_first().and_then(|(head, tail)| {
                    let resolved = ctx.command().get_command(ctx, head)?;
                    Some((resolved, tail.to_vec()))
                }),
                Err(error) => {
                    tracing::trace!(%error, "ignoring error in chained step");
                    None
                }
            }
        };

        match next {
            Some(next) => current = next,
            None => return current,
        }
    }
}

/// True for tokens that introduce an option, as opposed to values
fn starts_option(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn find_option<'c>(command: &'c Command, name: &str) -> Option<&'c Parameter> {
    command
        .params()
        .iter()
        .find(|param| param.opts().iter().any(|opt| opt == name))
}

/// The option whose value is being typed, if the incomplete token is in
/// the value position of an option among the last few tokens
fn awaiting_value<'c>(command: &'c Command, args: &[String]) -> Option<&'c Parameter> {
    command
        .params()
        .iter()
        .filter(|param| param.kind() == ParamKind::Option && !param.takes_no_value())
        .find(|param| {
            let nargs = match param.arity() {
                Arity::Fixed(nargs) => nargs,
                Arity::Variadic => 1,
            };

            let last_option = args
                .iter()
                .rev()
                .take(nargs)
                .filter(|token| starts_option(token))
                .last();

            last_option.is_some_and(|token| param.opts().contains(token))
        })
}

/// The first argument that could still take the incomplete token
fn incomplete_argument<'c>(ctx: &Context<'_>, command: &'c Command) -> Option<&'c Parameter> {
    command
        .params()
        .iter()
        .filter(|param| param.kind() == ParamKind::Argument)
        .find(|param| {
            param.arity() == Arity::Variadic
                || ctx.get_parameter_source(param.name()) != Some(ParameterSource::CommandLine)
        })
}

fn option_names(ctx: &Context<'_>, command: &Command, incomplete: &str) -> Vec<CompletionItem> {
    command
        .params()
        .iter()
        .filter(|param| param.kind() == ParamKind::Option && !param.hidden())
        .filter(|param| {
            param.multiple()
                || ctx.get_parameter_source(param.name()) != Some(ParameterSource::CommandLine)
        })
        .flat_map(|param| {
            param
                .opts()
                .iter()
                .chain(param.secondary_opts())
                .filter(|name| name.starts_with(incomplete))
                .map(|name| CompletionItem::plain(name.as_str()).with_help(param.help()))
        })
        .collect()
}

fn subcommand_names(ctx: &Context<'_>, incomplete: &str) -> Vec<CompletionItem> {
    ctx.command()
        .visible_commands(ctx)
        .into_iter()
        .filter(|resolved| resolved.name.starts_with(incomplete))
        .map(|resolved| {
            CompletionItem::plain(resolved.name).with_help(resolved.command.short_help())
        })
        .collect()
}

fn candidates(ctx: &Context<'_>, args: &[String], incomplete: &str) -> Vec<CompletionItem> {
    let command = ctx.command();
    let ended = args.iter().any(|token| token == "--");

    if !ended {
        if let Some((name, value)) = incomplete.split_once('=')
            && name.starts_with("--")
        {
            return match find_option(command, name) {
                Some(param) if !param.takes_no_value() => param.ty().complete(ctx, value),
                _ => Vec::new(),
            };
        }

        if let Some(param) = awaiting_value(command, args) {
            tracing::trace!(option = param.name(), "completing option value");
            return param.ty().complete(ctx, incomplete);
        }

        if incomplete.starts_with('-') {
            return option_names(ctx, command, incomplete);
        }
    }

    let mut items = match incomplete_argument(ctx, command) {
        Some(argument) => argument.ty().complete(ctx, incomplete),
        None => Vec::new(),
    };

    if command.is_group() {
        items.extend(subcommand_names(ctx, incomplete));
    } else if let Some(parent) = ctx.parent()
        && parent.command().is_chain()
    {
        // More subcommands can follow inside a chain
        items.extend(subcommand_names(parent, incomplete));
    }

    items
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        parameter::{Argument, Opt},
        path::PathType,
        types::Choice,
    };

    fn values(items: Vec<CompletionItem>) -> Vec<String> {
        items.into_iter().map(|item| item.value).collect()
    }

    fn run(command: &Command, args: &[&str], incomplete: &str) -> Vec<CompletionItem> {
        let args: Vec<String> = args.iter().map(|&arg| arg.to_owned()).collect();
        complete_with(
            command,
            "tool".to_owned(),
            Session::testing().into_shared(),
            RootSettings::default(),
            &args,
            incomplete,
        )
    }

    fn tool() -> Command {
        Command::group("tool")
            .param(Opt::new(["--verbose"]).flag().help("Talk more."))
            .subcommand(
                Command::new("paint")
                    .help("Paint something.")
                    .param(Opt::new(["--color"]).ty(Choice::new(["red", "green", "blue"])))
                    .param(Opt::new(["--out"]).ty(PathType::new()))
                    .param(Argument::new("shade").ty(Choice::new(["dark", "light"])))
                    .build()
                    .unwrap(),
            )
            .subcommand(Command::new("pack").build().unwrap())
            .subcommand(Command::new("secret").hidden().build().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn subcommand_names_with_help() {
        let items = run(&tool(), &[], "pa");

        assert_eq!(
            items,
            [
                CompletionItem::plain("pack"),
                CompletionItem::plain("paint").with_help(Some("Paint something.")),
            ]
        );
    }

    #[test]
    fn options_of_the_current_command() {
        assert_eq!(values(run(&tool(), &[], "--")), ["--verbose", "--help"]);
        assert_eq!(values(run(&tool(), &["paint"], "--c")), ["--color"]);
    }

    #[test]
    fn options_already_given_are_left_out() {
        assert_eq!(
            values(run(&tool(), &["paint", "--color", "red"], "--")),
            ["--out", "--help"]
        );
    }

    #[test]
    fn option_values() {
        assert_eq!(values(run(&tool(), &["paint", "--color"], "g")), ["green"]);
        assert_eq!(values(run(&tool(), &["paint"], "--color=b")), ["blue"]);

        let paths = run(&tool(), &["paint", "--out"], "sr");
        assert_eq!(paths, [CompletionItem::new("sr", CompletionKind::File)]);
    }

    #[test]
    fn argument_values() {
        assert_eq!(values(run(&tool(), &["paint"], "")), ["dark", "light"]);
        assert!(run(&tool(), &["paint", "dark"], "").is_empty());
    }

    #[test]
    fn chained_siblings() {
        let chain = Command::group("tool")
            .chain()
            .subcommand(Command::new("upper").build().unwrap())
            .subcommand(Command::new("lower").build().unwrap())
            .build()
            .unwrap();

        assert_eq!(values(run(&chain, &["upper"], "")), ["lower", "upper"]);
    }
}
