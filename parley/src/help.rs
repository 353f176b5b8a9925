/*!
Usage lines and help pages.

Help is rendered from a [`Context`], so that the command path, the inherited
settings (`show_default`, `max_content_width`, the auto envvar prefix), and
dynamic subcommand sources all reflect the actual invocation.
 */

use std::fmt::{self, Display, Write as _};

use indent_write::fmt::IndentWriter;
use joinery::JoinableIterator;
use lazy_format::lazy_format;

use crate::{
    context::Context,
    environment,
    errors::ParamKind,
    parameter::{DefaultValue, Parameter},
    value::Value,
};

/// Terms wider than this get their definition on the next line
const MAX_TERM_WIDTH: usize = 30;

/// Space between a term and its definition
const COLUMN_SPACING: usize = 2;

/// The indentation of section bodies and descriptions
const INDENT: &str = "  ";

/// The synopsis pieces contributed by a command's parameters, and by its
/// subcommands if it's a group
fn collect_usage_pieces(ctx: &Context<'_>) -> Vec<String> {
    let command = ctx.command();
    let mut pieces = Vec::new();

    if !command.options_metavar().is_empty() {
        pieces.push(command.options_metavar().to_owned());
    }

    pieces.extend(
        command
            .params()
            .iter()
            .filter(|param| param.kind() == ParamKind::Argument && !param.hidden())
            .map(Parameter::make_metavar),
    );

    match (command.is_group(), command.is_chain()) {
        (false, _) => {}
        (true, false) => pieces.push("COMMAND [ARGS]...".to_owned()),
        (true, true) => pieces.push("COMMAND1 [ARGS]... [COMMAND2 [ARGS]...]...".to_owned()),
    }

    pieces
}

/// The full synopsis, like `tool sync [OPTIONS] REMOTE`
pub(crate) fn usage_pieces(ctx: &Context<'_>) -> String {
    let path = ctx.command_path();
    let pieces = collect_usage_pieces(ctx);

    match pieces.is_empty() {
        true => path,
        false => format!("{path} {}", pieces.iter().join_with(" ")),
    }
}

/// Collapse runs of whitespace, so that help declared in indented string
/// literals wraps cleanly
fn normalize(text: &str) -> String {
    text.split_whitespace().join_with(" ").to_string()
}

/// Write each paragraph of `text`, wrapped and indented
fn paragraphs(out: &mut String, text: &str, width: usize) -> fmt::Result {
    let width = width.saturating_sub(INDENT.len()).max(20);
    let mut out = IndentWriter::new(INDENT, out);

    let paragraphs = text
        .trim()
        .split("\n\n")
        .map(normalize)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| textwrap::fill(&paragraph, width));

    write!(out, "{}", paragraphs.join_with("\n\n"))?;
    writeln!(out)
}

/// Write a two column list: terms on the left, their wrapped definitions
/// aligned on the right
fn definition_list(out: &mut impl fmt::Write, rows: &[(String, String)], width: usize) -> fmt::Result {
    let term_width = rows
        .iter()
        .map(|(term, _)| term.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_TERM_WIDTH);

    let first = term_width + COLUMN_SPACING;
    let text_width = width
        .saturating_sub(first + INDENT.len())
        .max(10);

    for (term, definition) in rows {
        out.write_str(term)?;

        if definition.is_empty() {
            writeln!(out)?;
            continue;
        }

        let term_len = term.chars().count();
        let lines = textwrap::wrap(definition, text_width);
        let mut lines = lines.iter();

        match term_len <= term_width {
            true => write!(out, "{:pad$}", "", pad = first - term_len)?,
            false => write!(out, "\n{:first$}", "")?,
        }

        if let Some(line) = lines.next() {
            writeln!(out, "{line}")?;
        }

        lines.try_for_each(|line| writeln!(out, "{:first$}{line}", ""))?;
    }

    Ok(())
}

/// Write a section with a header and an indented definition list, only if
/// there's at least one row
fn maybe_section(out: &mut String, header: &str, rows: &[(String, String)], width: usize) -> fmt::Result {
    if rows.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n{header}:")?;
    definition_list(&mut IndentWriter::new(INDENT, out), rows, width)
}

/// The names and metavar of an option, like `-c, --count INTEGER` or
/// `--shout / --no-shout`
fn option_term(param: &Parameter) -> String {
    let names = param.opts().iter().join_with(", ");

    let names = match param.takes_no_value() {
        true => names.to_string(),
        false => format!("{names} {}", param.make_metavar()),
    };

    match (param.opts(), param.secondary_opts()) {
        (_, []) => names,
        ([], secondary) => secondary.iter().join_with(", ").to_string(),
        (_, secondary) => format!("{names} / {}", secondary.iter().join_with(", ")),
    }
}

/// The default as shown in help, if it should be shown at all
fn default_display(ctx: &Context<'_>, param: &Parameter) -> Option<String> {
    if !param.show_default.unwrap_or(ctx.show_default()) {
        return None;
    }

    let value = match param.default()? {
        DefaultValue::Dynamic(_) => return Some("(dynamic)".to_owned()),
        DefaultValue::Static(value) => value,
    };

    if param.is_flag() {
        // A flag's default is the name of the form that produces it
        return match (value, param.secondary_opts().first()) {
            (&Value::Bool(on), Some(secondary)) => {
                let name = match on {
                    true => param.opts().first().unwrap_or(secondary),
                    false => secondary,
                };
                Some(name.trim_start_matches('-').to_owned())
            }
            _ => None,
        };
    }

    (!value.is_empty()).then(|| value.to_string())
}

/// The bracketed notes after an option's help, like
/// `[env var: TOOL_COUNT; default: 1; 1<=x<=5; required]`
fn option_extras(ctx: &Context<'_>, param: &Parameter) -> Option<String> {
    let mut extras = Vec::new();

    if param.show_envvar {
        let envvars = match (param.envvars(), ctx.auto_envvar_prefix()) {
            ([], Some(prefix)) => Some(environment::env_name([prefix, param.name()])),
            ([], None) => None,
            (envvars, _) => Some(envvars.iter().join_with(", ").to_string()),
        };

        if let Some(envvars) = envvars {
            extras.push(format!("env var: {envvars}"));
        }
    }

    if let Some(default) = default_display(ctx, param) {
        extras.push(format!("default: {default}"));
    }

    extras.extend(param.ty().help_extra());

    if param.required() {
        extras.push("required".to_owned());
    }

    (!extras.is_empty()).then(|| format!("[{}]", extras.iter().join_with("; ")))
}

fn option_row(ctx: &Context<'_>, param: &Parameter) -> (String, String) {
    let help = param.help().map(normalize);
    let extras = option_extras(ctx, param);

    let definition = match (help, extras) {
        (Some(help), Some(extras)) => format!("{help}  {extras}"),
        (Some(text), None) | (None, Some(text)) => text,
        (None, None) => String::new(),
    };

    (option_term(param), definition)
}

/**
Render the help page for the context's command.

The page is the usage line, the command's help text, a section each for
arguments (only when some argument has help text), options, and
subcommands, and finally the epilog.
 */
pub(crate) fn format_help(ctx: &Context<'_>) -> String {
    let mut out = String::new();

    // Writing into a String can't fail
    let _ = write_help(&mut out, ctx);
    out
}

fn write_help(out: &mut String, ctx: &Context<'_>) -> fmt::Result {
    let command = ctx.command();
    let width = ctx.max_content_width();

    let usage = textwrap::Options::new(width).subsequent_indent("       ");
    writeln!(
        out,
        "{}",
        textwrap::fill(&format!("Usage: {}", usage_pieces(ctx)), usage)
    )?;

    if let Some(help) = command.help() {
        writeln!(out)?;
        paragraphs(out, help, width)?;
    }

    let visible = || command.params().iter().filter(|param| !param.hidden());

    let arguments: Vec<(String, String)> = visible()
        .filter(|param| param.kind() == ParamKind::Argument)
        .map(|param| {
            (
                param.make_metavar(),
                param.help().map(normalize).unwrap_or_default(),
            )
        })
        .collect();

    if arguments.iter().any(|(_, help)| !help.is_empty()) {
        maybe_section(out, "Arguments", &arguments, width)?;
    }

    let options: Vec<(String, String)> = visible()
        .filter(|param| param.kind() == ParamKind::Option)
        .map(|param| option_row(ctx, param))
        .collect();

    maybe_section(out, "Options", &options, width)?;

    if command.is_group() {
        let commands: Vec<(String, String)> = command
            .visible_commands(ctx)
            .into_iter()
            .map(|resolved| {
                let short_help = resolved.command.short_help().unwrap_or_default();
                (resolved.name, short_help)
            })
            .collect();

        maybe_section(out, "Commands", &commands, width)?;
    }

    if let Some(epilog) = command.epilog() {
        writeln!(out)?;
        paragraphs(out, epilog, width)?;
    }

    Ok(())
}

/// A one line "Try 'tool --help' for help." hint
pub(crate) fn try_hint<'a>(command_path: &'a str, help_option: &'a str) -> impl Display + 'a {
    lazy_format!("Try '{command_path} {help_option}' for help.")
}
