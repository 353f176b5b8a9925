/*!
The parser core. Drives a [`parley_lexer::ArgumentsParser`] over one
command level's tokens, matching option tokens against the command's
declared names, and then assigns the collected positionals to arguments in
declaration order.

The output is a [`ParseOutcome`]: every occurrence of every parameter, in
command line order, plus the position of each parameter's first
occurrence and the tokens nothing claimed. Turning occurrences into values
is the resolution pipeline's job.
 */

use std::collections::HashMap;

use parley_lexer::{Arg, ArgAccess, ArgumentsParser, Visitor};

use crate::{
    errors::{Error, ParamKind, UsageErrorKind},
    parameter::{Action, Arity, Parameter},
    util,
};

/// A single appearance of a parameter on the command line
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Occurrence {
    /// A flag, with the value of the form that was used
    Switch(crate::value::Value),

    /// One more for a count option
    Count,

    /// The raw values taken by this occurrence
    Values(Vec<String>),

    /// An option with an optional value, given without one
    Bare,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ParseSettings {
    pub ignore_unknown_options: bool,
    pub allow_interspersed_args: bool,

    /// Never fail: unknown options are forwarded and options missing their
    /// values are dropped
    pub resilient: bool,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ParseOutcome {
    /// Indexed like the command's parameters
    pub occurrences: Vec<Vec<Occurrence>>,

    /// Indexed like the command's parameters. Options are numbered in token
    /// order, then arguments in declaration order.
    pub first_seen: Vec<Option<usize>>,

    pub leftover: Vec<String>,
}

impl ParseOutcome {
    fn new(len: usize) -> Self {
        Self {
            occurrences: vec![Vec::new(); len],
            first_seen: vec![None; len],
            leftover: Vec::new(),
        }
    }

    fn record(&mut self, index: usize, occurrence: Occurrence, position: usize) {
        self.occurrences[index].push(occurrence);
        self.first_seen[index].get_or_insert(position);
    }
}

/// Every declared option name, mapped to its parameter's index and whether
/// it's the disabling form
struct OptionIndex<'p> {
    names: HashMap<&'p str, (usize, bool)>,
}

impl<'p> OptionIndex<'p> {
    fn new(params: &'p [Parameter]) -> Self {
        let names = params
            .iter()
            .enumerate()
            .flat_map(|(index, param)| {
                let primary = param.opts().iter().map(move |opt| (opt.as_str(), (index, false)));
                let secondary = param
                    .secondary_opts()
                    .iter()
                    .map(move |opt| (opt.as_str(), (index, true)));

                primary.chain(secondary)
            })
            .collect();

        Self { names }
    }

    fn get(&self, name: &str) -> Option<(usize, bool)> {
        self.names.get(name).copied()
    }
}

enum Step<'arg> {
    Positional(&'arg str),

    /// An unknown option token, passed through unchanged
    Forwarded(String),

    Occurrence(usize, Occurrence),

    /// A malformed option, ignored in resilient mode
    Skipped,
}

#[derive(Clone, Copy)]
struct Scan<'a, 'p> {
    params: &'p [Parameter],
    index: &'a OptionIndex<'p>,
    settings: ParseSettings,
}

impl<'p> Scan<'_, 'p> {
    fn action(&self, index: usize) -> Option<&'p Action> {
        self.params[index].option_info().map(|info| &info.action)
    }

    fn unknown<'arg>(&self, name: String, token: impl FnOnce() -> String) -> Result<Step<'arg>, Error> {
        if self.settings.ignore_unknown_options || self.settings.resilient {
            tracing::trace!(option = %name, "forwarding unknown option");
            return Ok(Step::Forwarded(token()));
        }

        // Long names are only compared with long names, and short with short
        let long = name.starts_with("--");
        let candidates = self
            .index
            .names
            .keys()
            .copied()
            .filter(|candidate| candidate.starts_with("--") == long);
        let possibilities = util::suggestions(&name, candidates);

        Err(UsageErrorKind::NoSuchOption {
            name,
            possibilities,
        }
        .into())
    }

    fn misuse<'arg>(&self, option: String, message: String) -> Result<Step<'arg>, Error> {
        match self.settings.resilient {
            true => Ok(Step::Skipped),
            false => Err(UsageErrorKind::BadOptionUsage { option, message }.into()),
        }
    }

    /// Handle `--name` or `-n`, fetching values through `access` if the
    /// option takes any
    fn occur<'arg>(
        &self,
        name: String,
        arg: impl ArgAccess<'arg>,
    ) -> Result<Step<'arg>, Error> {
        let Some((index, secondary)) = self.index.get(&name) else {
            return self.unknown(name.clone(), || name);
        };

        let occurrence = match self.action(index) {
            None => return self.unknown(name.clone(), || name),
            Some(Action::Flag { on, off }) => {
                Occurrence::Switch(if secondary { off.clone() } else { on.clone() })
            }
            Some(Action::Count) => Occurrence::Count,
            Some(Action::OptionalValue(_)) => {
                match arg.take_if(|next| !next.as_str().starts_with('-')) {
                    Some(value) => Occurrence::Values(Vec::from([value.as_str().to_owned()])),
                    None => Occurrence::Bare,
                }
            }
            Some(Action::Store) => {
                let count = match self.params[index].arity() {
                    Arity::Fixed(count) => count,
                    Arity::Variadic => 1,
                };

                let mut values = Vec::with_capacity(count);
                let delivered = arg.take_many(count, |value| values.push(value.as_str().to_owned()));

                if delivered < count {
                    let message = match count {
                        1 => format!("Option '{name}' requires an argument."),
                        count => format!("Option '{name}' requires {count} arguments."),
                    };
                    return self.misuse(name, message);
                }

                Occurrence::Values(values)
            }
        };

        Ok(Step::Occurrence(index, occurrence))
    }
}

impl<'arg> Visitor<'arg> for Scan<'_, '_> {
    type Value = Result<Step<'arg>, Error>;

    fn visit_positional(self, argument: Arg<'arg>) -> Self::Value {
        Ok(Step::Positional(argument.as_str()))
    }

    fn visit_long_option(self, option: Arg<'arg>, argument: Arg<'arg>) -> Self::Value {
        let name = format!("--{}", option.as_str());
        let argument = argument.as_str();

        let Some((index, _)) = self.index.get(&name) else {
            return self.unknown(name.clone(), || format!("{name}={argument}"));
        };

        match self.action(index) {
            Some(Action::Flag { .. } | Action::Count) => {
                let message = format!("Option '{name}' does not take a value.");
                self.misuse(name, message)
            }
            Some(Action::Store) if self.params[index].arity() != Arity::Fixed(1) => {
                let message = format!(
                    "Option '{name}' takes {} values, which can't be given with '='.",
                    match self.params[index].arity() {
                        Arity::Fixed(count) => count,
                        Arity::Variadic => 1,
                    }
                );
                self.misuse(name, message)
            }
            _ => Ok(Step::Occurrence(
                index,
                Occurrence::Values(Vec::from([argument.to_owned()])),
            )),
        }
    }

    fn visit_long(self, option: Arg<'arg>, arg: impl ArgAccess<'arg>) -> Self::Value {
        self.occur(format!("--{}", option.as_str()), arg)
    }

    fn visit_short(self, option: char, arg: impl ArgAccess<'arg>) -> Self::Value {
        self.occur(format!("-{option}"), arg)
    }

    fn claims_numeric(&self, token: Arg<'arg>) -> bool {
        self.index.get(token.as_str()).is_some()
    }
}

/// Parse one command level's tokens against its parameters.
pub(crate) fn parse(
    params: &[Parameter],
    args: &[String],
    settings: ParseSettings,
) -> Result<ParseOutcome, Error> {
    let index = OptionIndex::new(params);
    let scan = Scan {
        params,
        index: &index,
        settings,
    };

    let mut outcome = ParseOutcome::new(params.len());
    let mut positionals: Vec<(String, usize)> = Vec::new();
    let mut position = 0;
    let mut parser = ArgumentsParser::new(args.iter().map(String::as_str));

    // Options and positionals share one position counter, so arguments sort
    // among options by where their first value appeared
    while let Some(step) = parser.next_arg(scan) {
        match step? {
            Step::Positional(arg) => {
                positionals.push((arg.to_owned(), position));
                position += 1;

                if !settings.allow_interspersed_args {
                    break;
                }
            }
            Step::Forwarded(token) => {
                positionals.push((token, position));
                position += 1;
            }
            Step::Occurrence(index, occurrence) => {
                outcome.record(index, occurrence, position);
                position += 1;
            }
            Step::Skipped => {}
        }
    }

    positionals.extend(
        parser
            .into_remaining()
            .zip(position..)
            .map(|(token, position)| (token.to_owned(), position)),
    );

    let mut positionals = positionals.into_iter().peekable();

    for (index, param) in params.iter().enumerate() {
        if param.kind() != ParamKind::Argument {
            continue;
        }

        let Some(&(_, first)) = positionals.peek() else {
            break;
        };

        let values: Vec<String> = match param.arity() {
            Arity::Variadic => positionals.by_ref().map(|(token, _)| token).collect(),
            Arity::Fixed(count) => positionals
                .by_ref()
                .take(count)
                .map(|(token, _)| token)
                .collect(),
        };

        outcome.record(index, Occurrence::Values(values), first);
    }

    outcome.leftover = positionals.map(|(token, _)| token).collect();

    tracing::trace!(
        tokens = args.len(),
        leftover = outcome.leftover.len(),
        "parsed command line"
    );

    Ok(outcome)
}
