/*!
The value resolution pipeline.

Each parameter's value comes from the first source that has one: the
command line, the environment, the context's default map, the declared
default, and finally an interactive prompt. The value is then converted and
shaped, checked for presence, and handed to the parameter's callback.

Parameters are processed eagerly-first, then in order of their first
appearance on the command line, then in declaration order. A parameter's
callback or dynamic default can rely on every parameter processed before it
already being in the context.
 */

use crate::{
    context::{Context, ParameterSource},
    environment,
    errors::{Error, ParamKind, UsageErrorKind},
    parameter::{Action, Arity, Parameter},
    parser::{Occurrence, ParseOutcome},
    prompt,
    types,
    value::Value,
};

/// What the command line said about a parameter
#[derive(Debug, Clone, PartialEq)]
enum Raw {
    Value(Value),

    /// Given bare, with a prompt to fill in the value
    Prompt,
}

/// Shape a single occurrence's raw values
fn occurrence_value(param: &Parameter, occurrence: Occurrence) -> Raw {
    match occurrence {
        Occurrence::Switch(value) => Raw::Value(value),
        Occurrence::Count => Raw::Value(Value::Int(1)),
        Occurrence::Values(values) => {
            let mut values = values.into_iter().map(Value::Str);

            Raw::Value(match (param.arity, values.len()) {
                (Arity::Variadic, _) => Value::List(values.collect()),
                (Arity::Fixed(1), 1) => values.next().unwrap_or_default(),
                _ => Value::Tuple(values.collect()),
            })
        }
        Occurrence::Bare => match param.option_info().map(|info| (&info.action, &info.prompt)) {
            Some((_, Some(spec))) if !spec.required => Raw::Prompt,
            Some((Action::OptionalValue(value), _)) => Raw::Value(value.clone()),
            _ => Raw::Value(Value::None),
        },
    }
}

fn command_line_value(param: &Parameter, occurrences: Vec<Occurrence>) -> Option<Raw> {
    if occurrences.is_empty() {
        return None;
    }

    if param.is_count() {
        let count = i64::try_from(occurrences.len()).unwrap_or(i64::MAX);
        return Some(Raw::Value(Value::Int(count)));
    }

    if param.multiple {
        let items = occurrences
            .into_iter()
            .map(|occurrence| match occurrence_value(param, occurrence) {
                Raw::Value(value) => value,
                Raw::Prompt => Value::None,
            })
            .collect();

        return Some(Raw::Value(Value::List(items)));
    }

    // Last occurrence wins
    occurrences
        .into_iter()
        .next_back()
        .map(|occurrence| occurrence_value(param, occurrence))
}

/// Split an environment variable into the shape the parameter expects
fn environment_value(param: &Parameter, raw: String) -> Value {
    let grouped = matches!(param.arity, Arity::Fixed(n) if n > 1);

    if !param.is_list() && !grouped {
        return Value::Str(raw);
    }

    let items: Vec<Value> = param
        .ty
        .split_environment_value(&raw)
        .into_iter()
        .map(|item| Value::Str(item.to_owned()))
        .collect();

    match (param.arity, param.multiple) {
        (Arity::Fixed(n), true) if n > 1 => Value::List(
            items
                .chunks(n)
                .map(|chunk| Value::Tuple(chunk.to_vec()))
                .collect(),
        ),
        (Arity::Fixed(n), false) if n > 1 => Value::Tuple(items),
        _ => Value::List(items),
    }
}

fn lookup_environment(ctx: &Context<'_>, param: &Parameter) -> Option<Value> {
    let env = ctx.env();

    let (name, raw) = match environment::first_set(env, param.envvars.iter().map(String::as_str)) {
        Some((name, raw)) => (name.to_owned(), raw),
        None => {
            // Synthesized names are consulted after every explicit name
            if param.kind() != ParamKind::Option {
                return None;
            }

            let name = environment::env_name([ctx.auto_envvar_prefix()?, param.name()]);
            let (_, raw) = environment::first_set(env, [name.as_str()])?;
            (name, raw)
        }
    };

    tracing::trace!(param = param.name(), variable = %name, "value from environment");
    Some(environment_value(param, raw))
}

/// Find a value, and where it came from
fn lookup(
    ctx: &Context<'_>,
    param: &Parameter,
    raw: Option<Raw>,
) -> Result<Option<(Value, ParameterSource)>, Error> {
    match raw {
        Some(Raw::Value(value)) => return Ok(Some((value, ParameterSource::CommandLine))),
        Some(Raw::Prompt) => {
            return match (param.prompt(), ctx.resilient_parsing()) {
                (Some(spec), false) => prompt::prompt_for_value(ctx, param, spec)
                    .map(|value| Some((value, ParameterSource::Prompt))),
                _ => Ok(Some((Value::None, ParameterSource::CommandLine))),
            };
        }
        None => {}
    }

    if let Some(value) = lookup_environment(ctx, param) {
        return Ok(Some((value, ParameterSource::Environment)));
    }

    if let Some(value) = ctx.lookup_default(param.name()) {
        return Ok(Some((value, ParameterSource::DefaultMap)));
    }

    if let Some(default) = &param.default {
        let value = default.produce(ctx)?;

        if !value.is_none() {
            return Ok(Some((value, ParameterSource::Default)));
        }
    }

    match param.prompt() {
        Some(spec) if spec.required && !ctx.resilient_parsing() => {
            prompt::prompt_for_value(ctx, param, spec)
                .map(|value| Some((value, ParameterSource::Prompt)))
        }
        _ => Ok(None),
    }
}

/// Convert a single, non-list value, enforcing the tuple arity
fn convert_group(ctx: &Context<'_>, param: &Parameter, value: Value) -> Result<Value, Error> {
    let convert = |value| {
        param
            .ty
            .convert(value, param, ctx)
            .map_err(|error| error.with_hint(|| param.display_hint()))
    };

    match param.arity {
        Arity::Fixed(n) if n > 1 && param.ty.arity().is_none() => {
            let items = value.into_items();

            if items.len() != n {
                return Err(types::takes_values(n, items.len())
                    .with_hint(|| param.display_hint())
                    .into());
            }

            items
                .into_iter()
                .map(convert)
                .collect::<Result<_, _>>()
                .map(Value::Tuple)
                .map_err(Error::from)
        }
        _ => convert(value).map_err(Error::from),
    }
}

/// Convert a found value and give it its final shape. Missing values become
/// `None`, or an empty list for list parameters.
fn convert(ctx: &Context<'_>, param: &Parameter, value: Option<Value>) -> Result<Value, Error> {
    let value = match value {
        Some(value) if !value.is_none() => value,
        _ if param.is_list() => return Ok(Value::List(Vec::new())),
        _ => return Ok(Value::None),
    };

    if param.multiple {
        return value
            .into_items()
            .into_iter()
            .map(|item| convert_group(ctx, param, item))
            .collect::<Result<_, _>>()
            .map(Value::List);
    }

    if param.arity == Arity::Variadic {
        return value
            .into_items()
            .into_iter()
            .map(|item| {
                param
                    .ty
                    .convert(item, param, ctx)
                    .map_err(|error| Error::from(error.with_hint(|| param.display_hint())))
            })
            .collect::<Result<_, _>>()
            .map(Value::List);
    }

    convert_group(ctx, param, value)
}

/// Run one parameter through the whole pipeline, storing the result in the
/// context
fn handle_parameter(ctx: &Context<'_>, param: &Parameter, raw: Option<Raw>) -> Result<(), Error> {
    let resilient = ctx.resilient_parsing();
    let found = lookup(ctx, param, raw)?;

    let (value, source) = match found {
        Some((value, source)) => (Some(value), Some(source)),
        None => (None, None),
    };

    if let Some(source) = source {
        tracing::trace!(param = param.name(), ?source, "found parameter value");
        ctx.set_parameter_source(param.name(), source);
    }

    let value = match convert(ctx, param, value) {
        Ok(value) => value,
        Err(_) if resilient => match param.is_list() {
            true => Value::List(Vec::new()),
            false => Value::None,
        },
        Err(error) => return Err(error),
    };

    if param.required && value.is_empty() && !resilient {
        return Err(UsageErrorKind::MissingParameter {
            kind: param.kind(),
            hint: param.display_hint(),
        }
        .into());
    }

    let value = match (&param.callback, resilient) {
        (Some(callback), false) => {
            callback(ctx, param, value).map_err(|error| error.with_param_hint(|| param.display_hint()))?
        }
        _ => value,
    };

    if param.expose_value {
        ctx.set_value(param.name(), value);
    }

    Ok(())
}

/// Resolve all of a command's parameters into `ctx`, in processing order.
pub(crate) fn resolve_all(
    ctx: &Context<'_>,
    params: &[Parameter],
    outcome: ParseOutcome,
) -> Result<(), Error> {
    let ParseOutcome {
        mut occurrences,
        first_seen,
        ..
    } = outcome;

    let mut order: Vec<usize> = (0..params.len()).collect();
    order.sort_by_key(|&index| {
        (
            !params[index].eager,
            first_seen.get(index).copied().flatten().unwrap_or(usize::MAX),
        )
    });

    order.into_iter().try_for_each(|index| {
        let param = &params[index];
        let occurrences = occurrences.get_mut(index).map(std::mem::take).unwrap_or_default();
        let raw = command_line_value(param, occurrences);

        handle_parameter(ctx, param, raw)
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        command::Command,
        console::{Buffer, ScriptedInput},
        parameter::{Argument, Opt},
        parser::{self, ParseSettings},
        session::Session,
        types::{IntRange, Tuple, Integer},
    };

    struct Harness {
        command: Command,
        env: HashMap<String, String>,
        input: Vec<&'static str>,
    }

    impl Harness {
        fn new(command: Command) -> Self {
            Self {
                command,
                env: HashMap::new(),
                input: Vec::new(),
            }
        }

        fn env(mut self, name: &str, value: &str) -> Self {
            self.env.insert(name.into(), value.into());
            self
        }

        fn input(mut self, lines: &[&'static str]) -> Self {
            self.input.extend(lines);
            self
        }

        /// Resolve `args` and pass the context to `check`
        fn run(&self, args: &[&str], check: impl FnOnce(Result<(), Error>, &Context<'_>)) {
            let session = Session::new(
                self.env.clone(),
                ScriptedInput::new(self.input.iter().copied()),
                Buffer::new(),
                Buffer::new(),
            );
            let ctx = Context::root(&self.command, "test", session.into_shared());
            let args: Vec<String> = args.iter().map(|&arg| arg.to_owned()).collect();
            let settings = ParseSettings {
                allow_interspersed_args: true,
                ..ParseSettings::default()
            };

            let result = parser::parse(self.command.params(), &args, settings)
                .and_then(|outcome| resolve_all(&ctx, self.command.params(), outcome));

            check(result, &ctx);
        }
    }

    #[test]
    fn sources_in_priority_order() {
        let command = Command::new("test")
            .param(Opt::new(["--name"]).envvar("USERNAME").default("anon"))
            .build()
            .unwrap();

        Harness::new(command.clone()).run(&["--name", "cli"], |result, ctx| {
            result.unwrap();
            assert_eq!(ctx.get::<String>("name").unwrap(), "cli");
            assert_eq!(ctx.get_parameter_source("name"), Some(ParameterSource::CommandLine));
        });

        Harness::new(command.clone())
            .env("USERNAME", "john")
            .run(&[], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<String>("name").unwrap(), "john");
                assert_eq!(ctx.get_parameter_source("name"), Some(ParameterSource::Environment));
            });

        Harness::new(command)
            .env("USERNAME", "")
            .run(&[], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<String>("name").unwrap(), "anon");
                assert_eq!(ctx.get_parameter_source("name"), Some(ParameterSource::Default));
            });
    }

    #[test]
    fn prefixed_names_follow_explicit_ones() {
        let command = Command::new("test")
            .auto_envvar_prefix("TOOL")
            .param(Opt::new(["--name"]).envvar("TOOL_USER"))
            .build()
            .unwrap();

        Harness::new(command.clone())
            .env("TOOL_NAME", "auto")
            .run(&[], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<String>("name").unwrap(), "auto");
                assert_eq!(ctx.get_parameter_source("name"), Some(ParameterSource::Environment));
            });

        Harness::new(command)
            .env("TOOL_NAME", "auto")
            .env("TOOL_USER", "explicit")
            .run(&[], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<String>("name").unwrap(), "explicit");
            });
    }

    #[test]
    fn prompts_come_last() {
        let command = Command::new("test")
            .param(Opt::new(["--age"]).ty(Integer).prompt("Age"))
            .build()
            .unwrap();

        Harness::new(command.clone())
            .input(&["x", "41"])
            .run(&[], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<i64>("age"), Some(41));
                assert_eq!(ctx.get_parameter_source("age"), Some(ParameterSource::Prompt));
            });

        Harness::new(command).run(&["--age", "3"], |result, ctx| {
            result.unwrap();
            assert_eq!(ctx.get::<i64>("age"), Some(3));
        });
    }

    #[test]
    fn optional_values_prompt_only_when_bare() {
        let command = Command::new("test")
            .param(Opt::new(["--name"]).prompt("Name").prompt_optional())
            .build()
            .unwrap();

        Harness::new(command.clone()).run(&[], |result, ctx| {
            result.unwrap();
            assert_eq!(ctx.value("name"), Some(Value::None));
            assert_eq!(ctx.get_parameter_source("name"), None);
        });

        Harness::new(command)
            .input(&["typed"])
            .run(&["--name"], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<String>("name").unwrap(), "typed");
                assert_eq!(ctx.get_parameter_source("name"), Some(ParameterSource::Prompt));
            });
    }

    #[test]
    fn shapes() {
        let command = Command::new("test")
            .param(Opt::new(["--tag"]).multiple())
            .param(Opt::new(["--point"]).ty(Tuple::new().then(Integer).then(Integer)))
            .param(Opt::new(["--pair"]).nargs(2).multiple())
            .param(Opt::new(["-v"]).count())
            .param(Argument::new("files").variadic())
            .build()
            .unwrap();

        Harness::new(command.clone()).run(
            &["--tag", "a", "-vvv", "--point", "1", "2", "--tag", "b", "--pair", "x", "y", "f"],
            |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<Vec<String>>("tag").unwrap(), ["a", "b"]);
                assert_eq!(ctx.get::<(i64, i64)>("point"), Some((1, 2)));
                assert_eq!(
                    ctx.get::<Vec<(String, String)>>("pair").unwrap(),
                    [("x".to_owned(), "y".to_owned())]
                );
                assert_eq!(ctx.get::<i64>("v"), Some(3));
                assert_eq!(ctx.get::<Vec<String>>("files").unwrap(), ["f"]);
            },
        );

        Harness::new(command).run(&[], |result, ctx| {
            result.unwrap();
            assert_eq!(ctx.value("tag"), Some(Value::List(Vec::new())));
            assert_eq!(ctx.value("point"), Some(Value::None));
            assert_eq!(ctx.get::<i64>("v"), Some(0));
            assert_eq!(ctx.value("files"), Some(Value::List(Vec::new())));
        });
    }

    #[test]
    fn environment_values_are_split_for_lists() {
        let command = Command::new("test")
            .param(Opt::new(["--tag"]).multiple().envvar("TAGS"))
            .param(Opt::new(["--pair"]).nargs(2).envvar("PAIR"))
            .build()
            .unwrap();

        Harness::new(command)
            .env("TAGS", "a b  c")
            .env("PAIR", "x y")
            .run(&[], |result, ctx| {
                result.unwrap();
                assert_eq!(ctx.get::<Vec<String>>("tag").unwrap(), ["a", "b", "c"]);
                assert_eq!(
                    ctx.get::<(String, String)>("pair"),
                    Some(("x".to_owned(), "y".to_owned()))
                );
            });
    }

    #[test]
    fn conversion_errors_name_the_parameter() {
        let command = Command::new("test")
            .param(Opt::new(["-n", "--number"]).ty(IntRange::new(1, 5)))
            .build()
            .unwrap();

        Harness::new(command).run(&["-n", "9"], |result, _| {
            assert_eq!(
                result.unwrap_err().to_string(),
                "Invalid value for '-n' / '--number': 9 is not in the range 1<=x<=5."
            );
        });
    }

    #[test]
    fn missing_parameters() {
        let command = Command::new("test")
            .param(Opt::new(["--token"]).required())
            .param(Argument::new("name"))
            .build()
            .unwrap();

        Harness::new(command.clone()).run(&["--token", "t"], |result, _| {
            assert_eq!(result.unwrap_err().to_string(), "Missing argument 'NAME'.");
        });

        Harness::new(command).run(&["n"], |result, _| {
            assert_eq!(result.unwrap_err().to_string(), "Missing option '--token'.");
        });
    }

    #[test]
    fn callback_order() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let logged = |name: &'static str| {
            let log = Rc::clone(&log);
            move |_: &Context<'_>, _: &Parameter, value: Value| {
                log.borrow_mut().push(name);
                Ok(value)
            }
        };

        let command = Command::new("test")
            .add_help_option(false)
            .param(Opt::new(["--a"]).callback(logged("a")))
            .param(Opt::new(["--b"]).callback(logged("b")))
            .param(Opt::new(["--c"]).callback(logged("c")))
            .param(Opt::new(["--eager"]).flag().eager().callback(logged("eager")))
            .param(Argument::new("x").required(false).callback(logged("x")))
            .build()
            .unwrap();

        let harness = Harness::new(command);
        harness.run(&["--c", "1", "--a", "2", "pos", "--eager"], |result, _| {
            result.unwrap();
        });

        assert_eq!(*log.borrow(), ["eager", "c", "a", "x", "b"]);

        log.borrow_mut().clear();
        harness.run(&["pos", "--c", "1"], |result, _| {
            result.unwrap();
        });

        assert_eq!(*log.borrow(), ["eager", "x", "c", "a", "b"]);
    }

    #[test]
    fn callbacks_can_reject_with_a_hint() {
        let command = Command::new("test")
            .param(Opt::new(["--even"]).ty(Integer).callback(|_, _, value| {
                match value.as_int() {
                    Some(n) if n % 2 != 0 => Err(Error::bad_parameter("must be even")),
                    _ => Ok(value),
                }
            }))
            .build()
            .unwrap();

        Harness::new(command).run(&["--even", "3"], |result, _| {
            assert_eq!(
                result.unwrap_err().to_string(),
                "Invalid value for '--even': must be even"
            );
        });
    }

    #[test]
    fn dynamic_defaults_see_earlier_values() {
        let command = Command::new("test")
            .param(Opt::new(["--greeting"]).default_with(|ctx| {
                let name: String = ctx.get("name").unwrap_or_default();
                Ok(Value::Str(format!("hello {name}")))
            }))
            .param(Opt::new(["--name"]))
            .build()
            .unwrap();

        Harness::new(command).run(&["--name", "ada"], |result, ctx| {
            result.unwrap();
            assert_eq!(ctx.get::<String>("greeting").unwrap(), "hello ada");
        });
    }
}
