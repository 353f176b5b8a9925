/*!
A declarative toolkit for building command line interfaces out of commands,
groups, options, and arguments.

A [`Command`] is declared with a builder, which catches declaration
mistakes (colliding names, misplaced variadic arguments) up front. Running
it parses the arguments level by level: each command parses its own
parameters, and a group hands whatever is left over to a subcommand. Every
parameter's value comes from the first source that has one:

1. the command line
2. environment variables, explicit or synthesized from an auto prefix
3. the default map (see [`config`])
4. the declared default
5. an interactive prompt

The value is then converted by the parameter's type, checked, and passed
through its callback. Handlers read the results by name from the
[`Context`], which also carries a shared object, cleanup hooks, and a link
to the parent context.

```no_run
use parley::{Argument, Command, Opt, Value, types::Integer};

let hello = Command::new("hello")
    .help("Simple program that greets NAME.")
    .param(Opt::new(["--count"]).ty(Integer).default(1).help("Number of greetings."))
    .param(Argument::new("name"))
    .context_handler(|ctx| {
        let name: String = ctx.get("name").unwrap_or_default();
        for _ in 0..ctx.get::<i64>("count").unwrap_or(1) {
            ctx.echo(format_args!("Hello {name}!"))?;
        }
        Ok(Value::None)
    })
    .build()
    .expect("declaration is valid");

std::process::exit(hello.invocation().run_standalone());
```

Commands can be run in library mode with [`Invocation::run`], which returns
the handler's value or the [`Error`], or in standalone mode with
[`Command::main`], which reports errors the way a command line user expects
and produces an exit status.
*/

pub mod arguments;
pub mod command;
pub mod completion;
pub mod config;
pub mod console;
pub mod context;
pub mod environment;
pub mod errors;
mod help;
mod impls;
pub mod invocation;
pub mod parameter;
mod parser;
pub mod path;
pub mod printers;
mod prompt;
mod resolve;
pub mod session;
pub mod types;
pub mod util;
pub mod value;

pub use crate::{
    command::{Command, CommandBuilder, Handler, LazySubcommands, Resolved, Subcommands},
    completion::{CompletionItem, CompletionKind, complete},
    config::DefaultMap,
    context::{Context, ParamValues, ParameterSource},
    errors::{BadParameter, DeclarationError, Error, UsageError, UsageErrorKind},
    invocation::Invocation,
    parameter::{Argument, Arity, Opt, Parameter},
    session::Session,
    value::{FromValue, Value},
};
