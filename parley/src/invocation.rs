/*!
Entry points for running a command.

An [`Invocation`] collects everything a run needs: the arguments, the
program name, the [`Session`] collaborators, and the root context settings.
[`run`][Invocation::run] is library mode, which returns the handler's value
or the error as is. [`main`][Invocation::main] is standalone mode, which
reports errors the way a command line user expects and turns the outcome
into an exit status.
 */

use std::{any::Any, cell::RefCell, process::ExitCode, rc::Rc};

use crate::{
    arguments::LoadedArguments,
    command::Command,
    completion::{self, CompletionItem},
    config::DefaultMap,
    console::{Input, Output},
    context::{Context, RootSettings},
    environment::Environment,
    errors::Error,
    printers,
    session::Session,
    value::Value,
};

/// A configured, not yet started, run of a command. Created with
/// [`Command::invocation`].
#[must_use]
pub struct Invocation<'c> {
    command: &'c Command,
    args: Option<Vec<String>>,
    prog_name: Option<String>,
    session: Session,
    settings: RootSettings,
}

impl<'c> Invocation<'c> {
    pub(crate) fn new(command: &'c Command) -> Self {
        Self {
            command,
            args: None,
            prog_name: None,
            session: Session::process(),
            settings: RootSettings::default(),
        }
    }

    /// The arguments to parse, not including the program name. Without
    /// this, the process's arguments are used.
    pub fn args<I>(self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            args: Some(args.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// The name of the root command in usage and help. Defaults to the
    /// invoked program's file name, or the command's own name.
    pub fn prog_name(self, prog_name: impl Into<String>) -> Self {
        Self {
            prog_name: Some(prog_name.into()),
            ..self
        }
    }

    pub fn session(self, session: Session) -> Self {
        Self { session, ..self }
    }

    pub fn env(self, env: impl Environment + 'static) -> Self {
        Self {
            session: self.session.with_env(env),
            ..self
        }
    }

    pub fn input(self, input: impl Input + 'static) -> Self {
        Self {
            session: self.session.with_input(input),
            ..self
        }
    }

    pub fn output(self, output: impl Output + 'static) -> Self {
        Self {
            session: self.session.with_output(output),
            ..self
        }
    }

    pub fn error_output(self, error_output: impl Output + 'static) -> Self {
        Self {
            session: self.session.with_error_output(error_output),
            ..self
        }
    }

    /// Overrides for parameter defaults, keyed by identifier and nested by
    /// subcommand name
    pub fn default_map(mut self, default_map: DefaultMap) -> Self {
        self.settings.default_map = Some(Rc::new(default_map));
        self
    }

    /// Enable synthesized environment variable names for the whole tree,
    /// unless the root command declares its own prefix
    pub fn auto_envvar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.auto_envvar_prefix = Some(prefix.into());
        self
    }

    /// Set the shared object every context starts with. Handlers get it
    /// back with [`Context::find_object`].
    pub fn obj<T: 'static>(mut self, obj: T) -> Self {
        let obj: Rc<dyn Any> = Rc::new(RefCell::new(obj));
        self.settings.obj = Some(obj);
        self
    }

    fn into_parts(self) -> (&'c Command, String, Vec<String>, Session, RootSettings) {
        let Self {
            command,
            args,
            prog_name,
            session,
            settings,
        } = self;

        let (loaded_name, args) = match args {
            Some(args) => (None, args),
            None => {
                let loaded = LoadedArguments::from_env();
                let name = loaded.prog_name().map(str::to_owned);
                (name, loaded.into_arguments())
            }
        };

        let prog_name = prog_name
            .or(loaded_name)
            .unwrap_or_else(|| command.name().to_owned());

        (command, prog_name, args, session, settings)
    }

    fn run_shared(self) -> (Result<Value, Error>, Rc<Session>) {
        let (command, prog_name, args, session, settings) = self.into_parts();
        let session = session.into_shared();

        tracing::debug!(command = %prog_name, args = args.len(), "invoking");

        let result = {
            let ctx = Context::root_with(command, prog_name, Rc::clone(&session), settings);

            let result = command
                .parse_args(&ctx, args)
                .and_then(|()| command.invoke(&ctx));

            ctx.close();
            result
        };

        (result, session)
    }

    /**
    Run in library mode. Every context is closed, and its cleanups run,
    before this returns. Help and explicit exits are returned as
    [`Error::HelpShown`] and [`Error::Exit`].
     */
    pub fn run(self) -> Result<Value, Error> {
        self.run_shared().0
    }

    /**
    Run in standalone mode and return the exit status: 0 on success and after
    help, 2 for usage errors, 1 for aborts and handler failures, and the
    requested status for explicit exits. Errors are reported on the
    session's error output.
     */
    pub fn run_standalone(self) -> i32 {
        let (result, session) = self.run_shared();

        match result {
            Ok(_) => 0,
            Err(error) => {
                if let Some(message) = printers::error_message(&error)
                    && let Err(write_error) = session.error_output().write(&message.to_string())
                {
                    tracing::warn!(error = %write_error, "failed to report error");
                }

                error.exit_code()
            }
        }
    }

    /// Run in standalone mode, for returning from `main`
    pub fn main(self) -> ExitCode {
        let code = self.run_standalone();
        ExitCode::from(u8::try_from(code).unwrap_or(1))
    }

    /// Find completion candidates for `incomplete`, which follows the
    /// configured arguments. Nothing is run.
    #[must_use]
    pub fn complete(self, incomplete: &str) -> Vec<CompletionItem> {
        let (command, prog_name, args, session, settings) = self.into_parts();

        completion::complete_with(
            command,
            prog_name,
            session.into_shared(),
            settings,
            &args,
            incomplete,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        console::Buffer,
        parameter::{Argument, Opt},
        types::Integer,
    };

    fn hello() -> Command {
        Command::new("hello")
            .param(Opt::new(["--count"]).ty(Integer).default(1))
            .param(Argument::new("name"))
            .handler(|values| {
                let count: i64 = values.get("count").unwrap_or(1);
                let name: String = values.get("name").unwrap_or_default();
                Ok(Value::Str(format!("{name} x{count}")))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn library_mode_returns_the_handler_value() {
        let value = hello()
            .invocation()
            .args(["--count", "3", "Alice"])
            .env(HashMap::<String, String>::new())
            .run()
            .unwrap();

        assert_eq!(value, Value::Str("Alice x3".into()));
    }

    #[test]
    fn standalone_mode_reports_usage_errors() {
        let errors = Buffer::new();
        let code = hello()
            .invocation()
            .args(["--count", "3"])
            .prog_name("hello")
            .env(HashMap::<String, String>::new())
            .error_output(errors.clone())
            .run_standalone();

        assert_eq!(code, 2);
        assert_eq!(
            errors.contents(),
            "Usage: hello [OPTIONS] NAME\n\
            Try 'hello --help' for help.\n\
            \n\
            Error: Missing argument 'NAME'.\n"
        );
    }

    #[test]
    fn standalone_help_exits_zero() {
        let output = Buffer::new();
        let code = hello()
            .invocation()
            .args(["--help"])
            .env(HashMap::<String, String>::new())
            .output(output.clone())
            .run_standalone();

        assert_eq!(code, 0);
        assert!(output.contents().starts_with("Usage: hello [OPTIONS] NAME\n"));
    }
}
