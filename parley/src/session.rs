/*!
The collaborators that a whole invocation tree shares: environment, input,
and output. Every [`Context`][crate::Context] in a tree holds the same
[`Session`].
 */

use std::{fmt, rc::Rc};

use crate::{
    console::{Input, Output, Stderr, Stdin, Stdout},
    environment::{Environment, ProcessEnvironment},
};

pub struct Session {
    env: Box<dyn Environment>,
    input: Box<dyn Input>,
    output: Box<dyn Output>,
    error_output: Box<dyn Output>,
}

impl Session {
    pub fn new(
        env: impl Environment + 'static,
        input: impl Input + 'static,
        output: impl Output + 'static,
        error_output: impl Output + 'static,
    ) -> Self {
        Self {
            env: Box::new(env),
            input: Box::new(input),
            output: Box::new(output),
            error_output: Box::new(error_output),
        }
    }

    /// The real process environment, stdin, stdout, and stderr
    #[must_use]
    pub fn process() -> Self {
        Self::new(ProcessEnvironment, Stdin, Stdout, Stderr)
    }

    #[must_use]
    pub fn with_env(self, env: impl Environment + 'static) -> Self {
        Self {
            env: Box::new(env),
            ..self
        }
    }

    #[must_use]
    pub fn with_input(self, input: impl Input + 'static) -> Self {
        Self {
            input: Box::new(input),
            ..self
        }
    }

    #[must_use]
    pub fn with_output(self, output: impl Output + 'static) -> Self {
        Self {
            output: Box::new(output),
            ..self
        }
    }

    #[must_use]
    pub fn with_error_output(self, error_output: impl Output + 'static) -> Self {
        Self {
            error_output: Box::new(error_output),
            ..self
        }
    }

    #[must_use]
    pub fn into_shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    #[must_use]
    pub fn env(&self) -> &dyn Environment {
        &*self.env
    }

    #[must_use]
    pub fn input(&self) -> &dyn Input {
        &*self.input
    }

    /// Where help and prompts are written
    #[must_use]
    pub fn output(&self) -> &dyn Output {
        &*self.output
    }

    /// Where errors are written in standalone mode
    #[must_use]
    pub fn error_output(&self) -> &dyn Output {
        &*self.error_output
    }

    /// An empty environment, no input, and discarded output
    #[cfg(test)]
    pub(crate) fn testing() -> Self {
        use std::collections::HashMap;

        use crate::console::{Buffer, ScriptedInput};

        Self::new(
            HashMap::<String, String>::new(),
            ScriptedInput::default(),
            Buffer::new(),
            Buffer::new(),
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::process()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

