/*!
Standalone mode error rendering: how each [`Error`] is reported to the user
before the process exits.
 */

use std::fmt::Display;

use lazy_format::lazy_format;

use crate::{
    errors::{Error, UsageError, UsageHint},
    help::try_hint,
};

fn try_line(hint: &UsageHint) -> impl Display + '_ {
    lazy_format!(match (hint.help_option.as_deref()) {
        None => "",
        Some(help) => ("{}\n", try_hint(&hint.command_path, help)),
    })
}

/**
Render a usage error the way a command line user expects to see it:

```text
Usage: tool [OPTIONS] NAME
Try 'tool --help' for help.

Error: Missing argument 'NAME'.
```

The usage and "Try" lines are omitted when the error doesn't know which
command it came from, and the "Try" line is omitted when that command has
no help option.
 */
pub fn usage_error(error: &UsageError) -> impl Display + '_ {
    let kind = &error.kind;

    let header = lazy_format!(match (error.hint.as_deref()) {
        None => "",
        Some(hint) => (
            "Usage: {usage}\n{try_line}\n",
            usage = hint.usage.as_str(),
            try_line = try_line(hint),
        ),
    });

    lazy_format!("{header}Error: {kind}\n")
}

/// The message reported for `error` in standalone mode, if any. Help and
/// explicit exits are silent.
pub fn error_message(error: &Error) -> Option<impl Display + '_> {
    let message = lazy_format!(match (error) {
        Error::Usage(usage) => ("{}", usage_error(usage)),
        Error::Abort => "Aborted!\n",
        error => "Error: {error}\n",
    });

    match error {
        Error::HelpShown | Error::Exit(_) => None,
        _ => Some(message),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::{ParamKind, UsageErrorKind};

    fn missing_name() -> UsageError {
        UsageError::new(UsageErrorKind::MissingParameter {
            kind: ParamKind::Argument,
            hint: "'NAME'".into(),
        })
    }

    #[test]
    fn usage_errors_with_hint() {
        let mut error = missing_name();
        error.hint = Some(Box::new(UsageHint {
            command_path: "hello".into(),
            usage: "hello [OPTIONS] NAME".into(),
            help_option: Some("--help".into()),
        }));

        assert_eq!(
            usage_error(&error).to_string(),
            "Usage: hello [OPTIONS] NAME\n\
            Try 'hello --help' for help.\n\
            \n\
            Error: Missing argument 'NAME'.\n"
        );
    }

    #[test]
    fn usage_errors_without_help_option() {
        let mut error = missing_name();
        error.hint = Some(Box::new(UsageHint {
            command_path: "hello".into(),
            usage: "hello NAME".into(),
            help_option: None,
        }));

        assert_eq!(
            usage_error(&error).to_string(),
            "Usage: hello NAME\n\nError: Missing argument 'NAME'.\n"
        );

        assert_eq!(
            usage_error(&missing_name()).to_string(),
            "Error: Missing argument 'NAME'.\n"
        );
    }

    #[test]
    fn other_errors() {
        assert_eq!(
            error_message(&Error::Abort).map(|m| m.to_string()).as_deref(),
            Some("Aborted!\n")
        );
        assert_eq!(
            error_message(&Error::handler("disk full"))
                .map(|m| m.to_string())
                .as_deref(),
            Some("Error: disk full\n")
        );
        assert!(error_message(&Error::HelpShown).is_none());
        assert!(error_message(&Error::Exit(0)).is_none());
    }
}
