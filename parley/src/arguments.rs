use std::{ffi::OsString, path::Path};

/// Helper type for loading arguments from the environment. Usually
/// [`Command::main`][crate::Command::main] does this for you.
///
/// Arguments that aren't valid UTF-8 are converted lossily, with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedArguments {
    prog_name: Option<String>,
    arguments: Vec<String>,
}

impl LoadedArguments {
    pub fn from_env() -> Self {
        Self::from_os_args(std::env::args_os())
    }

    /// Load from a full argument vector, including the program path as the
    /// first element
    pub fn from_os_args(args: impl IntoIterator<Item = OsString>) -> Self {
        let mut args = args.into_iter().map(|arg| match arg.into_string() {
            Ok(arg) => arg,
            Err(arg) => {
                let lossy = arg.to_string_lossy().into_owned();
                tracing::warn!(argument = %lossy, "argument is not valid UTF-8");
                lossy
            }
        });

        let prog_name = args.next().map(|argv0| {
            Path::new(&argv0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or(argv0)
        });

        Self {
            prog_name,
            arguments: args.collect(),
        }
    }

    /// The file name of the program, as it was invoked
    #[must_use]
    pub fn prog_name(&self) -> Option<&str> {
        self.prog_name.as_deref()
    }

    /// Everything after the program name
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    #[must_use]
    pub fn into_arguments(self) -> Vec<String> {
        self.arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_name_is_the_file_name() {
        let loaded = LoadedArguments::from_os_args(
            ["/usr/local/bin/tool", "sync", "--all"].map(OsString::from),
        );

        assert_eq!(loaded.prog_name(), Some("tool"));
        assert_eq!(loaded.arguments(), ["sync", "--all"]);
    }

    #[test]
    fn empty_argument_vector() {
        let loaded = LoadedArguments::from_os_args([]);

        assert_eq!(loaded.prog_name(), None);
        assert!(loaded.arguments().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn invalid_utf8_is_lossy() {
        use std::os::unix::ffi::OsStringExt as _;

        let loaded = LoadedArguments::from_os_args([
            OsString::from("tool"),
            OsString::from_vec(b"caf\xe9".to_vec()),
        ]);

        assert_eq!(loaded.arguments(), ["caf\u{FFFD}"]);
    }
}
