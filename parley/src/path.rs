/*!
The path-like type converter, with existence, kind, and permission checks.
 */

use std::{
    env,
    fs::{self, Metadata},
    path::{Path, PathBuf},
};

use lazy_format::lazy_format;

use crate::{
    completion::{CompletionItem, CompletionKind},
    context::Context,
    errors::BadParameter,
    parameter::Parameter,
    types::ParamType,
    value::Value,
};

/**
A filesystem path. By default any path is accepted without touching the
filesystem; each builder method adds a check. Checks against a path that
doesn't exist only happen when [`exists`][PathType::exists] is set.
 */
#[derive(Debug, Clone, Copy)]
pub struct PathType {
    exists: bool,
    file_okay: bool,
    dir_okay: bool,
    readable: bool,
    writable: bool,
    executable: bool,
    resolve_path: bool,
    allow_dash: bool,
}

impl Default for PathType {
    fn default() -> Self {
        Self::new()
    }
}

impl PathType {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            exists: false,
            file_okay: true,
            dir_okay: true,
            readable: false,
            writable: false,
            executable: false,
            resolve_path: false,
            allow_dash: false,
        }
    }

    /// The path must exist
    #[must_use]
    pub const fn exists(self) -> Self {
        Self {
            exists: true,
            ..self
        }
    }

    /// Reject directories
    #[must_use]
    pub const fn file(self) -> Self {
        Self {
            dir_okay: false,
            file_okay: true,
            ..self
        }
    }

    /// Reject files
    #[must_use]
    pub const fn dir(self) -> Self {
        Self {
            dir_okay: true,
            file_okay: false,
            ..self
        }
    }

    #[must_use]
    pub const fn readable(self) -> Self {
        Self {
            readable: true,
            ..self
        }
    }

    #[must_use]
    pub const fn writable(self) -> Self {
        Self {
            writable: true,
            ..self
        }
    }

    #[must_use]
    pub const fn executable(self) -> Self {
        Self {
            executable: true,
            ..self
        }
    }

    /// Make the path absolute and resolve symlinks
    #[must_use]
    pub const fn resolve_path(self) -> Self {
        Self {
            resolve_path: true,
            ..self
        }
    }

    /// Accept a bare `-`, conventionally meaning a standard stream, without
    /// any checks
    #[must_use]
    pub const fn allow_dash(self) -> Self {
        Self {
            allow_dash: true,
            ..self
        }
    }

    fn noun(&self) -> &'static str {
        match (self.file_okay, self.dir_okay) {
            (true, false) => "File",
            (false, true) => "Directory",
            _ => "Path",
        }
    }

    fn check(&self, path: &Path) -> Result<PathBuf, BadParameter> {
        let display = path.display();
        let noun = self.noun();

        let path = match self.resolve_path {
            false => path.to_path_buf(),
            true => match fs::canonicalize(path) {
                Ok(path) => path,
                Err(_) if !self.exists => absolute(path),
                Err(_) => {
                    return Err(BadParameter::new(lazy_format!(
                        "{noun} '{display}' does not exist."
                    )));
                }
            },
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(_) if !self.exists => return Ok(path),
            Err(_) => {
                return Err(BadParameter::new(lazy_format!(
                    "{noun} '{display}' does not exist."
                )));
            }
        };

        if !self.file_okay && metadata.is_file() {
            return Err(BadParameter::new(lazy_format!("{noun} '{display}' is a file.")));
        }

        if !self.dir_okay && metadata.is_dir() {
            return Err(BadParameter::new(lazy_format!(
                "{noun} '{display}' is a directory."
            )));
        }

        if self.readable && fs::File::open(&path).is_err() && !metadata.is_dir() {
            return Err(BadParameter::new(lazy_format!(
                "{noun} '{display}' is not readable."
            )));
        }

        if self.writable && metadata.permissions().readonly() {
            return Err(BadParameter::new(lazy_format!(
                "{noun} '{display}' is not writable."
            )));
        }

        if self.executable && !is_executable(&metadata) {
            return Err(BadParameter::new(lazy_format!(
                "{noun} '{display}' is not executable."
            )));
        }

        Ok(path)
    }
}

fn absolute(path: &Path) -> PathBuf {
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt as _;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &Metadata) -> bool {
    metadata.is_file()
}

impl ParamType for PathType {
    fn name(&self) -> &str {
        match (self.file_okay, self.dir_okay) {
            (true, false) => "file",
            (false, true) => "directory",
            _ => "path",
        }
    }

    fn convert(&self, value: Value, _: &Parameter, _: &Context<'_>) -> Result<Value, BadParameter> {
        let path = match value {
            Value::Path(path) => path,
            Value::Str(s) if s == "-" && self.allow_dash => return Ok(Value::Path(s.into())),
            Value::Str(s) => PathBuf::from(s),
            value => {
                return Err(BadParameter::new(lazy_format!(
                    "'{value}' is not a valid {}.",
                    self.name()
                )));
            }
        };

        self.check(&path).map(Value::Path)
    }

    /// Path lists in the environment use the platform separator, like
    /// `PATH` does.
    fn split_environment_value<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        let separator = if cfg!(windows) { ';' } else { ':' };
        raw.split(separator).filter(|part| !part.is_empty()).collect()
    }

    fn complete(&self, _: &Context<'_>, incomplete: &str) -> Vec<CompletionItem> {
        let kind = match (self.file_okay, self.dir_okay) {
            (false, true) => CompletionKind::Dir,
            _ => CompletionKind::File,
        };

        Vec::from([CompletionItem::new(incomplete, kind)])
    }
}
