/*!
The environment variable collaborator, and the rules for synthesizing
variable names from an auto prefix.
 */

use std::collections::{BTreeMap, HashMap};

/// A read-only view of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment. Variables that aren't valid unicode are
/// treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> Environment for [(K, V)] {
    fn var(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.as_ref().to_owned())
    }
}

/// Look up the first of `names` that is set to a non-empty value. Empty
/// variables are treated exactly like unset ones. Returns the name along
/// with the value.
pub fn first_set<'n>(
    env: &(impl Environment + ?Sized),
    names: impl IntoIterator<Item = &'n str>,
) -> Option<(&'n str, String)> {
    names.into_iter().find_map(|name| match env.var(name) {
        Some(value) if !value.is_empty() => Some((name, value)),
        _ => None,
    })
}

/**
Build an environment variable name from a sequence of parts: each part is
uppercased, runs of characters that aren't ascii alphanumeric collapse into
a single `_`, and the parts are joined with `_`.

`env_name(["my-app", "sub cmd", "dry_run"])` is `MY_APP_SUB_CMD_DRY_RUN`.
 */
pub fn env_name<'p>(parts: impl IntoIterator<Item = &'p str>) -> String {
    let mut name = String::new();

    for part in parts {
        let mut pending_separator = !name.is_empty();

        for c in part.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator {
                    name.push('_');
                    pending_separator = false;
                }
                name.push(c.to_ascii_uppercase());
            } else if !name.is_empty() {
                pending_separator = true;
            }
        }
    }

    name
}
