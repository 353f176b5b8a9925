/*!
Default value overrides.

A [`DefaultMap`] holds values keyed by parameter identifier, with nested
maps keyed by subcommand name. The root map applies to the root command;
each subcommand's context gets the nested map under its name. These values
are consulted after the command line and environment, and before a
parameter's declared default.

With the `config` feature, a map can be loaded from a TOML document, where
tables nest per subcommand:

```toml
count = 2

[greet]
name = "world"
```
 */

use std::{collections::BTreeMap, rc::Rc};

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultEntry {
    Value(Value),
    Map(Rc<DefaultMap>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultMap {
    entries: BTreeMap<String, DefaultEntry>,
}

impl DefaultMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default for the parameter with this identifier
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(name.into(), DefaultEntry::Value(value.into()));
        self
    }

    /// Add a nested map for the subcommand with this name
    #[must_use]
    pub fn subcommand(mut self, name: impl Into<String>, map: DefaultMap) -> Self {
        self.entries
            .insert(name.into(), DefaultEntry::Map(Rc::new(map)));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.entries.get(name)? {
            DefaultEntry::Value(value) => Some(value),
            DefaultEntry::Map(_) => None,
        }
    }

    #[must_use]
    pub fn get_map(&self, name: &str) -> Option<Rc<DefaultMap>> {
        match self.entries.get(name)? {
            DefaultEntry::Map(map) => Some(Rc::clone(map)),
            DefaultEntry::Value(_) => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefaultEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }
}

#[cfg(feature = "config")]
pub use self::toml_source::ConfigError;

#[cfg(feature = "config")]
mod toml_source {
    use std::{
        fs, io,
        path::{Path, PathBuf},
        rc::Rc,
    };

    use thiserror::Error;

    use super::{DefaultEntry, DefaultMap};
    use crate::value::Value;

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("failed to read {}: {source}", .path.display())]
        Io {
            path: PathBuf,
            #[source]
            source: io::Error,
        },

        #[error("invalid defaults document: {0}")]
        Parse(#[from] toml::de::Error),

        #[error("default for {key:?} can't be a {kind}")]
        Unsupported { key: String, kind: &'static str },
    }

    impl DefaultMap {
        /// Parse a TOML document into a default map
        pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
            let table: toml::Table = document.parse()?;
            from_table(table)
        }

        pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let document = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?;

            tracing::debug!(path = %path.display(), "loading default map");
            Self::from_toml_str(&document)
        }
    }

    fn from_table(table: toml::Table) -> Result<DefaultMap, ConfigError> {
        table
            .into_iter()
            .map(|(key, value)| {
                let entry = match value {
                    toml::Value::Table(table) => DefaultEntry::Map(Rc::new(from_table(table)?)),
                    value => DefaultEntry::Value(convert(&key, value)?),
                };
                Ok((key, entry))
            })
            .collect::<Result<_, _>>()
            .map(|entries| DefaultMap { entries })
    }

    fn convert(key: &str, value: toml::Value) -> Result<Value, ConfigError> {
        Ok(match value {
            toml::Value::String(s) => Value::Str(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(x) => Value::Float(x),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(datetime) => Value::Str(datetime.to_string()),
            toml::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| convert(key, item))
                    .collect::<Result<_, _>>()?,
            ),
            toml::Value::Table(_) => {
                return Err(ConfigError::Unsupported {
                    key: key.to_owned(),
                    kind: "table inside an array",
                });
            }
        })
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn tables_nest_per_subcommand() {
            let map = DefaultMap::from_toml_str(
                r#"
                count = 2
                names = ["a", "b"]

                [greet]
                name = "world"
                loud = true
                "#,
            )
            .unwrap();

            assert_eq!(map.get("count"), Some(&Value::Int(2)));
            assert_eq!(
                map.get("names"),
                Some(&Value::List(Vec::from([
                    Value::Str("a".into()),
                    Value::Str("b".into())
                ])))
            );
            assert_eq!(map.get("greet"), None);

            let greet = map.get_map("greet").unwrap();
            assert_eq!(
                *greet,
                DefaultMap::new().value("name", "world").value("loud", true)
            );
        }

        #[test]
        fn tables_in_arrays_are_rejected() {
            let error = DefaultMap::from_toml_str("items = [{ a = 1 }]").unwrap_err();
            assert!(matches!(error, ConfigError::Unsupported { ref key, .. } if key == "items"));
        }

        #[test]
        fn files_are_read() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("defaults.toml");
            fs::write(&path, "verbose = true\n").unwrap();

            let map = DefaultMap::from_toml_file(&path).unwrap();
            assert_eq!(map.get("verbose"), Some(&Value::Bool(true)));

            assert!(matches!(
                DefaultMap::from_toml_file(dir.path().join("missing.toml")),
                Err(ConfigError::Io { .. })
            ));
        }
    }
}
