#![cfg(feature = "config")]

use std::{collections::HashMap, fs};

use parley::{Command, DefaultMap, Opt, ParameterSource, Value, config::ConfigError, types::Integer};
use pretty_assertions::assert_eq;

fn tool() -> Command {
    Command::group("tool")
        .param(Opt::new(["--verbose"]).flag())
        .subcommand(
            Command::new("greet")
                .param(Opt::new(["--name"]).default("nobody"))
                .param(Opt::new(["--count"]).ty(Integer).default(1))
                .context_handler(|ctx| {
                    let verbose: bool = ctx
                        .parent()
                        .and_then(|parent| parent.get("verbose"))
                        .unwrap_or(false);
                    let name: String = ctx.get("name").unwrap_or_default();
                    let count: i64 = ctx.get("count").unwrap_or_default();

                    Ok(Value::Str(format!(
                        "{name} x{count} (verbose: {verbose}, name from {:?})",
                        ctx.get_parameter_source("name")
                    )))
                })
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn run(defaults: DefaultMap, args: &[&str]) -> Value {
    tool()
        .invocation()
        .args(args.iter().copied())
        .env(HashMap::<String, String>::new())
        .default_map(defaults)
        .run()
        .unwrap()
}

const DEFAULTS: &str = r#"
verbose = true

[greet]
name = "world"
count = "3"
"#;

#[test]
fn toml_defaults_feed_resolution() {
    let defaults = DefaultMap::from_toml_str(DEFAULTS).unwrap();

    assert_eq!(
        run(defaults, &["greet"]),
        Value::from("world x3 (verbose: true, name from Some(DefaultMap))")
    );
}

#[test]
fn command_line_beats_the_default_map() {
    let defaults = DefaultMap::from_toml_str(DEFAULTS).unwrap();

    assert_eq!(
        run(defaults, &["greet", "--name", "Alice"]),
        Value::from("Alice x3 (verbose: true, name from Some(CommandLine))")
    );
}

#[test]
fn defaults_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tool.toml");
    fs::write(&path, DEFAULTS).unwrap();

    let defaults = DefaultMap::from_toml_file(&path).unwrap();
    assert_eq!(
        run(defaults, &["greet"]),
        Value::from("world x3 (verbose: true, name from Some(DefaultMap))")
    );
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let error = DefaultMap::from_toml_file(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(error, ConfigError::Io { .. }));
}

#[test]
fn tables_in_arrays_are_rejected() {
    let error = DefaultMap::from_toml_str("tags = [{ name = \"a\" }]").unwrap_err();
    assert_eq!(
        error.to_string(),
        "default for \"tags\" can't be a table inside an array"
    );
}
