use std::{fs, path::PathBuf};

use anyhow::Context as _;
use lazy_format::lazy_format;
use parley::{
    Argument, Command, Context, DeclarationError, Error, Opt, Value,
    path::PathType,
    types::{Choice, IntRange},
};

/// The root `textkit` group
pub fn textkit() -> Result<Command, DeclarationError> {
    Command::group("textkit")
        .help("Small text utilities.\n\nEvery option can also be set with a TEXTKIT_ environment variable.")
        .param(Opt::version(env!("CARGO_PKG_VERSION")))
        .param(
            Opt::new(["-q", "--quiet"])
                .flag()
                .help("Only print results."),
        )
        .subcommand(greet()?)
        .subcommand(pipe()?)
        .alias("hello", "greet")
        .build()
}

fn greet() -> Result<Command, DeclarationError> {
    Command::new("greet")
        .help("Greet NAME a few times.")
        .param(
            Opt::new(["-c", "--count"])
                .ty(IntRange::new(1, 10).clamp())
                .default(1)
                .show_default(true)
                .help("Number of greetings."),
        )
        .param(
            Opt::new(["--style"])
                .ty(Choice::new(["plain", "excited"]).case_insensitive())
                .default("plain")
                .help("How enthusiastic to be."),
        )
        .param(Argument::new("name").help("Who to greet."))
        .context_handler(|ctx| {
            let name: String = ctx.get("name").unwrap_or_default();
            let count: i64 = ctx.get("count").unwrap_or(1);
            let excited = ctx.get::<String>("style").as_deref() == Some("excited");

            let greeting = lazy_format!(match (excited) {
                true => "Hello, {name}!",
                false => "Hello, {name}.",
            });

            for _ in 0..count {
                ctx.echo(&greeting)?;
            }

            Ok(Value::Int(count))
        })
        .build()
}

/// Chained text transformations over a shared buffer
fn pipe() -> Result<Command, DeclarationError> {
    Command::group("pipe")
        .help("Run text through a chain of steps, such as `pipe read notes.txt upper print`.")
        .chain()
        .subcommand(
            Command::new("read")
                .help("Load text from FILE.")
                .param(Argument::new("file").ty(PathType::new().exists().file()))
                .context_handler(|ctx| {
                    let path: PathBuf = ctx.get("file").unwrap_or_default();
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))
                        .map_err(Error::handler)?;

                    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded text");
                    replace_text(ctx, |_| text)
                })
                .build()?,
        )
        .subcommand(transform("upper", "Convert to upper case.", str::to_uppercase)?)
        .subcommand(transform("lower", "Convert to lower case.", str::to_lowercase)?)
        .subcommand(transform("reverse", "Reverse the characters.", |text| {
            text.chars().rev().collect()
        })?)
        .subcommand(
            Command::new("print")
                .help("Print the current text.")
                .context_handler(|ctx| {
                    let text = shared_text(ctx)?;
                    let text = text.borrow();
                    ctx.echo(text.as_str())?;
                    Ok(Value::None)
                })
                .build()?,
        )
        .result_callback(|ctx, results| {
            let steps = results.into_items().len();
            let quiet: bool = ctx
                .parent()
                .and_then(|parent| parent.get("quiet"))
                .unwrap_or(false);

            if !quiet {
                ctx.echo_err(lazy_format!("ran {steps} steps"))?;
            }

            Ok(Value::Int(steps as i64))
        })
        .build()
}

fn transform(
    name: &str,
    help: &str,
    apply: fn(&str) -> String,
) -> Result<Command, DeclarationError> {
    Command::new(name)
        .help(help)
        .context_handler(move |ctx| replace_text(ctx, apply))
        .build()
}

fn shared_text(ctx: &Context<'_>) -> Result<std::rc::Rc<std::cell::RefCell<String>>, Error> {
    ctx.find_object::<String>()
        .ok_or_else(|| Error::handler(anyhow::anyhow!("no text buffer was provided")))
}

fn replace_text(ctx: &Context<'_>, update: impl FnOnce(&str) -> String) -> Result<Value, Error> {
    let text = shared_text(ctx)?;
    let updated = update(&text.borrow());
    *text.borrow_mut() = updated.clone();
    Ok(Value::Str(updated))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parley::console::Buffer;

    use super::*;

    #[test]
    fn declaration_is_valid() {
        textkit().unwrap();
    }

    #[test]
    fn chained_steps() {
        let output = Buffer::new();
        let errors = Buffer::new();

        let value = textkit()
            .unwrap()
            .invocation()
            .args(["pipe", "upper", "reverse", "print"])
            .env(HashMap::<String, String>::new())
            .output(output.clone())
            .error_output(errors.clone())
            .obj(String::from("abc"))
            .run()
            .unwrap();

        assert_eq!(value, Value::Int(3));
        assert_eq!(output.contents(), "CBA\n");
        assert_eq!(errors.contents(), "ran 3 steps\n");
    }

    #[test]
    fn greeting_through_an_alias() {
        let output = Buffer::new();

        textkit()
            .unwrap()
            .invocation()
            .args(["hello", "--style", "EXCITED", "-c", "2", "Ada"])
            .env(HashMap::<String, String>::new())
            .output(output.clone())
            .run()
            .unwrap();

        assert_eq!(output.contents(), "Hello, Ada!\nHello, Ada!\n");
    }
}
