/*!
The interactive step of the resolution pipeline.
 */

use crate::{
    context::Context,
    errors::Error,
    parameter::{Parameter, PromptSpec},
    value::Value,
};

/// Read one line, turning end of input into an abort
fn read(ctx: &Context<'_>, text: &str, hidden: bool) -> Result<String, Error> {
    let session = ctx.session();
    session.output().write(text)?;

    match session.input().read_line(hidden)? {
        Some(line) => Ok(line),
        None => {
            // Finish the prompt's line before the abort message
            session.output().write("\n")?;
            Err(Error::Abort)
        }
    }
}

/**
Ask for a parameter's value until a response converts successfully.

Empty responses are asked again. A conversion failure is reported and asked
again, and with confirmation enabled the value must be entered twice,
identically. End of input at any point is [`Error::Abort`].
 */
pub(crate) fn prompt_for_value(
    ctx: &Context<'_>,
    param: &Parameter,
    spec: &PromptSpec,
) -> Result<Value, Error> {
    let text = format!("{}: ", spec.text);

    loop {
        let response = read(ctx, &text, spec.hide_input)?;

        if response.is_empty() {
            continue;
        }

        let value = match param.ty.convert(Value::Str(response.clone()), param, ctx) {
            Ok(value) => value,
            Err(error) => {
                ctx.echo(format_args!("Error: {}", error.message))?;
                continue;
            }
        };

        if !spec.confirmation {
            return Ok(value);
        }

        let confirmation = read(ctx, "Repeat for confirmation: ", spec.hide_input)?;

        if confirmation == response {
            return Ok(value);
        }

        ctx.echo("Error: The two entered values do not match.")?;
    }
}
