//! Line-oriented terminal front end for the controller.
//!
//! Every input line replaces the text field and runs the handler, the same way
//! leaving an edited text box does. `:predict` re-runs the handler on the current
//! text, like pressing the button. `:quit` or end of input leaves the loop.
//!
//! With [`OutputFormat::Json`] each handled line prints exactly one JSON object
//! and the banner and prompt are left out, so the output can be piped.

use std::io::{BufRead, Write};
use anyhow::Result;
use rand::Rng;
use serde_json::json;

use crate::classifier::TextScoring;
use crate::controller::{Controller, DisplayResult, Outcome, Trigger};

pub const PREDICT_COMMAND: &str = ":predict";
pub const QUIT_COMMAND: &str = ":quit";
pub const PROMPT: &str = "Enter Text for Prediction> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Summary line and bar chart for people at a terminal
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Parses one input line. `None` means the session should end.
pub fn parse_line(line: &str) -> Option<Trigger> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    match line.trim() {
        QUIT_COMMAND => None,
        PREDICT_COMMAND => Some(Trigger::Predict),
        _ => Some(Trigger::Edited(line.to_string())),
    }
}

fn write_result<O: Write>(output: &mut O, result: &DisplayResult) -> Result<()> {
    writeln!(output, "{}", result.summary())?;
    writeln!(output, "### Text with highlighted words")?;
    write!(output, "{}", result.figure)?;
    Ok(())
}

fn write_outcome<M, R, O>(
    output: &mut O,
    outcome: &Outcome,
    controller: &Controller<'_, M, R>,
    format: OutputFormat,
) -> Result<()>
where
    M: TextScoring + ?Sized,
    R: Rng,
    O: Write,
{
    match (format, outcome) {
        (OutputFormat::Text, Outcome::Displayed(result)) => write_result(output, result)?,
        (OutputFormat::Text, Outcome::Ignored) => writeln!(output, "Please enter some text to classify.")?,
        (OutputFormat::Text, Outcome::Failed(message)) => {
            writeln!(output, "Error: {}", message)?;
            if let Some(previous) = controller.current() {
                writeln!(output, "Last result: {}", previous.summary())?;
            }
        }
        (OutputFormat::Json, Outcome::Displayed(result)) => writeln!(output, "{}", serde_json::to_string(result)?)?,
        (OutputFormat::Json, Outcome::Ignored) => writeln!(output, "{}", json!({"error": "empty input"}))?,
        (OutputFormat::Json, Outcome::Failed(message)) => writeln!(output, "{}", json!({"error": message}))?,
    }
    Ok(())
}

/// Drives the controller from `input` until quit or end of input.
///
/// Returns an error only for I/O failures or fatal detector errors.
pub fn run<M, R, I, O>(controller: &mut Controller<'_, M, R>, input: I, output: O) -> Result<()>
where
    M: TextScoring + ?Sized,
    R: Rng,
    I: BufRead,
    O: Write,
{
    run_with_format(controller, input, output, OutputFormat::Text)
}

pub fn run_with_format<M, R, I, O>(
    controller: &mut Controller<'_, M, R>,
    mut input: I,
    mut output: O,
    format: OutputFormat,
) -> Result<()>
where
    M: TextScoring + ?Sized,
    R: Rng,
    I: BufRead,
    O: Write,
{
    let interactive = format == OutputFormat::Text;
    if interactive {
        writeln!(output, "Hate Speech Detector ({} re-runs the last text, {} exits)", PREDICT_COMMAND, QUIT_COMMAND)?;
    }
    let mut line = String::new();
    loop {
        if interactive {
            write!(output, "{}", PROMPT)?;
        }
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let trigger = match parse_line(&line) {
            Some(trigger) => trigger,
            None => break,
        };

        let outcome = controller.handle(trigger)?;
        write_outcome(&mut output, &outcome, controller, format)?;
    }
    if interactive {
        writeln!(output)?;
    }
    output.flush()?;
    Ok(())
}
