//! Output collaborators: help rendering and logging sinks.
//!
//! The engine never formats text itself. It asks a [`Printer`] for text and
//! hands that text to a [`Logger`].

use crate::{Argument, Command, OptionDef, ParseError};

/// Renders help, error and version text.
pub trait Printer: Send + Sync {
    /// Full help for `cmd`. `full_name` is the space separated path from the
    /// root to `cmd`.
    fn help(&self, cmd: &Command, full_name: &str) -> String;

    fn error(&self, error: &ParseError) -> String {
        format!("Error: {error}")
    }

    fn version(&self, cmd: &Command) -> String {
        cmd.version_text().unwrap_or_default().to_string()
    }
}

/// Output sinks used at the parse boundary and by the built-in help options.
pub trait Logger: Send + Sync {
    fn info(&self, text: &str);
    fn error(&self, text: &str);
}

/// Writes `info` to stdout and `error` to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn info(&self, text: &str) {
        println!("{text}");
    }

    fn error(&self, text: &str) {
        eprintln!("{text}");
    }
}

/// Routes output through `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn error(&self, text: &str) {
        tracing::error!("{text}");
    }
}

const COLUMN: usize = 15;

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrinter;

impl Printer for DefaultPrinter {
    fn help(&self, cmd: &Command, full_name: &str) -> String {
        let mut buf = usage(cmd, full_name);
        if !cmd.children().is_empty() {
            buf.push_str("\n\nCommands:");
            for child in cmd.children() {
                buf.push('\n');
                buf.push_str(&indent(&command_line(child)));
            }
        }
        if !cmd.options().is_empty() {
            buf.push_str("\n\nOptions:");
            for option in cmd.options() {
                buf.push('\n');
                buf.push_str(&indent(&option_line(option)));
            }
        }
        buf
    }
}

fn usage(cmd: &Command, full_name: &str) -> String {
    let mut buf = format!("Usage: {full_name}");
    if !cmd.options().is_empty() {
        buf.push_str(" [options]");
    }
    if !cmd.positionals().is_empty() {
        buf.push(' ');
        buf.push_str(&arguments(cmd.positionals()));
    } else if !cmd.children().is_empty() {
        buf.push_str(if cmd.has_action() { " [command]" } else { " <command>" });
    }
    if let Some(description) = cmd.description_text() {
        buf.push_str("\n  ");
        buf.push_str(description);
    }
    buf
}

fn arguments(args: &[Argument]) -> String {
    args.iter().map(|it| it.to_string()).collect::<Vec<_>>().join(" ")
}

fn option_line(option: &OptionDef) -> String {
    let mut buf = option.aliases().join(", ");
    if let Some(arg) = option.argument() {
        buf.push(' ');
        buf.push_str(&arg.to_string());
    }
    match option.description() {
        Some(description) if !description.is_empty() => describe(buf, description),
        _ => buf,
    }
}

fn command_line(cmd: &Command) -> String {
    let mut buf = cmd.name().to_string();
    for alias in cmd.aliases() {
        buf.push('/');
        buf.push_str(alias);
    }
    if !cmd.positionals().is_empty() {
        buf.push(' ');
        buf.push_str(&arguments(cmd.positionals()));
    }
    match cmd.description_text() {
        Some(description) => describe(buf, description),
        None => buf,
    }
}

/// Aligns `description` to the description column, wrapping onto a new line
/// when `head` is too wide.
fn describe(head: String, description: &str) -> String {
    if head.len() >= COLUMN {
        format!("{head}\n{:COLUMN$}{description}", "")
    } else {
        format!("{head:<COLUMN$}{description}")
    }
}

fn indent(text: &str) -> String {
    format!("  {}", text.replace('\n', "\n  "))
}
