//! Declarative command tree parser.
//!
//! A program is a tree of [`Command`]s. Each command declares options,
//! positional arguments and subcommands; parsing walks the tree with the
//! command line, binds values along the way and runs the action of the
//! command it ends on.
//!
//! ```
//! use argtree::{Command, Value};
//!
//! let mut program = Command::program("lib");
//! program.option("-v, --verbose", "Verbose output")?;
//! program
//!     .command("add <type> <names...>")?
//!     .option("-p, --priority <level>", "Priority")?
//!     .action(|ctx| Ok(Some(Value::from(ctx.args().len() as i64))));
//!
//! let parsed = program.try_parse(["add", "-p", "1", "book", "a", "b"])?;
//! assert_eq!(parsed.value(), Some(Value::Int(2)));
//! assert_eq!(parsed.matched().args[1], Value::from(vec!["a", "b"]));
//! assert_eq!(parsed.opts()["p"], Value::from("1"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod argument;
mod command;
mod error;
mod option;
mod outcome;
mod printer;
mod rt;
mod value;

pub use crate::{
    argument::{parse, Argument, ValueParser},
    command::{Command, Config, ParseReturns, Subcommand},
    error::{Error, ParseError, StructuralError},
    option::{Flow, OptionDef, OptionSet, SideEffectFn, UnknownOption},
    outcome::{Context, Frame, Outcome, Parsed},
    printer::{DefaultPrinter, Logger, Printer, StdLogger, TracingLogger},
    value::Value,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
