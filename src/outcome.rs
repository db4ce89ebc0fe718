use std::collections::BTreeMap;

use crate::{Command, Config, Value};

/// Bound state of one command on the matched path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub name: String,
    /// Space separated path from the root, which identifies the command.
    pub full_name: String,
    /// Positional values in slot order. Optional slots that were not given
    /// are absent; a variadic slot is a single [`Value::List`].
    pub args: Vec<Value>,
    /// Declared options, keyed by the matched alias without leading dashes.
    pub opts: BTreeMap<String, Value>,
    pub unknown_opts: BTreeMap<String, Value>,
}

impl Frame {
    pub(crate) fn new(name: &str, full_name: String) -> Frame {
        Frame { name: name.to_string(), full_name, ..Frame::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An option's side effect stopped the parse.
    Halted,
    Args(Vec<Value>),
    Returned(Option<Value>),
}

/// Everything a single parse bound, from the root to the matched command.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Root first, matched command last. Never empty.
    pub frames: Vec<Frame>,
    /// Parameters inherited by the matched command.
    pub params: BTreeMap<String, Value>,
    pub outcome: Outcome,
}

impl Parsed {
    /// The deepest command reached.
    pub fn matched(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    pub fn frame(&self, full_name: &str) -> Option<&Frame> {
        self.frames.iter().find(|it| it.full_name == full_name)
    }

    pub fn args(&self) -> &[Value] {
        &self.matched().args
    }

    pub fn opts(&self) -> &BTreeMap<String, Value> {
        &self.matched().opts
    }

    pub fn unknown_opts(&self) -> &BTreeMap<String, Value> {
        &self.matched().unknown_opts
    }

    pub fn is_halted(&self) -> bool {
        self.outcome == Outcome::Halted
    }

    /// The value of the parse as a single [`Value`]: nothing when halted,
    /// the arguments as a list, or whatever the action returned.
    pub fn value(&self) -> Option<Value> {
        match &self.outcome {
            Outcome::Halted => None,
            Outcome::Args(args) => Some(Value::List(args.clone())),
            Outcome::Returned(value) => value.clone(),
        }
    }
}

/// What actions and option side effects get to see.
pub struct Context<'a> {
    pub(crate) trail: &'a [&'a Command],
    pub(crate) frames: &'a [Frame],
    pub(crate) params: &'a BTreeMap<String, Value>,
    pub(crate) config: &'a Config,
}

impl<'a> Context<'a> {
    fn frame(&self) -> &'a Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// The command being resolved.
    pub fn command(&self) -> &'a Command {
        self.trail[self.trail.len() - 1]
    }

    pub fn parent(&self) -> Option<&'a Command> {
        self.trail.len().checked_sub(2).map(|idx| self.trail[idx])
    }

    pub fn full_name(&self) -> &'a str {
        &self.frame().full_name
    }

    pub fn parent_full_name(&self) -> Option<String> {
        let idx = self.frames.len().checked_sub(2)?;
        Some(self.frames[idx].full_name.clone())
    }

    /// Bound state of an ancestor, by full name.
    pub fn ancestor(&self, full_name: &str) -> Option<&'a Frame> {
        self.frames.iter().find(|it| it.full_name == full_name)
    }

    pub fn args(&self) -> &'a [Value] {
        &self.frame().args
    }

    pub fn arg(&self, idx: usize) -> Option<&'a Value> {
        self.frame().args.get(idx)
    }

    pub fn opts(&self) -> &'a BTreeMap<String, Value> {
        &self.frame().opts
    }

    pub fn opt(&self, name: &str) -> Option<&'a Value> {
        self.frame().opts.get(name)
    }

    pub fn unknown_opts(&self) -> &'a BTreeMap<String, Value> {
        &self.frame().unknown_opts
    }

    pub fn params(&self) -> &'a BTreeMap<String, Value> {
        self.params
    }

    pub fn param(&self, key: &str) -> Option<&'a Value> {
        self.params.get(key)
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    /// Help for the command being resolved.
    pub fn help(&self) -> String {
        self.render_help(self.command(), self.full_name())
    }

    pub fn render_help(&self, cmd: &Command, full_name: &str) -> String {
        self.config.printer.help(cmd, full_name)
    }

    pub fn info(&self, text: &str) {
        self.config.logger.info(text)
    }

    pub fn error(&self, text: &str) {
        self.config.logger.error(text)
    }
}
