//! The resolution engine.
//!
//! Tokens are consumed left to right. Each one is an option of the current
//! command, the name of one of its children (in which case parsing continues
//! in the child with the remaining tokens), an unknown option, or a positional
//! value for the next argument slot.

use std::{collections::BTreeMap, mem};

use tracing::{debug, trace};

use crate::{
    option::option_key, Command, Config, Context, Error, Flow, Frame, OptionDef, Outcome,
    ParseError, ParseReturns, Parsed, Value,
};

struct Parser {
    rargs: Vec<String>,
}

impl Parser {
    fn new(mut args: Vec<String>) -> Self {
        args.reverse();
        Self { rargs: args }
    }

    fn peek(&self) -> Option<&str> {
        self.rargs.last().map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }
}

/// The process arguments, without the program name.
fn env_args() -> Vec<String> {
    std::env::args_os().skip(1).map(|it| it.to_string_lossy().into_owned()).collect()
}

impl Command {
    /// Parses `args`, reporting user errors through the logger.
    ///
    /// Returns `Ok(None)` if the command line was rejected. Errors raised by
    /// handlers that are not [`ParseError`]s are returned as is.
    pub fn parse<I, S>(&self, args: I) -> anyhow::Result<Option<Parsed>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut engine = Engine::new(self, args.into_iter().map(Into::into).collect());
        match engine.run() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(Error::Parse(err)) => {
                engine.report(&err);
                Ok(None)
            }
            Err(Error::Handler(err)) => Err(err),
        }
    }

    /// Parses the arguments of the current process.
    pub fn parse_env(&self) -> anyhow::Result<Option<Parsed>> {
        self.parse(env_args())
    }

    /// Parses `args` without reporting anything.
    pub fn try_parse<I, S>(&self, args: I) -> Result<Parsed, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Engine::new(self, args.into_iter().map(Into::into).collect()).run()
    }
}

#[derive(Clone, Copy)]
enum Target {
    Declared,
    Unknown,
}

/// Where the next positional token goes.
#[derive(Default)]
struct Slots {
    next: usize,
    /// Index in `Frame::args` of the variadic list, once started.
    variadic: Option<usize>,
}

struct Engine<'t> {
    p: Parser,
    trail: Vec<&'t Command>,
    frames: Vec<Frame>,
    params: BTreeMap<String, Value>,
    config: Config,
}

impl<'t> Engine<'t> {
    fn new(root: &'t Command, args: Vec<String>) -> Engine<'t> {
        let mut config = Config::default();
        root.apply_config(&mut config);
        Engine {
            p: Parser::new(args),
            trail: vec![root],
            frames: vec![Frame::new(root.name(), root.name().to_string())],
            params: root.params().clone(),
            config,
        }
    }

    fn current(&self) -> &'t Command {
        self.trail[self.trail.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    fn context(&self) -> Context<'_> {
        Context { trail: &self.trail, frames: &self.frames, params: &self.params, config: &self.config }
    }

    fn run(&mut self) -> Result<Parsed, Error> {
        'cmd: loop {
            let cmd = self.current();
            let mut slots = Slots::default();

            while let Some(token) = self.p.next() {
                if let Some(def) = cmd.option_for(&token) {
                    trace!(%token, "option");
                    if self.bind_option(def, &token, Target::Declared)? == Flow::Halt {
                        return Ok(self.finish(Outcome::Halted));
                    }
                } else if let Some(child) = cmd.child(&token) {
                    self.enter(child);
                    continue 'cmd;
                } else if token.starts_with('-') && self.config.allow_unknown_options {
                    trace!(%token, "unknown option");
                    let def = self.unknown_option(&token)?;
                    if self.bind_option(&def, &token, Target::Unknown)? == Flow::Halt {
                        return Ok(self.finish(Outcome::Halted));
                    }
                } else if token.starts_with('-') && self.config.enforce_option_parse {
                    return Err(ParseError::UnknownOption(token).into());
                } else {
                    trace!(%token, slot = slots.next, "argument");
                    self.bind_argument(cmd, &mut slots, &token)?;
                }
            }

            return self.complete(cmd, &slots);
        }
    }

    fn enter(&mut self, child: &'t Command) {
        debug!(command = child.name(), "entering subcommand");
        child.apply_config(&mut self.config);
        self.params.extend(child.params().iter().map(|(k, v)| (k.clone(), v.clone())));
        let full_name = format!("{} {}", self.frames[self.frames.len() - 1].full_name, child.name());
        self.frames.push(Frame::new(child.name(), full_name));
        self.trail.push(child);
    }

    fn unknown_option(&self, token: &str) -> Result<OptionDef, Error> {
        let descriptor = match &self.config.unknown_option_handler {
            Some(handler) => handler(option_key(token)).map_err(Error::from_handler)?,
            None => None,
        };
        descriptor
            .unwrap_or_default()
            .synthesize(token)
            .map_err(|err| Error::Handler(anyhow::Error::new(err).context(format!("unknown option '{token}'"))))
    }

    /// Binds one occurrence of `def`, consuming its argument if it has one
    /// and the next token parses.
    fn bind_option(&mut self, def: &OptionDef, alias: &str, target: Target) -> Result<Flow, Error> {
        let mut value = None;
        let mut rejected = None;
        if let Some(arg) = def.argument() {
            if let Some(raw) = self.p.peek() {
                match arg.parse(raw) {
                    Ok(it) => value = Some(it),
                    Err(err) => rejected = Some(err),
                }
            }
        }
        if value.is_some() {
            self.p.next();
        }

        let value = match (value, def.argument()) {
            (Some(it), _) => it,
            (None, Some(arg)) if arg.is_required() => {
                let err = rejected.unwrap_or_else(|| ParseError::MissingOptionArgument {
                    argument: arg.name().to_string(),
                    option: alias.to_string(),
                });
                return Err(err.into());
            }
            (None, _) => def.default_on().clone(),
        };

        let key = option_key(alias).to_string();
        let frame = self.frame_mut();
        match target {
            Target::Declared => frame.opts.insert(key, value.clone()),
            Target::Unknown => frame.unknown_opts.insert(key, value.clone()),
        };

        match def.side_effect() {
            Some(f) => f(&value, &self.context()).map_err(Error::from_handler),
            None => Ok(Flow::Continue),
        }
    }

    fn bind_argument(&mut self, cmd: &Command, slots: &mut Slots, token: &str) -> Result<(), Error> {
        let grammar = cmd.positionals().get(slots.next).ok_or(ParseError::TooManyArguments)?;

        if grammar.is_literal() {
            if token != grammar.name() {
                return Err(ParseError::ExpectedLiteral {
                    expected: grammar.name().to_string(),
                    found: token.to_string(),
                }
                .into());
            }
            slots.next += 1;
            return Ok(());
        }

        let value = grammar.parse(token)?;
        let frame = self.frame_mut();
        if !grammar.is_variadic() {
            frame.args.push(value);
            slots.next += 1;
            return Ok(());
        }
        match slots.variadic {
            Some(idx) => {
                if let Value::List(items) = &mut frame.args[idx] {
                    items.push(value);
                }
            }
            None => {
                slots.variadic = Some(frame.args.len());
                frame.args.push(Value::List(vec![value]));
            }
        }
        Ok(())
    }

    /// Runs once the tokens are exhausted.
    fn complete(&mut self, cmd: &Command, slots: &Slots) -> Result<Parsed, Error> {
        if let Some(grammar) = cmd.positionals().get(slots.next) {
            let satisfied = grammar.is_variadic() && slots.variadic.is_some();
            if grammar.is_required() && !satisfied {
                return Err(ParseError::MissingArgument(grammar.name().to_string()).into());
            }
        }
        if !cmd.children().is_empty() && !cmd.has_action() {
            return Err(ParseError::NoCommandSelected.into());
        }

        let returned = match cmd.action_fn() {
            Some(action) => {
                debug!(command = %self.frames[self.frames.len() - 1].full_name, "running action");
                Some(action(&self.context()).map_err(Error::from_handler)?)
            }
            None => None,
        };

        let args = &self.frames[self.frames.len() - 1].args;
        let outcome = match (self.config.parse_returns, returned) {
            (ParseReturns::AlwaysArgs, _) => Outcome::Args(args.clone()),
            (ParseReturns::AlwaysActionResult, returned) => Outcome::Returned(returned.flatten()),
            (ParseReturns::Default, Some(Some(value))) => Outcome::Returned(Some(value)),
            (ParseReturns::Default, _) => Outcome::Args(args.clone()),
        };
        Ok(self.finish(outcome))
    }

    fn finish(&mut self, outcome: Outcome) -> Parsed {
        Parsed { frames: mem::take(&mut self.frames), params: mem::take(&mut self.params), outcome }
    }

    /// Reports a rejected command line against the deepest command reached.
    fn report(&self, err: &ParseError) {
        let config = &self.config;
        config.logger.error(&config.printer.error(err));
        if config.display_help_on_error {
            let full_name = &self.frames[self.frames.len() - 1].full_name;
            config.logger.info(&config.printer.help(self.current(), full_name));
        }
    }
}
