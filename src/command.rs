use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    ops::{Deref, DerefMut},
    path::Path,
    sync::Arc,
};

use crate::{
    argument::parse_sequence,
    printer::{DefaultPrinter, Logger, Printer, StdLogger},
    Argument, Context, Flow, OptionDef, OptionSet, StructuralError, UnknownOption, Value,
    ValueParser,
};

pub(crate) type ActionFn = dyn Fn(&Context<'_>) -> anyhow::Result<Option<Value>> + Send + Sync;
pub(crate) type UnknownOptionFn =
    dyn Fn(&str) -> anyhow::Result<Option<UnknownOption>> + Send + Sync;

/// What a successful parse produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseReturns {
    /// The action's value if it returned one, the bound arguments otherwise.
    #[default]
    Default,
    AlwaysArgs,
    /// The action's value, even when there is none.
    AlwaysActionResult,
}

/// Effective configuration of a command.
///
/// Every command inherits the configuration of its parent and overrides
/// only what was set on it explicitly.
#[derive(Clone)]
pub struct Config {
    /// Collect unknown options instead of failing.
    pub allow_unknown_options: bool,
    /// Describes unknown options, for example to give them an argument.
    pub unknown_option_handler: Option<Arc<UnknownOptionFn>>,
    /// When unknown options are not allowed, disabling this passes them
    /// through as positional arguments.
    pub enforce_option_parse: bool,
    pub display_help_on_error: bool,
    pub parse_returns: ParseReturns,
    pub printer: Arc<dyn Printer>,
    pub logger: Arc<dyn Logger>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            allow_unknown_options: false,
            unknown_option_handler: None,
            enforce_option_parse: true,
            display_help_on_error: true,
            parse_returns: ParseReturns::Default,
            printer: Arc::new(DefaultPrinter),
            logger: Arc::new(StdLogger),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("allow_unknown_options", &self.allow_unknown_options)
            .field("unknown_option_handler", &self.unknown_option_handler.is_some())
            .field("enforce_option_parse", &self.enforce_option_parse)
            .field("display_help_on_error", &self.display_help_on_error)
            .field("parse_returns", &self.parse_returns)
            .finish()
    }
}

#[derive(Clone, Default)]
struct ConfigPatch {
    allow_unknown_options: Option<bool>,
    unknown_option_handler: Option<Arc<UnknownOptionFn>>,
    enforce_option_parse: Option<bool>,
    display_help_on_error: Option<bool>,
    parse_returns: Option<ParseReturns>,
    printer: Option<Arc<dyn Printer>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ConfigPatch {
    fn apply(&self, config: &mut Config) {
        if let Some(it) = self.allow_unknown_options {
            config.allow_unknown_options = it;
        }
        if let Some(it) = &self.unknown_option_handler {
            config.unknown_option_handler = Some(it.clone());
        }
        if let Some(it) = self.enforce_option_parse {
            config.enforce_option_parse = it;
        }
        if let Some(it) = self.display_help_on_error {
            config.display_help_on_error = it;
        }
        if let Some(it) = self.parse_returns {
            config.parse_returns = it;
        }
        if let Some(it) = &self.printer {
            config.printer = it.clone();
        }
        if let Some(it) = &self.logger {
            config.logger = it.clone();
        }
    }
}

/// A node of the command tree.
///
/// The tree is built once and is not modified by parsing: every parse
/// returns its results in a fresh [`Parsed`](crate::Parsed).
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    version: Option<String>,
    options: Vec<Arc<OptionDef>>,
    options_by_alias: HashMap<String, usize>,
    arguments: Option<Vec<Argument>>,
    children: Vec<Command>,
    children_by_name: HashMap<String, usize>,
    action: Option<Arc<ActionFn>>,
    params: BTreeMap<String, Value>,
    config: ConfigPatch,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("options", &self.options)
            .field("arguments", &self.positionals().iter().map(|it| it.to_string()).collect::<Vec<_>>())
            .field("children", &self.children)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl Command {
    /// Creates the root of a command tree.
    pub fn program(name: impl Into<String>) -> Command {
        Command::new(name.into())
    }

    /// Creates a root named after the running executable.
    pub fn program_from_env() -> Command {
        let name = std::env::args_os()
            .next()
            .and_then(|it| Path::new(&it).file_stem().map(|it| it.to_string_lossy().into_owned()))
            .unwrap_or_default();
        Command::new(name)
    }

    fn new(name: String) -> Command {
        Command {
            name,
            aliases: Vec::new(),
            description: None,
            version: None,
            options: Vec::new(),
            options_by_alias: HashMap::new(),
            arguments: None,
            children: Vec::new(),
            children_by_name: HashMap::new(),
            action: None,
            params: BTreeMap::new(),
            config: ConfigPatch::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version_text(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn options(&self) -> &[Arc<OptionDef>] {
        &self.options
    }

    pub fn option_for(&self, alias: &str) -> Option<&Arc<OptionDef>> {
        self.options_by_alias.get(alias).map(|&idx| &self.options[idx])
    }

    pub fn positionals(&self) -> &[Argument] {
        self.arguments.as_deref().unwrap_or_default()
    }

    pub fn children(&self) -> &[Command] {
        &self.children
    }

    /// Looks a child up by name or alias.
    pub fn child(&self, name: &str) -> Option<&Command> {
        self.children_by_name.get(name).map(|&idx| &self.children[idx])
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn action_fn(&self) -> Option<&ActionFn> {
        self.action.as_deref()
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// The configuration this command would run with if it was the root.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        self.apply_config(&mut config);
        config
    }

    pub(crate) fn apply_config(&self, config: &mut Config) {
        self.config.apply(config)
    }

    /// Renders help for this command, as if it was the root.
    pub fn help(&self) -> String {
        self.config().printer.help(self, &self.name)
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Command {
        self.version = Some(version.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Command {
        self.description = Some(description.into());
        self
    }

    /// Declares an option, such as `-l, --level <n>`. An empty description
    /// is no description.
    pub fn option(&mut self, decl: &str, description: &str) -> Result<&mut Command, StructuralError> {
        let def = OptionDef::new(decl)?;
        let def = if description.is_empty() { def } else { def.with_description(description) };
        self.option_def(def)
    }

    pub fn option_def(&mut self, def: OptionDef) -> Result<&mut Command, StructuralError> {
        self.add_option(Arc::new(def))?;
        Ok(self)
    }

    /// Merges every option of `set` into this command.
    pub fn use_options(&mut self, set: &OptionSet) -> Result<&mut Command, StructuralError> {
        for def in set.iter() {
            self.add_option(def.clone())?;
        }
        Ok(self)
    }

    fn add_option(&mut self, def: Arc<OptionDef>) -> Result<(), StructuralError> {
        let mut seen = Vec::new();
        for alias in def.aliases() {
            if self.options_by_alias.contains_key(alias) || seen.contains(&alias) {
                return Err(StructuralError::DuplicateOption(alias.clone()));
            }
            seen.push(alias);
        }
        let idx = self.options.len();
        for alias in def.aliases() {
            self.options_by_alias.insert(alias.clone(), idx);
        }
        self.options.push(def);
        Ok(())
    }

    /// Declares the positional arguments, such as `<a> [b] [c...]`. Can only
    /// be done once per command.
    pub fn arguments(&mut self, spec: &str) -> Result<&mut Command, StructuralError> {
        if self.arguments.is_some() {
            return Err(StructuralError::ArgumentsAlreadyDeclared(self.name.clone()));
        }
        self.arguments = Some(parse_sequence(spec)?);
        Ok(self)
    }

    /// Attaches a value parser to the declared argument `name`.
    pub fn argument(
        &mut self,
        name: &str,
        parser: impl Into<ValueParser>,
    ) -> Result<&mut Command, StructuralError> {
        let arg = self
            .arguments
            .iter_mut()
            .flatten()
            .find(|it| !it.is_literal() && it.name() == name)
            .ok_or_else(|| StructuralError::NoSuchArgument(name.to_string()))?;
        arg.set_parser(parser.into());
        Ok(self)
    }

    /// Declares a subcommand from a declaration such as `add <type> <names...>`.
    pub fn command(&mut self, spec: &str) -> Result<Subcommand<'_>, StructuralError> {
        let mut words = spec.split_whitespace();
        let name = words.next().unwrap_or_default();
        check_command_name(name)?;
        if self.children_by_name.contains_key(name) {
            return Err(StructuralError::DuplicateCommand(name.to_string()));
        }

        let mut child = Command::new(name.to_string());
        let args = words.collect::<Vec<_>>();
        if !args.is_empty() {
            child.arguments(&args.join(" "))?;
        }

        let index = self.children.len();
        self.children.push(child);
        self.children_by_name.insert(name.to_string(), index);
        Ok(Subcommand { parent: self, index })
    }

    /// Declares a subcommand and configures it in one go.
    pub fn command_with<F>(
        &mut self,
        spec: &str,
        description: Option<&str>,
        setup: F,
    ) -> Result<Subcommand<'_>, StructuralError>
    where
        F: FnOnce(&mut Subcommand<'_>) -> Result<(), StructuralError>,
    {
        let index = self.command(spec)?.index;
        let mut sub = Subcommand { parent: &mut *self, index };
        if let Some(description) = description {
            sub.description(description);
        }
        if let Err(err) = setup(&mut sub) {
            self.children.truncate(index);
            self.children_by_name.retain(|_, idx| *idx != index);
            return Err(err);
        }
        Ok(Subcommand { parent: self, index })
    }

    /// Sets the handler run when parsing ends on this command.
    pub fn action<F>(&mut self, f: F) -> &mut Command
    where
        F: Fn(&Context<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(f));
        self
    }

    /// Declares a parameter visible to the handlers of this command and of
    /// all its descendants.
    pub fn parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Command {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn allow_unknown_options(&mut self, yes: bool) -> &mut Command {
        self.config.allow_unknown_options = Some(yes);
        self
    }

    pub fn unknown_option_handler<F>(&mut self, f: F) -> &mut Command
    where
        F: Fn(&str) -> anyhow::Result<Option<UnknownOption>> + Send + Sync + 'static,
    {
        self.config.unknown_option_handler = Some(Arc::new(f));
        self
    }

    pub fn enforce_option_parse(&mut self, yes: bool) -> &mut Command {
        self.config.enforce_option_parse = Some(yes);
        self
    }

    pub fn display_help_on_error(&mut self, yes: bool) -> &mut Command {
        self.config.display_help_on_error = Some(yes);
        self
    }

    pub fn parse_returns(&mut self, returns: ParseReturns) -> &mut Command {
        self.config.parse_returns = Some(returns);
        self
    }

    pub fn printer(&mut self, printer: impl Printer + 'static) -> &mut Command {
        self.config.printer = Some(Arc::new(printer));
        self
    }

    pub fn logger(&mut self, logger: impl Logger + 'static) -> &mut Command {
        self.config.logger = Some(Arc::new(logger));
        self
    }

    /// Shares a logger with other commands, or with the caller.
    pub fn shared_logger(&mut self, logger: Arc<dyn Logger>) -> &mut Command {
        self.config.logger = Some(logger);
        self
    }

    /// Adds a `-h, --help` option which prints help and stops parsing.
    pub fn option_help(
        &mut self,
        decl: Option<&str>,
        description: Option<&str>,
    ) -> Result<&mut Command, StructuralError> {
        let def = OptionDef::new(decl.unwrap_or("-h, --help"))?
            .with_description(description.unwrap_or("Output usage information and exit"))
            .with_side_effect(|_, ctx| {
                ctx.info(&ctx.help());
                Ok(Flow::Halt)
            });
        self.option_def(def)
    }

    /// Adds a `-v, --version` option which prints the version and stops
    /// parsing. The version must be set first.
    pub fn option_version(
        &mut self,
        decl: Option<&str>,
        description: Option<&str>,
    ) -> Result<&mut Command, StructuralError> {
        if self.version.is_none() {
            return Err(StructuralError::VersionNotSet);
        }
        let def = OptionDef::new(decl.unwrap_or("-v, --version"))?
            .with_description(description.unwrap_or("Output version information and exit"))
            .with_side_effect(|_, ctx| {
                ctx.info(&ctx.config().printer.version(ctx.command()));
                Ok(Flow::Halt)
            });
        self.option_def(def)
    }

    /// Adds a `help [command]` subcommand printing the help of this command,
    /// or of the named sibling.
    pub fn command_help(&mut self, name: Option<&str>) -> Result<&mut Command, StructuralError> {
        let spec = format!("{} [command]", name.unwrap_or("help"));
        self.command(&spec)?.description("Output usage information").action(|ctx| {
            let (Some(parent), Some(parent_name)) = (ctx.parent(), ctx.parent_full_name()) else {
                return Ok(None);
            };
            let target = ctx.arg(0).and_then(Value::as_str).and_then(|it| parent.child(it));
            let help = match target {
                Some(cmd) => ctx.render_help(cmd, &format!("{parent_name} {}", cmd.name())),
                None => ctx.render_help(parent, &parent_name),
            };
            ctx.info(&help);
            Ok(None)
        });
        Ok(self)
    }
}

fn check_command_name(name: &str) -> Result<(), StructuralError> {
    if name.is_empty() || name.starts_with(['-', '<', '[']) || !name.chars().all(is_name_char) {
        return Err(StructuralError::InvalidCommandName(name.to_string()));
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && c != ','
}

/// A freshly declared subcommand, still attached to its parent.
///
/// Aliases live in the parent's lookup table, so they can only be declared
/// through this handle. Everything else is available through `Deref`.
pub struct Subcommand<'a> {
    parent: &'a mut Command,
    index: usize,
}

impl Subcommand<'_> {
    /// Makes the subcommand reachable under another name.
    pub fn alias(&mut self, alias: &str) -> Result<&mut Self, StructuralError> {
        check_command_name(alias)?;
        if self.parent.children_by_name.contains_key(alias) {
            return Err(StructuralError::DuplicateCommand(alias.to_string()));
        }
        self.parent.children_by_name.insert(alias.to_string(), self.index);
        self.parent.children[self.index].aliases.push(alias.to_string());
        Ok(self)
    }

    pub fn parent(&self) -> &Command {
        self.parent
    }
}

impl fmt::Debug for Subcommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl Deref for Subcommand<'_> {
    type Target = Command;

    fn deref(&self) -> &Command {
        &self.parent.children[self.index]
    }
}

impl DerefMut for Subcommand<'_> {
    fn deref_mut(&mut self) -> &mut Command {
        &mut self.parent.children[self.index]
    }
}
