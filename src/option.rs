use std::{fmt, sync::Arc};

use crate::{Argument, Context, StructuralError, Value, ValueParser};

/// Side effect of an option, run with the bound value.
pub type SideEffectFn = dyn Fn(&Value, &Context<'_>) -> anyhow::Result<Flow> + Send + Sync;

/// What the engine does after an option's side effect ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop consuming tokens. No action runs, at this level or above.
    Halt,
}

/// A declared flag: one or more aliases, optionally taking a value.
#[derive(Clone)]
pub struct OptionDef {
    aliases: Vec<String>,
    argument: Option<Argument>,
    description: Option<String>,
    default_on: Value,
    default_off: Value,
    side_effect: Option<Arc<SideEffectFn>>,
}

impl OptionDef {
    /// Parses a declaration such as `-l, --level <n>`.
    pub fn new(decl: &str) -> Result<OptionDef, StructuralError> {
        let pieces = decl.split(',').map(str::trim).collect::<Vec<_>>();
        let (last, init) = match pieces.split_last() {
            Some(it) => it,
            None => return Err(StructuralError::EmptyOption(decl.to_string())),
        };

        let mut words = last.split_whitespace();
        let last_alias = words.next().ok_or_else(|| StructuralError::EmptyOption(decl.to_string()))?;
        let argument = words.next().map(option_argument).transpose()?;
        if let Some(extra) = words.next() {
            return Err(StructuralError::InvalidArgument(extra.to_string()));
        }

        let mut aliases = Vec::with_capacity(pieces.len());
        for &alias in init.iter().chain(Some(&last_alias)) {
            if alias.is_empty() {
                return Err(StructuralError::EmptyOption(decl.to_string()));
            }
            aliases.push(option_alias(alias)?);
        }

        Ok(OptionDef::from_parts(aliases, argument))
    }

    pub(crate) fn from_parts(aliases: Vec<String>, argument: Option<Argument>) -> OptionDef {
        OptionDef {
            aliases,
            argument,
            description: None,
            default_on: Value::Bool(true),
            default_off: Value::Bool(false),
            side_effect: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> OptionDef {
        self.description = Some(description.into());
        self
    }

    /// Value bound when the option is present but its value is not.
    pub fn with_default_on(mut self, value: impl Into<Value>) -> OptionDef {
        self.default_on = value.into();
        self
    }

    pub fn with_default_off(mut self, value: impl Into<Value>) -> OptionDef {
        self.default_off = value.into();
        self
    }

    /// Attaches a value parser to the option's argument. Has no effect on an
    /// option that takes no argument.
    pub fn with_parser(mut self, parser: impl Into<ValueParser>) -> OptionDef {
        if let Some(arg) = &mut self.argument {
            arg.set_parser(parser.into());
        }
        self
    }

    /// Runs `f` with the bound value every time the option is matched.
    pub fn with_side_effect<F>(mut self, f: F) -> OptionDef
    where
        F: Fn(&Value, &Context<'_>) -> anyhow::Result<Flow> + Send + Sync + 'static,
    {
        self.side_effect = Some(Arc::new(f));
        self
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn argument(&self) -> Option<&Argument> {
        self.argument.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_on(&self) -> &Value {
        &self.default_on
    }

    pub fn default_off(&self) -> &Value {
        &self.default_off
    }

    pub(crate) fn side_effect(&self) -> Option<&SideEffectFn> {
        self.side_effect.as_deref()
    }
}

impl fmt::Debug for OptionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDef")
            .field("aliases", &self.aliases)
            .field("argument", &self.argument.as_ref().map(|it| it.to_string()))
            .field("description", &self.description)
            .field("default_on", &self.default_on)
            .field("side_effect", &self.side_effect.is_some())
            .finish()
    }
}

fn option_alias(alias: &str) -> Result<String, StructuralError> {
    let bare = alias.trim_start_matches('-');
    if !alias.starts_with('-') || bare.is_empty() || alias.contains(char::is_whitespace) {
        return Err(StructuralError::InvalidOptionAlias(alias.to_string()));
    }
    Ok(alias.to_string())
}

fn option_argument(decl: &str) -> Result<Argument, StructuralError> {
    let arg = Argument::new(decl)?;
    if arg.is_literal() {
        return Err(StructuralError::LiteralOptionArgument(decl.to_string()));
    }
    Ok(arg)
}

/// The key an option's value is bound under: the alias without leading dashes.
pub(crate) fn option_key(alias: &str) -> &str {
    alias.trim_start_matches('-')
}

/// A reusable bag of options that can be merged into several commands with
/// [`Command::use_options`](crate::Command::use_options).
///
/// Merging shares the definitions rather than copying them.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    options: Vec<Arc<OptionDef>>,
}

impl OptionSet {
    pub fn new() -> OptionSet {
        OptionSet::default()
    }

    pub fn option(&mut self, decl: &str, description: &str) -> Result<&mut OptionSet, StructuralError> {
        let def = OptionDef::new(decl)?;
        let def = if description.is_empty() { def } else { def.with_description(description) };
        Ok(self.option_def(def))
    }

    pub fn option_def(&mut self, def: OptionDef) -> &mut OptionSet {
        self.options.push(Arc::new(def));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<OptionDef>> + '_ {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// What an unknown option handler knows about an option nobody declared.
#[derive(Clone, Default)]
pub struct UnknownOption {
    /// Argument declaration, such as `<value>`.
    pub argument: Option<String>,
    pub description: Option<String>,
    pub default_on: Option<Value>,
    pub parser: Option<ValueParser>,
    pub side_effect: Option<Arc<SideEffectFn>>,
}

impl UnknownOption {
    pub fn with_argument(argument: impl Into<String>) -> UnknownOption {
        UnknownOption { argument: Some(argument.into()), ..UnknownOption::default() }
    }

    /// Runs `f` with the bound value, as [`OptionDef::with_side_effect`] does.
    pub fn with_side_effect<F>(mut self, f: F) -> UnknownOption
    where
        F: Fn(&Value, &Context<'_>) -> anyhow::Result<Flow> + Send + Sync + 'static,
    {
        self.side_effect = Some(Arc::new(f));
        self
    }

    /// Builds the ad-hoc definition bound for `token`.
    pub(crate) fn synthesize(self, token: &str) -> Result<OptionDef, StructuralError> {
        let argument = self.argument.as_deref().map(option_argument).transpose()?;
        let mut def = OptionDef::from_parts(vec![token.to_string()], argument)
            .with_description(self.description.unwrap_or_else(|| "Unknown Argument".to_string()));
        if let Some(value) = self.default_on {
            def = def.with_default_on(value);
        }
        if let Some(parser) = self.parser {
            def = def.with_parser(parser);
        }
        def.side_effect = self.side_effect;
        Ok(def)
    }
}

impl fmt::Debug for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnknownOption")
            .field("argument", &self.argument)
            .field("description", &self.description)
            .field("default_on", &self.default_on)
            .field("parser", &self.parser)
            .field("side_effect", &self.side_effect.is_some())
            .finish()
    }
}
