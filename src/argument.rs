use std::{fmt, sync::Arc};

use regex::Regex;

use crate::{ParseError, StructuralError, Value};

pub(crate) type ParseFn = dyn Fn(&str) -> anyhow::Result<Value> + Send + Sync;

/// Converts or validates the raw text of an argument.
#[derive(Clone)]
pub enum ValueParser {
    /// The raw text must match the pattern, and is bound unchanged.
    Pattern(Regex),
    /// The raw text is transformed; an error rejects the value.
    Func(Arc<ParseFn>),
}

impl ValueParser {
    pub fn pattern(re: &str) -> Result<ValueParser, regex::Error> {
        Regex::new(re).map(ValueParser::Pattern)
    }

    pub fn func<F>(f: F) -> ValueParser
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        ValueParser::Func(Arc::new(f))
    }
}

impl From<Regex> for ValueParser {
    fn from(re: Regex) -> ValueParser {
        ValueParser::Pattern(re)
    }
}

impl fmt::Debug for ValueParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueParser::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            ValueParser::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Stock value parsers.
pub mod parse {
    use super::ValueParser;
    use crate::Value;

    /// Parses a base 10 integer.
    pub fn int() -> ValueParser {
        ValueParser::func(|raw| match raw.trim().parse::<i64>() {
            Ok(it) => Ok(Value::Int(it)),
            Err(_) => anyhow::bail!("value '{raw}' is not an integer"),
        })
    }

    /// Parses a floating point number.
    pub fn float() -> ValueParser {
        ValueParser::func(|raw| match raw.trim().parse::<f64>() {
            Ok(it) if !it.is_nan() => Ok(Value::Float(it)),
            _ => anyhow::bail!("value '{raw}' is not a float"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Literal,
    Required,
    Optional,
}

/// Declared shape of one positional slot, or of an option's attached value.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    kind: Kind,
    variadic: bool,
    parser: Option<ValueParser>,
}

impl Argument {
    /// Classifies a single declaration token: `<name>`, `<name...>`,
    /// `[name]`, `[name...]`, or a bare literal.
    pub fn new(decl: &str) -> Result<Argument, StructuralError> {
        let invalid = || StructuralError::InvalidArgument(decl.to_string());

        let (kind, inner) = if let Some(inner) = strip_delims(decl, '<', '>') {
            (Kind::Required, inner)
        } else if let Some(inner) = strip_delims(decl, '[', ']') {
            (Kind::Optional, inner)
        } else {
            if !is_name(decl) {
                return Err(invalid());
            }
            return Ok(Argument {
                name: decl.to_string(),
                kind: Kind::Literal,
                variadic: false,
                parser: None,
            });
        };

        let (name, variadic) = match inner.strip_suffix("...") {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if !is_name(name) {
            return Err(invalid());
        }
        Ok(Argument { name: name.to_string(), kind, variadic, parser: None })
    }

    pub fn with_parser(mut self, parser: impl Into<ValueParser>) -> Argument {
        self.parser = Some(parser.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_literal(&self) -> bool {
        self.kind == Kind::Literal
    }

    pub fn is_required(&self) -> bool {
        self.kind != Kind::Optional
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn parser(&self) -> Option<&ValueParser> {
        self.parser.as_ref()
    }

    pub(crate) fn set_parser(&mut self, parser: ValueParser) {
        self.parser = Some(parser);
    }

    /// Converts one raw token into a bound value.
    pub fn parse(&self, raw: &str) -> Result<Value, ParseError> {
        match &self.parser {
            None => Ok(Value::Str(raw.to_string())),
            Some(ValueParser::Pattern(re)) => {
                if !re.is_match(raw) {
                    return Err(ParseError::InvalidValue {
                        value: raw.to_string(),
                        argument: self.name.clone(),
                    });
                }
                Ok(Value::Str(raw.to_string()))
            }
            Some(ValueParser::Func(f)) => f(raw).map_err(|err| match err.downcast::<ParseError>() {
                Ok(it) => it,
                Err(err) => ParseError::Conversion { argument: self.name.clone(), reason: err.to_string() },
            }),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dots = if self.variadic { "..." } else { "" };
        match self.kind {
            Kind::Literal => write!(f, "{}", self.name),
            Kind::Required => write!(f, "<{}{dots}>", self.name),
            Kind::Optional => write!(f, "[{}{dots}]", self.name),
        }
    }
}

/// Parses a whitespace separated argument sequence, checking that required
/// arguments never follow optional ones and that only the last argument is
/// variadic.
pub(crate) fn parse_sequence(spec: &str) -> Result<Vec<Argument>, StructuralError> {
    let args = spec.split_whitespace().map(Argument::new).collect::<Result<Vec<_>, _>>()?;

    let mut optionals = false;
    for (i, arg) in args.iter().enumerate() {
        if arg.is_required() && optionals {
            return Err(StructuralError::RequiredAfterOptional(arg.name.clone()));
        }
        if !arg.is_required() {
            optionals = true;
        }
        if arg.variadic && i + 1 != args.len() {
            return Err(StructuralError::VariadicNotLast(arg.name.clone()));
        }
    }
    Ok(args)
}

fn strip_delims(decl: &str, open: char, close: char) -> Option<&str> {
    decl.strip_prefix(open)?.strip_suffix(close)
}

pub(crate) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
