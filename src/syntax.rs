//! Parsing of the declaration mini-languages: flag specs like
//! `-p, --port <number>`, argument specs like `[files...]` and command specs
//! like `clone <source> [destination]`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DefinitionError;

type Result<T, E = DefinitionError> = std::result::Result<T, E>;

// Ignores `<value,...>` and friends, which describe custom splitting of a single value.
static VARIADIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w\.\.\.[>\]]$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue {
    /// No value, the flag is a switch.
    Switch,
    /// `<value>`: a value must follow the flag.
    Required,
    /// `[value]`: a value may follow the flag.
    Optional,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FlagSyntax {
    pub(crate) short: Option<String>,
    pub(crate) long: Option<String>,
    pub(crate) value: FlagValue,
    pub(crate) variadic: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ArgSyntax {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) variadic: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CmdSyntax {
    pub(crate) name: String,
    pub(crate) args: Vec<ArgSyntax>,
}

macro_rules! bad_flag {
    ($flag:expr, $flags:expr, $reason:expr) => {
        return Err(DefinitionError::BadFlag {
            flag: $flag.to_string(),
            flags: $flags.to_string(),
            reason: $reason,
        })
    };
}

pub(crate) fn flag(flags: &str) -> Result<FlagSyntax> {
    let value = if flags.contains('<') {
        FlagValue::Required
    } else if flags.contains('[') {
        FlagValue::Optional
    } else {
        FlagValue::Switch
    };
    let variadic = VARIADIC.is_match(flags);

    let p = &mut Parts::new(flags);
    let mut short = p.eat(is_short);
    let mut long = p.eat(is_long);
    // Long then short. Rarely used but fine.
    if short.is_none() {
        short = p.eat(is_short);
    }
    // Two long flags, like `--ws, --workspace`: the first one acts as the short form.
    if short.is_none() {
        if let Some(second) = p.eat(is_long) {
            short = long.take();
            long = Some(second);
        }
    }

    if let Some(rest) = p.peek().filter(|it| it.starts_with('-')) {
        if is_short(rest) {
            bad_flag!(rest, flags, "too many short flags")
        }
        if is_long(rest) {
            bad_flag!(rest, flags, "too many long flags")
        }
        let mut chars = rest.chars().skip(1);
        if matches!((chars.next(), chars.next()), (Some(a), Some(b)) if a != '-' && b != '-') {
            bad_flag!(rest, flags, "a short flag is a single dash and a single character")
        }
        bad_flag!(rest, flags, "unrecognised flag format")
    }
    if short.is_none() && long.is_none() {
        return Err(DefinitionError::NoFlags(flags.to_string()));
    }

    Ok(FlagSyntax { short, long, value, variadic })
}

pub(crate) fn arg(spec: &str) -> Result<ArgSyntax> {
    let bad = || DefinitionError::BadArgument(spec.to_string());
    let (name, required) = if let Some(rest) = spec.strip_prefix('<') {
        (rest.strip_suffix('>').ok_or_else(bad)?, true)
    } else if let Some(rest) = spec.strip_prefix('[') {
        (rest.strip_suffix(']').ok_or_else(bad)?, false)
    } else {
        (spec, true)
    };
    let (name, variadic) = match name.strip_suffix("...") {
        Some(it) => (it, true),
        None => (name, false),
    };
    if name.is_empty() {
        return Err(bad());
    }
    Ok(ArgSyntax { name: name.to_string(), required, variadic })
}

pub(crate) fn cmd(spec: &str) -> Result<CmdSyntax> {
    let mut words = spec.split(' ').filter(|it| !it.is_empty());
    let name = match words.next() {
        Some(it) if !it.starts_with('-') => it.to_string(),
        _ => return Err(DefinitionError::UnnamedCommand),
    };
    let args = words.map(arg).collect::<Result<Vec<_>>>()?;
    Ok(CmdSyntax { name, args })
}

/// A short flag is a single dash and a single character.
fn is_short(part: &str) -> bool {
    let mut chars = part.chars();
    chars.next() == Some('-') && matches!(chars.next(), Some(c) if c != '-') && chars.next().is_none()
}

/// A long flag is a double dash and at least one more character.
fn is_long(part: &str) -> bool {
    matches!(part.strip_prefix("--").and_then(|it| it.chars().next()), Some(c) if c != '-')
}

struct Parts<'a> {
    rparts: Vec<&'a str>,
}

impl<'a> Parts<'a> {
    fn new(flags: &'a str) -> Parts<'a> {
        let mut rparts = flags
            .split(|c: char| c == ' ' || c == '|' || c == ',')
            .filter(|it| !it.is_empty())
            .collect::<Vec<_>>();
        rparts.reverse();
        Parts { rparts }
    }

    fn peek(&self) -> Option<&'a str> {
        self.rparts.last().copied()
    }

    fn eat(&mut self, pred: fn(&str) -> bool) -> Option<String> {
        if self.peek().map_or(false, pred) {
            self.rparts.pop().map(str::to_string)
        } else {
            None
        }
    }
}
