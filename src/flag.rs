use std::{fmt, rc::Rc};

use crate::{
    error::{DefinitionError, InvalidArgumentError},
    syntax::{self, FlagValue},
    Value,
};

/// Converts a raw command-line string into a [`Value`], given the previous value.
pub type ValueParser = Rc<dyn Fn(&str, Option<&Value>) -> Result<Value, InvalidArgumentError>>;

/// Description of a single option, such as `-p, --port <number>`.
#[derive(Clone)]
pub struct Flag {
    flags: String,
    description: String,
    pub(crate) short: Option<String>,
    pub(crate) long: Option<String>,
    pub(crate) value: FlagValue,
    pub(crate) variadic: bool,
    pub(crate) negate: bool,
    pub(crate) mandatory: bool,
    pub(crate) hidden: bool,
    pub(crate) default: Option<Value>,
    pub(crate) preset: Option<Value>,
    pub(crate) env: Option<String>,
    pub(crate) parser: Option<ValueParser>,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) conflicts_with: Vec<String>,
    pub(crate) implied: Vec<(String, Value)>,
    pub(crate) version: Option<String>,
}

impl Flag {
    pub fn new(flags: &str, description: &str) -> Result<Flag, DefinitionError> {
        let syntax = syntax::flag(flags)?;
        let negate = syntax.long.as_deref().map_or(false, |it| it.starts_with("--no-"));
        Ok(Flag {
            flags: flags.to_string(),
            description: description.to_string(),
            short: syntax.short,
            long: syntax.long,
            value: syntax.value,
            variadic: syntax.variadic,
            negate,
            mandatory: false,
            hidden: false,
            default: None,
            preset: None,
            env: None,
            parser: None,
            choices: None,
            conflicts_with: Vec::new(),
            implied: Vec::new(),
            version: None,
        })
    }

    pub fn default(mut self, value: impl Into<Value>) -> Flag {
        self.default = Some(value.into());
        self
    }

    /// Value used when the flag is given without a value. Passed through the
    /// parser when it is a string.
    pub fn preset(mut self, value: impl Into<Value>) -> Flag {
        self.preset = Some(value.into());
        self
    }

    pub fn env(mut self, name: &str) -> Flag {
        self.env = Some(name.to_string());
        self
    }

    pub fn parser<F>(mut self, f: F) -> Flag
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, InvalidArgumentError> + 'static,
    {
        self.parser = Some(Rc::new(f));
        self.choices = None;
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Flag
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        self.parser = Some(choices_parser(choices.clone()));
        self.choices = Some(choices);
        self
    }

    pub fn conflicts(mut self, attribute: &str) -> Flag {
        self.conflicts_with.push(attribute.to_string());
        self
    }

    /// When this option gets a value, `attribute` is set to `value` unless
    /// the user set it explicitly.
    pub fn implies(mut self, attribute: &str, value: impl Into<Value>) -> Flag {
        let value = value.into();
        match self.implied.iter_mut().find(|(k, _)| k == attribute) {
            Some((_, it)) => *it = value,
            None => self.implied.push((attribute.to_string(), value)),
        }
        self
    }

    pub fn mandatory(mut self) -> Flag {
        self.mandatory = true;
        self
    }

    pub fn hide(mut self) -> Flag {
        self.hidden = true;
        self
    }

    pub(crate) fn version(mut self, version: &str) -> Flag {
        self.version = Some(version.to_string());
        self
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn is_negate(&self) -> bool {
        self.negate
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Long flag without dashes, or the short one when there is no long flag.
    pub fn name(&self) -> &str {
        match (&self.long, &self.short) {
            (Some(long), _) => long.trim_start_matches('-'),
            (None, Some(short)) => short.trim_start_matches('-'),
            (None, None) => "",
        }
    }

    /// Key under which the value is stored: `--dry-run` becomes `dry_run`,
    /// `--no-color` becomes `color`.
    pub fn attribute_name(&self) -> String {
        let name = self.name();
        let name = if self.negate { name.strip_prefix("no-").unwrap_or(name) } else { name };
        snake(name)
    }

    pub fn is(&self, arg: &str) -> bool {
        self.short.as_deref() == Some(arg) || self.long.as_deref() == Some(arg)
    }

    pub(crate) fn takes_value(&self) -> bool {
        self.value != FlagValue::Switch
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("flags", &self.flags)
            .field("value", &self.value)
            .field("variadic", &self.variadic)
            .field("negate", &self.negate)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Appends `value` to the list in `previous`, or starts a new list.
pub(crate) fn concat_value(value: Value, previous: Option<&Value>, restart: bool) -> Value {
    match previous {
        Some(Value::List(items)) if !restart => {
            let mut items = items.clone();
            items.push(value);
            Value::List(items)
        }
        _ => Value::List(vec![value]),
    }
}

/// Accepts one of `choices`. Variadic slots collect the accepted values where
/// the parser is called, so a declared default is replaced rather than extended.
pub(crate) fn choices_parser(choices: Vec<String>) -> ValueParser {
    Rc::new(move |arg, _previous| {
        if !choices.iter().any(|it| it == arg) {
            return Err(InvalidArgumentError::new(format!(
                "Allowed choices are {}.",
                choices.join(", ")
            )));
        }
        Ok(Value::Str(arg.to_string()))
    })
}

pub(crate) fn snake(s: &str) -> String {
    s.replace('-', "_")
}

/// Ready-made value parsers.
pub mod parsers {
    use crate::{InvalidArgumentError, Value};

    pub fn int(arg: &str, _previous: Option<&Value>) -> Result<Value, InvalidArgumentError> {
        arg.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| InvalidArgumentError::new("Not a number."))
    }

    pub fn float(arg: &str, _previous: Option<&Value>) -> Result<Value, InvalidArgumentError> {
        arg.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| InvalidArgumentError::new("Not a number."))
    }

    /// Counts occurrences, for flags like `-v -v -v`.
    pub fn increase(_arg: &str, previous: Option<&Value>) -> Result<Value, InvalidArgumentError> {
        let n = previous.and_then(Value::as_i64).unwrap_or(0);
        Ok(Value::Int(n + 1))
    }

    /// Splits a comma separated list.
    pub fn comma_list(arg: &str, _previous: Option<&Value>) -> Result<Value, InvalidArgumentError> {
        Ok(Value::List(arg.split(',').map(|it| Value::Str(it.to_string())).collect()))
    }
}
