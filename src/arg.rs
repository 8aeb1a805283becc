use std::{fmt, rc::Rc};

use crate::{
    error::{DefinitionError, InvalidArgumentError},
    flag::{choices_parser, ValueParser},
    syntax, Value,
};

/// Description of a positional argument slot: `<file>`, `[dest]` or `[files...]`.
#[derive(Clone)]
pub struct Arg {
    name: String,
    description: String,
    pub(crate) required: bool,
    pub(crate) variadic: bool,
    pub(crate) default: Option<Value>,
    pub(crate) parser: Option<ValueParser>,
    pub(crate) choices: Option<Vec<String>>,
}

impl Arg {
    pub fn new(spec: &str, description: &str) -> Result<Arg, DefinitionError> {
        let syntax = syntax::arg(spec)?;
        Ok(Arg::from_syntax(syntax, description))
    }

    pub(crate) fn from_syntax(syntax: syntax::ArgSyntax, description: &str) -> Arg {
        Arg {
            name: syntax.name,
            description: description.to_string(),
            required: syntax.required,
            variadic: syntax.variadic,
            default: None,
            parser: None,
            choices: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Arg {
        self.default = Some(value.into());
        self
    }

    pub fn parser<F>(mut self, f: F) -> Arg
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, InvalidArgumentError> + 'static,
    {
        self.parser = Some(Rc::new(f));
        self.choices = None;
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Arg
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        self.parser = Some(choices_parser(choices.clone()));
        self.choices = Some(choices);
        self
    }

    pub fn required(mut self) -> Arg {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Arg {
        self.required = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// `<name>`, `[name]`, with `...` for variadic arguments.
    pub fn human_name(&self) -> String {
        let dots = if self.variadic { "..." } else { "" };
        if self.required {
            format!("<{}{dots}>", self.name)
        } else {
            format!("[{}{dots}]", self.name)
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arg")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("variadic", &self.variadic)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
