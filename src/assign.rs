//! Storing option values from the command line, the environment and implications.

use crate::{
    flag::{concat_value, Flag},
    syntax::FlagValue,
    Command, ErrorCode, InvalidArgumentError, Result, Value, ValueSource,
};

/// Assigns a value to option `idx` of `cmd`.
///
/// `raw` is `None` for a switch, or for an optional value that was left out.
pub(crate) fn option_value(
    cmd: &mut Command,
    idx: usize,
    raw: Option<String>,
    source: ValueSource,
) -> Result<()> {
    let flag = &cmd.options[idx];
    let key = flag.attribute_name();
    let previous = cmd.state.values.get(&key);

    let mut value = match (&raw, &flag.preset) {
        (Some(raw), _) => Some(Value::Str(raw.clone())),
        (None, Some(preset)) => Some(preset.clone()),
        (None, None) => None,
    };
    match (value.take(), &flag.parser) {
        (Some(Value::Str(raw)), Some(parser)) => {
            let parsed = call_parser(cmd, flag, parser(&raw, previous), &raw, source)?;
            value = Some(if flag.variadic && flag.choices.is_some() {
                let restart = cmd.state.sources.get(&key) == Some(&ValueSource::Default);
                concat_value(parsed, previous, restart)
            } else {
                parsed
            });
        }
        (None, Some(parser)) if flag.value == FlagValue::Switch => {
            value = Some(call_parser(cmd, flag, parser("", previous), "", source)?);
        }
        (Some(it), _) if flag.variadic => {
            let restart = cmd.state.sources.get(&key) == Some(&ValueSource::Default);
            value = Some(concat_value(it, previous, restart));
        }
        (it, _) => value = it,
    }

    let value = value.unwrap_or_else(|| {
        if flag.negate {
            Value::Bool(false)
        } else if flag.value == FlagValue::Required {
            Value::Str(String::new())
        } else {
            Value::Bool(true)
        }
    });
    log::trace!("{key} = {value} ({})", source.as_str());
    cmd.set_option_value_with_source(&key, value, source);
    Ok(())
}

fn call_parser(
    cmd: &Command,
    flag: &Flag,
    res: Result<Value, InvalidArgumentError>,
    raw: &str,
    source: ValueSource,
) -> Result<Value> {
    res.map_err(|err| {
        let flags = flag.flags();
        let message = match (source, flag.env.as_deref()) {
            (ValueSource::Env, Some(var)) => format!(
                "error: option '{flags}' value '{raw}' from env '{var}' is invalid. {}",
                err.message()
            ),
            _ => format!("error: option '{flags}' argument '{raw}' is invalid. {}", err.message()),
        };
        cmd.error(&message, ErrorCode::InvalidArgument, err.exit_code().unwrap_or(1))
    })
}

/// Applies environment variables to options that have no value from the
/// command line or from client code.
pub(crate) fn options_from_env(cmd: &mut Command) -> Result<()> {
    for idx in 0..cmd.options.len() {
        let flag = &cmd.options[idx];
        let Some(value) = flag.env.as_deref().and_then(|var| std::env::var(var).ok()) else {
            continue;
        };
        let key = flag.attribute_name();
        let overridable = match cmd.state.sources.get(&key) {
            Some(ValueSource::Default | ValueSource::Config | ValueSource::Env) => true,
            Some(_) => false,
            None => !cmd.state.values.contains(&key),
        };
        if !overridable {
            continue;
        }
        log::debug!("`{key}` of `{}` from env", cmd.get_name());
        // A switch only cares that the variable is set.
        let raw = flag.takes_value().then_some(value);
        option_value(cmd, idx, raw, ValueSource::Env)?;
    }
    Ok(())
}

/// Applies values implied by options the user set.
pub(crate) fn implied_values(cmd: &mut Command) {
    let custom = |cmd: &Command, key: &str| {
        cmd.state.values.contains(key)
            && !matches!(
                cmd.state.sources.get(key),
                Some(ValueSource::Default | ValueSource::Implied)
            )
    };

    let mut implied = Vec::new();
    for flag in cmd.options.iter().filter(|it| !it.implied.is_empty()) {
        let key = flag.attribute_name();
        if !custom(cmd, &key) {
            continue;
        }
        if let Some(value) = cmd.state.values.get(&key) {
            if !value_from_option(&cmd.options, flag, value) {
                continue;
            }
        }
        for (implied_key, value) in &flag.implied {
            if !custom(cmd, implied_key) {
                implied.push((implied_key.clone(), value.clone()));
            }
        }
    }
    for (key, value) in implied {
        log::trace!("{key} = {value} (implied)");
        cmd.set_option_value_with_source(&key, value, ValueSource::Implied);
    }
}

/// For `--foo` / `--no-foo` pairs, guesses from the value whether `flag`
/// is the side that set it.
fn value_from_option(options: &[Flag], flag: &Flag, value: &Value) -> bool {
    let key = flag.attribute_name();
    let negative = options.iter().find(|it| it.negate && it.attribute_name() == key);
    let has_positive = options.iter().any(|it| !it.negate && it.attribute_name() == key);
    let negative = match negative {
        Some(it) if has_positive => it,
        _ => return true,
    };
    let negative_value = negative.preset.clone().unwrap_or(Value::Bool(false));
    flag.negate == (negative_value == *value)
}
