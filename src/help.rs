//! Plain-text help: usage, description, arguments, options and commands.

use std::fmt::Write;

use crate::{syntax::FlagValue, Arg, Command, Flag, Value};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

/// Help text for `cmd`; `parent_names` prefix the usage line.
pub(crate) fn render(cmd: &Command, parent_names: &[String]) -> String {
    let mut buf = String::new();

    let mut path = parent_names.join(" ");
    if !path.is_empty() {
        path.push(' ');
    }
    let line = format!("Usage: {path}{} {}", cmd.get_name(), usage(cmd));
    w!(buf, "{}\n", line.trim_end());

    if !cmd.get_description().is_empty() {
        blank_line(&mut buf);
        write_lines_indented(&mut buf, cmd.get_description(), 0);
    }

    let arguments: Vec<(String, String)> = if cmd.arguments.iter().any(|it| !it.description().is_empty()) {
        cmd.arguments.iter().map(|it| (it.name().to_string(), argument_description(it))).collect()
    } else {
        Vec::new()
    };
    let options = visible_options(cmd)
        .into_iter()
        .map(|it| (it.flags().to_string(), option_description(it)))
        .collect::<Vec<_>>();
    let mut commands = visible_commands(cmd)
        .into_iter()
        .map(|it| {
            let description =
                if it.get_summary().is_empty() { it.get_description() } else { it.get_summary() };
            (subcommand_term(it), description.to_string())
        })
        .collect::<Vec<_>>();
    if let Some(name) = cmd.help_command_name() {
        let help = &cmd.help_command;
        let term = if help.args.is_empty() { name.to_string() } else { format!("{name} {}", help.args) };
        commands.push((term, help.description.clone()));
    }

    let width = arguments
        .iter()
        .chain(&options)
        .chain(&commands)
        .map(|(term, _)| term.chars().count())
        .max()
        .unwrap_or(0);
    section(&mut buf, "Arguments:", &arguments, width);
    section(&mut buf, "Options:", &options, width);
    section(&mut buf, "Commands:", &commands, width);
    buf
}

fn usage(cmd: &Command) -> String {
    let mut parts = Vec::new();
    if !cmd.options.is_empty() || cmd.help_flag.is_some() {
        parts.push("[options]".to_string());
    }
    if !cmd.commands.is_empty() {
        parts.push("[command]".to_string());
    }
    parts.extend(cmd.arguments.iter().map(Arg::human_name));
    parts.join(" ")
}

/// Options shown in help and offered as suggestions, including the help flag.
pub(crate) fn visible_options(cmd: &Command) -> Vec<&Flag> {
    let mut res = cmd.options.iter().filter(|it| !it.is_hidden()).collect::<Vec<_>>();
    if let Some(help) = &cmd.help_flag {
        let taken = [help.short(), help.long()]
            .into_iter()
            .flatten()
            .any(|it| cmd.find_option(it).is_some());
        if !taken {
            res.push(help);
        }
    }
    res
}

pub(crate) fn visible_commands(cmd: &Command) -> Vec<&Command> {
    cmd.commands.iter().filter(|it| !it.is_hidden()).collect()
}

fn subcommand_term(cmd: &Command) -> String {
    let mut term = cmd.get_name().to_string();
    if let Some(alias) = cmd.get_aliases().first() {
        w!(term, "|{alias}");
    }
    if !cmd.options.is_empty() {
        term.push_str(" [options]");
    }
    for arg in &cmd.arguments {
        w!(term, " {}", arg.human_name());
    }
    term
}

fn option_description(flag: &Flag) -> String {
    let mut extra = Vec::new();
    if let Some(choices) = &flag.choices {
        extra.push(format!("choices: {}", quoted(choices)));
    }
    if let Some(default) = flag.default_value() {
        let show = flag.takes_value() || matches!(default, Value::Bool(_));
        if show {
            extra.push(format!("default: {default}"));
        }
    }
    if let (Some(preset), FlagValue::Optional) = (&flag.preset, flag.value) {
        extra.push(format!("preset: {preset}"));
    }
    if let Some(env) = &flag.env {
        extra.push(format!("env: {env}"));
    }
    with_extra(flag.description(), &extra)
}

fn argument_description(arg: &Arg) -> String {
    let mut extra = Vec::new();
    if let Some(choices) = &arg.choices {
        extra.push(format!("choices: {}", quoted(choices)));
    }
    if let Some(default) = arg.default_value() {
        extra.push(format!("default: {default}"));
    }
    with_extra(arg.description(), &extra)
}

fn quoted(choices: &[String]) -> String {
    choices.iter().map(|it| format!("{it:?}")).collect::<Vec<_>>().join(", ")
}

fn with_extra(description: &str, extra: &[String]) -> String {
    match (description.is_empty(), extra.is_empty()) {
        (_, true) => description.to_string(),
        (true, false) => format!("({})", extra.join(", ")),
        (false, false) => format!("{description} ({})", extra.join(", ")),
    }
}

fn section(buf: &mut String, title: &str, items: &[(String, String)], width: usize) {
    if items.is_empty() {
        return;
    }
    blank_line(buf);
    w!(buf, "{title}\n");
    for (term, description) in items {
        if description.is_empty() {
            w!(buf, "  {term}\n");
        } else {
            w!(buf, "  {term:width$}  {description}\n");
        }
    }
}

fn write_lines_indented(buf: &mut String, multiline_str: &str, indent: usize) {
    for line in multiline_str.split('\n').map(str::trim_end) {
        if line.is_empty() {
            w!(buf, "\n")
        } else {
            w!(buf, "{blank:indent$}{line}\n", blank = "");
        }
    }
}

fn blank_line(buf: &mut String) {
    w!(buf, "\n");
}
