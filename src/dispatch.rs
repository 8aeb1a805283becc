//! Walking the command tree for one parse.
//!
//! Work is queued as [`Step`]s so that a pending hook or action can defer
//! everything after it without holding borrows of the tree across the await.

use std::{collections::VecDeque, io};

use crate::{
    assign,
    flow::{Completion, Flow, HookEvent},
    help, launch, scan,
    suggest::suggest_similar,
    Command, CommandError, CommandRef, Error, ErrorCode, Flag, InvalidArgumentError, LaunchError,
    Result, Value, ValueSource,
};

/// Paths are child indices from the root.
pub(crate) enum Step {
    /// Parse options of the command and decide what to run next.
    Parse { path: Vec<usize>, operands: Vec<String>, unknown: Vec<String> },
    /// A `PreSubcommand` hook of the command at `path`, before running `child`.
    SubcommandHook { path: Vec<usize>, child: usize, index: usize },
    /// Hook `index` of the command at `hooked`, for the command at `path`.
    Hook { hooked: Vec<usize>, path: Vec<usize>, index: usize },
    Action { path: Vec<usize> },
    Listener { path: Vec<usize>, index: usize, operands: Vec<String>, unknown: Vec<String> },
    Execute { path: Vec<usize>, child: usize, args: Vec<String> },
}

enum Next {
    Steps(Vec<Step>),
    Flow(Flow),
}

/// Runs `steps` until done or until a handler returns [`Flow::Pending`],
/// in which case the remaining steps continue inside the returned future.
pub(crate) fn run_steps(root: &mut Command, mut steps: VecDeque<Step>) -> Result<Completion<'_>> {
    while let Some(step) = steps.pop_front() {
        match run_step(root, step)? {
            Next::Steps(more) => {
                for step in more.into_iter().rev() {
                    steps.push_front(step);
                }
            }
            Next::Flow(Flow::Done) => {}
            Next::Flow(Flow::Pending(fut)) => {
                log::debug!("pending, {} steps deferred", steps.len());
                return Ok(Completion::Pending(Box::pin(async move {
                    fut.await?;
                    match run_steps(root, steps)? {
                        Completion::Done => Ok(()),
                        Completion::Pending(rest) => rest.await,
                    }
                })));
            }
        }
    }
    Ok(Completion::Done)
}

fn run_step(root: &mut Command, step: Step) -> Result<Next> {
    let flow = match step {
        Step::Parse { path, operands, unknown } => {
            return parse_command(root, path, operands, unknown).map(Next::Steps)
        }
        Step::SubcommandHook { path, child, index } => {
            let parent = CommandRef::resolve(root, &path);
            let mut child_path = path;
            child_path.push(child);
            let sub = CommandRef::resolve(root, &child_path);
            let (_, hook) = &parent.command().hooks[index];
            hook(parent, sub)?
        }
        Step::Hook { hooked, path, index } => {
            let hooked = CommandRef::resolve(root, &hooked);
            let target = CommandRef::resolve(root, &path);
            let (_, hook) = &hooked.command().hooks[index];
            hook(hooked, target)?
        }
        Step::Action { path } => {
            let target = CommandRef::resolve(root, &path);
            let cmd = target.command();
            match &cmd.action {
                Some(action) => {
                    log::debug!("running action of `{}`", cmd.get_name());
                    action(&cmd.state.processed_args, &cmd.state.values, target)?
                }
                None => Flow::Done,
            }
        }
        Step::Listener { path, index, operands, unknown } => {
            let cmd = node(root, &path);
            let (_, listener) = &cmd.listeners[index];
            listener(&operands, &unknown)?
        }
        Step::Execute { path, child, args } => execute(root, &path, child, &args)?,
    };
    Ok(Next::Flow(flow))
}

fn node<'a>(root: &'a Command, path: &[usize]) -> &'a Command {
    path.iter().fold(root, |node, &idx| &node.commands[idx])
}

fn node_mut<'a>(root: &'a mut Command, path: &[usize]) -> &'a mut Command {
    let mut node = root;
    for &idx in path {
        node = &mut node.commands[idx];
    }
    node
}

fn parse_command(
    root: &mut Command,
    path: Vec<usize>,
    mut operands: Vec<String>,
    unknown: Vec<String>,
) -> Result<Vec<Step>> {
    let (digit_flags, parent_names) = {
        let chain = CommandRef::resolve(root, &path);
        let pair = (chain.ancestors().any(scan::has_digit_flag), chain.parent_names());
        pair
    };

    let cmd = node_mut(root, &path);
    cmd.state.parent_names = parent_names;
    let parsed = scan::scan(cmd, unknown, digit_flags)?;
    // After the command line, so a parser never sees both.
    assign::options_from_env(cmd)?;
    assign::implied_values(cmd);
    operands.extend(parsed.operands);
    let unknown = parsed.unknown;
    cmd.state.operands = operands.clone();
    cmd.state.unknown = unknown.clone();
    cmd.state.args = operands.iter().chain(&unknown).cloned().collect();
    log::trace!("`{}`: operands {operands:?}, unknown {unknown:?}", cmd.get_name());

    if let Some(child) = operands.first().and_then(|it| cmd.command_index(it)) {
        let operands = operands[1..].to_vec();
        return dispatch_subcommand(cmd, path, child, operands, unknown);
    }
    if let Some(first) = operands.first() {
        if cmd.help_command_name() == Some(first.as_str()) {
            let name = operands.get(1).cloned();
            return dispatch_help_command(cmd, path, name);
        }
    }
    if let Some(default) = cmd.default_command.clone() {
        // Help for the default command comes from its parent.
        cmd.output_help_if_requested(&unknown)?;
        let Some(child) = cmd.command_index(&default) else {
            return Err(cmd.help_exit(true));
        };
        return dispatch_subcommand(cmd, path, child, operands, unknown);
    }
    if !cmd.commands.is_empty() && cmd.state.args.is_empty() && cmd.action.is_none() {
        return Err(cmd.help_exit(true));
    }
    cmd.output_help_if_requested(&unknown)?;

    leaf(root, path, operands, unknown)
}

fn dispatch_subcommand(
    parent: &mut Command,
    path: Vec<usize>,
    child: usize,
    operands: Vec<String>,
    unknown: Vec<String>,
) -> Result<Vec<Step>> {
    parent.commands[child].prepare_for_parse();
    log::debug!("`{}` dispatches to `{}`", parent.get_name(), parent.commands[child].get_name());

    let mut steps = parent
        .hooks
        .iter()
        .enumerate()
        .filter(|(_, (event, _))| *event == HookEvent::PreSubcommand)
        .map(|(index, _)| Step::SubcommandHook { path: path.clone(), child, index })
        .collect::<Vec<_>>();
    if parent.commands[child].executable {
        let args = operands.into_iter().chain(unknown).collect();
        steps.push(Step::Execute { path, child, args });
    } else {
        let mut path = path;
        path.push(child);
        steps.push(Step::Parse { path, operands, unknown });
    }
    Ok(steps)
}

/// `help` shows own help, `help <sub>` the help of a subcommand.
fn dispatch_help_command(
    cmd: &mut Command,
    path: Vec<usize>,
    name: Option<String>,
) -> Result<Vec<Step>> {
    let Some(name) = name else {
        return Err(cmd.help_exit(false));
    };
    let Some(child) = cmd.command_index(&name) else {
        return Err(cmd.help_exit(true));
    };
    if !cmd.commands[child].executable {
        let mut names = cmd.state.parent_names.clone();
        names.push(cmd.get_name().to_string());
        let sub = &mut cmd.commands[child];
        sub.state.parent_names = names;
        return Err(sub.help_exit(false));
    }
    // An external program gets the help flag instead.
    let flag = cmd
        .help_flag
        .as_ref()
        .and_then(|it| it.long().or(it.short()))
        .unwrap_or("--help")
        .to_string();
    dispatch_subcommand(cmd, path, child, Vec::new(), vec![flag])
}

/// Nothing matched a subcommand: run this command's own action, or report.
fn leaf(
    root: &mut Command,
    path: Vec<usize>,
    operands: Vec<String>,
    unknown: Vec<String>,
) -> Result<Vec<Step>> {
    check_mandatory(root, &path)?;
    check_conflicts(root, &path)?;

    let cmd = node(root, &path);
    let name = cmd.get_name().to_string();
    let parent_listeners = match path.split_last() {
        Some((_, parent)) => listener_steps(node(root, parent), parent, &name, &operands, &unknown),
        None => Vec::new(),
    };

    if cmd.action.is_some() {
        check_unknown_options(root, &path, &unknown)?;
        process_arguments(node_mut(root, &path), !path.is_empty())?;
        let mut steps = hook_steps(root, &path, HookEvent::PreAction);
        steps.push(Step::Action { path: path.clone() });
        steps.extend(parent_listeners);
        steps.extend(hook_steps(root, &path, HookEvent::PostAction));
        return Ok(steps);
    }
    if !parent_listeners.is_empty() {
        check_unknown_options(root, &path, &unknown)?;
        process_arguments(node_mut(root, &path), !path.is_empty())?;
        return Ok(parent_listeners);
    }
    if !operands.is_empty() {
        if let Some(child) = cmd.command_index("*") {
            return dispatch_subcommand(node_mut(root, &path), path, child, operands, unknown);
        }
        // No option check here, the listener may want to suggest a command.
        let catch_all = listener_steps(cmd, &path, "*", &operands, &unknown);
        if !catch_all.is_empty() {
            return Ok(catch_all);
        }
        if !cmd.commands.is_empty() {
            return Err(unknown_command(cmd));
        }
    } else if !cmd.commands.is_empty() {
        check_unknown_options(root, &path, &unknown)?;
        return Err(cmd.help_exit(true));
    }
    check_unknown_options(root, &path, &unknown)?;
    process_arguments(node_mut(root, &path), !path.is_empty())?;
    Ok(Vec::new())
}

fn listener_steps(
    cmd: &Command,
    path: &[usize],
    name: &str,
    operands: &[String],
    unknown: &[String],
) -> Vec<Step> {
    cmd.listeners
        .iter()
        .enumerate()
        .filter(|(_, (it, _))| it == name)
        .map(|(index, _)| Step::Listener {
            path: path.to_vec(),
            index,
            operands: operands.to_vec(),
            unknown: unknown.to_vec(),
        })
        .collect()
}

/// Hooks for `event` on the command at `path` and its ancestors, oldest
/// ancestor first; `PostAction` hooks run in reverse.
fn hook_steps(root: &Command, path: &[usize], event: HookEvent) -> Vec<Step> {
    let mut steps = Vec::new();
    for depth in 0..=path.len() {
        let hooked = &path[..depth];
        for (index, (it, _)) in node(root, hooked).hooks.iter().enumerate() {
            if *it == event {
                steps.push(Step::Hook { hooked: hooked.to_vec(), path: path.to_vec(), index });
            }
        }
    }
    if event == HookEvent::PostAction {
        steps.reverse();
    }
    steps
}

fn check_mandatory(root: &Command, path: &[usize]) -> Result<()> {
    let chain = CommandRef::resolve(root, path);
    for cmd in chain.ancestors() {
        for flag in cmd.options.iter().filter(|it| it.is_mandatory()) {
            if cmd.get_option_value(&flag.attribute_name()).is_none() {
                let message = format!("error: required option '{}' not specified", flag.flags());
                return Err(cmd.error(&message, ErrorCode::MissingMandatoryOptionValue, 1));
            }
        }
    }
    Ok(())
}

fn check_conflicts(root: &Command, path: &[usize]) -> Result<()> {
    let chain = CommandRef::resolve(root, path);
    for cmd in chain.ancestors() {
        let defined = cmd
            .options
            .iter()
            .filter(|it| {
                let key = it.attribute_name();
                cmd.get_option_value(&key).is_some()
                    && cmd.get_option_value_source(&key) != Some(ValueSource::Default)
            })
            .collect::<Vec<_>>();
        for flag in defined.iter().filter(|it| !it.conflicts_with.is_empty()) {
            let other =
                defined.iter().find(|it| flag.conflicts_with.contains(&it.attribute_name()));
            if let Some(other) = other {
                return Err(conflicting_option(cmd, flag, other));
            }
        }
    }
    Ok(())
}

fn conflicting_option(cmd: &Command, flag: &Flag, other: &Flag) -> Error {
    let describe = |flag: &Flag| {
        let best = best_option_from_value(cmd, flag);
        let source = cmd.get_option_value_source(&best.attribute_name());
        match (source, best.env.as_deref()) {
            (Some(ValueSource::Env), Some(var)) => format!("environment variable '{var}'"),
            _ => format!("option '{}'", best.flags()),
        }
    };
    let message = format!("error: {} cannot be used with {}", describe(flag), describe(other));
    cmd.error(&message, ErrorCode::ConflictingOption, 1)
}

/// Which of `--foo` / `--no-foo` most likely set the current value.
fn best_option_from_value<'a>(cmd: &'a Command, flag: &'a Flag) -> &'a Flag {
    let key = flag.attribute_name();
    let value = cmd.get_option_value(&key);
    let negative = cmd.options.iter().find(|it| it.negate && it.attribute_name() == key);
    if let Some(negative) = negative {
        let negative_value = negative.preset.clone().unwrap_or(Value::Bool(false));
        if value == Some(&negative_value) {
            return negative;
        }
    }
    cmd.options.iter().find(|it| !it.negate && it.attribute_name() == key).unwrap_or(flag)
}

fn check_unknown_options(root: &Command, path: &[usize], unknown: &[String]) -> Result<()> {
    let Some(flag) = unknown.first() else {
        return Ok(());
    };
    let chain = CommandRef::resolve(root, path);
    let cmd = chain.command();
    if cmd.settings.allow_unknown_option {
        return Ok(());
    }

    let mut suggestion = String::new();
    if flag.starts_with("--") && cmd.settings.show_suggestion_after_error {
        // Ancestor options are valid here too, up to one with positional options.
        let mut candidates = Vec::new();
        for (i, it) in chain.ancestors().enumerate() {
            if i > 0 && it.settings.enable_positional_options {
                break;
            }
            let longs = help::visible_options(it).into_iter().filter_map(Flag::long);
            candidates.extend(longs.map(String::from));
        }
        suggestion = suggest_similar(flag, &candidates);
    }
    let message = format!("error: unknown option '{flag}'{suggestion}");
    Err(cmd.error(&message, ErrorCode::UnknownOption, 1))
}

fn unknown_command(cmd: &Command) -> Error {
    let name = cmd.state.args.first().map(String::as_str).unwrap_or_default();
    let mut suggestion = String::new();
    if cmd.settings.show_suggestion_after_error {
        let mut candidates = Vec::new();
        for it in help::visible_commands(cmd) {
            candidates.push(it.get_name().to_string());
            candidates.extend(it.get_aliases().first().cloned());
        }
        candidates.extend(cmd.help_command_name().map(String::from));
        suggestion = suggest_similar(name, &candidates);
    }
    let message = format!("error: unknown command '{name}'{suggestion}");
    cmd.error(&message, ErrorCode::UnknownCommand, 1)
}

/// Checks the argument count and converts `args` into `processed_args`.
fn process_arguments(cmd: &mut Command, has_parent: bool) -> Result<()> {
    let args = &cmd.state.args;
    for (i, arg) in cmd.arguments.iter().enumerate() {
        if arg.required && args.get(i).is_none() {
            let message = format!("error: missing required argument '{}'", arg.name());
            return Err(cmd.error(&message, ErrorCode::MissingArgument, 1));
        }
    }
    let variadic = cmd.arguments.last().map_or(false, |it| it.variadic);
    if !variadic && args.len() > cmd.arguments.len() && !cmd.settings.allow_excess_arguments {
        let expected = cmd.arguments.len();
        let s = if expected == 1 { "" } else { "s" };
        let for_subcommand =
            if has_parent { format!(" for '{}'", cmd.get_name()) } else { String::new() };
        let message = format!(
            "error: too many arguments{for_subcommand}. Expected {expected} argument{s} but got {}.",
            args.len()
        );
        return Err(cmd.error(&message, ErrorCode::ExcessArguments, 1));
    }

    let mut processed = Vec::with_capacity(cmd.arguments.len());
    for (i, arg) in cmd.arguments.iter().enumerate() {
        let mut value = arg.default.clone();
        if arg.variadic {
            if i < args.len() {
                value = match &arg.parser {
                    Some(parser) if arg.choices.is_some() => {
                        let mut items = Vec::with_capacity(args.len() - i);
                        for raw in &args[i..] {
                            let res = parser(raw, None);
                            items.push(argument_value(cmd, arg.name(), raw, res)?);
                        }
                        Some(Value::List(items))
                    }
                    Some(parser) => {
                        let mut acc = arg.default.clone();
                        for raw in &args[i..] {
                            let res = parser(raw, acc.as_ref());
                            acc = Some(argument_value(cmd, arg.name(), raw, res)?);
                        }
                        acc
                    }
                    None => Some(Value::List(args[i..].iter().cloned().map(Value::Str).collect())),
                };
            } else if value.is_none() {
                value = Some(Value::List(Vec::new()));
            }
        } else if let Some(raw) = args.get(i) {
            value = match &arg.parser {
                Some(parser) => {
                    let res = parser(raw, arg.default.as_ref());
                    Some(argument_value(cmd, arg.name(), raw, res)?)
                }
                None => Some(Value::Str(raw.clone())),
            };
        }
        processed.push(value);
    }
    cmd.state.processed_args = processed;
    Ok(())
}

fn argument_value(
    cmd: &Command,
    name: &str,
    raw: &str,
    res: Result<Value, InvalidArgumentError>,
) -> Result<Value> {
    res.map_err(|err| {
        let message = format!(
            "error: command-argument value '{raw}' is invalid for argument '{name}'. {}",
            err.message()
        );
        cmd.error(&message, ErrorCode::InvalidArgument, err.exit_code().unwrap_or(1))
    })
}

/// Hands an executable subcommand over to the launcher.
fn execute(root: &Command, path: &[usize], child: usize, args: &[String]) -> Result<Flow> {
    // Help flags can't be checked for an external program, so checks run first.
    check_mandatory(root, path)?;
    check_conflicts(root, path)?;

    let parent = node(root, path);
    let sub = &parent.commands[child];
    let resolved = launch::resolve(
        parent.get_name(),
        sub.get_name(),
        sub.executable_file.as_deref(),
        parent.executable_dir.as_deref(),
        root.state.script_path.as_deref(),
    );
    log::debug!("launching {} {:?}", resolved.file.display(), args);
    match parent.launcher.launch(&resolved.file, args) {
        Ok(0) => Ok(Flow::Done),
        Ok(code) => Err(CommandError::new(code, ErrorCode::ExecuteSubCommand, "(close)").into()),
        Err(err) => Err(match err.kind() {
            io::ErrorKind::NotFound => {
                let dir = resolved.dir.as_deref();
                LaunchError::Missing(launch::missing_message(&resolved.file, dir, sub.get_name()))
                    .into()
            }
            io::ErrorKind::PermissionDenied => {
                LaunchError::NotExecutable(resolved.file.display().to_string()).into()
            }
            _ => CommandError::new(1, ErrorCode::ExecuteSubCommand, "(error)")
                .with_nested(err)
                .into(),
        }),
    }
}
