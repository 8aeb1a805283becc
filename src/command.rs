use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    ops::Deref,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    argv::{self, ArgvStyle},
    dispatch::{self, Step},
    error::{CommandError, DefinitionError, ErrorCode},
    flow::{Completion, Flow, HookEvent},
    help,
    launch::{Launcher, ProcessLauncher},
    output::{ExitPolicy, Output},
    scan::{self, Partition},
    syntax, Arg, Error, Flag, OptionValues, Result, Value, ValueSource,
};

pub type Action = Box<dyn Fn(&[Option<Value>], &OptionValues, CommandRef<'_>) -> Result<Flow>>;
/// Called with the command the hook is registered on and the command being run.
pub type Hook = Box<dyn Fn(CommandRef<'_>, CommandRef<'_>) -> Result<Flow>>;
/// Called with operands and unknown arguments.
pub type Listener = Box<dyn Fn(&[String], &[String]) -> Result<Flow>>;

const HELP_FLAGS: &str = "-h, --help";
const HELP_DESCRIPTION: &str = "display help for command";

/// What to print after an error message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HelpAfterError {
    #[default]
    Off,
    Help,
    Message(String),
}

/// Options for [`Command::command_with`] and [`Command::add_command_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOpts {
    /// Dispatch to this command when no other command matches.
    pub is_default: bool,
    /// Leave the command out of help.
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) allow_unknown_option: bool,
    pub(crate) allow_excess_arguments: bool,
    pub(crate) enable_positional_options: bool,
    pub(crate) pass_through_options: bool,
    pub(crate) combine_flag_and_optional_value: bool,
    pub(crate) show_help_after_error: HelpAfterError,
    pub(crate) show_suggestion_after_error: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            allow_unknown_option: false,
            allow_excess_arguments: false,
            enable_positional_options: false,
            pass_through_options: false,
            combine_flag_and_optional_value: true,
            show_help_after_error: HelpAfterError::Off,
            show_suggestion_after_error: true,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HelpCommand {
    pub(crate) enabled: Option<bool>,
    pub(crate) name: String,
    pub(crate) args: String,
    pub(crate) description: String,
}

impl Default for HelpCommand {
    fn default() -> HelpCommand {
        HelpCommand {
            enabled: None,
            name: "help".to_string(),
            args: "[command]".to_string(),
            description: HELP_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub(crate) values: OptionValues,
    pub(crate) sources: BTreeMap<String, ValueSource>,
    pub(crate) operands: Vec<String>,
    pub(crate) unknown: Vec<String>,
    pub(crate) args: Vec<String>,
    pub(crate) processed_args: Vec<Option<Value>>,
    pub(crate) raw_args: Vec<String>,
    pub(crate) script_path: Option<PathBuf>,
    /// Names of the ancestors on the last dispatch chain, root first.
    pub(crate) parent_names: Vec<String>,
}

#[derive(Debug)]
struct Saved {
    name: String,
    values: OptionValues,
    sources: BTreeMap<String, ValueSource>,
}

/// A node of the command tree.
///
/// The root is the program itself. Children are added with [`Command::command`]
/// or [`Command::add_command`] and are owned by their parent.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    summary: String,
    pub(crate) commands: Vec<Command>,
    pub(crate) options: Vec<Flag>,
    pub(crate) arguments: Vec<Arg>,
    pub(crate) settings: Settings,
    pub(crate) hooks: Vec<(HookEvent, Hook)>,
    pub(crate) action: Option<Action>,
    pub(crate) listeners: Vec<(String, Listener)>,
    pub(crate) executable: bool,
    pub(crate) executable_file: Option<String>,
    pub(crate) executable_dir: Option<PathBuf>,
    pub(crate) default_command: Option<String>,
    hidden: bool,
    pub(crate) help_flag: Option<Flag>,
    pub(crate) help_command: HelpCommand,
    version: Option<String>,
    pub(crate) output: Output,
    exit: ExitPolicy,
    pub(crate) launcher: Rc<dyn Launcher>,
    pub(crate) state: State,
    saved: Option<Saved>,
    /// `enable_positional_options` of the parent, kept current by the parent.
    parent_positional: Option<bool>,
}

impl Default for Command {
    fn default() -> Command {
        Command::new("")
    }
}

impl Command {
    /// Creates a command. An empty name is filled in from the script path at parse time.
    pub fn new(name: &str) -> Command {
        Command {
            name: name.to_string(),
            aliases: Vec::new(),
            description: String::new(),
            summary: String::new(),
            commands: Vec::new(),
            options: Vec::new(),
            arguments: Vec::new(),
            settings: Settings::default(),
            hooks: Vec::new(),
            action: None,
            listeners: Vec::new(),
            executable: false,
            executable_file: None,
            executable_dir: None,
            default_command: None,
            hidden: false,
            help_flag: Flag::new(HELP_FLAGS, HELP_DESCRIPTION).ok(),
            help_command: HelpCommand::default(),
            version: None,
            output: Output::default(),
            exit: ExitPolicy::default(),
            launcher: Rc::new(ProcessLauncher),
            state: State::default(),
            saved: None,
            parent_positional: None,
        }
    }

    /// Adds a subcommand from a spec like `clone <source> [destination]` and
    /// returns it for further configuration.
    pub fn command(&mut self, spec: &str) -> Result<&mut Command, DefinitionError> {
        self.command_with(spec, CommandOpts::default())
    }

    pub fn command_with(
        &mut self,
        spec: &str,
        opts: CommandOpts,
    ) -> Result<&mut Command, DefinitionError> {
        let syntax = syntax::cmd(spec)?;
        let mut cmd = Command::new(&syntax.name);
        for arg in syntax.args {
            cmd.add_argument(Arg::from_syntax(arg, ""))?;
        }
        cmd.hidden = opts.hidden;
        cmd.copy_inherited_settings(self);
        self.register_command(cmd, opts)
    }

    /// Adds a subcommand implemented by a separate program, `<name>-<sub>` by default.
    pub fn executable_command(
        &mut self,
        spec: &str,
        description: &str,
    ) -> Result<&mut Command, DefinitionError> {
        self.executable_command_with(spec, description, CommandOpts::default())
    }

    pub fn executable_command_with(
        &mut self,
        spec: &str,
        description: &str,
        opts: CommandOpts,
    ) -> Result<&mut Command, DefinitionError> {
        let cmd = self.command_with(spec, opts)?;
        cmd.description = description.to_string();
        cmd.executable = true;
        Ok(cmd)
    }

    /// Attaches a prepared command. Unlike [`Command::command`], no settings are inherited.
    pub fn add_command(&mut self, cmd: Command) -> Result<&mut Command, DefinitionError> {
        self.add_command_with(cmd, CommandOpts::default())
    }

    pub fn add_command_with(
        &mut self,
        mut cmd: Command,
        opts: CommandOpts,
    ) -> Result<&mut Command, DefinitionError> {
        if cmd.name.is_empty() {
            return Err(DefinitionError::UnnamedCommand);
        }
        if opts.hidden {
            cmd.hidden = true;
        }
        if cmd.settings.pass_through_options && !self.settings.enable_positional_options {
            return Err(DefinitionError::BrokenPassThrough(cmd.name));
        }
        self.register_command(cmd, opts)?;
        Ok(self)
    }

    fn register_command(
        &mut self,
        mut cmd: Command,
        opts: CommandOpts,
    ) -> Result<&mut Command, DefinitionError> {
        if let Some(existing) = cmd.known_by().find_map(|it| self.find_command(it)) {
            return Err(DefinitionError::CommandConflict {
                new: cmd.known_by().collect::<Vec<_>>().join("|"),
                existing: existing.known_by().collect::<Vec<_>>().join("|"),
            });
        }
        if opts.is_default {
            self.default_command = Some(cmd.name.clone());
        }
        cmd.parent_positional = Some(self.settings.enable_positional_options);
        self.commands.push(cmd);
        let idx = self.commands.len() - 1;
        Ok(&mut self.commands[idx])
    }

    fn known_by(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn argument(&mut self, spec: &str, description: &str) -> Result<&mut Command, DefinitionError> {
        self.add_argument(Arg::new(spec, description)?)
    }

    /// Declares several arguments at once, like `<cmd> [env]`.
    pub fn arguments(&mut self, specs: &str) -> Result<&mut Command, DefinitionError> {
        for spec in specs.split_ascii_whitespace() {
            self.argument(spec, "")?;
        }
        Ok(self)
    }

    pub fn add_argument(&mut self, arg: Arg) -> Result<&mut Command, DefinitionError> {
        if let Some(prev) = self.arguments.last().filter(|it| it.variadic) {
            return Err(DefinitionError::VariadicNotLast(prev.name().to_string()));
        }
        if arg.required && arg.default.is_some() && arg.parser.is_none() {
            return Err(DefinitionError::UnusedDefault(arg.name().to_string()));
        }
        self.arguments.push(arg);
        Ok(self)
    }

    pub fn option(&mut self, flags: &str, description: &str) -> Result<&mut Command, DefinitionError> {
        self.add_option(Flag::new(flags, description)?)
    }

    /// Adds an option that must have a value once parsing is done,
    /// from the command line, the environment or a default.
    pub fn required_option(
        &mut self,
        flags: &str,
        description: &str,
    ) -> Result<&mut Command, DefinitionError> {
        self.add_option(Flag::new(flags, description)?.mandatory())
    }

    pub fn add_option(&mut self, flag: Flag) -> Result<&mut Command, DefinitionError> {
        self.register_option(&flag)?;
        let key = flag.attribute_name();
        if flag.negate {
            // `--no-foo` makes `foo` default to true, unless `--foo` is declared.
            let positive = flag.long.as_deref().map(|it| it.replacen("--no-", "--", 1));
            if positive.map_or(true, |it| self.find_option(&it).is_none()) {
                let value = flag.default.clone().unwrap_or(Value::Bool(true));
                self.set_option_value_with_source(&key, value, ValueSource::Default);
            }
        } else if let Some(value) = flag.default.clone() {
            self.set_option_value_with_source(&key, value, ValueSource::Default);
        }
        self.options.push(flag);
        Ok(self)
    }

    fn register_option(&self, flag: &Flag) -> Result<(), DefinitionError> {
        let by_long = flag.long.as_deref().and_then(|it| self.find_option(it));
        let by_short = flag.short.as_deref().and_then(|it| self.find_option(it));
        let (matched, existing) = match (by_long, by_short) {
            (Some(existing), _) => (flag.long.as_deref(), existing),
            (None, Some(existing)) => (flag.short.as_deref(), existing),
            (None, None) => return Ok(()),
        };
        let command =
            if self.name.is_empty() { String::new() } else { format!(" to command '{}'", self.name) };
        Err(DefinitionError::FlagConflict {
            flags: flag.flags().to_string(),
            command,
            flag: matched.unwrap_or_default().to_string(),
            existing: existing.flags().to_string(),
        })
    }

    /// Registers `-V, --version`, which prints `version` and exits.
    pub fn version(&mut self, version: &str) -> Result<&mut Command, DefinitionError> {
        self.version_with(version, "-V, --version", "output the version number")
    }

    pub fn version_with(
        &mut self,
        version: &str,
        flags: &str,
        description: &str,
    ) -> Result<&mut Command, DefinitionError> {
        let flag = Flag::new(flags, description)?.version(version);
        self.register_option(&flag)?;
        self.options.push(flag);
        self.version = Some(version.to_string());
        Ok(self)
    }

    pub fn help_option(&mut self, flags: &str, description: &str) -> Result<&mut Command, DefinitionError> {
        self.help_flag = Some(Flag::new(flags, description)?);
        Ok(self)
    }

    pub fn disable_help_option(&mut self) -> &mut Command {
        self.help_flag = None;
        self
    }

    /// Forces the implicit `help [command]` subcommand on or off.
    ///
    /// By default it exists when the command has subcommands but no action.
    pub fn help_command(&mut self, enabled: bool) -> &mut Command {
        self.help_command.enabled = Some(enabled);
        self
    }

    /// Enables the help subcommand under a custom spec like `assist [cmd]`.
    pub fn help_command_named(
        &mut self,
        spec: &str,
        description: &str,
    ) -> Result<&mut Command, DefinitionError> {
        let syntax = syntax::cmd(spec)?;
        let args = spec.trim().strip_prefix(syntax.name.as_str()).unwrap_or("").trim();
        self.help_command = HelpCommand {
            enabled: Some(true),
            name: syntax.name,
            args: args.to_string(),
            description: description.to_string(),
        };
        Ok(self)
    }

    pub fn name(&mut self, name: &str) -> &mut Command {
        self.name = name.to_string();
        self
    }

    pub fn alias(&mut self, alias: &str) -> Result<&mut Command, DefinitionError> {
        if alias == self.name {
            return Err(DefinitionError::AliasIsName);
        }
        self.aliases.push(alias.to_string());
        Ok(self)
    }

    pub fn aliases<I, S>(&mut self, aliases: I) -> Result<&mut Command, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for alias in aliases {
            self.alias(alias.as_ref())?;
        }
        Ok(self)
    }

    pub fn description(&mut self, description: &str) -> &mut Command {
        self.description = description.to_string();
        self
    }

    /// Short description used when listed as a subcommand.
    pub fn summary(&mut self, summary: &str) -> &mut Command {
        self.summary = summary.to_string();
        self
    }

    pub fn hide(&mut self) -> &mut Command {
        self.hidden = true;
        self
    }

    pub fn executable_file(&mut self, file: &str) -> &mut Command {
        self.executable_file = Some(file.to_string());
        self
    }

    /// Directory searched for executable subcommands, relative to the script.
    pub fn executable_dir(&mut self, dir: impl AsRef<Path>) -> &mut Command {
        self.executable_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn allow_unknown_option(&mut self, yes: bool) -> &mut Command {
        self.settings.allow_unknown_option = yes;
        self
    }

    pub fn allow_excess_arguments(&mut self, yes: bool) -> &mut Command {
        self.settings.allow_excess_arguments = yes;
        self
    }

    /// Options before a subcommand belong to this command, options after it
    /// to the subcommand.
    pub fn enable_positional_options(&mut self, yes: bool) -> &mut Command {
        self.settings.enable_positional_options = yes;
        for child in &mut self.commands {
            child.parent_positional = Some(yes);
        }
        self
    }

    /// Stops option processing at the first argument; the rest is passed through as is.
    ///
    /// Needs positional options on every ancestor. The parent is checked here
    /// and when the command is attached, the whole chain again before parsing.
    pub fn pass_through_options(&mut self, yes: bool) -> Result<&mut Command, DefinitionError> {
        self.settings.pass_through_options = yes;
        if yes && self.parent_positional == Some(false) {
            return Err(DefinitionError::BrokenPassThrough(self.name.clone()));
        }
        Ok(self)
    }

    pub fn combine_flag_and_optional_value(&mut self, yes: bool) -> &mut Command {
        self.settings.combine_flag_and_optional_value = yes;
        self
    }

    pub fn show_help_after_error(&mut self, show: HelpAfterError) -> &mut Command {
        self.settings.show_help_after_error = show;
        self
    }

    pub fn show_suggestion_after_error(&mut self, yes: bool) -> &mut Command {
        self.settings.show_suggestion_after_error = yes;
        self
    }

    pub fn configure_output(&mut self, output: Output) -> &mut Command {
        self.output = output;
        self
    }

    /// Makes `parse` return terminal errors instead of exiting the process.
    pub fn exit_override(&mut self) -> &mut Command {
        self.exit = ExitPolicy::Return(None);
        self
    }

    pub fn exit_override_with<F>(&mut self, f: F) -> &mut Command
    where
        F: Fn(&CommandError) + 'static,
    {
        self.exit = ExitPolicy::Return(Some(Rc::new(f)));
        self
    }

    pub fn launcher(&mut self, launcher: impl Launcher + 'static) -> &mut Command {
        self.launcher = Rc::new(launcher);
        self
    }

    /// Copies the settings a subcommand shares with its parent.
    pub fn copy_inherited_settings(&mut self, source: &Command) -> &mut Command {
        self.output = source.output.clone();
        self.help_flag = source.help_flag.clone();
        self.help_command = source.help_command.clone();
        self.exit = source.exit.clone();
        self.launcher = Rc::clone(&source.launcher);
        let settings = &source.settings;
        self.settings = Settings {
            allow_unknown_option: self.settings.allow_unknown_option,
            pass_through_options: self.settings.pass_through_options,
            ..settings.clone()
        };
        self
    }

    pub fn hook<F>(&mut self, event: HookEvent, f: F) -> &mut Command
    where
        F: Fn(CommandRef<'_>, CommandRef<'_>) -> Result<Flow> + 'static,
    {
        self.hooks.push((event, Box::new(f)));
        self
    }

    /// Sets the handler called with processed arguments, option values and the command.
    pub fn action<F>(&mut self, f: F) -> &mut Command
    where
        F: Fn(&[Option<Value>], &OptionValues, CommandRef<'_>) -> Result<Flow> + 'static,
    {
        self.action = Some(Box::new(f));
        self
    }

    /// Listens for a subcommand called `name` without an action of its own.
    /// `"*"` receives unrecognised commands.
    pub fn on_command<F>(&mut self, name: &str, f: F) -> &mut Command
    where
        F: Fn(&[String], &[String]) -> Result<Flow> + 'static,
    {
        self.listeners.push((name.to_string(), Box::new(f)));
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_summary(&self) -> &str {
        &self.summary
    }

    pub fn get_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn get_commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn get_options(&self) -> &[Flag] {
        &self.options
    }

    pub fn get_arguments(&self) -> &[Arg] {
        &self.arguments
    }

    pub fn get_help_option(&self) -> Option<&Flag> {
        self.help_flag.as_ref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.command_index(name).map(|idx| &self.commands[idx])
    }

    pub fn find_command_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.command_index(name).map(move |idx| &mut self.commands[idx])
    }

    pub(crate) fn command_index(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.commands.iter().position(|it| it.name == name || it.aliases.iter().any(|a| a == name))
    }

    pub fn find_option(&self, arg: &str) -> Option<&Flag> {
        self.option_index(arg).map(|idx| &self.options[idx])
    }

    pub(crate) fn option_index(&self, arg: &str) -> Option<usize> {
        self.options.iter().position(|it| it.is(arg))
    }

    /// Name of the help subcommand when it is enabled.
    pub(crate) fn help_command_name(&self) -> Option<&str> {
        let enabled = self.help_command.enabled.unwrap_or_else(|| {
            !self.commands.is_empty() && self.action.is_none() && self.find_command("help").is_none()
        });
        enabled.then_some(self.help_command.name.as_str())
    }

    pub fn opts(&self) -> &OptionValues {
        &self.state.values
    }

    pub fn get_option_value(&self, key: &str) -> Option<&Value> {
        self.state.values.get(key)
    }

    /// Sets a value from client code. Such values have no source and are
    /// never overwritten by the environment or implied values.
    pub fn set_option_value(&mut self, key: &str, value: impl Into<Value>) -> &mut Command {
        self.state.values.insert(key.to_string(), value.into());
        self.state.sources.remove(key);
        self
    }

    pub fn set_option_value_with_source(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        source: ValueSource,
    ) -> &mut Command {
        self.state.values.insert(key.to_string(), value.into());
        self.state.sources.insert(key.to_string(), source);
        self
    }

    pub fn get_option_value_source(&self, key: &str) -> Option<ValueSource> {
        self.state.sources.get(key).copied()
    }

    /// Operands of the last parse: arguments that are neither options nor option values.
    pub fn operands(&self) -> &[String] {
        &self.state.operands
    }

    /// The first unknown option and everything after it, from the last parse.
    pub fn unknown(&self) -> &[String] {
        &self.state.unknown
    }

    /// Operands followed by unknown arguments.
    pub fn args(&self) -> &[String] {
        &self.state.args
    }

    pub fn processed_args(&self) -> &[Option<Value>] {
        &self.state.processed_args
    }

    pub fn raw_args(&self) -> &[String] {
        &self.state.raw_args
    }

    /// Parses options of this command only, assigning their values.
    ///
    /// Neither environment nor implied values are applied and nothing is dispatched.
    pub fn parse_options(&mut self, argv: &[String]) -> Result<Partition> {
        let digit_flags = scan::has_digit_flag(self);
        scan::scan(self, argv.to_vec(), digit_flags)
    }

    /// Parses `argv` and runs the matching actions.
    ///
    /// Pending hooks and actions are driven to completion on the current thread.
    /// When nothing is pending no executor is entered, so a synchronous tree can
    /// be parsed from inside a running future.
    pub fn parse<I>(&mut self, argv: I, style: ArgvStyle) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let argv = argv.into_iter().map(Into::into).collect();
        let res = match self.start(argv, style) {
            Ok(Completion::Done) => Ok(()),
            Ok(pending) => futures::executor::block_on(pending.wait()),
            Err(err) => Err(err),
        };
        self.finish(res)
    }

    pub async fn parse_async<I>(&mut self, argv: I, style: ArgvStyle) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let argv = argv.into_iter().map(Into::into).collect();
        let res = match self.start(argv, style) {
            Ok(completion) => completion.wait().await,
            Err(err) => Err(err),
        };
        self.finish(res)
    }

    /// Parses the arguments of the current process.
    pub fn parse_env(&mut self) -> Result<()> {
        let argv = std::env::args_os().map(|it| it.to_string_lossy().into_owned());
        self.parse(argv.collect::<Vec<_>>(), ArgvStyle::Native)
    }

    fn start(&mut self, argv: Vec<String>, style: ArgvStyle) -> Result<Completion<'_>> {
        self.validate_tree(&[])?;
        self.prepare_for_parse();
        let user = argv::split(&argv, style);
        self.state.raw_args = argv;
        if self.name.is_empty() {
            if let Some(name) = user.script_path.as_deref().and_then(argv::name_from_filename) {
                self.name = name;
            }
        }
        if self.name.is_empty() {
            self.name = "program".to_string();
        }
        self.state.script_path = user.script_path;
        log::debug!("parsing {:?} for `{}`", user.args, self.name);

        let steps = VecDeque::from([Step::Parse {
            path: Vec::new(),
            operands: Vec::new(),
            unknown: user.args,
        }]);
        dispatch::run_steps(self, steps)
    }

    fn finish(&self, res: Result<()>) -> Result<()> {
        let err = match res {
            Err(Error::Exit(err)) => err,
            res => return res,
        };
        match &self.exit {
            ExitPolicy::Exit => std::process::exit(err.exit_code()),
            ExitPolicy::Return(callback) => {
                if let Some(callback) = callback {
                    callback(&err);
                }
                Err(Error::Exit(err))
            }
        }
    }

    /// Re-checks tree invariants that attachment alone can't see, like aliases
    /// added after a command was attached.
    fn validate_tree(&self, ancestors: &[&Command]) -> Result<(), DefinitionError> {
        if self.settings.pass_through_options
            && !ancestors.iter().all(|it| it.settings.enable_positional_options)
        {
            return Err(DefinitionError::BrokenPassThrough(self.name.clone()));
        }
        for (i, cmd) in self.commands.iter().enumerate() {
            if cmd.aliases.contains(&cmd.name) {
                return Err(DefinitionError::AliasIsName);
            }
            for other in &self.commands[..i] {
                if cmd.known_by().any(|it| other.known_by().any(|o| o == it)) {
                    return Err(DefinitionError::CommandConflict {
                        new: cmd.known_by().collect::<Vec<_>>().join("|"),
                        existing: other.known_by().collect::<Vec<_>>().join("|"),
                    });
                }
            }
        }
        let mut chain = ancestors.to_vec();
        chain.push(self);
        for cmd in &self.commands {
            cmd.validate_tree(&chain)?;
        }
        Ok(())
    }

    /// Snapshots declared state on the first parse and restores it on later ones.
    pub(crate) fn prepare_for_parse(&mut self) {
        match &self.saved {
            None => {
                self.saved = Some(Saved {
                    name: self.name.clone(),
                    values: self.state.values.clone(),
                    sources: self.state.sources.clone(),
                });
            }
            Some(saved) => {
                self.name = saved.name.clone();
                self.state = State {
                    values: saved.values.clone(),
                    sources: saved.sources.clone(),
                    ..State::default()
                };
            }
        }
    }

    /// Writes `message` and builds the terminal error every parse failure goes through.
    pub fn error(&self, message: &str, code: ErrorCode, exit_code: i32) -> Error {
        self.output.write_err(&format!("{message}\n"));
        match &self.settings.show_help_after_error {
            HelpAfterError::Off => {}
            HelpAfterError::Message(hint) => self.output.write_err(&format!("{hint}\n")),
            HelpAfterError::Help => {
                self.output.write_err("\n");
                self.output_help(true);
            }
        }
        Error::Exit(CommandError::new(exit_code, code, message))
    }

    pub fn help_information(&self) -> String {
        help::render(self, &self.state.parent_names)
    }

    /// Writes help to the output sink, or to the error sink when `error` is set.
    pub fn output_help(&self, error: bool) {
        let text = self.help_information();
        if error {
            self.output.write_err(&text)
        } else {
            self.output.write_out(&text)
        }
    }

    /// Writes help and builds the terminal error that ends the parse.
    pub(crate) fn help_exit(&self, error: bool) -> Error {
        self.output_help(error);
        let exit_code = if error { 1 } else { 0 };
        Error::Exit(CommandError::new(exit_code, ErrorCode::Help, "(outputHelp)"))
    }

    pub(crate) fn output_help_if_requested(&self, args: &[String]) -> Result<()> {
        let requested = match &self.help_flag {
            Some(flag) => args.iter().any(|it| flag.is(it)),
            None => false,
        };
        if requested {
            self.output_help(false);
            return Err(CommandError::new(0, ErrorCode::HelpDisplayed, "(outputHelp)").into());
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

/// A command together with its ancestors, for walking up the tree.
#[derive(Clone)]
pub struct CommandRef<'c> {
    parents: Vec<&'c Command>,
    node: &'c Command,
}

impl<'c> CommandRef<'c> {
    pub fn root(root: &'c Command) -> CommandRef<'c> {
        CommandRef { parents: Vec::new(), node: root }
    }

    pub(crate) fn resolve(root: &'c Command, path: &[usize]) -> CommandRef<'c> {
        let mut res = CommandRef::root(root);
        for &idx in path {
            res.parents.push(res.node);
            res.node = &res.node.commands[idx];
        }
        res
    }

    pub fn command(&self) -> &'c Command {
        self.node
    }

    pub fn parent(&self) -> Option<CommandRef<'c>> {
        let mut parents = self.parents.clone();
        let node = parents.pop()?;
        Some(CommandRef { parents, node })
    }

    /// The command itself, then its parent, up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &'c Command> + '_ {
        std::iter::once(self.node).chain(self.parents.iter().rev().copied())
    }

    /// Option values of the command and all its ancestors; ancestors win.
    pub fn opts_with_globals(&self) -> OptionValues {
        let mut res = OptionValues::default();
        for cmd in self.ancestors() {
            res.extend(cmd.opts());
        }
        res
    }

    pub fn option_value_source_with_globals(&self, key: &str) -> Option<ValueSource> {
        self.ancestors().filter_map(|it| it.get_option_value_source(key)).last()
    }

    pub fn help_information(&self) -> String {
        help::render(self.node, &self.parent_names())
    }

    pub(crate) fn parent_names(&self) -> Vec<String> {
        self.parents.iter().map(|it| it.name.clone()).collect()
    }
}

impl<'c> Deref for CommandRef<'c> {
    type Target = Command;

    fn deref(&self) -> &Command {
        self.node
    }
}

impl fmt::Debug for CommandRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.ancestors().map(Command::get_name).collect::<Vec<_>>();
        f.debug_tuple("CommandRef").field(&names).finish()
    }
}
