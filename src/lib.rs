//! Command tree argument parser with subcommand dispatch and lifecycle hooks.
//!
//! A program is a tree of [`Command`]s. Each command declares options
//! ([`Flag`]), positional arguments ([`Arg`]), subcommands and handlers.
//! [`Command::parse`] tokenizes the argument vector one command at a time:
//! options known to the current command are consumed, the first operand
//! naming a subcommand hands the rest of the arguments over to it, and the
//! action of the deepest command reached is run with its processed
//! arguments.
//!
//! ```no_run
//! use argtree::{ArgvStyle, Command, Flow};
//!
//! fn main() -> argtree::Result<()> {
//!     let mut program = Command::new("pm");
//!     program.version("0.1.0")?;
//!     program
//!         .command("install [packages...]")?
//!         .option("-g, --global", "install globally")?
//!         .action(|args, opts, _cmd| {
//!             println!("install {:?} global={}", args[0], opts.flag("global"));
//!             Ok(Flow::Done)
//!         });
//!     program.parse(std::env::args(), ArgvStyle::Native)
//! }
//! ```
//!
//! Terminal conditions (errors, help, version) are reported once at the
//! root: by default the process exits with the matching code, after
//! [`Command::exit_override`] they are returned as [`Error::Exit`].
//!
//! Hooks, actions and listeners return a [`Flow`]. Returning
//! [`Flow::Pending`] defers the rest of the dispatch until the future
//! resolves; [`Command::parse`] drives it on the current thread and
//! [`Command::parse_async`] hands it to the caller's executor.

mod arg;
mod argv;
mod assign;
mod command;
mod dispatch;
mod error;
mod flag;
mod flow;
mod help;
mod launch;
mod output;
mod scan;
mod suggest;
mod syntax;
mod value;

pub use crate::{
    arg::Arg,
    argv::ArgvStyle,
    command::{Action, Command, CommandOpts, CommandRef, HelpAfterError, Hook, Listener},
    error::{CommandError, DefinitionError, Error, ErrorCode, InvalidArgumentError, LaunchError},
    flag::{parsers, Flag, ValueParser},
    flow::{Flow, HookEvent},
    launch::{Launcher, ProcessLauncher},
    output::{ExitPolicy, Output},
    scan::Partition,
    syntax::FlagValue,
    value::{OptionValues, Value, ValueSource},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
