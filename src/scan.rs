//! Left-to-right option scan of a single command.
//!
//! Known options get their values assigned on the spot; everything else is
//! split into operands and unknown arguments for the dispatcher.

use std::mem;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{assign, syntax::FlagValue, Command, CommandError, Error, ErrorCode, Result, ValueSource};

static NEGATIVE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\d*\.?\d+(e[+-]?\d+)?$").unwrap());
static DIGIT_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\d$").unwrap());

/// Result of scanning options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Arguments that are neither options nor option values.
    pub operands: Vec<String>,
    /// The first unrecognised option and everything after it.
    pub unknown: Vec<String>,
}

struct Tokens {
    rargs: Vec<String>,
}

impl Tokens {
    fn new(mut args: Vec<String>) -> Tokens {
        args.reverse();
        Tokens { rargs: args }
    }

    fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }

    fn peek(&self) -> Option<&str> {
        self.rargs.last().map(String::as_str)
    }

    /// Puts a token back to be scanned next.
    fn push_back(&mut self, arg: String) {
        self.rargs.push(arg)
    }

    fn rest(&mut self) -> Vec<String> {
        let mut res = mem::take(&mut self.rargs);
        res.reverse();
        res
    }
}

pub(crate) fn has_digit_flag(cmd: &Command) -> bool {
    cmd.options.iter().filter_map(|it| it.short.as_deref()).any(|it| DIGIT_FLAG.is_match(it))
}

fn maybe_option(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}

/// Scans `argv` against the options of `cmd`.
///
/// `digit_flags` tells whether the command or one of its ancestors has a
/// short flag like `-1`, in which case negative numbers are options too.
pub(crate) fn scan(cmd: &mut Command, argv: Vec<String>, digit_flags: bool) -> Result<Partition> {
    let negative_number = |arg: &str| !digit_flags && NEGATIVE_NUMBER.is_match(arg);
    let positional =
        cmd.settings.enable_positional_options || cmd.settings.pass_through_options;

    let mut res = Partition::default();
    let mut to_unknown = false;
    let mut active_variadic: Option<usize> = None;
    let p = &mut Tokens::new(argv);

    while let Some(arg) = p.next() {
        if arg == "--" {
            if to_unknown {
                res.unknown.push(arg);
                res.unknown.extend(p.rest());
            } else {
                res.operands.extend(p.rest());
            }
            break;
        }

        if let Some(idx) = active_variadic {
            if !maybe_option(&arg) || negative_number(&arg) {
                assign_cli(cmd, idx, Some(arg))?;
                continue;
            }
        }
        active_variadic = None;

        if maybe_option(&arg) {
            if let Some(idx) = cmd.option_index(&arg) {
                log::trace!("`{arg}` is an option of `{}`", cmd.get_name());
                match cmd.options[idx].value {
                    FlagValue::Required => match p.next() {
                        Some(value) => assign_cli(cmd, idx, Some(value))?,
                        None => {
                            let flags = cmd.options[idx].flags();
                            return Err(cmd.error(
                                &format!("error: option '{flags}' argument missing"),
                                ErrorCode::OptionMissingArgument,
                                1,
                            ));
                        }
                    },
                    FlagValue::Optional => {
                        // The value is optional; a following option is never taken as one.
                        let takes_next =
                            p.peek().map_or(false, |next| !maybe_option(next) || negative_number(next));
                        let value = if takes_next { p.next() } else { None };
                        assign_cli(cmd, idx, value)?
                    }
                    FlagValue::Switch => assign_cli(cmd, idx, None)?,
                }
                active_variadic = cmd.options[idx].variadic.then_some(idx);
                continue;
            }
        }

        // Combined short flags, `-abc` or `-p80`.
        if let Some((short, tail)) = split_short(&arg) {
            if let Some(idx) = cmd.option_index(&short) {
                log::trace!("`{arg}` starts with option `{short}`");
                let combine = match cmd.options[idx].value {
                    FlagValue::Required => true,
                    FlagValue::Optional => cmd.settings.combine_flag_and_optional_value,
                    FlagValue::Switch => false,
                };
                if combine {
                    assign_cli(cmd, idx, Some(tail.to_string()))?;
                } else {
                    assign_cli(cmd, idx, None)?;
                    p.push_back(format!("-{tail}"));
                }
                continue;
            }
        }

        if let Some((name, value)) = arg.split_once('=').filter(|(name, _)| name.len() > 2) {
            if name.starts_with("--") {
                if let Some(idx) = cmd.option_index(name).filter(|&idx| cmd.options[idx].takes_value()) {
                    assign_cli(cmd, idx, Some(value.to_string()))?;
                    continue;
                }
            }
        }

        // An unknown option sends it and the rest to `unknown`, to be
        // re-scanned by a subcommand. A negative number in a leaf is an operand.
        if !to_unknown && maybe_option(&arg) && !(cmd.commands.is_empty() && negative_number(&arg)) {
            log::trace!("`{arg}` is unknown to `{}`", cmd.get_name());
            to_unknown = true;
        }

        if positional && res.operands.is_empty() && res.unknown.is_empty() {
            if cmd.command_index(&arg).is_some() {
                res.operands.push(arg);
                res.unknown.extend(p.rest());
                break;
            }
            if cmd.help_command_name() == Some(arg.as_str()) {
                res.operands.push(arg);
                res.operands.extend(p.rest());
                break;
            }
            if cmd.default_command.is_some() {
                res.unknown.push(arg);
                res.unknown.extend(p.rest());
                break;
            }
        }

        let dest = if to_unknown { &mut res.unknown } else { &mut res.operands };
        dest.push(arg);
        if cmd.settings.pass_through_options {
            dest.extend(p.rest());
            break;
        }
    }

    Ok(res)
}

/// Splits `-abc` into `-a` and `bc`.
fn split_short(arg: &str) -> Option<(String, &str)> {
    let rest = arg.strip_prefix('-')?;
    let mut chars = rest.chars();
    let first = chars.next().filter(|&c| c != '-')?;
    let tail = chars.as_str();
    if tail.is_empty() {
        return None;
    }
    Some((format!("-{first}"), tail))
}

fn assign_cli(cmd: &mut Command, idx: usize, value: Option<String>) -> Result<()> {
    if let Some(version) = cmd.options[idx].version.clone() {
        cmd.output.write_out(&format!("{version}\n"));
        return Err(Error::Exit(CommandError::new(0, ErrorCode::Version, version)));
    }
    assign::option_value(cmd, idx, value, ValueSource::Cli)
}
