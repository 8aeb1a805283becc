use std::path::{Path, PathBuf};

/// Describes which leading tokens of an argument vector are not user arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgvStyle {
    /// `argv[0]` is the executable itself, as in `std::env::args`.
    #[default]
    Native,
    /// `argv[0]` is an interpreter and `argv[1]` the script being run.
    Node,
    /// Packaged apps only have the executable; `default_app` ones also a script.
    Electron { default_app: bool },
    /// `argv[0]` is an interpreter evaluating inline code, there is no script.
    Eval,
    /// Every token is a user argument.
    User,
}

pub(crate) struct UserArgs {
    pub(crate) args: Vec<String>,
    pub(crate) script_path: Option<PathBuf>,
}

pub(crate) fn split(argv: &[String], style: ArgvStyle) -> UserArgs {
    let script = |i: usize| argv.get(i).map(PathBuf::from);
    let rest = |i: usize| argv.iter().skip(i).cloned().collect::<Vec<_>>();
    match style {
        ArgvStyle::Native => UserArgs { args: rest(1), script_path: script(0) },
        ArgvStyle::Node | ArgvStyle::Electron { default_app: true } => {
            UserArgs { args: rest(2), script_path: script(1) }
        }
        ArgvStyle::Electron { default_app: false } | ArgvStyle::Eval => {
            UserArgs { args: rest(1), script_path: None }
        }
        ArgvStyle::User => UserArgs { args: rest(0), script_path: None },
    }
}

/// Program name deduced from a script path: `/usr/bin/pm-install.exe` gives `pm-install`.
pub(crate) fn name_from_filename(path: &Path) -> Option<String> {
    path.file_stem().map(|it| it.to_string_lossy().into_owned())
}
