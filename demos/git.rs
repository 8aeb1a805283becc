//! A git-like tree with hooks, a default command and an async action:
//! `cargo run --example git -- clone https://example.com/repo.git --depth 1`
use argtree::{parsers, Arg, Command, CommandOpts, Flag, Flow, HookEvent};

fn main() -> argtree::Result<()> {
    env_logger::init();

    let mut git = Command::new("git");
    git.version("2.0.0")?
        .option("-C <path>", "run as if started in <path>")?
        .show_suggestion_after_error(true)
        .hook(HookEvent::PreAction, |_this, target| {
            log::info!("about to run `{}`", target.get_name());
            Ok(Flow::Done)
        });

    git.command("clone <repository> [directory]")?
        .description("clone a repository into a new directory")
        .add_option(Flag::new("--depth <depth>", "create a shallow clone")?.parser(parsers::int))?
        .action(|args, opts, _cmd| {
            let repository = args[0].clone();
            let depth = opts.get("depth").cloned();
            Ok(Flow::pending(async move {
                println!("cloning {repository:?} (depth {depth:?})");
                Ok(())
            }))
        });

    git.command_with("status", CommandOpts { is_default: true, ..Default::default() })?
        .description("show the working tree status")
        .option("-s, --short", "give the output in the short format")?
        .action(|_, opts, cmd| {
            let dir = cmd.opts_with_globals().str("C").unwrap_or(".").to_string();
            println!("status of {dir} (short: {})", opts.flag("short"));
            Ok(Flow::Done)
        });

    git.command("remote")?
        .description("manage set of tracked repositories")
        .command("add")?
        .add_argument(Arg::new("<name>", "name of the remote")?)?
        .add_argument(Arg::new("<url>", "where it lives")?)?
        .action(|args, _, cmd| {
            println!("{}: {:?}", cmd.parent().map(|it| it.get_name().to_string()).unwrap_or_default(), args);
            Ok(Flow::Done)
        });

    git.executable_command("lfs", "git large file storage")?;

    git.parse_env()
}
