//! Runs a tool with options that are not ours:
//! `cargo run --example pass-through -- --dry-run node --inspect app.js`
use argtree::{ArgvStyle, Command, Flow};

fn main() -> argtree::Result<()> {
    env_logger::init();

    let mut program = Command::new("launch");
    program.enable_positional_options(true).option("--dry-run", "print the command only")?;
    program
        .command("exec <tool> [args...]")?
        .description("run a tool, passing everything after its name through")
        .pass_through_options(true)?
        .action(|args, _, cmd| {
            let tool = args[0].as_ref().and_then(|it| it.as_str()).unwrap_or_default();
            let rest = args[1].as_ref().and_then(|it| it.as_list()).unwrap_or_default();
            let rest = rest.iter().filter_map(|it| it.as_str()).collect::<Vec<_>>();
            let dry_run = cmd.opts_with_globals().flag("dry_run");
            println!("{}{tool} {}", if dry_run { "would run: " } else { "" }, rest.join(" "));
            Ok(Flow::Done)
        });
    program.parse(std::env::args(), ArgvStyle::Native)
}
