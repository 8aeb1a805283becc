//! `cargo run --example hello -- --name world -vv`
use argtree::{parsers, Flag, Flow};

fn main() -> argtree::Result<()> {
    env_logger::init();

    let mut program = argtree::Command::new("hello");
    program
        .description("Prints a greeting.")
        .version(env!("CARGO_PKG_VERSION"))?
        .option("-n, --name <name>", "who to greet")?
        .add_option(Flag::new("-v, --verbose", "be louder")?.parser(parsers::increase))?
        .argument("[greeting]", "what to say")?
        .action(|args, opts, _cmd| {
            let greeting = args[0].as_ref().and_then(|it| it.as_str()).unwrap_or("Hello");
            let name = opts.str("name").unwrap_or("there");
            let bang = "!".repeat(opts.get("verbose").and_then(|it| it.as_i64()).unwrap_or(0) as usize);
            println!("{greeting}, {name}{bang}");
            Ok(Flow::Done)
        });
    program.parse_env()
}
