mod dispatch;
mod errors;
mod executable;
mod options;

use std::{cell::RefCell, rc::Rc};

use argtree::{ArgvStyle, Command, Error, Flow, Output};
use expect_test::Expect;

/// Text shared between a test and the closures it hands to a program.
#[derive(Clone, Default)]
struct Log(Rc<RefCell<String>>);

impl Log {
    fn write(&self, text: &str) {
        self.0.borrow_mut().push_str(text)
    }

    fn push(&self, line: impl AsRef<str>) {
        let mut buf = self.0.borrow_mut();
        buf.push_str(line.as_ref());
        buf.push('\n');
    }

    fn take(&self) -> String {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

#[derive(Default)]
struct Io {
    log: Log,
    out: Log,
    err: Log,
}

fn argv(args: &str) -> Vec<String> {
    args.split_ascii_whitespace().map(String::from).collect()
}

/// A program writing into `Io` and returning errors instead of exiting.
/// Subcommands added with `command` inherit both.
fn program(name: &str) -> (Command, Io) {
    let io = Io::default();
    let (out, err) = (io.out.clone(), io.err.clone());
    let mut cmd = Command::new(name);
    cmd.configure_output(Output::new(move |text| out.write(text), move |text| err.write(text)))
        .exit_override();
    (cmd, io)
}

/// Makes the action of `cmd` log its arguments and options.
fn record<'a>(cmd: &'a mut Command, log: &Log) -> &'a mut Command {
    let log = log.clone();
    cmd.action(move |args, opts, cmd| {
        log.push(format!("{}: args={args:?} opts={opts:?}", cmd.get_name()));
        Ok(Flow::Done)
    })
}

/// A small package manager: `pm [-g] install [packages...] [--save]`,
/// `pm remove|rm <package>`.
fn pm() -> (Command, Io) {
    let (mut cmd, io) = program("pm");
    cmd.option("-g, --global", "use the global store").unwrap();

    let install = cmd.command("install [packages...]").unwrap();
    install.description("add packages").option("--save", "save to manifest").unwrap();
    record(install, &io.log);

    let remove = cmd.command("remove <package>").unwrap();
    remove.alias("rm").unwrap().description("remove a package");
    record(remove, &io.log);

    (cmd, io)
}

/// Parses `args` and compares everything the program did with `expect`.
fn check(cmd: &mut Command, io: &Io, args: &str, expect: Expect) {
    let res = cmd.parse(argv(args), ArgvStyle::User);

    let mut buf = io.log.take();
    for (name, sink) in [("stdout", &io.out), ("stderr", &io.err)] {
        let text = sink.take();
        if !text.is_empty() {
            buf.push_str(&format!("{name}:\n{text}"));
        }
    }
    match res {
        Ok(()) => buf.push_str("ok\n"),
        Err(Error::Exit(err)) => buf.push_str(&format!("exit {} {}\n", err.code(), err.exit_code())),
        Err(err) => buf.push_str(&format!("{err}\n")),
    }
    expect.assert_eq(&buf);
}
