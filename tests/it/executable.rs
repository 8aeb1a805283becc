use std::{io, path::Path};

use argtree::{Command, Launcher};
use expect_test::expect;

use crate::{check, program, Io, Log};

struct FakeLauncher {
    log: Log,
    result: fn() -> io::Result<i32>,
}

impl Launcher for FakeLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<i32> {
        self.log.push(format!("launch {} {args:?}", program.display()));
        (self.result)()
    }
}

fn pm(result: fn() -> io::Result<i32>) -> (Command, Io) {
    let (mut cmd, io) = program("pm");
    cmd.launcher(FakeLauncher { log: io.log.clone(), result });
    cmd.executable_command("install [name]", "install packages").unwrap();
    cmd.executable_command("publish", "publish the package").unwrap().executable_file("pm-release");
    (cmd, io)
}

#[test]
fn launches_with_the_remaining_arguments() {
    let (mut cmd, io) = pm(|| Ok(0));
    check(
        &mut cmd,
        &io,
        "install foo --force",
        expect![[r#"
            launch pm-install ["foo", "--force"]
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "publish",
        expect![[r#"
            launch pm-release []
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "help install",
        expect![[r#"
            launch pm-install ["--help"]
            ok
        "#]],
    );
}

#[test]
fn exit_code_of_the_child_is_kept() {
    let (mut cmd, io) = pm(|| Ok(3));
    check(
        &mut cmd,
        &io,
        "install",
        expect![[r#"
            launch pm-install []
            exit execute-subcommand 3
        "#]],
    );
}

#[test]
fn launch_failures() {
    let (mut cmd, io) = pm(|| Err(io::ErrorKind::NotFound.into()));
    check(
        &mut cmd,
        &io,
        "install",
        expect![[r#"
            launch pm-install []
            'pm-install' does not exist
             - if 'install' is not meant to be an executable command, declare it with command() instead of executable_command()
             - if the default executable name is not suitable, use executable_file() to supply a custom name or path
             - no directory for search for local subcommand, use executable_dir() to supply a custom directory
        "#]],
    );

    let (mut cmd, io) = pm(|| Err(io::ErrorKind::PermissionDenied.into()));
    check(
        &mut cmd,
        &io,
        "install",
        expect![[r#"
            launch pm-install []
            'pm-install' not executable
        "#]],
    );

    let (mut cmd, io) = pm(|| Err(io::Error::new(io::ErrorKind::Other, "broken pipe")));
    check(
        &mut cmd,
        &io,
        "install",
        expect![[r#"
            launch pm-install []
            exit execute-subcommand 1
        "#]],
    );
}
