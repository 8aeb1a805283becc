use argtree::{CommandOpts, Flow};
use expect_test::expect;

use crate::{check, pm, program, record};

#[test]
fn subcommands_take_the_rest() {
    let (mut cmd, io) = pm();

    check(
        &mut cmd,
        &io,
        "-g install a b --save",
        expect![[r#"
            install: args=[Some(List([Str("a"), Str("b")]))] opts={"save": Bool(true)}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "rm pkg",
        expect![[r#"
            remove: args=[Some(Str("pkg"))] opts={}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "remove",
        expect![[r#"
            stderr:
            error: missing required argument 'package'
            exit missing-argument 1
        "#]],
    );
}

#[test]
fn global_options_are_visible_from_subcommands() {
    let (mut cmd, io) = program("pm");
    cmd.option("-g, --global", "").unwrap();
    let log = io.log.clone();
    cmd.command("remove <package>").unwrap().alias("rm").unwrap().action(move |args, _, cmd| {
        log.push(format!("{}: {args:?} {:?}", cmd.get_name(), cmd.opts_with_globals()));
        Ok(Flow::Done)
    });

    check(
        &mut cmd,
        &io,
        "-g rm pkg",
        expect![[r#"
            remove: [Some(Str("pkg"))] {"global": Bool(true)}
            ok
        "#]],
    );
}

#[test]
fn default_command() {
    let (mut cmd, io) = program("prog");
    let serve = cmd.command_with("serve", CommandOpts { is_default: true, ..Default::default() }).unwrap();
    serve.option("--port <n>", "").unwrap();
    record(serve, &io.log);
    record(cmd.command("build").unwrap(), &io.log);

    check(
        &mut cmd,
        &io,
        "--port 3",
        expect![[r#"
            serve: args=[] opts={"port": Str("3")}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "build",
        expect![[r#"
            build: args=[] opts={}
            ok
        "#]],
    );
}

#[test]
fn listeners() {
    let (mut cmd, io) = program("prog");
    let log = io.log.clone();
    cmd.on_command("*", move |operands, unknown| {
        log.push(format!("* {operands:?} {unknown:?}"));
        Ok(Flow::Done)
    });
    let log = io.log.clone();
    cmd.on_command("serve", move |operands, unknown| {
        log.push(format!("serve {operands:?} {unknown:?}"));
        Ok(Flow::Done)
    });
    cmd.command("serve").unwrap().option("--port <n>", "").unwrap();

    check(
        &mut cmd,
        &io,
        "foo --bar",
        expect![[r#"
            * ["foo"] ["--bar"]
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "serve --port 1",
        expect![[r#"
            serve [] []
            ok
        "#]],
    );
}

#[test]
fn pass_through_options() {
    let (mut cmd, io) = program("prog");
    cmd.enable_positional_options(true).option("-v, --verbose", "").unwrap();
    let run = cmd.command("run <cmd> [args...]").unwrap();
    run.pass_through_options(true).unwrap().option("-q, --quiet", "").unwrap();
    record(run, &io.log);

    check(
        &mut cmd,
        &io,
        "-v run node --inspect -q",
        expect![[r#"
            run: args=[Some(Str("node")), Some(List([Str("--inspect"), Str("-q")]))] opts={}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "run -q node",
        expect![[r#"
            run: args=[Some(Str("node")), Some(List([]))] opts={"quiet": Bool(true)}
            ok
        "#]],
    );
}

#[test]
fn pass_through_needs_positional_parent() {
    let (mut cmd, io) = program("prog");
    let run = cmd.command("run [args...]").unwrap();
    assert_eq!(
        run.pass_through_options(true).unwrap_err().to_string(),
        "passThroughOptions cannot be used for 'run' without turning on enablePositionalOptions for parent command(s)"
    );
    record(run, &io.log);

    check(
        &mut cmd,
        &io,
        "run x",
        expect![[r#"
            passThroughOptions cannot be used for 'run' without turning on enablePositionalOptions for parent command(s)
        "#]],
    );

    let (mut cmd, io) = program("prog");
    cmd.enable_positional_options(true);
    let run = cmd.command("run [args...]").unwrap();
    run.pass_through_options(true).unwrap();
    record(run, &io.log);
    cmd.enable_positional_options(false);
    assert!(cmd.command("exec").unwrap().pass_through_options(true).is_err());

    check(
        &mut cmd,
        &io,
        "run x",
        expect![[r#"
            passThroughOptions cannot be used for 'run' without turning on enablePositionalOptions for parent command(s)
        "#]],
    );
}

#[test]
fn unknown_options_wait_for_the_subcommand() {
    let (mut cmd, io) = program("prog");
    let sub = cmd.command("sub").unwrap();
    sub.option("--known", "").unwrap();
    record(sub, &io.log);

    check(
        &mut cmd,
        &io,
        "sub --known",
        expect![[r#"
            sub: args=[] opts={"known": Bool(true)}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--nope sub",
        expect![[r#"
            stderr:
            error: unknown option '--nope'
            exit unknown-option 1
        "#]],
    );
}

#[test]
fn optional_argument_left_out() {
    let (mut cmd, io) = program("git");
    record(cmd.command("clone <source> [destination]").unwrap(), &io.log);
    check(
        &mut cmd,
        &io,
        "clone repo.git",
        expect![[r#"
            clone: args=[Some(Str("repo.git")), None] opts={}
            ok
        "#]],
    );
}

#[test]
fn help_flag_wins_over_missing_mandatory_option() {
    let (mut cmd, io) = program("prog");
    cmd.required_option("--token <t>", "api token").unwrap();
    record(&mut cmd, &io.log);
    check(
        &mut cmd,
        &io,
        "--help",
        expect![[r#"
            stdout:
            Usage: prog [options]

            Options:
              --token <t>  api token
              -h, --help   display help for command
            exit help-displayed 0
        "#]],
    );
}
