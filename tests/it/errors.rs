use argtree::{parsers, Arg, Command, Flag, HelpAfterError, InvalidArgumentError, Value, ValueSource};
use expect_test::expect;
use serial_test::serial;

use crate::{check, pm, program, record};

#[test]
fn unknown_option_suggestions() {
    let (mut cmd, io) = program("prog");
    cmd.option("--verbose", "").unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "--verbos",
        expect![[r#"
            stderr:
            error: unknown option '--verbos'
            (Did you mean --verbose?)
            exit unknown-option 1
        "#]],
    );

    cmd.show_suggestion_after_error(false);
    check(
        &mut cmd,
        &io,
        "--verbos",
        expect![[r#"
            stderr:
            error: unknown option '--verbos'
            exit unknown-option 1
        "#]],
    );
}

#[test]
fn subcommand_suggestions() {
    let (mut cmd, io) = pm();
    check(
        &mut cmd,
        &io,
        "instal",
        expect![[r#"
            stderr:
            error: unknown command 'instal'
            (Did you mean install?)
            exit unknown-command 1
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "install --sav",
        expect![[r#"
            stderr:
            error: unknown option '--sav'
            (Did you mean --save?)
            exit unknown-option 1
        "#]],
    );
}

#[test]
fn argument_counts() {
    let (mut cmd, io) = program("prog");
    cmd.argument("<file>", "").unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "a b",
        expect![[r#"
            stderr:
            error: too many arguments. Expected 1 argument but got 2.
            exit excess-arguments 1
        "#]],
    );
    cmd.show_help_after_error(HelpAfterError::Message(
        "(add --help for additional information)".to_string(),
    ));
    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            stderr:
            error: missing required argument 'file'
            (add --help for additional information)
            exit missing-argument 1
        "#]],
    );
    cmd.allow_excess_arguments(true);
    check(
        &mut cmd,
        &io,
        "a b",
        expect![[r#"
            prog: args=[Some(Str("a"))] opts={}
            ok
        "#]],
    );
}

#[test]
fn excess_arguments_name_the_subcommand() {
    let (mut cmd, io) = program("prog");
    record(cmd.command("sub").unwrap(), &io.log);
    check(
        &mut cmd,
        &io,
        "sub x",
        expect![[r#"
            stderr:
            error: too many arguments for 'sub'. Expected 0 arguments but got 1.
            exit excess-arguments 1
        "#]],
    );
}

#[test]
fn argument_parsers() {
    let (mut cmd, io) = program("prog");
    let small = |raw: &str, _: Option<&Value>| match raw.parse::<i64>() {
        Ok(n) if n < 10 => Ok(Value::Int(n)),
        _ => Err(InvalidArgumentError::new("too big").with_exit_code(2)),
    };
    cmd.add_argument(Arg::new("<n>", "").unwrap().parser(small))
        .unwrap()
        .add_argument(Arg::new("[rest...]", "").unwrap().parser(parsers::int))
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "3 4",
        expect![[r#"
            prog: args=[Some(Int(3)), Some(Int(4))] opts={}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "99",
        expect![[r#"
            stderr:
            error: command-argument value '99' is invalid for argument 'n'. too big
            exit invalid-argument 2
        "#]],
    );
}

#[test]
fn mandatory_and_conflicting_options() {
    let (mut cmd, io) = program("prog");
    cmd.required_option("--token <t>", "")
        .unwrap()
        .add_option(Flag::new("--json", "").unwrap().conflicts("csv"))
        .unwrap()
        .option("--csv", "")
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "--json",
        expect![[r#"
            stderr:
            error: required option '--token <t>' not specified
            exit missing-mandatory-option-value 1
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--token t --json --csv",
        expect![[r#"
            stderr:
            error: option '--json' cannot be used with option '--csv'
            exit conflicting-option 1
        "#]],
    );
}

#[test]
#[serial]
fn options_from_env() {
    let (mut cmd, io) = program("prog");
    cmd.add_option(Flag::new("--token <t>", "").unwrap().env("ARGTREE_TEST_TOKEN").mandatory())
        .unwrap()
        .add_option(Flag::new("--port <n>", "").unwrap().env("ARGTREE_TEST_PORT").parser(parsers::int))
        .unwrap();
    record(&mut cmd, &io.log);

    std::env::set_var("ARGTREE_TEST_TOKEN", "abc");
    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            prog: args=[] opts={"token": Str("abc")}
            ok
        "#]],
    );
    assert_eq!(cmd.get_option_value_source("token"), Some(ValueSource::Env));

    check(
        &mut cmd,
        &io,
        "--token cli",
        expect![[r#"
            prog: args=[] opts={"token": Str("cli")}
            ok
        "#]],
    );
    assert_eq!(cmd.get_option_value_source("token"), Some(ValueSource::Cli));

    std::env::set_var("ARGTREE_TEST_PORT", "abc");
    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            stderr:
            error: option '--port <n>' value 'abc' from env 'ARGTREE_TEST_PORT' is invalid. Not a number.
            exit invalid-argument 1
        "#]],
    );
    std::env::remove_var("ARGTREE_TEST_PORT");
    std::env::remove_var("ARGTREE_TEST_TOKEN");
}

#[test]
fn definition_errors() {
    let mut cmd = Command::new("prog");
    cmd.option("-p, --port <n>", "").unwrap();
    assert_eq!(
        cmd.option("--port <x>", "").unwrap_err().to_string(),
        "Cannot add option '--port <x>' to command 'prog' due to conflicting flag '--port'\n-  already used by option '-p, --port <n>'"
    );

    cmd.command("serve").unwrap();
    assert_eq!(
        cmd.command("serve").unwrap_err().to_string(),
        "cannot add command 'serve' as already have command 'serve'"
    );
    assert_eq!(
        cmd.command("build").unwrap().alias("build").unwrap_err().to_string(),
        "Command alias can't be the same as its name"
    );

    let mut cmd = Command::new("prog");
    cmd.argument("[files...]", "").unwrap();
    assert_eq!(
        cmd.argument("<last>", "").unwrap_err().to_string(),
        "only the last argument can be variadic 'files'"
    );
    assert!(Flag::new("-ab", "").is_err());
    assert!(Flag::new("port", "").is_err());
}
