use argtree::{parsers, Arg, Command, Flag, ValueSource};
use expect_test::expect;

use crate::{argv, check, program, record};

#[test]
fn short_and_long_options() {
    let (mut cmd, io) = program("prog");
    cmd.option("-p, --port <number>", "port")
        .unwrap()
        .option("-d, --debug", "debug")
        .unwrap()
        .option("-c, --cheese [type]", "cheese")
        .unwrap()
        .argument("[files...]", "files")
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "-d -p 80 a b",
        expect![[r#"
            prog: args=[Some(List([Str("a"), Str("b")]))] opts={"debug": Bool(true), "port": Str("80")}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--port=8080 -dc",
        expect![[r#"
            prog: args=[Some(List([]))] opts={"cheese": Bool(true), "debug": Bool(true), "port": Str("8080")}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "-cbrie -p80",
        expect![[r#"
            prog: args=[Some(List([]))] opts={"cheese": Str("brie"), "port": Str("80")}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "-c -d",
        expect![[r#"
            prog: args=[Some(List([]))] opts={"cheese": Bool(true), "debug": Bool(true)}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "-- -d x",
        expect![[r#"
            prog: args=[Some(List([Str("-d"), Str("x")]))] opts={}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "-p",
        expect![[r#"
            stderr:
            error: option '-p, --port <number>' argument missing
            exit option-missing-argument 1
        "#]],
    );
}

#[test]
fn optional_value_kept_apart() {
    let (mut cmd, io) = program("prog");
    cmd.option("-c, --cheese [type]", "cheese").unwrap().combine_flag_and_optional_value(false);
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "-c brie",
        expect![[r#"
            prog: args=[] opts={"cheese": Str("brie")}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "-cbrie",
        expect![[r#"
            stderr:
            error: unknown option '-brie'
            exit unknown-option 1
        "#]],
    );
}

#[test]
fn negative_numbers() {
    let (mut cmd, io) = program("prog");
    cmd.option("-n, --num <value>", "").unwrap().argument("[nums...]", "").unwrap();
    record(&mut cmd, &io.log);
    check(
        &mut cmd,
        &io,
        "-n -5 -3.2 7",
        expect![[r#"
            prog: args=[Some(List([Str("-3.2"), Str("7")]))] opts={"num": Str("-5")}
            ok
        "#]],
    );

    // A digit flag makes every negative number an option.
    let (mut cmd, io) = program("prog");
    cmd.option("-1, --one", "").unwrap().argument("[nums...]", "").unwrap();
    record(&mut cmd, &io.log);
    check(
        &mut cmd,
        &io,
        "-1 -2",
        expect![[r#"
            stderr:
            error: unknown option '-2'
            exit unknown-option 1
        "#]],
    );
}

#[test]
fn variadic_options() {
    let (mut cmd, io) = program("prog");
    cmd.add_option(Flag::new("--tags <tag...>", "").unwrap().default(vec!["base"]))
        .unwrap()
        .argument("[rest...]", "")
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            prog: args=[Some(List([]))] opts={"tags": List([Str("base")])}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--tags a b -- x",
        expect![[r#"
            prog: args=[Some(List([Str("x")]))] opts={"tags": List([Str("a"), Str("b")])}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--tags a --tags b",
        expect![[r#"
            prog: args=[Some(List([]))] opts={"tags": List([Str("a"), Str("b")])}
            ok
        "#]],
    );
}

#[test]
fn negatable_options() {
    let (mut cmd, io) = program("prog");
    cmd.option("--no-color", "")
        .unwrap()
        .option("--cheese <flavour>", "")
        .unwrap()
        .option("--no-cheese", "")
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            prog: args=[] opts={"color": Bool(true)}
            ok
        "#]],
    );
    assert_eq!(cmd.get_option_value_source("color"), Some(ValueSource::Default));
    check(
        &mut cmd,
        &io,
        "--no-color --cheese blue",
        expect![[r#"
            prog: args=[] opts={"cheese": Str("blue"), "color": Bool(false)}
            ok
        "#]],
    );
    assert_eq!(cmd.get_option_value_source("color"), Some(ValueSource::Cli));
    assert_eq!(cmd.get_option_value_source("cheese"), Some(ValueSource::Cli));
    check(
        &mut cmd,
        &io,
        "--no-cheese",
        expect![[r#"
            prog: args=[] opts={"cheese": Bool(false), "color": Bool(true)}
            ok
        "#]],
    );
}

#[test]
fn value_parsers() {
    let (mut cmd, io) = program("prog");
    cmd.add_option(Flag::new("-v, --verbose", "").unwrap().parser(parsers::increase))
        .unwrap()
        .add_option(Flag::new("--port <n>", "").unwrap().parser(parsers::int))
        .unwrap()
        .add_option(Flag::new("--size <size>", "").unwrap().choices(["small", "large"]))
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "-vvv --port 42 --size small",
        expect![[r#"
            prog: args=[] opts={"port": Int(42), "size": Str("small"), "verbose": Int(3)}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--port x",
        expect![[r#"
            stderr:
            error: option '--port <n>' argument 'x' is invalid. Not a number.
            exit invalid-argument 1
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--size huge",
        expect![[r#"
            stderr:
            error: option '--size <size>' argument 'huge' is invalid. Allowed choices are small, large.
            exit invalid-argument 1
        "#]],
    );
}

#[test]
fn implied_values() {
    let (mut cmd, io) = program("prog");
    cmd.add_option(Flag::new("--ci", "").unwrap().implies("quiet", true))
        .unwrap()
        .option("--quiet", "")
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "--ci",
        expect![[r#"
            prog: args=[] opts={"ci": Bool(true), "quiet": Bool(true)}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            prog: args=[] opts={}
            ok
        "#]],
    );
}

#[test]
fn parse_options_partitions_arguments() {
    let mut cmd = Command::new("prog");
    cmd.option("--port <n>", "").unwrap();
    let res = cmd.parse_options(&argv("--port 80 a --x b")).unwrap();
    assert_eq!(res.operands, ["a"]);
    assert_eq!(res.unknown, ["--x", "b"]);
    assert_eq!(cmd.opts().str("port"), Some("80"));
}

#[test]
fn parse_resets_previous_values() {
    let (mut cmd, io) = program("prog");
    cmd.option("-x, --debug", "")
        .unwrap()
        .add_option(Flag::new("--level <n>", "").unwrap().default("info"))
        .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "-x --level warn",
        expect![[r#"
            prog: args=[] opts={"debug": Bool(true), "level": Str("warn")}
            ok
        "#]],
    );
    assert_eq!(cmd.get_option_value_source("debug"), Some(ValueSource::Cli));
    assert_eq!(cmd.get_option_value_source("level"), Some(ValueSource::Cli));

    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            prog: args=[] opts={"level": Str("info")}
            ok
        "#]],
    );
    assert_eq!(cmd.get_option_value_source("debug"), None);
    assert_eq!(cmd.get_option_value_source("level"), Some(ValueSource::Default));
}

#[test]
fn variadic_choices_replace_the_default() {
    let (mut cmd, io) = program("prog");
    cmd.add_option(
        Flag::new("--size <s...>", "").unwrap().default(vec!["small"]).choices(["small", "large"]),
    )
    .unwrap()
    .add_argument(Arg::new("[modes...]", "").unwrap().default(vec!["fast"]).choices(["fast", "slow"]))
    .unwrap();
    record(&mut cmd, &io.log);

    check(
        &mut cmd,
        &io,
        "",
        expect![[r#"
            prog: args=[Some(List([Str("fast")]))] opts={"size": List([Str("small")])}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--size large -- slow",
        expect![[r#"
            prog: args=[Some(List([Str("slow")]))] opts={"size": List([Str("large")])}
            ok
        "#]],
    );
    check(
        &mut cmd,
        &io,
        "--size large small -- slow fast",
        expect![[r#"
            prog: args=[Some(List([Str("slow"), Str("fast")]))] opts={"size": List([Str("large"), Str("small")])}
            ok
        "#]],
    );
}
