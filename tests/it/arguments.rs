use argtree::{parse, Command, StructuralError, Value, ValueParser};
use expect_test::expect;

use crate::{check, recorded, spy, strs};

#[test]
fn required() {
    let mut program = Command::program("prog");
    program.arguments("<a>").unwrap();
    let calls = spy(&mut program);

    program.try_parse(["a"]).unwrap();
    assert_eq!(recorded(&calls), vec![strs(&["a"])]);
}

#[test]
fn optional_can_be_omitted() {
    let mut program = Command::program("prog");
    program.arguments("[a]").unwrap();
    let calls = spy(&mut program);

    program.try_parse(Vec::<String>::new()).unwrap();
    assert_eq!(recorded(&calls), vec![Vec::<Value>::new()]);
}

#[test]
fn variadic() {
    let mut program = Command::program("prog");
    program.arguments("<a...>").unwrap();
    let calls = spy(&mut program);

    program.try_parse(["a", "b"]).unwrap();
    assert_eq!(recorded(&calls), vec![vec![Value::from(vec!["a", "b"])]]);
}

#[test]
fn combinations() {
    let mut program = Command::program("prog");
    program.arguments("<a> [b] [c...]").unwrap();
    let calls = spy(&mut program);

    program.try_parse(["a", "b", "c", "d"]).unwrap();
    assert_eq!(
        recorded(&calls),
        vec![vec![Value::from("a"), Value::from("b"), Value::from(vec!["c", "d"])]]
    );
}

#[test]
fn value_parser() {
    let mut program = Command::program("prog");
    program.arguments("<a>").unwrap().argument("a", parse::int()).unwrap();
    let calls = spy(&mut program);

    program.try_parse(["1"]).unwrap();
    assert_eq!(recorded(&calls), vec![vec![Value::Int(1)]]);

    check(&program, "one", expect!["Can't parse 'a', value 'one' is not an integer"]);
}

#[test]
fn pattern() {
    let mut program = Command::program("prog");
    program
        .arguments("<names...>")
        .unwrap()
        .argument("names", ValueParser::pattern("^[a-z]+$").unwrap())
        .unwrap();

    check(&program, "dune emma 42", expect!["Invalid value '42' for 'names' argument"]);
}

#[test]
fn returned_without_action() {
    let mut program = Command::program("prog");
    program.arguments("<a> [b] [c...]").unwrap();

    check(
        &program,
        "a b c d",
        expect![[r#"
            Some(
                List(
                    [
                        Str(
                            "a",
                        ),
                        Str(
                            "b",
                        ),
                        List(
                            [
                                Str(
                                    "c",
                                ),
                                Str(
                                    "d",
                                ),
                            ],
                        ),
                    ],
                ),
            )
        "#]],
    );
}

#[test]
fn visible_to_the_action() {
    let mut program = Command::program("prog");
    program.arguments("<a> [b] [c...]").unwrap().action(|ctx| {
        assert_eq!(ctx.arg(0), Some(&Value::from("a")));
        assert_eq!(ctx.arg(3), None);
        Ok(Some(Value::List(ctx.args().to_vec())))
    });

    let parsed = program.try_parse(["a", "b", "c", "d"]).unwrap();
    assert_eq!(parsed.args(), parsed.value().unwrap().as_list().unwrap());
}

#[test]
fn errors() {
    let mut program = Command::program("prog");
    program.arguments("<a> <b> [c]").unwrap();

    check(&program, "", expect!["Missing required argument 'a'"]);
    check(&program, "x", expect!["Missing required argument 'b'"]);
    check(&program, "x y z w", expect!["Too many arguments"]);

    let mut program = Command::program("prog");
    program.arguments("<a...>").unwrap();
    check(&program, "", expect!["Missing required argument 'a'"]);

    let program = Command::program("prog");
    check(&program, "x", expect!["Too many arguments"]);
}

#[test]
fn optional_variadic_may_stay_empty() {
    let mut program = Command::program("prog");
    program.arguments("<a> [rest...]").unwrap();

    let parsed = program.try_parse(["x"]).unwrap();
    assert_eq!(parsed.args(), strs(&["x"]));
}

#[test]
fn literal() {
    let mut program = Command::program("prog");
    program.arguments("install <pkg>").unwrap();

    let parsed = program.try_parse(["install", "serde"]).unwrap();
    assert_eq!(parsed.args(), strs(&["serde"]));

    check(&program, "serde", expect!["Expected 'install', got 'serde'"]);
    check(&program, "", expect!["Missing required argument 'install'"]);
}

#[test]
fn structural() {
    let mut program = Command::program("prog");
    program.arguments("<a>").unwrap();
    assert_eq!(
        program.arguments("<b>").unwrap_err(),
        StructuralError::ArgumentsAlreadyDeclared("prog".into())
    );
    assert_eq!(
        program.argument("b", parse::int()).unwrap_err(),
        StructuralError::NoSuchArgument("b".into())
    );

    let mut program = Command::program("prog");
    assert_eq!(
        program.arguments("[a] <b>").unwrap_err(),
        StructuralError::RequiredAfterOptional("b".into())
    );
    assert_eq!(
        program.arguments("<a...> [b]").unwrap_err(),
        StructuralError::VariadicNotLast("a".into())
    );
    assert!(program.positionals().is_empty());
}
