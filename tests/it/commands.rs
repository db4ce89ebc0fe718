use std::sync::Arc;

use argtree::{Command, Error, ParseError, StructuralError, Value};
use expect_test::expect;

use crate::{check, recorded, spy, strs, Captured};

fn nested() -> Command {
    let mut program = Command::program("prog");
    program.command("a").unwrap().command("b").unwrap().command("c").unwrap().action(|ctx| {
        Ok(Some(Value::from(ctx.full_name())))
    });
    program
}

#[test]
fn accepted() {
    let mut program = Command::program("prog");
    let calls = spy(&mut program.command("a").unwrap());

    program.try_parse(["a"]).unwrap();
    assert_eq!(recorded(&calls).len(), 1);
}

#[test]
fn exact_path() {
    let program = nested();

    check(
        &program,
        "a b c",
        expect![[r#"
            Some(
                Str(
                    "prog a b c",
                ),
            )
        "#]],
    );
    check(&program, "a b", expect!["No command chosen"]);
    check(&program, "a c", expect!["Too many arguments"]);
    check(&program, "c", expect!["Too many arguments"]);
    check(&program, "", expect!["No command chosen"]);

    let parsed = program.try_parse(["a", "b", "c"]).unwrap();
    let names = parsed.frames.iter().map(|it| it.full_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["prog", "prog a", "prog a b", "prog a b c"]);
    assert_eq!(parsed.matched().name, "c");
}

#[test]
fn aliases() {
    let mut program = Command::program("prog");
    let mut library = program.command("library").unwrap();
    library.alias("l").unwrap().alias("lib").unwrap();
    library.command("add <names...>").unwrap().alias("a").unwrap().action(|_| Ok(None));

    let canonical = program.try_parse(["library", "add", "x"]).unwrap();
    assert_eq!(program.try_parse(["l", "a", "x"]).unwrap(), canonical);
    assert_eq!(program.try_parse(["lib", "add", "x"]).unwrap(), canonical);
    assert_eq!(canonical.matched().full_name, "prog library add");
    assert_eq!(program.child("l").unwrap().aliases(), ["l", "lib"]);
}

#[test]
fn collisions() {
    let mut program = Command::program("prog");
    program.command("add").unwrap();
    program.command("remove").unwrap().alias("rm").unwrap();

    assert_eq!(program.command("add").unwrap_err(), StructuralError::DuplicateCommand("add".into()));
    assert_eq!(program.command("rm <x>").unwrap_err(), StructuralError::DuplicateCommand("rm".into()));

    let mut list = program.command("list").unwrap();
    assert_eq!(list.alias("add").unwrap_err(), StructuralError::DuplicateCommand("add".into()));
    assert_eq!(list.alias("-l").unwrap_err(), StructuralError::InvalidCommandName("-l".into()));
}

#[test]
fn declared_arguments() {
    let mut program = Command::program("prog");
    let calls = spy(&mut program.command("add <type> <names...>").unwrap());

    program.try_parse(["add", "book", "dune", "emma"]).unwrap();
    assert_eq!(recorded(&calls), vec![vec![Value::from("book"), Value::from(vec!["dune", "emma"])]]);
    assert_eq!(
        program.command("bad [a] <b>").unwrap_err(),
        StructuralError::RequiredAfterOptional("b".into())
    );
}

#[test]
fn options_bind_to_their_own_command() {
    let mut program = Command::program("prog");
    program.option("-v, --verbose", "").unwrap();
    program.command("sub [x]").unwrap().option("-f, --force", "").unwrap().action(|_| Ok(None));

    let parsed = program.try_parse(["-v", "sub", "-f", "x"]).unwrap();
    assert_eq!(parsed.frame("prog").unwrap().opts["v"], true);
    assert_eq!(parsed.matched().opts.keys().collect::<Vec<_>>(), ["f"]);
    assert_eq!(parsed.args(), strs(&["x"]));

    check(&program, "sub -v", expect!["Unknown option '-v'"]);
}

#[test]
fn root_with_children_and_action() {
    let mut program = Command::program("prog");
    program.arguments("[x]").unwrap().action(|_| Ok(Some(Value::from("root"))));
    program.command("sub").unwrap().action(|_| Ok(Some(Value::from("sub"))));

    assert_eq!(program.try_parse(Vec::<String>::new()).unwrap().value(), Some(Value::from("root")));
    assert_eq!(program.try_parse(["sub"]).unwrap().value(), Some(Value::from("sub")));
    assert_eq!(program.try_parse(["other"]).unwrap().value(), Some(Value::from("root")));
}

#[test]
fn command_with_setup() {
    let mut program = Command::program("prog");
    program
        .command_with("remove <names...>", Some("Remove libraries"), |cmd| {
            cmd.alias("r")?.option("-f, --force", "")?;
            Ok(())
        })
        .unwrap();

    let remove = program.child("r").unwrap();
    assert_eq!(remove.description_text(), Some("Remove libraries"));
    assert_eq!(remove.options().len(), 1);
    assert!(program.try_parse(["r", "-f", "x"]).is_ok());

    let err = program.command_with("x", None, |cmd| {
        cmd.alias("y")?.arguments("<a> <a...> <b>")?;
        Ok(())
    });
    assert_eq!(err.unwrap_err(), StructuralError::VariadicNotLast("a".into()));
    assert!(program.child("x").is_none());
    assert!(program.child("y").is_none());
    assert_eq!(program.children().len(), 1);

    program.command("x").unwrap().alias("y").unwrap();
    assert_eq!(program.child("y").unwrap().name(), "x");
}

#[test]
fn inherited_params() {
    let mut program = Command::program("prog");
    program.parameter("env", "prod").parameter("depth", 0i64);
    let mut sub = program.command("sub").unwrap();
    sub.parameter("depth", 1i64);
    sub.command("leaf").unwrap().action(|ctx| {
        Ok(Some(Value::List(vec![ctx.param("env").cloned().unwrap(), ctx.param("depth").cloned().unwrap()])))
    });

    let parsed = program.try_parse(["sub", "leaf"]).unwrap();
    assert_eq!(parsed.value(), Some(Value::List(vec![Value::from("prod"), Value::Int(1)])));
    assert_eq!(parsed.params.len(), 2);
}

#[test]
fn idempotent() {
    let mut program = Command::program("prog");
    program.option("-v", "").unwrap().allow_unknown_options(true);
    program.command("add <names...>").unwrap().option("-p <n>", "").unwrap();

    let args = ["-v", "--x", "add", "-p", "1", "a", "b"];
    let first = program.try_parse(args).unwrap();
    let second = program.try_parse(args).unwrap();
    assert_eq!(first, second);

    let third = program.try_parse(["add", "c"]).unwrap();
    assert!(third.frame("prog").unwrap().opts.is_empty());
    assert!(third.frame("prog").unwrap().unknown_opts.is_empty());
    assert_eq!(third.args(), [Value::from(vec!["c"])]);
}

#[test]
fn ancestor_frames() {
    let captured = Arc::new(Captured::default());
    let mut program = Command::program("prog");
    program.option("-v", "").unwrap().shared_logger(captured.clone());
    program.command("sub <x>").unwrap().action(|ctx| {
        assert!(ctx.ancestor("nope").is_none());
        assert_eq!(ctx.ancestor("prog sub").unwrap().args, ctx.args());
        let root = ctx.ancestor("prog").unwrap();
        if root.opts.is_empty() {
            ctx.error(&format!("{}: quiet", ctx.full_name()));
        }
        Ok(root.opts.get("v").cloned())
    });

    let parsed = program.parse(["-v", "sub", "a"]).unwrap().unwrap();
    assert_eq!(parsed.value(), Some(Value::Bool(true)));
    assert_eq!(captured.errors(), "");

    let parsed = program.parse(["sub", "a"]).unwrap().unwrap();
    assert_eq!(parsed.value(), Some(Value::List(strs(&["a"]))));
    assert_eq!(captured.errors(), "prog sub: quiet\n");
}

#[test]
fn handler_errors() {
    let mut program = Command::program("prog");
    program.command("boom").unwrap().action(|_| anyhow::bail!("boom"));
    program.command("usage").unwrap().action(|_| Err(ParseError::TooManyArguments.into()));
    let captured = Captured::default();
    program.logger(captured.clone());

    let err = program.parse(["boom"]).unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert!(matches!(program.try_parse(["boom"]), Err(Error::Handler(_))));

    assert!(program.parse(["usage"]).unwrap().is_none());
    assert_eq!(captured.errors(), "Error: Too many arguments\n");
}

#[test]
fn help_command() {
    let mut program = Command::program("prog");
    program.command_help(None).unwrap();
    program.command("add <x>").unwrap().description("Add things");
    let captured = Captured::default();
    program.logger(captured.clone());

    program.parse(["help", "add"]).unwrap();
    expect![[r#"
        Usage: prog add <x>
          Add things
    "#]]
    .assert_eq(&captured.output());
}
