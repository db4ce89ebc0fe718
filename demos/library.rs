//! A small library manager.
//!
//! ```console
//! $ cargo run --example library -- library add book dune emma -p 2 --shelf 4
//! $ cargo run --example library -- l r dune --force
//! $ RUST_LOG=argtree=trace cargo run --example library -- help library
//! ```

use argtree::{parse, Command, OptionSet, TracingLogger, UnknownOption, Value, ValueParser};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let program = program()?;
    if let Some(parsed) = program.parse_env()? {
        tracing::debug!(command = %parsed.matched().full_name, "done");
    }
    Ok(())
}

fn program() -> anyhow::Result<Command> {
    let mut program = Command::program_from_env();
    program.version("0.1.0").description("CLI parser");
    if std::env::var_os("RUST_LOG").is_some() {
        program.logger(TracingLogger);
    }
    program.option_help(None, None)?.option_version(None, None)?.command_help(None)?;

    let mut verbose = OptionSet::new();
    verbose.option("-v, --verbose", "Set logging to verbose")?;

    let mut library = program.command("library")?;
    library.alias("l")?.description("Library functionality").option_help(None, None)?.command_help(None)?;

    library
        .command("add <type> <names...>")?
        .alias("a")?
        .argument("names", ValueParser::pattern("^[a-zA-Z]+$")?)?
        .description("Add <type> libraries with <names...>")
        .use_options(&verbose)?
        .option_def(
            argtree::OptionDef::new("-p, --priority <level>")?
                .with_description("Priority of libraries added")
                .with_parser(parse::int()),
        )?
        .option_help(None, None)?
        .allow_unknown_options(true)
        .unknown_option_handler(|_| Ok(Some(UnknownOption::with_argument("<value>"))))
        .action(|ctx| {
            println!("add {} {}", show(ctx.arg(0)), show(ctx.arg(1)));
            println!("{:?}", ctx.opts());
            println!("{:?}", ctx.unknown_opts());
            Ok(None)
        });

    library
        .command("remove <names...>")?
        .alias("r")?
        .description("Remove libraries with names")
        .use_options(&verbose)?
        .option("-f, --force", "")?
        .option_help(None, None)?
        .action(|ctx| {
            println!("remove {}", show(ctx.arg(0)));
            println!("{:?}", ctx.opts());
            Ok(None)
        });

    Ok(program)
}

fn show(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_default()
}
