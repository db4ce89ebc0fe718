mod arguments;
mod commands;

use std::sync::{Arc, Mutex};

use argtree::{Command, Logger, Value};
use expect_test::Expect;

/// Snapshots the value of a parse, or its error message.
fn check(cmd: &Command, args: &str, expect: Expect) {
    let args = args.split_ascii_whitespace().collect::<Vec<_>>();
    match cmd.try_parse(args) {
        Ok(parsed) => expect.assert_debug_eq(&parsed.value()),
        Err(err) => expect.assert_eq(&err.to_string()),
    }
}

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

/// Installs an action recording the positional values it is called with.
fn spy(cmd: &mut Command) -> Calls {
    let calls = Calls::default();
    let sink = calls.clone();
    cmd.action(move |ctx| {
        sink.lock().unwrap().push(ctx.args().to_vec());
        Ok(None)
    });
    calls
}

fn recorded(calls: &Calls) -> Vec<Vec<Value>> {
    calls.lock().unwrap().clone()
}

fn strs(items: &[&str]) -> Vec<Value> {
    items.iter().map(|&it| Value::from(it)).collect()
}

/// A logger keeping everything it is given.
#[derive(Default, Clone)]
struct Captured {
    info: Arc<Mutex<String>>,
    error: Arc<Mutex<String>>,
}

impl Captured {
    fn output(&self) -> String {
        self.info.lock().unwrap().clone()
    }

    fn errors(&self) -> String {
        self.error.lock().unwrap().clone()
    }
}

impl Logger for Captured {
    fn info(&self, text: &str) {
        let mut buf = self.info.lock().unwrap();
        buf.push_str(text);
        buf.push('\n');
    }

    fn error(&self, text: &str) {
        let mut buf = self.error.lock().unwrap();
        buf.push_str(text);
        buf.push('\n');
    }
}
