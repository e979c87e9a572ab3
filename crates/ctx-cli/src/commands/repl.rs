//! Interactive REPL: `.schema`, `.tables`, `.stats`, `.refresh`, `.quit`,
//! plus arbitrary SQL lines.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use ctx_output::OutputFormat;
use ctx_watch::Context;

const TABLE_NAMES: &[&str] = &["symbols", "occurrences", "relationships"];

pub fn run(ctx: &Context, format: &str) -> i32 {
    let format = OutputFormat::from_str(format).unwrap_or(OutputFormat::Text);
    let stdin = io::stdin();
    let mut lock = stdin.lock();
    let mut line = String::new();

    loop {
        print!("ctx> ");
        if io::stdout().flush().is_err() {
            return 1;
        }
        line.clear();
        let Ok(n) = lock.read_line(&mut line) else {
            return 1;
        };
        if n == 0 {
            return 0; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ".quit" | ".exit" => return 0,
            ".schema" => print!("{}", ctx_output::format_schema(format)),
            ".tables" => println!("{}", TABLE_NAMES.join("\n")),
            ".stats" => print!("{}", ctx_output::format_stats(&ctx.stats(), format)),
            ".refresh" => match ctx.refresh_all() {
                Ok(()) => println!("refreshed"),
                Err(err) => eprintln!("refresh error: {err}"),
            },
            sql => match ctx.sql(sql, &[]) {
                Ok(result) => print!("{}", ctx_output::format_query_result(&result, format)),
                Err(err) => eprintln!("sql error: {err}"),
            },
        }
    }
}
