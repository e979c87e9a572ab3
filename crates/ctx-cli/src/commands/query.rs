//! One-shot and watch-mode SQL query execution.

use std::str::FromStr;

use ctx_output::OutputFormat;
use ctx_watch::Context;

pub fn run_once(ctx: &Context, sql: &str, format: &str) -> i32 {
    let format = match OutputFormat::from_str(format) {
        Ok(f) => f,
        Err(message) => {
            eprintln!("error: {message}");
            return 1;
        }
    };
    match ctx.sql(sql, &[]) {
        Ok(result) => {
            print!("{}", ctx_output::format_query_result(&result, format));
            0
        }
        Err(err) => {
            eprintln!("sql error: {err}");
            2
        }
    }
}

/// Re-run `sql` once up front, then again after every index update.
pub async fn run_watch(ctx: &Context, sql: &str, format: &str) -> i32 {
    let format = match OutputFormat::from_str(format) {
        Ok(f) => f,
        Err(message) => {
            eprintln!("error: {message}");
            return 1;
        }
    };

    let mut updates = ctx.subscribe();
    loop {
        match ctx.sql(sql, &[]) {
            Ok(result) => print!("{}", ctx_output::format_query_result(&result, format)),
            Err(err) => eprintln!("sql error: {err}"),
        }
        if updates.recv().await.is_err() {
            return 0;
        }
    }
}
