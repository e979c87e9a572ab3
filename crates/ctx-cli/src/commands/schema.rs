use std::str::FromStr;

use ctx_output::OutputFormat;

pub fn run(format: &str) -> i32 {
    match OutputFormat::from_str(format) {
        Ok(format) => {
            print!("{}", ctx_output::format_schema(format));
            0
        }
        Err(message) => {
            eprintln!("error: {message}");
            1
        }
    }
}
