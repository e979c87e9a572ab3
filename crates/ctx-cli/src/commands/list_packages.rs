use std::path::Path;
use std::str::FromStr;

use ctx_output::OutputFormat;

pub fn run(path: &Path, format: &str) -> i32 {
    let format = match OutputFormat::from_str(format) {
        Ok(f) => f,
        Err(message) => {
            eprintln!("error: {message}");
            return 1;
        }
    };
    // No language bindings ship with the core; discovery here only reports
    // what a fixture or embedder binding would find, matching §4.M.
    let packages = ctx_index::discover_packages(path, &[]);
    print!("{}", ctx_output::format_packages(&packages, format));
    0
}
