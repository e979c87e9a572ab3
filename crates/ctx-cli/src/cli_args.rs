use std::path::PathBuf;

use clap::Parser;

/// `schema` and `list-packages [path]` are dispatched out of `query`/`extra`
/// rather than as `clap` subcommands, so they can share the same positional
/// slot as an ad-hoc SQL query without introducing parser ambiguity between
/// a subcommand name and a query that happens to start with the same word.
#[derive(Parser, Debug)]
#[command(name = "ctx", version, about = "Incremental, multi-package code intelligence queryable as SQL")]
pub struct Cli {
    /// One-shot SQL query, `schema`, or `list-packages`. Omit to start the
    /// interactive REPL with `-i` or watch mode with `-w`.
    pub query: Option<String>,

    /// Root path for `list-packages` (ignored otherwise)
    pub extra: Option<PathBuf>,

    /// Start an interactive REPL (.schema, .tables, .stats, .refresh, .quit)
    #[arg(short = 'i', long, conflicts_with = "watch")]
    pub interactive: bool,

    /// Re-run `query` on every index change
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Root directory to open (defaults to the current directory)
    #[arg(short = 'p', long = "project", default_value = ".")]
    pub project: PathBuf,

    /// Output format for query results and subcommands
    #[arg(short = 'f', long = "format", default_value = "text")]
    pub format: String,

    /// Skip loading the on-disk cache; re-index every file from scratch
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Attach external (sdk/framework/hosted/git) indexes if present
    #[arg(long = "with-deps")]
    pub with_deps: bool,
}
