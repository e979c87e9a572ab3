//! `ctx` CLI — opens a root, exposes its SCIP-derived symbol/occurrence/
//! relationship tables as SQL. See `ctx --help` for usage.

use clap::Parser;
use ctx_watch::{Context, OpenOptions};

mod cli_args;
mod commands;

use cli_args::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.query.as_deref() == Some("schema") {
        std::process::exit(commands::schema::run(&cli.format));
    }
    if cli.query.as_deref() == Some("list-packages") {
        let root = cli.extra.clone().unwrap_or_else(|| cli.project.clone());
        std::process::exit(commands::list_packages::run(&root, &cli.format));
    }

    // `Context::open` spawns background tasks (debounced saves, the update
    // fan-in, the watcher's dispatch loop), so everything that touches it
    // must run inside a tokio runtime, matching the teacher's `serve`
    // command's `Runtime::new().block_on(...)` shape.
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("ctx: failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };

    let exit_code = rt.block_on(run(cli));
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    let options = OpenOptions {
        watch: cli.watch,
        use_cache: !cli.no_cache,
        load_dependencies: cli.with_deps,
    };

    // No language binding ships with the core (§4.M); the CLI drives the
    // façade with whatever an embedder registers, none by default.
    let ctx = match Context::open(cli.project.clone(), options, Vec::new()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("failed to open {}: {err}", cli.project.display());
            return 1;
        }
    };

    let exit_code = if cli.interactive {
        commands::repl::run(&ctx, &cli.format)
    } else if cli.watch {
        let Some(sql) = cli.query.as_deref() else {
            eprintln!("error: -w/--watch requires a query");
            return 1;
        };
        commands::query::run_watch(&ctx, sql, &cli.format).await
    } else if let Some(sql) = cli.query.as_deref() {
        commands::query::run_once(&ctx, sql, &cli.format)
    } else {
        eprintln!("error: provide a query, or pass -i/-w, `schema`, or `list-packages`");
        1
    };

    ctx.dispose();
    exit_code
}
