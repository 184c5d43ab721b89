// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::ApiRuntime;
use std::env;
use std::fs;
use std::path::PathBuf;
use stockroom_app::{AppState, ItemCache};
use stockroom_testkit::MemoryInventory;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_SEED: u64 = 42;
const DEMO_ITEMS: usize = 1_200;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `stockroom --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let cache = ItemCache::new(config.cache_config())?;

    // Held until exit so buffered log lines reach the file.
    let _log_guard = init_logging(&config)?;

    let mut state = AppState::default();
    if options.demo {
        info!(items = DEMO_ITEMS, "starting with in-memory demo inventory");
        if options.check_only {
            return Ok(());
        }
        let mut runtime = ApiRuntime::new(MemoryInventory::seeded(DEMO_SEED, DEMO_ITEMS));
        return stockroom_tui::run_app(&mut state, &mut runtime, cache);
    }

    let client = stockroom_api::Client::new(&config.api_base_url(), config.api_timeout()?)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values or STOCKROOM_API_URL",
                options.config_path.display()
            )
        })?;
    if options.check_only {
        client.ping()?;
        println!("ok: {}", client.base_url());
        return Ok(());
    }

    info!(base_url = client.base_url(), "starting stockroom");
    let mut runtime = ApiRuntime::new(client);
    stockroom_tui::run_app(&mut state, &mut runtime, cache)
}

/// Logs go to a file because the terminal belongs to the UI. `RUST_LOG`
/// takes precedence over `[log].level`.
fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let path = config.log_file()?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_level())
            .with_context(|| format!("invalid log level {:?}", config.log_level()))?,
    };

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(guard)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("stockroom: inventory browser for a REST item API");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Browse a generated in-memory inventory");
    println!("  --check                  Validate config and reach the API");
    println!("  --help                   Show this help");
}
