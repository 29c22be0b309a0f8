// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod demo;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::MemoryRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;
use vetdesk_app::DashboardState;

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
            "load config {}; run `vetdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let tui_options = config.tui_options()?;

    logging::init(config.log_level(), config.log_file().as_deref())?;

    let patients = if options.demo {
        demo::demo_roster()
    } else {
        match options.roster_path.clone().or_else(|| config.roster_path()) {
            Some(path) => runtime::load_roster(&path).with_context(|| {
                format!(
                    "load roster {} -- pass --roster or set [data].roster_path to a valid file",
                    path.display()
                )
            })?,
            None => Vec::new(),
        }
    };
    let mut runtime = MemoryRuntime::new(patients);
    info!(
        patients = runtime.patient_count(),
        demo = options.demo,
        "vetdesk starting"
    );
    if options.check_only {
        return Ok(());
    }

    let mut state = DashboardState::default();
    vetdesk_tui::run_app(&mut state, &mut runtime, tui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    roster_path: Option<PathBuf>,
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
        roster_path: None,
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
            "--roster" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--roster requires a JSON file path"))?;
                options.roster_path = Some(PathBuf::from(value.as_ref()));
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

    if options.demo && options.roster_path.is_some() {
        return Err(anyhow::anyhow!(
            "--demo and --roster both pick the starting roster; pass only one"
        ));
    }

    Ok(options)
}

fn print_help() {
    println!("vetdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with a seeded demo roster");
    println!("  --roster <path>          Import patients from a JSON roster");
    println!("  --check                  Validate config and roster, then exit");
    println!("  --help                   Show this help");
}
