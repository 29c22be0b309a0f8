// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins over the configured level.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_owned()))
}

/// Sends tracing output to `file`. Without a file nothing is installed,
/// since stdout and stderr belong to the terminal UI.
pub fn init(level: &str, file: Option<&Path>) -> Result<()> {
    let Some(path) = file else {
        return Ok(());
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {}; fix [logging].file or remove it to disable logging",
                path.display()
            )
        })?;

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(())
}
