// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book Cropper — batch crop, rotate, rename and convert scanned page images.
//
// Entry point. Parses flags, initialises logging, prepares the folders and
// drives one pipeline run on a multi-threaded runtime.

mod cli;
mod logging;

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use bookcrop_core::error::{BookcropError, Result};
use bookcrop_pipeline::{AssumeYes, Confirm, Pipeline, StdinConfirm};

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug, cli.time_marks);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(BookcropError::Declined(folder)) => {
            info!("Aborted, \"{}\" left untouched", folder.display());
            ExitCode::SUCCESS
        }
        Err(err) if err.is_configuration() => {
            error!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "Run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config()?;
    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let pipeline = Pipeline::new(config)?;
    let confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };
    let state = pipeline.prepare(confirm.as_ref())?;
    info!(run = %state.id(), "Book Cropper starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(pipeline.run(state))?;

    if let Some(path) = &cli.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }
    for (stage, failure) in report.failures() {
        error!(%stage, file = %failure.name, error = %failure.error, "Page not processed");
    }
    report.ensure_complete()
}
