// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folder lifecycle — input checks, creating and clearing the output and temp
// folders before a run, and the directory snapshots every stage works from.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::{debug, warn};

use bookcrop_core::PageFile;
use bookcrop_core::config::Locations;
use bookcrop_core::error::{BookcropError, Result};

use crate::state::RunState;

/// Asks the user before anything is deleted.
pub trait Confirm {
    /// Whether the existing contents of `folder` may be deleted.
    fn confirm_clear(&self, folder: &Path) -> Result<bool>;
}

/// Interactive `[Y/N]` prompt on the terminal.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm_clear(&self, folder: &Path) -> Result<bool> {
        warn!(
            "Folder \"{}\" contains files. Do you want to delete those files and continue?",
            folder.display()
        );
        let mut stdout = io::stdout().lock();
        write!(stdout, "[Y/N]: ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Non-interactive consent, for `--yes` and scripted runs.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm_clear(&self, folder: &Path) -> Result<bool> {
        debug!(folder = %folder.display(), "Clearing folder without asking");
        Ok(true)
    }
}

/// Check the input folder and ready the output and temp folders.
///
/// Returns the fresh run state on success. Overlapping folders are rejected
/// before anything is created or cleared. A declined prompt yields
/// `BookcropError::Declined` and nothing is deleted.
pub fn prepare(locations: &Locations, confirm: &dyn Confirm) -> Result<RunState> {
    locations.validate()?;
    check_input(&locations.input)?;
    ready_folder(&locations.output, "Output", confirm)?;
    ready_folder(&locations.working, "Temp", confirm)?;
    Ok(RunState::new(locations.clone()))
}

/// The input folder must exist and hold at least one file.
pub fn check_input(input: &Path) -> Result<()> {
    if !input.is_dir() {
        return Err(BookcropError::InputMissing(input.to_path_buf()));
    }
    if list_pages(input)?.is_empty() {
        return Err(BookcropError::InputEmpty(input.to_path_buf()));
    }
    Ok(())
}

/// Make sure `folder` exists and is empty, asking before clearing it.
fn ready_folder(folder: &Path, label: &str, confirm: &dyn Confirm) -> Result<()> {
    if !folder.exists() {
        debug!("{label} folder \"{}\" does not exist. Creating it", folder.display());
        fs::create_dir_all(folder)?;
        return Ok(());
    }
    if !folder.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{label} folder \"{}\" is not a directory", folder.display()),
        )
        .into());
    }
    if fs::read_dir(folder)?.next().is_none() {
        return Ok(());
    }
    if !confirm.confirm_clear(folder)? {
        return Err(BookcropError::Declined(folder.to_path_buf()));
    }
    clear_contents(folder)
}

/// Delete everything inside `folder`, keeping the folder itself.
fn clear_contents(folder: &Path) -> Result<()> {
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        debug!("Deleting file: {}", path.display());
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Snapshot of the regular files in `dir`, sorted by name.
///
/// Stages derive geometry and partitions from this list, so it must not depend
/// on the order the filesystem happens to enumerate entries in. Names that are
/// not valid UTF-8 are skipped with a warning.
pub fn list_pages(dir: &Path) -> Result<Vec<PageFile>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "Skipping file with a non UTF-8 name"),
        }
    }
    names.sort();
    Ok(names
        .into_iter()
        .map(|name| PageFile::new(dir, name))
        .collect())
}

/// Copy `page` unchanged into `dest`, keeping its name.
pub fn copy_page(page: &PageFile, dest: &Path) -> Result<()> {
    debug!("Copying file {}", page.name());
    fs::copy(page.path(), page.in_dir(dest).path())?;
    Ok(())
}

/// Copy every file of `from` into `to`. Returns how many were copied.
pub fn copy_all(from: &Path, to: &Path) -> Result<usize> {
    let pages = list_pages(from)?;
    for page in &pages {
        copy_page(page, to)?;
    }
    Ok(pages.len())
}
