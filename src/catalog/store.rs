//! Record store backed by a single CSV file
//!
//! The store is the only component that touches the file. It keeps nothing
//! in memory: every load reads the file again.
//!
//! Every write, appends included, goes through a sibling temp file that is
//! fsynced and renamed over the original, so a reader never observes a
//! half-written catalog.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Datelike;

use super::csv::{encode_row, parse_document};
use super::errors::{CatalogError, CatalogResult};
use super::record::{is_header, ColumnMap, MovieRecord, COLUMNS};

/// File-backed movie store
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut temp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "movies.csv".into());
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        Self { path, temp_path }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates a header-only file if none exists yet.
    ///
    /// Returns `true` when a file was created.
    pub fn initialize(&self) -> CatalogResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.replace_contents(&encode_row(&COLUMNS))?;
        Ok(true)
    }

    /// Loads every record in file order.
    ///
    /// # Errors
    ///
    /// `storage` if the file is unreadable, empty, has no valid header, or
    /// any row is malformed or breaks a field constraint.
    pub fn load_all(&self) -> CatalogResult<Vec<MovieRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            CatalogError::io(format!("Failed to read {}", self.path.display()), e)
        })?;
        parse_records(&content, false)
    }

    /// Loads records ahead of a write.
    ///
    /// Unlike [`load_all`](Self::load_all), a missing, empty or
    /// whitespace-only file holds zero records, and a file without a header
    /// is read in `COLUMNS` order. The next write restores the header.
    pub fn load_for_write(&self) -> CatalogResult<Vec<MovieRecord>> {
        parse_records(&self.read_existing()?, true)
    }

    /// Appends one record to the end of the file.
    ///
    /// Writes the header first when the file is missing or empty, and puts
    /// it in front of existing content when the file has none.
    pub fn append_one(&self, record: &MovieRecord) -> CatalogResult<()> {
        let existing = self.read_existing()?;
        let body = strip_bom(&existing);

        let mut content = String::with_capacity(body.len() + 256);
        if body.trim().is_empty() {
            content.push_str(&encode_row(&COLUMNS));
        } else {
            let has_header = parse_document(body)?.first().map(is_header).unwrap_or(false);
            if !has_header {
                content.push_str(&encode_row(&COLUMNS));
            }
            content.push_str(body);
            if !body.ends_with('\n') {
                content.push('\n');
            }
        }
        content.push_str(&encode_row(&record.to_fields()));

        self.replace_contents(&content)
    }

    /// Replaces the whole file with `records`, header included.
    pub fn rewrite_all(&self, records: &[MovieRecord]) -> CatalogResult<()> {
        let mut content = encode_row(&COLUMNS);
        for record in records {
            content.push_str(&encode_row(&record.to_fields()));
        }
        self.replace_contents(&content)
    }

    /// File content, or an empty string when the file does not exist
    fn read_existing(&self) -> CatalogResult<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(CatalogError::io(
                format!("Failed to read {}", self.path.display()),
                e,
            )),
        }
    }

    /// Write temp, fsync, rename.
    fn replace_contents(&self, content: &str) -> CatalogResult<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .map_err(|e| {
                CatalogError::io(
                    format!("Failed to create {}", self.temp_path.display()),
                    e,
                )
            })?;

        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                CatalogError::io(format!("Failed to write {}", self.temp_path.display()), e)
            })?;

        fs::rename(&self.temp_path, &self.path).map_err(|e| {
            CatalogError::io(format!("Failed to replace {}", self.path.display()), e)
        })?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    fn ensure_parent_dir(&self) -> CatalogResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                fs::create_dir_all(parent).map_err(|e| {
                    CatalogError::io(format!("Failed to create {}", parent.display()), e)
                })
            }
            _ => Ok(()),
        }
    }
}

fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Parses file content into checked records.
///
/// With `lenient` set, blank content is an empty catalog and a missing
/// header means rows are in `COLUMNS` order.
fn parse_records(content: &str, lenient: bool) -> CatalogResult<Vec<MovieRecord>> {
    let content = strip_bom(content);
    if lenient && content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows = parse_document(content)?;
    let (first, rest) = rows
        .split_first()
        .ok_or_else(|| CatalogError::storage("file is empty"))?;

    let (columns, data) = if is_header(first) {
        (ColumnMap::from_header(first)?, rest)
    } else if lenient {
        (ColumnMap::canonical(), rows.as_slice())
    } else {
        return Err(CatalogError::storage(format!(
            "line {}: missing header row",
            first.line
        )));
    };

    let max_year = chrono::Local::now().year();
    data.iter()
        .map(|row| {
            let record = columns.to_record(row)?;
            match record.violation(max_year) {
                Some(problem) => Err(CatalogError::storage(format!(
                    "line {}: {}",
                    row.line, problem
                ))),
                None => Ok(record),
            }
        })
        .collect()
}
