//! Movie record and its row mapping

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::csv::Row;
use super::errors::{CatalogError, CatalogResult};

/// Column order used whenever the file is written
pub const COLUMNS: [&str; 9] = [
    "id",
    "title",
    "year",
    "genre",
    "director",
    "actors",
    "plot",
    "imdb_rating",
    "runtime_minutes",
];

/// Earliest accepted release year
pub const MIN_YEAR: i32 = 1900;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^tt\d+$").expect("static id pattern compiles"))
}

/// IMDb-style id: `tt` followed by digits
pub fn is_valid_id(id: &str) -> bool {
    id_pattern().is_match(id)
}

/// Finite and within [0, 10]
pub fn is_valid_rating(rating: f64) -> bool {
    rating.is_finite() && (0.0..=10.0).contains(&rating)
}

/// One movie as stored in the catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    pub year: i32,
    /// Comma-separated genre tags
    pub genre: String,
    pub director: String,
    /// Comma-separated actor names
    pub actors: String,
    pub plot: String,
    pub imdb_rating: f64,
    pub runtime_minutes: u32,
}

impl MovieRecord {
    /// Individual genre tags, trimmed, empty tags dropped
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        split_list(&self.genre)
    }

    /// Individual actor names, trimmed, empty names dropped
    pub fn actor_names(&self) -> impl Iterator<Item = &str> {
        split_list(&self.actors)
    }

    /// Describes the first field constraint this record breaks, if any.
    pub fn violation(&self, max_year: i32) -> Option<String> {
        if !is_valid_id(&self.id) {
            return Some(format!("invalid id '{}'", self.id));
        }

        let text = [
            ("title", &self.title),
            ("genre", &self.genre),
            ("director", &self.director),
            ("actors", &self.actors),
            ("plot", &self.plot),
        ];
        if let Some((name, _)) = text.iter().find(|(_, value)| value.trim().is_empty()) {
            return Some(format!("{} is empty", name));
        }

        if !(MIN_YEAR..=max_year).contains(&self.year) {
            return Some(format!(
                "year {} outside {}..={}",
                self.year, MIN_YEAR, max_year
            ));
        }
        if !is_valid_rating(self.imdb_rating) {
            return Some(format!("imdb_rating {} outside 0..=10", self.imdb_rating));
        }
        if self.runtime_minutes == 0 {
            return Some("runtime_minutes must be greater than 0".to_string());
        }
        None
    }

    /// Field values in `COLUMNS` order, formatted for the file
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.year.to_string(),
            self.genre.clone(),
            self.director.clone(),
            self.actors.clone(),
            self.plot.clone(),
            format_rating(self.imdb_rating),
            self.runtime_minutes.to_string(),
        ]
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Ratings are written with at least one decimal (`8.0`, `9.25`)
fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        rating.to_string()
    }
}

/// Maps header positions to record fields.
///
/// The header may list the columns in any order but must name each exactly
/// once and nothing else.
#[derive(Debug, Clone)]
pub(crate) struct ColumnMap {
    /// `positions[i]` is where `COLUMNS[i]` sits in a row
    positions: [usize; 9],
    width: usize,
}

impl ColumnMap {
    pub(crate) fn from_header(header: &Row) -> CatalogResult<Self> {
        let mut positions = [usize::MAX; 9];

        for (pos, name) in header.fields.iter().enumerate() {
            let name = name.trim();
            let slot = COLUMNS.iter().position(|c| *c == name).ok_or_else(|| {
                CatalogError::storage(format!(
                    "line {}: unknown header column '{}'",
                    header.line, name
                ))
            })?;

            if positions[slot] != usize::MAX {
                return Err(CatalogError::storage(format!(
                    "line {}: duplicate header column '{}'",
                    header.line, name
                )));
            }
            positions[slot] = pos;
        }

        if let Some(missing) = positions.iter().position(|p| *p == usize::MAX) {
            return Err(CatalogError::storage(format!(
                "line {}: header is missing column '{}'",
                header.line, COLUMNS[missing]
            )));
        }

        Ok(Self {
            positions,
            width: header.fields.len(),
        })
    }

    /// Mapping for rows written in `COLUMNS` order without a header
    pub(crate) fn canonical() -> Self {
        Self {
            positions: [0, 1, 2, 3, 4, 5, 6, 7, 8],
            width: COLUMNS.len(),
        }
    }

    /// Converts a data row into a typed record.
    pub(crate) fn to_record(&self, row: &Row) -> CatalogResult<MovieRecord> {
        if row.fields.len() != self.width {
            return Err(CatalogError::storage(format!(
                "line {}: expected {} columns, found {}",
                row.line,
                self.width,
                row.fields.len()
            )));
        }

        let get = |column: usize| row.fields[self.positions[column]].as_str();

        Ok(MovieRecord {
            id: get(0).to_string(),
            title: get(1).to_string(),
            year: parse_column(row.line, COLUMNS[2], get(2))?,
            genre: get(3).to_string(),
            director: get(4).to_string(),
            actors: get(5).to_string(),
            plot: get(6).to_string(),
            imdb_rating: parse_column(row.line, COLUMNS[7], get(7))?,
            runtime_minutes: parse_column(row.line, COLUMNS[8], get(8))?,
        })
    }
}

fn parse_column<T: std::str::FromStr>(line: usize, column: &str, raw: &str) -> CatalogResult<T> {
    raw.trim().parse().map_err(|_| {
        CatalogError::storage(format!(
            "line {}: invalid {} value '{}'",
            line, column, raw
        ))
    })
}

/// True when a row looks like the header (first cell is `id`)
pub(crate) fn is_header(row: &Row) -> bool {
    row.fields.first().map(|f| f.trim()) == Some(COLUMNS[0])
}
