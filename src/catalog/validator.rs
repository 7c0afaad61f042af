//! Payload validation for catalog writes
//!
//! Validation semantics:
//! - Only declared fields may appear
//! - Field types must match exactly (no string-to-number coercion)
//! - Range checks run on typed values
//! - Uniqueness is checked last, against the full current record set
//!
//! The validator never touches storage; callers hand it the records to
//! check against.

use chrono::Datelike;
use serde_json::{Map, Value};

use super::errors::{CatalogError, CatalogResult};
use super::record::{is_valid_id, is_valid_rating, MovieRecord, COLUMNS, MIN_YEAR};

/// Fields that may change after creation
pub const MUTABLE_FIELDS: [&str; 3] = ["year", "imdb_rating", "runtime_minutes"];

/// Identity and content fields, fixed at creation
pub const IMMUTABLE_FIELDS: [&str; 6] = ["id", "title", "genre", "actors", "director", "plot"];

/// Typed partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoviePatch {
    pub year: Option<i32>,
    pub imdb_rating: Option<f64>,
    pub runtime_minutes: Option<u32>,
}

impl MoviePatch {
    /// Shallow merge, patch wins
    pub fn apply(&self, record: &mut MovieRecord) {
        if let Some(year) = self.year {
            record.year = year;
        }
        if let Some(rating) = self.imdb_rating {
            record.imdb_rating = rating;
        }
        if let Some(runtime) = self.runtime_minutes {
            record.runtime_minutes = runtime;
        }
    }
}

/// Validates create and update payloads.
#[derive(Debug, Clone, Default)]
pub struct MovieValidator {
    current_year: Option<i32>,
}

impl MovieValidator {
    /// Validator that reads the current year from the local clock.
    pub fn new() -> Self {
        Self { current_year: None }
    }

    /// Validator with a fixed notion of "this year".
    pub fn with_current_year(year: i32) -> Self {
        Self {
            current_year: Some(year),
        }
    }

    fn max_year(&self) -> i64 {
        i64::from(
            self.current_year
                .unwrap_or_else(|| chrono::Local::now().year()),
        )
    }

    /// Validates a creation payload and returns the typed record.
    ///
    /// # Errors
    ///
    /// - `validation` for unknown fields, bad types, or out-of-range values
    /// - `duplicate` if the id or (case-insensitive) title is already taken
    pub fn validate_create(
        &self,
        payload: &Value,
        existing: &[MovieRecord],
    ) -> CatalogResult<MovieRecord> {
        let obj = as_object(payload)?;

        let unknown: Vec<String> = obj
            .keys()
            .filter(|k| !COLUMNS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(CatalogError::UnknownField(unknown));
        }

        let id = optional_str(obj, "id")?.unwrap_or_default();
        if id.is_empty() || !is_valid_id(id) {
            return Err(CatalogError::validation(
                "Invalid id: expected IMDb format 'tt' followed by digits",
            ));
        }

        let title = required_text(obj, "title")?;
        let genre = required_text(obj, "genre")?;
        let director = required_text(obj, "director")?;
        let actors = required_text(obj, "actors")?;
        let plot = required_text(obj, "plot")?;

        let record = MovieRecord {
            id: id.to_string(),
            title: title.to_string(),
            year: self.check_year(obj.get("year"))?,
            genre: genre.to_string(),
            director: director.to_string(),
            actors: actors.to_string(),
            plot: plot.to_string(),
            imdb_rating: check_rating(obj.get("imdb_rating"))?,
            runtime_minutes: check_runtime(obj.get("runtime_minutes"))?,
        };

        check_unique(&record, existing)?;
        Ok(record)
    }

    /// Validates a partial update payload.
    ///
    /// Unknown keys are rejected before immutable ones, so a payload with
    /// both reports the unknown key.
    pub fn validate_update(&self, payload: &Value) -> CatalogResult<MoviePatch> {
        let obj = as_object(payload)?;

        let unknown: Vec<String> = obj
            .keys()
            .filter(|k| {
                !MUTABLE_FIELDS.contains(&k.as_str()) && !IMMUTABLE_FIELDS.contains(&k.as_str())
            })
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(CatalogError::UnknownField(unknown));
        }

        if let Some(field) = IMMUTABLE_FIELDS.iter().find(|f| obj.contains_key(**f)) {
            return Err(CatalogError::ForbiddenField(field.to_string()));
        }

        let mut patch = MoviePatch::default();
        if obj.contains_key("year") {
            patch.year = Some(self.check_year(obj.get("year"))?);
        }
        if obj.contains_key("imdb_rating") {
            patch.imdb_rating = Some(check_rating(obj.get("imdb_rating"))?);
        }
        if obj.contains_key("runtime_minutes") {
            patch.runtime_minutes = Some(check_runtime(obj.get("runtime_minutes"))?);
        }
        Ok(patch)
    }

    fn check_year(&self, value: Option<&Value>) -> CatalogResult<i32> {
        let max = self.max_year();
        value
            .and_then(Value::as_i64)
            .filter(|y| (i64::from(MIN_YEAR)..=max).contains(y))
            .map(|y| y as i32)
            .ok_or_else(|| {
                CatalogError::validation(format!(
                    "Invalid year: expected an integer between {} and {}",
                    MIN_YEAR, max
                ))
            })
    }
}

fn as_object(payload: &Value) -> CatalogResult<&Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| CatalogError::validation("Request body must be a JSON object"))
}

fn optional_str<'a>(obj: &'a Map<String, Value>, field: &str) -> CatalogResult<Option<&'a str>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(CatalogError::validation(format!(
            "Field '{}' must be a string",
            field
        ))),
    }
}

fn required_text<'a>(obj: &'a Map<String, Value>, field: &str) -> CatalogResult<&'a str> {
    match optional_str(obj, field)? {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(CatalogError::validation(format!(
            "Missing required field '{}'",
            field
        ))),
    }
}

fn check_rating(value: Option<&Value>) -> CatalogResult<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|r| is_valid_rating(*r))
        .ok_or_else(|| CatalogError::validation("Invalid imdb_rating: expected a number between 0 and 10"))
}

fn check_runtime(value: Option<&Value>) -> CatalogResult<u32> {
    value
        .and_then(Value::as_u64)
        .filter(|m| *m > 0)
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| CatalogError::validation("Invalid runtime_minutes: expected an integer greater than 0"))
}

fn check_unique(record: &MovieRecord, existing: &[MovieRecord]) -> CatalogResult<()> {
    if existing.iter().any(|m| m.id == record.id) {
        return Err(CatalogError::duplicate(format!(
            "Duplicate id: a movie with id '{}' already exists",
            record.id
        )));
    }

    let title = record.title.to_lowercase();
    if existing.iter().any(|m| m.title.to_lowercase() == title) {
        return Err(CatalogError::duplicate(format!(
            "Duplicate title: a movie titled '{}' already exists",
            record.title
        )));
    }
    Ok(())
}
