//! # Query Engine
//!
//! Read-only operations over the catalog. Every call reloads the full record
//! set from the store and applies one predicate or aggregation by linear scan.
//!
//! Range and threshold filters answer with an empty list when nothing
//! matches. `genre_stats` is the one aggregate that treats an empty match set
//! as `not_found`, because an average over nothing has no meaning.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use super::errors::{CatalogError, CatalogResult};
use super::record::MovieRecord;
use super::store::RecordStore;

// ==================
// Filters
// ==================

/// Year predicate. `Between` bounds are exclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFilter {
    Exact(i32),
    After(i32),
    Before(i32),
    Between { from: i32, to: i32 },
}

impl YearFilter {
    pub fn matches(&self, year: i32) -> bool {
        match *self {
            YearFilter::Exact(y) => year == y,
            YearFilter::After(y) => year > y,
            YearFilter::Before(y) => year < y,
            YearFilter::Between { from, to } => from < year && year < to,
        }
    }
}

/// Rating predicate. `Between` bounds are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingFilter {
    Exact(f64),
    AtLeast(f64),
    AtMost(f64),
    Between { from: f64, to: f64 },
}

impl RatingFilter {
    pub fn matches(&self, rating: f64) -> bool {
        match *self {
            RatingFilter::Exact(r) => rating == r,
            RatingFilter::AtLeast(r) => rating >= r,
            RatingFilter::AtMost(r) => rating <= r,
            RatingFilter::Between { from, to } => rating >= from && rating <= to,
        }
    }
}

/// Runtime predicate in minutes, inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationFilter {
    AtLeast(u32),
    AtMost(u32),
    Between { min: u32, max: u32 },
}

impl DurationFilter {
    pub fn matches(&self, minutes: u32) -> bool {
        match *self {
            DurationFilter::AtLeast(min) => minutes >= min,
            DurationFilter::AtMost(max) => minutes <= max,
            DurationFilter::Between { min, max } => minutes >= min && minutes <= max,
        }
    }

    pub fn min(&self) -> Option<u32> {
        match *self {
            DurationFilter::AtLeast(min) | DurationFilter::Between { min, .. } => Some(min),
            DurationFilter::AtMost(_) => None,
        }
    }

    pub fn max(&self) -> Option<u32> {
        match *self {
            DurationFilter::AtMost(max) | DurationFilter::Between { max, .. } => Some(max),
            DurationFilter::AtLeast(_) => None,
        }
    }
}

/// Case-insensitive substring predicate over one text column
#[derive(Debug, Clone)]
struct TextMatch {
    needle: String,
}

impl TextMatch {
    fn new(term: &str, what: &str) -> CatalogResult<Self> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(CatalogError::validation(format!(
                "A {} search term is required",
                what
            )));
        }
        Ok(Self { needle })
    }

    fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }
}

// ==================
// Sorting and paging
// ==================

/// Sort order applied before pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Oldest first
    Year,
    /// Highest rated first
    Rating,
}

impl SortKey {
    pub fn parse(value: &str) -> CatalogResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "year" => Ok(SortKey::Year),
            "rating" | "imdb_rating" => Ok(SortKey::Rating),
            other => Err(CatalogError::validation(format!(
                "Invalid sort key '{}': expected 'year' or 'rating'",
                other
            ))),
        }
    }

    /// Stable sort in place
    pub fn sort(&self, records: &mut [MovieRecord]) {
        match self {
            SortKey::Year => records.sort_by_key(|r| r.year),
            SortKey::Rating => records.sort_by(|a, b| b.imdb_rating.total_cmp(&a.imdb_rating)),
        }
    }
}

/// Validated pagination request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
    pub sort: Option<SortKey>,
}

impl PageRequest {
    /// Parses raw parameters. `page` and `limit` are required integers >= 1.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        sort: Option<&str>,
    ) -> CatalogResult<Self> {
        let page = parse_positive("page", page)?;
        let limit = parse_positive("limit", limit)?;
        let sort = match sort.map(str::trim) {
            None | Some("") => None,
            Some(key) => Some(SortKey::parse(key)?),
        };
        Ok(Self { page, limit, sort })
    }

    /// Half-open index range of this page, clamped to `total`
    fn bounds(&self, total: usize) -> (usize, usize) {
        let start = (self.page - 1).saturating_mul(self.limit).min(total);
        let end = start.saturating_add(self.limit).min(total);
        (start, end)
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> CatalogResult<usize> {
    let raw = raw.ok_or_else(|| {
        CatalogError::validation(format!("`{}` is required and must be an integer >= 1", name))
    })?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(CatalogError::validation(format!(
            "`{}` must be an integer >= 1, got '{}'",
            name, raw
        ))),
    }
}

// ==================
// Results
// ==================

/// One page of the catalog
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    #[serde(rename = "pagina")]
    pub page: usize,
    pub total: usize,
    #[serde(rename = "peliculas")]
    pub movies: Vec<MovieRecord>,
}

/// Duration filter envelope: bounds used, match count, matches
#[derive(Debug, Clone, Serialize)]
pub struct DurationReport {
    #[serde(rename = "minutosMinimos", skip_serializing_if = "Option::is_none")]
    pub min_minutes: Option<u32>,
    #[serde(rename = "minutosMaximos", skip_serializing_if = "Option::is_none")]
    pub max_minutes: Option<u32>,
    pub total: usize,
    #[serde(rename = "peliculas")]
    pub movies: Vec<MovieRecord>,
}

/// Catalog-wide figures
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_movies: usize,
    pub total_genres: BTreeMap<String, usize>,
    pub total_directors: usize,
    pub total_actors: usize,
}

/// Aggregates over the movies of one genre
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreStats {
    #[serde(rename = "totalPeliculas")]
    pub total: usize,
    #[serde(rename = "promedioDuracion")]
    pub mean_runtime: f64,
    #[serde(rename = "promedioRating")]
    pub mean_rating: f64,
}

// ==================
// Pure operations
// ==================

/// Exact id match, or case-insensitive title substring; first hit wins.
pub fn find_by_id_or_title<'a>(records: &'a [MovieRecord], term: &str) -> Option<&'a MovieRecord> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .find(|r| r.id == term || r.title.to_lowercase().contains(&needle))
}

/// Counts per individual genre tag
pub fn genre_counts(records: &[MovieRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for genre in records.iter().flat_map(MovieRecord::genres) {
        *counts.entry(genre.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Distinct genre tags in first-seen order
pub fn distinct_genres(records: &[MovieRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .flat_map(MovieRecord::genres)
        .filter(|g| seen.insert(*g))
        .map(str::to_string)
        .collect()
}

pub fn metrics(records: &[MovieRecord]) -> Metrics {
    let directors: HashSet<&str> = records.iter().map(|r| r.director.trim()).collect();
    let actors: HashSet<&str> = records.iter().flat_map(MovieRecord::actor_names).collect();

    Metrics {
        total_movies: records.len(),
        total_genres: genre_counts(records),
        total_directors: directors.len(),
        total_actors: actors.len(),
    }
}

/// Count and means over an already-filtered set
pub fn genre_stats(matches: &[MovieRecord]) -> CatalogResult<GenreStats> {
    if matches.is_empty() {
        return Err(CatalogError::not_found("No movies found for that genre"));
    }
    let total = matches.len();
    let runtime: f64 = matches.iter().map(|r| f64::from(r.runtime_minutes)).sum();
    let rating: f64 = matches.iter().map(|r| r.imdb_rating).sum();

    Ok(GenreStats {
        total,
        mean_runtime: runtime / total as f64,
        mean_rating: rating / total as f64,
    })
}

/// Sorts then slices
pub fn paginate(mut records: Vec<MovieRecord>, request: &PageRequest) -> Page {
    if let Some(key) = request.sort {
        key.sort(&mut records);
    }
    let total = records.len();
    let (start, end) = request.bounds(total);
    let movies = records.drain(start..end).collect();

    Page {
        page: request.page,
        total,
        movies,
    }
}

// ==================
// Engine
// ==================

/// Read side of the catalog
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<RecordStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> CatalogResult<Vec<MovieRecord>> {
        self.store.load_all()
    }

    pub fn find_by_id_or_title(&self, term: &str) -> CatalogResult<Option<MovieRecord>> {
        let records = self.store.load_all()?;
        Ok(find_by_id_or_title(&records, term).cloned())
    }

    pub fn by_genre(&self, term: &str) -> CatalogResult<Vec<MovieRecord>> {
        let pred = TextMatch::new(term, "genre")?;
        self.select(|r| pred.matches(&r.genre))
    }

    pub fn by_director(&self, term: &str) -> CatalogResult<Vec<MovieRecord>> {
        let pred = TextMatch::new(term, "director")?;
        self.select(|r| pred.matches(&r.director))
    }

    pub fn by_actor(&self, term: &str) -> CatalogResult<Vec<MovieRecord>> {
        let pred = TextMatch::new(term, "actor")?;
        self.select(|r| pred.matches(&r.actors))
    }

    pub fn by_year(&self, filter: YearFilter) -> CatalogResult<Vec<MovieRecord>> {
        self.select(|r| filter.matches(r.year))
    }

    pub fn by_rating(&self, filter: RatingFilter) -> CatalogResult<Vec<MovieRecord>> {
        self.select(|r| filter.matches(r.imdb_rating))
    }

    pub fn by_duration(&self, filter: DurationFilter) -> CatalogResult<DurationReport> {
        let movies = self.select(|r| filter.matches(r.runtime_minutes))?;
        Ok(DurationReport {
            min_minutes: filter.min(),
            max_minutes: filter.max(),
            total: movies.len(),
            movies,
        })
    }

    pub fn page(&self, request: &PageRequest) -> CatalogResult<Page> {
        Ok(paginate(self.store.load_all()?, request))
    }

    pub fn genre_counts(&self) -> CatalogResult<BTreeMap<String, usize>> {
        Ok(genre_counts(&self.store.load_all()?))
    }

    pub fn genres(&self) -> CatalogResult<Vec<String>> {
        Ok(distinct_genres(&self.store.load_all()?))
    }

    pub fn metrics(&self) -> CatalogResult<Metrics> {
        Ok(metrics(&self.store.load_all()?))
    }

    pub fn genre_stats(&self, term: &str) -> CatalogResult<GenreStats> {
        genre_stats(&self.by_genre(term)?)
    }

    fn select<F>(&self, pred: F) -> CatalogResult<Vec<MovieRecord>>
    where
        F: Fn(&MovieRecord) -> bool,
    {
        let records = self.store.load_all()?;
        Ok(records.into_iter().filter(|r| pred(r)).collect())
    }
}
