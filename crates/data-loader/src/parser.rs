//! Parser and cleaner for the Book-Crossing CSV files.
//!
//! This module handles:
//! - Ratings.csv: User-ID,ISBN,Book-Rating
//! - Books.csv: ISBN,Book-Title,Book-Author,Year-Of-Publication,Publisher,...
//!
//! Both files are comma separated, double-quoted where a field contains a
//! comma or a line break, and start with a header row. Cleaning applies the rules the
//! engines rely on: no zero ratings, and a minimum activity per user and
//! per item.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::StringRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Rules applied to raw ratings before they become the core snapshot
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Drop "no opinion" ratings of 0
    pub drop_zero_ratings: bool,
    /// Minimum number of ratings a user must have given
    pub min_user_ratings: usize,
    /// Minimum number of ratings an item must have received
    pub min_item_ratings: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            drop_zero_ratings: true,
            min_user_ratings: 3,
            min_item_ratings: 3,
        }
    }
}

impl CleaningConfig {
    /// Configure minimum ratings per user (default: 3)
    pub fn with_min_user_ratings(mut self, min: usize) -> Self {
        self.min_user_ratings = min;
        self
    }

    /// Configure minimum ratings per item (default: 3)
    pub fn with_min_item_ratings(mut self, min: usize) -> Self {
        self.min_item_ratings = min;
        self
    }
}

/// Read a whole file, replacing invalid UTF-8 sequences
fn read_to_string_lossy(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One Books.csv row; columns past the publisher are ignored
#[derive(Debug, Deserialize)]
struct BookRow {
    item_id: String,
    title: Option<String>,
    author: Option<String>,
    /// A few rows hold a publisher name here instead of a year
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year: Option<u16>,
    publisher: Option<String>,
}

const RATING_COLUMNS: [&str; 3] = ["user_id", "item_id", "rating"];
const BOOK_COLUMNS: [&str; 5] = ["item_id", "title", "author", "year", "publisher"];

/// Reader over CSV text: header row skipped, ragged rows allowed, fields trimmed
fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn error_line(err: &csv::Error) -> usize {
    err.position().map(|pos| pos.line() as usize).unwrap_or(0)
}

/// Data records of a CSV document as (line number, record).
///
/// Blank lines are skipped, every record is checked for at least `min_fields`
/// fields and cut down to `columns.len()` fields.
fn records<'a>(
    content: &'a str,
    file: &'a str,
    min_fields: usize,
    columns: &'a [&'a str],
) -> impl Iterator<Item = Result<(usize, StringRecord)>> + 'a {
    csv_reader(content)
        .into_records()
        .filter(|record| !matches!(record, Ok(r) if r.iter().all(|field| field.is_empty())))
        .map(move |record| {
            let record = record.map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line: error_line(&e),
                reason: e.to_string(),
            })?;
            let line = record.position().map(|pos| pos.line() as usize).unwrap_or(0);
            if record.len() < min_fields {
                return Err(DataLoadError::FieldCountMismatch {
                    file: file.to_string(),
                    expected: min_fields,
                    found: record.len(),
                    line,
                });
            }
            let record: StringRecord = record.iter().take(columns.len()).collect();
            Ok((line, record))
        })
}

/// Parse the Ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Interaction>> {
    let content = read_to_string_lossy(path)?;
    parse_ratings_str(&content, &file_label(path))
}

/// Parse ratings from CSV text; `file` is only used in error messages
pub fn parse_ratings_str(content: &str, file: &str) -> Result<Vec<Interaction>> {
    let headers = StringRecord::from(RATING_COLUMNS.to_vec());

    records(content, file, RATING_COLUMNS.len(), &RATING_COLUMNS)
        .map(|record| {
            let (line, record) = record?;
            record
                .deserialize::<Interaction>(Some(&headers))
                .map_err(|e| DataLoadError::ParseError {
                    file: file.to_string(),
                    line,
                    reason: format!("Invalid rating row: {}", e),
                })
        })
        .collect()
}

/// Parse the Books.csv file
pub fn parse_books(path: &Path) -> Result<Vec<ItemMetadata>> {
    let content = read_to_string_lossy(path)?;
    parse_books_str(&content, &file_label(path))
}

/// Parse book metadata from CSV text
///
/// Title, author and publisher may be empty; the year column is known to
/// hold junk in a few rows, so anything but a positive number becomes `None`.
pub fn parse_books_str(content: &str, file: &str) -> Result<Vec<ItemMetadata>> {
    let headers = StringRecord::from(BOOK_COLUMNS.to_vec());

    records(content, file, 3, &BOOK_COLUMNS)
        .map(|record| {
            let (line, record) = record?;
            let row: BookRow =
                record
                    .deserialize(Some(&headers))
                    .map_err(|e| DataLoadError::ParseError {
                        file: file.to_string(),
                        line,
                        reason: format!("Invalid book row: {}", e),
                    })?;
            Ok(ItemMetadata {
                item_id: row.item_id,
                title: row.title.filter(|s| !s.is_empty()),
                author: row.author.filter(|s| !s.is_empty()),
                year: row.year.filter(|&y| y > 0),
                publisher: row.publisher.filter(|s| !s.is_empty()),
            })
        })
        .collect()
}

/// Apply the cleaning rules to raw ratings.
///
/// ## Algorithm
/// 1. Drop ratings of 0 (if enabled)
/// 2. Keep users with at least `min_user_ratings` remaining ratings
/// 3. On what is left, keep items with at least `min_item_ratings` ratings
///
/// The two activity filters run once each, in that order, so a user may end
/// with fewer than `min_user_ratings` after the item filter.
pub fn clean_interactions(ratings: Vec<Interaction>, config: &CleaningConfig) -> Vec<Interaction> {
    let ratings: Vec<Interaction> = ratings
        .into_iter()
        .filter(|r| !(config.drop_zero_ratings && r.rating == 0.0))
        .collect();

    let mut user_counts: HashMap<&str, usize> = HashMap::new();
    for r in &ratings {
        *user_counts.entry(r.user_id.as_str()).or_insert(0) += 1;
    }
    let keep_user: Vec<bool> = ratings
        .iter()
        .map(|r| user_counts[r.user_id.as_str()] >= config.min_user_ratings)
        .collect();

    let mut item_counts: HashMap<&str, usize> = HashMap::new();
    for (r, _) in ratings.iter().zip(&keep_user).filter(|(_, keep)| **keep) {
        *item_counts.entry(r.item_id.as_str()).or_insert(0) += 1;
    }
    let keep: Vec<bool> = ratings
        .iter()
        .zip(&keep_user)
        .map(|(r, &user_ok)| {
            user_ok
                && item_counts.get(r.item_id.as_str()).copied().unwrap_or(0)
                    >= config.min_item_ratings
        })
        .collect();

    ratings
        .into_iter()
        .zip(keep)
        .filter_map(|(r, keep)| keep.then_some(r))
        .collect()
}
