//! Delimited-text parsing and row mapping for the exercise and settings tables.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::ExerciseSource;
use crate::error::DataError;
use crate::exercise::{normalize, ExerciseRecord};

const GROUP_FIELDS: &[&str] = &["group"];
const NAME_FIELDS: &[&str] = &["name"];
const HOW_TO_FIELDS: &[&str] = &["how_to", "howTo", "How To", "how"];
const IMAGE_FIELDS: &[&str] = &["image", "image_url", "Image URL"];
const ENABLED_FIELDS: &[&str] = &["enabled"];
const SETTINGS_GROUP_FIELDS: &[&str] = &["Group", "group", "Muscle", "Category"];

/// One data row, keyed by the header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: Vec<(String, String)>,
}

impl CsvRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// First candidate present in the row. Each candidate is tried verbatim,
    /// then case-insensitively. Empty when none match.
    pub fn get_any(&self, candidates: &[&str]) -> &str {
        for candidate in candidates {
            if let Some(value) = self.get(candidate) {
                return value;
            }
            let lower = candidate.to_lowercase();
            if let Some((_, value)) = self.fields.iter().find(|(h, _)| h.to_lowercase() == lower) {
                return value;
            }
        }
        ""
    }
}

/// Parse a whole table. The header line picks the delimiter: `;` when it has
/// more semicolons than commas, `,` otherwise.
///
/// Short rows are padded with empty fields. Rows the reader cannot decode are
/// skipped with a warning.
pub fn parse_csv(text: &str) -> Vec<CsvRow> {
    let text = text.trim();
    let Some(header_line) = text.lines().next() else {
        return Vec::new();
    };

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(header_line))
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect(),
        Err(e) => {
            warn!(error = %e, "unreadable csv header");
            return Vec::new();
        }
    };

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping unreadable csv row");
                None
            }
        })
        .filter(|record| !is_blank(record))
        .map(|record| CsvRow {
            fields: headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                .collect(),
        })
        .collect()
}

fn sniff_delimiter(header_line: &str) -> u8 {
    let commas = header_line.matches(',').count();
    let semis = header_line.matches(';').count();
    if semis > commas {
        b';'
    } else {
        b','
    }
}

/// Whitespace-only lines come through as a single empty field.
fn is_blank(record: &::csv::StringRecord) -> bool {
    record.len() <= 1 && record.get(0).map_or(true, str::is_empty)
}

fn is_enabled(value: &str) -> bool {
    matches!(normalize(value).as_str(), "true" | "1" | "yes")
}

/// Map an exercises-table row. Disabled and unnamed rows are kept here and
/// filtered by [`enabled_exercises`].
pub fn to_exercise(row: &CsvRow) -> ExerciseRecord {
    let mut record = ExerciseRecord::new(row.get_any(NAME_FIELDS).trim(), row.get_any(GROUP_FIELDS))
        .with_how_to(row.get_any(HOW_TO_FIELDS).trim())
        .with_image(row.get_any(IMAGE_FIELDS).trim());
    record.enabled = is_enabled(row.get_any(ENABLED_FIELDS));
    record
}

pub fn enabled_exercises(rows: &[CsvRow]) -> Vec<ExerciseRecord> {
    rows.iter()
        .map(to_exercise)
        .filter(|e| e.enabled && !e.name.is_empty())
        .collect()
}

/// Distinct groups named by the settings table, sorted.
pub fn groups_from_settings(rows: &[CsvRow]) -> Vec<String> {
    let mut groups: Vec<String> = rows
        .iter()
        .map(|r| normalize(r.get_any(SETTINGS_GROUP_FIELDS)))
        .filter(|g| !g.is_empty())
        .collect();
    groups.sort();
    groups.dedup();
    groups
}

/// Exercise source over already-loaded table text.
#[derive(Debug, Clone, Default)]
pub struct CsvSource {
    settings: Vec<CsvRow>,
    exercises: Vec<CsvRow>,
}

impl CsvSource {
    pub fn from_text(settings: &str, exercises: &str) -> Self {
        let source = Self {
            settings: parse_csv(settings),
            exercises: parse_csv(exercises),
        };
        debug!(
            settings_rows = source.settings.len(),
            exercise_rows = source.exercises.len(),
            "parsed csv tables"
        );
        source
    }

    /// Read local tables. The settings table is optional.
    pub fn from_files(settings: Option<&Path>, exercises: &Path) -> Result<Self, DataError> {
        let exercises_text = read(exercises)?;
        let settings_text = match settings {
            Some(path) => read(path)?,
            None => String::new(),
        };
        Ok(Self::from_text(&settings_text, &exercises_text))
    }
}

fn read(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

impl ExerciseSource for CsvSource {
    fn list_enabled_exercises(&self) -> Result<Vec<ExerciseRecord>, DataError> {
        let enabled = enabled_exercises(&self.exercises);
        if enabled.is_empty() && !self.exercises.is_empty() {
            warn!(rows = self.exercises.len(), "no enabled exercises in table");
        }
        Ok(enabled)
    }

    fn list_groups(&self) -> Result<Vec<String>, DataError> {
        let from_settings = groups_from_settings(&self.settings);
        if !from_settings.is_empty() {
            return Ok(from_settings);
        }
        let mut groups: Vec<String> = self
            .list_enabled_exercises()?
            .into_iter()
            .map(|e| e.group)
            .filter(|g| !g.is_empty())
            .collect();
        groups.sort();
        groups.dedup();
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const EXERCISES: &str = indoc! {r#"
        Group,Name,How To,Image URL,Enabled
        Legs,Squat,"Sit back, chest up",,TRUE
        upper ,Push-up,Elbows at 45,https://img/pushup.png,yes
        core,Plank,"Say ""hold""",,1
        core,Crunch,,,no
        ,Burpee,,,true
        legs,,,,true
    "#};

    #[test]
    fn empty_text_has_no_rows() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("   \n  ").is_empty());
    }

    #[test]
    fn quoted_delimiters_stay_in_field() {
        let rows = parse_csv(EXERCISES);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].get("How To"), Some("Sit back, chest up"));
        assert_eq!(rows[2].get("How To"), Some("Say \"hold\""));
    }

    #[test]
    fn semicolon_header_switches_delimiter() {
        let rows = parse_csv("name;group;enabled\nLunge;legs;true\r\nDip;upper;true\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("group"), Some("legs"));
        assert_eq!(rows[1].get("enabled"), Some("true"));
    }

    #[test]
    fn quoted_line_break_and_blank_lines() {
        let rows = parse_csv("name;how_to\nPlank;\"Hold;\nbreathe\"\n   \nDip;\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("how_to"), Some("Hold;\nbreathe"));
        assert_eq!(rows[1].get("name"), Some("Dip"));
    }

    #[test]
    fn missing_trailing_columns_are_empty() {
        let rows = parse_csv("name,group,enabled\nLunge\n");
        assert_eq!(rows[0].get("group"), Some(""));
        assert_eq!(rows[0].get("enabled"), Some(""));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let rows = parse_csv("NAME,Howto\nSquat,Sit back\n");
        assert_eq!(rows[0].get_any(NAME_FIELDS), "Squat");
        assert_eq!(rows[0].get_any(HOW_TO_FIELDS), "Sit back");
        assert_eq!(rows[0].get_any(IMAGE_FIELDS), "");
    }

    #[test]
    fn maps_only_enabled_named_records() {
        let records = enabled_exercises(&parse_csv(EXERCISES));
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Squat", "Push-up", "Plank", "Burpee"]);
        assert_eq!(records[0].group, "legs");
        assert_eq!(records[1].group, "upper");
        assert_eq!(records[1].image_url, "https://img/pushup.png");
        assert_eq!(records[3].group, "full");
    }

    #[test]
    fn groups_prefer_settings_table() {
        let source = CsvSource::from_text("Muscle\nLegs\nCore\nlegs\n\n", EXERCISES);
        assert_eq!(source.list_groups().unwrap(), vec!["core", "legs"]);

        let source = CsvSource::from_text("", EXERCISES);
        assert_eq!(
            source.list_groups().unwrap(),
            vec!["core", "full", "legs", "upper"]
        );
    }

    #[test]
    fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.csv");
        fs::write(&path, EXERCISES).unwrap();

        let source = CsvSource::from_files(None, &path).unwrap();
        assert_eq!(source.list_enabled_exercises().unwrap().len(), 4);

        let missing = dir.path().join("missing.csv");
        let err = CsvSource::from_files(Some(&missing), &path).unwrap_err();
        assert!(matches!(err, DataError::ReadFailed { .. }));
    }
}
