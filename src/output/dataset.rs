//! Dataset export
//!
//! The dataset is written twice: as CSV at the configured path and as JSON
//! next to it (same stem, `.json` extension). Missing values are empty cells
//! in CSV and `null` in JSON.

use crate::checkpoint::Record;
use crate::output::OutputError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSV header, in `Record` field order
pub const DATASET_COLUMNS: [&str; 7] = [
    "year",
    "category_key",
    "title",
    "detail_url",
    "poster_url",
    "description",
    "source_url",
];

/// Records in export order: year, then category, then title ignoring case
///
/// The sort is stable, so equal keys keep their checkpoint order.
pub fn sorted_records(records: &[Record]) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by_cached_key(|r| (r.year, r.category_key.clone(), r.title.to_lowercase()));
    sorted
}

/// Path of the JSON file written alongside `csv_path`
pub fn json_sibling(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("json")
}

/// Writes the dataset as CSV and JSON
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the JSON file
/// * `Err(OutputError)` - Either file could not be written
pub fn export_dataset(records: &[Record], csv_path: &Path) -> Result<PathBuf, OutputError> {
    let sorted = sorted_records(records);

    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
    }

    // header written explicitly so an empty dataset still has one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(csv_path)
        .map_err(|e| OutputError::csv(csv_path, e))?;
    writer
        .write_record(DATASET_COLUMNS)
        .map_err(|e| OutputError::csv(csv_path, e))?;
    for record in &sorted {
        writer
            .serialize(record)
            .map_err(|e| OutputError::csv(csv_path, e))?;
    }
    writer.flush().map_err(|e| OutputError::io(csv_path, e))?;

    let json_path = json_sibling(csv_path);
    let file = File::create(&json_path).map_err(|e| OutputError::io(&json_path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &sorted)?;
    out.flush().map_err(|e| OutputError::io(&json_path, e))?;

    tracing::info!(
        "Exported {} records to {} and {}",
        sorted.len(),
        csv_path.display(),
        json_path.display()
    );

    Ok(json_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(year: i32, key: &str, title: &str, poster: Option<&str>) -> Record {
        Record {
            year,
            category_key: key.to_string(),
            title: title.to_string(),
            detail_url: format!("https://w.org/wiki/{}", title.replace(' ', "_")),
            poster_url: poster.map(str::to_string),
            description: Some("A haunted house, \"cursed\"".to_string()),
            source_url: "https://w.org/wiki/Category:X".to_string(),
        }
    }

    #[test]
    fn test_sort_order() {
        let records = vec![
            record(2005, "tamil", "b", None),
            record(2004, "tamil", "Zebra", None),
            record(2004, "hindi", "Raaz", None),
            record(2004, "tamil", "apple", None),
        ];

        let titles: Vec<_> = sorted_records(&records)
            .into_iter()
            .map(|r| r.title)
            .collect();

        assert_eq!(titles, vec!["Raaz", "apple", "Zebra", "b"]);
    }

    #[test]
    fn test_export_writes_csv_and_json() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("out/movies.csv");
        let records = vec![
            record(2004, "tamil", "Pey", Some("https://img/pey.jpg")),
            record(2003, "hindi", "Bhoot", None),
        ];

        let json_path = export_dataset(&records, &csv_path).unwrap();
        assert_eq!(json_path, dir.path().join("out/movies.json"));

        let csv_text = fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "year,category_key,title,detail_url,poster_url,description,source_url"
        );
        assert_eq!(
            lines.next().unwrap(),
            r#"2003,hindi,Bhoot,https://w.org/wiki/Bhoot,,"A haunted house, ""cursed""",https://w.org/wiki/Category:X"#
        );

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json[0]["title"], "Bhoot");
        assert!(json[0]["poster_url"].is_null());
        assert_eq!(json[1]["poster_url"], "https://img/pey.jpg");
    }

    #[test]
    fn test_export_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("movies.csv");

        export_dataset(&[], &csv_path).unwrap();

        let csv_text = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text.trim_end(), DATASET_COLUMNS.join(","));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json_sibling(&csv_path)).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!([]));
    }
}
