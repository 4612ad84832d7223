//! Manual record import
//!
//! Reads records prepared by hand (for example for a task that cannot be
//! crawled) from CSV. The columns match the dataset export; the older names
//! `language` and `movie_page_url` are accepted for `category_key` and
//! `detail_url`. Blank optional cells become null.

use crate::checkpoint::Record;
use crate::output::OutputError;
use std::path::Path;

/// Reads and validates records from a CSV file
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Rows in file order
/// * `Err(OutputError::InvalidRow)` - A row lacks a title, category or detail URL
/// * `Err(OutputError::Csv)` - The file is missing or malformed
pub fn read_manual_records(path: &Path) -> Result<Vec<Record>, OutputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| OutputError::csv(path, e))?;

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<Record>().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = row.map_err(|e| OutputError::csv(path, e))?;

        let missing = [
            ("title", record.title.is_empty()),
            ("category_key", record.category_key.is_empty()),
            ("detail_url", record.detail_url.is_empty()),
        ]
        .into_iter()
        .find_map(|(column, empty)| empty.then_some(column));

        if let Some(column) = missing {
            return Err(OutputError::InvalidRow {
                path: path.display().to_string(),
                line,
                message: format!("{} is empty", column),
            });
        }

        records.push(record);
    }

    tracing::debug!("Read {} manual records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("manual.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_current_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "year,category_key,title,detail_url,poster_url,description,source_url\n\
             2004,tamil,Pey,https://w.org/wiki/Pey,,A haunted house,https://w.org/wiki/Category:X\n",
        );

        let records = read_manual_records(&path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, 2004);
        assert_eq!(records[0].poster_url, None);
        assert_eq!(records[0].description.as_deref(), Some("A haunted house"));
    }

    #[test]
    fn test_accepts_legacy_column_names() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "year,language,title,movie_page_url,poster_url,description,source_url\n\
             2008,hindi,1920,https://w.org/wiki/1920_(film),https://img/1920.jpg, ,manual\n",
        );

        let records = read_manual_records(&path).unwrap();

        assert_eq!(records[0].category_key, "hindi");
        assert_eq!(records[0].detail_url, "https://w.org/wiki/1920_(film)");
        assert_eq!(records[0].description, None);
    }

    #[test]
    fn test_rejects_row_without_title() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "year,category_key,title,detail_url,poster_url,description,source_url\n\
             2004,tamil,Pey,https://w.org/wiki/Pey,,,manual\n\
             2004,tamil,,https://w.org/wiki/X,,,manual\n",
        );

        let result = read_manual_records(&path);

        assert!(matches!(result, Err(OutputError::InvalidRow { line: 3, .. })));
    }

    #[test]
    fn test_bad_year_is_csv_error() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "year,category_key,title,detail_url,poster_url,description,source_url\n\
             soon,tamil,Pey,https://w.org/wiki/Pey,,,manual\n",
        );

        assert!(matches!(read_manual_records(&path), Err(OutputError::Csv { .. })));
    }
}
