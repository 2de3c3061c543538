use chrono::NaiveDateTime;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::record::Record;

const MAX_SUFFIX: usize = 1000;

pub const COLUMNS: [&str; 10] = [
  "source_id",
  "name",
  "year",
  "date",
  "rating",
  "raw_text",
  "cleaned_text",
  "sentiment_score",
  "confidence",
  "sentiment_label",
];

/// Writes enriched records to a timestamped CSV file
#[derive(Debug, Clone)]
pub struct CsvSink {
  dir: PathBuf,
  prefix: String,
}

impl CsvSink {
  pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
    Self { dir: dir.into(), prefix: prefix.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn file_name(&self, now: NaiveDateTime) -> String {
    format!("{}_{}.csv", self.prefix, now.format("%Y%m%d_%H%M%S"))
  }

  /// Write all records to a new file in the output directory. An existing
  /// file is never overwritten; a numeric suffix is added instead.
  pub fn write(&self, records: &[Record]) -> Result<PathBuf> {
    fs::create_dir_all(&self.dir)?;
    let (path, file) = self.create_unique(chrono::Local::now().naive_local())?;

    write_to(file, records)?;

    Ok(path)
  }

  fn create_unique(&self, now: NaiveDateTime) -> Result<(PathBuf, fs::File)> {
    let name = self.file_name(now);
    let stem = name.trim_end_matches(".csv");

    for attempt in 0..MAX_SUFFIX {
      let path = match attempt {
        0 => self.dir.join(&name),
        n => self.dir.join(format!("{stem}_{n}.csv")),
      };
      match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => return Ok((path, file)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
        Err(e) => return Err(e.into()),
      }
    }

    Err(io::Error::new(ErrorKind::AlreadyExists, format!("no free file name for {name}")).into())
  }
}

pub fn write_to<W: Write>(writer: W, records: &[Record]) -> Result<()> {
  let mut csv = csv::Writer::from_writer(writer);
  csv.write_record(COLUMNS)?;
  for record in records {
    csv.write_record(row(record))?;
  }
  csv.flush()?;
  Ok(())
}

/// Cells in [`COLUMNS`] order; absent values are empty
pub fn row(record: &Record) -> Vec<String> {
  fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
  }

  vec![
    record.source_id.clone(),
    record.name.clone(),
    opt(record.year()),
    record.formatted_date().unwrap_or_default(),
    opt(record.rating),
    record.raw_text().to_string(),
    record.cleaned_text().to_string(),
    opt(record.sentiment_score),
    opt(record.confidence),
    opt(record.sentiment_label),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::Normalizer;
  use crate::scorer::ScoreResult;
  use chrono::NaiveDate;
  use tempfile::TempDir;

  fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().collect::<std::result::Result<_, _>>().unwrap()
  }

  fn scored_record() -> Record {
    let mut record = Record::new("B0CW5YZ6VV", "Aquaguard Aura", "Great, \"really\" great\nproduct")
      .with_date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
      .with_rating(5.0);
    record.clean(&Normalizer::builtin_full());
    record.apply(&ScoreResult::Compound(0.8481));
    record
  }

  #[test]
  fn test_file_name_has_prefix_and_timestamp() {
    let sink = CsvSink::new("/tmp/out", "amazon_product_reviews_with_lexicon_sentiment");
    let now = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap().and_hms_opt(14, 5, 9).unwrap();
    assert_eq!(sink.file_name(now), "amazon_product_reviews_with_lexicon_sentiment_20240307_140509.csv");
  }

  #[test]
  fn test_same_second_runs_do_not_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let sink = CsvSink::new(temp_dir.path(), "social_posts_with_lexicon_sentiment");
    let now = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap().and_hms_opt(14, 5, 9).unwrap();

    let (first, _) = sink.create_unique(now).unwrap();
    let (second, _) = sink.create_unique(now).unwrap();

    assert_ne!(first, second);
    assert!(first.ends_with("social_posts_with_lexicon_sentiment_20240307_140509.csv"));
    assert!(second.ends_with("social_posts_with_lexicon_sentiment_20240307_140509_1.csv"));
  }

  #[test]
  fn test_consecutive_writes_keep_both_files() {
    let temp_dir = TempDir::new().unwrap();
    let sink = CsvSink::new(temp_dir.path(), "amazon_product_reviews_with_lexicon_sentiment");

    let first = sink.write(&[scored_record()]).unwrap();
    let second = sink.write(&[]).unwrap();

    assert_ne!(first, second);
    assert_eq!(read_rows(&first).len(), 1);
    assert_eq!(read_rows(&second).len(), 0);
  }

  #[test]
  fn test_row_fills_absent_values_with_empty_cells() {
    let record = Record::new("x.com/EurekaForbes", "EurekaForbes", "post");
    let cells = row(&record);
    assert_eq!(cells.len(), COLUMNS.len());
    assert_eq!(cells[2], "");
    assert_eq!(cells[3], "");
    assert_eq!(cells[9], "");
  }

  #[test]
  fn test_write_to_quotes_fields() {
    let mut buffer = Vec::new();
    write_to(&mut buffer, &[scored_record()]).unwrap();
    let output = String::from_utf8(buffer).unwrap();

    let mut lines = output.lines();
    assert_eq!(
      lines.next(),
      Some("source_id,name,year,date,rating,raw_text,cleaned_text,sentiment_score,confidence,sentiment_label")
    );
    assert!(output.contains(r#"B0CW5YZ6VV,Aquaguard Aura,2024,07-03-2024,5,"Great, ""really"" great"#));
    assert!(output.contains(",0.8481,,Positive"));
  }

  #[test]
  fn test_write_creates_directory_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let sink = CsvSink::new(temp_dir.path().join("out"), "google_playstore_reviews_with_generative_sentiment");

    let path = sink.write(&[scored_record()]).unwrap();

    assert!(path.exists());
    assert!(path.starts_with(temp_dir.path().join("out")));
    let rows = read_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][6], "great, really great product");
  }
}
