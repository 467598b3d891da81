use crate::{harvest::ChunkSink, models::RepositoryRecord, Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

const CSV_HEADER: &str = "id,repo_name,full_repo_name,stars,forks,primary_language,languages,\
                          repo_url,description,topics,readme\n";

/// Exporter for repository records
pub struct Exporter;

impl Exporter {
    /// Write records to a file in the given format
    pub fn export_to_file_with_format<P: AsRef<Path>>(
        records: &[RepositoryRecord],
        path: P,
        format: ExportFormat,
    ) -> Result<()> {
        let content = match format {
            ExportFormat::Json => Self::to_json(records)?,
            ExportFormat::Csv => Self::to_csv(records)?,
        };

        let mut file = File::create(path.as_ref())
            .map_err(|e| Error::ExportError(format!("Failed to create file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| Error::ExportError(format!("Failed to write file: {}", e)))?;

        Ok(())
    }

    /// Export records to JSON format
    pub fn to_json(records: &[RepositoryRecord]) -> Result<String> {
        Ok(serde_json::to_string_pretty(records)?)
    }

    /// Export records to CSV format
    ///
    /// List columns (languages, topics) are written as JSON arrays so they
    /// can be read back unambiguously.
    pub fn to_csv(records: &[RepositoryRecord]) -> Result<String> {
        let mut output = String::from(CSV_HEADER);

        for record in records {
            output.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{}\n",
                Self::escape_csv(&record.id),
                Self::escape_csv(&record.name),
                Self::escape_csv(&record.name_with_owner),
                record.stars,
                record.forks,
                Self::escape_csv(record.primary_language.as_deref().unwrap_or("")),
                Self::escape_csv(&serde_json::to_string(&record.languages)?),
                Self::escape_csv(&record.url),
                Self::escape_csv(record.description.as_deref().unwrap_or("")),
                Self::escape_csv(&serde_json::to_string(&record.topics)?),
                Self::escape_csv(record.readme.as_deref().unwrap_or("")),
            ));
        }

        Ok(output)
    }

    /// Escape CSV special characters
    fn escape_csv(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Writes each chunk to `<directory>/github-<date>-<index>.<ext>`
pub struct FileSink {
    directory: PathBuf,
    format: ExportFormat,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn chunk_path(&self, index: usize, date: NaiveDate) -> PathBuf {
        self.directory.join(format!(
            "github-{}-{}.{}",
            date.format("%Y-%m-%d"),
            index,
            self.format.extension()
        ))
    }
}

impl ChunkSink for FileSink {
    fn write_chunk(
        &mut self,
        records: &[RepositoryRecord],
        index: usize,
        date: NaiveDate,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;

        let path = self.chunk_path(index, date);
        Exporter::export_to_file_with_format(records, &path, self.format)?;
        Ok(path)
    }
}
