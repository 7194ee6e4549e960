use crate::error::{MergeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_OUTPUT_NAME: &str = "compilation.xlsx";
pub const DEFAULT_MAX_COLUMN_WIDTH: f64 = 50.0;
const OUTPUT_EXTENSION: &str = ".xlsx";

/// Stable sort on one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// 0-based column index
    pub column: usize,
}

/// Post-merge passes applied to the data rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationOptions {
    /// Append the originating file name to every data row
    pub add_source_label: bool,
    /// Drop rows equal to an earlier row
    pub deduplicate: bool,
    /// Sort the rows; each repeated header block starts its own sorted section
    pub sort: Option<SortSpec>,
    /// Drop rows whose cells (source label excluded) are all blank
    pub remove_empty_rows: bool,
    /// Re-emit each later file's header block in-band, after a blank separator row
    pub repeat_headers: bool,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        NormalizationOptions {
            add_source_label: true,
            deduplicate: true,
            sort: None,
            remove_empty_rows: false,
            repeat_headers: false,
        }
    }
}

/// Display format applied to date/time cells in the output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `yyyy-mm-dd`
    Iso,
    /// `yyyy-mm-dd hh:mm:ss`
    IsoDateTime,
    /// `dd/mm/yyyy`
    #[default]
    DayMonthYear,
    /// `dd/mm/yyyy hh:mm:ss`
    DayMonthYearTime,
    /// `mm/dd/yyyy`
    MonthDayYear,
    /// Any Excel number format pattern
    Custom(String),
}

impl DateFormat {
    /// Excel number format pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            DateFormat::Iso => "yyyy-mm-dd",
            DateFormat::IsoDateTime => "yyyy-mm-dd hh:mm:ss",
            DateFormat::DayMonthYear => "dd/mm/yyyy",
            DateFormat::DayMonthYearTime => "dd/mm/yyyy hh:mm:ss",
            DateFormat::MonthDayYear => "mm/dd/yyyy",
            DateFormat::Custom(pattern) => pattern,
        }
    }
}

impl FromStr for DateFormat {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(MergeError::InvalidConfig("empty date format".to_string())),
            "iso" => Ok(DateFormat::Iso),
            "iso-datetime" => Ok(DateFormat::IsoDateTime),
            "dmy" => Ok(DateFormat::DayMonthYear),
            "dmy-time" => Ok(DateFormat::DayMonthYearTime),
            "mdy" => Ok(DateFormat::MonthDayYear),
            _ => Ok(DateFormat::Custom(s.trim().to_string())),
        }
    }
}

/// Presentation rules for the output workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub preserve_merged_header_cells: bool,
    pub auto_column_width: bool,
    pub max_column_width: f64,
    pub freeze_header: bool,
    pub date_format: DateFormat,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            preserve_merged_header_cells: false,
            auto_column_width: true,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            freeze_header: true,
            date_format: DateFormat::default(),
        }
    }
}

/// Everything one run needs, passed explicitly to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// 1-based row where the header block starts
    pub header_start_row: usize,
    /// Number of header rows
    pub header_rows: usize,
    pub normalization: NormalizationOptions,
    pub layout: LayoutOptions,
    pub output_name: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            header_start_row: 1,
            header_rows: 1,
            normalization: NormalizationOptions::default(),
            layout: LayoutOptions::default(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

impl MergeConfig {
    /// Check the values a run cannot proceed without.
    pub fn validate(&self) -> Result<()> {
        if self.header_start_row == 0 {
            return Err(MergeError::InvalidConfig(
                "header start row must be at least 1".to_string(),
            ));
        }
        if self.header_rows == 0 {
            return Err(MergeError::InvalidConfig(
                "header row count must be at least 1".to_string(),
            ));
        }
        if self.output_name.trim().is_empty() {
            return Err(MergeError::InvalidConfig(
                "output file name is empty".to_string(),
            ));
        }
        if self.layout.date_format.pattern().trim().is_empty() {
            return Err(MergeError::InvalidConfig("empty date format".to_string()));
        }
        if !(self.layout.max_column_width > 0.0) {
            return Err(MergeError::InvalidConfig(
                "maximum column width must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Output file name with the `.xlsx` extension added when missing.
    #[must_use]
    pub fn output_file_name(&self) -> String {
        let name = self.output_name.trim();
        if name.to_ascii_lowercase().ends_with(OUTPUT_EXTENSION) {
            name.to_string()
        } else {
            format!("{name}{OUTPUT_EXTENSION}")
        }
    }

    /// Load a configuration saved as JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            MergeError::InvalidConfig(format!("{}: {e}", path.as_ref().display()))
        })
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| MergeError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
