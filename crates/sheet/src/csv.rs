use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use encoding_rs::WINDOWS_1252;
use std::path::Path;

/// Number of decoded characters inspected when sniffing the delimiter.
pub const SNIFF_SAMPLE_LEN: usize = 4096;

/// Delimiters considered by the sniffer, in order of preference on ties.
pub const DELIMITER_CANDIDATES: [u8; 5] = [b',', b';', b'\t', b'|', b':'];

/// Text encodings tried, in order, when decoding a delimited file.
///
/// Latin-1 maps every byte, so decoding always succeeds by the third candidate.
pub const ENCODING_CANDIDATES: [TextEncoding; 4] = [
    TextEncoding::Utf8Sig,
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Windows1252,
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A candidate text encoding for delimited files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, with a leading byte-order mark stripped when present
    Utf8Sig,
    /// Strict UTF-8
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value
    Latin1,
    /// Windows code page 1252
    Windows1252,
}

impl TextEncoding {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Decode `bytes`, or `None` if they are not valid in this encoding.
    ///
    /// Only the UTF-8 variants can reject input; the single-byte encodings
    /// accept any byte sequence.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_string)
            }
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Windows1252 => WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|cow| cow.into_owned()),
        }
    }
}

/// Decode with the first candidate encoding that accepts the bytes.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> Option<(TextEncoding, String)> {
    ENCODING_CANDIDATES
        .iter()
        .find_map(|&encoding| encoding.decode(bytes).map(|text| (encoding, text)))
}

/// Guess the field delimiter from the start of the decoded text.
///
/// Each candidate is scored by how many sample lines share its most common
/// per-line count (quoted sections ignored). Returns `None` when no candidate
/// appears in the sample.
#[must_use]
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let sample: String = text.chars().take(SNIFF_SAMPLE_LEN).collect();
    let truncated = sample.len() < text.len();

    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    // A truncated sample may end in the middle of a record
    if truncated && lines.len() > 1 {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, (usize, usize))> = None;
    for &delimiter in &DELIMITER_CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_unquoted(line, delimiter))
            .collect();

        let Some(mode) = modal_count(&counts) else {
            continue;
        };
        let consistent = counts.iter().filter(|&&c| c == mode).count();
        let score = (consistent, mode);

        if best.map_or(true, |(_, current)| score > current) {
            best = Some((delimiter, score));
        }
    }

    best.map(|(delimiter, _)| delimiter)
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most frequent non-zero count; ties go to the larger count.
fn modal_count(counts: &[usize]) -> Option<usize> {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &c in counts.iter().filter(|&&c| c > 0) {
        match tally.iter_mut().find(|(value, _)| *value == c) {
            Some((_, n)) => *n += 1,
            None => tally.push((c, 1)),
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(value, _)| value)
}

/// CSV reader options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; sniffed from the content when `None`
    pub delimiter: Option<u8>,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Whether to use type inference when reading
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: None,
            quote: b'"',
            infer_types: true,
        }
    }
}

/// How a delimited file was decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDialect {
    pub encoding: TextEncoding,
    pub delimiter: u8,
}

impl Sheet {
    /// Load a delimited-text file, detecting its encoding and delimiter.
    pub fn from_delimited<P: AsRef<Path>>(path: P) -> Result<(Self, TextDialect)> {
        Self::from_delimited_with_options(path, &CsvOptions::default())
    }

    /// Load a delimited-text file with custom options
    pub fn from_delimited_with_options<P: AsRef<Path>>(
        path: P,
        options: &CsvOptions,
    ) -> Result<(Self, TextDialect)> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| SheetError::from_io(e, path))?;

        let (encoding, text) = decode_text(&bytes).ok_or_else(|| SheetError::Encoding {
            path: path.to_path_buf(),
        })?;
        let delimiter = options
            .delimiter
            .or_else(|| sniff_delimiter(&text))
            .unwrap_or(b',');
        tracing::debug!(
            path = %path.display(),
            encoding = encoding.label(),
            delimiter = %char::from(delimiter).escape_default(),
            "decoded delimited file"
        );

        let sheet = Self::from_csv_str(&text, delimiter, options)?;
        Ok((sheet, TextDialect { encoding, delimiter }))
    }

    /// Parse already-decoded delimited text
    pub fn from_csv_str(content: &str, delimiter: u8, options: &CsvOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut data: Vec<Vec<CellValue>> = Vec::new();

        for result in csv_reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| {
                    if options.infer_types {
                        CellValue::parse(field)
                    } else if field.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::String(field.to_string())
                    }
                })
                .collect();
            data.push(row);
        }

        Ok(Sheet::from_rows(data))
    }
}
