use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::Context;

/// Destination of a command's report, either a file or stdout.
pub struct Output {
    writer: Box<dyn Write>,
    label: String,
}

impl Output {
    /// Open `path` for writing, or stdout when no path is given.
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                writer: Box::new(io::stdout().lock()),
                label: "stdout".to_owned(),
            });
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            label: path.display().to_string(),
        })
    }

    /// Where the output goes, for log messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .with_context(|| format!("Failed to write JSON to {}", self.label))?;
        self.write_text("\n")
    }

    pub fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush())
            .with_context(|| format!("Failed to write to {}", self.label))
    }
}

/// Observations as read from an input file, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservations {
    pub times: Vec<f64>,
    pub status: Vec<String>,
}

/// JSON layout: `{"times": [...], "status": [...]}`.
#[derive(Debug, Clone, serde::Deserialize)]
struct ObservationFile {
    times: Vec<f64>,
    status: Vec<StatusValue>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
enum StatusValue {
    Code(i64),
    Number(f64),
    Flag(bool),
    Label(String),
    // Kept so the estimator can report the offending index and value.
    Other(serde_json::Value),
}

impl StatusValue {
    #[expect(clippy::cast_possible_truncation)]
    fn into_label(self) -> String {
        match self {
            StatusValue::Code(code) => code.to_string(),
            // 1.0 and 0.0 are accepted as codes; anything else is passed on
            // verbatim and rejected during validation.
            StatusValue::Number(n) if n.fract() == 0.0 && n.abs() <= 1.0 => {
                (n as i64).to_string()
            }
            StatusValue::Number(n) => n.to_string(),
            StatusValue::Flag(flag) => flag.to_string(),
            StatusValue::Label(label) => label,
            StatusValue::Other(value) => value.to_string(),
        }
    }
}

/// Read observations from a `.json` file or a two-column CSV file
///
/// For CSV input, `has_headers` states whether the first row is a header.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed. Status values are not
/// interpreted here.
pub fn read_observations_file<P>(path: P, has_headers: bool) -> anyhow::Result<RawObservations>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read observations file: {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_json(&content)
            .with_context(|| format!("Failed to parse observations JSON file: {}", path.display()))
    } else {
        parse_csv(&content, has_headers)
            .with_context(|| format!("Failed to parse observations CSV file: {}", path.display()))
    }
}

pub fn parse_json(content: &str) -> anyhow::Result<RawObservations> {
    let file: ObservationFile = serde_json::from_str(content)?;
    Ok(RawObservations {
        times: file.times,
        status: file.status.into_iter().map(StatusValue::into_label).collect(),
    })
}

/// Parse `time,status` rows.
///
/// Fields may be quoted and padded with whitespace. Lines starting with `#`
/// are comments. Every data row must have exactly two fields and a numeric time.
pub fn parse_csv(content: &str, has_headers: bool) -> anyhow::Result<RawObservations> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut times = vec![];
    let mut status = vec![];
    for row in reader.deserialize::<(f64, String)>() {
        let (time, label) = row.context("Invalid observation row")?;
        times.push(time);
        status.push(label);
    }

    Ok(RawObservations { times, status })
}
