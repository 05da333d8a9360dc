use thiserror::Error;

/// A template body could not be fetched from its store.
#[derive(Debug, Error)]
#[error("failed to load template '{id}'")]
pub struct TemplateLoadError {
    pub id: String,
    #[source]
    pub source: std::io::Error,
}

impl TemplateLoadError {
    pub fn new(id: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum RasterizationError {
    #[error("SVG could not be parsed: {0}")]
    Parse(String),
    #[error("failed to allocate a {width}x{height} pixmap")]
    Allocate { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("rasterization backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file format '{0}' (use .csv, .json, .xlsx or .xls)")]
    UnsupportedFormat(String),
    #[error("invalid JSON attendee list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV attendee list: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("no valid attendees found; make sure the file has \"First Name\" and \"Last Name\" columns")]
    NoValidRows,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fatal failure while writing the badge archive. Per-attendee failures are not errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write badge archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
