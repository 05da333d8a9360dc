use crate::catalog::{AttendanceCatalog, RawRow};
use crate::error::ImportError;
use log::info;
use serde_json::Value;
use std::path::Path;

/// Parses delimiter-separated text. The delimiter is `;` when the header line
/// contains one, `,` otherwise.
pub fn parse_delimited(content: &str) -> Result<Vec<RawRow>, ImportError> {
    let content = content.trim_start_matches('\u{feff}').trim();
    let header_line = content.lines().next().unwrap_or_default();
    let delimiter = if header_line.contains(';') { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(strip_quotes).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).map(strip_quotes).unwrap_or_default();
                (header.clone(), Value::String(value))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

// Trims and removes one leading and one trailing quote, single or double.
fn strip_quotes(cell: &str) -> String {
    let cell = cell.trim();
    let cell = cell.strip_prefix(['"', '\'']).unwrap_or(cell);
    let cell = cell.strip_suffix(['"', '\'']).unwrap_or(cell);
    cell.to_string()
}

/// Accepts a bare array, an object with an `attendees` or `data` array, or a single
/// object treated as one attendee.
pub fn parse_json(content: &str) -> Result<Vec<RawRow>, ImportError> {
    let value: Value = serde_json::from_str(content)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let nested = ["attendees", "data"]
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::Array(items)) => Some(items.clone()),
                    _ => None,
                });
            nested.unwrap_or_else(|| vec![Value::Object(map)])
        }
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

/// Reads the first worksheet; the first row holds the headers. Empty cells are left
/// out of the row, like a sheet-to-JSON export would.
#[cfg(feature = "xlsx")]
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    use calamine::{Data, Reader, open_workbook_auto_from_rs};

    let mut workbook = open_workbook_auto_from_rs(std::io::Cursor::new(bytes))
        .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|err| ImportError::Spreadsheet(err.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(|cell| cell.to_string().trim().to_string()).collect();

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let mut row = RawRow::new();
        for (header, cell) in headers.iter().zip(cells) {
            if header.is_empty() || matches!(cell, Data::Empty) {
                continue;
            }
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Picks a parser from the file extension.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>, ImportError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => parse_delimited(&std::fs::read_to_string(path)?),
        "json" => parse_json(&std::fs::read_to_string(path)?),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" => parse_spreadsheet(&std::fs::read(path)?),
        _ => Err(ImportError::UnsupportedFormat(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )),
    }
}

pub fn load_catalog(path: &Path) -> Result<AttendanceCatalog, ImportError> {
    let rows = read_rows(path)?;
    let catalog = AttendanceCatalog::from_rows(&rows)?;
    info!(
        "found {} valid attendees in {} ({} rows)",
        catalog.len(),
        path.display(),
        rows.len()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_header_selects_semicolon_delimiter() {
        let rows = parse_delimited("\"First Name\";'Last Name';Company\nAna;Lopes;\"Acme, Inc\"\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["First Name"], "Ana");
        assert_eq!(rows[0]["Last Name"], "Lopes");
        assert_eq!(rows[0]["Company"], "Acme, Inc");
    }

    #[test]
    fn comma_delimiter_and_short_rows() {
        let rows = parse_delimited("First Name,Last Name,Type\n Ana , Lopes ,3\nBo,Chen\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["First Name"], "Ana");
        assert_eq!(rows[0]["Type"], "3");
        assert_eq!(rows[1]["Type"], "");
    }

    #[test]
    fn json_shapes() {
        let bare = parse_json(r#"[{"First Name": "Ana"}, 3]"#).unwrap();
        assert_eq!(bare.len(), 1);
        let wrapped = parse_json(r#"{"attendees": [{"firstname": "Ana"}, {"firstname": "Bo"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 2);
        let data = parse_json(r#"{"data": [{"nom": "Lopes"}]}"#).unwrap();
        assert_eq!(data[0]["nom"], "Lopes");
        let single = parse_json(r#"{"First Name": "Ana", "Type": 1}"#).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0]["Type"], 1);
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(parse_json("{not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn unsupported_extension() {
        let err = read_rows(Path::new("attendees.txt")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(name) if name == "attendees.txt"));
    }

    #[test]
    fn load_catalog_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("People.CSV");
        std::fs::write(&path, "Prénom,Nom,Société\nAna,Lopes,Acme\n,,Ghost Corp\n").unwrap();
        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].company, "Acme");

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(matches!(load_catalog(&empty), Err(ImportError::NoValidRows)));
    }
}
