//! # Tabular import/export codec
//!
//! Reads and writes the comma-separated contact format: a header row naming
//! the columns followed by one record per row, UTF-8, with standard quoting for
//! embedded delimiters.
//!
//! - [`write_contacts`] always emits the header `name,address,email,phone` and
//!   the four fields in that order. Server ids and owners are never written.
//! - [`read_contacts`] locates the four known columns by header name (case and
//!   surrounding whitespace ignored, any order), ignores every other column and
//!   leaves a field empty when its column is absent or a row is short. Every
//!   data row becomes one record, even one whose fields are all blank; only
//!   empty lines are skipped. A missing header row (empty input) and a header
//!   that names none of the known columns are rejected, as is input that is
//!   not valid UTF-8 or that the CSV reader cannot tokenize.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::models::{Contact, ContactFields};

/// Column order of exported files.
pub const COLUMNS: [&str; 4] = ["name", "address", "email", "phone"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    #[error("malformed contacts file: {0}")]
    Parse(String),
    #[error("failed to write contacts file: {0}")]
    Write(String),
}

impl From<csv::Error> for TabularError {
    fn from(err: csv::Error) -> Self {
        TabularError::Parse(err.to_string())
    }
}

/// Serialize records to CSV text, header first.
pub fn write_contacts<'a>(
    records: impl IntoIterator<Item = &'a Contact>,
) -> Result<String, TabularError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(COLUMNS)
        .map_err(|e| TabularError::Write(e.to_string()))?;
    for contact in records {
        writer
            .write_record([&contact.name, &contact.address, &contact.email, &contact.phone])
            .map_err(|e| TabularError::Write(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| TabularError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TabularError::Write(e.to_string()))
}

/// Parse CSV bytes into local-only records (no id, no owner).
pub fn read_contacts(input: &[u8]) -> Result<Vec<Contact>, TabularError> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(TabularError::Parse("missing header row".to_string()));
    }
    let columns = ColumnMap::from_headers(&headers);
    if columns.is_empty() {
        return Err(TabularError::Parse(format!(
            "header row names none of the columns {}",
            COLUMNS.join(", ")
        )));
    }

    reader
        .records()
        .map(|row| Ok(Contact::local(columns.fields(&row?))))
        .collect()
}

/// Position of each known column in the header row.
#[derive(Debug, Default)]
struct ColumnMap {
    name: Option<usize>,
    address: Option<usize>,
    email: Option<usize>,
    phone: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();
        for (index, header) in headers.iter().enumerate() {
            let slot = match header.trim().to_ascii_lowercase().as_str() {
                "name" => &mut map.name,
                "address" => &mut map.address,
                "email" => &mut map.email,
                "phone" => &mut map.phone,
                _ => continue,
            };
            // first occurrence wins
            slot.get_or_insert(index);
        }
        map
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.email.is_none() && self.phone.is_none()
    }

    fn fields(&self, row: &StringRecord) -> ContactFields {
        let cell = |column: Option<usize>| {
            column
                .and_then(|i| row.get(i))
                .map(str::to_string)
                .unwrap_or_default()
        };
        ContactFields {
            name: cell(self.name),
            address: cell(self.address),
            email: cell(self.email),
            phone: cell(self.phone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactId;

    #[test]
    fn test_export_has_header_and_one_line_per_record() {
        let records = vec![
            Contact::local(ContactFields::new("Ada", "1 Main St", "ada@x.com", "555")),
            Contact::local(ContactFields::new("Bob", "2 Side Rd", "bob@x.com", "777")),
        ];
        let text = write_contacts(&records).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name,address,email,phone");
        assert_eq!(lines[1], "Ada,1 Main St,ada@x.com,555");
        assert_eq!(lines[2], "Bob,2 Side Rd,bob@x.com,777");
    }

    #[test]
    fn test_export_quotes_embedded_commas_and_skips_ids() {
        let mut contact = Contact::local(ContactFields::new("Lee, Ann", "Flat 2, \"The Mews\"", "ann@x.com", "1"));
        contact.id = Some(ContactId::from("abc123"));
        contact.owner = Some("u1".to_string());
        let text = write_contacts([&contact]).unwrap();
        assert!(!text.contains("abc123"));
        assert!(!text.contains("u1"));
        assert!(text.contains("\"Lee, Ann\""));
        assert!(text.contains("\"Flat 2, \"\"The Mews\"\"\""));
    }

    #[test]
    fn test_export_empty_is_header_only() {
        let text = write_contacts(&Vec::new()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_import_reads_known_columns_in_any_order() {
        let input = b"Phone,notes,Name,email,address\n555,vip,Ada,ada@x.com,1 Main St\n777,,Bob,bob@x.com,2 Side Rd\n";
        let contacts = read_contacts(input).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].fields(), ContactFields::new("Ada", "1 Main St", "ada@x.com", "555"));
        assert_eq!(contacts[1].name, "Bob");
        assert!(contacts.iter().all(|c| c.id.is_none() && c.owner.is_none()));
    }

    #[test]
    fn test_import_partial_rows_leave_fields_empty() {
        let input = b"name,email\nAda,ada@x.com\nBob\n";
        let contacts = read_contacts(input).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].address, "");
        assert_eq!(contacts[0].phone, "");
        assert_eq!(contacts[1].email, "");
    }

    #[test]
    fn test_import_keeps_blank_rows_and_strips_bom() {
        let input = "\u{feff}name,address,email,phone\nAda,a,b@c,1\n\n,,,\nBob,d,e@f,2\n";
        let contacts = read_contacts(input.as_bytes()).unwrap();
        // the empty line is not a row; the all-blank one is
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts[0].name, "Ada");
        assert_eq!(contacts[1].fields(), ContactFields::default());
        assert_eq!(contacts[2].name, "Bob");
    }

    #[test]
    fn test_import_quoted_fields() {
        let input = b"name,address,email,phone\n\"Lee, Ann\",\"Flat 2, \"\"The Mews\"\"\",ann@x.com,1\n";
        let contacts = read_contacts(input).unwrap();
        assert_eq!(contacts[0].name, "Lee, Ann");
        assert_eq!(contacts[0].address, "Flat 2, \"The Mews\"");
    }

    #[test]
    fn test_import_rejects_unrecognised_header() {
        let input = b"first,last\nAda,Lovelace\n";
        assert!(matches!(read_contacts(input), Err(TabularError::Parse(_))));
    }

    #[test]
    fn test_import_rejects_invalid_utf8() {
        let input = b"name,address,email,phone\n\xff\xfe,a,b,c\n";
        assert!(matches!(read_contacts(input), Err(TabularError::Parse(_))));
    }

    #[test]
    fn test_import_header_only_is_empty() {
        assert!(read_contacts(b"name,address,email,phone\n").unwrap().is_empty());
        assert!(read_contacts(b"\xEF\xBB\xBFName\n").unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_missing_or_unknown_header_without_rows() {
        assert!(matches!(read_contacts(b""), Err(TabularError::Parse(_))));
        assert!(matches!(read_contacts(b"\n\n"), Err(TabularError::Parse(_))));
        assert!(matches!(read_contacts(b"foo,bar\n"), Err(TabularError::Parse(_))));
    }
}
