//! Data table configuration
//!
//! DATATABLE_CFG returns one line per table describing its fields:
//!
//! ```text
//! user=1,UID=i0,CardNo=i1,Pin=i2,Password=s3,Group=i4,StartTime=i5,EndTime=i6,Name=s7,SuperAuthorize=i8
//! userauthorize=2,Pin=i0,AuthorizeTimezoneId=i1,AuthorizeDoorId=i2
//! ```
//!
//! The field value is the field type (`i` integer, `s` string) followed by
//! its column index.

use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    String,
}

impl FieldType {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(Self::Integer),
            's' => Some(Self::String),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    pub name: String,
    pub field_type: FieldType,
    pub index: u8,
}

/// Layout of one panel data table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub name: String,
    pub id: u8,
    pub fields: Vec<DataField>,
}

impl DataTable {
    pub fn field(&self, name: &str) -> Option<&DataField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)?;
        for field in &self.fields {
            let code = match field.field_type {
                FieldType::Integer => 'i',
                FieldType::String => 's',
            };
            write!(f, "\n    {:<2} {} [{}]", field.index, field.name, code)?;
        }
        Ok(())
    }
}

/// Parse a DATATABLE_CFG reply; malformed lines and fields are skipped
pub fn parse_config(data: &[u8]) -> Vec<DataTable> {
    String::from_utf8_lossy(data)
        .split(['\r', '\n'])
        .filter_map(parse_table)
        .collect()
}

fn parse_table(line: &str) -> Option<DataTable> {
    let mut parts = line.trim_matches(|c: char| c.is_whitespace() || c == '\0').split(',');

    let (name, id) = parts.next()?.split_once('=')?;
    let id = id.trim().parse().ok()?;

    let fields = parts
        .filter_map(|part| {
            let field = parse_field(part);
            if field.is_none() {
                trace!("Skipping malformed field '{}' of table {}", part, name);
            }
            field
        })
        .collect();

    Some(DataTable {
        name: name.trim().to_string(),
        id,
        fields,
    })
}

fn parse_field(part: &str) -> Option<DataField> {
    let (name, layout) = part.split_once('=')?;
    let mut chars = layout.trim().chars();
    let field_type = FieldType::from_code(chars.next()?)?;
    let index = chars.as_str().parse().ok()?;

    Some(DataField {
        name: name.trim().to_string(),
        field_type,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config() {
        let data = b"user=1,UID=i0,CardNo=i1,Pin=i2,Password=s3,Name=s7\r\n\
                     userauthorize=2,Pin=i0,AuthorizeTimezoneId=i1,AuthorizeDoorId=i2\r\n";
        let tables = parse_config(data);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "user");
        assert_eq!(tables[0].id, 1);
        assert_eq!(tables[0].fields.len(), 5);
        assert_eq!(
            tables[0].field("Password"),
            Some(&DataField {
                name: "Password".to_string(),
                field_type: FieldType::String,
                index: 3,
            })
        );
        assert_eq!(tables[1].field("AuthorizeDoorId").map(|f| f.index), Some(2));
    }

    #[test]
    fn test_parse_config_skips_malformed() {
        let tables = parse_config(b"garbage\ntimezone=x,A=i0\nholiday=4,Holiday=i0,Bad=z1,Type=i2\0");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "holiday");
        assert_eq!(tables[0].fields.len(), 2);
        assert_eq!(tables[0].fields[1].name, "Type");
    }
}
