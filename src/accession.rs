//! Records of the availability table.
//!
//! The availability table lists one plastid genome record per line along with
//! the metadata needed to triage it before its inverted repeats are examined.

use std::num::ParseIntError;
use std::str::FromStr;

pub mod builder;
pub mod table;

pub use builder::Builder;
pub use table::Table;

/// The header of the availability table.
pub const HEADER: [&str; 11] = [
    "UID",
    "ACCESSION",
    "VERSION",
    "ORGANISM",
    "SEQ_LEN",
    "CREATE_DATE",
    "AUTHORS",
    "TITLE",
    "REFERENCE",
    "NOTE",
    "TAXONOMY",
];

/// The delimiter between columns.
pub(crate) const DELIMITER: &str = "\t";

/// The delimiter between the ranks of a taxonomy.
const TAXONOMY_DELIMITER: char = ';';

/// Three-letter month abbreviations as used in GenBank dates.
const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a record of the availability table.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An incorrect number of fields.
    IncorrectNumberOfFields(usize),

    /// An invalid UID.
    InvalidUid(ParseIntError),

    /// An invalid sequence length.
    InvalidSequenceLength(ParseIntError),

    /// A date that is not in the `DD-MON-YYYY` format.
    InvalidDate(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields: expected {} fields, found {n} fields",
                HEADER.len()
            ),
            ParseError::InvalidUid(err) => write!(f, "invalid uid: {err}"),
            ParseError::InvalidSequenceLength(err) => write!(f, "invalid sequence length: {err}"),
            ParseError::InvalidDate(date) => write!(f, "invalid date: \"{date}\""),
        }
    }
}

impl std::error::Error for ParseError {}

////////////////////////////////////////////////////////////////////////////////////////
// Dates
////////////////////////////////////////////////////////////////////////////////////////

/// Converts a GenBank date (`DD-MON-YYYY`) into an ISO 8601 date
/// (`YYYY-MM-DD`).
///
/// # Examples
///
/// ```
/// use plastome_ir::accession::normalize_date;
///
/// assert_eq!(normalize_date("15-JAN-2019")?, "2019-01-15");
/// assert!(normalize_date("2019/01/15").is_err());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn normalize_date(value: &str) -> Result<String, ParseError> {
    let invalid = || ParseError::InvalidDate(value.to_string());

    let mut parts = value.trim().split('-');
    let (day, month, year) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(day), Some(month), Some(year), None) => (day, month, year),
        _ => return Err(invalid()),
    };

    let month = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(month))
        .ok_or_else(invalid)?
        + 1;

    let day = day.parse::<u8>().map_err(|_| invalid())?;
    let year = year.parse::<u16>().map_err(|_| invalid())?;

    Ok(format!("{year:04}-{month:02}-{day:02}"))
}

////////////////////////////////////////////////////////////////////////////////////////
// Record
////////////////////////////////////////////////////////////////////////////////////////

/// A record of the availability table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The NCBI UID.
    pub(crate) uid: u64,

    /// The accession (without version).
    pub(crate) accession: String,

    /// The accession version.
    pub(crate) version: String,

    /// The organism.
    pub(crate) organism: String,

    /// The sequence length.
    pub(crate) sequence_length: usize,

    /// The date the record was created (`YYYY-MM-DD`).
    pub(crate) create_date: String,

    /// The authors of the first reference with authors.
    pub(crate) authors: String,

    /// The title of that reference.
    pub(crate) title: String,

    /// The journal citation of that reference.
    pub(crate) reference: String,

    /// A free-text note.
    pub(crate) note: String,

    /// The taxonomy (`;`-separated ranks).
    pub(crate) taxonomy: String,
}

impl Record {
    /// Gets the UID.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::accession::Builder;
    ///
    /// let record = Builder::default()
    ///     .uid(1_234)
    ///     .accession("NC_000001")
    ///     .sequence_length(160_000)
    ///     .try_build()?;
    ///
    /// assert_eq!(record.uid(), 1_234);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Gets the accession.
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// Gets the accession version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Gets the organism.
    pub fn organism(&self) -> &str {
        &self.organism
    }

    /// Gets the sequence length.
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Gets the creation date.
    pub fn create_date(&self) -> &str {
        &self.create_date
    }

    /// Gets the authors.
    pub fn authors(&self) -> &str {
        &self.authors
    }

    /// Gets the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Gets the journal citation.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Gets the note.
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Gets the taxonomy.
    pub fn taxonomy(&self) -> &str {
        &self.taxonomy
    }

    /// Gets the genus: the last rank of the taxonomy.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::accession::Builder;
    ///
    /// let record = Builder::default()
    ///     .uid(1)
    ///     .accession("NC_000001")
    ///     .sequence_length(160_000)
    ///     .taxonomy("Eukaryota; Viridiplantae; Streptophyta; Nicotiana.")
    ///     .try_build()?;
    ///
    /// assert_eq!(record.genus(), Some("Nicotiana"));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn genus(&self) -> Option<&str> {
        self.taxonomy
            .rsplit(TAXONOMY_DELIMITER)
            .next()
            .map(|genus| genus.trim().trim_end_matches('.'))
            .filter(|genus| !genus.is_empty())
    }
}

impl FromStr for Record {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split(DELIMITER).collect::<Vec<_>>();

        if fields.len() != HEADER.len() {
            return Err(ParseError::IncorrectNumberOfFields(fields.len()));
        }

        Ok(Self {
            uid: fields[0].parse().map_err(ParseError::InvalidUid)?,
            accession: fields[1].to_string(),
            version: fields[2].to_string(),
            organism: fields[3].to_string(),
            sequence_length: fields[4]
                .parse()
                .map_err(ParseError::InvalidSequenceLength)?,
            create_date: fields[5].to_string(),
            authors: fields[6].to_string(),
            title: fields[7].to_string(),
            reference: fields[8].to_string(),
            note: fields[9].to_string(),
            taxonomy: fields[10].to_string(),
        })
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = [
            self.uid.to_string(),
            self.accession.clone(),
            self.version.clone(),
            self.organism.clone(),
            self.sequence_length.to_string(),
            self.create_date.clone(),
            self.authors.clone(),
            self.title.clone(),
            self.reference.clone(),
            self.note.clone(),
            self.taxonomy.clone(),
        ];

        write!(f, "{}", fields.join(DELIMITER))
    }
}

/// Replaces the characters that would break a row of a tab-separated table.
pub(crate) fn sanitize(value: &str) -> String {
    value
        .split(|c: char| c == '\t' || c == '\n' || c == '\r')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "1234\tNC_000001\t1\tNicotiana tabacum\t160000\t2019-01-15\t\
        Doe,J., Roe,R.\tThe plastid genome\tUnpublished\t\t\
        Eukaryota; Viridiplantae; Nicotiana";

    #[test]
    fn parse_and_display() -> Result<(), Box<dyn std::error::Error>> {
        let record = LINE.parse::<Record>()?;

        assert_eq!(record.uid(), 1_234);
        assert_eq!(record.accession(), "NC_000001");
        assert_eq!(record.version(), "1");
        assert_eq!(record.sequence_length(), 160_000);
        assert_eq!(record.create_date(), "2019-01-15");
        assert_eq!(record.note(), "");
        assert_eq!(record.genus(), Some("Nicotiana"));
        assert_eq!(record.to_string(), LINE);
        Ok(())
    }

    #[test]
    fn it_fails_on_invalid_records() {
        let err = "1234\tNC_000001".parse::<Record>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid number of fields: expected 11 fields, found 2 fields"
        );

        let line = LINE.replacen("1234", "uid", 1);
        let err = line.parse::<Record>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidUid(_)));
    }

    #[test]
    fn dates() {
        assert_eq!(normalize_date("01-Dec-2000"), Ok(String::from("2000-12-01")));
        assert_eq!(
            normalize_date("01-XYZ-2000"),
            Err(ParseError::InvalidDate(String::from("01-XYZ-2000")))
        );
        assert!(normalize_date("01-JAN-2000-1").is_err());
    }

    #[test]
    fn sanitize_values() {
        assert_eq!(sanitize("a\tb\r\nc "), "a b c");
        assert_eq!(sanitize(""), "");
    }
}
