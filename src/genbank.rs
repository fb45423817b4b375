//! GenBank records reduced to what inverted repeat extraction needs.
//!
//! Parsing of the flat-file format itself is delegated to `gb-io`. This
//! module validates each parsed sequence (an accession, a sequence length,
//! and a sequence that matches the declared length) and converts its features
//! into typed [`Annotation`]s.

use std::io::Read;

use gb_io::reader::SeqReader;
use gb_io::seq::Seq;
use gb_io::seq::Topology as GbTopology;

use crate::annotation::Annotation;
use crate::annotation::Kind;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with validating a parsed GenBank record.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// No accession could be determined.
    MissingAccession,

    /// No sequence length could be determined.
    MissingLength,

    /// The sequence is shorter or longer than the declared length.
    LengthMismatch(usize, usize),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingAccession => write!(f, "record has no accession"),
            ParseError::MissingLength => write!(f, "record has no sequence length"),
            ParseError::LengthMismatch(declared, actual) => write!(
                f,
                "declared length ({declared}) does not match the sequence length ({actual})"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to reading a GenBank [`Record`].
#[derive(Debug)]
pub enum Error {
    /// The flat file could not be parsed.
    GenBank(String),

    /// The input contained no records.
    Empty,

    /// A parse error.
    Parse(ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::GenBank(err) => write!(f, "genbank error: {err}"),
            Error::Empty => write!(f, "no records found"),
            Error::Parse(err) => write!(f, "parse error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Record
////////////////////////////////////////////////////////////////////////////////////////

/// The topology of a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Topology {
    /// A linear molecule.
    Linear,

    /// A circular molecule.
    Circular,
}

/// A validated GenBank record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The accession (without version).
    accession: String,

    /// The accession version, if present.
    version: Option<String>,

    /// The declared sequence length.
    length: usize,

    /// The topology.
    topology: Topology,

    /// The converted annotations.
    annotations: Vec<Annotation>,

    /// The number of features that could not be converted.
    skipped_features: usize,

    /// The sequence.
    sequence: Vec<u8>,
}

impl Record {
    /// Creates a record directly from its parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::genbank::Record;
    /// use plastome_ir::genbank::Topology;
    ///
    /// let record = Record::new("NC_000001", 160_000, Topology::Circular, Vec::new());
    ///
    /// assert_eq!(record.accession(), "NC_000001");
    /// assert_eq!(record.length(), 160_000);
    /// assert!(record.annotations().is_empty());
    /// ```
    pub fn new(
        accession: impl Into<String>,
        length: usize,
        topology: Topology,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            accession: accession.into(),
            version: None,
            length,
            topology,
            annotations,
            skipped_features: 0,
            sequence: Vec::new(),
        }
    }

    /// Attempts to create a record from a parsed `gb-io` sequence.
    pub fn try_from_seq(seq: Seq) -> Result<Self> {
        let version = seq.version.clone().filter(|v| !v.trim().is_empty());

        let accession = seq
            .accession
            .as_deref()
            .and_then(|accession| accession.split_whitespace().next())
            .or(version.as_deref())
            .or(seq.name.as_deref())
            .map(strip_version)
            .filter(|accession| !accession.is_empty())
            .ok_or(Error::Parse(ParseError::MissingAccession))?;

        let length = match (seq.len, seq.seq.len()) {
            (Some(declared), 0) => declared,
            (Some(declared), actual) if declared != actual => {
                return Err(Error::Parse(ParseError::LengthMismatch(declared, actual)));
            }
            (Some(declared), _) => declared,
            (None, 0) => return Err(Error::Parse(ParseError::MissingLength)),
            (None, actual) => actual,
        };

        let mut skipped_features = 0usize;
        let annotations = seq
            .features
            .iter()
            .filter_map(|feature| match Annotation::try_from_feature(feature) {
                Ok(annotation) => Some(annotation),
                Err(_) => {
                    skipped_features += 1;
                    None
                }
            })
            .collect::<Vec<_>>();

        let topology = match seq.topology {
            GbTopology::Circular => Topology::Circular,
            GbTopology::Linear => Topology::Linear,
        };

        Ok(Self {
            accession,
            version,
            length,
            topology,
            annotations,
            skipped_features,
            sequence: seq.seq,
        })
    }

    /// Gets the accession.
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// Gets the accession version.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Gets the sequence length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Gets the topology.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Gets the annotations.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Gets the number of features whose location could not be converted.
    pub fn skipped_features(&self) -> usize {
        self.skipped_features
    }

    /// Gets the sequence (empty when the record carried none).
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Gets the annotations of a given kind.
    pub fn annotations_of(&self, kind: Kind) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(move |annotation| annotation.kind() == &kind)
    }
}

/// Removes a trailing `.<version>` from an accession.
fn strip_version(value: &str) -> String {
    match value.split_once('.') {
        Some((accession, _)) => accession.to_string(),
        None => value.to_string(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Reader
////////////////////////////////////////////////////////////////////////////////////////

/// A reader of GenBank flat files.
#[allow(missing_debug_implementations)]
pub struct Reader<T>(SeqReader<T>)
where
    T: Read;

impl<T> Reader<T>
where
    T: Read,
{
    /// Creates a GenBank reader.
    pub fn new(inner: T) -> Self {
        Self(SeqReader::new(inner))
    }

    /// Reads the first record and ignores any that follow.
    pub fn read_first(&mut self) -> Result<Record> {
        self.next().unwrap_or(Err(Error::Empty))
    }
}

impl<T> Iterator for Reader<T>
where
    T: Read,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.0.next()?;

        Some(
            result
                .map_err(|err| Error::GenBank(err.to_string()))
                .and_then(Record::try_from_seq),
        )
    }
}

#[cfg(test)]
mod tests {
    use gb_io::seq::Feature;
    use gb_io::seq::Location;

    use super::*;

    fn seq(length: usize) -> Seq {
        let mut seq = Seq::empty();
        seq.name = Some(String::from("NC_000001"));
        seq.accession = Some(String::from("NC_000001"));
        seq.version = Some(String::from("NC_000001.1"));
        seq.topology = GbTopology::Circular;
        seq.len = Some(length);
        seq
    }

    #[test]
    fn from_seq() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut seq = seq(100);
        seq.seq = b"ACGT".repeat(25);
        seq.features.push(Feature {
            kind: "repeat_region".into(),
            location: Location::simple_range(0, 10),
            qualifiers: vec![("rpt_type".into(), Some(String::from("inverted")))],
        });
        seq.features.push(Feature {
            kind: "misc_feature".into(),
            location: Location::External(String::from("X00001.1"), None),
            qualifiers: vec![],
        });

        let record = Record::try_from_seq(seq)?;
        assert_eq!(record.accession(), "NC_000001");
        assert_eq!(record.version(), Some("NC_000001.1"));
        assert_eq!(record.length(), 100);
        assert_eq!(record.topology(), Topology::Circular);
        assert_eq!(record.annotations().len(), 1);
        assert_eq!(record.skipped_features(), 1);
        assert_eq!(record.annotations_of(Kind::RepeatRegion).count(), 1);
        assert_eq!(record.annotations_of(Kind::MiscFeature).count(), 0);
        Ok(())
    }

    #[test]
    fn truncated_sequence() {
        let mut seq = seq(100);
        seq.seq = b"ACGT".to_vec();

        let err = Record::try_from_seq(seq).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::LengthMismatch(100, 4))
        ));
        assert_eq!(
            err.to_string(),
            "parse error: declared length (100) does not match the sequence length (4)"
        );
    }

    #[test]
    fn missing_accession() {
        let mut seq = Seq::empty();
        seq.len = Some(10);

        let err = Record::try_from_seq(seq).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::MissingAccession)));
    }

    #[test]
    fn missing_length() {
        let mut seq = seq(0);
        seq.len = None;

        let err = Record::try_from_seq(seq).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::MissingLength)));
    }

    #[test]
    fn empty_input() {
        let mut reader = Reader::new(&b""[..]);
        assert!(matches!(reader.read_first(), Err(Error::Empty)));
    }
}
