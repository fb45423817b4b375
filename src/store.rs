//! On-disk storage of downloaded records and of the sequences exported from
//! them.
//!
//! Records are kept as gzip-compressed GenBank flat files so that later runs
//! can skip the download:
//!
//! ```text
//! <records>/NC_000001.gb.gz
//! <data>/NC_000001/NC_000001_completeSeq.fasta
//! <data>/NC_000001/NC_000001_IRa.fasta
//! <data>/NC_000001/NC_000001_IRb_revComp.fasta
//! ```

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write as _;
use std::io::{self};
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use noodles::fasta;
use noodles::fasta::record::Definition;
use noodles::fasta::record::Sequence;

use crate::extract::Extraction;
use crate::genbank;
use crate::interval;

/// The extension of a stored record.
const RECORD_EXTENSION: &str = "gb.gz";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to the record store or the sequence exports.
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A stored record that could not be read.
    GenBank(genbank::Error),

    /// An inverted repeat that does not fit the sequence.
    Interval(interval::Error),

    /// A record without sequence data.
    MissingSequence(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::GenBank(err) => write!(f, "genbank error: {err}"),
            Error::Interval(err) => write!(f, "interval error: {err}"),
            Error::MissingSequence(accession) => {
                write!(f, "record {accession} holds no sequence")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Record store
////////////////////////////////////////////////////////////////////////////////////////

/// A directory of gzip-compressed GenBank records, one per accession.
#[derive(Clone, Debug)]
pub struct RecordStore {
    /// The directory.
    root: PathBuf,
}

impl RecordStore {
    /// Creates a record store rooted at `root`.
    ///
    /// The directory is created on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Gets the directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Gets the path of the stored record for an accession.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use plastome_ir::store::RecordStore;
    ///
    /// let store = RecordStore::new("records");
    /// assert_eq!(store.path("NC_000001"), Path::new("records/NC_000001.gb.gz"));
    /// ```
    pub fn path(&self, accession: &str) -> PathBuf {
        self.root.join(format!("{accession}.{RECORD_EXTENSION}"))
    }

    /// Returns whether a record is stored for an accession.
    pub fn contains(&self, accession: &str) -> bool {
        self.path(accession).is_file()
    }

    /// Stores the GenBank flat file of an accession.
    pub fn write(&self, accession: &str, data: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(Error::Io)?;

        let path = self.path(accession);
        let file = File::create(&path).map_err(Error::Io)?;

        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(data).map_err(Error::Io)?;
        encoder
            .finish()
            .and_then(|mut writer| writer.flush())
            .map_err(Error::Io)?;

        Ok(path)
    }

    /// Reads and parses the stored record of an accession.
    pub fn read(&self, accession: &str) -> Result<genbank::Record> {
        let file = File::open(self.path(accession)).map_err(Error::Io)?;
        let decoder = GzDecoder::new(BufReader::new(file));

        genbank::Reader::new(decoder)
            .read_first()
            .map_err(Error::GenBank)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Sequence exports
////////////////////////////////////////////////////////////////////////////////////////

/// The orientation in which IRb is exported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    /// As annotated.
    Forward,

    /// Reverse complemented.
    ReverseComplement,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Forward => write!(f, "forward"),
            Orientation::ReverseComplement => write!(f, "reverse complement"),
        }
    }
}

/// Reverse complements a nucleotide sequence.
///
/// IUPAC ambiguity codes are complemented as well and case is kept.
///
/// # Examples
///
/// ```
/// use plastome_ir::store::reverse_complement;
///
/// assert_eq!(reverse_complement(b"AACgtN"), b"NacGTT");
/// ```
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&base| complement(base)).collect()
}

/// Complements a single base.
fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'a' => b't',
        b't' | b'u' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'r' => b'y',
        b'y' => b'r',
        b'k' => b'm',
        b'm' => b'k',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        other => other,
    }
}

/// The fraction of positions at which two sequences agree (ignoring case),
/// relative to the longer sequence.
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let longest = a.len().max(b.len());

    if longest == 0 {
        return 1.0;
    }

    let matches = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.eq_ignore_ascii_case(y))
        .count();

    matches as f64 / longest as f64
}

/// Orients IRb against IRa.
///
/// IRb is reverse complemented when that makes it more similar to IRa, which
/// is the case for a correctly annotated pair.
pub fn orient(ira: &[u8], irb: &[u8]) -> (Vec<u8>, Orientation) {
    let reversed = reverse_complement(irb);

    if similarity(ira, &reversed) > similarity(ira, irb) {
        (reversed, Orientation::ReverseComplement)
    } else {
        (irb.to_vec(), Orientation::Forward)
    }
}

/// The files written for one accession.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Exported {
    /// The written files.
    paths: Vec<PathBuf>,

    /// The orientation of IRb, if it was written.
    orientation: Option<Orientation>,
}

impl Exported {
    /// Gets the written files.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Gets the orientation of IRb, if it was written.
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }
}

/// Writes FASTA files per accession under a data directory.
#[derive(Clone, Debug)]
pub struct Exporter {
    /// The data directory.
    root: PathBuf,
}

impl Exporter {
    /// Creates an exporter rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Gets the directory of an accession.
    pub fn directory(&self, accession: &str) -> PathBuf {
        self.root.join(accession)
    }

    /// Returns whether the directory of an accession already exists.
    pub fn contains(&self, accession: &str) -> bool {
        self.directory(accession).is_dir()
    }

    /// Exports the complete sequence and whichever inverted repeats were
    /// found.
    ///
    /// The orientation of IRb is decided by comparing it with IRa, so an IRb
    /// found on its own is written as annotated.
    pub fn export(&self, record: &genbank::Record, extraction: &Extraction) -> Result<Exported> {
        let accession = record.accession();
        let sequence = record.sequence();

        if sequence.is_empty() {
            return Err(Error::MissingSequence(accession.to_string()));
        }

        let directory = self.directory(accession);
        std::fs::create_dir_all(&directory).map_err(Error::Io)?;

        let mut exported = Exported::default();

        let name = format!("{accession}_completeSequence");
        let path = directory.join(format!("{accession}_completeSeq.fasta"));
        write_fasta(&path, &name, sequence.to_vec())?;
        exported.paths.push(path);

        let ira = extraction
            .ira()
            .map(|repeat| repeat.interval().extract(sequence))
            .transpose()
            .map_err(Error::Interval)?;
        let irb = extraction
            .irb()
            .map(|repeat| repeat.interval().extract(sequence))
            .transpose()
            .map_err(Error::Interval)?;

        let irb = match (&ira, irb) {
            (Some(ira), Some(irb)) => Some(orient(ira, &irb)),
            (None, Some(irb)) => Some((irb, Orientation::Forward)),
            (_, None) => None,
        };

        if let Some(ira) = ira {
            let name = format!("{accession}_IRa");
            let path = directory.join(format!("{name}.fasta"));
            write_fasta(&path, &name, ira)?;
            exported.paths.push(path);
        }

        if let Some((irb, orientation)) = irb {
            let name = format!("{accession}_IRb_revComp");
            let path = directory.join(format!("{name}.fasta"));
            write_fasta(&path, &name, irb)?;
            exported.paths.push(path);
            exported.orientation = Some(orientation);
        }

        Ok(exported)
    }
}

/// Writes a single-record FASTA file.
fn write_fasta(path: &Path, name: &str, sequence: Vec<u8>) -> Result<()> {
    let file = File::create(path).map_err(Error::Io)?;
    let mut writer = fasta::io::Writer::new(BufWriter::new(file));

    let record = fasta::Record::new(Definition::new(name, None), Sequence::from(sequence));
    writer.write_record(&record).map_err(Error::Io)?;

    writer.get_mut().flush().map_err(Error::Io)
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::extract::Config;
    use crate::extract::Extractor;

    const RECORD: &str = "\
LOCUS       NC_000001                 40 bp    DNA     circular PLN 01-JAN-2020
DEFINITION  Test plastid, complete genome.
ACCESSION   NC_000001
VERSION     NC_000001.1
FEATURES             Location/Qualifiers
     source          1..40
                     /organism=\"Test plastid\"
ORIGIN
        1 aaaacccctt ttggggaaaa ccccttttgg ggaaaacccc
//
";

    #[test]
    fn write_then_read() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("plastome-ir")?;
        let store = RecordStore::new(dir.path().join("records"));

        assert!(!store.contains("NC_000001"));
        let path = store.write("NC_000001", RECORD.as_bytes())?;
        assert!(path.ends_with("NC_000001.gb.gz"));
        assert!(store.contains("NC_000001"));

        let record = store.read("NC_000001")?;
        assert_eq!(record.accession(), "NC_000001");
        assert_eq!(record.length(), 40);
        assert_eq!(record.sequence().len(), 40);
        Ok(())
    }

    #[test]
    fn it_fails_to_read_a_missing_record() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("plastome-ir")?;
        let store = RecordStore::new(dir.path());

        let err = store.read("NC_000001").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        Ok(())
    }

    #[test]
    fn orientation() {
        assert_eq!(reverse_complement(b"ACGTRYKMBVDHN"), b"NDHBVKMRYACGT");
        assert_eq!(similarity(b"ACGT", b"acgt"), 1.0);
        assert_eq!(similarity(b"ACGT", b"AC"), 0.5);
        assert_eq!(similarity(b"", b""), 1.0);

        let (irb, orientation) = orient(b"AACCGT", b"ACGGTT");
        assert_eq!(irb, b"AACCGT");
        assert_eq!(orientation, Orientation::ReverseComplement);

        let (irb, orientation) = orient(b"AACCGT", b"AACCGA");
        assert_eq!(irb, b"AACCGA");
        assert_eq!(orientation, Orientation::Forward);
    }

    #[test]
    fn export_without_repeats() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("plastome-ir")?;
        let store = RecordStore::new(dir.path().join("records"));
        store.write("NC_000001", RECORD.as_bytes())?;
        let record = store.read("NC_000001")?;

        let extraction = Extractor::default().extract(&record);
        let exporter = Exporter::new(dir.path().join("data"));
        let exported = exporter.export(&record, &extraction)?;

        assert!(exporter.contains("NC_000001"));
        assert_eq!(exported.paths().len(), 1);
        assert_eq!(exported.orientation(), None);

        let fasta = std::fs::read_to_string(&exported.paths()[0])?;
        assert!(fasta.starts_with(">NC_000001_completeSequence\n"));
        assert!(fasta.to_lowercase().contains("aaaacccctt"));
        Ok(())
    }

    #[test]
    fn export_a_lone_repeat() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let text = RECORD.replace(
            "                     /organism=\"Test plastid\"\n",
            "                     /organism=\"Test plastid\"\n     \
             repeat_region   1..10\n                     \
             /rpt_type=inverted\n                     /note=\"IRb\"\n",
        );

        let dir = TempDir::new("plastome-ir")?;
        let store = RecordStore::new(dir.path().join("records"));
        store.write("NC_000001", text.as_bytes())?;
        let record = store.read("NC_000001")?;

        let extraction = Extractor::new(Config::default().with_min_length(5)).extract(&record);
        assert!(extraction.ira().is_none());
        assert!(extraction.irb().is_some());

        let exporter = Exporter::new(dir.path().join("data"));
        let exported = exporter.export(&record, &extraction)?;

        assert_eq!(exported.paths().len(), 2);
        assert!(exported.paths()[1].ends_with("NC_000001_IRb_revComp.fasta"));
        assert_eq!(exported.orientation(), Some(Orientation::Forward));

        let fasta = std::fs::read_to_string(&exported.paths()[1])?;
        assert_eq!(fasta.to_lowercase(), ">nc_000001_irb_revcomp\naaaacccctt\n");
        Ok(())
    }

    #[test]
    fn it_fails_to_export_a_record_without_sequence() {
        let record = genbank::Record::new(
            "NC_000001",
            160_000,
            genbank::Topology::Circular,
            Vec::new(),
        );
        let extraction = Extractor::default().extract(&record);

        let err = Exporter::new("data").export(&record, &extraction).unwrap_err();
        assert_eq!(err.to_string(), "record NC_000001 holds no sequence");
    }
}
