//! `plastome_ir` is a crate for locating the inverted repeats of plastid
//! genomes and checking the reported coordinates against self-alignments.
//!
//! The crate provides three main points of entry:
//!
//! - Extracting the annotated inverted repeats from a GenBank record.
//! - Inferring the inverted repeats from a self-alignment of the sequence.
//! - Reconciling the two into a table of discrepancies.
//!
//! ## Extracting the annotated inverted repeats
//!
//! GenBank records are read with [`genbank::Reader`], which converts each
//! feature into a typed [`annotation::Annotation`]. An
//! [`extract::Extractor`] then walks through the ways a submitter may have
//! annotated the repeats (typed repeat regions, named repeat regions or misc
//! features, junction features, and finally the complement of the single-copy
//! regions) until both IRa and IRb are found. Coordinates are 1-based and
//! inclusive; an [`Interval`] whose end lies before its start wraps around the
//! end of the circular sequence.
//!
//! ```
//! use omics::coordinate::Strand;
//! use plastome_ir::annotation::Annotation;
//! use plastome_ir::annotation::Kind;
//! use plastome_ir::annotation::Qualifiers;
//! use plastome_ir::extract::Extractor;
//! use plastome_ir::genbank::Record;
//! use plastome_ir::genbank::Topology;
//! use plastome_ir::Interval;
//!
//! let feature = |start, end, note: &str| -> Result<Annotation, Box<dyn std::error::Error>> {
//!     Ok(Annotation::new(
//!         Kind::MiscFeature,
//!         Interval::try_new(start, end)?,
//!         Strand::Positive,
//!         Qualifiers::default().with_note(note),
//!     ))
//! };
//!
//! let record = Record::new(
//!     "NC_000001",
//!     160_000,
//!     Topology::Circular,
//!     vec![
//!         feature(1, 25_000, "inverted repeat B")?,
//!         feature(130_001, 155_000, "inverted repeat A")?,
//!     ],
//! );
//!
//! let extraction = Extractor::default().extract(&record);
//! let pair = extraction.pair().unwrap();
//!
//! assert_eq!(pair.ira().interval(), &Interval::try_new(130_001, 155_000)?);
//! assert_eq!(pair.length(), 25_000);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Inferring and reconciling
//!
//! The two copies of the inverted repeat show up in a self-alignment as a long
//! hit on the reverse strand. [`alignment::Reader`] reads BLAST tabular
//! output, [`infer::Inferrer`] selects the hit that most plausibly spans the
//! repeats, and [`reconcile::Discrepancy`] compares its length against the
//! reported one.
//!
//! ```
//! use plastome_ir::alignment::Reader;
//! use plastome_ir::infer::Inferrer;
//! use plastome_ir::reconcile::Discrepancy;
//! use plastome_ir::reconcile::Tolerance;
//!
//! let data = b"a\ta\t99.9\t24998\t0\t0\t1\t24998\t155000\t130003\t0.0\t1\n";
//! let mut reader = Reader::new(&data[..]);
//! let hits = reader.hits().collect::<Result<Vec<_>, _>>()?;
//!
//! let inferred = Inferrer::default().infer(hits).map(|pair| pair.alignment_length());
//! let discrepancy = Discrepancy::from_lengths("NC_000001", Some(25_000), inferred, Tolerance::default());
//!
//! assert_eq!(discrepancy.status(), "no mismatch");
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The binaries (behind the `binaries` feature) tie these together with the
//! NCBI E-utilities ([`entrez`]), an on-disk [`store`] of records, and the
//! [`accession`] and [`report`] tables.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod accession;
pub mod alignment;
pub mod annotation;
#[cfg(feature = "binaries")]
pub mod entrez;
pub mod extract;
pub mod genbank;
pub mod infer;
pub mod interval;
pub mod reconcile;
pub mod report;
pub mod store;

pub use interval::Interval;
