//! Reconciliation of reported and inferred inverted repeat lengths.

use std::io::Write;
use std::io::{self};

use crate::extract::IrPair;
use crate::infer::InferredPair;

/// The header of a discrepancy table.
pub const HEADER: [&str; 6] = [
    "ACCESSION",
    "REPORTED_LENGTH",
    "INFERRED_LENGTH",
    "DIFFERENCE",
    "MISMATCH",
    "STATUS",
];

/// The delimiter between columns.
const DELIMITER: &str = "\t";

/// The default tolerance (as a fraction of the reported length).
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// The largest difference between the reported and the inferred length that
/// is not a mismatch, as a fraction of the reported length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Creates a new tolerance.
    pub fn new(fraction: f64) -> Self {
        Self(fraction)
    }

    /// Gets the tolerance as a fraction of the reported length.
    pub fn fraction(&self) -> f64 {
        self.0
    }

    /// Gets the largest allowed difference for a reported length.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::reconcile::Tolerance;
    ///
    /// assert_eq!(Tolerance::default().allowed(25_000), 250.0);
    /// ```
    pub fn allowed(&self, reported: usize) -> f64 {
        self.0 * reported as f64
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

/// The evidence available for one accession.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Evidence {
    /// Both a reported and an inferred length.
    Both {
        /// The reported length.
        reported: usize,

        /// The inferred length.
        inferred: usize,

        /// The inferred minus the reported length.
        difference: i64,

        /// Whether the difference exceeds the tolerance.
        mismatch: bool,
    },

    /// Only a reported length.
    ReportedOnly(usize),

    /// Only an inferred length.
    InferredOnly(usize),

    /// Neither.
    Neither,
}

/// The reconciliation of one accession.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Discrepancy {
    /// The accession.
    accession: String,

    /// The evidence.
    evidence: Evidence,
}

impl Discrepancy {
    /// Reconciles a reported and an inferred pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::reconcile::Discrepancy;
    /// use plastome_ir::reconcile::Evidence;
    /// use plastome_ir::reconcile::Tolerance;
    ///
    /// let discrepancy = Discrepancy::from_lengths("NC_000001", Some(25_000), Some(24_998), Tolerance::default());
    ///
    /// assert_eq!(
    ///     discrepancy.evidence(),
    ///     &Evidence::Both {
    ///         reported: 25_000,
    ///         inferred: 24_998,
    ///         difference: -2,
    ///         mismatch: false,
    ///     }
    /// );
    /// assert_eq!(discrepancy.status(), "no mismatch");
    /// ```
    pub fn from_lengths(
        accession: impl Into<String>,
        reported: Option<usize>,
        inferred: Option<usize>,
        tolerance: Tolerance,
    ) -> Self {
        let evidence = match (reported, inferred) {
            (Some(reported), Some(inferred)) => {
                let difference = inferred as i64 - reported as i64;

                Evidence::Both {
                    reported,
                    inferred,
                    difference,
                    mismatch: difference.unsigned_abs() as f64 > tolerance.allowed(reported),
                }
            }
            (Some(reported), None) => Evidence::ReportedOnly(reported),
            (None, Some(inferred)) => Evidence::InferredOnly(inferred),
            (None, None) => Evidence::Neither,
        };

        Self {
            accession: accession.into(),
            evidence,
        }
    }

    /// Reconciles an optional reported and an optional inferred pair.
    pub fn new(
        accession: impl Into<String>,
        reported: Option<&IrPair>,
        inferred: Option<&InferredPair>,
        tolerance: Tolerance,
    ) -> Self {
        Self::from_lengths(
            accession,
            reported.map(IrPair::length),
            inferred.map(InferredPair::alignment_length),
            tolerance,
        )
    }

    /// Gets the accession.
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// Gets the evidence.
    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Whether the difference exceeds the tolerance.
    pub fn is_mismatch(&self) -> bool {
        matches!(self.evidence, Evidence::Both { mismatch: true, .. })
    }

    /// Gets a short description of the outcome.
    pub fn status(&self) -> &'static str {
        match self.evidence {
            Evidence::Both { mismatch: true, .. } => "mismatch",
            Evidence::Both { mismatch: false, .. } => "no mismatch",
            Evidence::ReportedOnly(_) => "not inferred",
            Evidence::InferredOnly(_) => "not reported",
            Evidence::Neither => "no IR evidence",
        }
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (reported, inferred, difference, mismatch) = match self.evidence {
            Evidence::Both {
                reported,
                inferred,
                difference,
                mismatch,
            } => (
                reported.to_string(),
                inferred.to_string(),
                difference.to_string(),
                if mismatch { "mismatch" } else { "no mismatch" },
            ),
            Evidence::ReportedOnly(reported) => (
                reported.to_string(),
                String::from("not inferred"),
                String::new(),
                "",
            ),
            Evidence::InferredOnly(inferred) => (
                String::from("not reported"),
                inferred.to_string(),
                String::new(),
                "",
            ),
            Evidence::Neither => (
                String::from("not reported"),
                String::from("not inferred"),
                String::new(),
                "",
            ),
        };

        write!(
            f,
            "{}{DELIMITER}{reported}{DELIMITER}{inferred}{DELIMITER}{difference}{DELIMITER}{mismatch}{DELIMITER}{}",
            self.accession,
            self.status()
        )
    }
}

/// An append-only collection of discrepancies.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report(Vec<Discrepancy>);

impl Report {
    /// Adds a discrepancy to the report.
    pub fn push(mut self, discrepancy: Discrepancy) -> Self {
        self.0.push(discrepancy);
        self
    }

    /// Gets the discrepancies.
    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.0
    }

    /// Counts the discrepancies with the given status.
    pub fn count(&self, status: &str) -> usize {
        self.0.iter().filter(|d| d.status() == status).count()
    }

    /// Writes the report as a tab-separated table.
    pub fn write<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        writeln!(writer, "{}", HEADER.join(DELIMITER))?;

        for discrepancy in &self.0 {
            writeln!(writer, "{discrepancy}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_lengths() {
        let discrepancy =
            Discrepancy::from_lengths("NC_000001", Some(25_000), Some(25_000), Tolerance::default());

        assert_eq!(
            discrepancy.evidence(),
            &Evidence::Both {
                reported: 25_000,
                inferred: 25_000,
                difference: 0,
                mismatch: false,
            }
        );
        assert_eq!(discrepancy.status(), "no mismatch");
    }

    #[test]
    fn tolerance_is_exclusive() {
        let at = Discrepancy::from_lengths("a", Some(25_000), Some(25_250), Tolerance::default());
        assert!(!at.is_mismatch());

        let above = Discrepancy::from_lengths("a", Some(25_000), Some(24_749), Tolerance::default());
        assert!(above.is_mismatch());
        assert_eq!(above.status(), "mismatch");
    }

    #[test]
    fn missing_sides() {
        let cases = [
            (Some(25_000), None, "not inferred"),
            (None, Some(25_000), "not reported"),
            (None, None, "no IR evidence"),
        ];

        for (reported, inferred, status) in cases {
            let discrepancy = Discrepancy::from_lengths("a", reported, inferred, Tolerance::default());
            assert_eq!(discrepancy.status(), status);
            assert!(!discrepancy.is_mismatch());
        }
    }

    #[test]
    fn from_pairs() -> Result<(), Box<dyn std::error::Error>> {
        use crate::alignment::Hit;
        use crate::alignment::Layout;
        use crate::extract::InvertedRepeat;
        use crate::extract::Source;
        use crate::Interval;

        let repeat = |start, end, length| -> Result<InvertedRepeat, Box<dyn std::error::Error>> {
            Ok(InvertedRepeat::new(
                Interval::try_new(start, end)?,
                length,
                Source::RepeatRegion,
            ))
        };

        let reported = IrPair::new(repeat(130_001, 155_000, 25_000)?, repeat(1, 25_001, 25_001)?);
        let hit = Hit::parse(
            "a\ta\t99.9\t24998\t0\t0\t1\t24998\t155000\t130003\t0.0\t1",
            &Layout::default(),
        )?;
        let inferred = InferredPair::from_hit(&hit);

        let discrepancy =
            Discrepancy::new("NC_000001", Some(&reported), Some(&inferred), Tolerance::default());

        assert_eq!(
            discrepancy.evidence(),
            &Evidence::Both {
                reported: 25_001,
                inferred: 24_998,
                difference: -3,
                mismatch: false,
            }
        );

        let discrepancy = Discrepancy::new("NC_000001", None, Some(&inferred), Tolerance::default());
        assert_eq!(discrepancy.evidence(), &Evidence::InferredOnly(24_998));
        Ok(())
    }

    #[test]
    fn extracted_and_inferred() -> Result<(), Box<dyn std::error::Error>> {
        use omics::coordinate::Strand;

        use crate::alignment::Reader;
        use crate::annotation::Annotation;
        use crate::annotation::Kind;
        use crate::annotation::Qualifiers;
        use crate::annotation::RepeatType;
        use crate::extract::Extractor;
        use crate::genbank::Record;
        use crate::genbank::Topology;
        use crate::infer::Inferrer;
        use crate::Interval;

        let repeat = |start, end| -> Result<Annotation, Box<dyn std::error::Error>> {
            Ok(Annotation::new(
                Kind::RepeatRegion,
                Interval::try_new(start, end)?,
                Strand::Positive,
                Qualifiers::default().with_rpt_type(RepeatType::Inverted),
            ))
        };

        let record = Record::new(
            "NC_000001",
            160_000,
            Topology::Circular,
            vec![repeat(1, 25_000)?, repeat(130_001, 155_000)?],
        );
        let extraction = Extractor::default().extract(&record);
        let reported = extraction.pair();

        let data = b"a\ta\t99.9\t24998\t0\t0\t1\t24998\t155000\t130003\t0.0\t1\n";
        let hits = Reader::new(&data[..]).hits().collect::<Result<Vec<_>, _>>()?;
        let inferred = Inferrer::default().infer(hits);

        let discrepancy = Discrepancy::new(
            record.accession(),
            reported.as_ref(),
            inferred.as_ref(),
            Tolerance::default(),
        );

        assert_eq!(discrepancy.accession(), "NC_000001");
        assert_eq!(
            discrepancy.evidence(),
            &Evidence::Both {
                reported: 25_000,
                inferred: 24_998,
                difference: -2,
                mismatch: false,
            }
        );
        assert_eq!(discrepancy.status(), "no mismatch");
        Ok(())
    }

    #[test]
    fn write_report() -> Result<(), Box<dyn std::error::Error>> {
        let report = Report::default()
            .push(Discrepancy::from_lengths(
                "NC_000001",
                Some(25_000),
                Some(24_998),
                Tolerance::default(),
            ))
            .push(Discrepancy::from_lengths(
                "NC_000002",
                None,
                Some(26_000),
                Tolerance::default(),
            ))
            .push(Discrepancy::from_lengths("NC_000003", None, None, Tolerance::default()));

        let mut buffer = Vec::new();
        report.write(&mut buffer)?;

        assert_eq!(
            String::from_utf8(buffer)?,
            "ACCESSION\tREPORTED_LENGTH\tINFERRED_LENGTH\tDIFFERENCE\tMISMATCH\tSTATUS\n\
             NC_000001\t25000\t24998\t-2\tno mismatch\tno mismatch\n\
             NC_000002\tnot reported\t26000\t\t\tnot reported\n\
             NC_000003\tnot reported\tnot inferred\t\t\tno IR evidence\n"
        );
        assert_eq!(report.count("no mismatch"), 1);
        Ok(())
    }
}
