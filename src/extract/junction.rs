//! Junctions between the inverted repeats and the single-copy regions.
//!
//! Some records do not annotate the inverted repeats directly but mark the
//! four borders of the quadripartite structure with tiny `misc_feature`s:
//!
//! ```text
//!        JLB          JSB        JSA          JLA
//! | LSC   |    IRb     |   SSC    |    IRa     | (LSC)
//! ```

use crate::annotation::Annotation;
use crate::Interval;

/// The longest feature (in bases) that is considered to be a junction.
pub const MAX_JUNCTION_LENGTH: usize = 2;

/// The number of trailing positions in which an ambiguous junction is taken to
/// be the IRa/LSC junction.
const SEQUENCE_END_WINDOW: usize = 10;

/// A junction between an inverted repeat and a single-copy region.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Junction {
    /// The junction between the large single-copy region and IRb.
    Jlb,

    /// The junction between IRb and the small single-copy region.
    Jsb,

    /// The junction between the small single-copy region and IRa.
    Jsa,

    /// The junction between IRa and the large single-copy region.
    Jla,
}

impl Junction {
    /// All junctions in the order they are tested.
    const ALL: [Junction; 4] = [Junction::Jlb, Junction::Jsb, Junction::Jsa, Junction::Jla];

    /// Identifiers that name exactly this junction.
    fn hard_identifiers(&self) -> &'static [&'static str] {
        match self {
            Junction::Jlb => &["jlb", "lsc-irb", "irb-lsc"],
            Junction::Jsb => &["jsb", "ssc-irb", "irb-ssc"],
            Junction::Jsa => &["jsa", "ssc-ira", "ira-ssc"],
            Junction::Jla => &["jla", "ira-lsc", "lsc-ira"],
        }
    }

    /// Identifiers that name the single-copy region but not the repeat.
    fn soft_identifiers(&self) -> &'static [&'static str] {
        match self {
            Junction::Jlb | Junction::Jla => &["lsc-ir", "ir-lsc"],
            Junction::Jsb | Junction::Jsa => &["ssc-ir", "ir-ssc"],
        }
    }

    /// The abbreviation used in `standard_name` qualifiers.
    fn abbreviation(&self) -> &'static str {
        match self {
            Junction::Jlb => "jlb",
            Junction::Jsb => "jsb",
            Junction::Jsa => "jsa",
            Junction::Jla => "jla",
        }
    }
}

impl std::fmt::Display for Junction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation().to_uppercase())
    }
}

/// The result of classifying a feature as a junction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    /// The feature is not a junction.
    None,

    /// The feature is a junction of a known type.
    Junction(Junction),

    /// The feature is a junction, but its type cannot be determined.
    Ambiguous,
}

/// Classifies an annotation as a junction.
///
/// A `standard_name` of `JLB`, `JSB`, `JSA`, or `JLA` wins outright. Otherwise,
/// the lowercased note is checked against each junction's hard identifiers in
/// turn, collecting soft matches on the way. A single soft match decides the
/// junction. Among several, a feature starting within the last few positions of
/// the sequence is taken to be the JLA; of exactly two candidates otherwise,
/// the first is kept.
///
/// # Examples
///
/// ```
/// use omics::coordinate::Strand;
/// use plastome_ir::annotation::Annotation;
/// use plastome_ir::annotation::Kind;
/// use plastome_ir::annotation::Qualifiers;
/// use plastome_ir::extract::junction;
/// use plastome_ir::extract::junction::Classification;
/// use plastome_ir::extract::junction::Junction;
/// use plastome_ir::Interval;
///
/// let annotation = Annotation::new(
///     Kind::MiscFeature,
///     Interval::try_new(84_000, 84_001)?,
///     Strand::Positive,
///     Qualifiers::default().with_note("junction LSC-IRb"),
/// );
///
/// assert_eq!(
///     junction::classify(&annotation, 150_000),
///     Classification::Junction(Junction::Jlb)
/// );
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn classify(annotation: &Annotation, sequence_length: usize) -> Classification {
    if annotation.interval().len(sequence_length).unwrap_or(usize::MAX) > MAX_JUNCTION_LENGTH {
        return Classification::None;
    }

    if let Some(name) = annotation.qualifiers().standard_name() {
        let name = name.to_lowercase();

        if let Some(junction) = Junction::ALL.iter().find(|j| j.abbreviation() == name) {
            return Classification::Junction(*junction);
        }
    }

    let note = match annotation.note_lowercase() {
        Some(note) => note,
        None => return Classification::None,
    };

    let mut possible = Vec::new();

    for junction in Junction::ALL {
        if junction.hard_identifiers().iter().any(|id| note.contains(id)) {
            return Classification::Junction(junction);
        }

        if junction.soft_identifiers().iter().any(|id| note.contains(id)) {
            possible.push(junction);
        }
    }

    match possible.as_slice() {
        [] => Classification::None,
        [junction] => Classification::Junction(*junction),
        candidates if candidates.contains(&Junction::Jla) => {
            let start = annotation.interval().start();

            if start + SEQUENCE_END_WINDOW > sequence_length {
                Classification::Junction(Junction::Jla)
            } else if candidates.len() == 2 {
                Classification::Junction(candidates[0])
            } else {
                Classification::Ambiguous
            }
        }
        _ => Classification::Ambiguous,
    }
}

/// The junctions located in a record.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Junctions {
    /// The LSC/IRb junction.
    jlb: Option<Interval>,

    /// The IRb/SSC junction.
    jsb: Option<Interval>,

    /// The SSC/IRa junction.
    jsa: Option<Interval>,

    /// The IRa/LSC junction.
    jla: Option<Interval>,

    /// Junctions whose type could not be determined.
    ambiguous: Vec<Interval>,
}

impl Junctions {
    /// Collects the junctions from a set of annotations.
    ///
    /// When a junction type is found more than once, the last one wins.
    pub fn collect<'a>(
        annotations: impl IntoIterator<Item = &'a Annotation>,
        sequence_length: usize,
    ) -> Self {
        let mut junctions = Self::default();

        for annotation in annotations {
            let interval = *annotation.interval();

            match classify(annotation, sequence_length) {
                Classification::None => {}
                Classification::Ambiguous => junctions.ambiguous.push(interval),
                Classification::Junction(Junction::Jlb) => junctions.jlb = Some(interval),
                Classification::Junction(Junction::Jsb) => junctions.jsb = Some(interval),
                Classification::Junction(Junction::Jsa) => junctions.jsa = Some(interval),
                Classification::Junction(Junction::Jla) => junctions.jla = Some(interval),
            }
        }

        junctions
    }

    /// Gets the junctions whose type could not be determined.
    pub fn ambiguous(&self) -> &[Interval] {
        &self.ambiguous
    }

    /// Returns whether no junction at all was found.
    pub fn is_empty(&self) -> bool {
        self.jlb.is_none()
            && self.jsb.is_none()
            && self.jsa.is_none()
            && self.jla.is_none()
            && self.ambiguous.is_empty()
    }

    /// Infers IRb as the region spanned by the JLB and JSB junctions.
    ///
    /// The inferred region includes the innermost base of each junction.
    pub fn irb(&self) -> Option<Interval> {
        let (jlb, jsb) = (self.jlb?, self.jsb?);
        span(&jlb, &jsb)
    }

    /// Infers IRa as the region spanned by the JSA and JLA junctions.
    ///
    /// Without a JLA, the sequence is assumed to be split at the JLA: IRa then
    /// runs from the JSA to the sequence end, or from the sequence start to the
    /// JSA when the JSA precedes the JSB.
    pub fn ira(&self, sequence_length: usize) -> Option<Interval> {
        let jsa = self.jsa?;

        if let Some(jla) = self.jla {
            return span(&jsa, &jla);
        }

        match self.jsb {
            Some(jsb) if jsa.start() < jsb.start() => Interval::try_new(1, jsa.start()).ok(),
            _ => Interval::try_new(jsa.end(), sequence_length).ok(),
        }
    }
}

/// Gets the region between two junctions, ordered by their position.
fn span(a: &Interval, b: &Interval) -> Option<Interval> {
    let (first, second) = if a.start() < b.start() { (a, b) } else { (b, a) };
    Interval::try_new(first.end(), second.start()).ok()
}

#[cfg(test)]
mod tests {
    use omics::coordinate::Strand;

    use super::*;
    use crate::annotation::Kind;
    use crate::annotation::Qualifiers;

    fn junction(start: usize, note: &str) -> Annotation {
        Annotation::new(
            Kind::MiscFeature,
            Interval::try_new(start, start + 1).unwrap(),
            Strand::Positive,
            Qualifiers::default().with_note(note),
        )
    }

    #[test]
    fn hard_identifiers() {
        let cases = [
            ("JLB", Junction::Jlb),
            ("junction IRb-SSC", Junction::Jsb),
            ("SSC-IRa border", Junction::Jsa),
            ("jla", Junction::Jla),
        ];

        for (note, expected) in cases {
            assert_eq!(
                classify(&junction(100, note), 1_000),
                Classification::Junction(expected),
                "{note}"
            );
        }
    }

    #[test]
    fn soft_identifiers() {
        // LSC-IR matches both JLB and JLA.
        assert_eq!(
            classify(&junction(100, "LSC-IR"), 1_000),
            Classification::Junction(Junction::Jlb)
        );
        assert_eq!(
            classify(&junction(995, "IR-LSC"), 1_000),
            Classification::Junction(Junction::Jla)
        );

        // SSC-IR matches both JSB and JSA.
        assert_eq!(
            classify(&junction(500, "SSC-IR"), 1_000),
            Classification::Ambiguous
        );
    }

    #[test]
    fn standard_name_wins() {
        let annotation = Annotation::new(
            Kind::MiscFeature,
            Interval::try_new(10, 10).unwrap(),
            Strand::Positive,
            Qualifiers::default()
                .with_note("JLB")
                .with_standard_name("JSA"),
        );

        assert_eq!(
            classify(&annotation, 1_000),
            Classification::Junction(Junction::Jsa)
        );
    }

    #[test]
    fn long_features_are_not_junctions() {
        let annotation = Annotation::new(
            Kind::MiscFeature,
            Interval::try_new(10, 20).unwrap(),
            Strand::Positive,
            Qualifiers::default().with_note("JLB"),
        );

        assert_eq!(classify(&annotation, 1_000), Classification::None);
    }

    #[test]
    fn infer_from_all_junctions() -> Result<(), Box<dyn std::error::Error>> {
        let annotations = [
            junction(84_000, "JLB"),
            junction(110_000, "JSB"),
            junction(128_000, "JSA"),
            junction(153_999, "JLA"),
        ];

        let junctions = Junctions::collect(&annotations, 154_000);
        assert_eq!(junctions.irb(), Some(Interval::try_new(84_001, 110_000)?));
        assert_eq!(
            junctions.ira(154_000),
            Some(Interval::try_new(128_001, 153_999)?)
        );
        assert!(junctions.ambiguous().is_empty());
        Ok(())
    }

    #[test]
    fn infer_ira_without_jla() -> Result<(), Box<dyn std::error::Error>> {
        let annotations = [junction(110_000, "JSB"), junction(128_000, "JSA")];
        let junctions = Junctions::collect(&annotations, 154_000);

        assert_eq!(junctions.irb(), None);
        assert_eq!(
            junctions.ira(154_000),
            Some(Interval::try_new(128_001, 154_000)?)
        );

        // IRa at the start of the sequence.
        let annotations = [junction(20_000, "JSA"), junction(40_000, "JSB")];
        let junctions = Junctions::collect(&annotations, 154_000);
        assert_eq!(junctions.ira(154_000), Some(Interval::try_new(1, 20_000)?));
        Ok(())
    }
}
