//! Inference of the inverted repeats from a self-alignment.
//!
//! When a plastid genome is aligned against itself, the two copies of the
//! inverted repeat show up as a long hit whose subject runs on the reverse
//! strand. [`Inferrer::infer()`] picks that hit out of the remaining noise.

use std::cmp::Ordering;
use std::collections::HashSet;

use nonempty::NonEmpty;
use omics::coordinate::Strand;

use crate::alignment::Hit;
use crate::Interval;

/// The default exclusive lower bound of the alignment length.
pub const DEFAULT_MIN_ALIGNMENT_LENGTH: usize = 10_000;

/// The default exclusive upper bound of the alignment length.
pub const DEFAULT_MAX_ALIGNMENT_LENGTH: usize = 50_000;

/// The range of alignment lengths that are plausible for an inverted repeat.
///
/// Both bounds are exclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    /// The exclusive lower bound.
    min: usize,

    /// The exclusive upper bound.
    max: usize,
}

impl Window {
    /// Creates a new window.
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Gets the exclusive lower bound.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Gets the exclusive upper bound.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Returns whether `length` lies strictly inside the window.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::infer::Window;
    ///
    /// let window = Window::default();
    ///
    /// assert!(window.contains(24_998));
    /// assert!(!window.contains(10_000));
    /// assert!(!window.contains(50_000));
    /// ```
    pub fn contains(&self, length: usize) -> bool {
        length > self.min && length < self.max
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ALIGNMENT_LENGTH,
            max: DEFAULT_MAX_ALIGNMENT_LENGTH,
        }
    }
}

/// A pair of inverted repeats inferred from one self-alignment hit.
#[derive(Clone, Debug, PartialEq)]
pub struct InferredPair {
    /// The copy that comes first on the sequence.
    irb: Interval,

    /// The copy that comes second on the sequence.
    ira: Interval,

    /// The alignment length.
    alignment_length: usize,

    /// The percent identity.
    identity: f64,
}

impl InferredPair {
    /// Creates an inferred pair from a hit.
    ///
    /// The aligned region that starts first is taken to be IRb.
    pub fn from_hit(hit: &Hit) -> Self {
        let (query, subject) = (hit.query(), hit.subject());
        let (irb, ira) = if query <= subject {
            (query, subject)
        } else {
            (subject, query)
        };

        Self {
            irb,
            ira,
            alignment_length: hit.alignment_length(),
            identity: hit.identity(),
        }
    }

    /// Gets the copy that comes first on the sequence.
    pub fn irb(&self) -> &Interval {
        &self.irb
    }

    /// Gets the copy that comes second on the sequence.
    pub fn ira(&self) -> &Interval {
        &self.ira
    }

    /// Gets the alignment length.
    pub fn alignment_length(&self) -> usize {
        self.alignment_length
    }

    /// Gets the percent identity.
    pub fn identity(&self) -> f64 {
        self.identity
    }
}

/// Selects inverted repeat candidates from self-alignment hits.
#[derive(Clone, Debug, Default)]
pub struct Inferrer {
    /// The window of plausible alignment lengths.
    window: Window,

    /// The expected length of an inverted repeat, if known.
    expected_length: Option<usize>,
}

impl Inferrer {
    /// Creates a new inferrer.
    pub fn new(window: Window) -> Self {
        Self {
            window,
            expected_length: None,
        }
    }

    /// Sets the expected length of an inverted repeat.
    ///
    /// This is used to break ties between equally good candidates.
    pub fn with_expected_length(mut self, expected_length: Option<usize>) -> Self {
        self.expected_length = expected_length;
        self
    }

    /// Gets the window of plausible alignment lengths.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Collects the candidate pairs from a set of hits.
    ///
    /// A hit qualifies when its alignment length lies inside the window, its
    /// subject runs on the reverse strand, and its query and subject do not
    /// overlap. Symmetric hits collapse into a single candidate.
    pub fn candidates(&self, hits: impl IntoIterator<Item = Hit>) -> Option<NonEmpty<InferredPair>> {
        let mut seen = HashSet::new();
        let mut candidates: Option<NonEmpty<InferredPair>> = None;

        for hit in hits {
            if !self.window.contains(hit.alignment_length())
                || hit.strand() != Strand::Negative
                || overlapping(&hit.query(), &hit.subject())
            {
                continue;
            }

            let pair = InferredPair::from_hit(&hit);

            if !seen.insert((pair.irb, pair.ira)) {
                continue;
            }

            candidates = match candidates {
                Some(mut candidates) => {
                    candidates.push(pair);
                    Some(candidates)
                }
                None => Some(NonEmpty::new(pair)),
            };
        }

        candidates
    }

    /// Infers the inverted repeats from a set of hits.
    ///
    /// The candidate with the highest identity wins. Ties go to the alignment
    /// length closest to the expected length (if one is set) or else to the
    /// longest alignment, and finally to the earliest first copy.
    ///
    /// # Examples
    ///
    /// ```
    /// use plastome_ir::alignment::Reader;
    /// use plastome_ir::infer::Inferrer;
    /// use plastome_ir::Interval;
    ///
    /// let data = b"a\ta\t100.0\t160000\t0\t0\t1\t160000\t1\t160000\t0.0\t1\na\ta\t99.9\t24998\t0\t0\t130003\t155000\t24998\t1\t0.0\t1\n";
    /// let mut reader = Reader::new(&data[..]);
    /// let hits = reader.hits().collect::<Result<Vec<_>, _>>()?;
    ///
    /// let pair = Inferrer::default().infer(hits).unwrap();
    /// assert_eq!(pair.alignment_length(), 24_998);
    /// assert_eq!(pair.irb(), &Interval::try_new(1, 24_998)?);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn infer(&self, hits: impl IntoIterator<Item = Hit>) -> Option<InferredPair> {
        let candidates = self.candidates(hits)?;
        Some(self.select(&candidates).clone())
    }

    /// Selects the best candidate.
    pub fn select<'a>(&self, candidates: &'a NonEmpty<InferredPair>) -> &'a InferredPair {
        let mut best = &candidates.head;

        for candidate in &candidates.tail {
            if self.rank(candidate, best) == Ordering::Greater {
                best = candidate;
            }
        }

        best
    }

    /// Orders two candidates so that the better one is greater.
    fn rank(&self, a: &InferredPair, b: &InferredPair) -> Ordering {
        a.identity
            .total_cmp(&b.identity)
            .then_with(|| match self.expected_length {
                Some(expected) => b
                    .alignment_length
                    .abs_diff(expected)
                    .cmp(&a.alignment_length.abs_diff(expected)),
                None => a.alignment_length.cmp(&b.alignment_length),
            })
            .then_with(|| b.irb.cmp(&a.irb))
    }
}

/// Returns whether two non-wrapping intervals share a position.
fn overlapping(a: &Interval, b: &Interval) -> bool {
    a.start() <= b.end() && b.start() <= a.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Layout;

    fn hit(identity: f64, length: usize, q: (usize, usize), s: (usize, usize)) -> Hit {
        let line = format!(
            "x\tx\t{identity}\t{length}\t0\t0\t{}\t{}\t{}\t{}\t0.0\t1",
            q.0, q.1, s.0, s.1
        );
        Hit::parse(&line, &Layout::default()).unwrap()
    }

    #[test]
    fn it_ignores_hits_outside_of_the_window() {
        let hits = vec![
            hit(100.0, 10_000, (1, 10_000), (160_000, 150_001)),
            hit(100.0, 50_000, (1, 50_000), (160_000, 110_001)),
            hit(100.0, 160_000, (1, 160_000), (1, 160_000)),
        ];

        assert!(Inferrer::default().infer(hits).is_none());
    }

    #[test]
    fn it_ignores_forward_and_overlapping_hits() {
        let hits = vec![
            hit(100.0, 20_000, (1, 20_000), (50_001, 70_000)),
            hit(100.0, 20_000, (1, 20_000), (25_000, 5_001)),
        ];

        assert!(Inferrer::default().infer(hits).is_none());
    }

    #[test]
    fn it_collapses_symmetric_hits() {
        let hits = vec![
            hit(99.9, 24_998, (130_003, 155_000), (24_998, 1)),
            hit(99.9, 24_998, (1, 24_998), (155_000, 130_003)),
        ];

        let candidates = Inferrer::default().candidates(hits).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn it_selects_the_highest_identity() -> Result<(), Box<dyn std::error::Error>> {
        let hits = vec![
            hit(97.0, 30_000, (1, 30_000), (160_000, 130_001)),
            hit(99.5, 24_998, (130_003, 155_000), (24_998, 1)),
        ];

        let pair = Inferrer::default().infer(hits).unwrap();
        assert_eq!(pair.alignment_length(), 24_998);
        assert_eq!(pair.identity(), 99.5);
        assert_eq!(pair.irb(), &Interval::try_new(1, 24_998)?);
        assert_eq!(pair.ira(), &Interval::try_new(130_003, 155_000)?);
        Ok(())
    }

    #[test]
    fn it_breaks_ties_by_expected_length() {
        let hits = vec![
            hit(100.0, 30_000, (1, 30_000), (160_000, 130_001)),
            hit(100.0, 25_000, (2, 25_001), (155_000, 130_001)),
        ];

        let pair = Inferrer::default().infer(hits.clone()).unwrap();
        assert_eq!(pair.alignment_length(), 30_000);

        let pair = Inferrer::default()
            .with_expected_length(Some(25_000))
            .infer(hits)
            .unwrap();
        assert_eq!(pair.alignment_length(), 25_000);
    }

    #[test]
    fn it_breaks_remaining_ties_by_position() -> Result<(), Box<dyn std::error::Error>> {
        let hits = vec![
            hit(100.0, 20_000, (40_001, 60_000), (100_000, 80_001)),
            hit(100.0, 20_000, (1, 20_000), (160_000, 140_001)),
        ];

        let pair = Inferrer::default().infer(hits).unwrap();
        assert_eq!(pair.irb(), &Interval::try_new(1, 20_000)?);
        Ok(())
    }
}
