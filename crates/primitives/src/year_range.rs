//! Inclusive year ranges used to gate commands.

use core::fmt;

/// An inclusive range of simulated years.
///
/// `None` bounds mean "beginning" (start) and "onwards" (end). Finite bounds
/// are swapped into ascending order at construction; a missing bound
/// suppresses the swap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YearRange {
    start: Option<i32>,
    end: Option<i32>,
}

impl YearRange {
    /// Creates a range, swapping finite bounds into ascending order.
    pub fn new(start: Option<i32>, end: Option<i32>) -> Self {
        match (start, end) {
            (Some(a), Some(b)) if a > b => Self {
                start: Some(b),
                end: Some(a),
            },
            _ => Self { start, end },
        }
    }

    /// A range covering a single year.
    pub fn single(year: i32) -> Self {
        Self {
            start: Some(year),
            end: Some(year),
        }
    }

    /// The range covering every year.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// The lower bound, `None` meaning "beginning".
    #[inline]
    pub const fn start(&self) -> Option<i32> {
        self.start
    }

    /// The upper bound, `None` meaning "onwards".
    #[inline]
    pub const fn end(&self) -> Option<i32> {
        self.end
    }

    /// Whether the range covers exactly one year.
    #[inline]
    pub fn is_single(&self) -> bool {
        self.start.is_some() && self.start == self.end
    }

    /// Inclusive membership test.
    #[inline]
    pub fn contains(&self, year: i32) -> bool {
        self.start.is_none_or(|s| year >= s) && self.end.is_none_or(|e| year <= e)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s == e => write!(f, "year {s}"),
            (start, end) => {
                write!(f, "years ")?;
                match start {
                    Some(s) => write!(f, "{s}")?,
                    None => write!(f, "beginning")?,
                }
                write!(f, " to ")?;
                match end {
                    Some(e) => write!(f, "{e}"),
                    None => write!(f, "onwards"),
                }
            }
        }
    }
}
