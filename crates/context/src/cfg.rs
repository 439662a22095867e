//! Run configuration.

/// Configuration for one engine run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cfg {
    /// First simulated year.
    pub start_year: i32,
    /// Final simulated year, inclusive.
    pub end_year: i32,
    /// Reject NaN and infinite magnitudes before storing them.
    pub check_nan: bool,
    /// Reject negative stream magnitudes after conversion.
    pub check_non_negative: bool,
}

impl Cfg {
    /// Creates a configuration for the inclusive year span, with both value
    /// guards enabled. Bounds are swapped into ascending order.
    pub fn new(start_year: i32, end_year: i32) -> Self {
        let (start_year, end_year) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };
        Self {
            start_year,
            end_year,
            check_nan: true,
            check_non_negative: true,
        }
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_default_on() {
        let cfg = Cfg::new(1, 10);
        assert!(cfg.check_nan);
        assert!(cfg.check_non_negative);
    }

    #[test]
    fn year_bounds_swap_ascending() {
        let cfg = Cfg::new(10, 1);
        assert_eq!((cfg.start_year, cfg.end_year), (1, 10));
    }
}
