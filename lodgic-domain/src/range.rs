use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    #[error("Invalid stay range: check-out {check_out} must be after check-in {check_in}")]
    Invalid {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

/// Half-open stay interval [check_in, check_out).
///
/// A guest checking out on day X frees the room for a check-in on day X,
/// so back-to-back stays never conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, RangeError> {
        if check_out <= check_in {
            return Err(RangeError::Invalid {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Two half-open ranges overlap iff a1 < b2 AND b1 < a2.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Iterate the occupied nights: every date in [check_in, check_out).
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.check_in;
        let nights = self.nights();
        (0..nights).map(move |n| start + Duration::days(n))
    }
}
