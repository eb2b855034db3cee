//! Pass/fail judgement of a size change

use crate::fmt::human_size;
use crate::report::headline;
use crate::status::CommitState;

/// Outcome of comparing the total delta with the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Final status state: `Success` or `Failure`
    pub state: CommitState,
    /// Sum of all artifact deltas
    pub total_delta: i64,
    /// Increase allowed before failing
    pub threshold: i64,
    /// Status description
    pub description: String,
}

impl Verdict {
    /// Fail when the total size grew by more than `threshold` bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_delta::pipeline::Verdict;
    ///
    /// let verdict = Verdict::judge(3999, 2000);
    /// assert!(!verdict.passed());
    /// assert!(verdict.description.contains("+4kB"));
    /// assert!(Verdict::judge(2000, 2000).passed());
    /// ```
    pub fn judge(total_delta: i64, threshold: i64) -> Self {
        if total_delta > threshold {
            Self {
                state: CommitState::Failure,
                total_delta,
                threshold,
                description: format!(
                    "{}, more than the {} threshold",
                    headline(total_delta),
                    human_size(threshold)
                ),
            }
        } else {
            Self {
                state: CommitState::Success,
                total_delta,
                threshold,
                description: headline(total_delta),
            }
        }
    }

    /// True when the change is within the threshold
    pub fn passed(&self) -> bool {
        self.state == CommitState::Success
    }
}
