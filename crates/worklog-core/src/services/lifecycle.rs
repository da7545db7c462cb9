//! Report lifecycle transition rules.
//!
//! The legal moves are:
//!
//! ```text
//! draft -> submitted -> approved
//!             ^    \
//!             |     -> rejected
//!             +--------/   (resubmission)
//! ```
//!
//! `approved` is terminal. Every transition is checked against the
//! current status before any write is issued; an illegal move never
//! touches the stored record.

use chrono::Utc;
use worklog_db::entities::report::{ApprovalAction, ApprovalEvent, ReportStatus};
use worklog_common::{AppError, AppResult};

/// A requested lifecycle move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Owner submits a draft, or resubmits after rejection.
    Submit,
    /// Admin approves a submitted report.
    Approve,
    /// Admin rejects a submitted report (comment mandatory).
    Reject,
}

impl Transition {
    /// The status a successful transition lands in.
    #[must_use]
    pub const fn target(self) -> ReportStatus {
        match self {
            Self::Submit => ReportStatus::Submitted,
            Self::Approve => ReportStatus::Approved,
            Self::Reject => ReportStatus::Rejected,
        }
    }
}

/// Validate a requested transition against the current status.
///
/// Returns the target status, or `InvalidTransition` without side
/// effects. Submission deliberately performs no content completeness
/// check; whether a report is "ready" is the caller's concern.
pub fn check_transition(current: ReportStatus, requested: Transition) -> AppResult<ReportStatus> {
    match (current, requested) {
        (ReportStatus::Draft | ReportStatus::Rejected, Transition::Submit)
        | (ReportStatus::Submitted, Transition::Approve | Transition::Reject) => {
            Ok(requested.target())
        }
        (ReportStatus::Approved, _) => Err(AppError::InvalidTransition(
            "approved reports are final".to_string(),
        )),
        (current, Transition::Submit) => Err(AppError::InvalidTransition(format!(
            "cannot submit a report in status '{}'",
            current.as_str()
        ))),
        (current, Transition::Approve) => Err(AppError::InvalidTransition(format!(
            "only submitted reports can be approved (status is '{}')",
            current.as_str()
        ))),
        (current, Transition::Reject) => Err(AppError::InvalidTransition(format!(
            "only submitted reports can be rejected (status is '{}')",
            current.as_str()
        ))),
    }
}

/// Validate and normalize a rejection comment.
///
/// Rejections without a non-blank comment are refused before any write.
pub fn require_rejection_comment(comment: Option<&str>) -> AppResult<String> {
    match comment.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(c.to_string()),
        _ => Err(AppError::Validation(
            "rejection requires a comment".to_string(),
        )),
    }
}

/// Build the approval event appended by an approve/reject transition.
#[must_use]
pub fn decision_event(actor_id: &str, action: ApprovalAction, comment: Option<String>) -> ApprovalEvent {
    ApprovalEvent {
        by: actor_id.to_string(),
        action,
        comment,
        at: Utc::now(),
    }
}
