use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(ApplicationStatus {
    Submitted,
    Reviewing,
    Shortlisted,
    Interviewed,
    Accepted,
    Rejected,
});

impl ApplicationStatus {
    fn rank(&self) -> u8 {
        match self {
            ApplicationStatus::Submitted => 0,
            ApplicationStatus::Reviewing => 1,
            ApplicationStatus::Shortlisted => 2,
            ApplicationStatus::Interviewed => 3,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => 4,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected
        )
    }

    /// Forward-only pipeline; rejection is allowed from any open stage.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        if self.is_final() {
            return false;
        }
        next == ApplicationStatus::Rejected || next.rank() > self.rank()
    }

    pub fn can_withdraw(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted | ApplicationStatus::Reviewing
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub job_posting_id: Uuid,
    pub candidate_id: Uuid,
    pub cv_file_path: Option<String>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub employer_notes: Option<String>,
}

impl JobApplication {
    pub fn status(&self) -> Option<ApplicationStatus> {
        self.status.parse().ok()
    }
}

pub const APPLICATION_COLUMNS: &str = "a.id, a.job_posting_id, a.candidate_id, a.cv_file_path, \
     a.cover_letter, a.status, a.applied_at, a.reviewed_at, a.employer_notes";

#[cfg(test)]
mod tests {
    use super::ApplicationStatus::*;

    #[test]
    fn pipeline_moves_forward_only() {
        assert!(Submitted.can_transition_to(Reviewing));
        assert!(Submitted.can_transition_to(Interviewed));
        assert!(Interviewed.can_transition_to(Accepted));
        assert!(!Shortlisted.can_transition_to(Reviewing));
        assert!(!Reviewing.can_transition_to(Reviewing));
    }

    #[test]
    fn rejection_allowed_until_final() {
        assert!(Submitted.can_transition_to(Rejected));
        assert!(Interviewed.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
    }

    #[test]
    fn withdrawal_only_before_shortlisting() {
        assert!(Submitted.can_withdraw());
        assert!(Reviewing.can_withdraw());
        assert!(!Shortlisted.can_withdraw());
        assert!(!Accepted.can_withdraw());
    }
}
