use uuid::Uuid;

use crate::dto::notification_dto::BroadcastRequest;
use crate::dto::validators::clean;
use crate::error::{Error, Result};
use crate::models::employer::VerificationStatus;
use crate::models::job_application::ApplicationStatus;
use crate::models::notification::{NewNotification, NotificationType};
use crate::models::user::Role;
use crate::repositories::notification_repository::NotificationRepository;
use crate::repositories::user_repository::UserRepository;

fn notification(
    title: impl Into<String>,
    message: impl Into<String>,
    notification_type: NotificationType,
    related_link: Option<&str>,
) -> NewNotification {
    NewNotification {
        title: title.into(),
        message: message.into(),
        notification_type,
        related_link: related_link.map(str::to_string),
    }
}

pub fn new_application(candidate_name: &str, job_title: &str) -> NewNotification {
    notification(
        "New application",
        format!("{} applied for \"{}\".", candidate_name, job_title),
        NotificationType::Info,
        Some("/employer/applications"),
    )
}

pub fn application_status_update(
    job_title: &str,
    company_name: &str,
    status: ApplicationStatus,
) -> NewNotification {
    let (notification_type, message) = match status {
        ApplicationStatus::Accepted => (
            NotificationType::Success,
            format!(
                "Congratulations! {} accepted your application for \"{}\".",
                company_name, job_title
            ),
        ),
        ApplicationStatus::Rejected => (
            NotificationType::Warning,
            format!(
                "{} did not move forward with your application for \"{}\".",
                company_name, job_title
            ),
        ),
        other => (
            NotificationType::Info,
            format!(
                "Your application for \"{}\" at {} is now {}.",
                job_title, company_name, other
            ),
        ),
    };
    notification(
        "Application status updated",
        message,
        notification_type,
        Some("/candidate/applications"),
    )
}

pub fn job_published(job_title: &str) -> NewNotification {
    notification(
        "Job published",
        format!("Your job posting \"{}\" is now live.", job_title),
        NotificationType::Success,
        Some("/employer/jobs"),
    )
}

/// `None` for statuses that are not an admin decision.
pub fn verification_decision(company_name: &str, status: VerificationStatus) -> Option<NewNotification> {
    match status {
        VerificationStatus::Verified => Some(notification(
            "Account verified",
            format!(
                "{} has been verified. You can now publish job postings.",
                company_name
            ),
            NotificationType::Success,
            Some("/employer/profile"),
        )),
        VerificationStatus::Rejected => Some(notification(
            "Verification rejected",
            format!(
                "The business license of {} was not approved. Upload a new license to request another review.",
                company_name
            ),
            NotificationType::Warning,
            Some("/employer/profile"),
        )),
        VerificationStatus::Pending => None,
    }
}

pub fn welcome(full_name: &str) -> NewNotification {
    notification(
        "Welcome",
        format!(
            "Welcome aboard, {}! Complete your profile to get better job matches.",
            full_name
        ),
        NotificationType::Info,
        Some("/profile"),
    )
}

/// Admin broadcast payload; the type defaults to Info.
pub fn broadcast_notification(req: &BroadcastRequest) -> Result<NewNotification> {
    let notification_type = match req.notification_type.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse()?,
        _ => NotificationType::Info,
    };
    Ok(NewNotification {
        title: req.title.trim().to_string(),
        message: req.message.trim().to_string(),
        notification_type,
        related_link: clean(req.related_link.clone()),
    })
}

#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
    users: UserRepository,
}

impl NotificationService {
    pub fn new(notifications: NotificationRepository, users: UserRepository) -> Self {
        Self {
            notifications,
            users,
        }
    }

    /// Stores the notification; a failure is logged and never reaches the caller.
    pub async fn deliver(&self, user_id: Uuid, notification: NewNotification) {
        if let Err(err) = self.notifications.create(user_id, &notification).await {
            tracing::warn!(
                user_id = %user_id,
                title = %notification.title,
                error = %err,
                "failed to store notification"
            );
        }
    }

    pub async fn notify_new_application(&self, employer_id: Uuid, candidate_name: &str, job_title: &str) {
        self.deliver(employer_id, new_application(candidate_name, job_title))
            .await;
    }

    pub async fn notify_application_status(
        &self,
        candidate_id: Uuid,
        job_title: &str,
        company_name: &str,
        status: ApplicationStatus,
    ) {
        self.deliver(
            candidate_id,
            application_status_update(job_title, company_name, status),
        )
        .await;
    }

    pub async fn notify_job_published(&self, employer_id: Uuid, job_title: &str) {
        self.deliver(employer_id, job_published(job_title)).await;
    }

    pub async fn notify_verification(&self, employer_id: Uuid, company_name: &str, status: VerificationStatus) {
        if let Some(notification) = verification_decision(company_name, status) {
            self.deliver(employer_id, notification).await;
        }
    }

    pub async fn welcome(&self, user_id: Uuid, full_name: &str) {
        self.deliver(user_id, welcome(full_name)).await;
    }

    pub async fn broadcast_all(&self, notification: &NewNotification) -> Result<u64> {
        let recipients = self.users.active_user_ids(None).await?;
        let sent = self.notifications.create_many(&recipients, notification).await?;
        tracing::info!(recipients = sent, "broadcast sent to all active users");
        Ok(sent)
    }

    pub async fn broadcast_role(&self, role: Role, notification: &NewNotification) -> Result<u64> {
        let recipients = self.users.active_user_ids(Some(role)).await?;
        if recipients.is_empty() {
            return Err(Error::not_found(
                "NO_USERS_FOUND",
                format!("No active users with role {}", role),
            ));
        }
        let sent = self.notifications.create_many(&recipients, notification).await?;
        tracing::info!(role = %role, recipients = sent, "broadcast sent to role");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_type_follows_outcome() {
        let accepted = application_status_update("Rust Engineer", "Acme", ApplicationStatus::Accepted);
        assert_eq!(accepted.notification_type, NotificationType::Success);
        assert_eq!(accepted.related_link.as_deref(), Some("/candidate/applications"));

        let rejected = application_status_update("Rust Engineer", "Acme", ApplicationStatus::Rejected);
        assert_eq!(rejected.notification_type, NotificationType::Warning);

        let reviewing = application_status_update("Rust Engineer", "Acme", ApplicationStatus::Reviewing);
        assert_eq!(reviewing.notification_type, NotificationType::Info);
        assert!(reviewing.message.contains("Reviewing"));
    }

    #[test]
    fn employer_templates_link_to_employer_pages() {
        let n = new_application("Jane Doe", "Rust Engineer");
        assert_eq!(n.related_link.as_deref(), Some("/employer/applications"));
        assert!(n.message.contains("Jane Doe"));

        let published = job_published("Rust Engineer");
        assert_eq!(published.notification_type, NotificationType::Success);
        assert_eq!(published.related_link.as_deref(), Some("/employer/jobs"));
    }

    #[test]
    fn verification_decisions() {
        let verified = verification_decision("Acme", VerificationStatus::Verified).unwrap();
        assert_eq!(verified.notification_type, NotificationType::Success);
        let rejected = verification_decision("Acme", VerificationStatus::Rejected).unwrap();
        assert_eq!(rejected.notification_type, NotificationType::Warning);
        assert_eq!(rejected.related_link.as_deref(), Some("/employer/profile"));
        assert!(verification_decision("Acme", VerificationStatus::Pending).is_none());
    }

    #[test]
    fn broadcast_type_defaults_to_info() {
        let mut req = BroadcastRequest {
            title: " Maintenance ".into(),
            message: "Tonight at 22:00".into(),
            notification_type: None,
            related_link: Some("  ".into()),
        };
        let n = broadcast_notification(&req).unwrap();
        assert_eq!(n.notification_type, NotificationType::Info);
        assert_eq!(n.title, "Maintenance");
        assert!(n.related_link.is_none());

        req.notification_type = Some("warning".into());
        assert_eq!(
            broadcast_notification(&req).unwrap().notification_type,
            NotificationType::Warning
        );
        req.notification_type = Some("urgent".into());
        assert_eq!(broadcast_notification(&req).unwrap_err().code(), "INVALID_VALUE");
    }
}
