pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::repositories::{
    auth_repository::AuthRepository, candidate_repository::CandidateRepository,
    education_repository::EducationRepository, employer_repository::EmployerRepository,
    experience_repository::ExperienceRepository, job_application_repository::JobApplicationRepository,
    job_posting_repository::JobPostingRepository, notification_repository::NotificationRepository,
    profile_repository::ProfileRepository, saved_job_repository::SavedJobRepository,
    user_repository::UserRepository,
};
use crate::services::{
    email_service::{mailer_from_config, EmailService, Mailer},
    notification_service::NotificationService,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub auth_repository: AuthRepository,
    pub user_repository: UserRepository,
    pub profile_repository: ProfileRepository,
    pub candidate_repository: CandidateRepository,
    pub education_repository: EducationRepository,
    pub experience_repository: ExperienceRepository,
    pub employer_repository: EmployerRepository,
    pub job_posting_repository: JobPostingRepository,
    pub job_application_repository: JobApplicationRepository,
    pub saved_job_repository: SavedJobRepository,
    pub notification_repository: NotificationRepository,
    pub email_service: EmailService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let mailer = mailer_from_config(&config);
        Self::with_mailer(pool, config, mailer)
    }

    pub fn with_mailer(pool: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let uploads = config.uploads_dir.clone();

        let user_repository = UserRepository::new(pool.clone());
        let notification_repository = NotificationRepository::new(pool.clone());
        let notification_service =
            NotificationService::new(notification_repository.clone(), user_repository.clone());
        let email_service = EmailService::new(mailer, &config);

        Self {
            auth_repository: AuthRepository::new(pool.clone(), config.clone()),
            profile_repository: ProfileRepository::new(pool.clone(), uploads.clone()),
            candidate_repository: CandidateRepository::new(pool.clone(), uploads.clone()),
            education_repository: EducationRepository::new(pool.clone()),
            experience_repository: ExperienceRepository::new(pool.clone()),
            employer_repository: EmployerRepository::new(pool.clone(), uploads.clone()),
            job_posting_repository: JobPostingRepository::new(pool.clone()),
            job_application_repository: JobApplicationRepository::new(pool.clone(), uploads),
            saved_job_repository: SavedJobRepository::new(pool.clone()),
            user_repository,
            notification_repository,
            email_service,
            notification_service,
            config,
            pool,
        }
    }
}
