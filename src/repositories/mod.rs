pub mod auth_repository;
pub mod candidate_repository;
pub mod education_repository;
pub mod employer_repository;
pub mod experience_repository;
pub mod job_application_repository;
pub mod job_posting_repository;
pub mod notification_repository;
pub mod profile_repository;
pub mod saved_job_repository;
pub mod user_repository;
