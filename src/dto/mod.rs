pub mod application_dto;
pub mod auth_dto;
pub mod candidate_dto;
pub mod employer_dto;
pub mod envelope;
pub mod job_dto;
pub mod notification_dto;
pub mod profile_dto;
pub mod saved_job_dto;
pub mod user_dto;
pub mod validators;
