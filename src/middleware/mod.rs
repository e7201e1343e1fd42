pub mod auth;
pub mod verified_employer;
