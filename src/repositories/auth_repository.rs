use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::dto::auth_dto::{
    AuthToken, LoginRequest, RegisterAdminRequest, RegisterCandidateRequest,
    RegisterEmployerRequest, ResetPasswordRequest,
};
use crate::dto::employer_dto::EmployerProfile;
use crate::dto::profile_dto::UserProfile;
use crate::dto::validators::{clean, normalize_email};
use crate::error::{Error, Result};
use crate::models::employer::VerificationStatus;
use crate::models::user::{Role, User, USER_COLUMNS};
use crate::utils::crypto::{hash_password, sha256_hex, verify_password};
use crate::utils::jwt::issue_token;
use crate::utils::token::{generate_token, RESET_TOKEN_LENGTH};
use crate::utils::upload::{self, UploadedFile};

use super::candidate_repository::refresh_completeness;
use super::employer_repository::load_profile;
use super::user_repository::{ensure_unique_identity, insert_user, NewUser};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;

fn invalid_credentials() -> Error {
    Error::unauthorized("INVALID_CREDENTIALS", "Invalid username or password")
}

#[derive(Clone)]
pub struct AuthRepository {
    pool: PgPool,
    config: Arc<Config>,
}

impl AuthRepository {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        Self { pool, config }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthToken> {
        let username = req.username.trim();
        let email = normalize_email(username);
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 OR phone = $2 LIMIT 1",
            USER_COLUMNS
        );
        let Some(user) = sqlx::query_as::<_, User>(&sql)
            .bind(&email)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
        else {
            tracing::warn!(username = %username, "login for unknown user");
            return Err(invalid_credentials());
        };

        if user.is_external_account {
            return Err(Error::bad_request(
                "EXTERNAL_LOGIN_REQUIRED",
                "This account signs in through an external provider",
            ));
        }
        let password_ok = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&req.password, hash));
        if !password_ok {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(invalid_credentials());
        }
        if !user.is_active() {
            return Err(Error::forbidden(
                "ACCOUNT_NOT_ACTIVE",
                "Account is not active",
            ));
        }

        if user.role() == Some(Role::Admin) {
            sqlx::query("UPDATE administrators SET last_login_at = NOW() WHERE user_id = $1")
                .bind(user.id)
                .execute(&self.pool)
                .await?;
        }

        let issued = issue_token(&self.config, &user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(AuthToken {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            user_id: user.id,
            role: user.role,
        })
    }

    pub async fn register_candidate(&self, req: RegisterCandidateRequest) -> Result<UserProfile> {
        let email = normalize_email(&req.email);
        let phone = clean(req.phone);
        ensure_unique_identity(&self.pool, &email, phone.as_deref()).await?;
        let password_hash = hash_password(&req.password)?;

        let mut tx = self.pool.begin().await?;
        let user = insert_user(
            &mut tx,
            NewUser {
                full_name: req.full_name.trim().to_string(),
                email,
                phone,
                password_hash: Some(password_hash),
                date_of_birth: req.date_of_birth,
                gender: clean(req.gender),
                address: clean(req.address),
                role: Role::Candidate,
            },
        )
        .await?;
        sqlx::query("INSERT INTO candidates (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        refresh_completeness(&self.pool, user.id).await?;
        tracing::info!(user_id = %user.id, "candidate registered");
        Ok(user.into())
    }

    /// Registers an employer with an already validated business license file.
    pub async fn register_employer(
        &self,
        req: RegisterEmployerRequest,
        license: UploadedFile,
    ) -> Result<EmployerProfile> {
        let email = normalize_email(&req.email);
        let phone = clean(req.phone.clone());
        ensure_unique_identity(&self.pool, &email, phone.as_deref()).await?;
        let password_hash = hash_password(&req.password)?;

        let stored_name = format!(
            "{}_{}",
            Uuid::new_v4(),
            upload::sanitize_file_name(&license.file_name)
        );
        let license_path = upload::store(
            &self.config.uploads_dir,
            &upload::BUSINESS_LICENSE,
            &stored_name,
            &license.data,
        )
        .await?;

        let created = self
            .insert_employer(req, email, phone, password_hash, &license_path)
            .await;
        let employer_id = match created {
            Ok(id) => id,
            Err(err) => {
                upload::remove(&self.config.uploads_dir, &license_path).await;
                return Err(err);
            }
        };

        tracing::info!(user_id = %employer_id, "employer registered, awaiting verification");
        load_profile(&self.pool, employer_id).await
    }

    async fn insert_employer(
        &self,
        req: RegisterEmployerRequest,
        email: String,
        phone: Option<String>,
        password_hash: String,
        license_path: &str,
    ) -> Result<Uuid> {
        let full_name = req.full_name.trim().to_string();
        // Contact details fall back to the registering user's own.
        let contact_person = clean(req.contact_person).unwrap_or_else(|| full_name.clone());
        let contact_email = clean(req.contact_email)
            .map(|e| normalize_email(&e))
            .unwrap_or_else(|| email.clone());
        let contact_phone = clean(req.contact_phone).or_else(|| phone.clone());

        let mut tx = self.pool.begin().await?;
        let user = insert_user(
            &mut tx,
            NewUser {
                full_name,
                email,
                phone,
                password_hash: Some(password_hash),
                date_of_birth: None,
                gender: None,
                address: None,
                role: Role::Employer,
            },
        )
        .await?;
        sqlx::query(
            "INSERT INTO employers (user_id, company_name, company_website, company_description, tax_code,
                business_license_number, business_license_file, verification_status, contact_person,
                contact_email, contact_phone, company_size, industry, company_address)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(user.id)
        .bind(req.company_name.trim())
        .bind(req.company_website)
        .bind(req.company_description)
        .bind(req.tax_code)
        .bind(req.business_license_number)
        .bind(license_path)
        .bind(VerificationStatus::Pending.as_str())
        .bind(contact_person)
        .bind(contact_email)
        .bind(contact_phone)
        .bind(req.company_size)
        .bind(req.industry)
        .bind(req.company_address)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(user.id)
    }

    pub async fn register_admin(&self, req: RegisterAdminRequest) -> Result<UserProfile> {
        let email = normalize_email(&req.email);
        let phone = clean(req.phone);
        ensure_unique_identity(&self.pool, &email, phone.as_deref()).await?;
        let password_hash = hash_password(&req.password)?;

        let mut tx = self.pool.begin().await?;
        let user = insert_user(
            &mut tx,
            NewUser {
                full_name: req.full_name.trim().to_string(),
                email,
                phone,
                password_hash: Some(password_hash),
                date_of_birth: None,
                gender: None,
                address: None,
                role: Role::Admin,
            },
        )
        .await?;
        sqlx::query(
            "INSERT INTO administrators (user_id, admin_role, department, internal_title)
             VALUES ($1, COALESCE($2, 'Admin'), $3, $4)",
        )
        .bind(user.id)
        .bind(clean(req.admin_role))
        .bind(clean(req.department))
        .bind(clean(req.internal_title))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "administrator registered");
        Ok(user.into())
    }

    /// Stores the digest of a fresh reset token and returns the user with the plain token.
    pub async fn create_reset_token(&self, email: &str) -> Result<(User, String)> {
        let email = normalize_email(email);
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("USER_NOT_FOUND", "No account uses this email"))?;

        let token = generate_token(RESET_TOKEN_LENGTH);
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_expires_at = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(sha256_hex(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, "password reset requested");
        Ok((user, token))
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<()> {
        let password_hash = hash_password(&req.new_password)?;
        // Clearing the token in the same statement makes it single use.
        let reset: Option<Uuid> = sqlx::query_scalar(
            "UPDATE users SET password_hash = $2, password_reset_token = NULL,
                password_reset_expires_at = NULL, updated_at = NOW()
             WHERE password_reset_token = $1 AND password_reset_expires_at > NOW()
             RETURNING id",
        )
        .bind(sha256_hex(req.token.trim()))
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user_id) = reset else {
            return Err(Error::bad_request(
                "INVALID_TOKEN",
                "Reset token is invalid or expired",
            ));
        };
        tracing::info!(user_id = %user_id, "password reset completed");
        Ok(())
    }

    /// Seeds the configured administrator into an empty database.
    pub async fn ensure_bootstrap_admin(&self) -> Result<bool> {
        let (Some(email), Some(password)) = (
            self.config.admin_email.as_deref(),
            self.config.admin_password.as_deref(),
        ) else {
            return Ok(false);
        };
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        if users > 0 {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;
        let user = insert_user(
            &mut tx,
            NewUser {
                full_name: "Administrator".to_string(),
                email: normalize_email(email),
                phone: None,
                password_hash: Some(hash_password(password)?),
                date_of_birth: None,
                gender: None,
                address: None,
                role: Role::Admin,
            },
        )
        .await?;
        sqlx::query("INSERT INTO administrators (user_id, admin_role) VALUES ($1, 'SuperAdmin')")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, email = %user.email, "bootstrap administrator created");
        Ok(true)
    }
}
