use sqlx::PgPool;
use std::path::PathBuf;
use uuid::Uuid;

use crate::dto::profile_dto::{AvatarResponse, ChangePasswordRequest, UpdateProfileRequest, UserProfile};
use crate::error::{Error, Result};
use crate::models::user::Role;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::upload::{self, UploadedFile};

use super::candidate_repository::refresh_completeness;
use super::user_repository::{get_by_id, update_personal_fields};

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
    uploads_dir: PathBuf,
}

impl ProfileRepository {
    pub fn new(pool: PgPool, uploads_dir: PathBuf) -> Self {
        Self { pool, uploads_dir }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<UserProfile> {
        Ok(get_by_id(&self.pool, user_id).await?.into())
    }

    pub async fn update(&self, user_id: Uuid, req: UpdateProfileRequest) -> Result<UserProfile> {
        let user = update_personal_fields(
            &self.pool,
            user_id,
            req.full_name,
            req.phone,
            req.date_of_birth,
            req.gender,
            req.address,
        )
        .await?;
        if user.role() == Some(Role::Candidate) {
            refresh_completeness(&self.pool, user_id).await?;
        }
        Ok(user.into())
    }

    pub async fn change_password(&self, user_id: Uuid, req: ChangePasswordRequest) -> Result<()> {
        let user = get_by_id(&self.pool, user_id).await?;
        if user.is_external_account {
            return Err(Error::bad_request(
                "EXTERNAL_LOGIN_REQUIRED",
                "Accounts signed in through an external provider have no password",
            ));
        }
        let current_ok = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&req.current_password, hash));
        if !current_ok {
            return Err(Error::bad_request(
                "INVALID_PASSWORD",
                "Current password is incorrect",
            ));
        }

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(hash_password(&req.new_password)?)
            .execute(&self.pool)
            .await?;
        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// Stores a validated avatar image and removes the previous one.
    pub async fn update_avatar(&self, user_id: Uuid, file: UploadedFile, ext: &str) -> Result<AvatarResponse> {
        let user = get_by_id(&self.pool, user_id).await?;

        let stored_name = format!("{}_{}.{}", user_id, Uuid::new_v4(), ext);
        let public_path =
            upload::store(&self.uploads_dir, &upload::AVATAR, &stored_name, &file.data).await?;

        let updated = sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(&public_path)
            .execute(&self.pool)
            .await;
        if let Err(err) = updated {
            upload::remove(&self.uploads_dir, &public_path).await;
            return Err(err.into());
        }

        if let Some(previous) = user.avatar.as_deref() {
            upload::remove(&self.uploads_dir, previous).await;
        }
        if user.role() == Some(Role::Candidate) {
            refresh_completeness(&self.pool, user_id).await?;
        }
        Ok(AvatarResponse {
            avatar: public_path,
        })
    }
}
