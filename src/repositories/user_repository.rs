use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::envelope::{non_blank, sort_key, Paging, SortOrder};
use crate::dto::profile_dto::UserProfile;
use crate::dto::user_dto::{AdminUpdateUserRequest, UserListQuery};
use crate::dto::validators::clean;
use crate::error::{Error, Result};
use crate::models::user::{Role, User, UserStatus, USER_COLUMNS};

/// Columns of a new `users` row.
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub role: Role,
}

pub async fn insert_user(conn: &mut PgConnection, user: NewUser) -> Result<User> {
    let sql = format!(
        "INSERT INTO users (full_name, email, phone, password_hash, date_of_birth, gender, address, role, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        USER_COLUMNS
    );
    let created = sqlx::query_as::<_, User>(&sql)
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.phone)
        .bind(user.password_hash)
        .bind(user.date_of_birth)
        .bind(user.gender)
        .bind(user.address)
        .bind(user.role.as_str())
        .bind(UserStatus::Active.as_str())
        .fetch_one(conn)
        .await?;
    Ok(created)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::not_found("USER_NOT_FOUND", "User not found"))
}

pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(taken)
}

pub async fn phone_taken(pool: &PgPool, phone: &str, except: Option<Uuid>) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(phone)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Rejects registrations whose email or phone already belongs to someone.
pub async fn ensure_unique_identity(pool: &PgPool, email: &str, phone: Option<&str>) -> Result<()> {
    if email_taken(pool, email).await? {
        return Err(Error::conflict("EMAIL_EXISTS", "Email is already registered"));
    }
    if let Some(phone) = phone {
        if phone_taken(pool, phone, None).await? {
            return Err(Error::conflict(
                "PHONE_EXISTS",
                "Phone number is already registered",
            ));
        }
    }
    Ok(())
}

/// Shared partial update of the personal fields of a user.
pub async fn update_personal_fields(
    pool: &PgPool,
    user_id: Uuid,
    full_name: Option<String>,
    phone: Option<String>,
    date_of_birth: Option<chrono::NaiveDate>,
    gender: Option<String>,
    address: Option<String>,
) -> Result<User> {
    let phone = clean(phone);
    if let Some(phone) = phone.as_deref() {
        if phone_taken(pool, phone, Some(user_id)).await? {
            return Err(Error::conflict(
                "PHONE_EXISTS",
                "Phone number is already registered",
            ));
        }
    }

    let sql = format!(
        "UPDATE users SET
            full_name = COALESCE($2, full_name),
            phone = COALESCE($3, phone),
            date_of_birth = COALESCE($4, date_of_birth),
            gender = COALESCE($5, gender),
            address = COALESCE($6, address),
            updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        USER_COLUMNS
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .bind(clean(full_name))
        .bind(phone)
        .bind(date_of_birth)
        .bind(clean(gender))
        .bind(clean(address))
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::not_found("USER_NOT_FOUND", "User not found"))?;
    Ok(user)
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &UserListQuery) -> Result<()> {
        qb.push(" WHERE 1 = 1");
        if let Some(search) = non_blank(&query.search) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(role) = non_blank(&query.role) {
            let role: Role = role.parse()?;
            qb.push(" AND role = ").push_bind(role.as_str());
        }
        if let Some(status) = non_blank(&query.status) {
            let status: UserStatus = status.parse()?;
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        Ok(())
    }

    pub async fn list(&self, query: &UserListQuery) -> Result<(Vec<UserProfile>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, 10);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let sort_column = match sort_key(query.sort_by.as_deref()).as_str() {
            "name" | "fullname" => "full_name",
            "email" => "email",
            _ => "created_at",
        };

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        Self::push_filters(&mut count, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        Self::push_filters(&mut items, query)?;
        items
            .push(format!(" ORDER BY {} {}, id", sort_column, order.as_sql()))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let users: Vec<User> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((users.into_iter().map(UserProfile::from).collect(), total, paging))
    }

    pub async fn get(&self, id: Uuid) -> Result<UserProfile> {
        Ok(get_by_id(&self.pool, id).await?.into())
    }

    pub async fn update(&self, id: Uuid, req: AdminUpdateUserRequest) -> Result<UserProfile> {
        let user = update_personal_fields(
            &self.pool,
            id,
            req.full_name,
            req.phone,
            req.date_of_birth,
            req.gender,
            req.address,
        )
        .await?;
        if user.role() == Some(Role::Candidate) {
            super::candidate_repository::refresh_completeness(&self.pool, id).await?;
        }
        Ok(user.into())
    }

    pub async fn set_status(&self, id: Uuid, status: UserStatus) -> Result<UserProfile> {
        let sql = format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("USER_NOT_FOUND", "User not found"))?;
        tracing::info!(user_id = %id, status = %status, "user status changed");
        Ok(user.into())
    }

    pub async fn delete(&self, id: Uuid, acting_admin: Uuid) -> Result<()> {
        if id == acting_admin {
            return Err(Error::bad_request(
                "CANNOT_DELETE_SELF",
                "Administrators cannot delete their own account",
            ));
        }
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("USER_NOT_FOUND", "User not found"));
        }
        tracing::info!(user_id = %id, admin_id = %acting_admin, "user deleted");
        Ok(())
    }

    /// Ids of Active users, optionally restricted to one role.
    pub async fn active_user_ids(&self, role: Option<Role>) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE status = $1 AND ($2::text IS NULL OR role = $2)",
        )
        .bind(UserStatus::Active.as_str())
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
