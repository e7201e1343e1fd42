use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::{ApiResult, PagedResult},
        notification_dto::{
            AffectedResponse, BroadcastRequest, BroadcastResponse, NotificationQuery,
            NotificationResponse, NotificationSummary, ReadMultipleRequest, UnreadCountResponse,
        },
    },
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    middleware::auth::{require_admin, require_auth},
    models::user::Role,
    services::notification_service::broadcast_notification,
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let own = Router::new()
        .route("/", get(list_notifications))
        .route("/:id", get(get_notification).delete(delete_notification))
        .route("/unread-count", get(unread_count))
        .route("/summary", get(summary))
        .route("/:id/read", put(mark_read))
        .route("/read-all", put(mark_all_read))
        .route("/read-multiple", put(mark_many_read))
        .route("/read", delete(delete_read))
        .route("/all", delete(delete_all))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/broadcast", post(broadcast))
        .route("/broadcast/role/:role", post(broadcast_to_role))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    own.merge(admin)
}

fn affected(affected: u64, message: &str) -> ApiResult<AffectedResponse> {
    ApiResult::ok(AffectedResponse { affected }, message)
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> Result<PagedResult<NotificationResponse>> {
    let (items, total, paging) = state.notification_repository.list(user.id, &query).await?;
    Ok(PagedResult::new(items, total, paging, "Notifications retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<NotificationResponse>> {
    let item = state.notification_repository.get(user.id, id).await?;
    Ok(ApiResult::ok(item, "Notification retrieved successfully"))
}

#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<UnreadCountResponse>> {
    let unread_count = state.notification_repository.unread_count(user.id).await?;
    Ok(ApiResult::ok(
        UnreadCountResponse { unread_count },
        "Unread count retrieved successfully",
    ))
}

#[axum::debug_handler]
pub async fn summary(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<NotificationSummary>> {
    let summary = state.notification_repository.summary(user.id).await?;
    Ok(ApiResult::ok(summary, "Notification summary retrieved successfully"))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<AffectedResponse>> {
    let n = state.notification_repository.mark_read(user.id, id).await?;
    Ok(affected(n, "Notification marked as read"))
}

#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<AffectedResponse>> {
    let n = state.notification_repository.mark_all_read(user.id).await?;
    Ok(affected(n, "All notifications marked as read"))
}

#[axum::debug_handler]
pub async fn mark_many_read(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ReadMultipleRequest>,
) -> Result<ApiResult<AffectedResponse>> {
    payload.validate()?;
    let n = state
        .notification_repository
        .mark_many_read(user.id, &payload.ids)
        .await?;
    Ok(affected(n, "Notifications marked as read"))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.notification_repository.delete(user.id, id).await?;
    Ok(ApiResult::message("Notification deleted successfully"))
}

#[axum::debug_handler]
pub async fn delete_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<AffectedResponse>> {
    let n = state.notification_repository.delete_read(user.id).await?;
    Ok(affected(n, "Read notifications deleted"))
}

#[axum::debug_handler]
pub async fn delete_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<AffectedResponse>> {
    let n = state.notification_repository.delete_all(user.id).await?;
    Ok(affected(n, "All notifications deleted"))
}

#[axum::debug_handler]
pub async fn broadcast(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BroadcastRequest>,
) -> Result<ApiResult<BroadcastResponse>> {
    payload.validate()?;
    let notification = broadcast_notification(&payload)?;
    let recipients = state.notification_service.broadcast_all(&notification).await?;
    Ok(ApiResult::ok(
        BroadcastResponse { recipients },
        "Broadcast sent successfully",
    ))
}

#[axum::debug_handler]
pub async fn broadcast_to_role(
    State(state): State<AppState>,
    ApiPath(role): ApiPath<String>,
    ApiJson(payload): ApiJson<BroadcastRequest>,
) -> Result<ApiResult<BroadcastResponse>> {
    let role: Role = role.parse()?;
    payload.validate()?;
    let notification = broadcast_notification(&payload)?;
    let recipients = state
        .notification_service
        .broadcast_role(role, &notification)
        .await?;
    Ok(ApiResult::ok(
        BroadcastResponse { recipients },
        format!("Broadcast sent to {} users", role),
    ))
}
