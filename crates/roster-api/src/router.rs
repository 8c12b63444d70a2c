//! Route table and handlers.
//!
//! Handlers are thin translations between DTOs and the service/store
//! layer; the interesting behavior lives below this crate.

use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use roster_ldap::{LdapMode, LdapSettings};
use roster_model::{Group, Page, User};
use serde_json::json;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::dto::{
    AddMembersRequest, ChangePasswordRequest, CreateGroupRequest, CreateUserRequest, GroupDto,
    ListUsersQuery, LoginRequest, LoginResponse, SetStatusRequest, UpdateGroupRequest,
    UpdateLdapConfigRequest, UpdateUserRequest, UserDto,
};
use crate::error::{ApiError, ApiResult};
use crate::response::{ok, ok_empty, Envelope};
use crate::state::AppState;

/// Builds the `/api/v1` router over the shared state.
///
/// `POST /auth/login` and `POST /users` are public; everything else
/// sits behind the Bearer token middleware.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/login", post(login))
        .route("/users", post(create_user));

    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/password", put(change_password))
        .route("/users/:id/status", put(set_status))
        .route("/users/:id/groups", get(user_groups))
        .route("/groups", post(create_group).get(list_groups))
        .route(
            "/groups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/:id/members", post(add_members).get(group_members))
        .route("/groups/:id/members/:uid", delete(remove_member))
        .route("/ldap/config", get(get_ldap_config).put(update_ldap_config))
        .route("/ldap/status", get(get_ldap_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api/v1", public.merge(protected))
        .layer(middleware::from_fn(crate::trace::trace_requests))
        .with_state(state)
}

// ============================================================================
// Auth
// ============================================================================

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Envelope<LoginResponse>>> {
    let (token, user) = state.auth.login(&request.username, &request.password).await?;
    tracing::info!(username = %user.username, "login success");

    Ok(ok(LoginResponse {
        token,
        user: UserDto::from(user),
    }))
}

/// POST /auth/logout
///
/// Tokens are stateless; logout simply acknowledges.
async fn logout() -> Json<Envelope<()>> {
    ok_empty()
}

// ============================================================================
// Users
// ============================================================================

/// POST /users
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Json<Envelope<UserDto>>> {
    request.validate()?;

    let password_hash = state.auth.hash_password(&request.password)?;
    let mut user = User::new(
        request.username,
        request.display_name,
        request.email,
        password_hash,
    );
    user.phone = request.phone.filter(|p| !p.is_empty());

    state.users.create_user(&user).await?;
    tracing::info!(username = %user.username, "user created");

    Ok(ok(UserDto::from(user)))
}

/// GET /users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Envelope<Page<UserDto>>>> {
    let (page, page_size) = query.normalized();
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let result = state.users.list_users(page, page_size, search).await?;
    let items = result.items.into_iter().map(UserDto::from).collect();

    Ok(ok(Page::new(items, result.total, result.page, result.page_size)))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<UserDto>>> {
    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or(ApiError::not_found("user"))?;
    Ok(ok(UserDto::from(user)))
}

/// PUT /users/{id}
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<Json<Envelope<UserDto>>> {
    request.validate()?;

    let mut user = state
        .users
        .get_user(id)
        .await?
        .ok_or(ApiError::not_found("user"))?;

    if let Some(display_name) = request.display_name {
        user.display_name = display_name;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(phone) = request.phone {
        // An empty string clears the number.
        user.phone = (!phone.is_empty()).then_some(phone);
    }

    state.users.update_user(&user).await?;
    Ok(ok(UserDto::from(user)))
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<()>>> {
    state.users.delete_user(id).await?;
    tracing::info!(%id, "user deleted");
    Ok(ok_empty())
}

/// PUT /users/{id}/password
async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Envelope<()>>> {
    if request.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }

    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or(ApiError::not_found("user"))?;

    if !state.auth.verify_password(&request.old_password, &user.password_hash) {
        return Err(ApiError::BadRequest("invalid old password".to_string()));
    }

    let password_hash = state.auth.hash_password(&request.new_password)?;
    state.users.update_user_password(id, &password_hash).await?;
    Ok(ok_empty())
}

/// PUT /users/{id}/status
async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Json<Envelope<()>>> {
    state.users.update_user_status(id, request.status).await?;
    tracing::info!(%id, status = request.status.as_str(), "user status updated");
    Ok(ok_empty())
}

/// GET /users/{id}/groups
async fn user_groups(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Vec<GroupDto>>>> {
    state
        .users
        .get_user(id)
        .await?
        .ok_or(ApiError::not_found("user"))?;

    let groups = state.users.user_groups(id).await?;
    Ok(ok(groups.into_iter().map(GroupDto::without_members).collect()))
}

// ============================================================================
// Groups
// ============================================================================

/// POST /groups
async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<Json<Envelope<GroupDto>>> {
    request.validate()?;

    if let Some(parent_id) = request.parent_id {
        state
            .groups
            .get_group(parent_id)
            .await?
            .ok_or_else(|| ApiError::Validation("parent group does not exist".to_string()))?;
    }

    let mut group = Group::new(request.name, request.description);
    group.parent_id = request.parent_id;

    state.groups.create_group(&group).await?;
    tracing::info!(name = %group.name, "group created");

    Ok(ok(GroupDto::without_members(group)))
}

/// GET /groups
async fn list_groups(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<GroupDto>>>> {
    let groups = state.groups.list_groups().await?;
    Ok(ok(groups.into_iter().map(GroupDto::without_members).collect()))
}

/// GET /groups/{id}
async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<GroupDto>>> {
    let group = state
        .groups
        .get_group(id)
        .await?
        .ok_or(ApiError::not_found("group"))?;
    Ok(ok(GroupDto::with_members(group)))
}

/// PUT /groups/{id}
async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> ApiResult<Json<Envelope<GroupDto>>> {
    request.validate()?;

    let mut group = state
        .groups
        .get_group(id)
        .await?
        .ok_or(ApiError::not_found("group"))?;

    if let Some(name) = request.name {
        group.name = name;
    }
    if let Some(description) = request.description {
        group.description = description;
    }
    match request.parent_id {
        None => {}
        Some(None) => group.parent_id = None,
        Some(Some(parent_id)) => {
            if parent_id == id {
                return Err(ApiError::Validation(
                    "group cannot be its own parent".to_string(),
                ));
            }
            state
                .groups
                .get_group(parent_id)
                .await?
                .ok_or_else(|| ApiError::Validation("parent group does not exist".to_string()))?;
            group.parent_id = Some(parent_id);
        }
    }

    state.groups.update_group(&group).await?;
    Ok(ok(GroupDto::with_members(group)))
}

/// DELETE /groups/{id}
async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<()>>> {
    state.groups.delete_group(id).await?;
    tracing::info!(%id, "group deleted");
    Ok(ok_empty())
}

/// POST /groups/{id}/members
async fn add_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddMembersRequest>,
) -> ApiResult<Json<Envelope<()>>> {
    state
        .groups
        .get_group(id)
        .await?
        .ok_or(ApiError::not_found("group"))?;

    for user_id in &request.user_ids {
        state
            .users
            .get_user(*user_id)
            .await?
            .ok_or(ApiError::not_found("user"))?;
    }

    state.groups.add_members(id, &request.user_ids).await?;
    Ok(ok_empty())
}

/// DELETE /groups/{id}/members/{uid}
async fn remove_member(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Envelope<()>>> {
    state
        .groups
        .get_group(id)
        .await?
        .ok_or(ApiError::not_found("group"))?;

    state.groups.remove_member(id, user_id).await?;
    Ok(ok_empty())
}

/// GET /groups/{id}/members
async fn group_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Vec<UserDto>>>> {
    state
        .groups
        .get_group(id)
        .await?
        .ok_or(ApiError::not_found("group"))?;

    let members = state.groups.group_members(id).await?;
    Ok(ok(members.into_iter().map(UserDto::from).collect()))
}

// ============================================================================
// LDAP configuration
// ============================================================================

/// GET /ldap/config
async fn get_ldap_config(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<LdapSettings>>> {
    let settings = state.ldap.read().await.clone();
    Ok(ok(settings))
}

/// PUT /ldap/config
async fn update_ldap_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateLdapConfigRequest>,
) -> ApiResult<Json<Envelope<()>>> {
    if request.base_dn.is_empty() {
        return Err(ApiError::Validation("base_dn is required".to_string()));
    }
    let mode = LdapMode::from_str_opt(&request.mode).ok_or_else(|| {
        ApiError::Validation("mode must be 'openldap' or 'activedirectory'".to_string())
    })?;
    if request.port == 0 {
        return Err(ApiError::Validation("port must be between 1 and 65535".to_string()));
    }

    let mut settings = state.ldap.write().await;
    settings.base_dn = request.base_dn;
    settings.mode = mode;
    // The listener binds once at startup; a port change takes effect
    // on restart.
    settings.port = request.port;

    tracing::info!(base_dn = %settings.base_dn, mode = mode.as_str(), "ldap config updated");
    Ok(ok_empty())
}

/// GET /ldap/status
///
/// Reports the configured listener; there is no liveness probe against
/// the actual socket.
async fn get_ldap_status(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let settings = state.ldap.read().await.clone();
    Ok(ok(json!({
        "running": true,
        "port": settings.port,
        "mode": settings.mode.as_str(),
    })))
}
