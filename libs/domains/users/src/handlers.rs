use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{ApiResponse, AppError, AppResult, IdPath, QueryParams, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{CreateUserRequest, PageQuery, UpdateUserRequest, User, UserPage};
use crate::repository::UserStore;
use crate::service::{DEFAULT_PAGE_SIZE, UserDirectory};

pub const TAG: &str = "users";

const USER_NOT_FOUND: &str = "User not found";

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        get_user_by_username,
        username_exists,
    ),
    components(schemas(User, CreateUserRequest, UpdateUserRequest, UserPage)),
    tags(
        (name = TAG, description = "User directory endpoints")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints
///
/// Paths are relative; the application nests this router at `/users`.
pub fn router<S: UserStore + 'static>(directory: UserDirectory<S>) -> Router {
    let shared_directory = Arc::new(directory);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/username/{username}", get(get_user_by_username))
        .route("/exists/{username}", get(username_exists))
        .with_state(shared_directory)
}

/// List users, or one page of them when `page` or `size` is given
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(PageQuery),
    responses(
        (status = 200, description = "All users, or a UserPage when paged", body = ApiResponse<Vec<User>>),
        (status = 400, description = "Invalid paging parameters"),
        (status = 500, description = "Store failure")
    )
)]
async fn list_users<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Response> {
    if query.is_paged() {
        let page = directory
            .find_users_page(
                query.page.unwrap_or(1),
                query.size.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .await?;
        return Ok(ApiResponse::success_with("User page retrieved", page).into_response());
    }

    let users = directory.find_all_users().await?;
    Ok(ApiResponse::success_with("User list retrieved", users).into_response())
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = ApiResponse<User>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already exists"),
        (status = 500, description = "Store failure")
    )
)]
async fn create_user<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> AppResult<ApiResponse<User>> {
    let user = directory.create_user(input.into()).await?;
    Ok(ApiResponse::success_with("User created successfully", user))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<User>),
        (status = 404, description = "No user with this ID")
    )
)]
async fn get_user<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<User>> {
    let user = directory
        .find_by_id(Some(id))
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;
    Ok(ApiResponse::success_with("User found", user))
}

/// Replace a user's fields
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "No user with this ID"),
        (status = 409, description = "Username or email already exists")
    )
)]
async fn update_user<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> AppResult<ApiResponse<User>> {
    let user = directory.update_user(input.into_user(id)).await?;
    Ok(ApiResponse::success_with("User updated successfully", user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<bool>),
        (status = 404, description = "No user with this ID")
    )
)]
async fn delete_user<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<bool>> {
    if directory.delete_user(Some(id)).await? {
        Ok(ApiResponse::success_with("User deleted successfully", true))
    } else {
        Err(AppError::NotFound(USER_NOT_FOUND.to_string()))
    }
}

/// Get a user by username
#[utoipa::path(
    get,
    path = "/username/{username}",
    tag = TAG,
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<User>),
        (status = 404, description = "No user with this username")
    )
)]
async fn get_user_by_username<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<User>> {
    let user = directory
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;
    Ok(ApiResponse::success_with("User found", user))
}

/// Check whether a username is taken
#[utoipa::path(
    get,
    path = "/exists/{username}",
    tag = TAG,
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Whether the username exists", body = ApiResponse<bool>)
    )
)]
async fn username_exists<S: UserStore>(
    State(directory): State<Arc<UserDirectory<S>>>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let exists = directory.exists_by_username(&username).await?;
    Ok(ApiResponse::success_with("Username check completed", exists))
}
