//! Account and session handlers.
//!
//! ```text
//! POST   /api/login {"username":"admin","password":"admin"}
//! POST   /api/logout
//! GET    /api/me
//! POST   /api/register {"name":"Sara","username":"sara","password":"pw","role":"advisor"}
//! GET    /api/users
//! POST   /api/users {"name":"Reza","username":"reza","password":"pw","role":"rep"}
//! PATCH  /api/users/{id} {"role":"advisor"}
//! DELETE /api/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, LoginCredentials, Registration, Role, SessionClaims, User, UserEdit, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{LenientJson, LooseId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Registration and admin user creation body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `rep`, `advisor` (alias `pharma`) or, for admins only, `admin`.
    pub role: Option<String>,
}

/// Partial account update; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UserPatchRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Signed-in user as returned by login, registration and `/api/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub role: Role,
}

impl From<&SessionClaims> for SessionUser {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            id: claims.user_id,
            name: claims.name.clone(),
            username: claims.username.clone(),
            role: claims.role,
        }
    }
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name.into(),
            username: user.username.into(),
            role: user.role,
        }
    }
}

/// `{ "user": … }` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub user: SessionUser,
}

/// Identifier of a newly created account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedUser {
    pub id: UserId,
}

fn registration(body: &RegisterRequest) -> Result<Registration, Error> {
    Ok(Registration::try_from_parts(
        body.name.as_deref(),
        body.username.as_deref(),
        body.password.as_deref(),
    )?)
}

fn user_id_from_path(raw: &str) -> Result<UserId, Error> {
    LooseId::Text(raw.to_owned())
        .resolve("id")?
        .map(UserId::new)
        .ok_or_else(|| Error::not_found("user not found"))
}

fn signed_in(session: &SessionContext, claims: &SessionClaims) -> ApiResult<HttpResponse> {
    session.persist_claims(claims)?;
    Ok(HttpResponse::Ok().json(UserEnvelope {
        user: SessionUser::from(claims),
    }))
}

/// Verify credentials and start a session.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Signed session cookie"))),
        (status = 400, description = "Missing username or password", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Data store unavailable", body = Error)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: LenientJson<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(body.username.as_deref(), body.password.as_deref())?;
    let claims = state.accounts.login(&credentials).await?;
    signed_in(&session, &claims)
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Profile of the signed-in user.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["session"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn me(state: web::Data<HttpState>, session: SessionContext) -> ApiResult<HttpResponse> {
    let claims = session.require_claims()?;
    let user = state.accounts.current_user(&claims).await.inspect_err(|_| {
        session.purge();
    })?;
    Ok(HttpResponse::Ok().json(UserEnvelope { user: user.into() }))
}

/// Self-register a rep or advisor account and sign it in.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and signed in", body = UserEnvelope),
        (status = 400, description = "Missing fields", body = Error),
        (status = 409, description = "Username taken", body = Error)
    ),
    tags = ["session"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: LenientJson<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let claims = state
        .accounts
        .register(registration(&body)?, body.role.as_deref())
        .await?;
    signed_in(&session, &claims)
}

/// Every account, without password verifiers.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Accounts", body = [User]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<User>>> {
    let claims = session.require_claims()?;
    Ok(web::Json(state.accounts.list_users(&claims).await?))
}

/// Create an account of any role.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = CreatedUser),
        (status = 400, description = "Invalid fields", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 409, description = "Username taken", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: LenientJson<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let claims = session.require_claims()?;
    let body = payload.into_inner();
    let user = state
        .accounts
        .create_user(&claims, registration(&body)?, body.role.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(CreatedUser { id: user.id }))
}

/// Change an account's name, role or password.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "Account id")),
    request_body = UserPatchRequest,
    responses(
        (status = 200, description = "Updated account", body = User),
        (status = 400, description = "Invalid fields", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: LenientJson<UserPatchRequest>,
) -> ApiResult<web::Json<User>> {
    let claims = session.require_claims()?;
    let id = user_id_from_path(&path)?;
    let body = payload.into_inner();
    let user = state
        .accounts
        .update_user(
            &claims,
            id,
            UserEdit {
                name: body.name.as_deref(),
                role: body.role.as_deref(),
                password: body.password.as_deref(),
            },
        )
        .await?;
    Ok(web::Json(user))
}

/// Delete a non-admin account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Admin role required or target is an admin", body = Error),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let claims = session.require_claims()?;
    let id = user_id_from_path(&path)?;
    state.accounts.delete_user(&claims, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
