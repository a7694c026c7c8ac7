//! Route dispatch and handlers
//!
//! Exact-path routing over split segments. Everything under `/platform`
//! sits behind the auth gate; mutations validate the fetcher tag against
//! the registry before touching the store, so the aggregator never meets
//! an unresolvable tag.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use statusdeck_core::{FetcherKind, Platform};
use statusdeck_store::{NewPlatform, StoreError};

use crate::AppState;

// ============================================================================
// Wire DTOs (field names match the original public API)
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    token: String,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Deserialize)]
struct PlatformPayload {
    name: String,
    url: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Serialize)]
struct PlatformDto {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    url: String,
    #[serde(rename = "type")]
    kind: String,
}

impl From<Platform> for PlatformDto {
    fn from(platform: Platform) -> Self {
        Self {
            id: platform.id,
            name: platform.name,
            url: platform.url,
            kind: platform.kind.as_str().to_string(),
        }
    }
}

#[derive(Serialize)]
struct CreatedResponse {
    #[serde(rename = "insertedId")]
    inserted_id: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// ============================================================================
// Dispatch
// ============================================================================

/// Route a request to its handler. Never fails; every outcome is a response.
pub async fn dispatch<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["auth", "login"] if method == Method::POST => login(req, &state).await,
        ["auth", "logout"] if method == Method::POST => logout(&state),
        ["platform", rest @ ..] => {
            if !state.auth.authorize(credential(&req).as_deref()) {
                return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
            }
            platform_routes(req, &state, &method, rest).await
        }
        _ => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn platform_routes<B>(
    req: Request<B>,
    state: &AppState,
    method: &Method,
    rest: &[&str],
) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
{
    match rest {
        ["platforms"] if method == Method::GET => list_platforms(state).await,
        ["platforms"] if method == Method::POST => create_platform(req, state).await,
        ["platforms", id] if method == Method::GET => get_platform(state, id).await,
        ["platforms", id] if method == Method::POST => update_platform(req, state, id).await,
        ["platforms", id] if method == Method::DELETE => delete_platform(state, id).await,
        ["fetchers"] if method == Method::GET => json(StatusCode::OK, &state.registry.tags()),
        ["status"] if method == Method::GET => poll_status(state).await,
        _ => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn login<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
{
    let payload: LoginRequest = match read_json(req).await {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    match state.auth.login(&payload.username, &payload.password) {
        Ok(token) => {
            let mut response = json(
                StatusCode::OK,
                &LoginResponse {
                    success: true,
                    token: token.clone(),
                },
            );
            let cookie = format!("token={token}; HttpOnly; SameSite=Strict; Max-Age=3600");
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            response
        }
        Err(_) => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

fn logout(state: &AppState) -> Response<Full<Bytes>> {
    state.auth.logout();
    let mut response = json(StatusCode::OK, &SuccessResponse { success: true });
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("token=; Max-Age=0"),
    );
    response
}

async fn list_platforms(state: &AppState) -> Response<Full<Bytes>> {
    match state.store.list().await {
        Ok(platforms) => {
            let dtos: Vec<PlatformDto> = platforms.into_iter().map(PlatformDto::from).collect();
            json(StatusCode::OK, &dtos)
        }
        Err(err) => store_error(err),
    }
}

async fn get_platform(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.store.get(id).await {
        Ok(platform) => json(StatusCode::OK, &PlatformDto::from(platform)),
        Err(err) => store_error(err),
    }
}

async fn create_platform<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
{
    let payload: PlatformPayload = match read_json(req).await {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let Some(kind) = registered_kind(state, &payload.kind) else {
        return error(StatusCode::BAD_REQUEST, "Invalid platform type");
    };
    match state
        .store
        .create(NewPlatform {
            name: payload.name,
            url: payload.url,
            kind,
        })
        .await
    {
        Ok(platform) => json(
            StatusCode::CREATED,
            &CreatedResponse {
                inserted_id: platform.id,
            },
        ),
        Err(err) => store_error(err),
    }
}

async fn update_platform<B>(req: Request<B>, state: &AppState, id: &str) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
{
    let payload: PlatformPayload = match read_json(req).await {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let Some(kind) = registered_kind(state, &payload.kind) else {
        return error(StatusCode::BAD_REQUEST, "Invalid platform type");
    };
    match state
        .store
        .update(
            id,
            NewPlatform {
                name: payload.name,
                url: payload.url,
                kind,
            },
        )
        .await
    {
        Ok(()) => json(StatusCode::OK, &SuccessResponse { success: true }),
        Err(err) => store_error(err),
    }
}

async fn delete_platform(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.store.delete(id).await {
        Ok(()) => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Full::new(Bytes::new()))
            .unwrap(),
        Err(err) => store_error(err),
    }
}

async fn poll_status(state: &AppState) -> Response<Full<Bytes>> {
    let platforms = match state.store.list().await {
        Ok(platforms) => platforms,
        Err(err) => return store_error(err),
    };
    let statuses = state.aggregator.poll_all(&platforms).await;
    json(StatusCode::OK, &statuses)
}

// ============================================================================
// Helpers
// ============================================================================

/// The registry owns the valid tag set; a tag is only accepted if it parses
/// *and* resolves.
fn registered_kind(state: &AppState, tag: &str) -> Option<FetcherKind> {
    let kind = tag.parse::<FetcherKind>().ok()?;
    state.registry.resolve_kind(kind).ok()?;
    Some(kind)
}

/// Request credential: `Authorization` header, falling back to the `token`
/// cookie set at login.
fn credential<B>(req: &Request<B>) -> Option<String> {
    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        return Some(value.to_string());
    }
    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token=").map(str::to_string))
}

async fn read_json<T, B>(req: Request<B>) -> Result<T, Response<Full<Bytes>>>
where
    T: DeserializeOwned,
    B: hyper::body::Body,
{
    let bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Err(error(StatusCode::BAD_REQUEST, "Unreadable request body")),
    };
    serde_json::from_slice(&bytes)
        .map_err(|_| error(StatusCode::BAD_REQUEST, "Malformed JSON body"))
}

fn json<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .unwrap(),
        Err(err) => {
            tracing::error!(error = %err, "response serialization failed");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from_static(b"{\"error\":\"Internal error\"}")))
                .unwrap()
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json(
        status,
        &ErrorBody {
            error: message.to_string(),
        },
    )
}

fn store_error(err: StoreError) -> Response<Full<Bytes>> {
    match err {
        StoreError::NotFound(_) => error(StatusCode::NOT_FOUND, "Platform not found"),
        other => {
            tracing::error!(error = %other, "store failure");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error")
        }
    }
}
