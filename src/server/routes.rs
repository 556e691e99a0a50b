//! HTTP surface.
//!
//! Three JSON endpoints under `/api/v1/auth`. Every authentication failure
//! collapses to one uniform unauthorized body; malformed input is a 400 with
//! a sanitized message; dependency trouble is a 503. Internal reason codes
//! never leave the process.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::config::RateLimiter;
use super::service::{AuthService, ChallengeRequest, RegisterRequest, VerifyRequest};
use crate::Error;

/// Request bodies are small (a few hex integers); anything larger is noise.
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Uniform error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    timestamp: u64,
}

impl ErrorBody {
    fn reply(status: StatusCode, code: &'static str, message: &str) -> warp::reply::Response {
        let body = ErrorBody {
            code,
            message: message.to_string(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_else(|_| unreachable!("System time is after UNIX_EPOCH"))
                .as_secs(),
        };
        warp::reply::with_status(warp::reply::json(&body), status).into_response()
    }
}

/// Builds the route tree for the authentication API.
///
/// Unmatched paths, bad methods, and undeserializable bodies surface as
/// rejections; compose with [`handle_rejection`] at the serve boundary to
/// shape those into the uniform error body.
pub fn routes(
    service: Arc<AuthService>,
    limiter: RateLimiter,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let register = warp::path!("api" / "v1" / "auth" / "register")
        .and(warp::post())
        .and(json_body())
        .and(with_service(service.clone()))
        .and(with_limiter(limiter.clone()))
        .and_then(handle_register);

    let challenge = warp::path!("api" / "v1" / "auth" / "challenge")
        .and(warp::post())
        .and(json_body())
        .and(with_service(service.clone()))
        .and(with_limiter(limiter.clone()))
        .and_then(handle_challenge);

    let verify = warp::path!("api" / "v1" / "auth" / "verify")
        .and(warp::post())
        .and(json_body())
        .and(with_service(service))
        .and(with_limiter(limiter))
        .and_then(handle_verify);

    register.or(challenge).or(verify)
}

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_service(
    service: Arc<AuthService>,
) -> impl Filter<Extract = (Arc<AuthService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn with_limiter(
    limiter: RateLimiter,
) -> impl Filter<Extract = (RateLimiter,), Error = Infallible> + Clone {
    warp::any().map(move || limiter.clone())
}

async fn handle_register(
    req: RegisterRequest,
    service: Arc<AuthService>,
    limiter: RateLimiter,
) -> Result<warp::reply::Response, Infallible> {
    if !limiter.try_acquire().await {
        return Ok(too_many_requests());
    }
    Ok(match service.register(&req).await {
        Ok(()) => warp::reply::with_status(warp::reply(), StatusCode::CREATED).into_response(),
        Err(err) => error_reply(err),
    })
}

async fn handle_challenge(
    req: ChallengeRequest,
    service: Arc<AuthService>,
    limiter: RateLimiter,
) -> Result<warp::reply::Response, Infallible> {
    if !limiter.try_acquire().await {
        return Ok(too_many_requests());
    }
    Ok(match service.challenge(&req).await {
        Ok(response) => warp::reply::json(&response).into_response(),
        Err(err) => error_reply(err),
    })
}

async fn handle_verify(
    req: VerifyRequest,
    service: Arc<AuthService>,
    limiter: RateLimiter,
) -> Result<warp::reply::Response, Infallible> {
    if !limiter.try_acquire().await {
        return Ok(too_many_requests());
    }
    Ok(match service.verify(&req).await {
        Ok(token) => warp::reply::json(&token).into_response(),
        Err(err) => error_reply(err),
    })
}

fn too_many_requests() -> warp::reply::Response {
    ErrorBody::reply(
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMITED",
        "Too many requests",
    )
}

/// Maps the internal taxonomy onto the wire. The auth-failure variants all
/// produce byte-identical bodies.
fn error_reply(err: Error) -> warp::reply::Response {
    match err {
        Error::InvalidArgument(message) => {
            ErrorBody::reply(StatusCode::BAD_REQUEST, "BAD_REQUEST", &message)
        }
        Error::Conflict => ErrorBody::reply(
            StatusCode::CONFLICT,
            "CONFLICT",
            "Username already exists",
        ),
        Error::SessionNotFound | Error::BindingMismatch(_) | Error::ProofInvalid => {
            ErrorBody::reply(
                StatusCode::UNAUTHORIZED,
                "AUTH_FAILED",
                "Authentication failed",
            )
        }
        Error::DependencyUnavailable(_) => ErrorBody::reply(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Service temporarily unavailable",
        ),
    }
}

/// Shapes warp rejections into the uniform `{code, message, timestamp}`
/// body.
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    if rejection.is_not_found() {
        return Ok(ErrorBody::reply(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found",
        ));
    }
    if rejection
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        return Ok(ErrorBody::reply(
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            "Invalid request body",
        ));
    }
    if rejection
        .find::<warp::reject::PayloadTooLarge>()
        .is_some()
    {
        return Ok(ErrorBody::reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "Request body too large",
        ));
    }
    if rejection.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(ErrorBody::reply(
            StatusCode::LENGTH_REQUIRED,
            "LENGTH_REQUIRED",
            "Content length required",
        ));
    }
    if rejection
        .find::<warp::reject::MethodNotAllowed>()
        .is_some()
    {
        return Ok(ErrorBody::reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Method not allowed",
        ));
    }

    tracing::error!(?rejection, "unhandled rejection");
    Ok(ErrorBody::reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An unexpected error occurred",
    ))
}
