use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, HttpMessage, HttpResponse, ResponseError,
};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Cookie carrying the signed credential
pub const COOKIE_NAME: &str = "jwt";

/// Plain header accepted for older clients
pub const LEGACY_TOKEN_HEADER: &str = "token";

/// User ID extracted from a verified credential.
///
/// Attached to request extensions by `JwtAuth`; immutable for the rest of
/// the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Why a request was rejected before reaching its handler.
///
/// Every kind maps to 401 with a `{"success": false, "message": ...}` body;
/// clients distinguish them by message text only.
#[derive(Debug, ThisError)]
pub enum AuthRejection {
    #[error("Not authorized, no token provided")]
    MissingCredential,
    #[error("Invalid token")]
    InvalidCredential,
    #[error("Token expired, please login again")]
    ExpiredCredential,
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

/// JWT authentication middleware.
///
/// Checks, in order: the `jwt` cookie, a `Bearer` Authorization header, the
/// legacy `token` header. First present wins; no merging. A rejected request
/// never reaches its handler.
pub struct JwtAuth {
    secret: Arc<String>,
}

impl JwtAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::new(secret.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthService {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    secret: Arc<String>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let secret = self.secret.clone();

        Box::pin(async move {
            let token = match extract_credential(&req) {
                Some(token) => token,
                None => return Ok(reject(req, AuthRejection::MissingCredential)),
            };

            let identity = match auth_core::verify_token(&token, &secret) {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(error = %e, "credential verification failed");
                    let rejection = match e {
                        auth_core::AuthError::TokenExpired => AuthRejection::ExpiredCredential,
                        _ => AuthRejection::InvalidCredential,
                    };
                    return Ok(reject(req, rejection));
                }
            };

            req.extensions_mut().insert(UserId(identity.subject));

            service
                .call(req)
                .await
                .map(|res| res.map_into_left_body())
        })
    }
}

fn reject<B>(req: ServiceRequest, rejection: AuthRejection) -> ServiceResponse<EitherBody<B>> {
    let response = rejection.error_response().map_into_right_body();
    req.into_response(response)
}

fn extract_credential(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(COOKIE_NAME) {
        return Some(cookie.value().to_string());
    }

    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(value.to_string());
    }

    req.headers()
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// FromRequest implementation for UserId
impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
