//! Read-through response caching middleware.
//!
//! Wraps a route so that successful GET responses are served from the
//! response cache, keyed by request path+query. Non-GET requests and any
//! request while the cache backend is unreachable bypass caching entirely;
//! the wrapped handler then runs unmodified and nothing is stored. Cache
//! writes are fire-and-forget: the response is committed to the client
//! without waiting for the store to be acknowledged.

use actix_web::{
    body::{self, BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    Error, HttpResponse,
};
use futures::future::{ready, Ready};
use response_cache::{response_key, ResponseCache};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CacheResponse {
    cache: Arc<ResponseCache>,
    ttl_secs: u64,
}

impl CacheResponse {
    pub fn new(cache: Arc<ResponseCache>, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CacheResponse
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = CacheResponseService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CacheResponseService {
            service: Rc::new(service),
            cache: self.cache.clone(),
            ttl_secs: self.ttl_secs,
        }))
    }
}

pub struct CacheResponseService<S> {
    service: Rc<S>,
    cache: Arc<ResponseCache>,
    ttl_secs: u64,
}

impl<S, B> Service<ServiceRequest> for CacheResponseService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let cache = self.cache.clone();
        let ttl_secs = self.ttl_secs;

        Box::pin(async move {
            // Only idempotent reads are ever cached, and only while the
            // backend is reachable
            if req.method() != Method::GET || !cache.is_available() {
                let res = service.call(req).await?;
                return Ok(res.map_into_boxed_body());
            }

            let key = if req.query_string().is_empty() {
                response_key(req.path())
            } else {
                response_key(&format!("{}?{}", req.path(), req.query_string()))
            };

            match cache.fetch(&key).await {
                Ok(Some(cached)) => {
                    let response = HttpResponse::Ok()
                        .insert_header(header::ContentType::json())
                        .body(cached);
                    return Ok(req.into_response(response));
                }
                Ok(None) => {}
                Err(e) => {
                    // A failing read degrades to a miss
                    warn!(key = %key, error = %e, "cache read failed, falling through to handler");
                }
            }

            let res = service.call(req).await?;

            let cacheable = res.status().is_success()
                && res
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.starts_with("application/json"))
                    .unwrap_or(false);

            if !cacheable {
                return Ok(res.map_into_boxed_body());
            }

            let (http_req, res) = res.into_parts();
            let (res_head, res_body) = res.into_parts();

            let bytes = match body::to_bytes(res_body).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    return Err(actix_web::error::ErrorInternalServerError(
                        "failed to buffer response body",
                    ))
                }
            };

            // Fire-and-forget store: the client never waits on the backend
            let stored = bytes.to_vec();
            let store_key = key.clone();
            tokio::spawn(async move {
                match cache.store(&store_key, stored, ttl_secs).await {
                    Ok(()) => debug!(key = %store_key, ttl_secs, "response cached"),
                    Err(e) => warn!(key = %store_key, error = %e, "cache store failed"),
                }
            });

            let res = res_head.set_body(bytes).map_into_boxed_body();
            Ok(ServiceResponse::new(http_req, res))
        })
    }
}
