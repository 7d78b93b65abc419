use actix_middleware::CacheResponse;
use actix_web::{test, web, App, HttpResponse};
use response_cache::{ReconnectPolicy, ResponseCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

struct HitCounter(AtomicUsize);

async fn counted(counter: web::Data<HitCounter>) -> HttpResponse {
    let n = counter.0.fetch_add(1, Ordering::SeqCst) + 1;
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": n }))
}

#[actix_web::test]
async fn unreachable_backend_falls_through_to_handler() {
    let cache = ResponseCache::connect("redis://127.0.0.1:1", ReconnectPolicy { max_attempts: 1 })
        .await
        .unwrap();
    let counter = web::Data::new(HitCounter(AtomicUsize::new(0)));

    let app = test::init_service(
        App::new().app_data(counter.clone()).service(
            web::resource("/items")
                .wrap(CacheResponse::new(cache.clone(), 60))
                .route(web::get().to(counted)),
        ),
    )
    .await;

    for _ in 0..2 {
        let req = test::TestRequest::get().uri("/items").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    // Handler ran both times; nothing was cached
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn repeated_get_is_served_from_cache() {
    let cache =
        match ResponseCache::connect("redis://127.0.0.1:6379", ReconnectPolicy::default()).await {
            Ok(c) if c.is_available() => c,
            _ => {
                eprintln!("Skipping test: Redis not available");
                return;
            }
        };

    let counter = web::Data::new(HitCounter(AtomicUsize::new(0)));
    let app = test::init_service(
        App::new().app_data(counter.clone()).service(
            web::resource("/items/{run}")
                .wrap(CacheResponse::new(cache.clone(), 60))
                .route(web::get().to(counted)),
        ),
    )
    .await;

    // Unique path per run so earlier stored entries never interfere
    let uri = format!("/items/{}", Uuid::new_v4());

    let req = test::TestRequest::get().uri(&uri).to_request();
    let first = test::call_and_read_body(&app, req).await;

    // The store is fire-and-forget; give the spawned write a moment to land
    tokio::time::sleep(Duration::from_millis(200)).await;

    let req = test::TestRequest::get().uri(&uri).to_request();
    let second = test::call_and_read_body(&app, req).await;

    assert_eq!(first, second);
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);

    cache.invalidate(&format!("cache:{}*", uri)).await.unwrap();
}

#[actix_web::test]
async fn mutating_requests_are_never_cached() {
    let cache =
        match ResponseCache::connect("redis://127.0.0.1:6379", ReconnectPolicy::default()).await {
            Ok(c) if c.is_available() => c,
            _ => {
                eprintln!("Skipping test: Redis not available");
                return;
            }
        };

    let counter = web::Data::new(HitCounter(AtomicUsize::new(0)));
    let app = test::init_service(
        App::new().app_data(counter.clone()).service(
            web::resource("/items/{run}")
                .wrap(CacheResponse::new(cache.clone(), 60))
                .route(web::post().to(counted)),
        ),
    )
    .await;

    let uri = format!("/items/{}", Uuid::new_v4());
    for _ in 0..2 {
        let req = test::TestRequest::post().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    assert_eq!(
        cache.fetch(&format!("cache:{}", uri)).await.unwrap(),
        None
    );
}
