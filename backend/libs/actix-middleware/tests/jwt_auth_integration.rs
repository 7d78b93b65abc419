use actix_middleware::{compat, compat::LegacyUserField, JwtAuth, UserId};
use actix_web::{cookie::Cookie, http::StatusCode, test, web, App, HttpResponse};
use chrono::Duration;
use serde::Deserialize;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

async fn whoami(user: UserId) -> HttpResponse {
    HttpResponse::Ok().body(user.0.to_string())
}

#[derive(Deserialize)]
struct LegacyCartPayload {
    item_id: String,
    #[serde(default)]
    user_id: Option<String>,
}

impl LegacyUserField for LegacyCartPayload {
    fn set_user_id(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

async fn legacy_cart(user: UserId, payload: web::Json<LegacyCartPayload>) -> HttpResponse {
    let mut payload = payload.into_inner();
    compat::inject_user_id(user, &mut payload);
    HttpResponse::Ok().body(format!(
        "{}:{}",
        payload.item_id,
        payload.user_id.unwrap_or_default()
    ))
}

macro_rules! protected_app {
    () => {
        test::init_service(
            App::new()
                .service(
                    web::resource("/me")
                        .wrap(JwtAuth::new(SECRET))
                        .route(web::get().to(whoami)),
                )
                .service(
                    web::resource("/cart")
                        .wrap(JwtAuth::new(SECRET))
                        .route(web::post().to(legacy_cart)),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn missing_credential_is_rejected() {
    let app = protected_app!();

    let req = test::TestRequest::get().uri("/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("\"success\":false"));
    assert!(body.contains("no token provided"));
}

#[actix_web::test]
async fn all_three_transports_yield_the_same_subject() {
    let app = protected_app!();
    let subject = Uuid::new_v4();
    let token = auth_core::issue_token(subject, SECRET, Duration::hours(1)).unwrap();

    let via_cookie = test::TestRequest::get()
        .uri("/me")
        .cookie(Cookie::new("jwt", token.clone()))
        .to_request();
    let via_bearer = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let via_legacy = test::TestRequest::get()
        .uri("/me")
        .insert_header(("token", token.clone()))
        .to_request();

    for req in [via_cookie, via_bearer, via_legacy] {
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, subject.to_string().as_bytes());
    }
}

#[actix_web::test]
async fn cookie_takes_precedence_over_headers() {
    let app = protected_app!();
    let cookie_subject = Uuid::new_v4();
    let header_subject = Uuid::new_v4();
    let cookie_token = auth_core::issue_token(cookie_subject, SECRET, Duration::hours(1)).unwrap();
    let header_token = auth_core::issue_token(header_subject, SECRET, Duration::hours(1)).unwrap();

    let req = test::TestRequest::get()
        .uri("/me")
        .cookie(Cookie::new("jwt", cookie_token))
        .insert_header(("Authorization", format!("Bearer {}", header_token)))
        .to_request();

    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, cookie_subject.to_string().as_bytes());
}

#[actix_web::test]
async fn expired_and_invalid_credentials_are_distinguishable() {
    let app = protected_app!();

    let expired = auth_core::issue_token(Uuid::new_v4(), SECRET, Duration::hours(-2)).unwrap();
    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", expired)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("expired"));

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Invalid token"));
    assert!(!body.contains("expired"));
}

#[actix_web::test]
async fn tampered_credential_is_rejected() {
    let app = protected_app!();
    let token = auth_core::issue_token(Uuid::new_v4(), "some-other-secret", Duration::hours(1))
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/me")
        .cookie(Cookie::new("jwt", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn legacy_shim_injects_the_verified_subject() {
    let app = protected_app!();
    let subject = Uuid::new_v4();
    let token = auth_core::issue_token(subject, SECRET, Duration::hours(1)).unwrap();

    // Client-supplied user_id must be overridden by the verified identity
    let req = test::TestRequest::post()
        .uri("/cart")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(serde_json::json!({
            "item_id": "espresso",
            "user_id": "someone-else",
        }))
        .to_request();

    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, format!("espresso:{}", subject).as_bytes());
}
