//! End-to-end tests for the actix-web integration.
//!
//! Run with: `cargo test --features actix --test e2e_actix`

#![cfg(feature = "actix")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use actix_web::http::{StatusCode, header};
use actix_web::{App, HttpRequest, HttpResponse, test, web};
use enclave_session::api::SessionHttpError;
use enclave_session::cookie::Cookie;
use enclave_session::{
    CookieTransport, MemoryStore, RequestContext, ResponseCookies, SessionConfig, SessionManager,
};
use serde::{Deserialize, Serialize};

type Manager = SessionManager<CookieTransport, MemoryStore>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counter {
    value: i64,
}

async fn increment(
    req: HttpRequest,
    manager: web::Data<Manager>,
) -> Result<HttpResponse, SessionHttpError> {
    let ctx = RequestContext::new();
    let mut cookies = ResponseCookies::new();

    let session = manager
        .load_or_new::<Counter, _, _>(&ctx, &req, &mut cookies)
        .await?;
    let mut counter = session.data.unwrap_or_default();
    counter.value += 1;
    manager.save(&ctx, &mut cookies, &session.id, &counter).await?;

    let mut response = HttpResponse::Ok().json(&counter);
    cookies.write_to(&mut response)?;
    Ok(response)
}

async fn logout(
    req: HttpRequest,
    manager: web::Data<Manager>,
) -> Result<HttpResponse, SessionHttpError> {
    let ctx = RequestContext::new();
    let mut response = HttpResponse::NoContent().finish();

    let session = manager
        .load_or_new::<Counter, _, _>(&ctx, &req, &mut response)
        .await?;
    manager.delete(&ctx, &mut response, &session.id).await?;
    Ok(response)
}

fn manager(store: MemoryStore) -> web::Data<Manager> {
    let config = SessionConfig::development("sid");
    web::Data::new(SessionManager::from_config(&config, store).unwrap())
}

fn set_cookie(resp: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
    let value = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_owned();
    Cookie::parse(value).unwrap()
}

macro_rules! app {
    ($manager:expr) => {
        test::init_service(
            App::new()
                .app_data($manager)
                .route("/", web::get().to(increment))
                .route("/logout", web::post().to(logout)),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_counter_survives_requests() {
    let app = app!(manager(MemoryStore::new()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp);
    assert_eq!(cookie.name(), "sid");
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["value"], 1);

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((header::COOKIE, format!("sid={}", cookie.value())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(set_cookie(&resp).value(), cookie.value());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["value"], 2);
}

#[actix_rt::test]
async fn test_forged_cookie_gets_fresh_session() {
    let app = app!(manager(MemoryStore::new()));

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((header::COOKIE, "sid=forged-id"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp);
    assert_ne!(cookie.value(), "forged-id");
    assert!(!cookie.value().is_empty());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["value"], 1);
}

#[actix_rt::test]
async fn test_single_binding_per_response() {
    let app = app!(manager(MemoryStore::new()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.headers().get_all(header::SET_COOKIE).count(), 1);
}

#[actix_rt::test]
async fn test_logout_removes_session() {
    let store = MemoryStore::new();
    let app = app!(manager(store.clone()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let cookie = set_cookie(&resp);
    assert_eq!(store.len(), 1);

    let req = test::TestRequest::post()
        .uri("/logout")
        .insert_header((header::COOKIE, format!("sid={}", cookie.value())))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let removal = set_cookie(&resp);
    assert_eq!(removal.value(), "");
    assert_eq!(removal.max_age(), Some(cookie::time::Duration::ZERO));
    assert!(store.is_empty());
}

#[actix_rt::test]
async fn test_unreadable_cookie_header_is_bad_request() {
    let app = app!(manager(MemoryStore::new()));

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header((
            header::COOKIE,
            header::HeaderValue::from_bytes(b"sid=\xfe\xff").unwrap(),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
