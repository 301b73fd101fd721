#![allow(clippy::print_stdout, clippy::unwrap_used, clippy::expect_used)]

//! Counter server.
//!
//! Every visit to `/view` increments a counter kept in the visitor's session.
//! `/logout` forgets the session.
//!
//! Run with: `cargo run --example counter_server --features actix`
//!
//!   curl -c cookies.txt -b cookies.txt http://localhost:8080/view
//!   curl -c cookies.txt -b cookies.txt -X POST http://localhost:8080/logout

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use enclave_session::api::SessionHttpError;
use enclave_session::events::listeners::LoggingListener;
use enclave_session::{
    CookieTransport, MemoryStore, RequestContext, ResponseCookies, SessionConfig, SessionManager,
    register_event_listeners,
};
use serde::{Deserialize, Serialize};

type Manager = SessionManager<CookieTransport, MemoryStore>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Visits {
    counter: i64,
}

async fn view(
    req: HttpRequest,
    manager: web::Data<Manager>,
) -> Result<HttpResponse, SessionHttpError> {
    let ctx = RequestContext::new().with_timeout(std::time::Duration::from_secs(2));
    let mut cookies = ResponseCookies::new();

    let session = manager
        .load_or_new::<Visits, _, _>(&ctx, &req, &mut cookies)
        .await?;
    let mut visits = session.data.unwrap_or_default();
    visits.counter += 1;
    manager.save(&ctx, &mut cookies, &session.id, &visits).await?;

    let mut response = HttpResponse::Ok()
        .content_type("text/plain")
        .body(format!("Hello, counter={}\n", visits.counter));
    cookies.write_to(&mut response)?;
    Ok(response)
}

async fn logout(
    req: HttpRequest,
    manager: web::Data<Manager>,
) -> Result<HttpResponse, SessionHttpError> {
    let ctx = RequestContext::new();
    let mut response = HttpResponse::Ok().body("Bye\n");

    let session = manager
        .load_or_new::<Visits, _, _>(&ctx, &req, &mut response)
        .await?;
    manager.delete(&ctx, &mut response, &session.id).await?;
    Ok(response)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    register_event_listeners(|registry| {
        registry.listen(LoggingListener::new());
    });

    // plain HTTP on localhost, so no Secure attribute
    let config = SessionConfig::development("SessionID");
    let store = MemoryStore::with_config(config.store.clone());
    let manager = web::Data::new(
        SessionManager::from_config(&config, store).expect("valid session configuration"),
    );

    println!("Starting counter server on http://localhost:8080");
    println!("  GET  /view   - increment the session counter");
    println!("  POST /logout - delete the session");

    HttpServer::new(move || {
        App::new()
            .app_data(manager.clone())
            .route("/view", web::get().to(view))
            .route("/logout", web::post().to(logout))
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
