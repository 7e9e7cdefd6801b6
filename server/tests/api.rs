use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use padel_server::config::Config;
use padel_server::routes::create_routes;
use padel_server::state::AppState;
use padel_server::store::MemoryStore;

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let config = Config::default();
        let state = AppState::new(Arc::new(MemoryStore::new()), &config);
        state
            .accounts
            .seed_admin("admin", "admin123", Some("Administrator"))
            .await
            .unwrap();

        Self {
            router: create_routes(state, &config),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, username: &str, password: &str) -> (Value, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        let token = body["token"].as_str().unwrap().to_string();
        (body["user"].clone(), token)
    }

    async fn register(&self, username: &str, password: &str, name: &str) -> (Value, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(json!({"username": username, "password": password, "name": name})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let token = body["token"].as_str().unwrap().to_string();
        (body["user"].clone(), token)
    }

    async fn create_ticket(&self, admin: &str, name: &str, price: i64) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/tickets",
                Some(admin),
                Some(json!({"name": name, "price": price})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create ticket failed: {body}");
        body["id"].as_i64().unwrap()
    }

    async fn book(&self, token: &str, ticket_id: i64, players: i64) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/bookings",
                Some(token),
                Some(json!({
                    "ticket_type_id": ticket_id,
                    "date": "2024-01-01",
                    "time": "18:00",
                    "players": players,
                    "payment_method": "QRIS"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "booking failed: {body}");
        body["id"].as_i64().unwrap()
    }

    async fn set_status(&self, token: &str, id: i64, status: &str) -> (StatusCode, Value) {
        self.send(
            Method::PUT,
            "/bookings",
            Some(token),
            Some(json!({"id": id, "status": status})),
        )
        .await
    }
}

#[tokio::test]
async fn test_end_to_end_booking_lifecycle() {
    let app = TestApp::new().await;

    let (registered, _) = app.register("alice", "pw123", "Alice").await;
    assert_eq!(registered["role"], "user");
    assert_eq!(registered["name"], "Alice");
    assert!(registered.get("password").is_none());

    let (alice, alice_token) = app.login("alice", "pw123").await;
    assert_eq!(alice["role"], "user");
    assert_eq!(alice["id"], registered["id"]);

    let (_, admin_token) = app.login("admin", "admin123").await;
    let ticket_id = app.create_ticket(&admin_token, "Standard", 100_000).await;

    let booking_id = app.book(&alice_token, ticket_id, 3).await;

    let (status, listed) = app
        .send(Method::GET, "/bookings", Some(&alice_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], booking_id);
    assert_eq!(listed[0]["total"], 300_000);
    assert_eq!(listed[0]["status"], "Belum Bayar");
    assert_eq!(listed[0]["ticketName"], "Standard");
    assert_eq!(listed[0]["username"], "alice");
    assert_eq!(listed[0]["paymentMethod"], "QRIS");

    let (status, _) = app
        .set_status(&alice_token, booking_id, "Menunggu Konfirmasi")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.set_status(&admin_token, booking_id, "Lunas").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, all) = app
        .send(Method::GET, "/bookings", Some(&admin_token), None)
        .await;
    let revenue: i64 = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["status"] == "Lunas")
        .map(|b| b["total"].as_i64().unwrap())
        .sum();
    assert_eq!(revenue, 300_000);

    let (status, stats) = app
        .send(Method::GET, "/stats", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["revenue"], 300_000);
    assert_eq!(stats["paidBookings"], 1);
    assert_eq!(stats["totalBookings"], 1);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("alice", "pw123", "Alice").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "alice", "password": "other"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let (user, _) = app.login("alice", "pw123").await;
    assert_eq!(user["name"], "Alice");
}

#[tokio::test]
async fn test_register_ignores_requested_role() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "mallory", "password": "pw123", "role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "user");

    let token = body["token"].as_str().unwrap();
    let (status, _) = app.send(Method::GET, "/stats", Some(token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (user, _) = app.login("mallory", "pw123").await;
    assert_eq!(user["role"], "user");
}

#[tokio::test]
async fn test_register_and_login_validation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "  ", "password": "pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "nobody", "password": "pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::POST, "/login", None, Some(json!({"username": "admin"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_ticket_crud_requires_admin() {
    let app = TestApp::new().await;
    let (_, alice_token) = app.register("alice", "pw123", "Alice").await;
    let (_, admin_token) = app.login("admin", "admin123").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/tickets",
            Some(&alice_token),
            Some(json!({"name": "Cheap", "price": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/tickets",
            None,
            Some(json!({"name": "Cheap", "price": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let first = app.create_ticket(&admin_token, "Standard", 100_000).await;
    let second = app.create_ticket(&admin_token, "Premium", 150_000).await;

    let (status, listed) = app.send(Method::GET, "/tickets", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        listed,
        json!([
            {"id": second, "name": "Premium", "price": 150_000},
            {"id": first, "name": "Standard", "price": 100_000}
        ])
    );

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/tickets?id={first}"),
            Some(&admin_token),
            Some(json!({"name": "Standard", "price": 120_000})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::PUT,
            "/tickets?id=999",
            Some(&admin_token),
            Some(json!({"name": "Ghost", "price": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            "/tickets",
            Some(&admin_token),
            Some(json!({"name": "Free", "price": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/tickets?id={second}"),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/tickets?id={second}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::DELETE, "/tickets", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_price_change_does_not_touch_existing_totals() {
    let app = TestApp::new().await;
    let (_, alice_token) = app.register("alice", "pw123", "Alice").await;
    let (_, admin_token) = app.login("admin", "admin123").await;
    let ticket_id = app.create_ticket(&admin_token, "Standard", 100_000).await;
    app.book(&alice_token, ticket_id, 2).await;

    app.send(
        Method::PUT,
        &format!("/tickets?id={ticket_id}"),
        Some(&admin_token),
        Some(json!({"name": "Standard", "price": 500_000})),
    )
    .await;

    let (_, listed) = app
        .send(Method::GET, "/bookings", Some(&alice_token), None)
        .await;
    assert_eq!(listed[0]["total"], 200_000);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/tickets?id={ticket_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_users_only_see_and_pay_their_own_bookings() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.register("alice", "pw123", "Alice").await;
    let (bob, bob_token) = app.register("bob", "pw456", "Bob").await;
    let (_, admin_token) = app.login("admin", "admin123").await;
    let ticket_id = app.create_ticket(&admin_token, "Standard", 100_000).await;

    for _ in 0..3 {
        app.book(&bob_token, ticket_id, 1).await;
    }
    let alice_booking = app.book(&alice_token, ticket_id, 2).await;

    let (status, listed) = app
        .send(
            Method::GET,
            &format!("/bookings?user_id={}", alice["id"]),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed.iter().all(|b| b["username"] == "alice"));

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/bookings?user_id={}", bob["id"]),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .set_status(&bob_token, alice_booking, "Menunggu Konfirmasi")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/bookings?id={alice_booking}"),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::GET, "/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/bookings",
            Some(&alice_token),
            Some(json!({
                "user_id": bob["id"],
                "ticket_type_id": ticket_id,
                "date": "2024-01-01",
                "time": "18:00"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, all) = app
        .send(Method::GET, "/bookings", Some(&admin_token), None)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_status_machine_over_http() {
    let app = TestApp::new().await;
    let (_, alice_token) = app.register("alice", "pw123", "Alice").await;
    let (_, admin_token) = app.login("admin", "admin123").await;
    let ticket_id = app.create_ticket(&admin_token, "Standard", 100_000).await;
    let booking_id = app.book(&alice_token, ticket_id, 1).await;

    let (status, body) = app
        .set_status(&alice_token, booking_id, "Menunggu Konfirmacy")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app.set_status(&admin_token, booking_id, "Lunas").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .set_status(&alice_token, booking_id, "Menunggu Konfirmasi")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.set_status(&alice_token, booking_id, "Lunas").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .set_status(&admin_token, booking_id, "Belum Bayar")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.set_status(&admin_token, 9_999, "Lunas").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PUT,
            "/bookings",
            Some(&alice_token),
            Some(json!({"status": "Lunas"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/bookings?id={booking_id}"),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = app
        .send(Method::GET, "/bookings", Some(&alice_token), None)
        .await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_booking_input_validation() {
    let app = TestApp::new().await;
    let (_, alice_token) = app.register("alice", "pw123", "Alice").await;
    let (_, admin_token) = app.login("admin", "admin123").await;
    let ticket_id = app.create_ticket(&admin_token, "Standard", 100_000).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/bookings",
            Some(&alice_token),
            Some(json!({"ticket_type_id": ticket_id, "time": "18:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::POST,
            "/bookings",
            Some(&alice_token),
            Some(json!({"ticket_type_id": 4242, "date": "2024-01-01", "time": "18:00"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "TICKET_TYPE_NOT_FOUND");

    let (status, _) = app
        .send(
            Method::POST,
            "/bookings",
            Some(&alice_token),
            Some(json!({
                "ticket_type_id": ticket_id,
                "date": "2024-01-01",
                "time": "18:00",
                "players": 9
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = TestApp::new().await;
    let (user, token) = app.register("alice", "pw123", "Alice").await;

    let (status, me) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"], user);

    let (status, _) = app.send(Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_method_and_unknown_route() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/login", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);

    let (status, _) = app.send(Method::PATCH, "/tickets", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) = app.send(Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("strict-transport-security").is_none());

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["status"], "ok");
}
