use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use roadside_assist::api::rest::router;
use roadside_assist::config::Settings;
use roadside_assist::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

const KM_PER_DEGREE: f64 = 111.194_926_644_558_7;
const ORIGIN_LAT: f64 = 12.9716;
const ORIGIN_LNG: f64 = 77.5946;

fn setup() -> axum::Router {
    router(Arc::new(AppState::new(Settings::default(), 1024)))
}

fn setup_without_fallback() -> (axum::Router, Arc<AppState>) {
    let settings = Settings {
        sample_fallback: false,
        ..Settings::default()
    };
    let state = Arc::new(AppState::new(settings, 1024));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn garage_body(name: &str, km_north: f64, vehicle_types: Value) -> Value {
    json!({
        "name": name,
        "location": { "lat": ORIGIN_LAT + km_north / KM_PER_DEGREE, "lng": ORIGIN_LNG },
        "address": "Bangalore",
        "phone": "+91 9000000000",
        "vehicle_types": vehicle_types,
        "services": ["Repair"],
        "rating": 4.4,
        "working_hours": "9 AM - 7 PM"
    })
}

async fn register_and_approve(app: &axum::Router, body: Value) -> String {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/garages", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let garage = body_json(res).await;
    let id = garage["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/garages/{id}/status"),
            json!({ "status": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    id
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["garages"], 0);
    assert_eq!(body["assistance_requests"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("assistance_requests_open"));
}

#[tokio::test]
async fn registered_garage_starts_pending() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/garages",
            garage_body("Quick Fix", 1.0, json!(["2-wheeler"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["name"], "Quick Fix");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["is_active"], true);
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn register_garage_without_vehicle_types_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/garages",
            garage_body("Nowhere Motors", 1.0, json!([])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_garage_with_unknown_vehicle_type_is_rejected() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/garages",
            garage_body("Truck Stop", 1.0, json!(["18-wheeler"])),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn nearby_filters_by_vehicle_type_and_sorts() {
    let (app, _state) = setup_without_fallback();

    register_and_approve(&app, garage_body("Eight", 8.0, json!(["4-wheeler"]))).await;
    register_and_approve(&app, garage_body("Five", 5.0, json!(["2-wheeler"]))).await;
    register_and_approve(&app, garage_body("Two", 2.0, json!(["4-wheeler"]))).await;

    let response = app
        .oneshot(get_request(&format!(
            "/garages/nearby?lat={ORIGIN_LAT}&lng={ORIGIN_LNG}&vehicle_type=4-wheeler&radius_km=10"
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "directory");
    let garages = body["garages"].as_array().unwrap();
    let names: Vec<&str> = garages.iter().map(|g| g["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Two", "Eight"]);
    assert_eq!(garages[0]["distance_km"], 2.0);
    assert_eq!(garages[1]["distance_km"], 8.0);
}

#[tokio::test]
async fn pending_garages_are_not_listed() {
    let (app, _state) = setup_without_fallback();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/garages",
            garage_body("Unreviewed", 0.5, json!(["4-wheeler"])),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get_request(&format!(
            "/garages/nearby?lat={ORIGIN_LAT}&lng={ORIGIN_LNG}"
        )))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["garages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn deactivated_garage_disappears_from_nearby() {
    let (app, _state) = setup_without_fallback();
    let id = register_and_approve(&app, garage_body("Closing", 1.0, json!(["3-wheeler"]))).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/garages/{id}/active"),
            json!({ "is_active": false }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(&format!(
            "/garages/nearby?lat={ORIGIN_LAT}&lng={ORIGIN_LNG}&vehicle_type=all"
        )))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["garages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_directory_serves_sample_garages() {
    let app = setup();
    let response = app
        .oneshot(get_request(&format!(
            "/garages/nearby?lat={ORIGIN_LAT}&lng={ORIGIN_LNG}&vehicle_type=2-wheeler"
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "sample");
    assert_eq!(body["garages"].as_array().unwrap().len(), 4);
    assert_eq!(body["garages"][0]["name"], "Quick Fix Motors");
}

#[tokio::test]
async fn imported_malformed_records_are_skipped() {
    let (app, state) = setup_without_fallback();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/garages/import",
            json!([
                {
                    "id": "no-location",
                    "name": "Ghost Garage",
                    "vehicle_types": ["4-wheeler"],
                    "status": "approved",
                    "is_active": true
                },
                {
                    "id": "good",
                    "name": "Solid Garage",
                    "location": { "lat": ORIGIN_LAT, "lng": ORIGIN_LNG + 0.01 },
                    "vehicle_types": ["4-wheeler"],
                    "status": "approved",
                    "is_active": true
                }
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["imported"], 2);
    assert_eq!(state.garages.len(), 2);

    let response = app
        .oneshot(get_request(&format!(
            "/garages/nearby?lat={ORIGIN_LAT}&lng={ORIGIN_LNG}"
        )))
        .await
        .unwrap();
    let body = body_json(response).await;
    let garages = body["garages"].as_array().unwrap();
    assert_eq!(garages.len(), 1);
    assert_eq!(garages[0]["id"], "good");
}

#[tokio::test]
async fn nearby_rejects_invalid_coordinates() {
    let app = setup();
    let response = app
        .oneshot(get_request("/garages/nearby?lat=95.0&lng=10.0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn nearby_rejects_unknown_vehicle_type() {
    let app = setup();
    let response = app
        .oneshot(get_request(&format!(
            "/garages/nearby?lat={ORIGIN_LAT}&lng={ORIGIN_LNG}&vehicle_type=hovercraft"
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn moderating_unknown_garage_returns_404() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/garages/missing/status",
            json!({ "status": "approved" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_garage_removes_it() {
    let app = setup();
    let id = register_and_approve(&app, garage_body("Temp", 1.0, json!(["2-wheeler"]))).await;

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/garages/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.oneshot(get_request("/garages")).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn assistance_request_lifecycle() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/assistance-requests",
            json!({
                "user_id": "user-42",
                "problem_id": "engine-overheating",
                "vehicle_type": "4-wheeler",
                "request_type": "emergency-assistance",
                "location": { "latitude": ORIGIN_LAT, "longitude": ORIGIN_LNG, "accuracy": 18.0 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let request = body_json(res).await;
    assert_eq!(request["status"], "pending");
    let id = request["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/assistance-requests/{id}/status"),
            json!({ "status": "in-progress" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "in-progress");

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/assistance-requests/{id}/status"),
            json!({ "status": "pending" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .clone()
        .oneshot(get_request("/assistance-requests?status=in-progress"))
        .await
        .unwrap();
    let listed = body_json(res).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = app
        .oneshot(get_request("/assistance-requests?status=resolved"))
        .await
        .unwrap();
    let listed = body_json(res).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn assistance_request_without_user_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/assistance-requests",
            json!({
                "user_id": "",
                "request_type": "view-solution",
                "location": { "latitude": ORIGIN_LAT, "longitude": ORIGIN_LNG }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_assistance_request_returns_404() {
    let app = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/assistance-requests/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assistance_notes_can_be_edited() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/assistance-requests",
            json!({
                "user_id": "user-9",
                "request_type": "view-solution",
                "location": { "latitude": ORIGIN_LAT, "longitude": ORIGIN_LNG }
            }),
        ))
        .await
        .unwrap();
    let request = body_json(res).await;
    let id = request["id"].as_str().unwrap().to_string();
    assert_eq!(request["notes"], "");

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/assistance-requests/{id}/notes"),
            json!({ "notes": "called the user, tow truck dispatched" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["notes"], "called the user, tow truck dispatched");
    assert_eq!(updated["status"], "pending");

    let res = app
        .clone()
        .oneshot(get_request(&format!("/assistance-requests/{id}")))
        .await
        .unwrap();
    assert_eq!(
        body_json(res).await["notes"],
        "called the user, tow truck dispatched"
    );

    let res = app
        .oneshot(json_request(
            "PATCH",
            "/assistance-requests/00000000-0000-0000-0000-000000000000/notes",
            json!({ "notes": "nobody home" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_request_cannot_skip_to_resolved() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/assistance-requests",
            json!({
                "user_id": "user-3",
                "request_type": "emergency-assistance",
                "location": { "latitude": ORIGIN_LAT, "longitude": ORIGIN_LNG }
            }),
        ))
        .await
        .unwrap();
    let id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .oneshot(json_request(
            "PATCH",
            &format!("/assistance-requests/{id}/status"),
            json!({ "status": "resolved" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejecting_a_garage_requires_a_reason() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/garages",
            garage_body("Shady Motors", 1.0, json!(["4-wheeler"])),
        ))
        .await
        .unwrap();
    let id = body_json(res).await["id"].as_str().unwrap().to_string();

    for body in [
        json!({ "status": "rejected" }),
        json!({ "status": "rejected", "rejection_reason": "   " }),
    ] {
        let res = app
            .clone()
            .oneshot(json_request("PATCH", &format!("/garages/{id}/status"), body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/garages/{id}/status"),
            json!({ "status": "rejected", "rejection_reason": "address could not be verified" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let garage = body_json(res).await;
    assert_eq!(garage["status"], "rejected");
    assert_eq!(garage["rejection_reason"], "address could not be verified");
    assert!(garage["reviewed_at"].is_string());

    let res = app.oneshot(get_request("/garages")).await.unwrap();
    let listed = body_json(res).await;
    assert_eq!(
        listed[0]["rejection_reason"],
        "address could not be verified"
    );
}

#[tokio::test]
async fn sample_fallback_is_not_radius_bounded() {
    let app = setup();
    let response = app
        .oneshot(get_request("/garages/nearby?lat=28.6139&lng=77.2090&radius_km=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "sample");
    assert_eq!(body["radius_km"], 5.0);
    let garages = body["garages"].as_array().unwrap();
    assert_eq!(garages.len(), 5);
    assert!(garages.iter().all(|g| g["distance_km"].as_f64().unwrap() > 1_000.0));
}
