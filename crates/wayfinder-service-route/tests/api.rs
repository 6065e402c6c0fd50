use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};

use wayfinder_service_route::app;
use wayfinder_service_shared::test_utils::{
    fixture_locations::{CAFE, MAIN_ENTRANCE, RESTROOM, ROOF_TERRACE, STORAGE},
    test_state, test_state_with_db,
};
use wayfinder_service_shared::{
    PROBLEM_FORBIDDEN, PROBLEM_INVALID_REQUEST, PROBLEM_ROUTE_NOT_FOUND,
    PROBLEM_UNKNOWN_LOCATION,
};

fn server() -> TestServer {
    TestServer::new(app(test_state(), true)).expect("test server starts")
}

fn segment_ids(body: &Value) -> Vec<i64> {
    body["segments"]
        .as_array()
        .expect("segments array")
        .iter()
        .map(|s| s["edge_id"].as_i64().expect("edge id"))
        .collect()
}

#[tokio::test]
async fn route_picks_cheapest_restroom() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": RESTROOM}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["distance"], 60.0);
    assert_eq!(body["start_floor"], 0);
    assert_eq!(body["end_floor"], 1);
    assert_eq!(body["floors"], json!([0, 1]));
    assert_eq!(segment_ids(&body), vec![1, 2, 5, 7]);
    assert_eq!(body["segments"][2]["kind"], "stairs");
    assert_eq!(body["start_point"]["type"], "Point");
    assert_eq!(body["segments"][0]["geometry"]["type"], "LineString");
    assert_eq!(body["content_type"], "application/json");
}

#[tokio::test]
async fn route_avoiding_stairs_stays_on_ground_floor() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": RESTROOM, "avoid_stairs": true}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["distance"], 80.0);
    assert_eq!(body["end_floor"], 0);
}

#[tokio::test]
async fn route_uses_stairs_as_last_resort() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": ROOF_TERRACE, "avoid_stairs": true}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["base_distance"], 120.0);
    let distance = body["distance"].as_f64().expect("distance");
    assert!(distance > 1.0e6, "penalized cost is reported: {distance}");
}

#[tokio::test]
async fn end_geometry_selects_restroom_instance() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({
            "start": MAIN_ENTRANCE,
            "end": RESTROOM,
            "end_geometry": {"type": "Point", "coordinates": [21.014575, 52.224647]}
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["end_floor"], 0);
    assert_eq!(body["distance"], 80.0);
}

#[tokio::test]
async fn room_footprint_selects_restroom_instance() {
    // Footprint around the floor 0 restroom, as map clients send it.
    let response = server()
        .post("/api/v1/route")
        .json(&json!({
            "start": MAIN_ENTRANCE,
            "end": RESTROOM,
            "end_geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [21.014555, 52.224627],
                    [21.014595, 52.224627],
                    [21.014595, 52.224667],
                    [21.014555, 52.224667],
                    [21.014555, 52.224627]
                ]]
            }
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["end_floor"], 0);
    assert_eq!(body["distance"], 80.0);
}

#[tokio::test]
async fn line_geometry_is_bad_request() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({
            "start": MAIN_ENTRANCE,
            "end": RESTROOM,
            "end_geometry": {"type": "LineString", "coordinates": [[21.0, 52.0], [21.1, 52.1]]}
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["type"], PROBLEM_INVALID_REQUEST);
}

#[tokio::test]
async fn null_geometry_is_ignored() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": RESTROOM, "end_geometry": null}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["end_floor"], 1);
}

#[tokio::test]
async fn one_way_door_changes_return_trip() {
    let server = server();
    let outbound: Value = server
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": CAFE}))
        .await
        .json();
    let inbound: Value = server
        .post("/api/v1/route")
        .json(&json!({"start": CAFE, "end": MAIN_ENTRANCE}))
        .await
        .json();

    assert_eq!(outbound["distance"], 30.0);
    assert_eq!(inbound["distance"], 25.0);
    assert_eq!(segment_ids(&inbound), vec![12, 1]);
}

#[tokio::test]
async fn missing_end_is_bad_request() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["type"], PROBLEM_INVALID_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("'end'"));
}

#[tokio::test]
async fn malformed_json_is_problem_details() {
    let response = server()
        .post("/api/v1/route")
        .content_type("application/json")
        .bytes("{\"start\": ".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.header("content-type"),
        HeaderValue::from_static("application/problem+json")
    );
    let body: Value = response.json();
    assert_eq!(body["type"], PROBLEM_INVALID_REQUEST);
}

#[tokio::test]
async fn invalid_geometry_is_bad_request() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({
            "start": MAIN_ENTRANCE,
            "end": RESTROOM,
            "start_geometry": {"type": "Point", "coordinates": [400.0, 52.2]}
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("'start_geometry'"));
}

#[tokio::test]
async fn unknown_location_suggests_alternatives() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": "Restrom"}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["type"], PROBLEM_UNKNOWN_LOCATION);
    assert_eq!(body["suggestions"], json!(["Restroom"]));
    assert!(body["detail"].as_str().unwrap().starts_with("End location"));
}

#[tokio::test]
async fn unreachable_location_is_not_found() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": MAIN_ENTRANCE, "end": STORAGE}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["type"], PROBLEM_ROUTE_NOT_FOUND);
}

#[tokio::test]
async fn request_id_header_is_echoed_into_problem() {
    let response = server()
        .post("/api/v1/route")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("kiosk-7"),
        )
        .json(&json!({"start": "", "end": RESTROOM}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.header("x-request-id"),
        HeaderValue::from_static("kiosk-7")
    );
    let body: Value = response.json();
    assert_eq!(body["instance"], "kiosk-7");
}

#[tokio::test]
async fn generated_request_id_matches_success_body() {
    let response = server()
        .post("/api/v1/route")
        .json(&json!({"start": CAFE, "end": MAIN_ENTRANCE}))
        .await;

    response.assert_status_ok();
    let header = response.header("x-request-id");
    let body: Value = response.json();
    assert_eq!(body["request_id"], header.to_str().unwrap());
    assert_eq!(body["distance"], 25.0);
}

#[tokio::test]
async fn locations_are_grouped_by_category() {
    let response = server().get("/api/v1/locations").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["groups"]["amenity"], json!(["Cafe", "Restroom"]));
    assert_eq!(body["floors"]["Restroom"], 1);
    assert_eq!(body["floors"]["Roof Terrace"], 2);
}

#[tokio::test]
async fn reload_picks_up_new_locations() {
    let (state, fixture) = test_state_with_db();
    let server = TestServer::new(app(state, true)).expect("test server starts");

    fixture.execute("INSERT INTO locations VALUES (8, 'Seminar Room', 'classroom', 1);");
    let response = server.post("/admin/reload").await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["locations"], 8);

    let body: Value = server.get("/api/v1/locations").await.json();
    assert_eq!(
        body["groups"]["classroom"],
        json!(["Lecture Hall", "Seminar Room"])
    );
}

#[tokio::test]
async fn reload_without_database_is_unavailable() {
    let response = server().post("/admin/reload").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn reload_route_is_absent_unless_enabled() {
    let server = TestServer::new(app(test_state(), false)).expect("test server starts");
    let response = server.post("/admin/reload").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn browser_originated_reload_is_forbidden() {
    let (state, _fixture) = test_state_with_db();
    let server = TestServer::new(app(state, true)).expect("test server starts");

    let response = server
        .post("/admin/reload")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://example.org"),
        )
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(response.headers().get("access-control-allow-origin").is_none());
    let body: Value = response.json();
    assert_eq!(body["type"], PROBLEM_FORBIDDEN);
}

#[tokio::test]
async fn public_api_allows_cross_origin_reads() {
    let response = server()
        .get("/api/v1/locations")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://example.org"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("access-control-allow-origin"),
        HeaderValue::from_static("*")
    );
}

#[tokio::test]
async fn health_checks_report_ok() {
    let server = server();

    server.get("/health/live").await.assert_status_ok();

    let ready = server.get("/health/ready").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["locations_loaded"], 7);
}

#[tokio::test]
async fn metrics_endpoint_answers_without_recorder() {
    let response = server().get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().starts_with('#'));
}
