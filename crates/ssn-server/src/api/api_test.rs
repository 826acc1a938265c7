use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use super::*;

const FIXTURE: &str = r#"{
    "services": [
        {
            "_id": "svc-near",
            "ServiceProviderName": "Booth Centre",
            "ServiceProviderKey": "booth-centre",
            "ParentCategoryKey": "support",
            "SubCategoryKey": "general",
            "Address": {
                "Street": "Edward Holt House",
                "Location": { "type": "Point", "coordinates": [-2.2426, 53.4808] }
            }
        },
        {
            "id": "svc-mid",
            "name": "Test Health Service",
            "category": "medical",
            "organisation": { "name": "City Health", "slug": "city-health", "isVerified": true },
            "Location": { "type": "Point", "coordinates": [-2.2300, 53.4900] }
        },
        {
            "id": "svc-same-site",
            "name": "City Health Dental",
            "category": "medical",
            "organisation": { "name": "City Health", "slug": "city-health", "isVerified": true },
            "Location": { "type": "Point", "coordinates": [-2.2300, 53.4900] }
        },
        {
            "id": "svc-leeds",
            "name": "Leeds Food Bank",
            "category": "foodbank",
            "organisation": { "name": "Leeds Food", "slug": "leeds-food" },
            "Location": { "type": "Point", "coordinates": [-1.5491, 53.8008] }
        }
    ],
    "categories": [
        { "Key": "medical", "Name": "Health", "SubCategories": [{ "Key": "gp", "Name": "GP" }] }
    ],
    "faqs": [
        { "_id": "f1", "Title": "Low", "LocationKey": "manchester", "SortPosition": 1 },
        { "_id": "f2", "Title": "High", "LocationKey": "manchester", "SortPosition": 9 },
        { "_id": "f3", "Title": "Leeds", "LocationKey": "leeds", "SortPosition": 5 }
    ],
    "cities": [
        { "Key": "manchester", "Name": "Manchester", "IsPublic": true }
    ],
    "news": {
        "general": [{ "Title": "Winter shelter opens" }]
    },
    "organisations": [
        { "Key": "booth-centre", "Name": "Booth Centre", "IsVerified": true }
    ]
}"#;

fn app_with_fixture() -> Router {
    let directory = Directory::from_json(FIXTURE).expect("fixture parses");
    build_app(
        AppState {
            directory: Some(Arc::new(directory)),
        },
        default_rate_limit_state(),
    )
}

fn app_without_directory() -> Router {
    build_app(AppState { directory: None }, default_rate_limit_state())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

#[test]
fn api_error_directory_unavailable_maps_to_503() {
    let response = ApiError::new("req-1", "directory_unavailable", "no directory").into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn camel_case_keys_rewrites_nested_objects() {
    let value = camel_case_keys(serde_json::json!({
        "_id": "x",
        "Name": "Health",
        "SubCategories": [{ "Key": "gp" }],
        "alreadyCamel": 1
    }));
    assert_eq!(value["id"], "x");
    assert_eq!(value["name"], "Health");
    assert_eq!(value["subCategories"][0]["key"], "gp");
    assert_eq!(value["alreadyCamel"], 1);
}

#[tokio::test]
async fn health_reports_directory_state() {
    let (status, json) = get_json(app_with_fixture(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["directory"], "loaded");
    assert!(json["meta"]["request_id"].is_string());

    let (status, json) = get_json(app_without_directory(), "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let response = app_with_fixture()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
}

#[tokio::test]
async fn services_radius_search_orders_by_distance() {
    let (status, json) = get_json(
        app_with_fixture(),
        "/api/services?lat=53.4808&lng=-2.2426&radius=5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().expect("results array");
    let ids: Vec<&str> = results
        .iter()
        .map(|r| r.get("id").or_else(|| r.get("_id")).and_then(|v| v.as_str()).unwrap())
        .collect();
    assert_eq!(ids, vec!["svc-near", "svc-mid", "svc-same-site"]);
    assert!(results[0]["distance"].as_f64().unwrap() < 0.01);
    assert!(results[1]["distance"].as_f64().unwrap() > 0.5);
}

#[tokio::test]
async fn services_category_and_limit_apply() {
    let (_, json) = get_json(
        app_with_fixture(),
        "/api/services?lat=53.4808&lng=-2.2426&radius=5&category=medical&limit=1",
    )
    .await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "svc-mid");
}

#[tokio::test]
async fn services_without_location_lists_everything() {
    let (status, json) = get_json(app_with_fixture(), "/api/services?limit=100").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.get("distance").is_none()));
}

#[tokio::test]
async fn services_reject_half_a_coordinate() {
    let (status, json) = get_json(app_with_fixture(), "/api/services?lat=53.48").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn services_reject_non_numeric_query() {
    let (status, json) = get_json(app_with_fixture(), "/api/services?lat=north&lng=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn data_routes_answer_503_without_directory() {
    for uri in [
        "/api/services?lat=53.4808&lng=-2.2426",
        "/api/categories",
        "/api/faqs",
        "/api/locations",
        "/api/organisations/booth-centre",
    ] {
        let (status, json) = get_json(app_without_directory(), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(json["error"]["code"], "directory_unavailable", "{uri}");
    }
}

#[tokio::test]
async fn news_degrades_to_empty_success() {
    let (status, json) = get_json(app_without_directory(), "/api/news/general").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["news"], serde_json::json!([]));

    let (_, json) = get_json(app_with_fixture(), "/api/locations/atlantis/news").await;
    assert_eq!(json["data"]["news"], serde_json::json!([]));

    let (_, json) = get_json(app_with_fixture(), "/api/news/general").await;
    assert_eq!(json["data"]["news"][0]["title"], "Winter shelter opens");
}

#[tokio::test]
async fn categories_are_camel_cased() {
    let (status, json) = get_json(app_with_fixture(), "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["key"], "medical");
    assert_eq!(json["data"][0]["subCategories"][0]["name"], "GP");
}

#[tokio::test]
async fn faqs_filter_by_location_and_sort() {
    let (_, json) = get_json(app_with_fixture(), "/api/faqs?location=manchester").await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["High", "Low"]);

    let (_, json) = get_json(app_with_fixture(), "/api/faqs").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn locations_are_camel_cased() {
    let (_, json) = get_json(app_with_fixture(), "/api/locations").await;
    assert_eq!(json["data"][0]["key"], "manchester");
    assert_eq!(json["data"][0]["isPublic"], true);
}

#[tokio::test]
async fn organisation_detail_groups_sites() {
    let (status, json) = get_json(app_with_fixture(), "/api/organisations/city-health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["organisation"]["slug"], "city-health");
    assert_eq!(json["data"]["services"].as_array().unwrap().len(), 2);
    let locations = json["data"]["locations"].as_array().unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(
        locations[0]["serviceIds"],
        serde_json::json!(["svc-mid", "svc-same-site"])
    );
}

#[tokio::test]
async fn organisation_record_is_preferred() {
    let (_, json) = get_json(app_with_fixture(), "/api/organisations/booth-centre").await;
    assert_eq!(json["data"]["organisation"]["name"], "Booth Centre");
    assert_eq!(json["data"]["organisation"]["isVerified"], true);
}

#[tokio::test]
async fn unknown_organisation_is_404() {
    let (status, json) = get_json(app_with_fixture(), "/api/organisations/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn rate_limit_answers_429_with_retry_after() {
    let directory = Directory::from_json(FIXTURE).expect("fixture parses");
    let app = build_app(
        AppState {
            directory: Some(Arc::new(directory)),
        },
        RateLimitState::new(1, Duration::from_secs(60)),
    );

    let first = app
        .clone()
        .oneshot(Request::builder().uri("/api/categories").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(Request::builder().uri("/api/categories").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn news_stays_successful_after_rate_limit_is_hit() {
    let directory = Directory::from_json(FIXTURE).expect("fixture parses");
    let app = build_app(
        AppState {
            directory: Some(Arc::new(directory)),
        },
        RateLimitState::new(1, Duration::from_secs(60)),
    );

    let (status, _) = get_json(app.clone(), "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(app.clone(), "/api/faqs").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    for uri in ["/api/news/general", "/api/locations/manchester/news"] {
        let (status, json) = get_json(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json["status"], "success", "{uri}");
        assert!(json["data"]["news"].is_array(), "{uri}");
    }
}
