mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::build_app;

#[tokio::test]
async fn test_health_and_metrics() {
    let app = build_app();
    let r = app.send("GET", "/health", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["status"], "ok");

    let r = app.send("GET", "/metrics", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_reads_are_public() {
    let app = build_app();
    app.store.seed_category("Repair", "repair");
    app.store.seed_city("Kazan");
    app.store.seed_city("Anapa");

    let r = app.send("GET", "/api/categories", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body[0]["slug"], "repair");

    let r = app.send("GET", "/api/cities", None, None).await;
    let names: Vec<&str> = r.body.as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Anapa", "Kazan"]);
}

#[tokio::test]
async fn test_create_requires_session() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let r = app
        .send("POST", "/api/anketas", None, Some(json!({ "title": "Plumber", "categoryId": cat.id, "cityId": city.id })))
        .await;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    assert_eq!(r.body["success"], false);
}

#[tokio::test]
async fn test_create_then_list_and_get() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let token = app.login_as("owner@example.com", "Owner").await;

    let r = app.create_anketa(&token, "Plumber Ivan", &cat.id.to_string(), &city.id.to_string()).await;
    assert_eq!(r.status, StatusCode::OK, "{}", r.body);
    assert_eq!(r.body["success"], true);
    let id = r.body["anketa"]["id"].as_str().unwrap().to_string();

    let r = app.send("GET", "/api/anketas?category=repair&search=PLUMB", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["total"], 1);
    assert_eq!(r.body["page"], 1);
    assert_eq!(r.body["hasMore"], false);
    assert_eq!(r.body["data"][0]["id"], id.as_str());

    let r = app.send("GET", &format!("/api/anketas/{id}"), None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["title"], "Plumber Ivan");
    assert_eq!(r.body["contacts"]["telegram"], "https://t.me/master_ivan");
}

#[tokio::test]
async fn test_malformed_query_values_are_ignored() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let token = app.login_as("owner@example.com", "Owner").await;
    app.create_anketa(&token, "Plumber", &cat.id.to_string(), &city.id.to_string()).await;

    let r = app
        .send("GET", "/api/anketas?minRating=abc&cityId=not-a-uuid&page=-3&limit=zero&sortBy=weird", None, None)
        .await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["total"], 1);
    assert_eq!(r.body["page"], 1);
}

#[tokio::test]
async fn test_repeated_query_keys_keep_the_other_filters() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let kazan = app.store.seed_city("Kazan");
    let anapa = app.store.seed_city("Anapa");
    let token = app.login_as("owner@example.com", "Owner").await;
    app.create_anketa(&token, "Plumber", &cat.id.to_string(), &kazan.id.to_string()).await;

    let r = app.send("GET", &format!("/api/anketas?cityId={}&page=1&page=2", anapa.id), None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["total"], 0);
    assert_eq!(r.body["page"], 1);

    let r = app.send("GET", &format!("/api/anketas?cityId={}&page=1&page=2", kazan.id), None, None).await;
    assert_eq!(r.body["total"], 1);
}

#[tokio::test]
async fn test_only_with_reviews_and_empty_results() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let token = app.login_as("owner@example.com", "Owner").await;
    app.create_anketa(&token, "Plumber", &cat.id.to_string(), &city.id.to_string()).await;

    let r = app.send("GET", "/api/anketas?onlyWithReviews=true", None, None).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["total"], 0);
    assert_eq!(r.body["data"], json!([]));
    assert_eq!(r.body["hasMore"], false);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let app = build_app();
    let r = app.send("GET", "/api/anketas/00000000-0000-0000-0000-000000000000", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    let r = app.send("GET", "/api/anketas/not-a-uuid", None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fourth_active_listing_is_rejected() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let token = app.login_as("busy@example.com", "Busy").await;
    for i in 0..3 {
        let r = app.create_anketa(&token, &format!("Listing {i}"), &cat.id.to_string(), &city.id.to_string()).await;
        assert_eq!(r.status, StatusCode::OK);
    }
    let r = app.create_anketa(&token, "One too many", &cat.id.to_string(), &city.id.to_string()).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deactivate_hides_listing_and_only_owner_may_toggle() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let owner = app.login_as("owner@example.com", "Owner").await;
    let other = app.login_as("other@example.com", "Other").await;

    let r = app.create_anketa(&owner, "Plumber", &cat.id.to_string(), &city.id.to_string()).await;
    let id = r.body["anketa"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/anketas/{id}/active");

    let r = app.send("POST", &uri, Some(&other), Some(json!({ "active": false }))).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);

    let r = app.send("POST", &uri, Some(&owner), Some(json!({ "active": false }))).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["anketa"]["isActive"], false);

    let r = app.send("GET", &format!("/api/anketas/{id}"), None, None).await;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    let r = app.send("GET", "/api/anketas", None, None).await;
    assert_eq!(r.body["total"], 0);
}

#[tokio::test]
async fn test_reviews_update_rating() {
    let app = build_app();
    let cat = app.store.seed_category("Repair", "repair");
    let city = app.store.seed_city("Kazan");
    let owner = app.login_as("owner@example.com", "Owner").await;
    let a = app.login_as("a@example.com", "A").await;
    let b = app.login_as("b@example.com", "B").await;

    let r = app.create_anketa(&owner, "Plumber", &cat.id.to_string(), &city.id.to_string()).await;
    let id = r.body["anketa"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/anketas/{id}/reviews");

    let r = app.send("POST", &uri, Some(&owner), Some(json!({ "rating": 5, "body": "me" }))).await;
    assert_eq!(r.status, StatusCode::FORBIDDEN);

    let r = app.send("POST", &uri, Some(&a), Some(json!({ "rating": 6 }))).await;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);

    let r = app.send("POST", &uri, Some(&a), Some(json!({ "rating": 5, "body": "great" }))).await;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["review"]["rating"], 5);
    app.send("POST", &uri, Some(&b), Some(json!({ "rating": 4 }))).await;

    let r = app.send("GET", &format!("/api/anketas/{id}"), None, None).await;
    assert_eq!(r.body["rating"], 4.5);
    assert_eq!(r.body["reviewCount"], 2);

    let r = app.send("GET", "/api/anketas?onlyWithReviews=true&minRating=4.5&sortBy=rating", None, None).await;
    assert_eq!(r.body["total"], 1);
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let app = build_app();
    app.store.set_unavailable(true);
    let r = app.send("GET", "/api/anketas", None, None).await;
    assert_eq!(r.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(r.body["success"], false);
    assert_eq!(r.body["error"], "Что-то пошло не так, попробуйте позже");
}
