mod common;

use axum::{Router, http::StatusCode};
use serde_json::{Value, json};
use store::{Collection, DocumentStore, Filter};

use common::{app, get, insert, lockstep_app, post, put};

async fn lawyer(app: &Router, key: &str) -> Value {
    get(app, &format!("/lawyer/{key}")).await.1
}

#[tokio::test]
async fn test_upsert_creates_then_updates() {
    let app = app();

    let (status, created) = put(
        &app,
        "/lawyer/jane@law.com",
        json!({ "name": "Jane", "speciality": "Family" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["upsertedCount"], 1);
    assert!(created["upsertedId"].is_string());

    let (_, updated) = put(
        &app,
        "/lawyer/jane@law.com",
        json!({ "name": "Jane Doe", "totalRating": 99, "ratingCount": 99 }),
    )
    .await;
    assert_eq!(updated["matchedCount"], 1);
    assert_eq!(updated["upsertedCount"], 0);
    assert!(updated["upsertedId"].is_null());

    let jane = lawyer(&app, "jane@law.com").await;
    assert_eq!(jane["name"], "Jane Doe");
    assert_eq!(jane["speciality"], "Family");
    assert_eq!(jane["totalRating"], 0);
    assert_eq!(jane["ratingCount"], 0);

    let by_id = lawyer(&app, created["upsertedId"].as_str().unwrap()).await;
    assert_eq!(by_id, jane);

    let (_, lawyers) = get(&app, "/lawyers").await;
    assert_eq!(lawyers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_lawyer() {
    let app = app();
    let profile = json!({ "lawyer_email": "sam@law.com", "name": "Sam" });
    let id = insert(&app, "/lawyers", profile).await;

    let sam = lawyer(&app, &id).await;
    assert_eq!(sam["ratingCount"], 0);

    let (status, body) = post(&app, "/lawyers", json!({ "lawyer_email": "sam@law.com" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = post(&app, "/lawyers", json!({ "name": "No Email" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(lawyer(&app, "nobody@law.com").await.is_null());
}

#[tokio::test]
async fn test_second_rating_is_rejected() {
    let app = app();
    let lawyer_id = insert(&app, "/lawyers", json!({ "lawyer_email": "sam@law.com" })).await;
    let rating = json!({ "lawyerId": lawyer_id, "userId": "u1", "rating": 4 });

    let (status, first) = post(&app, "/ratings", rating.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["insertedId"].is_string());

    let again = json!({ "lawyerId": lawyer_id, "userId": "u1", "rating": 1 });
    let (status, second) = post(&app, "/ratings", again).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second, json!({ "error": "You have already rated this lawyer" }));

    let sam = lawyer(&app, &lawyer_id).await;
    assert_eq!(sam["totalRating"], 4);
    assert_eq!(sam["ratingCount"], 1);

    let (_, stored) = get(&app, &format!("/ratings/{lawyer_id}/u1")).await;
    assert_eq!(stored["rating"], 4);
    assert!(stored["timestamp"].is_string());

    let (_, none) = get(&app, &format!("/ratings/{lawyer_id}/u2")).await;
    assert!(none.is_null());
}

#[tokio::test]
async fn test_concurrent_duplicate_ratings() {
    let (app, store) = lockstep_app(Collection::Ratings);
    let lawyer_id = insert(&app, "/lawyers", json!({ "lawyer_email": "sam@law.com" })).await;
    let rating = json!({ "lawyerId": lawyer_id, "userId": "u1", "rating": 4 });

    let (first, second) = tokio::join!(
        post(&app, "/ratings", rating.clone()),
        post(&app, "/ratings", rating),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let rejected = if first.0 == StatusCode::CONFLICT { first.1 } else { second.1 };
    assert_eq!(rejected, json!({ "error": "You have already rated this lawyer" }));

    let ratings = store.find(Collection::Ratings, &Filter::All).await.unwrap();
    assert_eq!(ratings.len(), 1);

    let sam = lawyer(&app, &lawyer_id).await;
    assert_eq!(sam["totalRating"], 4);
    assert_eq!(sam["ratingCount"], 1);
}

#[tokio::test]
async fn test_ratings_aggregate() {
    let app = app();
    let lawyer_id = insert(&app, "/lawyers", json!({ "lawyer_email": "sam@law.com" })).await;

    for (user, score) in [("u1", json!(5)), ("u2", json!(3.5)), ("u3", json!(1))] {
        insert(
            &app,
            "/ratings",
            json!({ "lawyerId": lawyer_id, "userId": user, "rating": score }),
        )
        .await;
    }

    let sam = lawyer(&app, &lawyer_id).await;
    assert_eq!(sam["totalRating"], 9.5);
    assert_eq!(sam["ratingCount"], 3);

    let (_, ratings) = get(&app, &format!("/ratings/{lawyer_id}")).await;
    assert_eq!(ratings.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_invalid_ratings() {
    let app = app();
    let lawyer_id = insert(&app, "/lawyers", json!({ "lawyer_email": "sam@law.com" })).await;

    for rating in [json!(0), json!(6), json!("5"), Value::Null] {
        let (status, body) = post(
            &app,
            "/ratings",
            json!({ "lawyerId": lawyer_id, "userId": "u1", "rating": rating }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    let named = json!({ "lawyerId": "sam", "userId": "u1", "rating": 3 });
    let (status, _) = post(&app, "/ratings", named).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/ratings",
        json!({ "lawyerId": "65f1c0a2b3d4e5f601234567", "userId": "u1", "rating": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let sam = lawyer(&app, &lawyer_id).await;
    assert_eq!(sam["ratingCount"], 0);
}

#[tokio::test]
async fn test_blog_comments() {
    let app = app();
    let blog_id = insert(&app, "/blog", json!({ "title": "Tenant Rights" })).await;

    insert(&app, "/comments", json!({ "blogId": blog_id, "text": "Helpful" })).await;
    insert(&app, "/comments", json!({ "blogId": "other", "text": "Elsewhere" })).await;

    let (_, comments) = get(&app, &format!("/comments/{blog_id}")).await;
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["text"], "Helpful");

    let (status, _) = post(&app, "/comments", json!({ "text": "Orphan" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
