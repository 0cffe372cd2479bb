//! End-to-end API behavior over in-memory repositories.

mod support;

use axum::http::StatusCode;
use serde_json::{Value, json};

use support::{
    ADMIN_TOKEN, default_router, delete, get, get_as_admin, get_versioned, post_json, put_json,
    seed_author, seed_book,
};

#[tokio::test]
async fn list_pagination_windows_the_collection() {
    let router = default_router();
    for index in 1..=5 {
        seed_book(&router, &format!("Book {index}"), None).await;
    }

    let response = get(&router, "/books?page=2&limit=3").await;
    assert_eq!(response.status, StatusCode::OK);
    let items = response.json();
    let items = items.as_array().expect("array body");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], json!(4));
    assert_eq!(items[1]["id"], json!(5));
}

#[tokio::test]
async fn pagination_defaults_apply_to_missing_and_malformed_values() {
    let router = default_router();
    for index in 1..=5 {
        seed_book(&router, &format!("Book {index}"), None).await;
    }

    let bare = get(&router, "/books").await;
    assert_eq!(bare.json().as_array().expect("array").len(), 3);

    let malformed = get(&router, "/books?page=abc&limit=0").await;
    assert_eq!(malformed.status, StatusCode::OK);
    assert_eq!(malformed.json().as_array().expect("array").len(), 3);

    let past_the_end = get(&router, "/books?page=9&limit=3").await;
    assert_eq!(past_the_end.json().as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn created_book_round_trips_through_detail() {
    let router = default_router();
    let author_id = seed_author(&router, "Frank", "Herbert").await;

    let response = post_json(
        &router,
        "/books",
        json!({
            "title": "Dune",
            "coverText": "A desert planet",
            "idAuthor": author_id,
        }),
        Some(ADMIN_TOKEN),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    let id = body["id"].as_i64().expect("id");
    assert_eq!(
        response.location.as_deref(),
        Some(format!("http://api.test/books/{id}").as_str())
    );
    assert_eq!(body["author"]["id"], json!(author_id));

    let detail = get(&router, &format!("/books/{id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    let detail = detail.json();
    assert_eq!(detail["title"], json!("Dune"));
    assert_eq!(detail["coverText"], json!("A desert planet"));
    assert_eq!(detail["author"]["firstName"], json!("Frank"));
}

#[tokio::test]
async fn unresolvable_author_reference_is_left_null() {
    let router = default_router();

    let response = post_json(
        &router,
        "/books",
        json!({
            "title": "Orphan",
            "coverText": "No author",
            "idAuthor": 9999,
        }),
        Some(ADMIN_TOKEN),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["author"], Value::Null);
}

#[tokio::test]
async fn mutations_require_the_admin_role() {
    let router = default_router();
    let id = seed_book(&router, "Keeper", None).await;

    let anonymous = delete(&router, &format!("/books/{id}"), None).await;
    assert_eq!(anonymous.status, StatusCode::FORBIDDEN);

    let wrong_token = delete(&router, &format!("/books/{id}"), Some("not-the-token")).await;
    assert_eq!(wrong_token.status, StatusCode::FORBIDDEN);

    // The book survived both attempts.
    let detail = get(&router, &format!("/books/{id}")).await;
    assert_eq!(detail.status, StatusCode::OK);

    let create = post_json(
        &router,
        "/books",
        json!({ "title": "Nope", "coverText": "Nope" }),
        None,
    )
    .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_payload_reports_every_violation_and_persists_nothing() {
    let router = default_router();

    let response = post_json(
        &router,
        "/books",
        json!({ "title": "", "coverText": "" }),
        Some(ADMIN_TOKEN),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"]["code"], json!("validation_error"));
    let violations = body["error"]["violations"]
        .as_array()
        .expect("violation list");
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0]["field"], json!("title"));

    let list = get(&router, "/books").await;
    assert_eq!(list.json().as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn comment_is_version_gated() {
    let router = default_router();
    let id = seed_book(&router, "Annotated", None).await;
    // The comment is settable at create; patch it in via a second create
    // with an explicit comment field instead.
    let commented = post_json(
        &router,
        "/books",
        json!({
            "title": "Dune",
            "coverText": "cover",
            "comment": "first of six",
        }),
        Some(ADMIN_TOKEN),
    )
    .await;
    let commented_id = commented.json()["id"].as_i64().expect("id");

    let v1 = get(&router, &format!("/books/{commented_id}")).await;
    assert!(v1.json().get("comment").is_none(), "hidden at default 1.0");

    let v2 = get_versioned(&router, &format!("/books/{commented_id}"), "2.0").await;
    assert_eq!(v2.json()["comment"], json!("first of six"));

    let uncommented_v2 = get_versioned(&router, &format!("/books/{id}"), "2.0").await;
    assert_eq!(uncommented_v2.json()["comment"], Value::Null);
}

#[tokio::test]
async fn unparsable_version_header_is_rejected() {
    let router = default_router();
    let response = get_versioned(&router, "/books", "latest").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"]["code"], json!("invalid_version"));
}

#[tokio::test]
async fn deleting_an_author_cascades_to_its_books() {
    let router = default_router();
    let author_id = seed_author(&router, "Frank", "Herbert").await;
    let first = seed_book(&router, "Dune", Some(author_id)).await;
    let second = seed_book(&router, "Dune Messiah", Some(author_id)).await;
    let unrelated = seed_book(&router, "Standalone", None).await;

    let response = delete(&router, &format!("/authors/{author_id}"), Some(ADMIN_TOKEN)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    for id in [first, second] {
        let detail = get(&router, &format!("/books/{id}")).await;
        assert_eq!(detail.status, StatusCode::NOT_FOUND, "book {id} cascaded");
    }
    let survivor = get(&router, &format!("/books/{unrelated}")).await;
    assert_eq!(survivor.status, StatusCode::OK);
}

#[tokio::test]
async fn update_overwrites_the_mutable_set_only() {
    let router = default_router();
    let author_id = seed_author(&router, "Frank", "Herbert").await;
    let commented = post_json(
        &router,
        "/books",
        json!({
            "title": "Dune",
            "coverText": "cover",
            "comment": "keep me",
        }),
        Some(ADMIN_TOKEN),
    )
    .await;
    let id = commented.json()["id"].as_i64().expect("id");

    let response = put_json(
        &router,
        &format!("/books/{id}"),
        json!({
            "title": "Dune (revised)",
            "coverText": "new cover",
            "idAuthor": author_id,
        }),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());

    let detail = get_versioned(&router, &format!("/books/{id}"), "2.0").await;
    let detail = detail.json();
    assert_eq!(detail["title"], json!("Dune (revised)"));
    assert_eq!(detail["author"]["id"], json!(author_id));
    assert_eq!(detail["comment"], json!("keep me"), "comment is not mutable");
}

#[tokio::test]
async fn missing_entities_return_not_found() {
    let router = default_router();

    assert_eq!(get(&router, "/books/999").await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        get(&router, "/authors/999").await.status,
        StatusCode::NOT_FOUND
    );

    let update = put_json(
        &router,
        "/books/999",
        json!({ "title": "T", "coverText": "C" }),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let removal = delete(&router, "/authors/999", Some(ADMIN_TOKEN)).await;
    assert_eq!(removal.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hypermedia_links_are_role_gated() {
    let router = default_router();
    let id = seed_book(&router, "Linked", None).await;

    let anonymous = get(&router, &format!("/books/{id}")).await;
    let body = anonymous.json();
    let links = &body["_links"];
    assert_eq!(links["self"], json!(format!("http://api.test/books/{id}")));
    assert!(links.get("update").is_none());
    assert!(links.get("delete").is_none());

    let admin = get_as_admin(&router, &format!("/books/{id}")).await;
    let links = admin.json()["_links"].clone();
    assert_eq!(links["update"], json!(format!("http://api.test/books/{id}")));
    assert_eq!(links["delete"], json!(format!("http://api.test/books/{id}")));
}

#[tokio::test]
async fn author_listing_and_detail_share_the_shaped_fields() {
    let router = default_router();
    let id = seed_author(&router, "Ursula", "Le Guin").await;

    let list = get(&router, "/authors").await;
    let items = list.json();
    let items = items.as_array().expect("array").clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["firstName"], json!("Ursula"));

    let detail = get(&router, &format!("/authors/{id}")).await;
    assert_eq!(detail.json()["lastName"], json!("Le Guin"));
}

#[tokio::test]
async fn health_endpoint_reports_no_content() {
    let router = default_router();
    let response = get(&router, "/health").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}
