mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

use common::{body_string, build_pdf, location, multipart_body, TestApp, BOUNDARY, CSRF};
use towerdocs::models::{NewCategory, NewVariant, StructuralType};

async fn seed_variant(app: &TestApp, code: &str) -> i32 {
    let category = app
        .db()
        .categories()
        .create(NewCategory {
            name: "Monopole Tower".to_string(),
            description: None,
            thumbnail_url: None,
        })
        .await
        .unwrap();
    app.db()
        .variants()
        .create(NewVariant {
            tower_code: code.to_string(),
            height: 45.0,
            structural_type: StructuralType::Monopole,
            load_class: None,
            engineering_notes: None,
            category_id: category.id,
        })
        .await
        .unwrap()
        .id
}

fn upload_request(app: &TestApp, variant_id: i32, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/admin/variant/{}/upload", variant_id))
        .header(header::COOKIE, app.admin_cookie())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_stores_locally_and_activates_document() {
    let app = TestApp::new();
    let variant_id = seed_variant(&app, "MP-45-002").await;
    let pdf = build_pdf(3);

    let body = multipart_body(
        &[("csrf_token", CSRF), ("version", "2.1")],
        Some(("pdf_file", "drawing.pdf", &pdf)),
    );
    let response = app.send(upload_request(&app, variant_id, body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/documents");

    let active = app
        .db()
        .documents()
        .active_for_variant(variant_id)
        .await
        .unwrap()
        .expect("active document");
    assert_eq!(active.pdf_url, "/uploads/MP-45-002_2.1.pdf");
    assert_eq!(active.page_count, 3);
    assert_eq!(active.file_size, pdf.len() as u64);
    assert_eq!(active.version, "2.1");

    let stored = app.state.settings.uploads_dir.join("MP-45-002_2.1.pdf");
    assert_eq!(std::fs::read(&stored).unwrap(), pdf);

    let response = app.get("/uploads/MP-45-002_2.1.pdf", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
}

#[tokio::test]
async fn second_upload_replaces_active_document() {
    let app = TestApp::new();
    let variant_id = seed_variant(&app, "MP-60-003").await;

    for version in ["1.0", "1.1"] {
        let pdf = build_pdf(2);
        let body = multipart_body(
            &[("csrf_token", CSRF), ("version", version)],
            Some(("pdf_file", "sheet.PDF", &pdf)),
        );
        let response = app.send(upload_request(&app, variant_id, body)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let docs = app.db().documents().for_variant(variant_id).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs.iter().filter(|d| d.is_active).count(), 1);
    let active = app
        .db()
        .documents()
        .active_for_variant(variant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.version, "1.1");
}

#[tokio::test]
async fn non_pdf_upload_is_rejected() {
    let app = TestApp::new();
    let variant_id = seed_variant(&app, "MP-30-001").await;

    let body = multipart_body(
        &[("csrf_token", CSRF), ("version", "1.0")],
        Some(("pdf_file", "notes.txt", b"not a pdf")),
    );
    let response = app.send(upload_request(&app, variant_id, body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Please upload a PDF file."));
    assert_eq!(app.db().documents().count().await.unwrap(), 0);
}

#[tokio::test]
async fn upload_with_bad_csrf_is_rejected() {
    let app = TestApp::new();
    let variant_id = seed_variant(&app, "MP-30-001").await;
    let pdf = build_pdf(1);

    let body = multipart_body(
        &[("csrf_token", "forged")],
        Some(("pdf_file", "drawing.pdf", &pdf)),
    );
    let response = app.send(upload_request(&app, variant_id, body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/admin/variant/{}/upload", variant_id)
    );
    assert_eq!(app.db().documents().count().await.unwrap(), 0);
}

#[tokio::test]
async fn upload_path_traversal_is_not_served() {
    let app = TestApp::new();
    std::fs::write(app.dir.path().join("tower_docs.secret"), b"secret").unwrap();

    let response = app.get("/uploads/..%2Ftower_docs.secret", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get("/uploads/missing.pdf", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn upload_version(app: &TestApp, variant_id: i32, version: &str, pdf: &[u8]) -> axum::response::Response {
    let body = multipart_body(
        &[("csrf_token", CSRF), ("version", version)],
        Some(("pdf_file", "drawing.pdf", pdf)),
    );
    app.send(upload_request(app, variant_id, body)).await
}

/// A PDF header padded out to exactly `len` bytes.
fn padded_pdf(len: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.5\n".to_vec();
    data.resize(len, b' ');
    data
}

#[tokio::test]
async fn oversized_request_body_is_refused_and_keeps_active_document() {
    let app = TestApp::new();
    let variant_id = seed_variant(&app, "GM-80-004").await;

    let response = upload_version(&app, variant_id, "1.0", &build_pdf(2)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let too_big = padded_pdf(2 * 1024 * 1024);
    let response = upload_version(&app, variant_id, "2.0", &too_big).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let docs = app.db().documents().for_variant(variant_id).await.unwrap();
    assert_eq!(docs.len(), 1);
    let active = app
        .db()
        .documents()
        .active_for_variant(variant_id)
        .await
        .unwrap()
        .expect("previous document still active");
    assert_eq!(active.version, "1.0");
    assert!(!app
        .state
        .settings
        .uploads_dir
        .join("GM-80-004_2.0.pdf")
        .exists());
}

#[tokio::test]
async fn file_just_over_limit_shows_size_error() {
    let app = TestApp::new();
    let variant_id = seed_variant(&app, "GM-80-005").await;

    let response = upload_version(&app, variant_id, "1.0", &build_pdf(1)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let limit = app.state.settings.max_upload_bytes as usize;
    let response = upload_version(&app, variant_id, "1.1", &padded_pdf(limit + 1024)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response)
        .await
        .contains("File size must be at most 1 MB."));

    let active = app
        .db()
        .documents()
        .active_for_variant(variant_id)
        .await
        .unwrap()
        .expect("previous document still active");
    assert_eq!(active.version, "1.0");
    assert_eq!(app.db().documents().count().await.unwrap(), 1);
}
