mod common;

use axum::http::{header, StatusCode};

use common::{
    body_string, csrf_from_html, location, session_cookie, TestApp, ADMIN_PASSWORD, ADMIN_USER,
};

#[tokio::test]
async fn admin_pages_redirect_to_login_without_session() {
    let app = TestApp::new();

    for path in ["/admin/", "/admin/categories", "/admin/variant/1/upload"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        let target = location(&response);
        assert!(target.starts_with("/admin/login?next="), "{}", target);
    }

    let response = app.get("/admin/categories", None).await;
    assert_eq!(location(&response), "/admin/login?next=%2Fadmin%2Fcategories");
}

#[tokio::test]
async fn forged_session_cookie_is_not_admin() {
    let app = TestApp::new();
    let forged = "towerdocs_session=eyJhZG1pbiI6dHJ1ZX0.00";
    let response = app.get("/admin/", Some(forged)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_flow_grants_access() {
    let app = TestApp::new();

    let page = app.get("/admin/login?next=/admin/categories", None).await;
    assert_eq!(page.status(), StatusCode::OK);
    let cookie = session_cookie(&page).expect("login page sets a session");
    let html = body_string(page).await;
    let token = csrf_from_html(&html).expect("csrf token in form");
    assert!(html.contains(r#"name="next" value="/admin/categories""#));

    let body = format!(
        "username={}&password={}&csrf_token={}&next=%2Fadmin%2Fcategories",
        ADMIN_USER, ADMIN_PASSWORD, token
    );
    let response = app.post_form("/admin/login", Some(&cookie), &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/categories");
    let admin_cookie = session_cookie(&response).expect("session updated");

    let response = app.get("/admin/categories", Some(&admin_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Logged in successfully."));

    let response = app.get("/admin/logout", Some(&admin_cookie)).await;
    assert_eq!(location(&response), "/admin/login");
    let logged_out = session_cookie(&response).unwrap();
    let response = app.get("/admin/", Some(&logged_out)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new();
    let page = app.get("/admin/login", None).await;
    let cookie = session_cookie(&page).unwrap();
    let token = csrf_from_html(&body_string(page).await).unwrap();

    let body = format!("username={}&password=wrong&csrf_token={}", ADMIN_USER, token);
    let response = app.post_form("/admin/login", Some(&cookie), &body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();
    assert!(body_string(response).await.contains("Invalid username or password."));

    let response = app.get("/admin/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_without_csrf_token_is_rejected() {
    let app = TestApp::new();
    let body = format!("username={}&password={}", ADMIN_USER, ADMIN_PASSWORD);
    let response = app.post_form("/admin/login", None, &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_attempts_are_rate_limited() {
    let app = TestApp::new();
    let page = app.get("/admin/login", None).await;
    let mut cookie = session_cookie(&page).unwrap();
    let token = csrf_from_html(&body_string(page).await).unwrap();

    let body = format!("username={}&password=wrong&csrf_token={}", ADMIN_USER, token);
    for _ in 0..5 {
        let response = app.post_form("/admin/login", Some(&cookie), &body).await;
        assert_eq!(response.status(), StatusCode::OK);
        cookie = session_cookie(&response).unwrap();
    }

    let response = app.post_form("/admin/login", Some(&cookie), &body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::new();
    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key(header::X_FRAME_OPTIONS));
    assert!(headers.contains_key(header::REFERRER_POLICY));
    assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn unknown_route_renders_not_found_page() {
    let app = TestApp::new();
    let response = app.get("/no/such/page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Page not found"));
}
