//! Requests that are answered before any database access.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{bearer_for, empty_request, json_request, lazy_app, multipart_request, pdf_bytes, send, Part};

#[tokio::test]
async fn health_is_public() {
    let (app, _) = lazy_app();
    let (status, body) = send(&app, empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() {
    let (app, _) = lazy_app();
    for uri in [
        "/api/profile",
        "/api/candidate/profile",
        "/api/employer/profile",
        "/api/notifications",
        "/api/users",
        "/api/saved-jobs",
        "/api/applications/my-applications",
        "/api/jobs/my-jobs",
    ] {
        let (status, body) = send(&app, empty_request("GET", uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["errorCode"], "MISSING_AUTHORIZATION");
    }
}

#[tokio::test]
async fn roles_gate_their_sections() {
    let (app, state) = lazy_app();
    let candidate = bearer_for(&state, "Candidate");
    let employer = bearer_for(&state, "Employer");

    let cases = [
        ("/api/users", candidate.as_str()),
        ("/api/employer/profile", candidate.as_str()),
        ("/api/candidate/profile", employer.as_str()),
        ("/api/saved-jobs/count", employer.as_str()),
        ("/api/applications/employer/statistics", candidate.as_str()),
    ];
    for (uri, auth) in cases {
        let (status, body) = send(&app, empty_request("GET", uri, Some(auth))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["errorCode"], "FORBIDDEN");
    }

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/notifications/broadcast",
            Some(&employer),
            &json!({"title": "Hi", "message": "All"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_registration_requires_an_admin() {
    let (app, state) = lazy_app();
    let body = json!({
        "fullName": "Second Admin",
        "email": "admin2@example.com",
        "password": "Password1",
        "confirmPassword": "Password1"
    });
    let (status, _) = send(&app, json_request("POST", "/api/auth/register/admin", None, &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let candidate = bearer_for(&state, "Candidate");
    let (status, _) = send(
        &app,
        json_request("POST", "/api/auth/register/admin", Some(&candidate), &body),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_json_uses_the_envelope() {
    let (app, _) = lazy_app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "BAD_REQUEST");
    assert_eq!(body["isSuccess"], false);
}

#[tokio::test]
async fn validation_failures_list_fields() {
    let (app, _) = lazy_app();
    let body = json!({
        "fullName": "",
        "email": "not-an-email",
        "password": "short",
        "confirmPassword": "different"
    });
    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/register/candidate", None, &body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    for expected in ["confirm_password", "email", "full_name", "password"] {
        assert!(fields.contains(&expected), "missing {} in {:?}", expected, fields);
    }
}

#[tokio::test]
async fn invalid_path_id_is_a_bad_request() {
    let (app, _) = lazy_app();
    let (status, body) = send(&app, empty_request("GET", "/api/jobs/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "BAD_REQUEST");
}

fn employer_fields() -> Vec<Part<'static>> {
    vec![
        Part::Text("fullName", "Erin Employer"),
        Part::Text("email", "erin@example.com"),
        Part::Text("password", "Password1"),
        Part::Text("confirmPassword", "Password1"),
        Part::Text("companyName", "Acme"),
    ]
}

#[tokio::test]
async fn employer_registration_requires_a_license() {
    let (app, _) = lazy_app();
    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/auth/register/employer", None, &employer_fields()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "NO_FILE");
}

#[tokio::test]
async fn employer_license_over_five_megabytes_is_rejected() {
    let (app, _) = lazy_app();
    let mut big = pdf_bytes();
    big.resize(5 * 1024 * 1024 + 1, b'0');
    let mut parts = employer_fields();
    parts.push(Part::File("businessLicense", "license.pdf", &big));
    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/auth/register/employer", None, &parts),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "FILE_TOO_LARGE");
}

#[tokio::test]
async fn employer_license_must_be_a_real_pdf() {
    let (app, _) = lazy_app();
    let png = [0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    let mut renamed = employer_fields();
    renamed.push(Part::File("businessLicense", "license.pdf", &png));
    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/auth/register/employer", None, &renamed),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_FILE_TYPE");

    let pdf = pdf_bytes();
    let mut wrong_ext = employer_fields();
    wrong_ext.push(Part::File("businessLicense", "license.png", &pdf));
    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/auth/register/employer", None, &wrong_ext),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_FILE_TYPE");
}

#[tokio::test]
async fn avatar_upload_checks_image_signature() {
    let (app, state) = lazy_app();
    let auth = bearer_for(&state, "Candidate");
    let parts = [Part::File("file", "me.jpg", b"GIF89a")];
    let (status, body) = send(
        &app,
        multipart_request("PUT", "/api/profile/avatar", Some(&auth), &parts),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_FILE_TYPE");
}

#[tokio::test]
async fn verified_employer_routes_check_the_role_first() {
    let (app, state) = lazy_app();
    let candidate = bearer_for(&state, "Candidate");
    let job = json!({"jobTitle": "Rust Engineer", "jobDescription": "Build things"});
    let status_uri = format!("/api/applications/employer/{}/status", uuid::Uuid::new_v4());

    let (status, _) = send(&app, json_request("POST", "/api/jobs", None, &job)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, json_request("POST", "/api/jobs", Some(&candidate), &job)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "FORBIDDEN");

    let (status, body) = send(
        &app,
        json_request("PATCH", &status_uri, Some(&candidate), &json!({"status": "Reviewing"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "FORBIDDEN");
}
