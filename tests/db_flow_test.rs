//! End-to-end flows against Postgres. Run with `cargo test -- --ignored` and `DATABASE_URL` set.

mod common;

use axum::{http::StatusCode, Router};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use common::{
    bearer_for, db_app, empty_request, json_request, multipart_request, pdf_bytes, send, unique_email,
    Part,
};
use job_board_backend::AppState;

const PASSWORD: &str = "Password1";

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({"username": email, "password": PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    format!("Bearer {}", body["data"]["token"].as_str().unwrap())
}

async fn register_candidate(app: &Router) -> (String, String) {
    let email = unique_email("candidate");
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register/candidate",
            None,
            &json!({
                "fullName": "Casey Candidate",
                "email": email,
                "password": PASSWORD,
                "confirmPassword": PASSWORD
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let token = login(app, &email).await;
    (email, token)
}

async fn register_employer(app: &Router) -> (Uuid, String) {
    let email = unique_email("employer");
    let pdf = pdf_bytes();
    let parts = [
        Part::Text("fullName", "Erin Employer"),
        Part::Text("email", &email),
        Part::Text("password", PASSWORD),
        Part::Text("confirmPassword", PASSWORD),
        Part::Text("companyName", "Acme Robotics"),
        Part::File("businessLicense", "license.pdf", &pdf),
    ];
    let (status, body) = send(
        app,
        multipart_request("POST", "/api/auth/register/employer", None, &parts),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["verificationStatus"], "Pending");
    let id = Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap();
    (id, login(app, &email).await)
}

async fn mark_verified(state: &AppState, employer_id: Uuid) {
    sqlx::query("UPDATE employers SET verification_status = 'Verified', verified_at = NOW() WHERE user_id = $1")
        .bind(employer_id)
        .execute(&state.pool)
        .await
        .unwrap();
}

async fn published_job(app: &Router, employer: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/jobs",
            Some(employer),
            &json!({
                "jobTitle": "Rust Engineer",
                "jobDescription": "Build reliable services",
                "salaryMin": 1000,
                "salaryMax": 2000,
                "location": "Remote",
                "tags": ["rust", "backend"]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "Draft");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        json_request(
            "PATCH",
            &format!("/api/jobs/{}/status", id),
            Some(employer),
            &json!({"status": "Active"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(!body["data"]["publishedAt"].is_null());
    id
}

async fn application_count(app: &Router, job_id: &str) -> i64 {
    let (_, body) = send(app, empty_request("GET", &format!("/api/jobs/{}", job_id), None)).await;
    body["data"]["applicationCount"].as_i64().unwrap()
}

fn unread_total(body: &JsonValue) -> i64 {
    body["data"]["unreadCount"].as_i64().unwrap_or_default()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_email_is_a_conflict() {
    let (app, _) = db_app().await;
    let (email, _) = register_candidate(&app).await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register/candidate",
            None,
            &json!({
                "fullName": "Copy Cat",
                "email": email,
                "password": PASSWORD,
                "confirmPassword": PASSWORD
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "EMAIL_EXISTS");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn candidate_gets_a_welcome_notification() {
    let (app, _) = db_app().await;
    let (_, candidate) = register_candidate(&app).await;
    let (status, body) = send(
        &app,
        empty_request("GET", "/api/notifications/unread-count", Some(&candidate)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread_total(&body), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pending_employer_cannot_post_jobs() {
    let (app, _) = db_app().await;
    let (_, employer) = register_employer(&app).await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/jobs",
            Some(&employer),
            &json!({"jobTitle": "Rust Engineer", "jobDescription": "Build things"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "NOT_VERIFIED");
    assert_eq!(body["data"]["verificationStatus"], "Pending");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn apply_once_then_withdraw_keeps_the_counter_exact() {
    let (app, state) = db_app().await;
    let (employer_id, employer) = register_employer(&app).await;
    mark_verified(&state, employer_id).await;
    let job_id = published_job(&app, &employer).await;
    let (_, candidate) = register_candidate(&app).await;

    let pdf = pdf_bytes();
    let parts = [
        Part::Text("jobPostingId", &job_id),
        Part::Text("coverLetter", "I would love to join."),
        Part::File("cvFile", "cv.pdf", &pdf),
    ];
    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/applications", Some(&candidate), &parts),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "Submitted");
    let application_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(application_count(&app, &job_id).await, 1);

    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/applications", Some(&candidate), &parts),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "ALREADY_APPLIED");
    assert_eq!(application_count(&app, &job_id).await, 1);

    let (status, body) = send(
        &app,
        empty_request("GET", "/api/notifications/unread-count", Some(&employer)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unread_total(&body) >= 2, "job published plus new application");

    let (status, _) = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/api/applications/{}", application_id),
            Some(&candidate),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(application_count(&app, &job_id).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn application_status_moves_forward_only() {
    let (app, state) = db_app().await;
    let (employer_id, employer) = register_employer(&app).await;
    mark_verified(&state, employer_id).await;
    let job_id = published_job(&app, &employer).await;
    let (_, candidate) = register_candidate(&app).await;

    let pdf = pdf_bytes();
    let parts = [
        Part::Text("jobPostingId", &job_id),
        Part::File("cvFile", "cv.pdf", &pdf),
    ];
    let (_, body) = send(
        &app,
        multipart_request("POST", "/api/applications", Some(&candidate), &parts),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/applications/employer/{}/status", id);

    let (status, body) = send(
        &app,
        json_request("PATCH", &uri, Some(&employer), &json!({"status": "Shortlisted"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(!body["data"]["reviewedAt"].is_null());

    let (status, body) = send(
        &app,
        json_request("PATCH", &uri, Some(&employer), &json!({"status": "Reviewing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_STATUS_TRANSITION");

    let (status, body) = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/api/applications/{}", id),
            Some(&candidate),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "CANNOT_WITHDRAW");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn only_one_experience_stays_current() {
    let (app, _) = db_app().await;
    let (_, candidate) = register_candidate(&app).await;

    for company in ["First Co", "Second Co"] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/candidate/experiences",
                Some(&candidate),
                &json!({
                    "companyName": company,
                    "position": "Engineer",
                    "startDate": "2020-01-01",
                    "endDate": "2021-01-01",
                    "isCurrent": true
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert!(body["data"]["endDate"].is_null());
    }

    let (_, body) = send(
        &app,
        empty_request("GET", "/api/candidate/experiences", Some(&candidate)),
    )
    .await;
    let current: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["isCurrent"] == true)
        .filter_map(|e| e["companyName"].as_str())
        .collect();
    assert_eq!(current, vec!["Second Co"]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn saving_twice_is_a_conflict() {
    let (app, state) = db_app().await;
    let (employer_id, employer) = register_employer(&app).await;
    mark_verified(&state, employer_id).await;
    let job_id = published_job(&app, &employer).await;
    let (_, candidate) = register_candidate(&app).await;

    let body = json!({"jobPostingId": job_id});
    let (status, _) = send(&app, json_request("POST", "/api/saved-jobs", Some(&candidate), &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, resp) = send(&app, json_request("POST", "/api/saved-jobs", Some(&candidate), &body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["errorCode"], "ALREADY_SAVED");

    let (_, resp) = send(&app, empty_request("GET", "/api/saved-jobs/count", Some(&candidate))).await;
    assert_eq!(resp["data"]["count"], 1);
}

fn unique_phone() -> String {
    format!("+84{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn employer_contact_defaults_to_the_registering_user() {
    let (app, _) = db_app().await;
    let email = unique_email("employer");
    let phone = unique_phone();
    let pdf = pdf_bytes();
    let parts = [
        Part::Text("fullName", "Erin Employer"),
        Part::Text("email", &email),
        Part::Text("phone", &phone),
        Part::Text("password", PASSWORD),
        Part::Text("confirmPassword", PASSWORD),
        Part::Text("companyName", "Acme Robotics"),
        Part::File("businessLicense", "license.pdf", &pdf),
    ];
    let (status, body) = send(
        &app,
        multipart_request("POST", "/api/auth/register/employer", None, &parts),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["contactPerson"], "Erin Employer");
    assert_eq!(body["data"]["contactEmail"], email.as_str());
    assert_eq!(body["data"]["contactPhone"], phone.as_str());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_phone_is_a_conflict() {
    let (app, _) = db_app().await;
    let phone = unique_phone();
    let mut statuses = Vec::new();
    for name in ["First Owner", "Second Owner"] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/register/candidate",
                None,
                &json!({
                    "fullName": name,
                    "email": unique_email("phone"),
                    "phone": phone,
                    "password": PASSWORD,
                    "confirmPassword": PASSWORD
                }),
            ),
        )
        .await;
        statuses.push((status, body["errorCode"].clone()));
    }
    assert_eq!(statuses[0].0, StatusCode::CREATED);
    assert_eq!(statuses[1].0, StatusCode::CONFLICT);
    assert_eq!(statuses[1].1, "PHONE_EXISTS");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn reset_token_works_only_once() {
    let (app, state) = db_app().await;
    let (email, _) = register_candidate(&app).await;
    let (_, token) = state
        .auth_repository
        .create_reset_token(&email)
        .await
        .unwrap();

    let reset = json!({
        "token": token,
        "newPassword": "NewPassword2",
        "confirmPassword": "NewPassword2"
    });
    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/reset-password", None, &reset),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({"username": email, "password": "NewPassword2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/reset-password", None, &reset),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "INVALID_TOKEN");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn admin_decides_verification_once() {
    let (app, state) = db_app().await;
    let (employer_id, employer) = register_employer(&app).await;
    let admin = bearer_for(&state, "Admin");
    let uri = format!("/api/users/employers/{}/verify", employer_id);

    let (status, body) = send(
        &app,
        json_request("PATCH", &uri, Some(&admin), &json!({"status": "Verified"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["verificationStatus"], "Verified");
    assert!(!body["data"]["verifiedAt"].is_null());

    let (status, body) = send(
        &app,
        json_request("PATCH", &uri, Some(&admin), &json!({"status": "Rejected"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "INVALID_VERIFICATION_TRANSITION");

    published_job(&app, &employer).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn new_license_sends_employer_back_to_pending() {
    let (app, state) = db_app().await;
    let (employer_id, employer) = register_employer(&app).await;
    mark_verified(&state, employer_id).await;

    let (_, body) = send(
        &app,
        empty_request("GET", "/api/employer/verification-status", Some(&employer)),
    )
    .await;
    assert_eq!(body["data"]["verificationStatus"], "Verified");

    let pdf = pdf_bytes();
    let parts = [Part::File("businessLicense", "renewed.pdf", &pdf)];
    let (status, body) = send(
        &app,
        multipart_request("PUT", "/api/employer/business-license", Some(&employer), &parts),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["verificationStatus"], "Pending");
    assert!(body["data"]["verifiedAt"].is_null());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/jobs",
            Some(&employer),
            &json!({"jobTitle": "Rust Engineer", "jobDescription": "Build things"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], "NOT_VERIFIED");
}
