use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use std::sync::Arc;

use clinic_scheduling_api::router::create_router;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_app() -> (Router, TestConfig) {
    let config = TestConfig::default();
    (create_router(config.to_arc()), config)
}

fn bearer(user: &TestUser, config: &TestConfig) -> String {
    format!(
        "Bearer {}",
        JwtTestUtils::create_test_token(user, &config.jwt_secret, None)
    )
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn liveness_route_needs_no_token() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let (app, _) = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/clinics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/appointments")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", JwtTestUtils::create_malformed_token()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn clinic_crud_over_http() {
    let (app, config) = test_app();
    let admin = TestUser::admin("admin@example.com");
    let auth = bearer(&admin, &config);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clinics")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"name": "Riverside", "timezone": "Asia/Kolkata"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["success"], json!(true));
    let clinic_id = created["clinic"]["id"].as_str().unwrap().to_string();

    // Duplicate name is a conflict.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clinics")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"name": "riverside", "timezone": "UTC"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/clinics/{}", clinic_id))
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/clinics")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed["clinics"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn directory_mutations_require_admin_role() {
    let (app, config) = test_app();
    let doctor = TestUser::doctor("meera@example.com");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clinics")
                .header(header::AUTHORIZATION, bearer(&doctor, &config))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"name": "Riverside", "timezone": "UTC"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_creation_defaults_timezone_from_config() {
    let config = TestConfig::default();
    let app = create_router(Arc::new(AppConfig {
        port: 0,
        jwt_secret: config.jwt_secret.clone(),
        default_timezone: "Asia/Kolkata".to_string(),
    }));
    let admin = TestUser::admin("admin@example.com");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/doctors")
                .header(header::AUTHORIZATION, bearer(&admin, &config))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "email": "meera@example.com",
                        "name": "Dr. Meera Nair",
                        "specialization": "Dermatology"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["doctor"]["timezone"], json!("Asia/Kolkata"));
}

#[tokio::test]
async fn booking_and_lifecycle_over_http() {
    let (app, config) = test_app();
    let admin = TestUser::admin("admin@example.com");
    let auth = bearer(&admin, &config);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/doctors")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "email": "meera@example.com",
                        "name": "Dr. Meera Nair",
                        "specialization": "Dermatology"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "doctor_email": "meera@example.com",
                        "patient_name": "Asha Rao",
                        "patient_mobile_number": "9876543210",
                        "date": "2024-01-10",
                        "start_time": "09:00:00",
                        "end_time": "09:30:00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let booked = body_json(response).await;
    assert_eq!(booked["appointment"]["status"], json!("booked"));
    let id = booked["appointment"]["id"].as_str().unwrap().to_string();

    // Overlapping booking is rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "doctor_email": "meera@example.com",
                        "patient_name": "Vikram Shah",
                        "patient_mobile_number": "9123456780",
                        "date": "2024-01-10",
                        "start_time": "09:15:00",
                        "end_time": "09:45:00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let conflict = body_json(response).await;
    assert_eq!(conflict["code"], json!("conflict"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/appointments/{}/cancel", id))
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"reason": "patient request"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Completing a cancelled appointment is an invalid transition.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/appointments/{}/complete", id))
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let rejected = body_json(response).await;
    assert_eq!(rejected["code"], json!("invalid_transition"));
}

#[tokio::test]
async fn doctors_cannot_modify_another_doctors_appointment() {
    let (app, config) = test_app();
    let admin = TestUser::admin("admin@example.com");
    let auth = bearer(&admin, &config);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/doctors")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "email": "meera@example.com",
                        "name": "Dr. Meera Nair",
                        "specialization": "Dermatology"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "doctor_email": "meera@example.com",
                        "patient_name": "Asha Rao",
                        "patient_mobile_number": "9876543210",
                        "date": "2024-01-10",
                        "start_time": "09:00:00",
                        "end_time": "09:30:00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let booked = body_json(response).await;
    let id = booked["appointment"]["id"].as_str().unwrap().to_string();

    // A different, authenticated doctor is forbidden, not unauthenticated.
    let intruder = TestUser::doctor("ravi@example.com");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/appointments/{}/cancel", id))
                .header(header::AUTHORIZATION, bearer(&intruder, &config))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"reason": "mine now"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let rejected = body_json(response).await;
    assert_eq!(rejected["code"], json!("forbidden"));

    // The appointment is untouched and its owner can still act on it.
    let owner = TestUser::doctor("meera@example.com");
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/appointments/{}/complete", id))
                .header(header::AUTHORIZATION, bearer(&owner, &config))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let completed = body_json(response).await;
    assert_eq!(completed["appointment"]["status"], json!("completed"));
}

#[tokio::test]
async fn dashboard_is_scoped_to_the_token_email() {
    let (app, config) = test_app();
    let admin = TestUser::admin("admin@example.com");
    let auth = bearer(&admin, &config);

    for email in ["meera@example.com", "ravi@example.com"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/doctors")
                    .header(header::AUTHORIZATION, &auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"email": email, "name": "Doc", "specialization": "GP"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    for (email, start) in [("meera@example.com", "09:00:00"), ("ravi@example.com", "10:00:00")] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/appointments")
                    .header(header::AUTHORIZATION, &auth)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "doctor_email": email,
                            "patient_name": "Asha Rao",
                            "patient_mobile_number": "9876543210",
                            "date": "2024-01-10",
                            "start_time": start,
                            "end_time": "10:30:00"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let meera = TestUser::doctor("meera@example.com");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard/appointments")
                .header(header::AUTHORIZATION, bearer(&meera, &config))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let appointments = listed["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["doctor_email"], json!("meera@example.com"));
}
