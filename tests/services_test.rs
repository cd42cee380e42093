mod common;

use common::{Harness, payment_json, quota_summary_json, token_pair};
use idoctor_client::application::poller::PollOptions;
use idoctor_client::domain::payment::{
    CreatePaymentRequest, PaymentMethod, PaymentStatus,
};
use idoctor_client::domain::ports::SessionStore;
use idoctor_client::domain::processing::{
    CaseRef, ClickPoint, FileUpload, ImageType, SegmentationRequest,
};
use idoctor_client::domain::quota::UsageFilter;
use idoctor_client::domain::user::LoginRequest;
use idoctor_client::{ClientError, PollOutcome};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_login_stores_token_pair() {
    let h = Harness::anonymous().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username_or_email": "dr.li", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_pair("a1", "r1")))
        .expect(1)
        .mount(&h.server)
        .await;

    let auth = h.clients.auth();
    assert!(!auth.is_authenticated().await.unwrap());
    auth.login(&LoginRequest {
        username_or_email: "dr.li".to_string(),
        password: "secret".to_string(),
    })
    .await
    .unwrap();

    assert!(auth.is_authenticated().await.unwrap());
    assert_eq!(h.session.refresh_token().await.unwrap().as_deref(), Some("r1"));

    auth.logout().await.unwrap();
    assert!(!auth.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_current_user_sends_bearer_token() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "li@example.com",
            "username": "dr.li",
            "is_active": true,
            "is_superuser": false,
            "created_at": "2024-01-01T00:00:00",
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h.clients.auth().current_user().await.unwrap();

    assert_eq!(user.username, "dr.li");
}

#[tokio::test]
async fn test_quota_summary_and_missing_endpoints() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/quota/summary"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([quota_summary_json("segmentation", 40.0)])),
        )
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quota/limits"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quota/usage"))
        .and(query_param("quota_type_id", "qt-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quota/trend/qt-1"))
        .and(query_param("days", "30"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;

    let quota = h.clients.quota();
    let summary = quota.summary().await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].remaining, 60.0);

    assert!(quota.limits().await.unwrap().is_empty());
    let filter = UsageFilter {
        quota_type_id: Some("qt-1".to_string()),
        ..UsageFilter::default()
    };
    assert!(quota.usage_history(&filter).await.unwrap().is_empty());

    let trend = quota.usage_trend("qt-1", None).await;
    assert_eq!(trend.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn test_create_payment_and_history_filter() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("POST"))
        .and(path("/payments/"))
        .and(body_json(json!({
            "amount": "99.00",
            "currency": "CNY",
            "payment_method": "alipay",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(payment_json("pay-9", "pending")))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payments/"))
        .and(query_param("status_filter", "completed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([payment_json("pay-1", "completed")])),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let payments = h.clients.payments();
    let created = payments
        .create_payment(&CreatePaymentRequest {
            amount: dec!(99.00),
            currency: "CNY".to_string(),
            payment_method: PaymentMethod::Alipay,
            subscription_id: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, "pay-9");
    assert_eq!(created.amount, dec!(99.00));

    let history = payments
        .payment_history(Some(PaymentStatus::Completed))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_poll_payment_over_http() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/payments/pay-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payment_json("pay-1", "pending")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payments/pay-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payment_json("pay-1", "completed")))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut seen = Vec::new();
    let outcome = h
        .clients
        .payments()
        .poll_payment_status(
            "pay-1",
            PollOptions::default().with_interval(Duration::from_millis(10)),
            &CancellationToken::new(),
            |_, p| seen.push(p.status),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, PollOutcome::Terminal(_)));
    assert_eq!(
        seen,
        vec![PaymentStatus::Pending, PaymentStatus::Pending, PaymentStatus::Completed]
    );
}

#[tokio::test]
async fn test_active_subscription_picks_active_entry() {
    let h = Harness::with_session("a1", "r1").await;
    let subscription = |id: &str, status: &str| {
        json!({
            "id": id,
            "user_id": "user-1",
            "plan_id": "plan-pro",
            "status": status,
            "start_date": "2024-01-01T00:00:00",
            "end_date": null,
            "auto_renew": true,
            "created_at": "2024-01-01T00:00:00",
        })
    };
    Mock::given(method("GET"))
        .and(path("/subscriptions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            subscription("sub-1", "expired"),
            subscription("sub-2", "active"),
        ])))
        .mount(&h.server)
        .await;

    let active = h
        .clients
        .subscriptions()
        .active_subscription()
        .await
        .unwrap();

    assert_eq!(active.map(|s| s.id).as_deref(), Some("sub-2"));
}

#[tokio::test]
async fn test_dicom_upload_reports_progress() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("POST"))
        .and(path("/upload_dicom_zip"))
        .and(body_string_contains("name=\"patient_name\""))
        .and(body_string_contains("name=\"file_size\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upload_id": "up-1"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let archive = FileUpload::new("study.zip", vec![7u8; 200 * 1024]);
    let response = h
        .clients
        .processing()
        .upload_dicom_zip(&CaseRef::new("Zhang San", "20240101"), archive, move |p| {
            sink.lock().unwrap().push(p)
        })
        .await
        .unwrap();

    assert_eq!(response["upload_id"], "up-1");
    let reports = reports.lock().unwrap();
    assert!(reports.len() >= 4);
    assert!(reports.windows(2).all(|w| w[0].loaded <= w[1].loaded));
    let last = reports.last().unwrap();
    assert_eq!(last.total, 200 * 1024);
    assert_eq!(last.percent(), 100);
}

#[tokio::test]
async fn test_middle_mask_upload_needs_a_mask() {
    let h = Harness::with_session("a1", "r1").await;

    let result = h
        .clients
        .processing()
        .upload_middle_manual_mask(&CaseRef::new("p", "20240101"), None, None)
        .await;

    assert!(matches!(result, Err(ClientError::ValidationError(_))));
}

#[tokio::test]
async fn test_image_url_carries_token_and_cache_buster() {
    let h = Harness::with_session("a1", "r1").await;

    let url = h
        .clients
        .processing()
        .output_image_url(&CaseRef::new("Zhang San", "20240101"), "Axisal", "slice 1.png")
        .await
        .unwrap();

    let parsed = url::Url::parse(&url).unwrap();
    assert_eq!(
        parsed.path(),
        "/get_output_image/Zhang%20San/20240101/Axisal/slice%201.png"
    );
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    assert!(pairs.iter().any(|(k, _)| k == "t"));
    assert!(pairs.contains(&("token".to_string(), "a1".to_string())));
}

#[tokio::test]
async fn test_segmentation_sends_prompt_points() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("POST"))
        .and(path("/api/segmentation/sam2"))
        .and(body_string_contains("name=\"click_points\""))
        .and(body_string_contains("[{\"x\":12.0,\"y\":30.5,\"label\":1}]"))
        .and(body_string_contains("L3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mask_data": "iVBORw0KGgo=",
            "confidence_score": 0.93,
            "processing_time_ms": 850.0,
            "cached": false,
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let result = h
        .clients
        .segmentation()
        .segment(SegmentationRequest {
            image: FileUpload::new("slice.png", vec![1, 2, 3]),
            image_type: ImageType::L3,
            patient_id: Some("p-1".to_string()),
            slice_index: None,
            click_points: vec![ClickPoint {
                x: 12.0,
                y: 30.5,
                label: 1,
            }],
        })
        .await
        .unwrap();

    assert_eq!(result.confidence_score, 0.93);
    assert!(!result.cached);
}

#[tokio::test]
async fn test_segmentation_rejects_result_without_confidence() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("POST"))
        .and(path("/api/segmentation/sam2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mask_data": "iVBORw0KGgo=",
            "confidence_score": "high",
        })))
        .mount(&h.server)
        .await;

    let result = h
        .clients
        .segmentation()
        .segment(SegmentationRequest {
            image: FileUpload::new("slice.png", vec![1]),
            image_type: ImageType::Auto,
            patient_id: None,
            slice_index: None,
            click_points: Vec::new(),
        })
        .await;

    assert!(matches!(
        result,
        Err(ClientError::RequestFailed(idoctor_client::RequestFailure::Decode(_)))
    ));
}

#[tokio::test]
async fn test_segmentation_health_degrades_to_unavailable() {
    let h = Harness::with_session("a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/api/segmentation/sam2/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&h.server)
        .await;

    let health = h.clients.segmentation().health().await;

    assert!(!health.enabled);
    assert!(!health.available);
}
