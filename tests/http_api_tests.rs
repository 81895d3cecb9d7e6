//! End-to-end tests simulating a buyer submitting the order form over HTTP
//!
//! Every test runs the full router against the in-memory backend so both the
//! HTTP responses and the rows that reach the spreadsheet can be inspected.

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use chrono::{Local, TimeZone};
use orderform::prelude::*;
use orderform::storage::BackendCall;
use serde_json::Value;

// =============================================================================
// Helpers
// =============================================================================

fn create_test_server(config: IntakeConfig) -> (TestServer, InMemoryBackend) {
    let backend = InMemoryBackend::new([
        config.secrets.sheet_detail.clone(),
        config.secrets.sheet_rekap.clone(),
    ]);
    let clock = FixedClock(
        Local
            .with_ymd_and_hms(2024, 6, 1, 10, 30, 0)
            .single()
            .expect("unambiguous local time"),
    );

    let app = ServerBuilder::new()
        .with_config(config)
        .with_connector(backend.clone())
        .with_clock(clock)
        .build()
        .expect("Failed to build app");

    let server = TestServer::new(app).expect("Failed to create test server");
    (server, backend)
}

fn default_server() -> (TestServer, InMemoryBackend) {
    create_test_server(IntakeConfig::default_config())
}

fn base_form(status: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("coordinator", "Pak Budi")
        .add_text("buyer_name", "Siti Aminah")
        .add_text("phone", "081234567890")
        .add_text("address", "Jl. Merdeka 1, Bandung")
        .add_text("quantity", "2")
        .add_text("size_1", "M")
        .add_text("sleeve_1", "Pendek")
        .add_text("size_2", "XL")
        .add_text("sleeve_2", "Panjang")
        .add_text("payment_status", status)
}

fn png_part(len: usize) -> Part {
    Part::bytes(vec![0x89u8; len])
        .file_name("bukti transfer.png")
        .mime_type("image/png")
}

// =============================================================================
// Health Check Tests
// =============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _) = default_server();

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "orderform");
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let (server, _) = default_server();
        server.get("/healthz").await.assert_status_ok();
    }
}

// =============================================================================
// Form Description Tests
// =============================================================================

mod form_tests {
    use super::*;

    fn field_names(body: &Value) -> Vec<String> {
        body["fields"]
            .as_array()
            .expect("fields array")
            .iter()
            .map(|f| f["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_default_form_has_one_item() {
        let (server, _) = default_server();

        let response = server.get("/form").await;
        response.assert_status_ok();

        let body: Value = response.json();
        let names = field_names(&body);
        assert!(names.contains(&"size_1".to_string()));
        assert!(!names.contains(&"size_2".to_string()));
        assert_eq!(body["proof"]["visible"], false);
        assert_eq!(body["max_quantity"], 100);
    }

    #[tokio::test]
    async fn test_quantity_generates_item_slots() {
        let (server, _) = default_server();

        let response = server
            .get("/form")
            .add_query_param("quantity", 3)
            .add_query_param("payment_status", "Lunas Transfer")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let names = field_names(&body);
        for i in 1..=3 {
            assert!(names.contains(&format!("size_{}", i)));
            assert!(names.contains(&format!("sleeve_{}", i)));
        }
        assert!(!names.contains(&"size_4".to_string()));
        assert_eq!(body["proof"]["visible"], true);
    }

    #[tokio::test]
    async fn test_quantity_above_maximum_is_rejected() {
        let (server, _) = default_server();

        let response = server.get("/form").add_query_param("quantity", 101).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_FIELD");
    }
}

// =============================================================================
// Submission Tests
// =============================================================================

mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_unpaid_order_is_recorded() {
        let (server, backend) = default_server();

        let response = server
            .post("/orders")
            .multipart(base_form("Belum Bayar"))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["buyer_name"], "Siti Aminah");
        assert_eq!(body["quantity"], 2);
        assert_eq!(body["proof_url"], "N/A");
        assert_eq!(body["submitted_at"], "2024-06-01 10:30:00");

        let detail = backend.rows("Detail");
        assert_eq!(detail.len(), 1);
        let row: Vec<Value> = detail[0]
            .iter()
            .map(|cell| serde_json::to_value(cell).unwrap())
            .collect();
        assert_eq!(
            row,
            vec![
                Value::from(""),
                Value::from("2024-06-01 10:30:00"),
                Value::from("Siti Aminah"),
                Value::from("Jl. Merdeka 1, Bandung"),
                Value::from("081234567890"),
                Value::from("Baju 1: M-Pendek; Baju 2: XL-Panjang"),
                Value::from("Belum Bayar"),
                Value::from("Pak Budi"),
                Value::from("N/A"),
            ]
        );

        let summary = backend.rows("Rekap");
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0][4], CellValue::Number(2));
        assert_eq!(summary[0][7], CellValue::from("N/A"));
    }

    #[tokio::test]
    async fn test_transfer_order_uploads_proof_first() {
        let (server, backend) = default_server();

        let form = base_form("Lunas Transfer").add_part("payment_proof", png_part(256));
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        match &calls[0] {
            BackendCall::Upload { name, parent } => {
                assert!(name.starts_with("Bukti_Siti_Aminah_"), "{}", name);
                assert!(name.ends_with(".png"), "{}", name);
                assert_eq!(parent, "proof-folder");
            }
            other => panic!("expected upload first, got {:?}", other),
        }

        let objects = backend.objects();
        assert_eq!(objects[0].content.len(), 256);
        let expected_url = format!(
            "https://drive.google.com/uc?export=view&id={}",
            objects[0].id
        );

        let body: Value = response.json();
        assert_eq!(body["proof_url"], expected_url.as_str());
        assert_eq!(backend.rows("Detail")[0][8], CellValue::from(expected_url.clone()));
        assert_eq!(backend.rows("Rekap")[0][7], CellValue::from(expected_url));
    }

    #[tokio::test]
    async fn test_proof_ignored_for_cash_payment() {
        let (server, backend) = default_server();

        let form = base_form("Lunas Cash").add_part("payment_proof", png_part(16));
        server
            .post("/orders")
            .multipart(form)
            .await
            .assert_status(StatusCode::CREATED);

        assert!(backend.objects().is_empty());
        assert_eq!(backend.rows("Detail")[0][8], CellValue::from("N/A"));
    }

    #[tokio::test]
    async fn test_item_fields_beyond_quantity_are_ignored() {
        let (server, backend) = default_server();

        let form = base_form("Belum Bayar")
            .add_text("size_3", "XS")
            .add_text("sleeve_3", "Pendek");
        server
            .post("/orders")
            .multipart(form)
            .await
            .assert_status(StatusCode::CREATED);

        assert_eq!(
            backend.rows("Detail")[0][5],
            CellValue::from("Baju 1: M-Pendek; Baju 2: XL-Panjang")
        );
    }
}

// =============================================================================
// Rejection Tests
// =============================================================================

mod rejection_tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_fields_are_named_in_form_order() {
        let (server, backend) = default_server();

        let form = MultipartForm::new()
            .add_text("coordinator", "Pak Budi")
            .add_text("buyer_name", "  ")
            .add_text("quantity", "1")
            .add_text("payment_status", "Belum Bayar");
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "MISSING_REQUIRED_FIELDS");
        assert_eq!(body["stage"], "validating");
        assert_eq!(
            body["details"]["fields"],
            serde_json::json!(["buyer_name", "phone", "address"])
        );
        assert!(backend.calls().is_empty());
        assert_eq!(backend.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_quantity_is_a_missing_field() {
        let (server, backend) = default_server();

        let form = MultipartForm::new()
            .add_text("coordinator", "Pak Budi")
            .add_text("buyer_name", "")
            .add_text("phone", "08123456789")
            .add_text("address", "Jl. Melati 3")
            .add_text("quantity", "")
            .add_text("payment_status", "Belum Bayar");
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "MISSING_REQUIRED_FIELDS");
        assert_eq!(
            body["details"]["fields"],
            serde_json::json!(["buyer_name", "quantity"])
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_without_proof_is_rejected() {
        let (server, backend) = default_server();

        let response = server
            .post("/orders")
            .multipart(base_form("Lunas Transfer"))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "MISSING_PAYMENT_PROOF");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_size_is_rejected() {
        let (server, _) = default_server();

        let form = base_form("Belum Bayar").add_text("size_2", "XXXL");
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_CHOICE");
        assert_eq!(body["details"]["field"], "size_2");
    }

    #[tokio::test]
    async fn test_non_numeric_quantity_is_bad_request() {
        let (server, _) = default_server();

        let form = base_form("Belum Bayar").add_text("quantity", "dua");
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_FIELD");
        assert_eq!(body["stage"], "collecting");
    }

    #[tokio::test]
    async fn test_oversized_proof_is_rejected_by_validation() {
        let mut config = IntakeConfig::default_config();
        config.catalog.max_proof_bytes = 1024;
        let (server, backend) = create_test_server(config);

        let form = base_form("Lunas Transfer").add_part("payment_proof", png_part(2048));
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_ATTACHMENT");
        assert!(backend.objects().is_empty());
    }

    #[tokio::test]
    async fn test_body_over_limit_is_payload_too_large() {
        let mut config = IntakeConfig::default_config();
        config.catalog.max_proof_bytes = 1024;
        let (server, backend) = create_test_server(config);

        let form = base_form("Lunas Transfer").add_part("payment_proof", png_part(256 * 1024));
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_proof_type_is_rejected() {
        let (server, _) = default_server();

        let pdf = Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("bukti.pdf")
            .mime_type("application/pdf");
        let form = base_form("Lunas Transfer").add_part("payment_proof", pdf);
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_ATTACHMENT");
    }
}

// =============================================================================
// Sink Failure Tests
// =============================================================================

mod sink_failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_spreadsheet_is_service_unavailable() {
        let (server, backend) = default_server();
        backend.set_reachable(orderform::core::error::ServiceKind::Spreadsheet, false);

        let response = server
            .post("/orders")
            .multipart(base_form("Belum Bayar"))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body: Value = response.json();
        assert_eq!(body["stage"], "connecting");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_writes_nothing() {
        let (server, backend) = default_server();
        backend.fail_uploads("folder not found");

        let form = base_form("Lunas Transfer").add_part("payment_proof", png_part(64));
        let response = server.post("/orders").multipart(form).await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let body: Value = response.json();
        assert_eq!(body["code"], "UPLOAD_FAILED");
        assert_eq!(body["stage"], "uploading");
        assert!(backend.rows("Detail").is_empty());
        assert!(backend.rows("Rekap").is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_keeps_detail_row() {
        let (server, backend) = default_server();
        backend.fail_appends_to("Rekap", "quota exceeded");

        let response = server
            .post("/orders")
            .multipart(base_form("Belum Bayar"))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let body: Value = response.json();
        assert_eq!(body["stage"], "writing-summary");
        assert_eq!(body["details"]["worksheet"], "Rekap");
        assert_eq!(backend.rows("Detail").len(), 1);
        assert!(backend.rows("Rekap").is_empty());
    }

    #[tokio::test]
    async fn test_missing_detail_worksheet_is_named() {
        let mut config = IntakeConfig::default_config();
        config.secrets.sheet_detail = "Detail".to_string();
        let backend = InMemoryBackend::new(["Rekap"]);
        let app = ServerBuilder::new()
            .with_config(config)
            .with_connector(backend.clone())
            .build()
            .expect("Failed to build app");
        let server = TestServer::new(app).expect("Failed to create test server");

        let response = server
            .post("/orders")
            .multipart(base_form("Belum Bayar"))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let body: Value = response.json();
        assert_eq!(body["code"], "DESTINATION_NOT_FOUND");
        assert_eq!(body["stage"], "writing-detail");
        assert!(backend.rows("Rekap").is_empty());
    }
}
