use httpmock::prelude::*;
use roof_order_etl::core::{DocumentReader, Pipeline};
use roof_order_etl::{
    CliConfig, EtlEngine, EtlError, GeminiClient, LocalStorage, WorkOrderDocument,
    WorkOrderPipeline,
};
use tempfile::TempDir;

const GENERATE_PATH: &str = "/models/gemini-2.5-pro:generateContent";
const FALLBACK_PATH: &str = "/models/gemini-2.5-flash:generateContent";

/// The fixtures are plain text standing in for the PDF text layer.
struct TextLayerReader;

impl DocumentReader for TextLayerReader {
    fn extract_text(&self, data: &[u8]) -> roof_order_etl::Result<String> {
        Ok(String::from_utf8_lossy(data).trim().to_string())
    }
}

fn cli_config(api_base: String) -> CliConfig {
    CliConfig {
        input: "order.pdf".to_string(),
        output_path: "out".to_string(),
        output_file: "roof_order_output.json".to_string(),
        api_key: Some("test-key".to_string()),
        api_base,
        model: "gemini-2.5-pro".to_string(),
        fallback_model: "gemini-2.5-flash".to_string(),
        no_fallback: true,
        timeout_seconds: 10,
        verbose: false,
        monitor: false,
        quiet: true,
        dry_run: false,
        json_logs: false,
    }
}

fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn setup_workspace(order_text: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("order.pdf"), order_text).unwrap();
    temp_dir
}

const ORDER_TEXT: &str = "\
WORK ORDER  WO # 99907349
Start Date: 2024-03-14   Delivery Date: 2024-03-18
Customer: Smith Residence
89 streetsman, Springfield PN 98
Project Consultant: Dana Lee  555-0142
Crew to park on street. Deliver to driveway.
10 Ridge Cap Shingels
4 Drip Edge 10ft
";

const MODEL_JSON: &str = r#"{
  "extraction": [{
    "header": {
      "bill_to": {"name": "Smith Residence", "address1": "89 streetsman", "city": "Springfield", "state": "PN", "zip": "98"},
      "ship_to": {"name": "Smith Residence", "address1": "89 streetsman", "city": "Springfield", "state": "PN", "zip": "98"},
      "buyer_contact": {"name": "Dana Lee", "contact_number": "555-0142"},
      "job_number": "99907349",
      "date_ordered": "2024-03-14",
      "delivery_date": "2024-03-18",
      "shipping_instructions": "Crew to park on street. Deliver to driveway."
    },
    "line_items": [
      {"quantity": 10, "product_description": "Ridge Cap Shingels", "spell_corrected_product_description": "Ridge Cap Shingles"},
      {"quantity": "4", "product_description": "Drip Edge 10ft"}
    ]
  }]
}"#;

#[tokio::test]
async fn test_end_to_end_extraction_writes_validated_json() {
    let temp_dir = setup_workspace(ORDER_TEXT);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .header("x-goog-api-key", "test-key")
            .body_contains("PDF_TEXT START")
            .body_contains("WO # 99907349");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_reply(MODEL_JSON));
    });

    let config = cli_config(server.base_url());
    let client = GeminiClient::from_config(&config).unwrap();
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = WorkOrderPipeline::new(storage, config, client).with_reader(TextLayerReader);
    let engine = EtlEngine::new(pipeline);

    let output = engine.run().await.unwrap();
    api_mock.assert();

    assert_eq!(output.output_path, "out/roof_order_output.json");
    let written =
        std::fs::read_to_string(temp_dir.path().join("out/roof_order_output.json")).unwrap();
    assert_eq!(written, output.json_output);

    let document: WorkOrderDocument = serde_json::from_str(&written).unwrap();
    let item = &document.extraction[0];
    assert_eq!(item.header.job_number.as_deref(), Some("99907349"));
    assert_eq!(item.header.buyer_contact.name.as_deref(), Some("Dana Lee"));
    assert_eq!(item.header.shipping_contact.name, None);
    assert_eq!(item.line_items.len(), 2);
    assert_eq!(item.line_items[1].quantity, 4);
    assert_eq!(
        item.line_items[0].spell_corrected_product_description.as_deref(),
        Some("Ridge Cap Shingles")
    );

    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["extraction"][0]["header"]["shipping_contact"]["email"], "None");
    assert_eq!(json["extraction"][0]["header"]["vendor"], "None");
    assert_eq!(json["extraction"][0]["header"]["payment_terms"], "None");
}

#[tokio::test]
async fn test_bare_item_response_is_wrapped() {
    let temp_dir = setup_workspace(ORDER_TEXT);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).json_body(gemini_reply(
            r#"{"header": {"job_number": "99907349"}, "line_items": [{"quantity": 2.9}]}"#,
        ));
    });

    let config = cli_config(server.base_url());
    let client = GeminiClient::from_config(&config).unwrap();
    let pipeline = WorkOrderPipeline::new(LocalStorage::new(temp_dir.path()), config, client)
        .with_reader(TextLayerReader);

    let output = EtlEngine::new(pipeline).run().await.unwrap();
    let document: WorkOrderDocument = serde_json::from_str(&output.json_output).unwrap();

    assert_eq!(document.extraction.len(), 1);
    assert_eq!(document.extraction[0].line_items[0].quantity, 2);
    assert_eq!(document.extraction[0].header.bill_to.name, None);
}

#[tokio::test]
async fn test_invalid_model_output_keeps_raw_text_and_writes_nothing() {
    let temp_dir = setup_workspace(ORDER_TEXT);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200)
            .json_body(gemini_reply(r#"{"extraction": [{"header": {"bill_to": "Smith"}, "line_items": []}]}"#));
    });

    let config = cli_config(server.base_url());
    let client = GeminiClient::from_config(&config).unwrap();
    let pipeline = WorkOrderPipeline::new(LocalStorage::new(temp_dir.path()), config, client)
        .with_reader(TextLayerReader);

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::SchemaError { .. }));
    assert!(err.raw_output().unwrap().contains("\"bill_to\": \"Smith\""));
    assert_eq!(err.exit_code(), 2);
    assert!(!temp_dir.path().join("out/roof_order_output.json").exists());
}

#[tokio::test]
async fn test_fallback_model_used_when_primary_unavailable() {
    let temp_dir = setup_workspace(ORDER_TEXT);

    let server = MockServer::start();
    let primary = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(404).body("model not found");
    });
    let fallback = server.mock(|when, then| {
        when.method(POST).path(FALLBACK_PATH);
        then.status(200).json_body(gemini_reply(MODEL_JSON));
    });

    let mut config = cli_config(server.base_url());
    config.no_fallback = false;
    let client = GeminiClient::from_config(&config).unwrap();
    let pipeline = WorkOrderPipeline::new(LocalStorage::new(temp_dir.path()), config, client)
        .with_reader(TextLayerReader);

    let raw = pipeline.extract().await.unwrap();

    primary.assert();
    fallback.assert();
    assert_eq!(raw.model, "gemini-2.5-flash");
}

#[tokio::test]
async fn test_api_error_surfaces_status() {
    let temp_dir = setup_workspace(ORDER_TEXT);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(401).body("API key not valid");
    });

    let config = cli_config(server.base_url());
    let client = GeminiClient::from_config(&config).unwrap();
    let pipeline = WorkOrderPipeline::new(LocalStorage::new(temp_dir.path()), config, client)
        .with_reader(TextLayerReader);

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    api_mock.assert_hits(1);
    assert!(matches!(err, EtlError::LlmError { status: 401, .. }));
    assert!(err.recovery_suggestion().contains("GOOGLE_API_KEY"));
}

#[tokio::test]
async fn test_missing_api_key_is_rejected_before_any_request() {
    let mut config = cli_config("http://127.0.0.1:9".to_string());
    config.api_key = Some("   ".to_string());

    let err = GeminiClient::from_config(&config).err().unwrap();
    assert!(matches!(err, EtlError::MissingConfigError { .. }));
}

#[tokio::test]
async fn test_non_pdf_input_fails_with_default_reader() {
    let temp_dir = setup_workspace(ORDER_TEXT);

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).json_body(gemini_reply(MODEL_JSON));
    });

    let config = cli_config(server.base_url());
    let client = GeminiClient::from_config(&config).unwrap();
    let pipeline = WorkOrderPipeline::new(LocalStorage::new(temp_dir.path()), config, client);

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    api_mock.assert_hits(0);
    assert!(matches!(err, EtlError::PdfError { .. }));
}
