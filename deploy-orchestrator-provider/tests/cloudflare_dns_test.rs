//! Cloudflare DNS client against a mock API.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{ACCOUNT_ID, cf_err, cf_ok, cf_record, cf_zone};
use deploy_orchestrator_provider::{
    CloudflareDnsClient, DnsCredentials, DnsProvider, DnsRecordInput, DnsRecordType,
    ProviderError, Ttl,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CloudflareDnsClient {
    CloudflareDnsClient::new(&DnsCredentials {
        account_id: ACCOUNT_ID.to_string(),
        api_token: "test-token".to_string(),
    })
    .with_base_url(&server.uri())
}

async fn mount_zone(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/zones/z1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(cf_zone("z1", "example.com"))))
        .mount(server)
        .await;
}

#[tokio::test]
async fn validate_credentials_active_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/tokens/verify"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!({ "status": "active" }))))
        .mount(&server)
        .await;

    assert!(client(&server).validate_credentials().await.unwrap());
}

#[tokio::test]
async fn validate_credentials_rejected_token_is_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/tokens/verify"))
        .respond_with(ResponseTemplate::new(401).set_body_json(cf_err(1000, "Invalid API Token")))
        .mount(&server)
        .await;

    assert!(!client(&server).validate_credentials().await.unwrap());
}

#[tokio::test]
async fn find_zone_filters_by_name_and_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.com"))
        .and(query_param("account.id", ACCOUNT_ID))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cf_ok(json!([cf_zone("z1", "example.com")]))),
        )
        .mount(&server)
        .await;

    let zone = client(&server)
        .find_zone("Example.COM.")
        .await
        .unwrap()
        .expect("zone should be found");
    assert_eq!(zone.id, "z1");
    assert_eq!(zone.name_servers.len(), 2);
}

#[tokio::test]
async fn find_zone_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(json!([]))))
        .mount(&server)
        .await;

    assert!(client(&server).find_zone("nope.dev").await.unwrap().is_none());
}

#[tokio::test]
async fn create_zone_posts_full_zone_for_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones"))
        .and(body_partial_json(json!({
            "name": "new.dev",
            "account": { "id": ACCOUNT_ID },
            "type": "full"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(cf_zone("z9", "new.dev"))))
        .expect(1)
        .mount(&server)
        .await;

    let zone = client(&server).create_zone("new.dev").await.unwrap();
    assert_eq!(zone.id, "z9");
}

#[tokio::test]
async fn list_records_follows_pages_and_relativizes_names() {
    let server = MockServer::start().await;
    mount_zone(&server).await;
    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [cf_record("r1", "A", "example.com", "192.0.2.1")],
            "result_info": { "page": 1, "per_page": 100, "total_pages": 2, "total_count": 2 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [cf_record("r2", "CNAME", "www.example.com", "example.com")],
            "result_info": { "page": 2, "per_page": 100, "total_pages": 2, "total_count": 2 }
        })))
        .mount(&server)
        .await;

    let records = client(&server).list_records("z1").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "@");
    assert_eq!(records[0].ttl, Ttl::Auto);
    assert_eq!(records[1].name, "www");
    assert_eq!(records[1].record_type, DnsRecordType::Cname);
}

#[tokio::test]
async fn create_record_sends_full_name() {
    let server = MockServer::start().await;
    mount_zone(&server).await;
    Mock::given(method("POST"))
        .and(path("/zones/z1/dns_records"))
        .and(body_partial_json(json!({
            "type": "A",
            "name": "www.example.com",
            "content": "192.0.2.10",
            "ttl": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(cf_record(
            "r3",
            "A",
            "www.example.com",
            "192.0.2.10",
        ))))
        .expect(1)
        .mount(&server)
        .await;

    let input = DnsRecordInput::new(DnsRecordType::A, "www", "192.0.2.10").with_ttl(Ttl::Seconds(300));
    let record = client(&server).create_record("z1", &input).await.unwrap();
    assert_eq!(record.id, "r3");
    assert_eq!(record.name, "www");
}

#[tokio::test]
async fn duplicate_record_maps_to_record_exists() {
    let server = MockServer::start().await;
    mount_zone(&server).await;
    Mock::given(method("POST"))
        .and(path("/zones/z1/dns_records"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(cf_err(81057, "An identical record already exists.")),
        )
        .mount(&server)
        .await;

    let input = DnsRecordInput::new(DnsRecordType::A, "@", "192.0.2.1");
    let err = client(&server).create_record("z1", &input).await.unwrap_err();
    assert!(matches!(err, ProviderError::RecordExists { .. }), "got {err:?}");
}

#[tokio::test]
async fn update_record_patches_by_id() {
    let server = MockServer::start().await;
    mount_zone(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/zones/z1/dns_records/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(cf_record(
            "r1",
            "A",
            "example.com",
            "192.0.2.99",
        ))))
        .expect(1)
        .mount(&server)
        .await;

    let input = DnsRecordInput::new(DnsRecordType::A, "@", "192.0.2.99");
    let record = client(&server).update_record("z1", "r1", &input).await.unwrap();
    assert_eq!(record.content, "192.0.2.99");
}

#[tokio::test]
async fn delete_missing_record_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/zones/z1/dns_records/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(cf_err(81044, "Record does not exist.")))
        .mount(&server)
        .await;

    let err = client(&server).delete_record("z1", "gone").await.unwrap_err();
    assert!(matches!(err, ProviderError::RecordNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn batch_create_reports_partial_failures() {
    let server = MockServer::start().await;
    mount_zone(&server).await;
    Mock::given(method("POST"))
        .and(path("/zones/z1/dns_records"))
        .and(body_partial_json(json!({ "name": "example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cf_ok(cf_record(
            "r1",
            "A",
            "example.com",
            "192.0.2.1",
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/zones/z1/dns_records"))
        .and(body_partial_json(json!({ "name": "www.example.com" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(cf_err(81053, "exists")))
        .mount(&server)
        .await;

    let inputs = vec![
        DnsRecordInput::new(DnsRecordType::A, "@", "192.0.2.1"),
        DnsRecordInput::new(DnsRecordType::Cname, "www", "example.com"),
    ];
    let result = client(&server).batch_create_records("z1", &inputs).await;
    assert_eq!(result.created_records.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].request_index, 1);
    assert_eq!(result.failures[0].record_name, "www");
}
