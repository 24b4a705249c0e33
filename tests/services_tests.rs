//! Integration tests for the resource services against a mock server.

use drchrono_client::pagination::ListParams;
use drchrono_client::services::{
    DoctorsServiceTrait, DocumentsServiceTrait, PatientsServiceTrait, TasksServiceTrait,
    UsersServiceTrait,
};
use drchrono_client::{ChronoConfig, DrChronoClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> DrChronoClient {
    let config = ChronoConfig::builder()
        .base_url(&server.uri())
        .access_token("test-token")
        .build()
        .unwrap();
    DrChronoClient::new(config).unwrap()
}

#[tokio::test]
async fn test_patients_list_decodes_page_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .and(query_param("page_size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "previous": null,
            "next": format!("{}/api/patients?page=2", server.uri()),
            "results": [{"id": 1}, {"id": 2}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let page = client
        .patients()
        .list(ListParams::new().page_size(2))
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert!(page.has_next());
    assert_eq!(page.results[0]["id"], 1);
}

#[tokio::test]
async fn test_patients_list_all_follows_next_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "previous": null,
            "next": format!("{}/api/patients_page2", server.uri()),
            "results": [{"id": 1}, {"id": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/patients_page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "previous": format!("{}/api/patients", server.uri()),
            "next": null,
            "results": [{"id": 3}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let patients = client.patients().list_all(ListParams::new()).await.unwrap();

    assert_eq!(patients.len(), 3);
    assert_eq!(patients[2]["id"], 3);
}

#[tokio::test]
async fn test_patients_crud_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patients/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/patients"))
        .and(body_partial_json(json!({"first_name": "Ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 43})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/patients/43"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 43})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/patients/43"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let patients = client.patients();

    assert_eq!(patients.get(42).await.unwrap()["id"], 42);
    let created = patients
        .create(json!({"first_name": "Ada"}))
        .await
        .unwrap();
    assert_eq!(created["id"], 43);
    patients
        .update(43, json!({"last_name": "Lovelace"}))
        .await
        .unwrap();
    patients.delete(43).await.unwrap();
}

#[tokio::test]
async fn test_patient_summary_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patients_summary/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.patients().summary(42).await.unwrap();
}

#[tokio::test]
async fn test_doctors_current_takes_first_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/doctors"))
        .and(query_param("page_size", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "previous": null,
            "next": null,
            "results": [{"id": 11, "first_name": "Gregory"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let doctor = client.doctors().current().await.unwrap().unwrap();
    assert_eq!(doctor["id"], 11);
}

#[tokio::test]
async fn test_doctors_current_handles_empty_practice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "previous": null,
            "next": null,
            "results": []
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.doctors().current().await.unwrap().is_none());
}

#[tokio::test]
async fn test_users_current_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/current"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 9, "username": "frontdesk"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let user = client.users().current().await.unwrap();
    assert_eq!(user["username"], "frontdesk");
}

#[tokio::test]
async fn test_tasks_delete_maps_to_unit() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.tasks().delete(5).await.unwrap();
}

#[tokio::test]
async fn test_documents_upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .and(body_string_contains("name=\"document\""))
        .and(body_string_contains("filename=\"visit-note.txt\""))
        .and(body_string_contains("progress note"))
        .and(body_string_contains("name=\"patient\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 100})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join(format!("drchrono-test-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let file_path = dir.join("visit-note.txt");
    tokio::fs::write(&file_path, b"progress note").await.unwrap();

    let client = client_for(&server).await;
    let document = client
        .documents()
        .upload(
            7,
            11,
            &file_path,
            vec![("description".to_string(), json!("July visit"))],
        )
        .await
        .unwrap();

    assert_eq!(document["id"], 100);
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
