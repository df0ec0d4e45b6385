//! Document lifecycle integration tests: creation, validation, wholesale
//! item replacement, deletion, status transitions, tenant isolation.

mod common;

use common::{decimal, document_body, item, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn create_invoice_computes_totals_server_side() {
    let Some(app) = TestApp::spawn().await else { return };

    let body = document_body(vec![
        item("Consulting", "10", "50000", "18"),
        item("Hosting", "1", "25000", "0"),
    ]);
    let (id, number) = app.create_document("invoice", &body).await;
    assert!(number.starts_with("FAC-2026-"));

    let response = app.get(&format!("/documents/invoice/{}", id)).await;
    assert_eq!(response.status(), 200);
    let doc: serde_json::Value = response.json().await.unwrap();

    assert_eq!(decimal(&doc["subtotal"]), dec!(525000));
    assert_eq!(decimal(&doc["tax_total"]), dec!(90000));
    assert_eq!(decimal(&doc["total"]), dec!(615000));
    assert_eq!(doc["status"], "draft");
    assert_eq!(doc["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn numbers_are_sequential_per_kind() {
    let Some(app) = TestApp::spawn().await else { return };

    let body = document_body(vec![item("A", "1", "100", "0")]);
    let (_, first) = app.create_document("invoice", &body).await;
    let (_, second) = app.create_document("invoice", &body).await;
    let (_, quote) = app.create_document("quote", &body).await;

    assert_eq!(first, "FAC-2026-0001");
    assert_eq!(second, "FAC-2026-0002");
    assert_eq!(quote, "DEV-2026-0001");
}

#[tokio::test]
async fn create_requires_a_client() {
    let Some(app) = TestApp::spawn().await else { return };

    let body = json!({
        "issue_date": "2026-01-15",
        "currency_code": "XOF",
        "items": [item("Consulting", "1", "1000", "0")]
    });
    let response = app.post("/documents/invoice", &body).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn create_rejects_documents_with_only_blank_items() {
    let Some(app) = TestApp::spawn().await else { return };

    let body = document_body(vec![item("   ", "1", "1000", "0")]);
    let response = app.post("/documents/invoice", &body).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn create_rejects_malformed_currency() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut body = document_body(vec![item("Consulting", "1", "1000", "0")]);
    body["currency_code"] = json!("FRANCS");
    let response = app.post("/documents/invoice", &body).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn create_rejects_malformed_issue_date() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut body = document_body(vec![item("Consulting", "1", "1000", "0")]);
    body["issue_date"] = json!("15/01/2026");
    let response = app.post("/documents/invoice", &body).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn partial_failure_leaves_no_document_behind() {
    let Some(app) = TestApp::spawn().await else { return };

    // The second item overflows NUMERIC(18,3) and fails mid-transaction,
    // after the header and the first item were inserted.
    let body = document_body(vec![
        item("Fine", "1", "1000", "0"),
        item("Overflow", "10000000000000000", "1", "0"),
    ]);
    let response = app.post("/documents/invoice", &body).await;
    assert_eq!(response.status(), 500);

    let response = app.get("/documents/invoice").await;
    let list: serde_json::Value = response.json().await.unwrap();
    assert_eq!(list["documents"].as_array().unwrap().len(), 0);

    // The rolled-back create did not burn a sequence number either.
    let (_, number) = app
        .create_document("invoice", &document_body(vec![item("A", "1", "100", "0")]))
        .await;
    assert_eq!(number, "FAC-2026-0001");
}

#[tokio::test]
async fn update_replaces_line_items_wholesale() {
    let Some(app) = TestApp::spawn().await else { return };

    let (id, _) = app
        .create_document(
            "invoice",
            &document_body(vec![
                item("Old line 1", "1", "100", "0"),
                item("Old line 2", "2", "200", "0"),
            ]),
        )
        .await;

    let response = app
        .put(
            &format!("/documents/invoice/{}", id),
            &document_body(vec![item("Replacement", "3", "50", "18")]),
        )
        .await;
    assert_eq!(response.status(), 200);

    let doc: serde_json::Value = app
        .get(&format!("/documents/invoice/{}", id))
        .await
        .json()
        .await
        .unwrap();
    let items = doc["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Replacement");
    assert_eq!(decimal(&doc["subtotal"]), dec!(150));
    assert_eq!(decimal(&doc["tax_total"]), dec!(27));
    assert_eq!(decimal(&doc["total"]), dec!(177));
}

#[tokio::test]
async fn update_is_rejected_once_content_is_locked() {
    let Some(app) = TestApp::spawn().await else { return };

    let (id, _) = app
        .create_document("invoice", &document_body(vec![item("A", "1", "100", "0")]))
        .await;
    app.set_status("invoice", &id, "sent").await;
    app.set_status("invoice", &id, "cancelled").await;

    let response = app
        .put(
            &format!("/documents/invoice/{}", id),
            &document_body(vec![item("B", "1", "100", "0")]),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn only_draft_documents_can_be_deleted() {
    let Some(app) = TestApp::spawn().await else { return };

    let (draft_id, _) = app
        .create_document("invoice", &document_body(vec![item("A", "1", "100", "0")]))
        .await;
    let (sent_id, _) = app
        .create_document("invoice", &document_body(vec![item("B", "1", "100", "0")]))
        .await;
    app.set_status("invoice", &sent_id, "sent").await;

    let response = app.delete(&format!("/documents/invoice/{}", draft_id)).await;
    assert_eq!(response.status(), 204);
    let response = app.get(&format!("/documents/invoice/{}", draft_id)).await;
    assert_eq!(response.status(), 404);

    let response = app.delete(&format!("/documents/invoice/{}", sent_id)).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn status_transitions_follow_the_machine() {
    let Some(app) = TestApp::spawn().await else { return };

    let (id, _) = app
        .create_document("invoice", &document_body(vec![item("A", "1", "100", "0")]))
        .await;

    // draft -> sent is allowed
    app.set_status("invoice", &id, "sent").await;

    // sent -> draft is not in the table
    let response = app
        .post(
            &format!("/documents/invoice/{}/status", id),
            &json!({ "status": "draft" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // re-requesting the current status is an idempotent no-op
    let response = app
        .post(
            &format!("/documents/invoice/{}/status", id),
            &json!({ "status": "sent" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["status"], "sent");

    // unknown status names are validation failures
    let response = app
        .post(
            &format!("/documents/invoice/{}/status", id),
            &json!({ "status": "archived" }),
        )
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn terminal_statuses_admit_no_further_transitions() {
    let Some(app) = TestApp::spawn().await else { return };

    let (id, _) = app
        .create_document("invoice", &document_body(vec![item("A", "1", "100", "0")]))
        .await;
    app.set_status("invoice", &id, "cancelled").await;

    let response = app
        .post(
            &format!("/documents/invoice/{}/status", id),
            &json!({ "status": "sent" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn rejected_quotes_can_be_resent() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut body = document_body(vec![item("A", "1", "100", "0")]);
    body["due_date"] = serde_json::Value::Null;
    body["expiry_date"] = json!("2026-03-15");
    let (id, _) = app.create_document("quote", &body).await;

    app.set_status("quote", &id, "sent").await;
    app.set_status("quote", &id, "rejected").await;
    app.set_status("quote", &id, "sent").await;
}

#[tokio::test]
async fn documents_are_invisible_across_organizations() {
    let Some(app) = TestApp::spawn().await else { return };

    let (id, _) = app
        .create_document("invoice", &document_body(vec![item("A", "1", "100", "0")]))
        .await;

    let other_org = uuid::Uuid::new_v4();
    let response = app
        .get_as(other_org, &format!("/documents/invoice/{}", id))
        .await;
    assert_eq!(response.status(), 404);
}
