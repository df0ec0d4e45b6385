//! Payment reconciliation integration tests.

mod common;

use common::{decimal, document_body, item, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

/// Create a SENT invoice for 590000 XOF and return its id.
async fn sent_invoice(app: &TestApp) -> String {
    let (id, _) = app
        .create_document(
            "invoice",
            &document_body(vec![item("Consulting", "10", "50000", "18")]),
        )
        .await;
    app.set_status("invoice", &id, "sent").await;
    id
}

fn payment(amount: &str) -> serde_json::Value {
    json!({
        "amount": amount,
        "method": "bank_transfer",
        "paid_at": "2026-02-01"
    })
}

#[tokio::test]
async fn partial_then_full_payment_marks_invoice_paid() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("295000"))
        .await;
    assert_eq!(response.status(), 201);
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["new_status"], "partial");
    assert_eq!(decimal(&value["paid_total"]), dec!(295000));

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("295000"))
        .await;
    assert_eq!(response.status(), 201);
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["new_status"], "paid");
    assert_eq!(decimal(&value["paid_total"]), dec!(590000));
}

#[tokio::test]
async fn paid_invoices_accept_no_further_payments() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    app.post(&format!("/invoices/{}/payments", id), &payment("590000"))
        .await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("1"))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("590000.02"))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn payment_within_rounding_tolerance_marks_paid() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("589999.99"))
        .await;
    assert_eq!(response.status(), 201);
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["new_status"], "paid");
}

#[tokio::test]
async fn non_positive_amounts_fail_validation() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("0"))
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn cancelled_invoices_accept_no_payments() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;
    app.set_status("invoice", &id, "cancelled").await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("1000"))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn removing_the_last_payment_reverts_to_sent() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("590000"))
        .await;
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["new_status"], "paid");
    let payment_id = value["payment_id"].as_str().unwrap().to_string();

    let response = app.delete(&format!("/payments/{}", payment_id)).await;
    assert_eq!(response.status(), 204);

    let doc: serde_json::Value = app
        .get(&format!("/documents/invoice/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(doc["status"], "sent");
}

#[tokio::test]
async fn removing_one_of_several_payments_derives_partial() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    app.post(&format!("/invoices/{}/payments", id), &payment("295000"))
        .await;
    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("295000"))
        .await;
    let value: serde_json::Value = response.json().await.unwrap();
    let second_payment = value["payment_id"].as_str().unwrap().to_string();

    app.delete(&format!("/payments/{}", second_payment)).await;

    let doc: serde_json::Value = app
        .get(&format!("/documents/invoice/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(doc["status"], "partial");
}

#[tokio::test]
async fn apply_then_remove_does_not_restore_overdue() {
    // Documented asymmetry: the rollback lands on SENT, never back on the
    // invoice's earlier OVERDUE status.
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;
    app.set_status("invoice", &id, "overdue").await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("100000"))
        .await;
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["new_status"], "partial");
    let payment_id = value["payment_id"].as_str().unwrap().to_string();

    app.delete(&format!("/payments/{}", payment_id)).await;

    let doc: serde_json::Value = app
        .get(&format!("/documents/invoice/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(doc["status"], "sent");
}

#[tokio::test]
async fn applied_payments_are_listed_on_the_invoice() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    app.post(&format!("/invoices/{}/payments", id), &payment("100000"))
        .await;
    app.post(&format!("/invoices/{}/payments", id), &payment("50000"))
        .await;

    let response = app.get(&format!("/invoices/{}/payments", id)).await;
    assert_eq!(response.status(), 200);
    let value: serde_json::Value = response.json().await.unwrap();
    let payments = value["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0]["method"], "bank_transfer");
}

#[tokio::test]
async fn payments_are_scoped_to_the_organization() {
    let Some(app) = TestApp::spawn().await else { return };
    let id = sent_invoice(&app).await;

    let response = app
        .post(&format!("/invoices/{}/payments", id), &payment("1000"))
        .await;
    let value: serde_json::Value = response.json().await.unwrap();
    let payment_id = value["payment_id"].as_str().unwrap().to_string();

    // Another organization cannot delete the payment.
    let response = app
        .client
        .delete(format!("{}/payments/{}", app.address, payment_id))
        .header("X-Org-ID", uuid::Uuid::new_v4().to_string())
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), 404);
}
