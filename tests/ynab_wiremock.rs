use anyhow::Result;
use banksync::ledger::{Ledger, YnabClient};
use banksync::models::{ClearedStatus, LedgerTransaction, Milliunits, NewLedgerTransaction};
use chrono::NaiveDate;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> YnabClient {
    YnabClient::new(SecretString::from("ynab-token".to_string()), "budget-1")
        .with_base_url(server.uri())
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn ynab_transaction(id: &str, date: &str, amount: i64, transfer: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "date": date,
        "amount": amount,
        "memo": null,
        "cleared": "uncleared",
        "approved": true,
        "flag_color": null,
        "account_id": "acct-1",
        "account_name": "Checking",
        "payee_id": "p1",
        "payee_name": "Netonnet",
        "category_id": null,
        "transfer_account_id": transfer,
        "transfer_transaction_id": null,
        "matched_transaction_id": null,
        "import_id": null,
        "deleted": false,
        "subtransactions": []
    })
}

#[tokio::test]
async fn transactions_since_date() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/budgets/budget-1/accounts/acct-1/transactions"))
        .and(query_param("since_date", "2025-01-15"))
        .and(header("authorization", "Bearer ynab-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "transactions": [ynab_transaction("y1", "2025-01-16", -250000, None)],
                "server_knowledge": 42
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client(&server)
        .transactions("acct-1", Some(date("2025-01-15")))
        .await?;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "y1");
    assert_eq!(entries[0].amount, Milliunits::new(-250_000));
    assert_eq!(entries[0].cleared, ClearedStatus::Uncleared);
    assert_eq!(entries[0].date, date("2025-01-16"));
    Ok(())
}

#[tokio::test]
async fn latest_transaction_date_skips_transfers() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/budgets/budget-1/accounts/acct-1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "transactions": [
                    ynab_transaction("y1", "2025-01-10", -1000, None),
                    ynab_transaction("y2", "2025-01-12", -2000, None),
                    ynab_transaction("y3", "2025-01-14", 50000, Some("savings")),
                ],
                "server_knowledge": 1
            }
        })))
        .mount(&server)
        .await;

    let latest = client(&server).latest_transaction_date("acct-1").await?;
    assert_eq!(latest, Some(date("2025-01-12")));
    Ok(())
}

#[tokio::test]
async fn latest_transaction_date_of_empty_account() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/budgets/budget-1/accounts/acct-1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "transactions": [], "server_knowledge": 0 }
        })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).latest_transaction_date("acct-1").await?, None);
    Ok(())
}

#[tokio::test]
async fn create_posts_batch_and_reports_duplicates() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/budgets/budget-1/transactions"))
        .and(body_json(json!({
            "transactions": [{
                "account_id": "acct-1",
                "date": "2025-01-16",
                "amount": -250000,
                "payee_name": "Netonnet",
                "cleared": "cleared",
                "import_id": "YNAB:-250000:2025-01-16:1"
            }, {
                "account_id": "acct-1",
                "date": "2025-01-16",
                "amount": -45500,
                "payee_name": "Kaffebar",
                "cleared": "uncleared",
                "import_id": "YNAB:-45500:2025-01-16:1"
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "transaction_ids": ["new-1"],
                "duplicate_import_ids": ["YNAB:-45500:2025-01-16:1"],
                "transactions": [],
                "server_knowledge": 43
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = vec![
        NewLedgerTransaction {
            account_id: "acct-1".to_string(),
            date: date("2025-01-16"),
            amount: Milliunits::new(-250_000),
            payee_name: "Netonnet".to_string(),
            cleared: ClearedStatus::Cleared,
            import_id: "YNAB:-250000:2025-01-16:1".to_string(),
        },
        NewLedgerTransaction {
            account_id: "acct-1".to_string(),
            date: date("2025-01-16"),
            amount: Milliunits::new(-45_500),
            payee_name: "Kaffebar".to_string(),
            cleared: ClearedStatus::Uncleared,
            import_id: "YNAB:-45500:2025-01-16:1".to_string(),
        },
    ];

    let outcome = client(&server).create_transactions(&candidates).await?;
    assert_eq!(outcome.created, vec!["new-1".to_string()]);
    assert_eq!(
        outcome.duplicate_import_ids,
        vec!["YNAB:-45500:2025-01-16:1".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn update_patches_cleared_flag_only() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/budgets/budget-1/transactions"))
        .and(body_json(json!({
            "transactions": [{ "id": "y1", "cleared": "cleared" }]
        })))
        .respond_with(ResponseTemplate::new(209).set_body_json(json!({
            "data": { "transaction_ids": ["y1"], "transactions": [], "server_knowledge": 44 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entry = LedgerTransaction {
        id: "y1".to_string(),
        account_id: "acct-1".to_string(),
        date: date("2025-01-16"),
        amount: Milliunits::new(-250_000),
        payee_name: Some("Netonnet".to_string()),
        cleared: ClearedStatus::Uncleared,
        import_id: None,
        transfer_account_id: None,
        deleted: false,
    };
    client(&server)
        .update_transactions(&[entry.marked_cleared()])
        .await?;
    Ok(())
}

#[tokio::test]
async fn write_failure_surfaces_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/budgets/budget-1/transactions"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error":{"id":"429","name":"too_many_requests","detail":"Too many requests"}}"#,
        ))
        .mount(&server)
        .await;

    let err = client(&server).create_transactions(&[]).await.unwrap_err();
    assert!(err.to_string().contains("429"));
    assert!(err.to_string().contains("too_many_requests"));
}
