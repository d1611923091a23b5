use anyhow::Result;
use banksync::bank::{BankApi, SpareBank1Client};
use banksync::models::BookingStatus;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SpareBank1Client {
    SpareBank1Client::new("client-id", SecretString::from("client-secret".to_string()))
        .with_base_url(server.uri())
}

#[tokio::test]
async fn refresh_posts_form_and_returns_rotated_tokens() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"access_token":"new-access","refresh_token":"new-refresh","expires_in":600,"token_type":"Bearer"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client(&server)
        .refresh(&SecretString::from("old-refresh".to_string()))
        .await?;

    assert_eq!(grant.access_token.expose_secret(), "new-access");
    assert_eq!(grant.refresh_token.expose_secret(), "new-refresh");
    Ok(())
}

#[tokio::test]
async fn refresh_failure_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&server)
        .await;

    let err = client(&server)
        .refresh(&SecretString::from("revoked".to_string()))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("400"), "{message}");
    assert!(message.contains("invalid_grant"), "{message}");
}

#[tokio::test]
async fn fetch_transactions_sends_account_date_and_vendor_accept() -> Result<()> {
    let server = MockServer::start().await;

    let body = r#"{
        "transactions": [
            {
                "id": "t1",
                "description": "*3301 25.12 NOK 250.00 NETONNET SANDNES Kurs: 1.0000",
                "cleanedDescription": "Netonnet",
                "amount": -250.0,
                "date": 1735084800000,
                "bookingStatus": "BOOKED",
                "currencyCode": "NOK",
                "accountKey": "acct-key",
                "remoteAccountNumber": "12345678901"
            },
            {
                "id": "t2",
                "amount": -45.5,
                "date": 1735171200000,
                "bookingStatus": "PENDING"
            }
        ]
    }"#;

    Mock::given(method("GET"))
        .and(path("/personal/banking/transactions"))
        .and(query_param("accountKey", "acct-key"))
        .and(query_param("fromDate", "2024-12-20"))
        .and(header("authorization", "Bearer access-1"))
        .and(header(
            "accept",
            "application/vnd.sparebank1.v1+json;charset=utf-8",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let transactions = client(&server)
        .fetch_transactions(
            &SecretString::from("access-1".to_string()),
            "acct-key",
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        )
        .await?;

    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].cleaned_description.as_deref(), Some("Netonnet"));
    assert_eq!(transactions[0].booking_status, BookingStatus::Booked);
    assert_eq!(transactions[1].description, None);
    assert_eq!(transactions[1].booking_status, BookingStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn fetch_transactions_error_is_not_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/personal/banking/transactions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_transactions(
            &SecretString::from("access-1".to_string()),
            "acct-key",
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
    assert!(err.to_string().contains("maintenance"));
}

#[tokio::test]
async fn fetch_transactions_rejects_unparseable_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/personal/banking/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_transactions(
            &SecretString::from("access-1".to_string()),
            "acct-key",
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to parse bank API response"));
}
