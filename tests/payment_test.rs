use payment_poller::domain::error::SessionError;
use payment_poller::domain::id::{OrderId, PaymentId};
use payment_poller::domain::payment::{
    PaymentDetails, PaymentStatus, payment_uri, status_label,
};

#[test]
fn order_id_rejects_blank_input() {
    assert!(matches!(OrderId::new(""), Err(SessionError::MissingIdentifier)));
    assert!(matches!(OrderId::new(" \t"), Err(SessionError::MissingIdentifier)));
    assert!(matches!(
        OrderId::from_query(None),
        Err(SessionError::MissingIdentifier)
    ));
    assert_eq!(OrderId::from_query(Some("ORD-1")).unwrap().as_str(), "ORD-1");
}

#[test]
fn payment_id_must_be_a_uuid() {
    assert!(PaymentId::new("7f1b0c1e-2d3a-4b5c-8d9e-0f1a2b3c4d5e").is_ok());
    assert!(matches!(
        PaymentId::new("not-a-uuid"),
        Err(SessionError::Validation(_))
    ));
}

#[test]
fn paypal_statuses_map_case_insensitively() {
    use PaymentStatus::*;
    let cases = [
        ("pending", Pending),
        ("APPROVED", Confirmed),
        ("completed", Confirmed),
        ("Cancelled", Expired),
        ("failed", Failed),
    ];
    for (raw, expected) in cases {
        assert_eq!(PaymentStatus::from_paypal(raw).unwrap(), expected, "{raw}");
    }
    assert!(PaymentStatus::from_paypal("refunded").is_err());
}

#[test]
fn transaction_codes_map_to_statuses() {
    use PaymentStatus::*;
    assert_eq!(PaymentStatus::from_transaction_code(0).unwrap(), Confirmed);
    assert_eq!(PaymentStatus::from_transaction_code(1).unwrap(), Confirming);
    assert_eq!(PaymentStatus::from_transaction_code(2).unwrap(), Failed);
    assert_eq!(PaymentStatus::from_transaction_code(3).unwrap(), Failed);
    assert!(PaymentStatus::from_transaction_code(7).is_err());
}

#[test]
fn only_final_statuses_are_terminal() {
    assert!(!PaymentStatus::Pending.is_terminal());
    assert!(!PaymentStatus::Confirming.is_terminal());
    assert!(PaymentStatus::Confirmed.is_terminal());
    assert!(PaymentStatus::Expired.is_terminal());
    assert!(PaymentStatus::Failed.is_terminal());
}

#[test]
fn details_parse_from_service_json() {
    let raw = serde_json::json!({
        "paymentId": "7f1b0c1e-2d3a-4b5c-8d9e-0f1a2b3c4d5e",
        "transactionId": "b0c1e7f1-2d3a-4b5c-8d9e-0f1a2b3c4d5e",
        "amount": 0.00095,
        "currency": "BTC",
        "status": 0,
        "destinationAddress": "tb1qexampleaddress",
        "requiredConfirmations": 3,
        "expiryTime": "2025-01-10T12:30:00.123456+01:00",
        "isTestnet": true
    });
    let details = PaymentDetails::from_json(raw.clone()).unwrap();

    assert_eq!(details.currency.as_deref(), Some("BTC"));
    assert_eq!(details.required_confirmations, Some(3));
    assert_eq!(
        details.expiry_time.unwrap().to_rfc3339(),
        "2025-01-10T11:30:00.123456+00:00"
    );
    assert_eq!(details.raw, raw);
    assert_eq!(
        payment_uri(&details).as_deref(),
        Some("btc:tb1qexampleaddress?amount=0.00095")
    );
}

#[test]
fn payment_uri_needs_currency_address_and_amount() {
    let details = PaymentDetails {
        currency: Some("ETH".into()),
        ..PaymentDetails::default()
    };
    assert_eq!(payment_uri(&details), None);
}

#[test]
fn labels_follow_status() {
    assert_eq!(status_label(None, None, None), "Waiting for payment");
    assert_eq!(
        status_label(Some(PaymentStatus::Confirming), Some(1), Some(3)),
        "Confirming (1/3)"
    );
    assert_eq!(
        status_label(Some(PaymentStatus::Confirming), None, None),
        "Confirming (0/0)"
    );
    assert_eq!(
        status_label(Some(PaymentStatus::Expired), None, None),
        "Payment expired"
    );
}
