use std::sync::Arc;
use verde_ledger::{FeeConfig, LedgerError, MemoryStorage, VerdeLedger};
use verde_types::{AccountAddress, CertificateMetadata, CreditAmount};

fn addr(byte: u8) -> AccountAddress {
    AccountAddress::from_bytes([byte; 32])
}

fn units(n: u64) -> CreditAmount {
    CreditAmount::from_base_units(n)
}

fn meta(name: &str) -> CertificateMetadata {
    CertificateMetadata::new(name, "VRD", "https://verde.example/cert.json")
}

#[tokio::test]
async fn test_governance_initializes_exactly_once() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);

    ledger.initialize(admin).await.unwrap();

    let err = ledger.initialize(admin).await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyInitialized));

    // Nothing is admin-gated before initialization on a fresh ledger
    let fresh = VerdeLedger::in_memory();
    assert!(fresh
        .issue_minter_certificate(admin, addr(2), meta("Minter"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_quota_lifecycle_scenario() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);

    ledger.initialize(admin).await.unwrap();

    // Fresh certificate carries no quota
    let cert = ledger
        .issue_minter_certificate(admin, minter, meta("Acme Forestry"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, cert, "VCC", "Verde Carbon Credit", "", 6, false, None)
        .await
        .unwrap();

    let err = ledger
        .mint(minter, cert, token, units(1), minter)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::QuotaExceeded { .. }));

    ledger.set_quota(admin, cert, units(1000)).await.unwrap();

    ledger
        .mint(minter, cert, token, units(300), minter)
        .await
        .unwrap();
    assert_eq!(
        ledger.certificates.minter(cert).await.unwrap().quota_remaining,
        units(700)
    );

    let err = ledger
        .mint(minter, cert, token, units(800), minter)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::QuotaExceeded { .. }));

    // The failed mint changed nothing
    assert_eq!(
        ledger.certificates.minter(cert).await.unwrap().quota_remaining,
        units(700)
    );
    assert_eq!(ledger.total_supply(token).await.unwrap(), units(300));
    assert_eq!(ledger.balance_of(token, minter).await.unwrap(), units(300));
}

#[tokio::test]
async fn test_closed_transfer_requires_consumer_certificate() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);
    let consumer = addr(3);

    ledger.initialize(admin).await.unwrap();
    let cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, cert, "VCC", "Verde", "", 6, true, None)
        .await
        .unwrap();
    ledger.set_quota(admin, cert, units(10_000)).await.unwrap();
    ledger
        .mint(minter, cert, token, units(10_000), minter)
        .await
        .unwrap();

    // Receiver lacks a certificate: rejected, zero balance moves
    let err = ledger
        .transfer(minter, consumer, token, units(500))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CapabilityRequired(_)));
    assert_eq!(ledger.balance_of(token, consumer).await.unwrap(), units(0));
    assert_eq!(ledger.balance_of(token, minter).await.unwrap(), units(10_000));

    // After issuance the identical transfer succeeds
    ledger
        .issue_consumer_certificate(admin, consumer, meta("Consumer"))
        .await
        .unwrap();
    let outcome = ledger
        .transfer(minter, consumer, token, units(500))
        .await
        .unwrap();
    assert_eq!(outcome.net_amount, units(500));
    assert_eq!(ledger.balance_of(token, consumer).await.unwrap(), units(500));
    assert_eq!(ledger.balance_of(token, minter).await.unwrap(), units(9_500));
}

#[tokio::test]
async fn test_uncertified_sender_rejected() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);
    let consumer = addr(3);
    let stranger = addr(4);

    ledger.initialize(admin).await.unwrap();
    let cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, cert, "VCC", "Verde", "", 6, true, None)
        .await
        .unwrap();
    ledger.set_quota(admin, cert, units(1_000)).await.unwrap();
    ledger
        .issue_consumer_certificate(admin, consumer, meta("Consumer"))
        .await
        .unwrap();
    ledger
        .mint(minter, cert, token, units(1_000), consumer)
        .await
        .unwrap();

    // A stranger with no balance and no certificate cannot send
    let err = ledger
        .transfer(stranger, consumer, token, units(10))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CapabilityRequired(_)));
}

#[tokio::test]
async fn test_fee_withholding() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);
    let consumer = addr(3);

    ledger.initialize(admin).await.unwrap();
    let cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(
            admin,
            cert,
            "VCC",
            "Verde",
            "",
            6,
            true,
            Some(FeeConfig {
                basis_points: 100,
                max_fee_units: units(100),
            }),
        )
        .await
        .unwrap();
    ledger.set_quota(admin, cert, units(100_000)).await.unwrap();
    ledger
        .issue_consumer_certificate(admin, consumer, meta("Consumer"))
        .await
        .unwrap();
    ledger
        .mint(minter, cert, token, units(100_000), minter)
        .await
        .unwrap();

    // 1% of 20000 is 200, capped at 100; receiver gets 19900
    let outcome = ledger
        .transfer(minter, consumer, token, units(20_000))
        .await
        .unwrap();
    assert_eq!(outcome.fee, units(100));
    assert_eq!(outcome.net_amount, units(19_900));

    assert_eq!(ledger.balance_of(token, minter).await.unwrap(), units(80_000));
    assert_eq!(
        ledger.balance_of(token, consumer).await.unwrap(),
        units(19_900)
    );
    assert_eq!(ledger.collected_fees(token).await.unwrap(), units(100));
}

#[tokio::test]
async fn test_retirement_burns_and_certifies() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);
    let consumer = addr(3);

    ledger.initialize(admin).await.unwrap();
    let minter_cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, minter_cert, "VCC", "Verde", "", 6, true, None)
        .await
        .unwrap();
    ledger
        .set_quota(admin, minter_cert, units(5_000))
        .await
        .unwrap();
    let consumer_cert = ledger
        .issue_consumer_certificate(admin, consumer, meta("Consumer"))
        .await
        .unwrap();
    ledger
        .mint(minter, minter_cert, token, units(5_000), consumer)
        .await
        .unwrap();

    let supply_before = ledger.total_supply(token).await.unwrap();
    let serial = ledger
        .retire(consumer, consumer_cert, token, units(1_200))
        .await
        .unwrap();

    assert_eq!(
        ledger.total_supply(token).await.unwrap(),
        supply_before.saturating_sub(units(1_200))
    );
    assert_eq!(
        ledger.balance_of(token, consumer).await.unwrap(),
        units(3_800)
    );

    let retirement = ledger.retirement.retirement(serial).await.unwrap();
    assert_eq!(retirement.amount_retired, units(1_200));
    assert_eq!(retirement.consumer, consumer);
    assert_eq!(retirement.source_token, token);

    // A second retirement gets a distinct serial, even for the same amount
    let serial2 = ledger
        .retire(consumer, consumer_cert, token, units(1_200))
        .await
        .unwrap();
    assert_ne!(serial, serial2);
    assert_eq!(ledger.retirement.retirement_count().await, 2);
}

#[tokio::test]
async fn test_retire_beyond_balance_fails() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);
    let consumer = addr(3);

    ledger.initialize(admin).await.unwrap();
    let minter_cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, minter_cert, "VCC", "Verde", "", 6, true, None)
        .await
        .unwrap();
    ledger
        .set_quota(admin, minter_cert, units(100))
        .await
        .unwrap();
    let consumer_cert = ledger
        .issue_consumer_certificate(admin, consumer, meta("Consumer"))
        .await
        .unwrap();
    ledger
        .mint(minter, minter_cert, token, units(100), consumer)
        .await
        .unwrap();

    let err = ledger
        .retire(consumer, consumer_cert, token, units(101))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    // Nothing burned, nothing certified
    assert_eq!(ledger.balance_of(token, consumer).await.unwrap(), units(100));
    assert_eq!(ledger.total_supply(token).await.unwrap(), units(100));
    assert_eq!(ledger.retirement.retirement_count().await, 0);
}

#[tokio::test]
async fn test_open_definition_transfers_freely() {
    let ledger = VerdeLedger::in_memory();
    let admin = addr(1);
    let minter = addr(2);
    let anyone = addr(9);

    ledger.initialize(admin).await.unwrap();
    let cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, cert, "OCC", "Open Credit", "", 6, false, None)
        .await
        .unwrap();
    ledger.set_quota(admin, cert, units(1_000)).await.unwrap();
    ledger
        .mint(minter, cert, token, units(1_000), minter)
        .await
        .unwrap();

    // No certificate needed on either side of an open definition
    let outcome = ledger
        .transfer(minter, anyone, token, units(400))
        .await
        .unwrap();
    assert_eq!(outcome.fee, units(0));
    assert_eq!(ledger.balance_of(token, anyone).await.unwrap(), units(400));
}

#[tokio::test]
async fn test_mint_works_with_custom_storage() {
    // The facade accepts any LedgerStorage implementation
    let storage = Arc::new(MemoryStorage::new());
    let ledger = VerdeLedger::new(storage.clone());
    let admin = addr(1);
    let minter = addr(2);

    ledger.initialize(admin).await.unwrap();
    let cert = ledger
        .issue_minter_certificate(admin, minter, meta("Minter"))
        .await
        .unwrap();
    let token = ledger
        .create_token_definition(admin, cert, "VCC", "Verde", "", 6, false, None)
        .await
        .unwrap();
    ledger.set_quota(admin, cert, units(50)).await.unwrap();
    ledger
        .mint(minter, cert, token, units(50), minter)
        .await
        .unwrap();

    use verde_ledger::LedgerStorage;
    assert_eq!(
        storage.get_balance(token, minter).await.unwrap(),
        units(50)
    );
}
