//! Shared fixtures for the engine integration tests.
//!
//! The fixture mirrors the bootstrap layout: platform account `1`, app
//! developer `1111`, customer `2222`, creator `3333` and product `4444`, each
//! party holding its own account (same id) with a balance of $1000.

#![allow(dead_code, unused_macros, clippy::expect_used, clippy::panic)]

use beatchain_authn::CallerIdentity;
use beatchain_storage::{CompositeKey, MemoryBackend, StorageBackend};
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use beatchain_engine::{
    Engine, EngineConfig, Invocation, Result,
    records::{BankAccount, Contract, CustomerRecord, Product, Record},
    types::{AccountId, AppDevId, CreatorId, CustomerId, ProductId},
};

/// Platform account id.
pub const ADMIN_ACCOUNT: u64 = 1;
/// Fixture app developer (and its account).
pub const APP_DEV: u64 = 1111;
/// Fixture customer (and its account).
pub const CUSTOMER: u64 = 2222;
/// Fixture creator (and its account).
pub const CREATOR: u64 = 3333;
/// Fixture product.
pub const PRODUCT: u64 = 4444;

/// Ten-argument bootstrap: platform, app developer and customer.
pub const BASE_ARGS: [&str; 10] =
    ["1000", "1111", "1111", "0.1", "1000", "2222", "2222", "1.00", "2020-06-01", "1000"];

/// Twenty-three-argument bootstrap: adds creator, product and an accepted
/// contract at $0.01 per stream with three unsettled listens.
pub const FULL_ARGS: [&str; 23] = [
    "1000",
    "1111",
    "1111",
    "0.1",
    "1000",
    "2222",
    "2222",
    "1.00",
    "2020-06-01",
    "1000",
    "3333",
    "3333",
    "1000",
    "4444",
    "Test Product",
    "5",
    "3",
    "7",
    "4",
    "0",
    "true",
    "0.01",
    "true",
];

/// 2020-05-15T12:00:00Z, two weeks before the fixture customer's due date.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 5, 15, 12, 0, 0).single().expect("valid fixture timestamp")
}

/// Engine over an empty [`MemoryBackend`] with default configuration.
pub fn empty_engine() -> Engine<MemoryBackend> {
    Engine::new(MemoryBackend::new(), EngineConfig::default()).expect("default config is valid")
}

/// Engine bootstrapped with [`FULL_ARGS`].
///
/// # Panics
///
/// Panics if the bootstrap fails.
pub async fn bootstrapped_engine() -> Engine<MemoryBackend> {
    let engine = empty_engine();
    engine.initialize(&FULL_ARGS).await.expect("fixture bootstrap failed");
    engine
}

/// Invokes `function` as `identity` at [`fixed_now`].
pub async fn call<B: StorageBackend>(
    engine: &Engine<B>,
    identity: CallerIdentity,
    function: &str,
    args: &[&str],
) -> Result<Bytes> {
    let invocation = Invocation::new(function, fixed_now())
        .with_identity(identity)
        .with_args(args.iter().copied());
    engine.invoke(&invocation).await
}

/// Reads a committed record straight from the backend.
///
/// # Panics
///
/// Panics if the read fails or the stored value does not decode.
pub async fn read_record<R: Record, B: StorageBackend>(
    engine: &Engine<B>,
    key: &CompositeKey,
) -> Option<R> {
    let bytes = engine.backend().get(&key.encode()).await.expect("backend read failed");
    bytes.map(|b| serde_json::from_slice(&b).expect("stored record does not decode"))
}

/// Committed balance of an account.
///
/// # Panics
///
/// Panics if the account does not exist.
pub async fn balance<B: StorageBackend>(engine: &Engine<B>, id: u64) -> Decimal {
    read_record::<BankAccount, _>(engine, &BankAccount::key_for(AccountId::new(id)))
        .await
        .expect("bank account missing")
        .balance
}

/// Committed product record.
///
/// # Panics
///
/// Panics if the product does not exist.
pub async fn product<B: StorageBackend>(engine: &Engine<B>, id: u64) -> Product {
    read_record(engine, &Product::key_for(ProductId::new(id))).await.expect("product missing")
}

/// Committed customer record.
///
/// # Panics
///
/// Panics if the customer does not exist.
pub async fn customer<B: StorageBackend>(engine: &Engine<B>, id: u64) -> CustomerRecord {
    read_record(engine, &CustomerRecord::key_for(CustomerId::new(id)))
        .await
        .expect("customer missing")
}

/// Committed contract record, if any.
pub async fn contract<B: StorageBackend>(
    engine: &Engine<B>,
    creator: u64,
    app_dev: u64,
    product: u64,
) -> Option<Contract> {
    let key =
        Contract::key_for(CreatorId::new(creator), AppDevId::new(app_dev), ProductId::new(product));
    read_record(engine, &key).await
}

/// Parses a decimal literal.
///
/// # Panics
///
/// Panics if `raw` is not a decimal.
pub fn dec(raw: &str) -> Decimal {
    raw.parse().expect("decimal literal")
}

/// Decodes a UTF-8 invocation payload.
///
/// # Panics
///
/// Panics if the payload is not UTF-8.
pub fn text(payload: &Bytes) -> &str {
    std::str::from_utf8(payload).expect("payload is UTF-8")
}

/// Assert that an engine result is an error of the given `ErrorKind`,
/// optionally containing a message fragment.
macro_rules! assert_engine_err {
    ($result:expr, $kind:expr) => {
        match $result {
            Ok(val) => panic!("expected {:?} error, got Ok({val:?})", $kind),
            Err(e) => assert_eq!(e.kind(), $kind, "unexpected error: {e}"),
        }
    };
    ($result:expr, $kind:expr, $fragment:expr) => {
        match $result {
            Ok(val) => panic!("expected {:?} error, got Ok({val:?})", $kind),
            Err(e) => {
                assert_eq!(e.kind(), $kind, "unexpected error: {e}");
                assert!(
                    e.to_string().contains($fragment),
                    "error '{e}' does not mention '{}'",
                    $fragment
                );
            },
        }
    };
}

/// Assert that an engine result is `Ok`, returning the payload as text.
macro_rules! assert_engine_ok {
    ($result:expr) => {
        match $result {
            Ok(payload) => String::from_utf8(payload.to_vec()).expect("payload is UTF-8"),
            Err(e) => panic!("expected Ok, got EngineError: {e:?}"),
        }
    };
}
