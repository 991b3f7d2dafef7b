//! Integration test verifying that invocations produce an `invoke` span,
//! carrying the function name and caller organization, with the handler's
//! span nested inside it.

#![allow(clippy::expect_used)]

mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use beatchain_authn::testutil::{admin, creator};
use common::*;
use tracing::{
    Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer: span names, parents and recorded fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct RecordedSpan {
    name: String,
    parent: Option<String>,
    fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<HashMap<u64, RecordedSpan>>>,
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else { return };
        let mut recorded = RecordedSpan {
            name: span.name().to_owned(),
            parent: span.parent().map(|p| p.name().to_owned()),
            ..RecordedSpan::default()
        };
        attrs.record(&mut FieldVisitor(&mut recorded.fields));
        self.spans.lock().expect("lock poisoned").insert(id.into_u64(), recorded);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = self.spans.lock().expect("lock poisoned").get_mut(&id.into_u64()) {
            values.record(&mut FieldVisitor(&mut span.fields));
        }
    }
}

impl SpanCollector {
    fn named(&self, name: &str) -> Vec<RecordedSpan> {
        self.spans
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invocation_span_wraps_handler_span() {
    let engine = bootstrapped_engine().await;

    let collector = SpanCollector::default();
    let subscriber = tracing_subscriber::registry().with(collector.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    call(&engine, admin(), "TransferFunds", &["1", "5"]).await.expect("transfer");

    let invoke = collector.named("invoke");
    assert_eq!(invoke.len(), 1, "expected one invoke span");
    assert_eq!(invoke[0].fields.get("function").map(String::as_str), Some("TransferFunds"));
    assert_eq!(invoke[0].fields.get("org").map(String::as_str), Some("BeatchainMSP"));

    let handler = collector.named("transfer_funds");
    assert_eq!(handler.len(), 1, "expected one handler span");
    assert_eq!(handler[0].parent.as_deref(), Some("invoke"));

    assert!(!collector.named("authenticate").is_empty(), "missing authenticate span");
    assert!(!collector.named("commit").is_empty(), "missing commit span");
}

#[tokio::test]
async fn each_operation_has_its_own_handler_span() {
    let engine = bootstrapped_engine().await;

    let collector = SpanCollector::default();
    let subscriber = tracing_subscriber::registry().with(collector.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    call(&engine, creator(CREATOR), "CollectPayment", &[]).await.expect("collect");
    call(&engine, admin(), "ListBankAccounts", &[]).await.expect("list");

    for name in ["collect_payment", "list_bank_accounts"] {
        let spans = collector.named(name);
        assert_eq!(spans.len(), 1, "missing span '{name}'");
        assert!(spans[0].fields.contains_key("org"), "span '{name}' lacks org");
    }
}
