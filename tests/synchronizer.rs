//! Synchronizer against mocked collaborators

use std::sync::Arc;

use cartsync::{
    AddToCart, CartSnapshot, CartSynchronizer, GatewayError, LineItem, Metadata, Product,
    RemoveOutcome, SyncError, Variant,
    gateway::MockCartGateway,
    synchronizer::{MockCartNotifier, Notice},
};
use jiff::Timestamp;
use mockall::{Sequence, predicate::eq};
use rusty_money::iso;
use testresult::TestResult;

fn line(id: &str, variant_id: &str, quantity: u32, unit_price: u64) -> Arc<LineItem> {
    let total = unit_price * u64::from(quantity);

    Arc::new(LineItem {
        id: id.to_string(),
        variant_id: variant_id.to_string(),
        product_id: format!("prod_{variant_id}"),
        title: variant_id.to_string(),
        thumbnail: None,
        quantity,
        unit_price,
        total,
        original_total: total,
        metadata: Metadata::new(),
    })
}

fn cart(version: i64, line_items: Vec<Arc<LineItem>>) -> CartSnapshot {
    let item_subtotal = line_items.iter().map(|line| line.total).sum();

    CartSnapshot {
        id: "cart_42".to_string(),
        currency: iso::EUR,
        line_items,
        item_subtotal,
        subtotal: item_subtotal,
        shipping_subtotal: 0,
        tax_total: 0,
        total: item_subtotal,
        updated_at: Timestamp::from_second(1_750_000_000 + version).ok(),
    }
}

fn scarf() -> AddToCart {
    AddToCart::new(
        Product::new("prod_scarf", "Scarf"),
        Variant::new("scarf", "Wool").with_price(2_500, iso::EUR),
        1,
    )
}

#[tokio::test]
async fn add_sends_request_then_shows_the_refetched_cart() -> TestResult {
    let initial = cart(0, vec![line("li_1", "hat", 1, 1_000)]);
    let after_add = cart(1, vec![line("li_1", "hat", 1, 1_000), line("li_2", "scarf", 1, 2_500)]);

    let mut sequence = Sequence::new();
    let mut gateway = MockCartGateway::new();

    let response = after_add.clone();
    gateway
        .expect_add_line_item()
        .withf(|request| {
            request.variant_id == "scarf"
                && request.quantity == 1
                && request.country_code == "fr"
                && !request.idempotency_key.as_str().is_empty()
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(move |_| Ok(Some(response.clone())));

    let refetched = after_add.clone();
    gateway
        .expect_fetch_cart()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(move || Ok(Some(refetched.clone())));

    let mut notifier = MockCartNotifier::new();
    notifier
        .expect_notify()
        .with(eq(Notice::Success("Item added to cart".to_string())))
        .times(1)
        .return_const(());

    let sync = CartSynchronizer::builder(Arc::new(gateway))
        .initial_cart(initial)
        .notifier(Arc::new(notifier))
        .build();

    let handle = sync.optimistic_add(scarf().with_country_code("fr"));

    let optimistic = sync.cart().ok_or("no cart")?;
    assert_eq!(optimistic.line_items.len(), 2, "scarf line shown optimistically");
    assert_eq!(optimistic.item_subtotal, 3_500);

    handle.await?;

    assert_eq!(sync.cart().as_deref(), Some(&after_add));
    assert_eq!(sync.last_error(), None);

    Ok(())
}

#[tokio::test]
async fn rejected_add_restores_the_previous_cart() -> TestResult {
    let initial = cart(0, vec![line("li_1", "hat", 1, 1_000)]);

    let mut gateway = MockCartGateway::new();
    gateway.expect_add_line_item().times(1).returning(|_| {
        Err(GatewayError::Rejected {
            status: Some(422),
            message: "Variant not available in region".to_string(),
        })
    });
    gateway.expect_fetch_cart().never();

    let mut notifier = MockCartNotifier::new();
    notifier
        .expect_notify()
        .with(eq(Notice::Error(
            "Variant not available in region".to_string(),
        )))
        .times(1)
        .return_const(());

    let sync = CartSynchronizer::builder(Arc::new(gateway))
        .initial_cart(initial.clone())
        .notifier(Arc::new(notifier))
        .build();

    let outcome = sync.optimistic_add(scarf()).await;

    assert!(
        matches!(outcome, Err(SyncError::Gateway(GatewayError::Rejected { .. }))),
        "caller sees the gateway failure"
    );
    assert_eq!(sync.cart().as_deref(), Some(&initial));
    assert_eq!(
        sync.last_error().as_deref(),
        Some("Variant not available in region")
    );

    Ok(())
}

#[tokio::test]
async fn remove_requests_the_line_then_shows_the_refetched_cart() -> TestResult {
    let initial = cart(0, vec![line("li_1", "hat", 1, 1_000), line("li_2", "scarf", 1, 2_500)]);
    let after_remove = cart(1, vec![line("li_1", "hat", 1, 1_000)]);

    let mut sequence = Sequence::new();
    let mut gateway = MockCartGateway::new();

    gateway
        .expect_remove_line_item()
        .with(eq("li_2".to_string()))
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));

    let refetched = after_remove.clone();
    gateway
        .expect_fetch_cart()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(move || Ok(Some(refetched.clone())));

    let sync = CartSynchronizer::builder(Arc::new(gateway))
        .initial_cart(initial)
        .build();

    let handle = sync.optimistic_remove("li_2");

    assert!(sync.is_removing("li_2"), "line flagged while removal is in flight");

    assert_eq!(handle.await?, RemoveOutcome::Removed);
    assert_eq!(sync.cart().as_deref(), Some(&after_remove));
    assert!(!sync.is_removing("li_2"), "flag cleared once settled");

    Ok(())
}

#[tokio::test]
async fn removes_are_sent_in_call_order() -> TestResult {
    let initial = cart(0, vec![line("li_1", "hat", 1, 1_000), line("li_2", "scarf", 1, 2_500)]);

    let mut sequence = Sequence::new();
    let mut gateway = MockCartGateway::new();

    for line_id in ["li_2", "li_1"] {
        gateway
            .expect_remove_line_item()
            .with(eq(line_id.to_string()))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        gateway
            .expect_fetch_cart()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Ok(None));
    }

    let sync = CartSynchronizer::builder(Arc::new(gateway))
        .initial_cart(initial)
        .build();

    let first = sync.optimistic_remove("li_2");
    let second = sync.optimistic_remove("li_1");

    assert_eq!(second.await?, RemoveOutcome::Removed);
    assert_eq!(first.await?, RemoveOutcome::Removed);
    assert_eq!(sync.cart(), None, "server reported no cart");

    Ok(())
}

#[tokio::test]
async fn reload_reports_unavailable_service() {
    let mut gateway = MockCartGateway::new();
    gateway
        .expect_fetch_cart()
        .times(1)
        .returning(|| Err(GatewayError::Unavailable("connection refused".to_string())));

    let sync = CartSynchronizer::builder(Arc::new(gateway)).build();

    sync.reload_from_server().await;

    assert_eq!(sync.cart(), None);
    assert_eq!(
        sync.last_error().as_deref(),
        Some("cart service unavailable: connection refused")
    );
    assert!(!sync.is_syncing(), "syncing cleared after a failed reload");
}
