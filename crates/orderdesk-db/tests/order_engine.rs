//! Order engine, catalog and receipt storage against an in-memory database
//! (and a file-backed one where several connections matter).

use orderdesk_core::input::{NewOrder, NewProduct, NewRecipient, OrderPatch, ProductPatch};
use orderdesk_core::pricing::ItemRequest;
use orderdesk_core::{CoreError, Currency, OrderStatus, ReceiptStatus, ReceiptVariant};
use orderdesk_db::{Database, DbConfig, DbError, NewReceipt, ReportRange};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn product(db: &Database, name: &str, purchase: i64, sale: i64) -> String {
    db.products()
        .create(&NewProduct {
            name: name.to_string(),
            purchase_price_cents: purchase,
            sale_price_cents: sale,
            currency: Currency::Uah,
        })
        .await
        .unwrap()
        .id
}

async fn recipient(db: &Database, name: &str) -> String {
    db.recipients()
        .create(&NewRecipient {
            name: name.to_string(),
            email: Some("buyer@example.com".to_string()),
            phone: None,
            address: Some("Kyiv".to_string()),
        })
        .await
        .unwrap()
        .id
}

fn items(lines: &[(&str, i64)]) -> Vec<ItemRequest> {
    lines
        .iter()
        .map(|(id, qty)| ItemRequest {
            product_id: id.to_string(),
            qty: *qty,
        })
        .collect()
}

fn assert_domain(err: DbError, check: impl Fn(&CoreError) -> bool) {
    match err {
        DbError::Domain(core) => assert!(check(&core), "unexpected domain error: {core}"),
        other => panic!("expected domain error, got {other:?}"),
    }
}

fn receipt_for(order_id: &str, number: &str) -> NewReceipt {
    let id = uuid::Uuid::new_v4().to_string();
    NewReceipt {
        pdf_url: format!("http://localhost:3000/api/v1/receipts/{id}/pdf"),
        pdf_path: format!("/tmp/receipt-{number}.pdf"),
        hash: "00".repeat(32),
        id,
        order_id: order_id.to_string(),
        number: number.to_string(),
        variant: ReceiptVariant::Default,
    }
}

#[tokio::test]
async fn create_order_prices_and_snapshots_items() {
    let db = setup().await;
    let a = product(&db, "A", 5000, 10000).await;
    let b = product(&db, "B", 1000, 2500).await;
    let r = recipient(&db, "Olena").await;

    let details = db
        .orders()
        .create(&NewOrder {
            recipient_id: r.clone(),
            items: items(&[(&a, 2), (&b, 2)]),
        })
        .await
        .unwrap();

    assert_eq!(details.order.status, OrderStatus::Draft);
    assert_eq!(details.order.subtotal_cents, 25000);
    assert_eq!(details.order.total_cents, 25000);
    assert_eq!(details.items.len(), 2);
    assert_eq!(details.items[0].product_name, "A");
    assert_eq!(details.items[0].line_total_cents, 20000);
    assert_eq!(details.recipient.id, r);
    assert!(details.receipts.is_empty());

    // Later price changes leave the snapshot alone
    db.products()
        .update(
            &a,
            &ProductPatch {
                name: Some("A renamed".into()),
                sale_price_cents: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let reloaded = db.orders().find_one(&details.order.id).await.unwrap();
    assert_eq!(reloaded.items[0].product_name, "A");
    assert_eq!(reloaded.items[0].unit_price_cents, 10000);
    assert_eq!(reloaded.order.total_cents, 25000);
}

#[tokio::test]
async fn create_order_rejects_unknown_references() {
    let db = setup().await;
    let a = product(&db, "A", 100, 200).await;
    let r = recipient(&db, "Olena").await;

    let err = db
        .orders()
        .create(&NewOrder {
            recipient_id: "missing".into(),
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::RecipientNotFound(_)));

    let err = db
        .orders()
        .create(&NewOrder {
            recipient_id: r,
            items: items(&[(&a, 1), ("missing", 1)]),
        })
        .await
        .unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::ProductsNotFound));

    let page = db.orders().find_all(0, 10, None).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn update_replaces_items_and_recomputes_totals() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let b = product(&db, "B", 100, 300).await;
    let r1 = recipient(&db, "First").await;
    let r2 = recipient(&db, "Second").await;

    let order = db
        .orders()
        .create(&NewOrder {
            recipient_id: r1,
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap();

    let updated = db
        .orders()
        .update(
            &order.order.id,
            &OrderPatch {
                recipient_id: Some(r2.clone()),
                items: Some(items(&[(&b, 3)])),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.order.recipient_id, r2);
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].product_id, b);
    assert_eq!(updated.order.subtotal_cents, 900);
    assert_eq!(updated.order.total_cents, 900);
}

#[tokio::test]
async fn status_transitions_follow_lifecycle() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;
    let id = db
        .orders()
        .create(&NewOrder {
            recipient_id: r,
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap()
        .order
        .id;

    let confirmed = db.orders().confirm(&id).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let err = db.orders().confirm(&id).await.unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::InvalidOrderStatus { .. }));

    let err = db
        .orders()
        .update(
            &id,
            &OrderPatch {
                items: Some(items(&[(&a, 5)])),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::InvalidOrderStatus { .. }));

    let cancelled = db.orders().cancel(&id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let err = db.orders().cancel(&id).await.unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::OrderAlreadyCancelled));
    assert_eq!(err_message(&db, &id).await, "Order already cancelled");
}

async fn err_message(db: &Database, id: &str) -> String {
    db.orders().cancel(id).await.unwrap_err().to_string()
}

#[tokio::test]
async fn find_all_paginates_newest_first() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;

    let mut ids = Vec::new();
    for qty in 1..=3 {
        let details = db
            .orders()
            .create(&NewOrder {
                recipient_id: r.clone(),
                items: items(&[(&a, qty)]),
            })
            .await
            .unwrap();
        ids.push(details.order.id);
    }
    db.orders().confirm(&ids[0]).await.unwrap();

    let page = db.orders().find_all(0, 2, None).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.limit, 2);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].order.id, ids[2]);
    assert_eq!(page.data[1].order.id, ids[1]);

    let rest = db.orders().find_all(2, 2, None).await.unwrap();
    assert_eq!(rest.data.len(), 1);
    assert_eq!(rest.data[0].order.id, ids[0]);

    let confirmed = db
        .orders()
        .find_all(0, 10, Some(OrderStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(confirmed.total, 1);
    assert_eq!(confirmed.data[0].order.id, ids[0]);

    assert!(db.orders().find_all(0, 0, None).await.is_err());
    assert!(db.orders().find_all(0, 101, None).await.is_err());
}

#[tokio::test]
async fn product_delete_rules() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let b = product(&db, "B", 100, 500).await;
    let r = recipient(&db, "Olena").await;

    let draft = db
        .orders()
        .create(&NewOrder {
            recipient_id: r.clone(),
            items: items(&[(&a, 1), (&b, 2)]),
        })
        .await
        .unwrap();

    let confirmed = db
        .orders()
        .create(&NewOrder {
            recipient_id: r.clone(),
            items: items(&[(&b, 1)]),
        })
        .await
        .unwrap();
    db.orders().confirm(&confirmed.order.id).await.unwrap();

    let err = db.products().delete(&b).await.unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::ProductInUse(_)));

    db.products().delete(&a).await.unwrap();
    assert!(db.products().get_by_id(&a).await.unwrap().is_none());

    let draft = db.orders().find_one(&draft.order.id).await.unwrap();
    assert_eq!(draft.items.len(), 1);
    assert_eq!(draft.order.subtotal_cents, 1000);
    assert_eq!(draft.order.total_cents, 1000);
}

#[tokio::test]
async fn recipient_with_orders_cannot_be_deleted() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let busy = recipient(&db, "Busy").await;
    let idle = recipient(&db, "Idle").await;

    let order = db
        .orders()
        .create(&NewOrder {
            recipient_id: busy.clone(),
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap();
    db.orders().cancel(&order.order.id).await.unwrap();

    let err = db.recipients().delete(&busy).await.unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::RecipientHasOrders(_)));

    db.recipients().delete(&idle).await.unwrap();
    assert!(db.recipients().get_by_id(&idle).await.unwrap().is_none());
}

#[tokio::test]
async fn receipt_counter_is_monotonic_per_year() {
    let db = setup().await;
    let receipts = db.receipts();

    assert_eq!(receipts.next_sequence(2026).await.unwrap(), 1);
    assert_eq!(receipts.next_sequence(2026).await.unwrap(), 2);
    assert_eq!(receipts.next_sequence(2027).await.unwrap(), 1);
    assert_eq!(receipts.next_sequence(2026).await.unwrap(), 3);
}

#[tokio::test]
async fn receipts_need_a_confirmed_order() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;
    let order = db
        .orders()
        .create(&NewOrder {
            recipient_id: r,
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap();

    let err = db
        .receipts()
        .insert_with_retention(&receipt_for(&order.order.id, "2026-000001"), 10)
        .await
        .unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::InvalidOrderStatus { .. }));
}

async fn file_database(dir: &tempfile::TempDir) -> Database {
    Database::new(DbConfig::new(dir.path().join("orderdesk.db")).max_connections(8))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_receipts_on_file_database_leave_one_live() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = file_database(&dir).await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;
    let order = db
        .orders()
        .create(&NewOrder {
            recipient_id: r,
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap();
    db.orders().confirm(&order.order.id).await.unwrap();

    let handles: Vec<_> = (1..=8)
        .map(|n| {
            let db = db.clone();
            let receipt = receipt_for(&order.order.id, &format!("2026-{n:06}"));
            tokio::spawn(async move { db.receipts().insert_with_retention(&receipt, 10).await })
        })
        .collect();

    let mut stored = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => stored += 1,
            Err(err) => assert_domain(err, |e| matches!(e, CoreError::ReceiptExists(_))),
        }
    }
    assert_eq!(stored, 1);

    let live: Vec<_> = db
        .receipts()
        .list_for_order(&order.order.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.status == ReceiptStatus::Generated)
        .collect();
    assert_eq!(live.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_counter_on_file_database_hands_out_distinct_values() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = file_database(&dir).await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.receipts().next_sequence(2026).await })
        })
        .collect();

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap().unwrap());
    }
    values.sort_unstable();
    assert_eq!(values, (1..=16).collect::<Vec<i64>>());
}

#[tokio::test]
async fn one_live_receipt_per_order() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;
    let order = db
        .orders()
        .create(&NewOrder {
            recipient_id: r,
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap();
    db.orders().confirm(&order.order.id).await.unwrap();

    let first = db
        .receipts()
        .insert_with_retention(&receipt_for(&order.order.id, "2026-000001"), 10)
        .await
        .unwrap()
        .receipt;
    assert_eq!(first.status, ReceiptStatus::Generated);

    let err = db
        .receipts()
        .insert_with_retention(&receipt_for(&order.order.id, "2026-000002"), 10)
        .await
        .unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::ReceiptExists(_)));

    let voided = db.receipts().void(&first.id).await.unwrap();
    assert_eq!(voided.status, ReceiptStatus::Void);
    assert!(db.receipts().void(&first.id).await.is_err());

    db.receipts()
        .insert_with_retention(&receipt_for(&order.order.id, "2026-000003"), 10)
        .await
        .unwrap();

    let details = db.orders().find_one(&order.order.id).await.unwrap();
    assert_eq!(details.receipts.len(), 2);

    let listed = db.receipts().list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].receipt.number, "2026-000003");
    assert_eq!(listed[0].recipient_name, "Olena");
    assert_eq!(listed[0].order_status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn insert_prunes_oldest_live_receipts() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;

    let mut numbers = Vec::new();
    for n in 1..=4 {
        let order = db
            .orders()
            .create(&NewOrder {
                recipient_id: r.clone(),
                items: items(&[(&a, 1)]),
            })
            .await
            .unwrap();
        db.orders().confirm(&order.order.id).await.unwrap();

        let number = format!("2026-00000{n}");
        let stored = db
            .receipts()
            .insert_with_retention(&receipt_for(&order.order.id, &number), 3)
            .await
            .unwrap();
        numbers.push(number);

        if n < 4 {
            assert!(stored.pruned.is_empty());
        } else {
            // 3 live at the ceiling: keep the newest 2, then add one
            assert_eq!(stored.pruned.len(), 1);
            assert_eq!(stored.pruned[0].number, numbers[0]);
        }
    }

    let remaining: Vec<String> = db
        .receipts()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.receipt.number)
        .collect();
    assert_eq!(remaining, vec![numbers[3].clone(), numbers[2].clone(), numbers[1].clone()]);
}

#[tokio::test]
async fn delete_order_removes_items_and_receipts() {
    let db = setup().await;
    let a = product(&db, "A", 100, 1000).await;
    let r = recipient(&db, "Olena").await;
    let order = db
        .orders()
        .create(&NewOrder {
            recipient_id: r,
            items: items(&[(&a, 1)]),
        })
        .await
        .unwrap();
    db.orders().confirm(&order.order.id).await.unwrap();
    let receipt = db
        .receipts()
        .insert_with_retention(&receipt_for(&order.order.id, "2026-000001"), 10)
        .await
        .unwrap()
        .receipt;

    db.orders().delete(&order.order.id).await.unwrap();

    assert!(db.orders().get_by_id(&order.order.id).await.unwrap().is_none());
    assert!(db.receipts().get_by_id(&receipt.id).await.unwrap().is_none());

    let err = db.orders().delete(&order.order.id).await.unwrap_err();
    assert_domain(err, |e| matches!(e, CoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn revenue_counts_confirmed_orders_only() {
    let db = setup().await;
    let a = product(&db, "A", 5000, 10000).await;
    let b = product(&db, "B", 1000, 2500).await;
    let r1 = recipient(&db, "First").await;
    let r2 = recipient(&db, "Second").await;

    assert_eq!(
        db.reports().total_revenue(ReportRange::default()).await.unwrap().revenue_cents,
        0
    );

    let confirmed = db
        .orders()
        .create(&NewOrder {
            recipient_id: r1.clone(),
            items: items(&[(&a, 2), (&b, 2)]),
        })
        .await
        .unwrap();
    db.orders().confirm(&confirmed.order.id).await.unwrap();

    // Drafts and cancelled orders never count
    db.orders()
        .create(&NewOrder {
            recipient_id: r2.clone(),
            items: items(&[(&a, 10)]),
        })
        .await
        .unwrap();
    let cancelled = db
        .orders()
        .create(&NewOrder {
            recipient_id: r2,
            items: items(&[(&a, 10)]),
        })
        .await
        .unwrap();
    db.orders().confirm(&cancelled.order.id).await.unwrap();
    db.orders().cancel(&cancelled.order.id).await.unwrap();

    let by_product = db
        .reports()
        .revenue_by_product(ReportRange::default())
        .await
        .unwrap();
    assert_eq!(by_product.len(), 2);
    assert_eq!(by_product[0].product_id, a);
    assert_eq!(by_product[0].revenue_cents, 10000);
    assert_eq!(by_product[0].quantity_sold, 2);
    assert_eq!(by_product[1].revenue_cents, 3000);

    let by_recipient = db
        .reports()
        .revenue_by_recipient(ReportRange::default())
        .await
        .unwrap();
    assert_eq!(by_recipient.len(), 1);
    assert_eq!(by_recipient[0].recipient_id, r1);
    assert_eq!(by_recipient[0].revenue_cents, 13000);
    assert_eq!(by_recipient[0].order_count, 1);

    let total = db.reports().total_revenue(ReportRange::default()).await.unwrap();
    assert_eq!(total.revenue_cents, 13000);
    assert_eq!(total.order_count, 1);

    let future = ReportRange {
        from: Some(chrono::Utc::now() + chrono::Duration::days(1)),
        to: None,
    };
    assert_eq!(db.reports().total_revenue(future).await.unwrap().revenue_cents, 0);
}

#[tokio::test]
async fn duplicate_user_email_is_a_unique_violation() {
    let db = setup().await;
    let users = db.users();

    let user = users
        .create("Admin@Example.com", "hash", Some("Ada"), None)
        .await
        .unwrap();
    assert_eq!(user.email, "admin@example.com");

    let err = users
        .create("admin@example.com", "hash", None, None)
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_on("users.email"));

    let found = users.find_by_email("ADMIN@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.profile().first_name.as_deref(), Some("Ada"));
}
