use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    EarmarkStatus, Engine, EngineError, InvoiceCategory, InvoiceUpdate, MoneyCents,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["mallory".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

async fn seeded_earmark(engine: &Engine, total_cents: i64, user: &str) -> Uuid {
    engine
        .create_earmark(
            "2025/0042",
            "3.3.90.39",
            "12345-6",
            MoneyCents::new(total_cents),
            None,
            user,
        )
        .await
        .unwrap()
}

async fn seeded_invoice(engine: &Engine, total_cents: i64, user: &str) -> Uuid {
    engine
        .create_invoice(
            InvoiceCategory::Electricity,
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            MoneyCents::new(total_cents),
            None,
            None,
            user,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn link_decrements_balance_and_records_linkage() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 24_055, "alice").await;

    let link_id = engine
        .link(invoice_id, earmark_id, MoneyCents::new(24_055), "alice")
        .await
        .unwrap();

    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.balance, MoneyCents::new(75_945));
    assert_eq!(earmark.status, EarmarkStatus::Active);

    let links = engine.links_for_invoice(invoice_id).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].id, link_id);
    assert_eq!(links[0].amount, MoneyCents::new(24_055));
}

#[tokio::test]
async fn link_to_exhaustion_flips_status() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 50_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 50_000, "alice").await;

    engine
        .link(invoice_id, earmark_id, MoneyCents::new(50_000), "alice")
        .await
        .unwrap();

    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.balance, MoneyCents::ZERO);
    assert_eq!(earmark.status, EarmarkStatus::Exhausted);

    let active = engine.active_earmarks_for_user("alice").await.unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn link_rejects_amount_above_balance() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 10_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 25_000, "alice").await;

    let result = engine
        .link(invoice_id, earmark_id, MoneyCents::new(25_000), "alice")
        .await;
    assert!(matches!(result, Err(EngineError::InsufficientBalance(_))));

    // The failed attempt must leave no trace.
    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.balance, MoneyCents::new(10_000));
    assert!(engine.links_for_invoice(invoice_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn link_rejects_non_positive_amount() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 10_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 5_000, "alice").await;

    let zero = engine
        .link(invoice_id, earmark_id, MoneyCents::ZERO, "alice")
        .await;
    assert!(matches!(zero, Err(EngineError::InvalidAmount(_))));

    let negative = engine
        .link(invoice_id, earmark_id, MoneyCents::new(-100), "alice")
        .await;
    assert!(matches!(negative, Err(EngineError::InvalidAmount(_))));
}

#[tokio::test]
async fn link_rejects_foreign_earmark() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 10_000, "mallory").await;
    let invoice_id = seeded_invoice(&engine, 5_000, "alice").await;

    let result = engine
        .link(invoice_id, earmark_id, MoneyCents::new(5_000), "alice")
        .await;
    assert!(matches!(result, Err(EngineError::Forbidden(_))));
}

#[tokio::test]
async fn unlink_restores_balance_and_removes_linkage() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 30_000, "alice").await;

    let link_id = engine
        .link(invoice_id, earmark_id, MoneyCents::new(30_000), "alice")
        .await
        .unwrap();
    engine
        .unlink(link_id, earmark_id, MoneyCents::new(30_000))
        .await
        .unwrap();

    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.balance, MoneyCents::new(100_000));
    assert_eq!(earmark.status, EarmarkStatus::Active);
    assert!(engine.links_for_invoice(invoice_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unlink_of_missing_linkage_leaves_balance_untouched() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 30_000, "alice").await;

    engine
        .link(invoice_id, earmark_id, MoneyCents::new(30_000), "alice")
        .await
        .unwrap();

    let result = engine
        .unlink(Uuid::new_v4(), earmark_id, MoneyCents::new(30_000))
        .await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));

    // The restore was rolled back together with the failed delete.
    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.balance, MoneyCents::new(70_000));
}

#[tokio::test]
async fn unlink_rejects_restore_above_total() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 30_000, "alice").await;

    let link_id = engine
        .link(invoice_id, earmark_id, MoneyCents::new(30_000), "alice")
        .await
        .unwrap();

    let result = engine
        .unlink(link_id, earmark_id, MoneyCents::new(40_000))
        .await;
    assert!(matches!(result, Err(EngineError::OverAllocation(_))));
}

#[tokio::test]
async fn conservation_holds_after_link_unlink_sequence() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 200_000, "alice").await;
    let first = seeded_invoice(&engine, 60_000, "alice").await;
    let second = seeded_invoice(&engine, 40_000, "alice").await;

    let link_a = engine
        .link(first, earmark_id, MoneyCents::new(60_000), "alice")
        .await
        .unwrap();
    engine
        .link(second, earmark_id, MoneyCents::new(40_000), "alice")
        .await
        .unwrap();
    engine
        .unlink(link_a, earmark_id, MoneyCents::new(60_000))
        .await
        .unwrap();

    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    let linked = engine.links_for_earmark(earmark_id).await.unwrap();
    let linked_sum: i64 = linked.iter().map(|l| l.amount.cents()).sum();
    assert_eq!(
        earmark.total.cents() - earmark.balance.cents(),
        linked_sum,
        "total - balance must equal the sum of live linkages"
    );
}

#[tokio::test]
async fn partial_links_complete_invoice_exactly() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 500_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 100_000, "alice").await;

    engine
        .link(invoice_id, earmark_id, MoneyCents::new(60_000), "alice")
        .await
        .unwrap();
    assert!(!engine.is_complete(invoice_id).await.unwrap());
    assert_eq!(
        engine.total_linked(invoice_id).await.unwrap(),
        MoneyCents::new(60_000)
    );

    engine
        .link(invoice_id, earmark_id, MoneyCents::new(40_000), "alice")
        .await
        .unwrap();
    assert!(engine.is_complete(invoice_id).await.unwrap());
}

#[tokio::test]
async fn one_centavo_short_is_not_complete() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 500_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 100_000, "alice").await;

    engine
        .link(invoice_id, earmark_id, MoneyCents::new(99_999), "alice")
        .await
        .unwrap();
    assert!(!engine.is_complete(invoice_id).await.unwrap());
}

#[tokio::test]
async fn adjust_balance_moves_both_directions() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;

    engine
        .adjust_balance(earmark_id, MoneyCents::new(100_000))
        .await
        .unwrap();
    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.status, EarmarkStatus::Exhausted);

    engine
        .adjust_balance(earmark_id, MoneyCents::new(-25_000))
        .await
        .unwrap();
    let earmark = engine.earmark(earmark_id, "alice").await.unwrap();
    assert_eq!(earmark.balance, MoneyCents::new(25_000));
    assert_eq!(earmark.status, EarmarkStatus::Active);
}

#[tokio::test]
async fn delete_earmark_blocked_while_linked() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 30_000, "alice").await;

    let link_id = engine
        .link(invoice_id, earmark_id, MoneyCents::new(30_000), "alice")
        .await
        .unwrap();

    let blocked = engine.delete_earmark(earmark_id, "alice").await;
    assert!(matches!(blocked, Err(EngineError::ExistingKey(_))));

    engine
        .unlink(link_id, earmark_id, MoneyCents::new(30_000))
        .await
        .unwrap();
    engine.delete_earmark(earmark_id, "alice").await.unwrap();
    assert!(matches!(
        engine.earmark(earmark_id, "alice").await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_invoice_blocked_while_linked() {
    let (engine, _db) = engine_with_db().await;
    let earmark_id = seeded_earmark(&engine, 100_000, "alice").await;
    let invoice_id = seeded_invoice(&engine, 30_000, "alice").await;

    let link_id = engine
        .link(invoice_id, earmark_id, MoneyCents::new(30_000), "alice")
        .await
        .unwrap();

    let blocked = engine.delete_invoice(invoice_id, "alice").await;
    assert!(matches!(blocked, Err(EngineError::ExistingKey(_))));

    engine
        .unlink(link_id, earmark_id, MoneyCents::new(30_000))
        .await
        .unwrap();
    engine.delete_invoice(invoice_id, "alice").await.unwrap();
}

#[tokio::test]
async fn update_invoice_keeps_extraction_snapshot() {
    let (engine, _db) = engine_with_db().await;
    let snapshot = engine::ExtractedSnapshot {
        category: Some(InvoiceCategory::Electricity),
        amount: Some(MoneyCents::new(24_055)),
        due_date: NaiveDate::from_ymd_opt(2025, 3, 15),
        confidence: 1.0,
    };
    let invoice_id = engine
        .create_invoice(
            InvoiceCategory::Electricity,
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            MoneyCents::new(24_055),
            Some("uploads/conta.pdf"),
            Some(snapshot),
            "alice",
        )
        .await
        .unwrap();

    engine
        .update_invoice(
            invoice_id,
            "alice",
            InvoiceUpdate {
                total: Some(MoneyCents::new(30_000)),
                category: Some(InvoiceCategory::Water),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let invoice = engine.invoice(invoice_id, "alice").await.unwrap();
    assert_eq!(invoice.total, MoneyCents::new(30_000));
    assert_eq!(invoice.category, InvoiceCategory::Water);
    assert_eq!(invoice.extracted, Some(snapshot));
}

#[tokio::test]
async fn invoices_for_user_sorted_by_due_date() {
    let (engine, _db) = engine_with_db().await;
    for (day, total) in [(20, 10_000), (5, 20_000), (12, 30_000)] {
        engine
            .create_invoice(
                InvoiceCategory::Water,
                NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
                MoneyCents::new(total),
                None,
                None,
                "alice",
            )
            .await
            .unwrap();
    }

    let invoices = engine.invoices_for_user("alice").await.unwrap();
    let days: Vec<u32> = invoices
        .iter()
        .map(|i| chrono::Datelike::day(&i.due_date))
        .collect();
    assert_eq!(days, vec![5, 12, 20]);
}

#[tokio::test]
async fn foreign_invoice_is_invisible() {
    let (engine, _db) = engine_with_db().await;
    let invoice_id = seeded_invoice(&engine, 10_000, "mallory").await;

    assert!(matches!(
        engine.invoice(invoice_id, "alice").await,
        Err(EngineError::NotFound(_))
    ));
    assert!(engine.invoices_for_user("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn full_report_groups_and_totals() {
    let (engine, _db) = engine_with_db().await;

    let earmark_a = engine
        .create_earmark(
            "2025/0001",
            "3.3.90.39",
            "11111-1",
            MoneyCents::new(100_000),
            None,
            "alice",
        )
        .await
        .unwrap();
    engine
        .create_earmark(
            "2025/0002",
            "3.3.90.40",
            "22222-2",
            MoneyCents::new(50_000),
            None,
            "alice",
        )
        .await
        .unwrap();

    let march = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
    let april = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let invoice_a = engine
        .create_invoice(
            InvoiceCategory::Electricity,
            march,
            MoneyCents::new(24_055),
            None,
            None,
            "alice",
        )
        .await
        .unwrap();
    engine
        .create_invoice(
            InvoiceCategory::Water,
            march,
            MoneyCents::new(10_000),
            None,
            None,
            "alice",
        )
        .await
        .unwrap();
    engine
        .create_invoice(
            InvoiceCategory::Telecom,
            april,
            MoneyCents::new(9_990),
            None,
            None,
            "alice",
        )
        .await
        .unwrap();

    engine
        .link(invoice_a, earmark_a, MoneyCents::new(24_055), "alice")
        .await
        .unwrap();

    let report = engine.full_report("alice").await.unwrap();

    assert_eq!(report.by_due_date.len(), 2);
    assert_eq!(report.by_due_date[0].due_date, march);
    assert_eq!(report.by_due_date[0].invoices.len(), 2);
    assert_eq!(report.by_due_date[0].total, MoneyCents::new(34_055));
    assert_eq!(report.by_due_date[1].due_date, april);

    assert_eq!(report.by_bank_account.len(), 2);
    assert_eq!(report.by_bank_account[0].bank_account, "11111-1");
    assert_eq!(report.by_bank_account[0].balance, MoneyCents::new(75_945));

    assert_eq!(report.invoice_total, MoneyCents::new(44_045));
    assert_eq!(report.linked_total, MoneyCents::new(24_055));
    assert_eq!(report.pending_total, MoneyCents::new(19_990));
}

#[tokio::test]
async fn create_earmark_rejects_blank_fields() {
    let (engine, _db) = engine_with_db().await;
    let result = engine
        .create_earmark(
            "  ",
            "3.3.90.39",
            "12345-6",
            MoneyCents::new(10_000),
            None,
            "alice",
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
}
