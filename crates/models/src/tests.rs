//! Database-backed tests. They need `DATABASE_URL` and are skipped when
//! `SKIP_DB_TESTS` is set or the database is unreachable.
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{client::{self, ClientFields, ClientFilter, FlagMatch}, coach, db, errors::ModelError};

async fn db_or_skip() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return None; }
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

fn fields(coach_id: i32) -> ClientFields {
    ClientFields {
        mail_address: Some(format!("client_{}@example.com", Uuid::new_v4())),
        password: Some("S3curePass!".into()),
        name: Some("Ola".into()),
        last_name: Some("Kowalska".into()),
        coach_id: Some(coach_id),
        ..Default::default()
    }
}

#[tokio::test]
async fn client_insert_update_delete_roundtrip() -> anyhow::Result<()> {
    let Some(db) = db_or_skip().await else { return Ok(()) };
    let c = coach::create(&db, "Coach Models").await?;

    let created = client::insert(&db, &fields(c.id)).await?;
    assert!(created.id > 0);
    assert!(!created.is_active);
    assert!(created.is_pending);

    let patch = ClientFields { is_active: Some(true), ..Default::default() };
    let updated = client::update(&db, created.clone(), &patch).await?;
    assert!(updated.is_active);
    assert_eq!(updated.mail_address, created.mail_address);
    assert!(updated.updated_at >= created.updated_at);

    assert!(client::delete(&db, created.id).await?);
    assert!(client::find(&db, created.id).await?.is_none());
    assert!(!client::delete(&db, created.id).await?);
    Ok(())
}

#[tokio::test]
async fn duplicate_mail_address_is_a_validation_error() -> anyhow::Result<()> {
    let Some(db) = db_or_skip().await else { return Ok(()) };
    let c = coach::create(&db, "Coach Dup").await?;
    let first = fields(c.id);
    let created = client::insert(&db, &first).await?;

    let mut second = fields(c.id);
    second.mail_address = first.mail_address.clone();
    match client::insert(&db, &second).await {
        Err(ModelError::Validation(errors)) => {
            assert_eq!(errors.get("mail_address"), Some(&[client::TAKEN.to_string()][..]));
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    client::delete(&db, created.id).await?;
    Ok(())
}

#[tokio::test]
async fn unknown_coach_is_rejected() -> anyhow::Result<()> {
    let Some(db) = db_or_skip().await else { return Ok(()) };
    match client::insert(&db, &fields(i32::MAX)).await {
        Err(ModelError::Validation(errors)) => assert!(errors.get("coach").is_some()),
        other => panic!("expected validation error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn scan_orders_by_updated_at_and_filters() -> anyhow::Result<()> {
    let Some(db) = db_or_skip().await else { return Ok(()) };
    let c = coach::create(&db, "Coach Scan").await?;
    let a = client::insert(&db, &fields(c.id)).await?;
    let b = client::insert(&db, &fields(c.id)).await?;
    let a = client::update(&db, a, &ClientFields { is_active: Some(true), ..Default::default() }).await?;

    let all = client::scan(&db, ClientFilter::default()).await?;
    for pair in all.windows(2) {
        assert!(pair[0].updated_at >= pair[1].updated_at);
    }

    let active = client::scan(&db, ClientFilter { is_active: Some(true.into()), ..Default::default() }).await?;
    assert!(active.iter().all(|m| m.is_active));
    assert!(active.iter().any(|m| m.id == a.id));
    assert!(!active.iter().any(|m| m.id == b.id));

    // a blank filter value compares against NULL
    let blank = client::scan(&db, ClientFilter { is_active: Some(FlagMatch::Blank), ..Default::default() }).await?;
    assert!(blank.is_empty());

    client::delete(&db, a.id).await?;
    client::delete(&db, b.id).await?;
    Ok(())
}
