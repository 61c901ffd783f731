use crate::helpers::*;
use anyhow::Result;
use metamig::catalog::{CatalogSyncer, Field, FieldType, FileCatalogSyncer, ObjectDescription};
use metamig::db::{Database, MemoryDatabase};
use metamig::error::{ErrorCode, MigrationError, error_code};
use metamig::migration::{MigrationManager, OperationDescription};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[tokio::test]
async fn test_create_object_runs_ddl_and_records_history() -> Result<()> {
    let manager = manager();
    manager.apply(create("m1", user()), false).await?;

    let executed = manager.database().executed();
    assert!(executed[0].starts_with("CREATE TABLE \"o_user\""));

    let record = manager.find("m1").await?;
    assert_eq!(record.apply_to, "user");
    assert!(record.depends_on.is_empty());
    assert_eq!(record.meta_state, Some(object(&manager, "user")?));
    Ok(())
}

#[tokio::test]
async fn test_applying_twice_is_rejected() -> Result<()> {
    let manager = manager();
    manager.apply(create("m1", user()), false).await?;

    let before = snapshot(&manager)?;
    let executed = manager.database().executed();

    let err = manager.apply(create("m1", user()), false).await.unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::AlreadyApplied));
    assert_eq!(manager.history(None).await?.len(), 1);
    assert_eq!(snapshot(&manager)?, before);
    assert_eq!(manager.database().executed(), executed);
    Ok(())
}

#[tokio::test]
async fn test_field_changes_follow_the_chain_of_parents() -> Result<()> {
    let manager = with_user_and_post().await?;

    manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![
                    update_field("title", Field::new("caption", FieldType::String).optional()),
                    add_field(Field::new("score", FieldType::Number).optional()),
                    add_action("notify"),
                ],
            ),
            false,
        )
        .await?;

    let post = object(&manager, "post")?;
    assert!(post.find_field("title").is_none());
    assert!(post.find_field("caption").is_some_and(|f| f.optional));
    assert!(post.find_field("score").is_some());
    assert!(post.find_action("notify").is_some());

    let executed = manager.database().executed();
    assert_eq!(
        executed,
        vec![
            "ALTER TABLE \"o_post\" ALTER COLUMN \"title\" DROP NOT NULL;",
            "ALTER TABLE \"o_post\" RENAME \"title\" TO \"caption\";",
            "ALTER TABLE \"o_post\" ADD COLUMN \"score\" numeric;",
        ]
    );

    // A sibling built on the same parent no longer fits
    let err = manager
        .apply(migration("m4", "post", Some("m2"), vec![remove_field("score")]), false)
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::ParentsChanged));
    Ok(())
}

#[tokio::test]
async fn test_failed_statement_leaves_catalog_and_history_untouched() -> Result<()> {
    let manager = manager();
    manager.apply(create("m1", user()), false).await?;
    let before = snapshot(&manager)?;

    manager.database().fail_on("CREATE TABLE \"o_post\"");
    let err = manager.apply(create("m2", post()), false).await.unwrap_err();

    match err.downcast_ref::<MigrationError>() {
        Some(MigrationError::Ddl { object, .. }) => assert_eq!(object, "o_post"),
        other => panic!("expected a DDL error, got {:?}", other),
    }
    // The reverse link cascaded onto user is undone as well
    assert_eq!(snapshot(&manager)?, before);
    assert!(manager.database().find_history("m2").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_link_to_unknown_object_is_rejected() -> Result<()> {
    let manager = manager();
    let err = manager.apply(create("m1", post()), false).await.unwrap_err();

    assert_eq!(error_code(&err), Some(ErrorCode::ObjectNotFound));
    assert!(manager.catalog().list()?.is_empty());
    assert!(manager.database().executed().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_object_name_outside_identifier_rule_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let manager = MigrationManager::new(
        FileCatalogSyncer::new(dir.path().join("catalog"))?,
        MemoryDatabase::new(),
    );
    let mut escaped = user();
    escaped.name = "../escaped".to_string();

    let err = manager.apply(create("m1", escaped), false).await.unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::InvalidDescription));
    assert!(!dir.path().join("escaped.json").exists());
    assert!(manager.catalog().list()?.is_empty());
    assert!(manager.database().executed().is_empty());
    assert!(manager.database().find_history("m1").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_fake_apply_updates_catalog_only() -> Result<()> {
    let manager = manager();
    manager.apply(create("m1", user()), true).await?;
    manager
        .apply(
            migration(
                "m2",
                "user",
                Some("m1"),
                vec![add_field(Field::new("email", FieldType::String).optional())],
            ),
            true,
        )
        .await?;

    assert!(manager.database().executed().is_empty());
    assert!(object(&manager, "user")?.find_field("email").is_some());
    assert_eq!(manager.history(Some("user")).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rename_moves_history_to_new_name() -> Result<()> {
    let manager = with_user_and_post().await?;
    let mut renamed = post();
    renamed.name = "article".to_string();

    manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![OperationDescription::RenameObject { object: renamed }],
            ),
            false,
        )
        .await?;

    assert!(manager.catalog().get("post")?.is_none());
    assert!(manager.catalog().get("article")?.is_some());
    assert_eq!(
        manager.database().executed(),
        vec!["ALTER TABLE \"o_post\" RENAME TO \"o_article\";"]
    );

    let latest = manager.database().latest_history("article").await?;
    assert_eq!(latest.map(|r| r.id), Some("m3".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_delete_records_previous_state() -> Result<()> {
    let manager = with_user_and_post().await?;
    let stored: ObjectDescription = object(&manager, "post")?;

    manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![OperationDescription::DeleteObject {
                    object: stored.clone(),
                }],
            ),
            false,
        )
        .await?;

    assert!(manager.catalog().get("post")?.is_none());
    assert_eq!(manager.database().executed(), vec!["DROP TABLE \"o_post\" RESTRICT;"]);

    let record = manager.find("m3").await?;
    assert_eq!(record.apply_to, "post");
    assert_eq!(record.previous_state, Some(stored));
    assert!(record.meta_state.is_none());
    Ok(())
}
