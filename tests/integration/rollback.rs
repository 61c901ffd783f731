use crate::helpers::*;
use anyhow::Result;
use metamig::catalog::{CatalogSyncer, Field, FieldType};
use metamig::db::Database;
use metamig::error::{ErrorCode, error_code};
use metamig::migration::OperationDescription;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_rollback_restores_catalog() -> Result<()> {
    let manager = with_user_and_post().await?;
    let before = snapshot(&manager)?;

    let applied = manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![
                    update_field("title", Field::new("caption", FieldType::String).optional()),
                    remove_field("owner"),
                    add_field(Field::new("score", FieldType::Number).optional()),
                    add_action("notify"),
                ],
            ),
            false,
        )
        .await?;
    assert_ne!(snapshot(&manager)?, before);

    let parent = manager.rollback(&applied, false).await?;
    assert_eq!(parent, Some("m2".to_string()));
    assert_eq!(snapshot(&manager)?, before);
    assert!(manager.database().find_history("m3").await?.is_none());

    let executed = manager.database().executed();
    assert!(executed.contains(&"ALTER TABLE \"o_post\" DROP COLUMN \"score\";".to_string()));
    assert!(executed.contains(&"ALTER TABLE \"o_post\" RENAME \"caption\" TO \"title\";".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_rollback_of_creation_drops_object() -> Result<()> {
    let manager = with_user_and_post().await?;
    let record = manager.find("m2").await?;

    assert_eq!(manager.rollback(&record.to_description(), false).await?, None);

    assert!(manager.catalog().get("post")?.is_none());
    assert_eq!(object(&manager, "user")?, {
        let mut user = user();
        user.normalize();
        user
    });
    assert_eq!(manager.database().executed(), vec!["DROP TABLE \"o_post\" RESTRICT;"]);
    Ok(())
}

#[tokio::test]
async fn test_rollback_of_deletion_recreates_object() -> Result<()> {
    let manager = with_user_and_post().await?;
    let before = snapshot(&manager)?;

    let applied = manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![OperationDescription::DeleteObject {
                    object: object(&manager, "post")?,
                }],
            ),
            false,
        )
        .await?;
    assert!(object(&manager, "user")?.find_field("post_set").is_none());

    manager.rollback(&applied, false).await?;
    assert_eq!(snapshot(&manager)?, before);
    assert!(
        manager
            .database()
            .executed()
            .last()
            .is_some_and(|sql| sql.starts_with("CREATE TABLE \"o_post\""))
    );
    Ok(())
}

#[tokio::test]
async fn test_rollback_of_rename_restores_name_and_reverse_link() -> Result<()> {
    let manager = with_user_and_post().await?;
    let before = snapshot(&manager)?;
    let mut renamed = post();
    renamed.name = "article".to_string();

    let applied = manager
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
    assert!(object(&manager, "user")?.find_field("article_set").is_some());

    manager.rollback(&applied, false).await?;
    assert_eq!(snapshot(&manager)?, before);
    Ok(())
}

#[tokio::test]
async fn test_only_latest_migration_can_be_rolled_back() -> Result<()> {
    let manager = with_user_and_post().await?;
    manager
        .apply(
            migration("m3", "post", Some("m2"), vec![add_action("notify")]),
            false,
        )
        .await?;

    let err = manager
        .rollback(&manager.find("m2").await?.to_description(), false)
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::NotLatestMigration));

    let err = manager
        .rollback(&migration("ghost", "post", None, vec![]), false)
        .await
        .unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::ObjectNotFound));
    Ok(())
}

#[tokio::test]
async fn test_fake_rollback_only_removes_history() -> Result<()> {
    let manager = with_user_and_post().await?;
    let applied = manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![add_field(Field::new("score", FieldType::Number).optional())],
            ),
            false,
        )
        .await?;
    manager.database().clear_executed();

    manager.rollback(&applied, true).await?;

    assert!(object(&manager, "post")?.find_field("score").is_some());
    assert!(manager.database().executed().is_empty());
    assert!(manager.database().find_history("m3").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rollback_uses_recorded_operations() -> Result<()> {
    let manager = with_user_and_post().await?;
    let applied = manager
        .apply(
            migration("m3", "post", Some("m2"), vec![add_action("notify")]),
            false,
        )
        .await?;

    // Same id, different operations: the recorded ones win
    let mut tampered = applied.clone();
    tampered.operations = vec![add_action("other")];
    manager.rollback(&tampered, false).await?;

    assert!(object(&manager, "post")?.find_action("notify").is_none());
    Ok(())
}

#[tokio::test]
async fn test_rollback_to_undoes_later_migrations_newest_first() -> Result<()> {
    let manager = with_user_and_post().await?;
    manager
        .apply(
            migration(
                "m3",
                "user",
                Some("m1"),
                vec![add_field(Field::new("email", FieldType::String).optional())],
            ),
            false,
        )
        .await?;
    manager
        .apply(
            migration("m4", "post", Some("m2"), vec![add_action("notify")]),
            false,
        )
        .await?;

    let rolled_back = manager.rollback_to("m1", false).await?;
    assert_eq!(rolled_back, vec!["m4", "m3", "m2"]);

    let remaining: Vec<String> = manager.history(None).await?.into_iter().map(|r| r.id).collect();
    assert_eq!(remaining, vec!["m1"]);
    assert!(manager.catalog().get("post")?.is_none());
    assert!(object(&manager, "user")?.find_field("email").is_none());
    Ok(())
}
