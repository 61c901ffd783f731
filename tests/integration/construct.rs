use crate::helpers::*;
use anyhow::Result;
use metamig::catalog::{CatalogSyncer, Field, FieldType};
use metamig::error::{ErrorCode, error_code};
use metamig::migration::{MigrationField, MigrationObjectDescription, OperationDescription};
use pretty_assertions::assert_eq;

fn kinds(operations: &[OperationDescription]) -> Vec<&'static str> {
    operations.iter().map(|op| op.kind()).collect()
}

#[tokio::test]
async fn test_constructed_creation_applies() -> Result<()> {
    let manager = manager();
    let desired = MigrationObjectDescription::from(&user());

    let migration = manager.construct(None, Some(&desired)).await?;
    assert_eq!(kinds(&migration.operations), vec!["createObject"]);
    assert_eq!(migration.apply_to, "");
    assert!(!migration.id.is_empty());

    manager.apply(migration, false).await?;
    assert!(manager.catalog().get("user")?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_constructed_change_depends_on_latest_migration() -> Result<()> {
    let manager = with_user_and_post().await?;
    let mut desired = MigrationObjectDescription::from(&object(&manager, "post")?);
    desired
        .fields
        .push(MigrationField::new(Field::new("score", FieldType::Number).optional()));

    let migration = manager.construct(None, Some(&desired)).await?;
    assert_eq!(kinds(&migration.operations), vec!["addField"]);
    assert_eq!(migration.apply_to, "post");
    assert_eq!(migration.depends_on, vec!["m2".to_string()]);

    manager.apply(migration, false).await?;

    // Nothing left to do once applied
    let err = manager.construct(None, Some(&desired)).await.unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::NoChangesDetected));
    Ok(())
}

#[tokio::test]
async fn test_constructed_rename_follows_previous_name() -> Result<()> {
    let manager = with_user_and_post().await?;
    let mut desired = MigrationObjectDescription::from(&object(&manager, "post")?);
    desired.previous_name = "post".to_string();
    desired.name = "article".to_string();

    let migration = manager.construct(None, Some(&desired)).await?;
    assert_eq!(kinds(&migration.operations), vec!["renameObject"]);

    manager.apply(migration, false).await?;
    assert!(manager.catalog().get("article")?.is_some());
    assert!(object(&manager, "user")?.find_field("article_set").is_some());
    Ok(())
}

#[tokio::test]
async fn test_constructed_deletion() -> Result<()> {
    let manager = with_user_and_post().await?;

    let migration = manager.construct(Some("post"), None).await?;
    assert_eq!(kinds(&migration.operations), vec!["deleteObject"]);
    assert_eq!(migration.depends_on, vec!["m2".to_string()]);

    manager.apply(migration, false).await?;
    assert!(manager.catalog().get("post")?.is_none());
    assert!(object(&manager, "user")?.find_field("post_set").is_none());
    Ok(())
}

#[tokio::test]
async fn test_constructing_nothing_fails() {
    let manager = manager();
    let err = manager.construct(Some("ghost"), None).await.unwrap_err();
    assert_eq!(error_code(&err), Some(ErrorCode::NoChangesDetected));
}
