use crate::helpers::*;
use anyhow::Result;
use metamig::catalog::{CatalogSyncer, Field, FieldType, LinkType, ObjectDescription};
use metamig::error::{ErrorCode, error_code};
use metamig::migration::OperationDescription;
use pretty_assertions::assert_eq;

fn team() -> ObjectDescription {
    ObjectDescription::new("team", "id", vec![Field::new("id", FieldType::Number)])
}

fn note() -> ObjectDescription {
    ObjectDescription::new(
        "note",
        "id",
        vec![
            Field::new("id", FieldType::Number),
            Field::new("target", FieldType::Generic).generic_to(&["user", "post"]),
        ],
    )
}

fn tag() -> ObjectDescription {
    ObjectDescription::new("tag", "id", vec![Field::new("id", FieldType::Number)])
}

fn tags() -> Field {
    Field::new("tags", FieldType::Objects).link_to("tag").optional()
}

#[tokio::test]
async fn test_inner_link_adds_reverse_field_on_target() -> Result<()> {
    let manager = with_user_and_post().await?;

    let user = object(&manager, "user")?;
    let reverse = user.find_field("post_set").expect("reverse field");
    assert_eq!(reverse.field_type, FieldType::Array);
    assert_eq!(reverse.link_type, Some(LinkType::Outer));
    assert_eq!(reverse.link_meta.as_deref(), Some("post"));
    assert_eq!(reverse.outer_link_field.as_deref(), Some("owner"));
    assert!(reverse.optional && reverse.query_mode);

    // Companion migrations are not recorded
    assert_eq!(manager.history(Some("user")).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_generic_link_adds_generic_reverse_fields() -> Result<()> {
    let manager = with_user_and_post().await?;
    manager.apply(create("m3", note()), false).await?;

    for target in ["user", "post"] {
        let reverse = object(&manager, target)?
            .find_field("note_set")
            .cloned()
            .expect("reverse field");
        assert_eq!(reverse.field_type, FieldType::Generic);
        assert_eq!(reverse.outer_link_field.as_deref(), Some("target"));
    }

    let executed = manager.database().executed();
    assert!(executed[0].contains("\"target__type\" text NOT NULL"));
    assert!(executed[0].contains("\"target__key\" text NOT NULL"));
    Ok(())
}

#[tokio::test]
async fn test_retargeting_link_moves_reverse_field() -> Result<()> {
    let manager = with_user_and_post().await?;
    manager.apply(create("m3", team()), false).await?;

    manager
        .apply(
            migration(
                "m4",
                "post",
                Some("m2"),
                vec![update_field("owner", Field::new("owner", FieldType::Object).link_to("team"))],
            ),
            false,
        )
        .await?;

    assert!(object(&manager, "user")?.find_field("post_set").is_none());
    assert!(object(&manager, "team")?.find_field("post_set").is_some());
    Ok(())
}

#[tokio::test]
async fn test_renaming_link_field_updates_reverse_field() -> Result<()> {
    let manager = with_user_and_post().await?;

    manager
        .apply(
            migration(
                "m3",
                "post",
                Some("m2"),
                vec![update_field("owner", Field::new("author", FieldType::Object).link_to("user"))],
            ),
            false,
        )
        .await?;

    let user = object(&manager, "user")?;
    let reverse = user.find_field("post_set").expect("reverse field");
    assert_eq!(reverse.outer_link_field.as_deref(), Some("author"));
    Ok(())
}

#[tokio::test]
async fn test_removing_link_field_removes_reverse_field() -> Result<()> {
    let manager = with_user_and_post().await?;

    manager
        .apply(migration("m3", "post", Some("m2"), vec![remove_field("owner")]), false)
        .await?;

    assert!(object(&manager, "user")?.find_field("post_set").is_none());
    Ok(())
}

#[tokio::test]
async fn test_explicit_outer_field_replaces_automatic_one() -> Result<()> {
    let manager = with_user_and_post().await?;

    let mut posts = Field::new("posts", FieldType::Array).optional();
    posts.link_type = Some(LinkType::Outer);
    posts.link_meta = Some("post".to_string());
    posts.outer_link_field = Some("owner".to_string());

    manager
        .apply(migration("m3", "user", Some("m1"), vec![add_field(posts)]), false)
        .await?;

    let user = object(&manager, "user")?;
    assert!(user.find_field("post_set").is_none());
    let explicit = user.find_field("posts").expect("explicit outer field");
    assert!(explicit.query_mode && explicit.retrieve_mode);
    Ok(())
}

#[tokio::test]
async fn test_generic_field_cannot_change_type() -> Result<()> {
    let manager = with_user_and_post().await?;
    manager.apply(create("m3", note()), false).await?;
    let before = snapshot(&manager)?;

    let err = manager
        .apply(
            migration(
                "m4",
                "note",
                Some("m3"),
                vec![update_field("target", Field::new("target", FieldType::String))],
            ),
            false,
        )
        .await
        .unwrap_err();

    assert_eq!(error_code(&err), Some(ErrorCode::NotImplemented));
    assert_eq!(snapshot(&manager)?, before);
    Ok(())
}

#[tokio::test]
async fn test_self_link_mirrors_onto_itself() -> Result<()> {
    let manager = manager();
    let node = ObjectDescription::new(
        "node",
        "id",
        vec![
            Field::new("id", FieldType::Number),
            Field::new("parent", FieldType::Object).link_to("node").optional(),
        ],
    );
    manager.apply(create("m1", node), false).await?;

    let stored = object(&manager, "node")?;
    let reverse = stored.find_field("node_set").expect("reverse field");
    assert_eq!(reverse.outer_link_field.as_deref(), Some("parent"));
    Ok(())
}

#[tokio::test]
async fn test_objects_field_is_stored_in_link_object() -> Result<()> {
    let manager = with_user_and_post().await?;
    manager.apply(create("m3", tag()), false).await?;
    manager.database().clear_executed();

    manager
        .apply(migration("m4", "user", Some("m1"), vec![add_field(tags())]), false)
        .await?;

    let link = object(&manager, "user__tag")?;
    assert_eq!(link.key, "id");
    for side in ["user", "tag"] {
        let field = link.find_field(side).expect("link field");
        assert_eq!(field.link_meta.as_deref(), Some(side));
        assert!(!field.optional);

        let reverse = object(&manager, side)?
            .find_field("user__tag_set")
            .cloned()
            .expect("reverse field");
        assert_eq!(reverse.outer_link_field.as_deref(), Some(side));
    }

    let executed = manager.database().executed();
    assert!(executed.iter().any(|s| s.starts_with("CREATE TABLE \"o_user__tag\"")));
    assert!(!executed.iter().any(|s| s.contains("\"tags\"")));
    assert!(manager.history(Some("user__tag")).await?.is_empty());

    manager
        .apply(migration("m5", "user", Some("m4"), vec![remove_field("tags")]), false)
        .await?;

    assert!(manager.catalog().get("user__tag")?.is_none());
    assert!(object(&manager, "user")?.find_field("user__tag_set").is_none());
    assert!(object(&manager, "tag")?.find_field("user__tag_set").is_none());
    assert!(
        manager
            .database()
            .executed()
            .contains(&"DROP TABLE \"o_user__tag\" RESTRICT;".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_link_object_follows_its_owner() -> Result<()> {
    let manager = manager();
    manager.apply(create("m1", tag()), false).await?;
    let before = snapshot(&manager)?;

    let shelf = ObjectDescription::new(
        "shelf",
        "id",
        vec![Field::new("id", FieldType::Number), tags()],
    );
    let applied = manager.apply(create("m2", shelf), false).await?;
    assert!(manager.catalog().get("shelf__tag")?.is_some());

    // Undoing the creation takes the link object with it
    manager.rollback(&applied, false).await?;
    assert_eq!(snapshot(&manager)?, before);

    manager.apply(applied.clone(), false).await?;
    let stored = object(&manager, "shelf")?;
    manager
        .apply(
            migration(
                "m3",
                "shelf",
                Some("m2"),
                vec![OperationDescription::DeleteObject { object: stored }],
            ),
            false,
        )
        .await?;
    assert_eq!(snapshot(&manager)?, before);
    Ok(())
}
