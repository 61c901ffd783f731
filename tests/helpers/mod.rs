//! Fixtures shared by the integration tests.

use anyhow::Result;
use metamig::catalog::{
    Action, CatalogSyncer, Field, FieldType, InMemoryCatalogSyncer, Method, ObjectDescription,
};
use metamig::db::MemoryDatabase;
use metamig::migration::{
    MigrationAction, MigrationDescription, MigrationField, MigrationManager, OperationDescription,
};

pub type TestManager = MigrationManager<InMemoryCatalogSyncer, MemoryDatabase>;

pub fn manager() -> TestManager {
    MigrationManager::new(InMemoryCatalogSyncer::new(), MemoryDatabase::new())
}

pub fn user() -> ObjectDescription {
    ObjectDescription::new(
        "user",
        "id",
        vec![
            Field::new("id", FieldType::Number),
            Field::new("login", FieldType::String).unique(),
        ],
    )
}

pub fn post() -> ObjectDescription {
    ObjectDescription::new(
        "post",
        "id",
        vec![
            Field::new("id", FieldType::Number),
            Field::new("title", FieldType::String),
            Field::new("owner", FieldType::Object).link_to("user"),
        ],
    )
}

/// A migration with a fixed id
pub fn migration(
    id: &str,
    apply_to: &str,
    parent: Option<&str>,
    operations: Vec<OperationDescription>,
) -> MigrationDescription {
    let mut description = MigrationDescription::new(apply_to, operations);
    description.id = id.to_string();
    description.depends_on = parent.map(str::to_string).into_iter().collect();
    description
}

pub fn create(id: &str, object: ObjectDescription) -> MigrationDescription {
    migration(id, "", None, vec![OperationDescription::CreateObject { object }])
}

pub fn add_field(field: Field) -> OperationDescription {
    OperationDescription::AddField {
        field: MigrationField::new(field),
    }
}

pub fn remove_field(name: &str) -> OperationDescription {
    OperationDescription::RemoveField {
        field: MigrationField::new(Field::new(name, FieldType::String)),
    }
}

pub fn update_field(previous_name: &str, field: Field) -> OperationDescription {
    OperationDescription::UpdateField {
        field: MigrationField::renamed(field, previous_name),
    }
}

pub fn add_action(name: &str) -> OperationDescription {
    OperationDescription::AddAction {
        action: MigrationAction::new(Action::new(name, Method::Create, "REST")),
    }
}

/// `user` created as m1, then `post` linking to it as m2
pub async fn with_user_and_post() -> Result<TestManager> {
    let manager = manager();
    manager.apply(create("m1", user()), false).await?;
    manager.apply(create("m2", post()), false).await?;
    manager.database().clear_executed();
    Ok(manager)
}

/// Catalog contents, sorted by name
pub fn snapshot(manager: &TestManager) -> Result<Vec<ObjectDescription>> {
    let mut objects = manager.catalog().list()?;
    objects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(objects)
}

pub fn object(manager: &TestManager, name: &str) -> Result<ObjectDescription> {
    manager.catalog().get_required(name)
}
