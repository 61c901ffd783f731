use std::time::Duration;

// Physical naming conventions
pub const TABLE_PREFIX: &str = "o_";
pub const SEQUENCE_SUFFIX: &str = "_seq";
pub const REVERSE_LINK_SUFFIX: &str = "_set";
pub const GENERIC_TYPE_COLUMN_SUFFIX: &str = "__type";
pub const GENERIC_KEY_COLUMN_SUFFIX: &str = "__key";
pub const UNIQUE_CONSTRAINT_SUFFIX: &str = "_key";
pub const FOREIGN_KEY_PREFIX: &str = "fk_";
pub const LINK_OBJECT_SEPARATOR: &str = "__";

// Generated migration ids
pub const MIGRATION_ID_LENGTH: usize = 8;

// Configuration file name
pub const CONFIG_FILENAME: &str = "metamig.yaml";

// Catalog files
pub const CATALOG_FILE_EXTENSION: &str = "json";

// Database connection
pub const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
