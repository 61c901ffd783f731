use crate::constants::DB_ACQUIRE_TIMEOUT;
use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Mask password in database URL for display
pub fn mask_url_password(url: &str) -> String {
    let Some((protocol, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    // user:pass@host
    if let Some((user_info, host_and_path)) = rest.split_once('@')
        && let Some((username, _)) = user_info.split_once(':')
    {
        return format!("{}://{}:***@{}", protocol, username, host_and_path);
    }

    url.to_string()
}

/// Connect with a short acquire timeout and an error naming the masked URL.
///
/// `label` describes the database role and is included in error messages.
pub async fn connect_to_database(url: &str, label: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("Failed to connect to {} at {}", label, mask_url_password(url)))
}
