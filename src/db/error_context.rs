//! Structured context for PostgreSQL statement failures.

use sqlx::postgres::PgDatabaseError;

#[derive(Debug, Clone, PartialEq)]
pub struct SqlErrorContext {
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    /// SQLSTATE, e.g. "42P01" for undefined_table
    pub code: Option<String>,
}

impl SqlErrorContext {
    /// Uses structured data from PgDatabaseError, no string parsing
    pub fn from_sqlx_error(error: &sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error()
            && let Some(pg_error) = db_error.try_downcast_ref::<PgDatabaseError>()
        {
            return Self {
                message: pg_error.message().to_string(),
                detail: pg_error.detail().map(|s| s.to_string()),
                hint: pg_error.hint().map(|s| s.to_string()),
                code: Some(pg_error.code().to_string()),
            };
        }

        Self {
            message: error.to_string(),
            detail: None,
            hint: None,
            code: None,
        }
    }

    pub fn format(&self) -> String {
        let mut msg = self.message.clone();
        if let Some(code) = &self.code {
            msg.push_str(&format!(" [{}]", code));
        }
        if let Some(detail) = &self.detail {
            msg.push_str(&format!("\n  Detail: {}", detail));
        }
        if let Some(hint) = &self.hint {
            msg.push_str(&format!("\n  Hint: {}", hint));
        }
        msg
    }
}
