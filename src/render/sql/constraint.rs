use crate::ddl::Ifk;
use crate::render::quote_ident;

/// `fk_.. FOREIGN KEY ("from") REFERENCES "table" ("col") ON DELETE policy`
pub fn render_foreign_key_clause(fk: &Ifk) -> String {
    format!(
        "{} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
        fk.constraint_name(),
        quote_ident(&fk.from_column),
        quote_ident(&fk.to_table),
        quote_ident(&fk.to_column),
        fk.on_delete.as_sql()
    )
}
