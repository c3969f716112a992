use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult};
use sqlx::{Executor, Sqlite};

/// Builds `UPDATE <table> SET ... WHERE id = ?` from the fields a client
/// actually sent. Column names are compile-time constants; values are bound.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table_name: &'static str,
    assignments: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    pub fn new(table_name: &'static str) -> Self {
        Self {
            table_name,
            assignments: Vec::new(),
        }
    }

    /// Assign the column when a value is present
    pub fn set<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.assignments.push((column, v.into()));
        }
        self
    }

    /// Like `set` for trimmed text; blank strings count as absent
    pub fn set_text(self, column: &'static str, value: Option<String>) -> Self {
        self.set(column, value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn to_sql(&self) -> String {
        let sets = self
            .assignments
            .iter()
            .map(|(column, _)| format!("\"{}\" = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE \"{}\" SET {} WHERE id = ?", self.table_name, sets)
    }

    pub async fn execute<'e, E>(self, id: i64, executor: E) -> Result<SqliteQueryResult, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = self.to_sql();
        let mut q = sqlx::query(&sql);
        for (_, value) in self.assignments {
            q = bind_param(q, value);
        }
        q.bind(id).execute(executor).await
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    v: Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        other => q.bind(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(builder: &UpdateBuilder) -> Vec<&'static str> {
        builder.assignments.iter().map(|(c, _)| *c).collect()
    }

    #[test]
    fn only_present_fields_are_assigned() {
        let builder = UpdateBuilder::new("bonsdetravail")
            .set("numero_bon", Some(42))
            .set::<String>("client", None)
            .set("est_valide", Some(true));

        assert_eq!(columns(&builder), vec!["numero_bon", "est_valide"]);
        assert_eq!(
            builder.to_sql(),
            "UPDATE \"bonsdetravail\" SET \"numero_bon\" = ?, \"est_valide\" = ? WHERE id = ?"
        );
    }

    #[test]
    fn blank_text_is_skipped() {
        let builder = UpdateBuilder::new("users")
            .set_text("nom", Some("   ".to_string()))
            .set_text("prenoms", Some(" Awa ".to_string()));
        assert_eq!(columns(&builder), vec!["prenoms"]);
        assert_eq!(builder.assignments[0].1, Value::from("Awa"));
    }

    #[test]
    fn empty_builder_reports_empty() {
        assert!(UpdateBuilder::new("observations").is_empty());
    }
}
