use tracing::info;

use crate::database::manager::is_foreign_key_violation;
use crate::database::models::{Observation, ObservationInput};
use crate::database::{DatabaseError, DbPool, UpdateBuilder};

pub struct ObservationService {
    pool: DbPool,
}

impl ObservationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Observation>, DatabaseError> {
        let rows = sqlx::query_as::<_, Observation>("SELECT * FROM observations ORDER BY date DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Observation, DatabaseError> {
        sqlx::query_as::<_, Observation>("SELECT * FROM observations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Observation {} not found", id)))
    }

    pub async fn create(&self, input: &ObservationInput) -> Result<Observation, DatabaseError> {
        let created = sqlx::query_as::<_, Observation>(
            r#"
            INSERT INTO observations (
                bon_id, tool_box_details, tool_box_responsable, rapport_incident,
                suivi_dechets_details, suivi_dechets_responsable, hsse, environnement,
                date, observateur, type, description, gravite, statut, chantier
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(input.bon_id)
        .bind(&input.tool_box_details)
        .bind(&input.tool_box_responsable)
        .bind(&input.rapport_incident)
        .bind(&input.suivi_dechets_details)
        .bind(&input.suivi_dechets_responsable)
        .bind(&input.hsse)
        .bind(&input.environnement)
        .bind(&input.date)
        .bind(&input.observateur)
        .bind(&input.kind)
        .bind(&input.description)
        .bind(&input.gravite)
        .bind(&input.statut)
        .bind(&input.chantier)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unknown_bon(e, input.bon_id))?;

        info!("Recorded observation {}", created.id);
        Ok(created)
    }

    /// Updates the non-blank fields and returns the stored row
    pub async fn update(&self, id: i64, input: ObservationInput) -> Result<Observation, DatabaseError> {
        let bon_id = input.bon_id;
        let builder = Self::changes(input);
        if builder.is_empty() {
            return Err(DatabaseError::QueryError("No field to update".to_string()));
        }

        let result = builder
            .execute(id, &self.pool)
            .await
            .map_err(|e| unknown_bon(e, bon_id))?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Observation {} not found", id)));
        }

        info!("Updated observation {}", id);
        self.get(id).await
    }

    /// Columns an update body would change; empty when nothing usable was sent
    pub fn changes(input: ObservationInput) -> UpdateBuilder {
        UpdateBuilder::new("observations")
            .set("bon_id", input.bon_id)
            .set_text("tool_box_details", input.tool_box_details)
            .set_text("tool_box_responsable", input.tool_box_responsable)
            .set_text("rapport_incident", input.rapport_incident)
            .set_text("suivi_dechets_details", input.suivi_dechets_details)
            .set_text("suivi_dechets_responsable", input.suivi_dechets_responsable)
            .set_text("hsse", input.hsse)
            .set_text("environnement", input.environnement)
            .set_text("date", input.date)
            .set_text("observateur", input.observateur)
            .set_text("type", input.kind)
            .set_text("description", input.description)
            .set_text("gravite", input.gravite)
            .set_text("statut", input.statut)
            .set_text("chantier", input.chantier)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM observations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Observation {} not found", id)));
        }
        info!("Deleted observation {}", id);
        Ok(())
    }
}

fn unknown_bon(err: sqlx::Error, bon_id: Option<i64>) -> DatabaseError {
    match bon_id {
        Some(bon_id) if is_foreign_key_violation(&err) => {
            DatabaseError::NotFound(format!("Work order {} not found", bon_id))
        }
        _ => DatabaseError::Sqlx(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn input(date: &str, kind: &str) -> ObservationInput {
        ObservationInput {
            date: Some(date.into()),
            observateur: Some("Kone".into()),
            kind: Some(kind.into()),
            description: Some("Casque absent".into()),
            gravite: Some("Moyenne".into()),
            statut: Some("Non traitée".into()),
            chantier: Some("Cocody".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn list_is_latest_first() {
        let ctx = TestContext::new().await.unwrap();
        let service = ObservationService::new(ctx.pool.clone());
        service.create(&input("2024-01-05", "EPI")).await.unwrap();
        service.create(&input("2024-04-05", "Chute")).await.unwrap();

        let rows = service.list().await.unwrap();
        assert_eq!(rows[0].kind.as_deref(), Some("Chute"));
        assert_eq!(rows[1].kind.as_deref(), Some("EPI"));
    }

    #[tokio::test]
    async fn update_ignores_blank_fields() {
        let ctx = TestContext::new().await.unwrap();
        let service = ObservationService::new(ctx.pool.clone());
        let created = service.create(&input("2024-01-05", "EPI")).await.unwrap();

        let updated = service
            .update(
                created.id,
                ObservationInput {
                    statut: Some("Traitée".into()),
                    description: Some("".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.statut.as_deref(), Some("Traitée"));
        assert_eq!(updated.description.as_deref(), Some("Casque absent"));
    }

    #[test]
    fn blank_only_update_has_no_changes() {
        let changes = ObservationService::changes(ObservationInput {
            chantier: Some("   ".into()),
            ..Default::default()
        });
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn missing_observation_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let service = ObservationService::new(ctx.pool.clone());
        assert!(matches!(service.delete(31).await, Err(DatabaseError::NotFound(_))));
        assert!(matches!(
            service.update(31, input("2024-01-01", "EPI")).await,
            Err(DatabaseError::NotFound(_))
        ));
    }
}
