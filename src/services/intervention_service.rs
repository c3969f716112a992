use tracing::info;

use crate::database::manager::is_foreign_key_violation;
use crate::database::models::{Intervention, InterventionInput, InterventionListing};
use crate::database::{DatabaseError, DbPool};

/// A complete intervention as entered from the dashboard form
#[derive(Debug, Clone)]
pub struct InterventionFields {
    pub bon_id: i64,
    pub du: String,
    pub au: String,
    pub matricule: String,
    pub prenoms: String,
    pub binome: Option<String>,
    pub heure_debut: String,
    pub heure_fin: String,
    pub total_heures: Option<String>,
    pub description_detail: String,
    pub observation_detail: Option<String>,
}

pub struct InterventionService {
    pool: DbPool,
}

impl InterventionService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Every intervention with the fields of its bon, latest first
    pub async fn list(&self) -> Result<Vec<InterventionListing>, DatabaseError> {
        let rows = sqlx::query_as::<_, InterventionListing>(
            r#"
            SELECT
                i.id,
                i.bon_id,
                b.numero_bon,
                i.du,
                i.au,
                i.matricule,
                i.prenoms,
                i.binome,
                i.heure_debut,
                i.heure_fin,
                b.designation_travaux AS designation,
                i.description_detail AS description,
                i.observation_detail AS observations,
                b.client,
                b.affaire,
                b.adresse
            FROM interventions i
            JOIN bonsdetravail b ON b.id = i.bon_id
            ORDER BY i.du DESC, i.heure_debut DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, fields: &InterventionFields) -> Result<Intervention, DatabaseError> {
        let created = sqlx::query_as::<_, Intervention>(
            r#"
            INSERT INTO interventions (
                bon_id, du, au, matricule, prenoms, binome, heure_debut, heure_fin,
                total_heures, description_detail, observation_detail
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(fields.bon_id)
        .bind(&fields.du)
        .bind(&fields.au)
        .bind(&fields.matricule)
        .bind(&fields.prenoms)
        .bind(&fields.binome)
        .bind(&fields.heure_debut)
        .bind(&fields.heure_fin)
        .bind(&fields.total_heures)
        .bind(&fields.description_detail)
        .bind(&fields.observation_detail)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unknown_bon(e, fields.bon_id))?;

        info!("Created intervention {} on work order {}", created.id, created.bon_id);
        Ok(created)
    }

    /// Replaces every column of the intervention
    pub async fn replace(&self, id: i64, fields: &InterventionFields) -> Result<Intervention, DatabaseError> {
        let updated = sqlx::query_as::<_, Intervention>(
            r#"
            UPDATE interventions SET
                bon_id = ?, du = ?, au = ?, matricule = ?, prenoms = ?, binome = ?,
                heure_debut = ?, heure_fin = ?, total_heures = ?,
                description_detail = ?, observation_detail = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(fields.bon_id)
        .bind(&fields.du)
        .bind(&fields.au)
        .bind(&fields.matricule)
        .bind(&fields.prenoms)
        .bind(&fields.binome)
        .bind(&fields.heure_debut)
        .bind(&fields.heure_fin)
        .bind(&fields.total_heures)
        .bind(&fields.description_detail)
        .bind(&fields.observation_detail)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unknown_bon(e, fields.bon_id))?
        .ok_or_else(|| DatabaseError::NotFound(format!("Intervention {} not found", id)))?;

        info!("Updated intervention {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM interventions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Intervention {} not found", id)));
        }
        info!("Deleted intervention {}", id);
        Ok(())
    }

    /// Upserts the batch by id, all or nothing
    pub async fn sync(&self, interventions: &[InterventionInput]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for i in interventions {
            sqlx::query(
                r#"
                INSERT INTO interventions (
                    id, bon_id, du, au, matricule, prenoms, binome, heure_debut, heure_fin,
                    total_heures, description_detail, observation_detail
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    bon_id = excluded.bon_id,
                    du = excluded.du,
                    au = excluded.au,
                    matricule = excluded.matricule,
                    prenoms = excluded.prenoms,
                    binome = excluded.binome,
                    heure_debut = excluded.heure_debut,
                    heure_fin = excluded.heure_fin,
                    total_heures = excluded.total_heures,
                    description_detail = excluded.description_detail,
                    observation_detail = excluded.observation_detail
                "#,
            )
            .bind(i.id)
            .bind(i.bon_id)
            .bind(&i.du)
            .bind(&i.au)
            .bind(&i.matricule)
            .bind(&i.prenoms)
            .bind(&i.binome)
            .bind(&i.heure_debut)
            .bind(&i.heure_fin)
            .bind(&i.total_heures)
            .bind(&i.description_detail)
            .bind(&i.observation_detail)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Synchronized {} interventions", interventions.len());
        Ok(interventions.len())
    }
}

fn unknown_bon(err: sqlx::Error, bon_id: i64) -> DatabaseError {
    if is_foreign_key_violation(&err) {
        DatabaseError::NotFound(format!("Work order {} not found", bon_id))
    } else {
        DatabaseError::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn fields(bon_id: i64, du: &str) -> InterventionFields {
        InterventionFields {
            bon_id,
            du: du.into(),
            au: du.into(),
            matricule: "T01".into(),
            prenoms: "Ali".into(),
            binome: Some("Moussa".into()),
            heure_debut: "08:00".into(),
            heure_fin: "12:30".into(),
            total_heures: None,
            description_detail: "Nettoyage filtres".into(),
            observation_detail: None,
        }
    }

    #[tokio::test]
    async fn list_joins_bon_fields_latest_first() {
        let ctx = TestContext::new().await.unwrap();
        let bon_id = ctx.insert_bon(10, "CIE").await.unwrap();
        let service = InterventionService::new(ctx.pool.clone());
        service.create(&fields(bon_id, "2024-01-01")).await.unwrap();
        service.create(&fields(bon_id, "2024-03-01")).await.unwrap();

        let rows = service.list().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].du.as_deref(), Some("2024-03-01"));
        assert_eq!(rows[0].numero_bon, 10);
        assert_eq!(rows[0].client.as_deref(), Some("CIE"));
        assert_eq!(rows[0].designation.as_deref(), Some("Maintenance"));
    }

    #[tokio::test]
    async fn create_on_unknown_bon_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let service = InterventionService::new(ctx.pool.clone());
        let err = service.create(&fields(999, "2024-01-01")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn replace_and_delete_missing_rows() {
        let ctx = TestContext::new().await.unwrap();
        let bon_id = ctx.insert_bon(11, "CIE").await.unwrap();
        let service = InterventionService::new(ctx.pool.clone());

        let err = service.replace(555, &fields(bon_id, "2024-01-01")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
        assert!(matches!(service.delete(555).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn sync_is_all_or_nothing() {
        let ctx = TestContext::new().await.unwrap();
        let bon_id = ctx.insert_bon(12, "CIE").await.unwrap();
        let service = InterventionService::new(ctx.pool.clone());

        let good = InterventionInput {
            bon_id: Some(bon_id),
            matricule: Some("T01".into()),
            ..Default::default()
        };
        let orphan = InterventionInput {
            bon_id: Some(4040),
            ..Default::default()
        };
        assert!(service.sync(&[good.clone(), orphan]).await.is_err());
        assert!(service.list().await.unwrap().is_empty());

        assert_eq!(service.sync(&[good]).await.unwrap(), 1);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }
}
