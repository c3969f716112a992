use std::collections::HashMap;

use tracing::info;

use crate::database::models::{
    export_rows, Bon, BonDetail, BonExportRow, BonInput, BonSummary, Intervention, InterventionBrief, Observation,
};
use crate::database::{DatabaseError, DbPool, UpdateBuilder};

const BON_COLUMNS: &str = "id, numero_bon, affaire, client, designation_travaux, date_recu, heure_total, \
     facturation, adresse, est_valide, cree_par_formulaire, is_synced";

/// Columns a new bon must carry
#[derive(Debug, Clone)]
pub struct NewBon {
    pub numero_bon: i64,
    pub affaire: String,
    pub client: String,
    pub designation_travaux: String,
    pub date_recu: String,
    pub facturation: String,
    pub heure_total: Option<String>,
    pub adresse: Option<String>,
    pub est_valide: bool,
    pub cree_par_formulaire: bool,
}

pub struct BonService {
    pool: DbPool,
}

impl BonService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Bons newest first, each with who worked on it
    pub async fn list(&self) -> Result<Vec<BonSummary>, DatabaseError> {
        let bons = sqlx::query_as::<_, Bon>(&format!(
            "SELECT {} FROM bonsdetravail ORDER BY id DESC",
            BON_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let briefs = sqlx::query_as::<_, (i64, Option<String>, Option<String>, Option<String>, Option<String>, Option<String>)>(
            r#"
            SELECT bon_id, du, au, matricule, prenoms, binome
            FROM interventions
            WHERE matricule IS NOT NULL AND TRIM(matricule) <> ''
            ORDER BY du, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_bon: HashMap<i64, Vec<InterventionBrief>> = HashMap::new();
        for (bon_id, du, au, matricule, prenoms, binome) in briefs {
            by_bon.entry(bon_id).or_default().push(InterventionBrief {
                du,
                au,
                matricule,
                prenoms,
                binome,
            });
        }

        Ok(bons
            .into_iter()
            .map(|bon| {
                let interventions = by_bon.remove(&bon.id).unwrap_or_default();
                BonSummary {
                    interventions,
                    ..BonSummary::from(bon)
                }
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<Bon, DatabaseError> {
        sqlx::query_as::<_, Bon>(&format!("SELECT {} FROM bonsdetravail WHERE id = ?", BON_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Work order {} not found", id)))
    }

    /// One bon with its interventions and observations
    pub async fn detail(&self, id: i64) -> Result<BonDetail, DatabaseError> {
        let bon = self.get(id).await?;
        let interventions = self.interventions(id).await?;
        let observations = sqlx::query_as::<_, Observation>(
            "SELECT * FROM observations WHERE bon_id = ? ORDER BY date DESC, id DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BonDetail {
            bon,
            interventions,
            observations,
        })
    }

    pub async fn interventions(&self, bon_id: i64) -> Result<Vec<Intervention>, DatabaseError> {
        let rows = sqlx::query_as::<_, Intervention>(
            "SELECT * FROM interventions WHERE bon_id = ? ORDER BY du, heure_debut, id",
        )
        .bind(bon_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Rows behind the Excel and PDF work-order documents
    pub async fn export(&self) -> Result<Vec<BonExportRow>, DatabaseError> {
        let bons = self.list().await?;
        Ok(export_rows(&bons))
    }

    pub async fn create(&self, bon: &NewBon) -> Result<Bon, DatabaseError> {
        let created = sqlx::query_as::<_, Bon>(&format!(
            r#"
            INSERT INTO bonsdetravail (
                numero_bon, affaire, client, designation_travaux, date_recu,
                heure_total, facturation, adresse, est_valide, cree_par_formulaire
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            BON_COLUMNS
        ))
        .bind(bon.numero_bon)
        .bind(&bon.affaire)
        .bind(&bon.client)
        .bind(&bon.designation_travaux)
        .bind(&bon.date_recu)
        .bind(&bon.heure_total)
        .bind(&bon.facturation)
        .bind(&bon.adresse)
        .bind(bon.est_valide)
        .bind(bon.cree_par_formulaire)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "A work order with this number already exists"))?;

        info!("Created work order {} (id {})", created.numero_bon, created.id);
        Ok(created)
    }

    /// Applies every field the client sent and returns the updated row
    pub async fn update(&self, id: i64, input: BonInput) -> Result<Bon, DatabaseError> {
        let builder = Self::changes(input);
        if builder.is_empty() {
            return Err(DatabaseError::QueryError("No field to update".to_string()));
        }

        let result = builder
            .execute(id, &self.pool)
            .await
            .map_err(|e| DatabaseError::conflict_or(e, "A work order with this number already exists"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Work order {} not found", id)));
        }
        info!("Updated work order {}", id);
        self.get(id).await
    }

    fn changes(input: BonInput) -> UpdateBuilder {
        UpdateBuilder::new("bonsdetravail")
            .set("numero_bon", input.numero_bon)
            .set("affaire", input.affaire)
            .set("client", input.client)
            .set("designation_travaux", input.designation_travaux)
            .set("date_recu", input.date_recu)
            .set("heure_total", input.heure_total)
            .set("facturation", input.facturation)
            .set("adresse", input.adresse)
            .set("est_valide", input.est_valide)
            .set("cree_par_formulaire", input.cree_par_formulaire)
    }

    /// Removes the bon with its interventions and observations
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM observations WHERE bon_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM interventions WHERE bon_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM bonsdetravail WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Work order {} not found", id)));
        }

        tx.commit().await?;
        info!("Deleted work order {} with its interventions and observations", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn new_bon(numero: i64) -> NewBon {
        NewBon {
            numero_bon: numero,
            affaire: "AF-001".into(),
            client: "SODECI".into(),
            designation_travaux: "Remplacement compresseur".into(),
            date_recu: "2024-02-10".into(),
            facturation: "Non".into(),
            heure_total: None,
            adresse: Some("Plateau".into()),
            est_valide: false,
            cree_par_formulaire: true,
        }
    }

    async fn add_intervention(ctx: &TestContext, bon_id: i64, matricule: Option<&str>) {
        sqlx::query("INSERT INTO interventions (bon_id, du, matricule, prenoms) VALUES (?, '2024-02-11', ?, 'Ali')")
            .bind(bon_id)
            .bind(matricule)
            .execute(&ctx.pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_groups_interventions_newest_first() {
        let ctx = TestContext::new().await.unwrap();
        let service = BonService::new(ctx.pool.clone());
        let first = service.create(&new_bon(100)).await.unwrap();
        let second = service.create(&new_bon(101)).await.unwrap();
        add_intervention(&ctx, first.id, Some("T01")).await;
        add_intervention(&ctx, first.id, Some("T02")).await;
        add_intervention(&ctx, first.id, None).await;

        let bons = service.list().await.unwrap();
        assert_eq!(bons[0].id, second.id);
        assert!(bons[0].interventions.is_empty());
        assert_eq!(bons[1].interventions.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_numero_conflicts() {
        let ctx = TestContext::new().await.unwrap();
        let service = BonService::new(ctx.pool.clone());
        service.create(&new_bon(200)).await.unwrap();

        let err = service.create(&new_bon(200)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_sets_only_sent_fields() {
        let ctx = TestContext::new().await.unwrap();
        let service = BonService::new(ctx.pool.clone());
        let bon = service.create(&new_bon(300)).await.unwrap();

        let updated = service
            .update(
                bon.id,
                BonInput {
                    facturation: Some("Oui".into()),
                    est_valide: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.facturation.as_deref(), Some("Oui"));
        assert!(updated.est_valide);
        assert_eq!(updated.client.as_deref(), Some("SODECI"));
    }

    #[tokio::test]
    async fn delete_removes_children() {
        let ctx = TestContext::new().await.unwrap();
        let service = BonService::new(ctx.pool.clone());
        let bon = service.create(&new_bon(400)).await.unwrap();
        add_intervention(&ctx, bon.id, Some("T01")).await;
        sqlx::query("INSERT INTO observations (bon_id, type) VALUES (?, 'Chute')")
            .bind(bon.id)
            .execute(&ctx.pool)
            .await
            .unwrap();

        service.delete(bon.id).await.unwrap();

        let left: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM interventions) + (SELECT COUNT(*) FROM observations)",
        )
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
        assert_eq!(left, 0);
        assert!(matches!(service.delete(bon.id).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn detail_of_unknown_bon_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let service = BonService::new(ctx.pool.clone());
        assert!(matches!(service.detail(77).await, Err(DatabaseError::NotFound(_))));
    }
}
