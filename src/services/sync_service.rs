use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::database::models::{FieldBon, InterventionInput, ObservationInput};
use crate::database::{DatabaseError, DbPool};

/// Uploads from the mobile application
pub struct SyncService {
    pool: DbPool,
}

impl SyncService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upserts every bon (flagged as synced) with its interventions and
    /// observations. The whole batch commits or none of it does.
    pub async fn sync_bons(&self, bons: &[FieldBon]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for field_bon in bons {
            let bon_id = upsert_bon(&mut tx, field_bon).await?;

            for intervention in field_bon.interventions.iter().flatten() {
                upsert_intervention(&mut tx, bon_id, intervention).await?;
            }
            for observation in field_bon.observations.iter().flatten() {
                upsert_observation(&mut tx, bon_id, observation).await?;
            }
        }

        tx.commit().await?;
        info!("Synchronized {} work orders from the field", bons.len());
        Ok(bons.len())
    }
}

async fn upsert_bon(conn: &mut SqliteConnection, field_bon: &FieldBon) -> Result<i64, DatabaseError> {
    let bon = &field_bon.bon;
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bonsdetravail (
            id, numero_bon, affaire, client, designation_travaux, date_recu,
            heure_total, facturation, adresse, est_valide, cree_par_formulaire, is_synced
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, 0), COALESCE(?, 0), 1)
        ON CONFLICT(id) DO UPDATE SET
            numero_bon = excluded.numero_bon,
            affaire = excluded.affaire,
            client = excluded.client,
            designation_travaux = excluded.designation_travaux,
            date_recu = excluded.date_recu,
            heure_total = excluded.heure_total,
            facturation = excluded.facturation,
            adresse = excluded.adresse,
            est_valide = excluded.est_valide,
            cree_par_formulaire = excluded.cree_par_formulaire,
            is_synced = 1
        RETURNING id
        "#,
    )
    .bind(field_bon.id)
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
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        warn!("Work order {:?} rejected during sync: {}", bon.numero_bon, e);
        DatabaseError::conflict_or(e, "A work order with this number already exists")
    })?;
    Ok(id)
}

async fn upsert_intervention(
    conn: &mut SqliteConnection,
    bon_id: i64,
    i: &InterventionInput,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO interventions (
            id, bon_id, du, au, matricule, prenoms, binome, heure_debut, heure_fin,
            total_heures, description_detail, observation_detail, is_synced
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
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
            observation_detail = excluded.observation_detail,
            is_synced = 1
        "#,
    )
    .bind(i.id)
    .bind(bon_id)
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
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_observation(
    conn: &mut SqliteConnection,
    bon_id: i64,
    o: &ObservationInput,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO observations (
            id, bon_id, tool_box_details, tool_box_responsable, rapport_incident,
            suivi_dechets_details, suivi_dechets_responsable, hsse, environnement,
            date, observateur, type, description, gravite, statut, chantier
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            bon_id = excluded.bon_id,
            tool_box_details = excluded.tool_box_details,
            tool_box_responsable = excluded.tool_box_responsable,
            rapport_incident = excluded.rapport_incident,
            suivi_dechets_details = excluded.suivi_dechets_details,
            suivi_dechets_responsable = excluded.suivi_dechets_responsable,
            hsse = excluded.hsse,
            environnement = excluded.environnement,
            date = excluded.date,
            observateur = excluded.observateur,
            type = excluded.type,
            description = excluded.description,
            gravite = excluded.gravite,
            statut = excluded.statut,
            chantier = excluded.chantier
        "#,
    )
    .bind(o.id)
    .bind(bon_id)
    .bind(&o.tool_box_details)
    .bind(&o.tool_box_responsable)
    .bind(&o.rapport_incident)
    .bind(&o.suivi_dechets_details)
    .bind(&o.suivi_dechets_responsable)
    .bind(&o.hsse)
    .bind(&o.environnement)
    .bind(&o.date)
    .bind(&o.observateur)
    .bind(&o.kind)
    .bind(&o.description)
    .bind(&o.gravite)
    .bind(&o.statut)
    .bind(&o.chantier)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
