use tracing::info;

use crate::database::models::{Personnel, PersonnelInput, Technicien};
use crate::database::{DatabaseError, DbPool};

/// Staff record with every field present
#[derive(Debug, Clone)]
pub struct PersonnelFields {
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    pub fonction: String,
}

pub struct PersonnelService {
    pool: DbPool,
}

impl PersonnelService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Personnel>, DatabaseError> {
        let rows = sqlx::query_as::<_, Personnel>(
            "SELECT id, matricule, nom, prenoms, fonction FROM personnels ORDER BY nom, prenoms",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Staff whose function is technician, for the intervention form
    pub async fn techniciens(&self) -> Result<Vec<Technicien>, DatabaseError> {
        let rows = sqlx::query_as::<_, Technicien>(
            r#"
            SELECT matricule, nom, prenoms
            FROM personnels
            WHERE UPPER(TRIM(fonction)) = 'TECHNICIEN'
            ORDER BY nom, prenoms
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, fields: &PersonnelFields) -> Result<Personnel, DatabaseError> {
        let personnel = sqlx::query_as::<_, Personnel>(
            r#"
            INSERT INTO personnels (matricule, nom, prenoms, fonction)
            VALUES (?, ?, ?, ?)
            RETURNING id, matricule, nom, prenoms, fonction
            "#,
        )
        .bind(&fields.matricule)
        .bind(&fields.nom)
        .bind(&fields.prenoms)
        .bind(&fields.fonction)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "A staff member with this matricule already exists"))?;

        info!("Created personnel {} (id {})", personnel.matricule, personnel.id);
        Ok(personnel)
    }

    pub async fn update(&self, id: i64, fields: &PersonnelFields) -> Result<Personnel, DatabaseError> {
        let personnel = sqlx::query_as::<_, Personnel>(
            r#"
            UPDATE personnels
            SET matricule = ?, nom = ?, prenoms = ?, fonction = ?
            WHERE id = ?
            RETURNING id, matricule, nom, prenoms, fonction
            "#,
        )
        .bind(&fields.matricule)
        .bind(&fields.nom)
        .bind(&fields.prenoms)
        .bind(&fields.fonction)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "Another staff member already uses this matricule"))?
        .ok_or_else(|| DatabaseError::NotFound(format!("Personnel {} not found", id)))?;

        info!("Updated personnel {}", id);
        Ok(personnel)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM personnels WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Personnel {} not found", id)));
        }
        info!("Deleted personnel {}", id);
        Ok(())
    }

    /// Upserts the batch by id in a single transaction; rows without an id
    /// are inserted. Nothing is written if any row fails.
    pub async fn sync(&self, personnels: &[PersonnelInput]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for p in personnels {
            sqlx::query(
                r#"
                INSERT INTO personnels (id, matricule, nom, prenoms, fonction)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    matricule = excluded.matricule,
                    nom = excluded.nom,
                    prenoms = excluded.prenoms,
                    fonction = excluded.fonction
                "#,
            )
            .bind(p.id)
            .bind(&p.matricule)
            .bind(&p.nom)
            .bind(&p.prenoms)
            .bind(&p.fonction)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Synchronized {} personnels", personnels.len());
        Ok(personnels.len())
    }
}
