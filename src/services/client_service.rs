use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::database::models::affaire::{default_designation, DEFAULT_AFFAIRE_STATUT};
use crate::database::models::{Affaire, AffaireBrief, Client, ClientWithAffaires};
use crate::database::{DatabaseError, DbPool};

#[derive(Debug, Clone)]
pub struct NewClientAffaire {
    pub nom: String,
    pub contact: Option<String>,
    pub adresse: Option<String>,
    pub numero: String,
    pub designation: Option<String>,
    pub statut: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AffaireFields {
    pub numero: String,
    pub designation: String,
    pub statut: String,
}

#[derive(Debug, Clone)]
pub struct ClientFields {
    pub nom: String,
    pub contact: String,
    pub adresse: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientAffaireCreated {
    pub client: Client,
    pub affaire: AffaireBrief,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffaireUpdated {
    pub message: String,
    pub updated_affaire: Affaire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_client: Option<Client>,
}

pub struct ClientService {
    pool: DbPool,
}

impl ClientService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Clients by name, each with its affaires by number
    pub async fn list_with_affaires(&self) -> Result<Vec<ClientWithAffaires>, DatabaseError> {
        let clients = sqlx::query_as::<_, Client>("SELECT id, nom, contact, adresse FROM clients ORDER BY nom")
            .fetch_all(&self.pool)
            .await?;
        let affaires = sqlx::query_as::<_, Affaire>(
            "SELECT id, numero, designation, client_id, statut FROM affaires ORDER BY numero",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_client: HashMap<i64, Vec<AffaireBrief>> = HashMap::new();
        for affaire in affaires {
            by_client.entry(affaire.client_id).or_default().push(affaire.into());
        }

        Ok(clients
            .into_iter()
            .map(|c| ClientWithAffaires {
                affaires: by_client.remove(&c.id).unwrap_or_default(),
                id: c.id,
                nom: c.nom,
                contact: c.contact,
                adresse: c.adresse,
            })
            .collect())
    }

    /// Opens an affaire for the named client, creating the client first
    /// when no client has that name.
    pub async fn create(&self, input: &NewClientAffaire) -> Result<ClientAffaireCreated, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Writing first takes the lock up front, so a concurrent create of
        // the same client waits and then reuses the row.
        sqlx::query("INSERT INTO clients (nom, contact, adresse) VALUES (?, ?, ?) ON CONFLICT(nom) DO NOTHING")
            .bind(&input.nom)
            .bind(&input.contact)
            .bind(&input.adresse)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::conflict_or(e, "A client with this name already exists"))?;

        let client = sqlx::query_as::<_, Client>("SELECT id, nom, contact, adresse FROM clients WHERE nom = ?")
            .bind(&input.nom)
            .fetch_one(&mut *tx)
            .await?;

        let designation = input
            .designation
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_designation(&input.numero, &input.nom));
        let statut = input
            .statut
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AFFAIRE_STATUT.to_string());

        let affaire = sqlx::query_as::<_, Affaire>(
            r#"
            INSERT INTO affaires (numero, designation, client_id, statut)
            VALUES (?, ?, ?, ?)
            RETURNING id, numero, designation, client_id, statut
            "#,
        )
        .bind(&input.numero)
        .bind(&designation)
        .bind(client.id)
        .bind(&statut)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "An affaire with this number already exists"))?;

        tx.commit().await?;
        info!("Opened affaire {} for client {}", affaire.numero, client.nom);

        Ok(ClientAffaireCreated {
            client,
            affaire: affaire.into(),
        })
    }

    /// Updates an affaire and, when given, its client in the same transaction
    pub async fn update_affaire(
        &self,
        id: i64,
        fields: &AffaireFields,
        client: Option<(i64, ClientFields)>,
    ) -> Result<AffaireUpdated, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated_affaire = sqlx::query_as::<_, Affaire>(
            r#"
            UPDATE affaires SET numero = ?, designation = ?, statut = ?
            WHERE id = ?
            RETURNING id, numero, designation, client_id, statut
            "#,
        )
        .bind(&fields.numero)
        .bind(&fields.designation)
        .bind(&fields.statut)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "An affaire with this number already exists"))?
        .ok_or_else(|| DatabaseError::NotFound(format!("Affaire {} not found", id)))?;

        let updated_client = match client {
            Some((client_id, client_fields)) => Some(Self::write_client(&mut tx, client_id, &client_fields).await?),
            None => None,
        };

        tx.commit().await?;
        info!("Updated affaire {}", id);

        let message = if updated_client.is_some() {
            "Affaire and client updated"
        } else {
            "Affaire updated"
        };
        Ok(AffaireUpdated {
            message: message.to_string(),
            updated_affaire,
            updated_client,
        })
    }

    pub async fn delete_affaire(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM affaires WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Affaire {} not found", id)));
        }
        info!("Deleted affaire {}", id);
        Ok(())
    }

    pub async fn update_client(&self, id: i64, fields: &ClientFields) -> Result<Client, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let client = Self::write_client(&mut conn, id, fields).await?;
        info!("Updated client {}", id);
        Ok(client)
    }

    /// Removes the client and its affaires
    pub async fn delete_client(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM affaires WHERE client_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Client {} not found", id)));
        }

        tx.commit().await?;
        info!("Deleted client {} with its affaires", id);
        Ok(())
    }

    async fn write_client(
        conn: &mut sqlx::SqliteConnection,
        id: i64,
        fields: &ClientFields,
    ) -> Result<Client, DatabaseError> {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET nom = ?, contact = ?, adresse = ?
            WHERE id = ?
            RETURNING id, nom, contact, adresse
            "#,
        )
        .bind(&fields.nom)
        .bind(&fields.contact)
        .bind(&fields.adresse)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "Another client already has this name"))?
        .ok_or_else(|| DatabaseError::NotFound(format!("Client {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn new_affaire(nom: &str, numero: &str) -> NewClientAffaire {
        NewClientAffaire {
            nom: nom.into(),
            contact: Some("0700000000".into()),
            adresse: Some("Abidjan".into()),
            numero: numero.into(),
            designation: None,
            statut: None,
        }
    }

    #[tokio::test]
    async fn create_reuses_client_and_fills_defaults() {
        let ctx = TestContext::new().await.unwrap();
        let service = ClientService::new(ctx.pool.clone());

        let first = service.create(&new_affaire("ORANGE", "A-01")).await.unwrap();
        let second = service.create(&new_affaire("ORANGE", "A-02")).await.unwrap();

        assert_eq!(first.client.id, second.client.id);
        assert_eq!(first.affaire.designation.as_deref(), Some("Affaire A-01 pour ORANGE"));
        assert_eq!(first.affaire.statut.as_deref(), Some("Actif"));

        let listed = service.list_with_affaires().await.unwrap();
        assert_eq!(listed.len(), 1);
        let numeros: Vec<_> = listed[0].affaires.iter().map(|a| a.numero.as_str()).collect();
        assert_eq!(numeros, vec!["A-01", "A-02"]);
    }

    #[tokio::test]
    async fn concurrent_creates_share_one_client() {
        let ctx = TestContext::new().await.unwrap();
        let service = ClientService::new(ctx.pool.clone());

        let req_a = new_affaire("CIE", "C-01");
        let req_b = new_affaire("CIE", "C-02");
        let (a, b) = tokio::join!(service.create(&req_a), service.create(&req_b));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.client.id, b.client.id);

        let listed = service.list_with_affaires().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].affaires.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_affaire_rolls_back_new_client() {
        let ctx = TestContext::new().await.unwrap();
        let service = ClientService::new(ctx.pool.clone());
        service.create(&new_affaire("ORANGE", "A-01")).await.unwrap();

        let err = service.create(&new_affaire("MTN", "A-01")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let listed = service.list_with_affaires().await.unwrap();
        assert!(listed.iter().all(|c| c.nom != "MTN"));
    }

    #[tokio::test]
    async fn update_affaire_with_client() {
        let ctx = TestContext::new().await.unwrap();
        let service = ClientService::new(ctx.pool.clone());
        let created = service.create(&new_affaire("ORANGE", "A-01")).await.unwrap();

        let fields = AffaireFields {
            numero: "A-01".into(),
            designation: "Climatisation siège".into(),
            statut: "Clôturé".into(),
        };
        let client = ClientFields {
            nom: "ORANGE CI".into(),
            contact: "0101".into(),
            adresse: "Marcory".into(),
        };
        let updated = service
            .update_affaire(created.affaire.id, &fields, Some((created.client.id, client)))
            .await
            .unwrap();

        assert_eq!(updated.updated_affaire.statut.as_deref(), Some("Clôturé"));
        assert_eq!(updated.updated_client.map(|c| c.nom), Some("ORANGE CI".to_string()));
    }

    #[tokio::test]
    async fn delete_client_takes_affaires() {
        let ctx = TestContext::new().await.unwrap();
        let service = ClientService::new(ctx.pool.clone());
        let created = service.create(&new_affaire("ORANGE", "A-01")).await.unwrap();

        service.delete_client(created.client.id).await.unwrap();
        assert!(service.list_with_affaires().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_affaire(created.affaire.id).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn client_rename_conflict() {
        let ctx = TestContext::new().await.unwrap();
        let service = ClientService::new(ctx.pool.clone());
        service.create(&new_affaire("ORANGE", "A-01")).await.unwrap();
        let mtn = service.create(&new_affaire("MTN", "A-02")).await.unwrap();

        let fields = ClientFields {
            nom: "ORANGE".into(),
            contact: "x".into(),
            adresse: "y".into(),
        };
        let err = service.update_client(mtn.client.id, &fields).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }
}
