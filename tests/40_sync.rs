mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{bon_body, TestServer, ADMIN, TECHNICIEN};

fn field_bon(numero: i64, intervention_id: i64) -> Value {
    let mut bon = bon_body(numero);
    bon["id"] = json!(numero);
    bon["interventions"] = json!([{
        "id": intervention_id,
        "du": "2024-03-02",
        "au": "2024-03-02",
        "matricule": "T01",
        "prenoms": "Issa",
        "heure_debut": "08:00",
        "heure_fin": "10:00",
        "description_detail": "Recharge gaz"
    }]);
    bon["observations"] = json!([{
        "id": intervention_id,
        "date": "2024-03-02",
        "observateur": "Issa",
        "type": "Fuite",
        "description": "Fuite de gaz",
        "gravite": "Moyenne",
        "statut": "Non traitée",
        "chantier": "Cocody"
    }]);
    bon
}

#[tokio::test]
async fn technician_uploads_bons_with_records() -> Result<()> {
    let server = TestServer::start().await?;
    let technicien = server.login_mobile(TECHNICIEN).await?;

    let res = server
        .post(
            "/api/sync/bon-de-travail",
            &technicien,
            &json!({ "bonsDeTravail": [field_bon(5001, 71), field_bon(5002, 72)] }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "success");

    // Uploading again updates in place
    let mut resent = field_bon(5001, 71);
    resent["facturation"] = json!("Oui");
    let res = server
        .post("/api/sync/bon-de-travail", &technicien, &json!({ "bonsDeTravail": [resent] }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let admin = server.login(ADMIN).await?;
    let bons: Value = server.get("/api/bons", &admin).await?.json().await?;
    let bons = bons.as_array().cloned().unwrap_or_default();
    assert_eq!(bons.len(), 2);
    let first = bons.iter().find(|b| b["numero_bon"] == 5001).expect("bon 5001");
    assert_eq!(first["facturation"], "Oui");
    assert_eq!(first["interventions"].as_array().map(Vec::len), Some(1));

    let observations: Value = server.get("/api/observations", &admin).await?.json().await?;
    assert_eq!(observations.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn sync_rejects_missing_list_and_back_office_callers() -> Result<()> {
    let server = TestServer::start().await?;
    let technicien = server.login_mobile(TECHNICIEN).await?;

    let res = server.post("/api/sync/bon-de-travail", &technicien, &json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "error");

    let admin = server.login(ADMIN).await?;
    let res = server
        .post("/api/sync/bon-de-travail", &admin, &json!({ "bonsDeTravail": [field_bon(1, 1)] }))
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn empty_upload_succeeds() -> Result<()> {
    let server = TestServer::start().await?;
    let technicien = server.login_mobile(TECHNICIEN).await?;

    let res = server
        .post("/api/sync/bon-de-travail", &technicien, &json!({ "bonsDeTravail": [] }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "success");
    Ok(())
}

#[tokio::test]
async fn unknown_observation_status_is_refused() -> Result<()> {
    let server = TestServer::start().await?;
    let technicien = server.login_mobile(TECHNICIEN).await?;

    let mut bon = field_bon(6101, 91);
    bon["observations"][0]["statut"] = json!("En cours");
    let res = server
        .post(
            "/api/sync/bon-de-travail",
            &technicien,
            &json!({ "bonsDeTravail": [field_bon(6100, 90), bon] }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "error");

    let admin = server.login(ADMIN).await?;
    let bons: Value = server.get("/api/bons", &admin).await?.json().await?;
    assert_eq!(bons.as_array().map(Vec::len), Some(0));
    let observations: Value = server.get("/api/observations", &admin).await?.json().await?;
    assert_eq!(observations.as_array().map(Vec::len), Some(0));

    // Surrounding spaces are dropped before storing
    let mut bon = field_bon(6102, 92);
    bon["observations"][0]["statut"] = json!(" Traitée ");
    let res = server
        .post("/api/sync/bon-de-travail", &technicien, &json!({ "bonsDeTravail": [bon] }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let observations: Value = server.get("/api/observations", &admin).await?.json().await?;
    assert_eq!(observations[0]["statut"], "Traitée");
    Ok(())
}

#[tokio::test]
async fn failed_batch_leaves_nothing_behind() -> Result<()> {
    let server = TestServer::start().await?;
    let technicien = server.login_mobile(TECHNICIEN).await?;

    // Second bon lacks its number, so the whole upload is refused
    let mut broken = field_bon(6002, 82);
    broken["numero_bon"] = json!(null);
    let res = server
        .post(
            "/api/sync/bon-de-travail",
            &technicien,
            &json!({ "bonsDeTravail": [field_bon(6001, 81), broken] }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "error");

    let admin = server.login(ADMIN).await?;
    let bons: Value = server.get("/api/bons", &admin).await?.json().await?;
    assert_eq!(bons.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn intervention_sync_upserts_by_id() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.login(ADMIN).await?;

    let res = server.post("/api/bons", &admin, &bon_body(7001)).await?;
    let bon: Value = res.json().await?;
    let bon_id = bon["id"].as_i64().expect("id");

    let intervention = |heure_fin: &str| {
        json!({ "id": 900, "bon_id": bon_id, "du": "2024-04-01", "au": "2024-04-01", "matricule": "T02",
                "prenoms": "Awa", "heure_debut": "13:00", "heure_fin": heure_fin, "description_detail": "Visite" })
    };

    let res = server
        .post("/api/interventions/sync", &admin, &json!({ "interventions": [intervention("15:00")] }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server
        .post("/api/interventions/sync", &admin, &json!({ "interventions": [intervention("17:00")] }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let rows: Value = server
        .get(&format!("/api/bons/interventions/{}", bon_id), &admin)
        .await?
        .json()
        .await?;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["heure_fin"], "17:00");

    let res = server.post("/api/interventions/sync", &admin, &json!({ "interventions": [] })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
