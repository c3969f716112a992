mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestServer, ADMIN, ASSISTANTE, CHARGE_ETUDE, PASSWORD, RRH};

#[tokio::test]
async fn admin_creates_user_who_can_log_in() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ADMIN).await?;

    let roles: Value = server.get("/api/users/roles", &token).await?.json().await?;
    let rrh_id = roles
        .as_array()
        .and_then(|roles| roles.iter().find(|r| r["name"] == "RRH"))
        .and_then(|r| r["id"].as_i64())
        .expect("RRH role is seeded");

    let res = server
        .post(
            "/api/users",
            &token,
            &json!({ "matricule": "RH002", "nom": "Yao", "prenoms": "Marie", "roleId": rrh_id, "motDePasse": PASSWORD }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    assert!(created["id"].as_i64().is_some());
    assert_eq!(created["roleId"], rrh_id);

    server.login("RH002").await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_matricule_conflicts() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ADMIN).await?;

    let res = server
        .post(
            "/api/users",
            &token,
            &json!({ "matricule": RRH, "nom": "Dup", "prenoms": "Dup", "roleId": 1, "motDePasse": "x" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn unknown_role_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ADMIN).await?;

    let res = server
        .post(
            "/api/users",
            &token,
            &json!({ "matricule": "X1", "nom": "X", "prenoms": "X", "roleId": 999, "motDePasse": "x" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn user_listing_is_restricted() -> Result<()> {
    let server = TestServer::start().await?;

    let assistante = server.login(ASSISTANTE).await?;
    let res = server.get("/api/users", &assistante).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let users: Value = res.json().await?;
    assert!(users.as_array().map(|u| u.len() >= 4).unwrap_or(false));
    assert!(users[0].get("mot_de_passe").is_none());

    let charge = server.login(CHARGE_ETUDE).await?;
    let res = server.get("/api/users", &charge).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reading is not writing
    let rrh = server.login(RRH).await?;
    let res = server.delete("/api/users/1", &rrh).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn update_requires_a_field_and_existing_user() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(ADMIN).await?;

    let res = server.put("/api/users/1", &token, &json!({ "nom": "  " })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.put("/api/users/9999", &token, &json!({ "nom": "Nouveau" })).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.delete("/api/users/9999", &token).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn personnel_crud_and_sync() -> Result<()> {
    let server = TestServer::start().await?;
    let rrh = server.login(RRH).await?;

    let res = server
        .post(
            "/api/personnels",
            &rrh,
            &json!({ "matricule": "P001", "nom": "Kouassi", "prenoms": "Jean", "fonction": "TECHNICIEN" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["id"].as_i64().expect("id");

    let res = server
        .post(
            "/api/personnels",
            &rrh,
            &json!({ "matricule": "P001", "nom": "Autre", "prenoms": "Autre", "fonction": "RRH" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server.post("/api/personnels", &rrh, &json!({ "matricule": "P002" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let techniciens: Value = server.get("/api/personnels/techniciens", &rrh).await?.json().await?;
    assert_eq!(techniciens.as_array().map(Vec::len), Some(1));
    assert_eq!(techniciens[0]["matricule"], "P001");

    let res = server
        .post(
            "/api/personnels/sync",
            &rrh,
            &json!({ "personnels": [
                { "id": id, "matricule": "P001", "nom": "Kouassi", "prenoms": "Jean-Marc", "fonction": "TECHNICIEN" },
                { "id": 500, "matricule": "P500", "nom": "Bamba", "prenoms": "Ali", "fonction": "Electricien" }
            ] }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "success");

    let all: Value = server.get("/api/personnels", &rrh).await?.json().await?;
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let res = server.post("/api/personnels/sync", &rrh, &json!({ "personnels": [] })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.delete(&format!("/api/personnels/{}", id), &rrh).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.delete(&format!("/api/personnels/{}", id), &rrh).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
