mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{resource_body, TestServer};

#[tokio::test]
async fn create_rename_and_list_streams() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.post("/streams").json(&json!({ "name": "Cards" })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let uuid = created["data"]["uuid"].as_str().unwrap().to_string();

    let res = server
        .put(&format!("/streams/{}", uuid))
        .json(&json!({ "name": "Cards & Wallets" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get("/streams?page=1&limit=10&search=card").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["totalCount"], 1);
    assert_eq!(body["data"]["data"][0]["name"], "Cards & Wallets");

    let res = server.get("/streams?page=1&limit=500").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn bulk_membership_change_and_detail_view() -> Result<()> {
    let server = TestServer::spawn().await?;
    let payments = server.seed.payments.clone();

    let asha = server.create_resource(resource_body("Asha", "E1")).await?;
    let anil = server.create_resource(resource_body("Anil", "E2")).await?;
    let (asha_id, anil_id) = (asha["_id"].as_str().unwrap(), anil["_id"].as_str().unwrap());

    let change = json!({
        "add": [
            { "resourceId": asha_id, "streamId": payments.id.to_hex(), "role": "supportingLeads" },
            { "resourceId": anil_id, "streamId": payments.id.to_hex() },
        ]
    });
    for _ in 0..2 {
        let res = server.put("/streams/members").json(&change).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let approve = json!({
        "update": [{
            "resourceId": anil_id,
            "streamId": payments.id.to_hex(),
            "role": "TEAM",
            "isApproved": true,
            "approvedBy": asha_id,
        }]
    });
    let res = server.put("/streams/members").json(&approve).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .get(&format!("/streams/{}?isApproved=true", payments.uuid))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let detail = &body["data"];
    assert_eq!(detail["result"]["supportingLeadsCount"], 0);
    assert_eq!(detail["result"]["teamMembersCount"], 1);
    assert_eq!(detail["teamMembers"][0]["resource"]["name"], "Anil");
    assert_eq!(detail["teamMembers"][0]["approvedBy"], asha_id);

    let res = server.get(&format!("/streams/{}", payments.uuid)).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["result"]["supportingLeadsCount"], 1);
    assert_eq!(body["data"]["result"]["totalCount"], 2);

    let state = server.store.snapshot().await;
    assert_eq!(state.streams[0].supporting_leads.len(), 1);
    assert_eq!(state.teams.len(), 1);
    assert!(state.resources.iter().all(|r| r.streams == vec![payments.id]));

    let removal = json!({ "delete": [{ "resourceId": asha_id, "streamId": payments.id.to_hex() }] });
    let res = server.put("/streams/members").json(&removal).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let state = server.store.snapshot().await;
    assert!(state.streams[0].supporting_leads.is_empty());
    let asha_doc = state.resources.iter().find(|r| r.name == "Asha").unwrap();
    assert!(asha_doc.streams.is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_stream_cascades_to_teams_and_resources() -> Result<()> {
    let server = TestServer::spawn().await?;
    let payments = server.seed.payments.clone();

    let mut body = resource_body("Ravi", "E1");
    body["streams"] = json!([payments.id.to_hex()]);
    server.create_resource(body).await?;

    let res = server.delete(&format!("/streams/{}", payments.uuid)).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let state = server.store.snapshot().await;
    assert!(state.teams.is_empty());
    assert!(state.resources[0].streams.is_empty());
    assert!(state.streams.iter().all(|s| s.id != payments.id));

    let res = server.delete(&format!("/streams/{}", payments.uuid)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn failed_bulk_change_leaves_store_untouched() -> Result<()> {
    let server = TestServer::spawn().await?;
    let payments = server.seed.payments.clone();
    let ravi = server.create_resource(resource_body("Ravi", "E1")).await?;
    let before = server.store.snapshot().await;

    let change = json!({
        "add": [
            { "resourceId": ravi["_id"], "streamId": payments.id.to_hex(), "role": "lead" },
            { "resourceId": "64b7f0c2a1b2c3d4e5f60718", "streamId": payments.id.to_hex(), "role": "lead" },
        ]
    });
    let res = server.put("/streams/members").json(&change).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let after = server.store.snapshot().await;
    assert_eq!(after.streams, before.streams);
    assert_eq!(after.resources, before.resources);
    Ok(())
}
