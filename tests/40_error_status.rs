mod common;

use anyhow::Result;
use bank_api_rust::ErrorStatusPolicy;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn distinct_policy_uses_conventional_statuses() -> Result<()> {
    let server = common::spawn_server_with_policy(ErrorStatusPolicy::Distinct).await?;
    let ada = server.create_account("Ada", "Lovelace").await?;

    let res = server.get_account(&ada["id"], None).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "permission denied" }));

    let res = server.client.patch(server.url("/account")).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "method not allowed, PATCH" }));

    let res = server.client.head(server.url("/account")).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = server.client.post(server.url("/account")).body("nope").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.client.get(server.url("/nowhere")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn flat_policy_leaves_successes_alone() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/account")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/nowhere")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "route not found" }));
    Ok(())
}
