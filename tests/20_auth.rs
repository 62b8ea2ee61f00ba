mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{TestServer, LEAD_EMAIL, STRANGER_TOKEN, VALID_TOKEN};
use roster_api::auth::validate_jwt;

#[tokio::test]
async fn google_login_returns_token_header() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/auth/google"))
        .json(&json!({ "access_token": VALID_TOKEN }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let token = res
        .headers()
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .expect("x-auth-token header");
    let claims = validate_jwt(&token, &server.config.security)?;
    assert_eq!(claims.email, LEAD_EMAIL);

    // issued token opens protected routes
    let res = server
        .client
        .get(server.url("/streams"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn rejected_google_token_is_unauthorized() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/auth/google"))
        .json(&json!({ "access_token": "forged" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get("x-auth-token").is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_forbidden() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/auth/google"))
        .json(&json!({ "access_token": STRANGER_TOKEN }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_bearer_token() -> Result<()> {
    let server = TestServer::spawn().await?;

    for path in ["/resources", "/streams"] {
        let res = server.client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }

    let res = server
        .client
        .get(server.url("/resources"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
