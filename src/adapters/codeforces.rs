use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

fn make_url(base_url: &str) -> String {
    format!("{}/user.info", base_url.trim_end_matches('/'))
}

#[derive(Debug, Deserialize)]
struct UserInfoEnvelope {
    status: String,
}

/// Fetches the raw `user.info` payload for `handle`. Returns `None` when
/// codeforces does not know the handle.
pub async fn fetch_user_info(base_url: &str, handle: &str) -> anyhow::Result<Option<Value>> {
    let response = reqwest::Client::new()
        .get(make_url(base_url))
        .query(&[("handles", handle)])
        .send()
        .await?;
    match response.status() {
        StatusCode::OK => {}
        // codeforces answers unknown handles with 400 and a FAILED status
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => return Ok(None),
        status => anyhow::bail!("codeforces responded with {status}"),
    }
    let body: Value = response.json().await?;
    let envelope: UserInfoEnvelope = serde_json::from_value(body.clone())?;
    match envelope.status.as_str() {
        "OK" => Ok(Some(body)),
        _ => Ok(None),
    }
}
