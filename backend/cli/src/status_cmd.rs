//! `textlift status`: asks a running gateway for its health report.

use anyhow::Result;

use crate::terminal_output::{note_success, note_warn};

fn health_url(bind_address: &str, port: u16) -> String {
    let host = match bind_address {
        "0.0.0.0" | "::" | "" => "127.0.0.1",
        other => other,
    };
    format!("http://{host}:{port}/api/health")
}

/// Returns whether a gateway answered.
pub async fn run(bind_address: &str, port: u16) -> Result<bool> {
    let url = health_url(bind_address, port);
    let client = reqwest::Client::new();
    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await?;
            note_success(&format!("textlift is running at {url}"));
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(true)
        }
        Ok(resp) => {
            note_warn(&format!("Gateway at {url} answered {}", resp.status()));
            Ok(false)
        }
        Err(_) => {
            note_warn(&format!("textlift is not running on port {port}"));
            Ok(false)
        }
    }
}
