//! Shared fixtures for the mock-server tests.

#![allow(dead_code)]

use deploy_orchestrator_provider::{Artifact, SiteContext};
use serde_json::{Value, json};

/// Account id in the 32-hex format Cloudflare uses.
pub const ACCOUNT_ID: &str = "0123456789abcdef0123456789abcdef";

/// Assert `Result` is `Ok` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Site whose slug is `example-com`.
pub fn example_site() -> SiteContext {
    SiteContext::new("site-1")
        .with_domain("example.com")
        .with_brand("Example")
}

/// Two-file artifact: `index.html` = `<h1>hi</h1>`, `style.css` = `body{}`.
pub fn small_artifact() -> Artifact {
    [("index.html", "<h1>hi</h1>"), ("style.css", "body{}")]
        .into_iter()
        .collect()
}

/// Successful Cloudflare envelope around `result`.
pub fn cf_ok(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

/// Failed Cloudflare envelope.
pub fn cf_err(code: i64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null
    })
}

pub fn cf_zone(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "active",
        "name_servers": ["ada.ns.cloudflare.com", "bob.ns.cloudflare.com"]
    })
}

pub fn cf_record(id: &str, record_type: &str, name: &str, content: &str) -> Value {
    json!({
        "id": id,
        "type": record_type,
        "name": name,
        "content": content,
        "ttl": 1,
        "proxied": false,
        "created_on": "2026-01-02T03:04:05Z",
        "modified_on": "2026-01-02T03:04:05Z"
    })
}
