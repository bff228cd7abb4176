use std::future::Future;

use tracing::{info, warn};
use url::Url;

use crate::config::StorageConfig;

/// Prefix of the web console host; the S3 API lives on the bare host
const CONSOLE_PREFIX: &str = "console-";

/// Ordered endpoints to try: inferred API host, API host with port, host as configured
pub fn candidate_endpoints(config: &StorageConfig) -> Vec<String> {
    let protocol = if config.use_ssl { "https" } else { "http" };
    let host = strip_scheme(config.endpoint.trim()).trim_end_matches('/');
    let api_host = host.strip_prefix(CONSOLE_PREFIX).unwrap_or(host);

    let raw = [
        format!("{}://{}", protocol, api_host),
        format!("{}://{}:{}", protocol, api_host, config.port),
        format!("{}://{}", protocol, host),
    ];

    let mut candidates: Vec<String> = Vec::with_capacity(raw.len());
    for candidate in raw {
        if Url::parse(&candidate).is_err() {
            warn!(endpoint = %candidate, "Skipping malformed object store endpoint");
            continue;
        }
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

fn strip_scheme(host: &str) -> &str {
    host.split_once("://").map(|(_, rest)| rest).unwrap_or(host)
}

/// Try `check` on each candidate in order and return the first that succeeds
pub async fn probe_endpoints<T, E, F, Fut>(candidates: &[String], mut check: F) -> Option<(String, T)>
where
    E: std::fmt::Display,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    for candidate in candidates {
        match check(candidate.clone()).await {
            Ok(value) => {
                info!(endpoint = %candidate, "Object store endpoint reachable");
                return Some((candidate.clone(), value));
            }
            Err(err) => warn!(endpoint = %candidate, error = %err, "Object store endpoint failed"),
        }
    }
    None
}
