use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Shared HTTP client for provider calls and result downloads
///
/// The timeout bounds each individual request; waiting on the provider
/// queue is a sequence of short polls and has no overall limit.
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .timeout(Duration::from_secs(120))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}
