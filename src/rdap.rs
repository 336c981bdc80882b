//! RDAP passthrough for IP address queries.
//!
//! Experimental: the JSON body is returned exactly as the registry sent it.

use crate::{config::Config, errors::WhoisError, whois::LookupResult};
use rand::Rng;
use tracing::{debug, info};

/// Regional registries queried when no base URL is given.
pub const RDAP_SERVERS: [&str; 3] = [
    "https://rdap.apnic.net/",
    "https://rdap.db.ripe.net/",
    "https://rdap.afrinic.net/rdap/",
];

pub struct RdapService {
    client: reqwest::Client,
}

impl RdapService {
    pub fn new(config: &Config) -> Result<Self, WhoisError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("whois-chase/", env!("CARGO_PKG_VERSION"), " (RDAP client)"))
            .gzip(true);
        if let Some(limit) = config.rdap_timeout() {
            builder = builder.timeout(limit);
        }

        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn choose_server<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        RDAP_SERVERS[rng.random_range(0..RDAP_SERVERS.len())]
    }

    /// `GET <base>ip/<query>`, body returned unparsed.
    pub async fn lookup_ip(&self, query: &str, base: &str) -> Result<LookupResult, WhoisError> {
        info!("IP lookup over RDAP is experimental");
        let url = ip_url(base, query);

        debug!("Connecting to \"{}\"", url);
        let text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(LookupResult {
            text,
            servers: vec![url],
        })
    }
}

fn ip_url(base: &str, query: &str) -> String {
    if base.ends_with('/') {
        format!("{}ip/{}", base, query)
    } else {
        format!("{}/ip/{}", base, query)
    }
}
