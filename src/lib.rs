//! # whois-chase
//!
//! WHOIS lookups that pick the server from a suffix table and follow
//! registrar referrals until the authoritative record is reached.
//!
//! ## Features
//!
//! - Suffix-based server selection with a `.whois-servers.net` fallback
//! - Registrar referral chasing with loop and hop limits
//! - IDNA encoding of queries and server names
//! - `host:port` and `[ipv6]:port` server specs
//! - Experimental RDAP passthrough for IP addresses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use whois_chase::{Config, LookupQuery, ServerTable, WhoisClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::load()?);
//!     let table = Arc::new(ServerTable::builtin()?);
//!     let client = WhoisClient::new(config, table)?;
//!
//!     let result = client.lookup(&LookupQuery::new("example.com", None)).await?;
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod host_port;
pub mod query;
pub mod rdap;
pub mod server_table;
pub mod whois;

// Re-export main types for easy access
pub use config::Config;
pub use errors::WhoisError;
pub use host_port::ServerSpec;
pub use query::{to_ascii, LookupQuery, QueryType};
pub use rdap::RdapService;
pub use server_table::ServerTable;
pub use whois::{LookupResult, WhoisService};

use std::sync::Arc;

/// Classifies a query and sends it down the WHOIS or RDAP path.
pub struct WhoisClient {
    whois: WhoisService,
    rdap: RdapService,
}

impl WhoisClient {
    pub fn new(config: Arc<Config>, table: Arc<ServerTable>) -> Result<Self, WhoisError> {
        let rdap = RdapService::new(&config)?;
        Ok(Self::from_parts(WhoisService::new(config, table), rdap))
    }

    pub fn from_parts(whois: WhoisService, rdap: RdapService) -> Self {
        Self { whois, rdap }
    }

    /// Domains go to WHOIS, IP literals to RDAP. The query's server, if any,
    /// is a WHOIS server spec for domains and an RDAP base URL for addresses.
    pub async fn lookup(&self, query: &LookupQuery) -> Result<LookupResult, WhoisError> {
        if !query.kind().is_ip() {
            return self.whois.lookup_domain(query.query(), query.server()).await;
        }

        let base = match query.server() {
            Some(base) => base.to_string(),
            None => self.rdap.choose_server(&mut rand::rng()).to_string(),
        };
        self.rdap.lookup_ip(query.query(), &base).await
    }

    pub fn whois(&self) -> &WhoisService {
        &self.whois
    }
}
