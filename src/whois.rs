use crate::{
    config::Config,
    errors::WhoisError,
    host_port::ServerSpec,
    query::to_ascii,
    server_table::ServerTable,
};
use std::{
    collections::HashSet,
    future::Future,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::{lookup_host, TcpStream},
    time::timeout,
};
use tracing::{debug, info, warn};

pub const WHOIS_PORT: u16 = 43;

const REFERRAL_PREFIX: &str = "registrar whois server:";

/// Text gathered by one lookup and the servers it came from, in visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult {
    pub text: String,
    pub servers: Vec<String>,
}

/// One server's reply and the last registrar referral seen in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReply {
    pub text: String,
    pub referral: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    fn from_spec(spec: &str) -> Result<Self, WhoisError> {
        let parsed = ServerSpec::parse(spec)?;
        Ok(Self {
            host: to_ascii(&parsed.host)?,
            port: parsed.port_or(WHOIS_PORT),
        })
    }

    fn key(&self) -> (String, u16) {
        (self.host.to_ascii_lowercase(), self.port)
    }

    fn label(&self) -> String {
        ServerSpec {
            host: self.host.clone(),
            port: Some(self.port),
        }
        .to_string()
    }
}

pub struct WhoisService {
    config: Arc<Config>,
    table: Arc<ServerTable>,
}

impl WhoisService {
    pub fn new(config: Arc<Config>, table: Arc<ServerTable>) -> Self {
        Self { config, table }
    }

    pub fn table(&self) -> &ServerTable {
        &self.table
    }

    /// Query the WHOIS server for `query` and follow registrar referrals.
    ///
    /// Without an explicit `server` the server table picks one. Each
    /// referral that names a host other than the one just queried is
    /// followed, and its reply appended. The chase stops at an endpoint
    /// already visited or once `max_referrals` hops have been made.
    pub async fn lookup_domain(&self, query: &str, server: Option<&str>) -> Result<LookupResult, WhoisError> {
        let query = to_ascii(query)?;
        let server = match server {
            Some(server) => server.to_string(),
            None => self.table.resolve(&query),
        };

        let mut endpoint = Endpoint::from_spec(&server)?;
        let mut visited = HashSet::new();
        let mut result = LookupResult::default();
        let mut referrals = 0;

        loop {
            visited.insert(endpoint.key());

            debug!("Connecting to \"{}\" port {}", endpoint.host, endpoint.port);
            let Some(stream) = self.connect(&endpoint.host, endpoint.port).await? else {
                result.text.push_str(&format!("Host not found: {}", endpoint.host));
                break;
            };
            result.servers.push(endpoint.label());

            debug!("Query \"{}\"", query);
            let reply = exchange(stream, &query, self.config.whois_timeout(), self.config.max_response_size).await?;
            result.text.push_str(&reply.text);

            let Some(target) = reply.referral else {
                break;
            };
            if target.eq_ignore_ascii_case(&endpoint.host) {
                break;
            }

            let next = Endpoint::from_spec(&target)?;
            if visited.contains(&next.key()) {
                warn!("Referral loop back to {}, not following", next.label());
                break;
            }
            if referrals >= self.config.max_referrals {
                warn!("Referral limit of {} reached, not following {}", self.config.max_referrals, target);
                break;
            }

            info!("Following referral from {} to {}", endpoint.host, target);
            referrals += 1;
            endpoint = next;
        }

        Ok(result)
    }

    /// Opens a connection, or `None` when the host name does not resolve.
    /// Resolver failures that may clear up on retry are errors, not `None`.
    async fn connect(&self, host: &str, port: u16) -> Result<Option<TcpStream>, WhoisError> {
        let limit = self.config.whois_timeout();

        let addrs: Vec<SocketAddr> = match deadline(limit, lookup_host((host, port))).await? {
            Ok(addrs) => addrs.collect(),
            Err(e) if is_transient_resolver_error(&e) => {
                warn!("Resolver unavailable for {}: {}", host, e);
                return Err(WhoisError::IoError(e));
            }
            Err(e) => {
                warn!("Failed to resolve {}: {}", host, e);
                return Ok(None);
            }
        };
        if addrs.is_empty() {
            debug!("No addresses for {}", host);
            return Ok(None);
        }

        let stream = deadline(limit, TcpStream::connect(&addrs[..])).await??;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        Ok(Some(stream))
    }
}

/// Sends `query` and reads the reply until the server closes the stream.
///
/// Lines are kept byte for byte, terminators included. Invalid UTF-8 is
/// replaced rather than rejected.
pub async fn exchange<S>(
    stream: S,
    query: &str,
    limit: Option<Duration>,
    max_response_size: usize,
) -> Result<ServerReply, WhoisError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);
    let request = format!("{}\r\n", query);
    deadline(limit, reader.get_mut().write_all(request.as_bytes())).await??;

    let mut text = String::new();
    let mut referral = None;
    let mut received = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = deadline(limit, reader.read_until(b'\n', &mut line)).await??;
        if n == 0 {
            break;
        }
        received += n;
        if received > max_response_size {
            return Err(WhoisError::ResponseTooLarge);
        }

        let decoded = String::from_utf8_lossy(&line);
        if let Some(target) = referral_target(&decoded) {
            referral = Some(target.to_string());
        }
        text.push_str(&decoded);
    }

    Ok(ServerReply { text, referral })
}

/// Errors from name resolution that do not mean the name is absent:
/// EAI_AGAIN style failures and interrupted or timed out lookups.
fn is_transient_resolver_error(error: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    if matches!(
        error.kind(),
        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock
    ) {
        return true;
    }
    let message = error.to_string().to_ascii_lowercase();
    message.contains("temporary failure") || message.contains("try again")
}

/// The server named by a `Registrar WHOIS Server:` line, if it names one.
pub fn referral_target(line: &str) -> Option<&str> {
    let line = line.trim();
    let prefix = line.get(..REFERRAL_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(REFERRAL_PREFIX) {
        return None;
    }
    let target = line[REFERRAL_PREFIX.len()..].trim();
    (!target.is_empty()).then_some(target)
}

async fn deadline<F: Future>(limit: Option<Duration>, future: F) -> Result<F::Output, WhoisError> {
    match limit {
        Some(limit) => Ok(timeout(limit, future).await?),
        None => Ok(future.await),
    }
}
