use crate::errors::WhoisError;
use std::fmt;

/// A server spec split into host and port. A `None` port means the caller
/// supplies the protocol default; it is never the same as port 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub host: String,
    pub port: Option<u16>,
}

impl ServerSpec {
    /// Parses `host`, `host:port`, `[v6]`, `[v6]:port` or a bare IPv6 literal.
    ///
    /// Two or more colons are taken to mean IPv6. Without brackets the port
    /// cannot be told apart from the address, so a bare literal never
    /// carries one.
    pub fn parse(spec: &str) -> Result<Self, WhoisError> {
        let colons = spec.matches(':').count();

        if colons >= 2 {
            if let Some(rest) = spec.strip_prefix('[') {
                let (host, trailing) = match rest.split_once(']') {
                    Some((host, trailing)) => (host, Some(trailing)),
                    None => (rest, None),
                };
                let port = match trailing {
                    Some(trailing) if !trailing.is_empty() => {
                        let segment = trailing.rsplit(':').next().unwrap_or(trailing);
                        Some(parse_port(spec, segment)?)
                    }
                    _ => None,
                };
                return Ok(Self {
                    host: host.to_string(),
                    port,
                });
            }

            return Ok(Self {
                host: spec.to_string(),
                port: None,
            });
        }

        let mut segments = spec.split(':');
        let host = segments.next().unwrap_or_default().to_string();
        let port = match segments.next() {
            Some(segment) => Some(parse_port(spec, segment)?),
            None => None,
        };

        Ok(Self { host, port })
    }

    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }
}

impl fmt::Display for ServerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bracket = self.host.contains(':');
        match (bracket, self.port) {
            (true, Some(port)) => write!(f, "[{}]:{}", self.host, port),
            (true, None) => write!(f, "[{}]", self.host),
            (false, Some(port)) => write!(f, "{}:{}", self.host, port),
            (false, None) => f.write_str(&self.host),
        }
    }
}

fn parse_port(spec: &str, segment: &str) -> Result<u16, WhoisError> {
    segment
        .trim()
        .parse()
        .map_err(|_| WhoisError::InvalidServerSpec(format!("bad port {:?} in {:?}", segment, spec)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(host: &str, port: Option<u16>) -> ServerSpec {
        ServerSpec {
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn test_plain_host() {
        assert_eq!(ServerSpec::parse("whois.example.com").unwrap(), spec("whois.example.com", None));
        assert_eq!(
            ServerSpec::parse("whois.example.com:43").unwrap(),
            spec("whois.example.com", Some(43))
        );
    }

    #[test]
    fn test_bracketed_ipv6() {
        assert_eq!(ServerSpec::parse("[2001:db8::1]:43").unwrap(), spec("2001:db8::1", Some(43)));
        assert_eq!(ServerSpec::parse("[2001:db8::1]").unwrap(), spec("2001:db8::1", None));
        assert_eq!(ServerSpec::parse("[::1]:4343").unwrap(), spec("::1", Some(4343)));
    }

    #[test]
    fn test_bare_ipv6_never_has_port() {
        assert_eq!(ServerSpec::parse("2001:db8::1").unwrap(), spec("2001:db8::1", None));
        assert_eq!(ServerSpec::parse("2001:db8::1:43").unwrap(), spec("2001:db8::1:43", None));
    }

    #[test]
    fn test_bad_port_is_an_error() {
        assert!(matches!(
            ServerSpec::parse("whois.example.com:abc"),
            Err(WhoisError::InvalidServerSpec(_))
        ));
        assert!(matches!(
            ServerSpec::parse("whois.example.com:"),
            Err(WhoisError::InvalidServerSpec(_))
        ));
        assert!(matches!(
            ServerSpec::parse("[2001:db8::1]:x"),
            Err(WhoisError::InvalidServerSpec(_))
        ));
        assert!(ServerSpec::parse("whois.example.com:70000").is_err());
    }

    #[test]
    fn test_port_default_and_display() {
        let parsed = ServerSpec::parse("whois.example.com").unwrap();
        assert_eq!(parsed.port_or(43), 43);
        assert_eq!(parsed.to_string(), "whois.example.com");
        assert_eq!(spec("2001:db8::1", Some(43)).to_string(), "[2001:db8::1]:43");
        assert_eq!(spec("whois.example.com", Some(4343)).to_string(), "whois.example.com:4343");
    }
}
