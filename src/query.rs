use crate::errors::WhoisError;
use std::net::IpAddr;

/// What a query looks like on the surface. Classification is syntactic only,
/// so `"...."` is an [`QueryType::Ipv4`] even though no such address exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Ipv4,
    Ipv6,
    Domain,
}

impl QueryType {
    pub fn classify(query: &str) -> Self {
        // Only the first colon counts: ":1:2" is not taken as IPv6.
        if query.find(':').is_some_and(|index| index > 0) {
            return QueryType::Ipv6;
        }

        if query.chars().all(|c| c.is_ascii_digit() || c == '.') {
            QueryType::Ipv4
        } else {
            QueryType::Domain
        }
    }

    pub fn is_ip(self) -> bool {
        matches!(self, QueryType::Ipv4 | QueryType::Ipv6)
    }
}

/// A single top-level lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    query: String,
    server: Option<String>,
    kind: QueryType,
}

impl LookupQuery {
    pub fn new(query: impl Into<String>, server: Option<String>) -> Self {
        let query = query.into().trim().to_string();
        let kind = QueryType::classify(&query);
        Self { query, server, kind }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn kind(&self) -> QueryType {
        self.kind
    }
}

/// IDNA ASCII form of a domain or host name. IP literals are returned as is.
pub fn to_ascii(name: &str) -> Result<String, WhoisError> {
    if name.parse::<IpAddr>().is_ok() {
        return Ok(name.to_string());
    }

    idna::domain_to_ascii(name)
        .map_err(|e| WhoisError::InvalidDomain(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_addresses_and_domains() {
        assert_eq!(QueryType::classify("2001:db8::1"), QueryType::Ipv6);
        assert_eq!(QueryType::classify("192.0.2.1"), QueryType::Ipv4);
        assert_eq!(QueryType::classify("example.com"), QueryType::Domain);
        assert_eq!(QueryType::classify("例え.jp"), QueryType::Domain);
    }

    #[test]
    fn test_classify_is_syntactic_only() {
        assert_eq!(QueryType::classify("...."), QueryType::Ipv4);
        assert_eq!(QueryType::classify("999.999"), QueryType::Ipv4);
        assert_eq!(QueryType::classify(""), QueryType::Ipv4);
    }

    #[test]
    fn test_classify_leading_colon() {
        // A colon at index 0 does not trigger the IPv6 rule.
        assert_eq!(QueryType::classify(":1:2"), QueryType::Domain);
        assert_eq!(QueryType::classify("::1"), QueryType::Domain);
        assert_eq!(QueryType::classify("1::"), QueryType::Ipv6);
    }

    #[test]
    fn test_lookup_query_trims_and_classifies_once() {
        let query = LookupQuery::new("  example.com \n", Some("whois.example:43".to_string()));
        assert_eq!(query.query(), "example.com");
        assert_eq!(query.server(), Some("whois.example:43"));
        assert_eq!(query.kind(), QueryType::Domain);
        assert!(!query.kind().is_ip());
        assert!(LookupQuery::new("192.0.2.1", None).kind().is_ip());
    }

    #[test]
    fn test_to_ascii_punycode() {
        assert_eq!(to_ascii("bücher.example").unwrap(), "xn--bcher-kva.example");
        assert_eq!(to_ascii("Example.COM").unwrap(), "example.com");
    }

    #[test]
    fn test_to_ascii_leaves_ip_literals() {
        assert_eq!(to_ascii("2001:db8::1").unwrap(), "2001:db8::1");
        assert_eq!(to_ascii("192.0.2.1").unwrap(), "192.0.2.1");
    }
}
