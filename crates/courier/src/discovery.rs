//! Discovery-facing surface: endpoint snapshots and hosts-list parsing.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use courier_core::{Endpoint, Transport};

/// One discovery observation for a service: every live handle name and
/// the endpoint set backing it.
pub type EndpointSnapshot = BTreeMap<String, BTreeSet<Endpoint>>;

/// Source of endpoint lists for a service (file, http, ...).
///
/// Implementations are polled by the discovery layer; the router only
/// ever sees the resulting snapshots.
pub trait HostsFetcher: Send {
    fn fetch(&mut self) -> io::Result<Vec<Endpoint>>;
}

/// Parse a newline-separated hosts list.
///
/// Blank lines and `#` comments are skipped. An optional `transport://`
/// prefix defaults to tcp (as does an unknown one); a missing port
/// defaults to 0. Lines whose address part is not an IPv4 literal are
/// skipped.
pub fn parse_hosts_list(data: &str) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (transport, rest) = match line.split_once("://") {
            Some((scheme, rest)) => match Transport::parse(scheme) {
                Some(Transport::Undefined) | None => (Transport::Tcp, rest),
                Some(transport) => (transport, rest),
            },
            None => (Transport::Tcp, line),
        };

        let (addr_raw, port) = match rest.rsplit_once(':') {
            Some((addr_raw, port_raw)) => match port_raw.parse::<u16>() {
                Ok(port) => (addr_raw, port),
                Err(_) => continue,
            },
            None => (rest, 0),
        };

        let Ok(addr) = addr_raw.parse() else {
            continue;
        };
        endpoints.push(Endpoint::new(transport, addr, port));
    }
    endpoints
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn hosts_list_skips_comments_and_blanks() {
        let endpoints = parse_hosts_list("# fleet a\n\n10.0.0.1:4000\n  # trailing\n10.0.0.2:4001\n");
        assert_eq!(
            endpoints,
            vec![
                Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 1), 4000),
                Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 2), 4001),
            ]
        );
    }

    #[test]
    fn hosts_list_defaults_transport_and_port() {
        let endpoints = parse_hosts_list("10.0.0.1\nepgm://10.0.0.2:5000\nbogus://10.0.0.3:1");
        assert_eq!(
            endpoints,
            vec![
                Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 1), 0),
                Endpoint::new(Transport::Epgm, Ipv4Addr::new(10, 0, 0, 2), 5000),
                Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 3), 1),
            ]
        );
    }

    #[test]
    fn hosts_list_skips_unparseable_lines() {
        let endpoints = parse_hosts_list("db-host-01:4000\n10.0.0.1:badport\n10.0.0.9:90");
        assert_eq!(endpoints, vec![Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 9), 90)]);
    }
}
