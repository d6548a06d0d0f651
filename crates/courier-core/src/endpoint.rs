//! Endpoint identity and the transport literal table.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport kind of an endpoint address.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    #[default]
    Undefined,
    Inproc,
    Ipc,
    Tcp,
    Pgm,
    Epgm,
}

impl Transport {
    pub const fn as_str(self) -> &'static str {
        match self {
            Transport::Undefined => "",
            Transport::Inproc => "inproc",
            Transport::Ipc => "ipc",
            Transport::Tcp => "tcp",
            Transport::Pgm => "pgm",
            Transport::Epgm => "epgm",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" => Some(Transport::Undefined),
            "inproc" => Some(Transport::Inproc),
            "ipc" => Some(Transport::Ipc),
            "tcp" => Some(Transport::Tcp),
            "pgm" => Some(Transport::Pgm),
            "epgm" => Some(Transport::Epgm),
            _ => None,
        }
    }
}

/// One remote peer: transport kind, IPv4 address, port.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Endpoint {
    pub transport: Transport,
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(transport: Transport, addr: Ipv4Addr, port: u16) -> Self {
        Self {
            transport,
            addr,
            port,
        }
    }

    pub fn tcp(addr: Ipv4Addr, port: u16) -> Self {
        Self::new(Transport::Tcp, addr, port)
    }

    /// Connection-string form, e.g. `tcp://10.0.0.1:4000`.
    pub fn connection_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.transport.as_str(), self.addr, self.port)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseEndpointError {
    #[error("unknown transport `{0}`")]
    UnknownTransport(String),
    #[error("invalid ipv4 address `{0}`")]
    InvalidAddress(String),
    #[error("invalid port `{0}`")]
    InvalidPort(String),
}

impl FromStr for Endpoint {
    type Err = ParseEndpointError;

    /// Parse `transport://addr:port`. A missing transport prefix defaults
    /// to tcp; a missing port defaults to 0.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (transport, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => {
                let transport = Transport::parse(scheme)
                    .ok_or_else(|| ParseEndpointError::UnknownTransport(scheme.to_string()))?;
                (transport, rest)
            }
            None => (Transport::Tcp, raw),
        };
        let (addr_raw, port) = match rest.rsplit_once(':') {
            Some((addr_raw, port_raw)) => {
                let port = port_raw
                    .parse::<u16>()
                    .map_err(|_| ParseEndpointError::InvalidPort(port_raw.to_string()))?;
                (addr_raw, port)
            }
            None => (rest, 0),
        };
        let addr = addr_raw
            .parse::<Ipv4Addr>()
            .map_err(|_| ParseEndpointError::InvalidAddress(addr_raw.to_string()))?;
        Ok(Endpoint::new(transport, addr, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_display_roundtrips_through_parse() {
        let endpoint = Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 1), 4000);
        assert_eq!(endpoint.to_string(), "tcp://10.0.0.1:4000");
        assert_eq!("tcp://10.0.0.1:4000".parse::<Endpoint>(), Ok(endpoint));
    }

    #[test]
    fn parse_defaults_missing_transport_and_port() {
        let endpoint = "10.0.0.1".parse::<Endpoint>().unwrap();
        assert_eq!(endpoint.transport, Transport::Tcp);
        assert_eq!(endpoint.port, 0);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            "ftp://10.0.0.1:21".parse::<Endpoint>(),
            Err(ParseEndpointError::UnknownTransport("ftp".to_string()))
        );
        assert_eq!(
            "tcp://example:80".parse::<Endpoint>(),
            Err(ParseEndpointError::InvalidAddress("example".to_string()))
        );
        assert_eq!(
            "tcp://10.0.0.1:notaport".parse::<Endpoint>(),
            Err(ParseEndpointError::InvalidPort("notaport".to_string()))
        );
    }

    #[test]
    fn transport_literal_table_roundtrips() {
        for transport in [
            Transport::Undefined,
            Transport::Inproc,
            Transport::Ipc,
            Transport::Tcp,
            Transport::Pgm,
            Transport::Epgm,
        ] {
            assert_eq!(Transport::parse(transport.as_str()), Some(transport));
        }
        assert_eq!(Transport::parse("bogus"), None);
    }

    #[test]
    fn endpoints_order_by_transport_then_address() {
        let a = Endpoint::new(Transport::Ipc, Ipv4Addr::new(10, 0, 0, 2), 1);
        let b = Endpoint::tcp(Ipv4Addr::new(10, 0, 0, 1), 9);
        assert!(a < b);
    }
}
