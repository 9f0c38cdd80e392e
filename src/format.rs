//! Node key formatting
//!
//! The ring never looks at a node directly. A [`NodeKeyFormatter`] renders each node into a
//! base key (its identity on the ring) and one key per repetition, which is then hashed into
//! ring positions. Two nodes with the same base key are the same server for the ring, even if
//! they are different values.

use std::fmt::{self, Display};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// port memcached listens on unless configured otherwise
pub const DEFAULT_MEMCACHED_PORT: u16 = 11211;

/// Renders nodes into the keys that get hashed onto the ring
///
/// `base_key` is computed once when a node joins the ring and is cached there; every
/// repetition key is derived from it via `repetition_key`.
pub trait NodeKeyFormatter<N: ?Sized> {
    /// Identity of `node` on the ring. Nodes with equal base keys are treated as one server.
    fn base_key(&self, node: &N) -> String;

    /// Key of the `repetition`-th virtual node of `node`, whose base key is `base`.
    fn repetition_key(&self, node: &N, base: &str, repetition: u32) -> String;

    /// Key of the `repetition`-th virtual node of `node`.
    fn format(&self, node: &N, repetition: u32) -> String {
        let base = self.base_key(node);
        self.repetition_key(node, &base, repetition)
    }
}

/// Nodes that know how to name their own virtual nodes, see [`SelfFormatter`]
pub trait FormatKey {
    fn format_key(&self, repetition: u32) -> String;
}

/// plain names are suffixed with the repetition: `"cache-a"` becomes `"cache-a0"`, `"cache-a1"`, ...
impl FormatKey for str {
    fn format_key(&self, repetition: u32) -> String {
        format!("{self}{repetition}")
    }
}

impl FormatKey for String {
    fn format_key(&self, repetition: u32) -> String {
        self.as_str().format_key(repetition)
    }
}

impl<T: FormatKey + ?Sized> FormatKey for &T {
    fn format_key(&self, repetition: u32) -> String {
        (**self).format_key(repetition)
    }
}

impl<T: FormatKey + ?Sized> FormatKey for Arc<T> {
    fn format_key(&self, repetition: u32) -> String {
        (**self).format_key(repetition)
    }
}

/// Formatter that defers to the node's own [`FormatKey`] implementation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelfFormatter;

impl<N: FormatKey + ?Sized> NodeKeyFormatter<N> for SelfFormatter {
    fn base_key(&self, node: &N) -> String {
        node.format_key(0)
    }

    fn repetition_key(&self, node: &N, _base: &str, repetition: u32) -> String {
        node.format_key(repetition)
    }
}

/// Network identity of a server, rendered by [`AddressFormatter`]
pub trait NodeAddress {
    /// host name the server was configured with, if it was configured by name
    fn hostname(&self) -> Option<&str> {
        None
    }

    fn ip(&self) -> Option<IpAddr>;

    fn port(&self) -> u16;
}

impl NodeAddress for SocketAddr {
    fn ip(&self) -> Option<IpAddr> {
        Some(SocketAddr::ip(self))
    }

    fn port(&self) -> u16 {
        SocketAddr::port(self)
    }
}

impl<T: NodeAddress + ?Sized> NodeAddress for &T {
    fn hostname(&self) -> Option<&str> {
        (**self).hostname()
    }

    fn ip(&self) -> Option<IpAddr> {
        (**self).ip()
    }

    fn port(&self) -> u16 {
        (**self).port()
    }
}

/// Address of a server, by name, by ip or both
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct ServerAddr {
    pub hostname: Option<String>,
    pub ip: Option<IpAddr>,
    pub port: u16,
}

impl ServerAddr {
    /// `host` is stored as ip if it parses as one, otherwise as host name
    pub fn new(host: &str, port: u16) -> Self {
        match host.parse::<IpAddr>() {
            Ok(ip) => ServerAddr {
                hostname: None,
                ip: Some(ip),
                port,
            },
            Err(_) => ServerAddr {
                hostname: Some(host.to_string()),
                ip: None,
                port,
            },
        }
    }

    /// a host name together with the ip it resolved to
    pub fn resolved(hostname: &str, ip: IpAddr, port: u16) -> Self {
        ServerAddr {
            hostname: Some(hostname.to_string()),
            ip: Some(ip),
            port,
        }
    }
}

impl NodeAddress for ServerAddr {
    fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    fn port(&self) -> u16 {
        self.port
    }
}

impl From<SocketAddr> for ServerAddr {
    fn from(addr: SocketAddr) -> Self {
        ServerAddr {
            hostname: None,
            ip: Some(addr.ip()),
            port: addr.port(),
        }
    }
}

/// Parses `host`, `host:port`, `ip:port` or `[ipv6]:port`. The port defaults to 11211.
impl FromStr for ServerAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(addr.into());
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(ServerAddr::new(&ip.to_string(), DEFAULT_MEMCACHED_PORT));
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| Error::InvalidAddress(s.to_string()))?;
                (host, port)
            }
            None => (s, DEFAULT_MEMCACHED_PORT),
        };

        if host.is_empty() || host.contains(':') {
            return Err(Error::InvalidAddress(s.to_string()));
        }

        Ok(ServerAddr::new(host, port))
    }
}

/// Naming conventions for the base key of a server address
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "derive", serde(rename_all = "kebab-case"))]
pub enum KeyFormat {
    /// `hostname/ip:port`, or `ip:port` when the server has no host name
    #[default]
    Spymemcached,
    /// `host` or `host:port`, the port is left out if it is 11211
    Libmemcached,
}

impl KeyFormat {
    /// Look up a convention by name.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a known convention. Use `str::parse` to handle unknown names.
    pub fn from_name(name: &str) -> KeyFormat {
        match name.parse::<KeyFormat>() {
            Ok(format) => format,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyFormat::Spymemcached => "spymemcached",
            KeyFormat::Libmemcached => "libmemcached",
        }
    }
}

impl Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [KeyFormat::Spymemcached, KeyFormat::Libmemcached]
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownKeyFormat(s.to_string()))
    }
}

/// Formatter for [`NodeAddress`] nodes using one of the [`KeyFormat`] conventions
///
/// Repetition keys are `"{base}-{repetition}"`. Nodes that render their own keys through
/// [`FormatKey`] are not consulted here, use [`SelfFormatter`] for them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddressFormatter {
    pub format: KeyFormat,
}

impl AddressFormatter {
    pub fn new(format: KeyFormat) -> Self {
        AddressFormatter { format }
    }
}

impl<N: NodeAddress + ?Sized> NodeKeyFormatter<N> for AddressFormatter {
    fn base_key(&self, node: &N) -> String {
        let port = node.port();

        match self.format {
            KeyFormat::Spymemcached => match (node.hostname(), node.ip()) {
                (Some(hostname), Some(ip)) => format!("{hostname}/{ip}:{port}"),
                (None, Some(ip)) => format!("{ip}:{port}"),
                (Some(hostname), None) => format!("{hostname}:{port}"),
                (None, None) => format!(":{port}"),
            },
            KeyFormat::Libmemcached => {
                let host = match (node.hostname(), node.ip()) {
                    (Some(hostname), _) => hostname.to_string(),
                    (None, Some(ip)) => ip.to_string(),
                    (None, None) => String::new(),
                };
                if port == DEFAULT_MEMCACHED_PORT {
                    host
                } else {
                    format!("{host}:{port}")
                }
            }
        }
    }

    fn repetition_key(&self, _node: &N, base: &str, repetition: u32) -> String {
        format!("{base}-{repetition}")
    }
}
