use std::fmt;

/// Neighbor-discovery protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Cdp,
    Lldp,
}

impl Protocol {
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Cdp => "CDP",
            Protocol::Lldp => "LLDP",
        }
    }

    /// Command that lists the detailed neighbor table
    pub fn detail_command(&self) -> &'static str {
        match self {
            Protocol::Cdp => "show cdp neighbors detail",
            Protocol::Lldp => "show lldp neighbors detail",
        }
    }

    /// Record field holding the neighbor's reported name
    pub fn remote_host_field(&self) -> &'static str {
        match self {
            Protocol::Cdp => "destination_host",
            Protocol::Lldp => "neighbor",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Neighbor fields exactly as the device reported them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNeighbor {
    pub remote_host: String,
    pub local_interface: String,
    pub remote_interface: String,
}

/// A neighbor table entry with its canonical comparison keys.
/// Built from a `RawNeighbor` by the fetcher; the canonical fields are never set by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRecord {
    raw: RawNeighbor,
    host: String,
    local_short_if: String,
    remote_short_if: String,
}

impl NeighborRecord {
    pub(crate) fn new(
        raw: RawNeighbor,
        host: String,
        local_short_if: String,
        remote_short_if: String,
    ) -> Self {
        Self {
            raw,
            host,
            local_short_if,
            remote_short_if,
        }
    }

    pub fn raw(&self) -> &RawNeighbor {
        &self.raw
    }

    /// Remote host name without its domain suffix
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn local_short_if(&self) -> &str {
        &self.local_short_if
    }

    pub fn remote_short_if(&self) -> &str {
        &self.remote_short_if
    }
}
