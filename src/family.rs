use std::fmt;

/// Address family a prefix-list or peer belongs to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Ipv4, Family::Ipv6];

    /// Family of a peer address, anything with a ':' is IPv6
    pub fn of_address(addr: &str) -> Self {
        if addr.contains(':') {
            Family::Ipv6
        } else {
            Family::Ipv4
        }
    }

    /// Generated prefix-list name, e.g. `AS65001-In-v4`
    pub fn list_name(self, asn: u32) -> String {
        let suffix = match self {
            Family::Ipv4 => "v4",
            Family::Ipv6 => "v6",
        };
        format!("AS{}-In-{}", asn, suffix)
    }

    /// `address-family` directive under `router bgp`
    pub fn address_family(self) -> &'static str {
        match self {
            Family::Ipv4 => "address-family ipv4 unicast",
            Family::Ipv6 => "address-family ipv6 unicast",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            Family::Ipv4 => "IPv4",
            Family::Ipv6 => "IPv6",
        };
        write!(f, "{}", display)
    }
}
