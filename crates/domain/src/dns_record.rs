use std::fmt;
use std::str::FromStr;

/// Record types the resolver understands on the wire. Forwarding supports
/// all of these (plus any other qtype it does not recognize, forwarded
/// opaquely); local answer synthesis (block/rewrite) is limited to A,
/// AAAA and CNAME (spec §6, Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Https,
    Txt,
    Srv,
    Mx,
    Ns,
    Ptr,
    Other(u16),
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Https => "HTTPS",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Other(_) => "OTHER",
        }
    }

    /// Whether this record type can be locally synthesized for a block or
    /// rewrite answer (spec §4.1 answer synthesis).
    pub fn is_synthesizable(&self) -> bool {
        matches!(self, RecordType::A | RecordType::Aaaa | RecordType::Cname)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "HTTPS" | "SVCB" => Ok(RecordType::Https),
            "TXT" => Ok(RecordType::Txt),
            "SRV" => Ok(RecordType::Srv),
            "MX" => Ok(RecordType::Mx),
            "NS" => Ok(RecordType::Ns),
            "PTR" => Ok(RecordType::Ptr),
            _ => Err(format!("unsupported record type: {s}")),
        }
    }
}
