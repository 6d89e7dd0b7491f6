use crate::validation::rdatas_equal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The record types the store knows about, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "NS")]
    Ns,
    #[serde(rename = "MX")]
    Mx,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// All types in the order records are reported for a single name
    pub const ALL: [RecordType; 6] = [
        RecordType::Ns,
        RecordType::Mx,
        RecordType::Txt,
        RecordType::Cname,
        RecordType::A,
        RecordType::Aaaa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Cname => "CNAME",
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported record type: {}", s))
    }
}

/// A read-only view of one record type at one name.
///
/// This is the shape handed to everything outside the store: tools that push
/// to a DNS provider, compare against live lookups or print zone contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "FQDN")]
    pub fqdn: String,
    #[serde(rename = "RType")]
    pub rtype: RecordType,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "RDatas")]
    pub rdatas: Vec<String>,
}

impl Record {
    /// Whether `other` carries the same rdata, ignoring order
    pub fn matches<S: AsRef<str>>(&self, other: &[S]) -> bool {
        rdatas_equal(&self.rdatas, other)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdata) in self.rdatas.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}\t{}\tIN\t{}\t{}", self.fqdn, self.ttl, self.rtype, rdata)?;
        }
        Ok(())
    }
}
