//! Planning the change that brings a DNS provider in line with the store.
//!
//! The plan is "delete everything the provider has, add everything the store
//! wants", compacted by dropping every addition that is identical to a
//! deletion. What remains is the actual diff.

use crate::store::{Record, RecordType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// A record set as reported by a provider.
///
/// Same shape as [`Record`], except that the type is free-form: providers also
/// report types such as SOA that the store does not manage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(rename = "FQDN")]
    pub fqdn: String,
    #[serde(rename = "RType")]
    pub rtype: String,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "RDatas")]
    pub rdatas: Vec<String>,
}

/// Deletions and additions to apply to one zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Change {
    pub deletions: Vec<Record>,
    pub additions: Vec<Record>,
}

impl Change {
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.additions.is_empty()
    }

    /// Drop every addition that exactly matches a pending deletion, together
    /// with that deletion. Rdata order does not matter.
    pub fn compact(&mut self) {
        let mut pending: FxHashMap<(String, RecordType, u32), Vec<usize>> = FxHashMap::default();
        for (idx, record) in self.deletions.iter().enumerate() {
            pending.entry(record_key(record)).or_default().push(idx);
        }

        let mut deleted = vec![false; self.deletions.len()];
        let deletions = &self.deletions;
        self.additions.retain(|addition| {
            let Some(candidates) = pending.get_mut(&record_key(addition)) else {
                return true;
            };
            let found = candidates
                .iter()
                .position(|&idx| deletions[idx].matches(&addition.rdatas));
            match found {
                Some(pos) => {
                    deleted[candidates.swap_remove(pos)] = true;
                    false
                }
                None => true,
            }
        });

        let mut flags = deleted.into_iter();
        self.deletions.retain(|_| !flags.next().unwrap_or(false));
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (sign, records) in [('-', &self.deletions), ('+', &self.additions)] {
            for record in records {
                writeln!(f, "{}{} {} {}", sign, record.fqdn, record.rtype, record.ttl)?;
                for rdata in &record.rdatas {
                    writeln!(f, "{}    {}", sign, rdata)?;
                }
            }
        }
        Ok(())
    }
}

/// Names compare case-insensitively
fn record_key(record: &Record) -> (String, RecordType, u32) {
    (record.fqdn.to_ascii_lowercase(), record.rtype, record.ttl)
}

/// Keep the provider record sets the store manages.
///
/// Types outside the store's set are skipped, and so are the NS records of the
/// zone apex, which belong to the provider.
pub fn filter_record_sets(sets: &[RecordSet], apex: &str) -> Vec<Record> {
    let mut records = Vec::with_capacity(sets.len());
    for set in sets {
        let rtype = match set.rtype.parse::<RecordType>() {
            Ok(rtype) => rtype,
            Err(_) => {
                trace!(fqdn = %set.fqdn, rtype = %set.rtype, "skipping unmanaged record set");
                continue;
            }
        };
        if rtype == RecordType::Ns && set.fqdn.eq_ignore_ascii_case(apex) {
            continue;
        }
        records.push(Record {
            fqdn: set.fqdn.clone(),
            rtype,
            ttl: set.ttl,
            rdatas: set.rdatas.clone(),
        });
    }
    records
}

/// Plan the change turning `current` into `desired` for the zone at `apex`
pub fn plan_change(desired: &[Record], current: &[Record], apex: &str) -> Change {
    let mut change = Change {
        deletions: current
            .iter()
            .filter(|r| !(r.rtype == RecordType::Ns && r.fqdn.eq_ignore_ascii_case(apex)))
            .cloned()
            .collect(),
        additions: desired.to_vec(),
    };
    change.compact();
    debug!(
        zone = apex,
        deletions = change.deletions.len(),
        additions = change.additions.len(),
        "Planned change"
    );
    change
}
