//! Replaying declarative names into a record store.
//!
//! The loader carries no merge logic of its own. Every name is turned into
//! plain setter calls and the store decides what may coexist: TXT strings
//! accumulate across templates and zones, every other type can be set once.

use super::schema::{Addresses, Delegation, Forwarding, Mail, Name, Texts};
use crate::error::{Block, LoadError, RecordContext, StoreError};
use crate::store::RecordStore;
use crate::validation::{make_fqdn, parse_address};
use std::net::IpAddr;
use tracing::trace;

/// Where the names being replayed come from
#[derive(Debug, Clone, Copy)]
pub(crate) struct Origin<'a> {
    pub source: &'a str,
    pub template: Option<&'a str>,
    pub zone: &'a str,
}

impl Origin<'_> {
    fn annotate(&self, name: &str, block: Block, source: StoreError) -> LoadError {
        LoadError::Record {
            context: Box::new(RecordContext {
                source: self.source.to_string(),
                template: self.template.map(str::to_string),
                zone: self.zone.to_string(),
                name: name.to_string(),
                block,
            }),
            source,
        }
    }
}

/// Replay `names` relative to the zone in `origin`, stopping at the first
/// error.
///
/// FQDNs are computed here, per zone, so the same template applied to two
/// zones yields two independent sets of names.
pub(crate) fn replay_names(
    store: &mut RecordStore,
    names: &[Name],
    origin: Origin<'_>,
) -> Result<(), LoadError> {
    for name in names {
        let fqdn = make_fqdn(&name.name, origin.zone);
        trace!(fqdn = %fqdn, "replaying name");

        let annotate = |block: Block| move |e: StoreError| origin.annotate(&name.name, block, e);

        load_ns(store, &fqdn, &name.delegation).map_err(annotate(Block::Delegation))?;
        load_mx(store, &fqdn, &name.mail).map_err(annotate(Block::Mail))?;
        load_txt(store, &fqdn, &name.texts).map_err(annotate(Block::Texts))?;
        load_cname(store, &fqdn, &name.forwarding).map_err(annotate(Block::Forwarding))?;
        load_addresses(store, &fqdn, &name.addresses).map_err(annotate(Block::Addresses))?;
    }
    Ok(())
}

fn load_ns(
    store: &mut RecordStore,
    fqdn: &str,
    delegation: &Delegation,
) -> Result<(), StoreError> {
    let rdatas: Vec<String> = delegation
        .nameservers
        .iter()
        .map(|ns| ns.trim().to_string())
        .collect();
    if rdatas.is_empty() {
        return Ok(());
    }
    store.set_ns(fqdn, delegation.ttl, rdatas)
}

fn load_mx(store: &mut RecordStore, fqdn: &str, mail: &Mail) -> Result<(), StoreError> {
    let rdatas: Vec<String> = mail
        .mailservers
        .iter()
        .map(|mx| format!("{} {}", mx.preference, mx.mailserver.trim()))
        .collect();
    if rdatas.is_empty() {
        return Ok(());
    }
    store.set_mx(fqdn, mail.ttl, rdatas)
}

fn load_txt(store: &mut RecordStore, fqdn: &str, texts: &Texts) -> Result<(), StoreError> {
    for rdata in &texts.data {
        store.add_txt(fqdn, texts.ttl, rdata.trim())?;
    }
    Ok(())
}

fn load_cname(
    store: &mut RecordStore,
    fqdn: &str,
    forwarding: &Forwarding,
) -> Result<(), StoreError> {
    let target = forwarding.target.trim();
    if target.is_empty() {
        return Ok(());
    }
    store.set_cname(fqdn, forwarding.ttl, target)
}

/// Split literals into A and AAAA sets by format. A literal that is neither
/// fails the whole block before anything is written.
fn load_addresses(
    store: &mut RecordStore,
    fqdn: &str,
    addresses: &Addresses,
) -> Result<(), StoreError> {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for literal in &addresses.literals {
        let literal = literal.trim();
        match parse_address(literal) {
            Some(IpAddr::V4(_)) => v4.push(literal.to_string()),
            Some(IpAddr::V6(_)) => v6.push(literal.to_string()),
            None => {
                return Err(StoreError::InvalidRdata(format!(
                    "invalid address: {}",
                    literal
                )));
            }
        }
    }

    if !v4.is_empty() {
        store.set_a(fqdn, addresses.ttl, v4)?;
    }
    if !v6.is_empty() {
        store.set_aaaa(fqdn, addresses.ttl, v6)?;
    }
    Ok(())
}
