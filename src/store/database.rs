use super::node::{Node, NodeId, RdataSet, ROOT, TxtSet};
use super::record::{Record, RecordType};
use crate::error::{Result, StoreError};
use crate::validation::{
    MAX_TXT_LEN, check_fqdn, check_ttl, is_ipv4_literal, is_ipv6_literal, is_valid_fqdn,
};
use rustc_hash::FxHashSet;

/// RFC 7505 "null MX": the domain accepts no mail
const NULL_MX: &str = "0 .";

/// In-memory resource record database.
///
/// Names form a trie keyed by label, with the root at the top. Each name holds
/// at most one rdata set per record type, and every setter enforces the DNS
/// co-existence rules before anything is written: a delegation (NS) ends local
/// authority, a CNAME owns its name exclusively, and so on.
#[derive(Debug, Clone)]
pub struct RecordStore {
    nodes: Vec<Node>,
}

impl RecordStore {
    /// Create an empty store holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(String::new(), None)],
        }
    }

    /// Number of names in the store, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        !self.nodes[ROOT as usize].has_children()
    }

    /// Whether `fqdn` exists as a node (with or without records)
    pub fn contains(&self, fqdn: &str) -> bool {
        self.lookup(fqdn).is_ok()
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    /// Labels of a validated fqdn, top-level label first
    fn labels(fqdn: &str) -> Vec<String> {
        fqdn.trim_end_matches('.')
            .rsplit('.')
            .map(|label| label.to_ascii_lowercase())
            .collect()
    }

    /// Walk from the root towards `fqdn`, optionally creating missing nodes.
    ///
    /// Passing through a node that holds a delegation fails, since everything
    /// below it is served elsewhere.
    fn resolve(&mut self, fqdn: &str, create: bool) -> Result<NodeId> {
        check_fqdn(fqdn)?;

        let mut current = ROOT;
        for label in Self::labels(fqdn) {
            if self.node(current).is_delegated() {
                return Err(StoreError::OutOfAuthority(fqdn.to_string()));
            }
            current = match self.node(current).find_child(&label) {
                Some(child) => child,
                None if create => self.add_node(current, &label),
                None => return Err(StoreError::NotFound(fqdn.to_string())),
            };
        }
        Ok(current)
    }

    fn lookup(&self, fqdn: &str) -> Result<NodeId> {
        check_fqdn(fqdn)?;

        let mut current = ROOT;
        for label in Self::labels(fqdn) {
            if self.node(current).is_delegated() {
                return Err(StoreError::OutOfAuthority(fqdn.to_string()));
            }
            current = self
                .node(current)
                .find_child(&label)
                .ok_or_else(|| StoreError::NotFound(fqdn.to_string()))?;
        }
        Ok(current)
    }

    fn add_node(&mut self, parent: NodeId, label: &str) -> NodeId {
        let index = self.nodes.len() as NodeId;
        let fqdn = format!("{}.{}", label, self.node(parent).fqdn);
        self.nodes.push(Node::new(fqdn, Some(parent)));
        self.node_mut(parent).add_child(label, index);
        index
    }

    /// Resolve (creating if needed) and run the checks every setter shares
    fn prepare(&mut self, fqdn: &str, rtype: RecordType) -> Result<NodeId> {
        let id = self.resolve(fqdn, true)?;
        let node = self.node(id);
        if node.has(rtype) {
            return Err(StoreError::AlreadySet(rtype));
        }
        if let Some(existing) = node.conflict_for(rtype) {
            return Err(StoreError::ConflictingRecordType {
                fqdn: node.fqdn.clone(),
                rtype,
                existing,
            });
        }
        Ok(id)
    }

    fn check_rdatas<F>(rdatas: &[String], valid: F) -> Result<()>
    where
        F: Fn(&str) -> std::result::Result<(), String>,
    {
        if rdatas.is_empty() {
            return Err(StoreError::EmptyRdata);
        }
        let mut seen = FxHashSet::default();
        for rdata in rdatas {
            valid(rdata.as_str()).map_err(StoreError::InvalidRdata)?;
            if !seen.insert(rdata.as_str()) {
                return Err(StoreError::DuplicateRdata(rdata.clone()));
            }
        }
        Ok(())
    }

    /* --- NS -------------------------------------------------------------- */

    /// Delegate `fqdn` to the given nameservers
    pub fn set_ns(&mut self, fqdn: &str, ttl: i64, rdatas: Vec<String>) -> Result<()> {
        check_fqdn(fqdn)?;
        check_ttl(ttl)?;
        Self::check_rdatas(&rdatas, |rdata| {
            if is_valid_fqdn(rdata) {
                Ok(())
            } else {
                Err(format!("invalid FQDN: {}", rdata))
            }
        })?;

        let id = self.prepare(fqdn, RecordType::Ns)?;
        if self.node(id).has_children() {
            return Err(StoreError::DelegationHasChildren(
                self.node(id).fqdn.clone(),
            ));
        }

        self.node_mut(id).ns = Some(RdataSet { ttl, rdatas });
        Ok(())
    }

    pub fn ns(&self, fqdn: &str, ttl: u32) -> Result<Record> {
        self.get(fqdn, RecordType::Ns, ttl)
    }

    /* --- MX -------------------------------------------------------------- */

    /// Set the mail exchangers of `fqdn`, each given as `"preference host"`
    pub fn set_mx(&mut self, fqdn: &str, ttl: i64, rdatas: Vec<String>) -> Result<()> {
        check_fqdn(fqdn)?;
        check_ttl(ttl)?;
        if rdatas.is_empty() {
            return Err(StoreError::EmptyRdata);
        }
        if !(rdatas.len() == 1 && rdatas[0] == NULL_MX) {
            let mut seen = FxHashSet::default();
            for rdata in &rdatas {
                let hostname = parse_mx(rdata)?;
                if !seen.insert(hostname) {
                    return Err(StoreError::DuplicateRdata(rdata.clone()));
                }
            }
        }

        let id = self.prepare(fqdn, RecordType::Mx)?;
        self.node_mut(id).mx = Some(RdataSet { ttl, rdatas });
        Ok(())
    }

    pub fn mx(&self, fqdn: &str, ttl: u32) -> Result<Record> {
        self.get(fqdn, RecordType::Mx, ttl)
    }

    /* --- TXT ------------------------------------------------------------- */

    /// Append one string to the TXT set of `fqdn`.
    ///
    /// A non-zero TTL sticks: a later call with a different non-zero TTL is
    /// rejected, while a zero TTL is always accepted and keeps the recorded one.
    pub fn add_txt(&mut self, fqdn: &str, ttl: i64, rdata: &str) -> Result<()> {
        check_fqdn(fqdn)?;
        check_ttl(ttl)?;
        if rdata.is_empty() {
            return Err(StoreError::EmptyRdata);
        }
        if rdata.len() > MAX_TXT_LEN {
            return Err(StoreError::InvalidRdata(format!(
                "too large: {} bytes",
                rdata.len()
            )));
        }

        let id = self.resolve(fqdn, true)?;
        let node = self.node(id);
        let existing = node.txt.as_ref();

        if let Some(txt) = existing {
            if txt.ttl != 0 && ttl != 0 && ttl != txt.ttl {
                return Err(StoreError::TxtTtlMismatch {
                    existing: txt.ttl,
                    requested: ttl,
                });
            }
            if txt.rdatas.iter().any(|s| s == rdata) {
                return Err(StoreError::DuplicateRdata(rdata.to_string()));
            }
        }
        if let Some(conflict) = node.conflict_for(RecordType::Txt) {
            return Err(StoreError::ConflictingRecordType {
                fqdn: node.fqdn.clone(),
                rtype: RecordType::Txt,
                existing: conflict,
            });
        }

        let spf1 = has_policy_prefix(rdata, "v=spf1");
        let dkim1 = has_policy_prefix(rdata, "v=dkim1");
        if let Some(txt) = existing {
            if spf1 && txt.spf1 {
                return Err(StoreError::DuplicateRdata(format!(
                    "SPF already set: {}",
                    rdata
                )));
            }
            if dkim1 && txt.dkim1 {
                return Err(StoreError::DuplicateRdata(format!(
                    "DKIM already set: {}",
                    rdata
                )));
            }
        }

        let txt = self.node_mut(id).txt.get_or_insert_with(TxtSet::default);
        if ttl != 0 {
            txt.ttl = ttl;
        }
        txt.spf1 |= spf1;
        txt.dkim1 |= dkim1;
        txt.rdatas.push(rdata.to_string());
        Ok(())
    }

    /// TXT strings come back quoted, ready for zone file presentation
    pub fn txt(&self, fqdn: &str, ttl: u32) -> Result<Record> {
        self.get(fqdn, RecordType::Txt, ttl)
    }

    /* --- CNAME ----------------------------------------------------------- */

    /// Alias `fqdn` to `target`
    pub fn set_cname(&mut self, fqdn: &str, ttl: i64, target: &str) -> Result<()> {
        check_fqdn(fqdn)?;
        check_ttl(ttl)?;
        if target.is_empty() {
            return Err(StoreError::EmptyRdata);
        }
        if !is_valid_fqdn(target) {
            return Err(StoreError::InvalidRdata(format!("invalid FQDN: {}", target)));
        }

        let id = self.prepare(fqdn, RecordType::Cname)?;
        self.node_mut(id).cname = Some(RdataSet {
            ttl,
            rdatas: vec![target.to_string()],
        });
        Ok(())
    }

    pub fn cname(&self, fqdn: &str, ttl: u32) -> Result<Record> {
        self.get(fqdn, RecordType::Cname, ttl)
    }

    /* --- A --------------------------------------------------------------- */

    pub fn set_a(&mut self, fqdn: &str, ttl: i64, rdatas: Vec<String>) -> Result<()> {
        check_fqdn(fqdn)?;
        check_ttl(ttl)?;
        Self::check_rdatas(&rdatas, |rdata| {
            if is_ipv4_literal(rdata) {
                Ok(())
            } else {
                Err(format!("invalid IPv4 address: {}", rdata))
            }
        })?;

        let id = self.prepare(fqdn, RecordType::A)?;
        self.node_mut(id).a = Some(RdataSet { ttl, rdatas });
        Ok(())
    }

    pub fn a(&self, fqdn: &str, ttl: u32) -> Result<Record> {
        self.get(fqdn, RecordType::A, ttl)
    }

    /* --- AAAA ------------------------------------------------------------ */

    pub fn set_aaaa(&mut self, fqdn: &str, ttl: i64, rdatas: Vec<String>) -> Result<()> {
        check_fqdn(fqdn)?;
        check_ttl(ttl)?;
        Self::check_rdatas(&rdatas, |rdata| {
            if is_ipv6_literal(rdata) {
                Ok(())
            } else {
                Err(format!("invalid IPv6 address: {}", rdata))
            }
        })?;

        let id = self.prepare(fqdn, RecordType::Aaaa)?;
        self.node_mut(id).aaaa = Some(RdataSet { ttl, rdatas });
        Ok(())
    }

    pub fn aaaa(&self, fqdn: &str, ttl: u32) -> Result<Record> {
        self.get(fqdn, RecordType::Aaaa, ttl)
    }

    /* --- queries --------------------------------------------------------- */

    /// One record type at `fqdn`, with `ttl` filled in where none was set
    pub fn get(&self, fqdn: &str, rtype: RecordType, ttl: u32) -> Result<Record> {
        check_ttl(i64::from(ttl))?;
        let node = self.node(self.lookup(fqdn)?);
        node.record(rtype, ttl).ok_or_else(|| StoreError::NoSuchRecord {
            fqdn: node.fqdn.clone(),
            rtype,
        })
    }

    /// Every record at exactly `fqdn`, ordered NS, MX, TXT, CNAME, A, AAAA
    pub fn records(&self, fqdn: &str, ttl: u32) -> Result<Vec<Record>> {
        check_ttl(i64::from(ttl))?;
        let node = self.node(self.lookup(fqdn)?);
        Ok(node.records(ttl).collect())
    }

    /// Every record at `fqdn` and below it.
    ///
    /// Names are visited pre-order with siblings in label order, so the output
    /// does not depend on the order in which names were inserted.
    pub fn zone(&self, fqdn: &str, ttl: u32) -> Result<Vec<Record>> {
        check_ttl(i64::from(ttl))?;
        let start = self.lookup(fqdn)?;

        let mut records = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            records.extend(node.records(ttl));
            stack.extend(node.children().rev());
        }
        Ok(records)
    }

    /// Names below the root in pre-order, useful for listing what a store holds
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.node(ROOT).children().rev().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            names.push(node.fqdn.as_str());
            stack.extend(node.children().rev());
        }
        names
    }

    /// Nearest delegation at or above `fqdn`, following parent links from the
    /// deepest existing ancestor.
    pub fn delegation_point(&self, fqdn: &str) -> Result<Option<&str>> {
        check_fqdn(fqdn)?;

        let mut current = ROOT;
        for label in Self::labels(fqdn) {
            match self.node(current).find_child(&label) {
                Some(child) => current = child,
                None => break,
            }
        }

        let mut cursor = Some(current);
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.is_delegated() {
                return Ok(Some(node.fqdn.as_str()));
            }
            cursor = node.parent;
        }
        Ok(None)
    }

    /// Verify the structural invariants of the arena
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let root = self.node(ROOT);
        assert!(root.parent.is_none());
        assert!(root.fqdn.is_empty());
        assert!(RecordType::ALL.iter().all(|&t| !root.has(t)));

        for (index, node) in self.nodes.iter().enumerate().skip(1) {
            let parent = node.parent.expect("non-root node without parent");
            let parent_node = self.node(parent);
            assert!(parent_node.children().any(|c| c as usize == index));
            assert!(node.fqdn.ends_with(&parent_node.fqdn));
            if node.is_delegated() {
                assert!(!node.has_children(), "{} delegated with children", node.fqdn);
                assert_eq!(node.conflict_for(RecordType::Ns), None);
            }
            if node.has(RecordType::Cname) {
                assert_eq!(node.conflict_for(RecordType::Cname), None);
            }
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an MX rdata into its parts and validate them, returning the host
fn parse_mx(rdata: &str) -> Result<&str> {
    let (preference, hostname) = rdata
        .split_once(' ')
        .ok_or_else(|| StoreError::InvalidRdata(format!("invalid MX entry: {}", rdata)))?;

    match preference.parse::<i64>() {
        Ok(p) if (0..=i64::from(u16::MAX)).contains(&p) => {}
        _ => {
            return Err(StoreError::InvalidRdata(format!(
                "invalid preference: {}",
                preference
            )));
        }
    }
    if !is_valid_fqdn(hostname) {
        return Err(StoreError::InvalidRdata(format!(
            "invalid FQDN: {}",
            hostname
        )));
    }
    Ok(hostname)
}

/// Policy strings start with a version tag followed by a space or semicolon
fn has_policy_prefix(rdata: &str, tag: &str) -> bool {
    let Some(head) = rdata.get(..tag.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(tag)
        && matches!(rdata.as_bytes().get(tag.len()), Some(b' ') | Some(b';'))
}
