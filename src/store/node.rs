use super::record::{Record, RecordType};
use crate::validation::quote_txt;
use smallvec::SmallVec;

/// Index of a node in the store's arena
pub(crate) type NodeId = u32;

/// The root node always lives at the start of the arena
pub(crate) const ROOT: NodeId = 0;

/// An ordered rdata set with its own TTL (0 = inherit)
#[derive(Debug, Clone, Default)]
pub(crate) struct RdataSet {
    pub ttl: i64,
    pub rdatas: Vec<String>,
}

/// TXT strings accumulate, so they also track which policy records exist
#[derive(Debug, Clone, Default)]
pub(crate) struct TxtSet {
    pub ttl: i64,
    pub rdatas: Vec<String>,
    pub spf1: bool,
    pub dkim1: bool,
}

/// One label in the trie
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    /// Lowercase FQDN, empty for the root
    pub fqdn: String,
    /// Back-reference for upward walks, `None` only for the root
    pub parent: Option<NodeId>,
    /// Children sorted by label
    children: SmallVec<[(Box<str>, NodeId); 4]>,
    pub ns: Option<RdataSet>,
    pub mx: Option<RdataSet>,
    pub txt: Option<TxtSet>,
    pub cname: Option<RdataSet>,
    pub a: Option<RdataSet>,
    pub aaaa: Option<RdataSet>,
}

impl Node {
    pub fn new(fqdn: String, parent: Option<NodeId>) -> Self {
        Self {
            fqdn,
            parent,
            ..Default::default()
        }
    }

    /// Add a child node, maintaining sorted order by label
    pub fn add_child(&mut self, label: &str, index: NodeId) {
        match self
            .children
            .binary_search_by(|(l, _)| l.as_ref().cmp(label))
        {
            Ok(pos) => self.children[pos].1 = index,
            Err(pos) => self.children.insert(pos, (label.into(), index)),
        }
    }

    #[inline]
    pub fn find_child(&self, label: &str) -> Option<NodeId> {
        self.children
            .binary_search_by(|(l, _)| l.as_ref().cmp(label))
            .ok()
            .map(|pos| self.children[pos].1)
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.children.iter().map(|&(_, id)| id)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has(&self, rtype: RecordType) -> bool {
        match rtype {
            RecordType::Ns => self.ns.is_some(),
            RecordType::Mx => self.mx.is_some(),
            RecordType::Txt => self.txt.is_some(),
            RecordType::Cname => self.cname.is_some(),
            RecordType::A => self.a.is_some(),
            RecordType::Aaaa => self.aaaa.is_some(),
        }
    }

    pub fn is_delegated(&self) -> bool {
        self.ns.is_some()
    }

    /// The first payload already present that may not share a node with
    /// `rtype`.
    ///
    /// NS and CNAME are exclusive with everything. MX, TXT, A and AAAA only
    /// clash with NS and CNAME.
    pub fn conflict_for(&self, rtype: RecordType) -> Option<RecordType> {
        match rtype {
            RecordType::Ns | RecordType::Cname => RecordType::ALL
                .into_iter()
                .find(|&other| other != rtype && self.has(other)),
            RecordType::Mx | RecordType::Txt | RecordType::A | RecordType::Aaaa => {
                [RecordType::Ns, RecordType::Cname]
                    .into_iter()
                    .find(|&other| self.has(other))
            }
        }
    }

    /// Build the detached view of one payload, substituting `default_ttl` for
    /// an unset TTL
    pub fn record(&self, rtype: RecordType, default_ttl: u32) -> Option<Record> {
        let (ttl, rdatas) = match rtype {
            RecordType::Txt => {
                let txt = self.txt.as_ref()?;
                let quoted = txt.rdatas.iter().map(|s| quote_txt(s)).collect();
                (txt.ttl, quoted)
            }
            _ => {
                let set = match rtype {
                    RecordType::Ns => self.ns.as_ref(),
                    RecordType::Mx => self.mx.as_ref(),
                    RecordType::Cname => self.cname.as_ref(),
                    RecordType::A => self.a.as_ref(),
                    RecordType::Aaaa => self.aaaa.as_ref(),
                    RecordType::Txt => None,
                }?;
                (set.ttl, set.rdatas.clone())
            }
        };

        Some(Record {
            fqdn: self.fqdn.clone(),
            rtype,
            ttl: effective_ttl(ttl, default_ttl),
            rdatas,
        })
    }

    /// All payloads on this node in presentation order
    pub fn records(&self, default_ttl: u32) -> impl Iterator<Item = Record> + '_ {
        RecordType::ALL
            .into_iter()
            .filter_map(move |rtype| self.record(rtype, default_ttl))
    }
}

/// Stored TTLs are validated into `[0, 2^31 - 1]` before they land on a node
fn effective_ttl(ttl: i64, default_ttl: u32) -> u32 {
    if ttl == 0 {
        default_ttl
    } else {
        u32::try_from(ttl).unwrap_or(default_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_sorted() {
        let mut node = Node::new(String::new(), None);
        node.add_child("www", 3);
        node.add_child("api", 1);
        node.add_child("mail", 2);

        assert_eq!(node.children().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(node.find_child("mail"), Some(2));
        assert_eq!(node.find_child("ftp"), None);
    }

    #[test]
    fn test_conflicts() {
        let mut node = Node::new("example.com.".into(), Some(ROOT));
        assert_eq!(node.conflict_for(RecordType::Ns), None);

        node.a = Some(RdataSet {
            ttl: 0,
            rdatas: vec!["192.0.2.1".into()],
        });
        assert_eq!(node.conflict_for(RecordType::Ns), Some(RecordType::A));
        assert_eq!(node.conflict_for(RecordType::Cname), Some(RecordType::A));
        assert_eq!(node.conflict_for(RecordType::Mx), None);
        assert_eq!(node.conflict_for(RecordType::Aaaa), None);
    }

    #[test]
    fn test_record_ttl_fallback() {
        let mut node = Node::new("example.com.".into(), Some(ROOT));
        node.mx = Some(RdataSet {
            ttl: 0,
            rdatas: vec!["10 mx.example.com.".into()],
        });
        node.cname = None;
        node.aaaa = Some(RdataSet {
            ttl: 60,
            rdatas: vec!["2001:db8::1".into()],
        });

        assert_eq!(node.record(RecordType::Mx, 300).unwrap().ttl, 300);
        assert_eq!(node.record(RecordType::Aaaa, 300).unwrap().ttl, 60);
        assert!(node.record(RecordType::Ns, 300).is_none());

        let types: Vec<_> = node.records(300).map(|r| r.rtype).collect();
        assert_eq!(types, vec![RecordType::Mx, RecordType::Aaaa]);
    }
}
