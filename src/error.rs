use crate::store::RecordType;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the record store.
///
/// Every variant is an authoring mistake detected synchronously. A call that
/// returns one of these has not modified the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid FQDN: {0}")]
    InvalidFqdn(String),

    #[error("invalid TTL: {0}")]
    InvalidTtl(i64),

    #[error("rdata: {0}")]
    InvalidRdata(String),

    #[error("rdatas: empty")]
    EmptyRdata,

    #[error("rdata: duplicate entry: {0}")]
    DuplicateRdata(String),

    #[error("{0} record already set")]
    AlreadySet(RecordType),

    #[error("{fqdn}: {rtype} record conflicts with existing {existing} record")]
    ConflictingRecordType {
        fqdn: String,
        rtype: RecordType,
        existing: RecordType,
    },

    #[error("{0}: cannot delegate FQDN with children")]
    DelegationHasChildren(String),

    #[error("TXT TTL already set to {existing}, got {requested}")]
    TxtTtlMismatch { existing: i64, requested: i64 },

    #[error("{0}: FQDN outside authority")]
    OutOfAuthority(String),

    #[error("{0}: FQDN not found")]
    NotFound(String),

    #[error("{fqdn}: FQDN has no {rtype} record")]
    NoSuchRecord { fqdn: String, rtype: RecordType },
}

/// The declarative block a failing record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Delegation,
    Mail,
    Texts,
    Forwarding,
    Addresses,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Block::Delegation => "delegations",
            Block::Mail => "mailservers",
            Block::Texts => "texts",
            Block::Forwarding => "forwarding",
            Block::Addresses => "addresses",
        };
        f.write_str(s)
    }
}

/// Where in the declarative sources a record was being replayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub source: String,
    pub template: Option<String>,
    pub zone: String,
    pub name: String,
    pub block: Block,
}

impl fmt::Display for RecordContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source {}: ", self.source)?;
        if let Some(template) = &self.template {
            write!(f, "template {}: ", template)?;
        }
        write!(
            f,
            "zone {}: name {}: load {}",
            self.zone, self.name, self.block
        )
    }
}

/// Errors raised while turning declarative sources into a record store
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("source {source_name}: template {template}: duplicate")]
    DuplicateTemplate {
        source_name: String,
        template: String,
    },

    #[error("source {source_name}: template {template}: empty")]
    EmptyTemplate {
        source_name: String,
        template: String,
    },

    #[error("source {source_name}: zone {zone}: template {template}: not found")]
    TemplateNotFound {
        source_name: String,
        zone: String,
        template: String,
    },

    #[error("source {source_name}: zone {zone}: {source}")]
    Zone {
        source_name: String,
        zone: String,
        #[source]
        source: StoreError,
    },

    #[error("{context}: {source}")]
    Record {
        context: Box<RecordContext>,
        #[source]
        source: StoreError,
    },

    #[error("empty database")]
    EmptyDatabase,
}

impl LoadError {
    /// The underlying store error, if this failure came from a record
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            LoadError::Record { source, .. } | LoadError::Zone { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised while reading the tool configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{context}: invalid TTL: {ttl}")]
    InvalidTtl { context: String, ttl: i64 },

    #[error("managed zone {0}: invalid FQDN")]
    InvalidFqdn(String),

    #[error("managed zone {0}: duplicate entry")]
    DuplicateZone(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
