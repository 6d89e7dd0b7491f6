//! Common helpers for the integration tests

#![allow(dead_code)] // not every test file uses every helper

use rrdb::{LoadError, RecordStore, Source, load};

/// Owned rdata list from string literals
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Load a single inline YAML source
pub fn load_yaml(yaml: &str) -> Result<RecordStore, LoadError> {
    load([&Source::new("test.yml", yaml)])
}

/// Load several inline YAML sources, named `source-N.yml`
pub fn load_yamls(yamls: &[&str]) -> Result<RecordStore, LoadError> {
    let sources: Vec<Source> = yamls
        .iter()
        .enumerate()
        .map(|(i, yaml)| Source::new(format!("source-{}.yml", i), *yaml))
        .collect();
    load(&sources)
}

/// A store with a small but complete zone, including a delegation
pub fn populated_store() -> RecordStore {
    let mut store = RecordStore::new();
    store
        .set_mx(
            "example.com.",
            0,
            strings(&["10 mx1.example.com.", "20 mx2.example.com."]),
        )
        .unwrap();
    store.add_txt("example.com.", 0, "v=spf1 mx -all").unwrap();
    store
        .set_a("example.com.", 0, strings(&["192.0.2.1"]))
        .unwrap();
    store
        .set_aaaa("example.com.", 0, strings(&["2001:db8::1"]))
        .unwrap();
    store
        .set_cname("www.example.com.", 600, "example.com.")
        .unwrap();
    store
        .set_a("mx1.example.com.", 0, strings(&["192.0.2.25"]))
        .unwrap();
    store
        .set_ns("sub.example.com.", 3600, strings(&["ns1.example.net."]))
        .unwrap();
    store
}
