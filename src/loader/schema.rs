//! Declarative zone data as it appears in source files.
//!
//! A source holds any number of templates and zones:
//!
//! ```yaml
//! templates:
//!   - template: web
//!     names:
//!       - name: www
//!         forwarding:
//!           target: example.com.
//! zones:
//!   - zone: example.com.
//!     ttl: 300
//!     templates: [web]
//!     names:
//!       - name: "@"
//!         addresses:
//!           literals: [192.0.2.1, "2001:db8::1"]
//! ```
//!
//! Every block carries an optional `ttl`; zero (the default) means the
//! record inherits the default TTL at query time.

use serde::Deserialize;

/// One parsed source file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceFile {
    pub templates: Vec<Template>,
    pub zones: Vec<Zone>,
}

/// Reusable bundle of names, pulled into zones by name
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Template {
    pub template: String,
    pub description: String,
    /// Accepted for compatibility with existing zone data. Templates do not
    /// nest, so the list is never expanded.
    pub templates: Vec<String>,
    pub names: Vec<Name>,
}

/// A zone: its apex, the templates it pulls in and its own names
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Zone {
    pub zone: String,
    pub description: String,
    pub ttl: i64,
    pub templates: Vec<String>,
    pub names: Vec<Name>,
}

/// One label and the records attached to it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Name {
    pub name: String,
    pub description: String,
    pub delegation: Delegation,
    pub mail: Mail,
    pub texts: Texts,
    pub forwarding: Forwarding,
    pub addresses: Addresses,
}

/// NS records
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Delegation {
    pub ttl: i64,
    pub nameservers: Vec<String>,
}

/// MX records
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Mail {
    pub ttl: i64,
    pub mailservers: Vec<Mailserver>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Mailserver {
    pub mailserver: String,
    pub preference: i64,
}

/// TXT records
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Texts {
    pub ttl: i64,
    pub data: Vec<String>,
}

/// A CNAME record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Forwarding {
    pub ttl: i64,
    pub target: String,
}

/// A and AAAA records, split by literal format
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Addresses {
    pub ttl: i64,
    pub literals: Vec<String>,
}

impl SourceFile {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // a document without content is null, not an empty mapping
        let blank = content
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#') || line == "---");
        if blank {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_source() {
        let yaml = r#"
templates:
  - template: mail
    description: shared mail setup
    names:
      - name: "@"
        mail:
          ttl: 3600
          mailservers:
            - mailserver: mx1.example.net.
              preference: 10
        texts:
          data: ["v=spf1 mx -all"]
zones:
  - zone: example.com.
    ttl: 300
    templates: [mail]
    names:
      - name: www
        forwarding:
          target: example.com.
      - name: sub
        delegation:
          nameservers: [ns1.example.net.]
      - name: "@"
        addresses:
          literals: [192.0.2.1]
"#;
        let file = SourceFile::from_yaml(yaml).unwrap();
        assert_eq!(file.templates.len(), 1);
        assert_eq!(file.templates[0].names[0].mail.ttl, 3600);
        assert_eq!(
            file.templates[0].names[0].mail.mailservers[0],
            Mailserver {
                mailserver: "mx1.example.net.".into(),
                preference: 10
            }
        );

        let zone = &file.zones[0];
        assert_eq!(zone.zone, "example.com.");
        assert_eq!(zone.ttl, 300);
        assert_eq!(zone.templates, vec!["mail".to_string()]);
        assert_eq!(zone.names[0].forwarding.target, "example.com.");
        assert_eq!(zone.names[0].forwarding.ttl, 0);
        assert!(zone.names[0].addresses.literals.is_empty());
        assert_eq!(zone.names[1].delegation.nameservers.len(), 1);
    }

    #[test]
    fn test_template_templates_key_accepted() {
        let yaml = "templates:\n  - template: base\n    templates: [other]\n    names:\n      \
                    - name: www\n        forwarding:\n          target: example.com.\n";
        let file = SourceFile::from_yaml(yaml).unwrap();
        assert_eq!(file.templates[0].templates, vec!["other".to_string()]);
        assert_eq!(file.templates[0].names.len(), 1);

        let empty = "templates:\n  - template: base\n    templates: []\n";
        assert!(SourceFile::from_yaml(empty).unwrap().templates[0].templates.is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = "zones:\n  - zone: example.com.\n    colour: blue\n";
        assert!(SourceFile::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(SourceFile::from_yaml("").unwrap(), SourceFile::default());
        assert_eq!(
            SourceFile::from_yaml("# nothing here\n").unwrap(),
            SourceFile::default()
        );
    }
}
