//! Building a [`RecordStore`] from declarative zone data.
//!
//! Loading runs in three passes. All sources are parsed first, then every
//! template across every source is collected into one dictionary, and only
//! then are zones replayed into a fresh store, templates first and the zone's
//! own names last. The first error aborts the load and nothing is returned.

mod expand;
pub mod schema;

use crate::error::LoadError;
use crate::store::RecordStore;
use crate::validation::{check_fqdn, check_ttl};
use expand::{Origin, replay_names};
use rustc_hash::FxHashMap;
use schema::{SourceFile, Template};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// File extensions picked up by [`load_directory`]
pub const SOURCE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// A named chunk of YAML zone data
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub content: String,
}

impl Source {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a source from disk, named after its path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), content))
    }

    pub fn parse(&self) -> Result<SourceFile, LoadError> {
        SourceFile::from_yaml(&self.content).map_err(|e| LoadError::Parse {
            source_name: self.name.clone(),
            message: e.to_string(),
        })
    }
}

/// Collects parsed sources and replays them into a store
#[derive(Debug, Default)]
pub struct Loader {
    files: Vec<(String, SourceFile)>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and queue a YAML source
    pub fn add_source(&mut self, source: &Source) -> Result<&mut Self, LoadError> {
        let file = source.parse()?;
        Ok(self.add_parsed(source.name.clone(), file))
    }

    /// Queue data that was already parsed by the caller
    pub fn add_parsed(&mut self, name: impl Into<String>, file: SourceFile) -> &mut Self {
        self.files.push((name.into(), file));
        self
    }

    /// Build the template dictionary across all queued sources
    fn templates(&self) -> Result<FxHashMap<&str, &Template>, LoadError> {
        let mut templates: FxHashMap<&str, &Template> = FxHashMap::default();
        for (source_name, file) in &self.files {
            for template in &file.templates {
                if templates.contains_key(template.template.as_str()) {
                    return Err(LoadError::DuplicateTemplate {
                        source_name: source_name.clone(),
                        template: template.template.clone(),
                    });
                }
                if template.names.is_empty() {
                    return Err(LoadError::EmptyTemplate {
                        source_name: source_name.clone(),
                        template: template.template.clone(),
                    });
                }
                templates.insert(&template.template, template);
            }
        }
        Ok(templates)
    }

    /// Replay every zone into a fresh store
    pub fn build(&self) -> Result<RecordStore, LoadError> {
        let templates = self.templates()?;
        info!(
            sources = self.files.len(),
            templates = templates.len(),
            "Loading zone data"
        );

        let mut store = RecordStore::new();
        let mut zones = 0usize;
        for (source_name, file) in &self.files {
            for zone in &file.zones {
                let zone_error = |source| LoadError::Zone {
                    source_name: source_name.clone(),
                    zone: zone.zone.clone(),
                    source,
                };
                check_fqdn(&zone.zone).map_err(zone_error)?;
                check_ttl(zone.ttl).map_err(zone_error)?;

                for template_name in &zone.templates {
                    let template = templates.get(template_name.as_str()).ok_or_else(|| {
                        LoadError::TemplateNotFound {
                            source_name: source_name.clone(),
                            zone: zone.zone.clone(),
                            template: template_name.clone(),
                        }
                    })?;
                    debug!(zone = %zone.zone, template = %template_name, "Applying template");
                    let origin = Origin {
                        source: source_name,
                        template: Some(template_name.as_str()),
                        zone: &zone.zone,
                    };
                    replay_names(&mut store, &template.names, origin)?;
                }

                debug!(zone = %zone.zone, names = zone.names.len(), "Applying zone names");
                let origin = Origin {
                    source: source_name,
                    template: None,
                    zone: &zone.zone,
                };
                replay_names(&mut store, &zone.names, origin)?;
                zones += 1;
            }
        }

        if store.is_empty() {
            return Err(LoadError::EmptyDatabase);
        }

        info!(zones, names = store.len(), "Zone data loaded");
        Ok(store)
    }
}

/// Parse `sources` and build a store from them in one go
pub fn load<'a, I>(sources: I) -> Result<RecordStore, LoadError>
where
    I: IntoIterator<Item = &'a Source>,
{
    let mut loader = Loader::new();
    for source in sources {
        loader.add_source(source)?;
    }
    loader.build()
}

/// Load every YAML file directly inside `directory`, in file name order
pub fn load_directory<P: AsRef<Path>>(directory: P) -> Result<RecordStore, LoadError> {
    let sources = read_directory(directory)?;
    load(&sources)
}

/// Read the YAML sources of a zone data directory, sorted by file name
pub fn read_directory<P: AsRef<Path>>(directory: P) -> Result<Vec<Source>, LoadError> {
    let directory = directory.as_ref();
    let io_error = |source| LoadError::Io {
        path: directory.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if is_source && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    debug!(directory = %directory.display(), files = paths.len(), "Reading zone data");
    paths.iter().map(Source::from_path).collect()
}
