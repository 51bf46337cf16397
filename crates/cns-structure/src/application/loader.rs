//! Structure loaders: turn a process identifier into a content structure.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cns_core::error::LoadError;
use tracing::debug;

use crate::domain::definition::{NodeDefinition, StructureDefinition};
use crate::domain::structure::ContentStructure;

/// Title given to the single node built by [`SingleNodeLoader`].
pub const DEFAULT_NODE_TITLE: &str = "APPsist Wissen";

/// Produces fully built, not-yet-started content structures.
#[async_trait]
pub trait StructureLoader: Send + Sync {
    /// Loads the structure for `process_id`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the identifier is malformed, no definition
    /// exists, or the definition cannot be read.
    async fn load(&self, process_id: &str) -> Result<ContentStructure, LoadError>;
}

/// Returns the definition name for a process: its last `/` segment.
///
/// # Errors
///
/// Returns `LoadError::MalformedIdentifier` if the segment is empty or could
/// escape the definition directory.
pub fn definition_name(process_id: &str) -> Result<&str, LoadError> {
    let name = process_id
        .rsplit_once('/')
        .map_or(process_id, |(_, last)| last);
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return Err(LoadError::MalformedIdentifier(process_id.to_owned()));
    }
    Ok(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionFormat {
    Json,
    Yaml,
}

impl DefinitionFormat {
    const PROBE_ORDER: [(&'static str, Self); 3] =
        [("json", Self::Json), ("yaml", Self::Yaml), ("yml", Self::Yaml)];

    fn from_extension(extension: &str) -> Option<Self> {
        Self::PROBE_ORDER
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, format)| *format)
    }

    fn parse(self, source: &str) -> Result<StructureDefinition, LoadError> {
        match self {
            Self::Json => StructureDefinition::from_json(source),
            Self::Yaml => StructureDefinition::from_yaml(source),
        }
    }
}

/// Reads structure definitions from a directory.
///
/// `proc/42` resolves to `<root>/42.json`, `<root>/42.yaml` or
/// `<root>/42.yml`, probed in that order. A name ending in one of those
/// extensions (`proc/42.yaml`) is read as-is. Any other dotted name
/// (`proc/lesson.v2`) is probed like a plain one; if nothing is found but
/// the file itself exists, its format is reported as unsupported.
#[derive(Debug, Clone)]
pub struct FileStructureLoader {
    root: PathBuf,
}

impl FileStructureLoader {
    /// Creates a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The definition directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, name: &str) -> Vec<(PathBuf, DefinitionFormat)> {
        match extension_of(name).and_then(DefinitionFormat::from_extension) {
            Some(format) => vec![(self.root.join(name), format)],
            None => DefinitionFormat::PROBE_ORDER
                .iter()
                .map(|(extension, format)| (self.root.join(format!("{name}.{extension}")), *format))
                .collect(),
        }
    }
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(OsStr::to_str)
}

#[async_trait]
impl StructureLoader for FileStructureLoader {
    async fn load(&self, process_id: &str) -> Result<ContentStructure, LoadError> {
        let name = definition_name(process_id)?;
        for (path, format) in self.candidates(name) {
            match tokio::fs::read_to_string(&path).await {
                Ok(source) => {
                    debug!(path = %path.display(), process_id, "loading structure definition");
                    return Ok(format.parse(&source)?.into_structure(process_id));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(LoadError::Io(e)),
            }
        }

        let missing = LoadError::MissingDefinition(process_id.to_owned());
        let Some(extension) = extension_of(name) else {
            return Err(missing);
        };
        if tokio::fs::try_exists(self.root.join(name)).await? {
            return Err(LoadError::UnsupportedFormat(extension.to_owned()));
        }
        Err(missing)
    }
}

/// Fallback loader used when no definition directory is configured: every
/// process becomes a one-node structure whose content id is the process's
/// definition name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleNodeLoader;

#[async_trait]
impl StructureLoader for SingleNodeLoader {
    async fn load(&self, process_id: &str) -> Result<ContentStructure, LoadError> {
        let name = definition_name(process_id)?;
        Ok(ContentStructure::new(
            process_id,
            [NodeDefinition::new(name, DEFAULT_NODE_TITLE)],
        ))
    }
}
