//! Named configuration snapshots, namespaced per frame type.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::APP_DIR_NAME;
use crate::error::{CalibraError, Result};
use crate::frame::FrameType;

/// Durable key/value storage for preset documents.
///
/// One namespace per frame type; `contents` is an opaque TOML document.
pub trait PresetBackend {
    fn read(&self, namespace: &str) -> Result<Option<String>>;
    fn write(&mut self, namespace: &str, contents: &str) -> Result<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetBackend for MemoryBackend {
    fn read(&self, namespace: &str) -> Result<Option<String>> {
        Ok(self.entries.get(namespace).cloned())
    }

    fn write(&mut self, namespace: &str, contents: &str) -> Result<()> {
        self.entries
            .insert(namespace.to_string(), contents.to_string());
        Ok(())
    }
}

/// One TOML file per namespace inside a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/calibra/presets`, falling back to the home directory.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| CalibraError::Config("no config or home directory".into()))?;
        Ok(Self::new(base.join(APP_DIR_NAME).join("presets")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.toml"))
    }
}

impl PresetBackend for FileBackend {
    fn read(&self, namespace: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.file_for(namespace)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, namespace: &str, contents: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.file_for(namespace), contents)?;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PresetDocument {
    #[serde(default)]
    presets: BTreeMap<String, toml::Value>,
}

/// Save/load/delete named presets, one document per frame type.
pub struct PresetStore<B: PresetBackend> {
    backend: B,
}

impl<B: PresetBackend> PresetStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn namespace(frame_type: FrameType) -> String {
        format!("presets-{}", frame_type.as_str())
    }

    fn read_document(&self, frame_type: FrameType) -> Result<PresetDocument> {
        match self.backend.read(&Self::namespace(frame_type))? {
            Some(contents) => {
                toml::from_str(&contents).map_err(|e| CalibraError::PresetDecode(e.to_string()))
            }
            None => Ok(PresetDocument::default()),
        }
    }

    fn write_document(&mut self, frame_type: FrameType, doc: &PresetDocument) -> Result<()> {
        let contents =
            toml::to_string_pretty(doc).map_err(|e| CalibraError::PresetEncode(e.to_string()))?;
        self.backend.write(&Self::namespace(frame_type), &contents)
    }

    /// Store `snapshot` as `name`, replacing any preset of that name.
    pub fn save<T: Serialize>(&mut self, frame_type: FrameType, name: &str, snapshot: &T) -> Result<()> {
        let value =
            toml::Value::try_from(snapshot).map_err(|e| CalibraError::PresetEncode(e.to_string()))?;
        let mut doc = self.read_document(frame_type)?;
        let replaced = doc.presets.insert(name.to_string(), value).is_some();
        self.write_document(frame_type, &doc)?;
        info!(%frame_type, name, replaced, "Preset saved");
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, frame_type: FrameType, name: &str) -> Result<T> {
        let doc = self.read_document(frame_type)?;
        let value = doc
            .presets
            .get(name)
            .cloned()
            .ok_or_else(|| CalibraError::PresetNotFound {
                frame_type,
                name: name.to_string(),
            })?;
        debug!(%frame_type, name, "Preset loaded");
        value
            .try_into()
            .map_err(|e| CalibraError::PresetDecode(e.to_string()))
    }

    /// Remove a preset. Returns whether it existed.
    pub fn delete(&mut self, frame_type: FrameType, name: &str) -> Result<bool> {
        let mut doc = self.read_document(frame_type)?;
        if doc.presets.remove(name).is_none() {
            return Ok(false);
        }
        self.write_document(frame_type, &doc)?;
        info!(%frame_type, name, "Preset deleted");
        Ok(true)
    }

    /// Preset names for one frame type, sorted.
    pub fn list(&self, frame_type: FrameType) -> Result<Vec<String>> {
        Ok(self.read_document(frame_type)?.presets.into_keys().collect())
    }
}
