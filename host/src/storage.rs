//! Keeps the last catalog (and the presets inside it), optionally backed
//! by a JSON file.

use std::io::ErrorKind;
use std::path::PathBuf;

use reqpanel_core::MasterObject;

use crate::error::HostError;

#[derive(Debug, Default)]
pub struct CatalogStore {
    path: Option<PathBuf>,
    catalog: Option<MasterObject>,
}

impl CatalogStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path` if given. A missing file is an empty store.
    pub async fn open(path: Option<PathBuf>) -> Result<Self, HostError> {
        let Some(file) = &path else {
            return Ok(Self::in_memory());
        };

        let catalog = match tokio::fs::read(file).await {
            Ok(bytes) => Some(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %file.display(), loaded = catalog.is_some(), "catalog store opened");
        Ok(Self { path, catalog })
    }

    pub fn catalog(&self) -> Option<&MasterObject> {
        self.catalog.as_ref()
    }

    /// Mutate the stored catalog and persist the result.
    pub async fn update<T>(
        &mut self,
        apply: impl FnOnce(&mut MasterObject) -> Result<T, HostError>,
    ) -> Result<T, HostError> {
        let catalog = self
            .catalog
            .as_mut()
            .ok_or_else(|| HostError::NotFound("catalog; run parseServer first".to_string()))?;
        let out = apply(catalog)?;
        self.flush().await?;
        Ok(out)
    }

    pub async fn replace(&mut self, catalog: MasterObject) -> Result<(), HostError> {
        self.catalog = Some(catalog);
        self.flush().await
    }

    pub async fn wipe(&mut self) -> Result<(), HostError> {
        self.catalog = None;
        let Some(file) = &self.path else {
            return Ok(());
        };
        match tokio::fs::remove_file(file).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write via a temp file so a crash never leaves half a catalog behind.
    async fn flush(&self) -> Result<(), HostError> {
        let (Some(file), Some(catalog)) = (&self.path, &self.catalog) else {
            return Ok(());
        };
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = file.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(catalog)?).await?;
        tokio::fs::rename(&tmp, file).await?;
        Ok(())
    }
}
