use log::info;

use artisync_backend::ArtifactSource;

use crate::error::AppError;

use super::Controller;

impl Controller {
    pub fn add_source(&mut self, source: ArtifactSource) -> Result<(), AppError> {
        self.sources
            .add(source)
            .map_err(|error| AppError::source_edit_failed("add", error))?;
        self.save_sources()
    }

    /// Replace the source at the one-based `position`.
    pub fn edit_source(&mut self, position: usize, source: ArtifactSource) -> Result<(), AppError> {
        let index = to_index(position, "edit")?;
        let previous_address = self
            .sources
            .sources()
            .get(index)
            .map(|existing| existing.address.clone());
        self.sources
            .update(index, source)
            .map_err(|error| AppError::source_edit_failed("edit", error))?;
        if let Some(address) = previous_address {
            self.cache.remove(&address);
        }
        self.save_sources()
    }

    /// Remove the source at the one-based `position` together with its
    /// cached scan results.
    pub fn remove_source(&mut self, position: usize) -> Result<ArtifactSource, AppError> {
        let index = to_index(position, "remove")?;
        let removed = self
            .sources
            .remove(index)
            .map_err(|error| AppError::source_edit_failed("remove", error))?;
        self.cache.remove(&removed.address);
        info!("Removed source {} ({})", removed.name, removed.address);
        self.save_sources()?;
        Ok(removed)
    }

    fn save_sources(&self) -> Result<(), AppError> {
        self.sources
            .save_to(&self.paths.sources_file())
            .map_err(|error| AppError::settings_save_failed("sources", error))
    }
}

fn to_index(position: usize, action: &'static str) -> Result<usize, AppError> {
    position
        .checked_sub(1)
        .ok_or_else(|| AppError::source_edit_failed(action, "positions start at 1"))
}
