//! Processor configuration operations
//!
//! Reads are open to any authenticated party; writes require the owning
//! processor. `toggle_cut` is fetch-then-write with last-write-wins under
//! concurrency, matching the configuration's whole-document merge model.

use super::{CutSheetService, ServiceError};
use crate::entities::config::{ConfigLookup, ConfigPatch, ProcessorCutConfig};
use crate::taxonomy::CutCounts;

impl CutSheetService<'_> {
    /// Fetch a processor's configuration; `None` targets the caller's own org
    ///
    /// A missing row is the implicit all-enabled default, not an error.
    pub fn get_config(&self, processor_org_id: Option<&str>) -> Result<ConfigLookup, ServiceError> {
        let principal = self.require_user()?;
        let org = processor_org_id.unwrap_or(&principal.organization_id);
        Ok(match self.store().get_config(org)? {
            Some(config) => ConfigLookup::Explicit(config),
            None => ConfigLookup::Default,
        })
    }

    /// Materialized view of [`CutSheetService::get_config`]
    pub fn effective_config(
        &self,
        processor_org_id: Option<&str>,
    ) -> Result<ProcessorCutConfig, ServiceError> {
        let principal = self.require_user()?;
        let org = processor_org_id
            .unwrap_or(&principal.organization_id)
            .to_string();
        Ok(self.get_config(Some(&org))?.into_config(&org))
    }

    /// Merge a partial update into the caller's configuration
    ///
    /// Only fields present in the patch are written; everything else keeps
    /// its stored value. Explicit empty collections are writes, not skips.
    pub fn upsert_config(&self, patch: &ConfigPatch) -> Result<(), ServiceError> {
        let principal = self.require_processor()?;
        let mut config = self
            .store()
            .get_config(&principal.organization_id)?
            .unwrap_or_else(|| ProcessorCutConfig::default_for(&principal.organization_id));
        patch.apply_to(&mut config);
        self.store().put_config(&config)?;
        Ok(())
    }

    /// Flip a cut's membership in the caller's disabled set
    ///
    /// Returns whether the cut is disabled after the flip.
    pub fn toggle_cut(&self, cut_id: &str) -> Result<bool, ServiceError> {
        let principal = self.require_processor()?;
        if self.taxonomy().find_cut(cut_id).is_none() {
            return Err(ServiceError::CutNotFound(cut_id.to_string()));
        }

        let mut config = self
            .store()
            .get_config(&principal.organization_id)?
            .unwrap_or_else(|| ProcessorCutConfig::default_for(&principal.organization_id));

        let now_disabled = if config.disabled_cuts.remove(cut_id) {
            false
        } else {
            config.disabled_cuts.insert(cut_id.to_string());
            true
        };
        config.updated_at = chrono::Utc::now();
        self.store().put_config(&config)?;
        Ok(now_disabled)
    }

    /// Enabled/total cut counts for a species under a processor's config
    pub fn cut_counts(
        &self,
        processor_org_id: Option<&str>,
        animal: crate::taxonomy::AnimalType,
    ) -> Result<CutCounts, ServiceError> {
        let config = self.effective_config(processor_org_id)?;
        Ok(self.taxonomy().cut_counts(animal, &config.disabled_cuts))
    }
}
