//! Processor configuration rows

use rusqlite::{params, OptionalExtension};

use super::{column_json, Store, StoreError};
use crate::entities::config::ProcessorCutConfig;

impl Store {
    /// Fetch a processor's saved configuration, if any
    pub fn get_config(&self, processor_org_id: &str) -> Result<Option<ProcessorCutConfig>, StoreError> {
        let config = self
            .conn()
            .query_row(
                "SELECT processor_org_id, enabled_animals, disabled_cuts,
                        disabled_sausage_flavors, custom_cuts, default_templates,
                        processing_fees, min_hanging_weight_lbs, max_hanging_weight_lbs,
                        producer_notes, updated_at
                 FROM processor_cut_config WHERE processor_org_id = ?1",
                params![processor_org_id],
                |row| {
                    Ok(ProcessorCutConfig {
                        processor_org_id: row.get(0)?,
                        enabled_animals: column_json(1, &row.get::<_, String>(1)?)?,
                        disabled_cuts: column_json(2, &row.get::<_, String>(2)?)?,
                        disabled_sausage_flavors: column_json(3, &row.get::<_, String>(3)?)?,
                        custom_cuts: column_json(4, &row.get::<_, String>(4)?)?,
                        default_templates: column_json(5, &row.get::<_, String>(5)?)?,
                        processing_fees: column_json(6, &row.get::<_, String>(6)?)?,
                        min_hanging_weight_lbs: row.get(7)?,
                        max_hanging_weight_lbs: row.get(8)?,
                        producer_notes: row.get(9)?,
                        updated_at: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(config)
    }

    /// Write a processor's configuration as a whole row
    pub fn put_config(&self, config: &ProcessorCutConfig) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO processor_cut_config (
                processor_org_id, enabled_animals, disabled_cuts,
                disabled_sausage_flavors, custom_cuts, default_templates,
                processing_fees, min_hanging_weight_lbs, max_hanging_weight_lbs,
                producer_notes, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                config.processor_org_id,
                serde_json::to_string(&config.enabled_animals)?,
                serde_json::to_string(&config.disabled_cuts)?,
                serde_json::to_string(&config.disabled_sausage_flavors)?,
                serde_json::to_string(&config.custom_cuts)?,
                serde_json::to_string(&config.default_templates)?,
                serde_json::to_string(&config.processing_fees)?,
                config.min_hanging_weight_lbs,
                config.max_hanging_weight_lbs,
                config.producer_notes,
                config.updated_at,
            ],
        )?;
        Ok(())
    }
}
