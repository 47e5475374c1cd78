//! Cut sheet rows, children, and overlay records
//!
//! Overlay state (modifications, removals, additions) is keyed one row per
//! `(cut_sheet_id, cut_id)` so concurrent edits to different cuts of the
//! same sheet never rewrite each other's rows.

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::{column_json, Store, StoreError};
use crate::core::identity::EntityId;
use crate::core::session::PartyRole;
use crate::entities::config::TemplateRef;
use crate::entities::sheet::{
    AddedCut, CutSheet, CutSheetItem, CutSheetSausage, CutSheetState, ModificationRecord,
    RemovedCut, SheetStatus,
};

impl Store {
    /// Insert a document row together with its items and sausages
    pub fn insert_sheet(&self, sheet: &CutSheet) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO cut_sheets (
                id, processing_order_id, producer_org_id, processor_org_id,
                is_template, template_name, status, animal_type,
                hanging_weight_lbs, ground_type, ground_package_weight_lbs,
                patty_size, organs, beef_options, pork_options,
                special_instructions, processor_notes,
                last_modified_by_role, last_modified_by_user_id,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                       ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            params![
                sheet.id,
                sheet.processing_order_id,
                sheet.producer_org_id,
                sheet.processor_org_id,
                sheet.is_template,
                sheet.template_name,
                sheet.status,
                sheet.state.animal_type,
                sheet.state.hanging_weight_lbs,
                sheet.state.ground_type,
                sheet.state.ground_package_weight_lbs,
                sheet.state.patty_size,
                serde_json::to_string(&sheet.state.organs)?,
                serde_json::to_string(&sheet.state.beef)?,
                serde_json::to_string(&sheet.state.pork)?,
                sheet.state.special_instructions,
                sheet.processor_notes,
                sheet.last_modified_by_role,
                sheet.last_modified_by_user_id,
                sheet.created_at,
                sheet.updated_at,
            ],
        )?;

        for item in &sheet.state.items {
            self.insert_item(&sheet.id, item)?;
        }
        for sausage in &sheet.state.sausages {
            self.insert_sausage(&sheet.id, sausage)?;
        }
        Ok(())
    }

    /// Load a full document: row, children, and overlay records
    pub fn get_sheet(&self, id: &EntityId) -> Result<Option<CutSheet>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, processing_order_id, producer_org_id, processor_org_id,
                        is_template, template_name, status, animal_type,
                        hanging_weight_lbs, ground_type, ground_package_weight_lbs,
                        patty_size, organs, beef_options, pork_options,
                        special_instructions, processor_notes,
                        last_modified_by_role, last_modified_by_user_id,
                        created_at, updated_at
                 FROM cut_sheets WHERE id = ?1",
                params![id],
                |row| {
                    let state = CutSheetState {
                        animal_type: row.get(7)?,
                        hanging_weight_lbs: row.get(8)?,
                        ground_type: row.get(9)?,
                        ground_package_weight_lbs: row.get(10)?,
                        patty_size: row.get(11)?,
                        organs: column_json(12, &row.get::<_, String>(12)?)?,
                        beef: column_json(13, &row.get::<_, String>(13)?)?,
                        pork: column_json(14, &row.get::<_, String>(14)?)?,
                        special_instructions: row.get(15)?,
                        items: Vec::new(),
                        sausages: Vec::new(),
                    };
                    Ok(CutSheet {
                        id: row.get(0)?,
                        processing_order_id: row.get(1)?,
                        producer_org_id: row.get(2)?,
                        processor_org_id: row.get(3)?,
                        is_template: row.get(4)?,
                        template_name: row.get(5)?,
                        status: row.get(6)?,
                        state,
                        processor_modifications: BTreeMap::new(),
                        removed_cuts: Vec::new(),
                        added_cuts: Vec::new(),
                        processor_notes: row.get(16)?,
                        last_modified_by_role: row.get(17)?,
                        last_modified_by_user_id: row.get(18)?,
                        created_at: row.get(19)?,
                        updated_at: row.get(20)?,
                    })
                },
            )
            .optional()?;

        let Some(mut sheet) = row else {
            return Ok(None);
        };

        sheet.state.items = self.list_items(id)?;
        sheet.state.sausages = self.list_sausages(id)?;
        sheet.processor_modifications = self.list_modifications(id)?;
        sheet.removed_cuts = self.list_removed_cuts(id)?;
        sheet.added_cuts = self.list_added_cuts(id)?;
        Ok(Some(sheet))
    }

    pub fn insert_item(&self, sheet_id: &EntityId, item: &CutSheetItem) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO cut_sheet_items (
                cut_sheet_id, cut_id, cut_name, thickness, weight_lbs,
                pieces_per_package, sort_order
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sheet_id,
                item.cut_id,
                item.cut_name,
                item.thickness,
                item.weight_lbs,
                item.pieces_per_package,
                item.sort_order,
            ],
        )?;
        Ok(())
    }

    pub fn list_items(&self, sheet_id: &EntityId) -> Result<Vec<CutSheetItem>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT cut_id, cut_name, thickness, weight_lbs, pieces_per_package, sort_order
             FROM cut_sheet_items WHERE cut_sheet_id = ?1
             ORDER BY sort_order, cut_id",
        )?;
        let items = stmt
            .query_map(params![sheet_id], |row| {
                Ok(CutSheetItem {
                    cut_id: row.get(0)?,
                    cut_name: row.get(1)?,
                    thickness: row.get(2)?,
                    weight_lbs: row.get(3)?,
                    pieces_per_package: row.get(4)?,
                    sort_order: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn insert_sausage(
        &self,
        sheet_id: &EntityId,
        sausage: &CutSheetSausage,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO cut_sheet_sausages (cut_sheet_id, flavor, pounds)
             VALUES (?1, ?2, ?3)",
            params![sheet_id, sausage.flavor, sausage.pounds],
        )?;
        Ok(())
    }

    pub fn list_sausages(&self, sheet_id: &EntityId) -> Result<Vec<CutSheetSausage>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT flavor, pounds FROM cut_sheet_sausages
             WHERE cut_sheet_id = ?1 ORDER BY flavor",
        )?;
        let sausages = stmt
            .query_map(params![sheet_id], |row| {
                Ok(CutSheetSausage {
                    flavor: row.get(0)?,
                    pounds: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sausages)
    }

    pub fn update_status(&self, sheet_id: &EntityId, status: SheetStatus) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE cut_sheets SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![sheet_id, status, Utc::now()],
        )?;
        Ok(())
    }

    pub fn update_hanging_weight(
        &self,
        sheet_id: &EntityId,
        weight_lbs: f64,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE cut_sheets SET hanging_weight_lbs = ?2, updated_at = ?3 WHERE id = ?1",
            params![sheet_id, weight_lbs, Utc::now()],
        )?;
        Ok(())
    }

    pub fn update_processor_notes(
        &self,
        sheet_id: &EntityId,
        notes: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE cut_sheets SET processor_notes = ?2, updated_at = ?3 WHERE id = ?1",
            params![sheet_id, notes, Utc::now()],
        )?;
        Ok(())
    }

    /// Stamp the last-modified attribution on the document row
    pub fn touch_sheet(
        &self,
        sheet_id: &EntityId,
        role: PartyRole,
        user_id: &str,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE cut_sheets
             SET last_modified_by_role = ?2, last_modified_by_user_id = ?3, updated_at = ?4
             WHERE id = ?1",
            params![sheet_id, role, user_id, Utc::now()],
        )?;
        Ok(())
    }

    pub fn get_modification(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
    ) -> Result<Option<ModificationRecord>, StoreError> {
        let record = self
            .conn()
            .query_row(
                "SELECT thickness, weight_lbs, pieces_per_package, note, modified_at
                 FROM sheet_modifications WHERE cut_sheet_id = ?1 AND cut_id = ?2",
                params![sheet_id, cut_id],
                map_modification,
            )
            .optional()?;
        Ok(record)
    }

    pub fn upsert_modification(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
        record: &ModificationRecord,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO sheet_modifications (
                cut_sheet_id, cut_id, thickness, weight_lbs, pieces_per_package,
                note, modified_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sheet_id,
                cut_id,
                record.thickness,
                record.weight_lbs,
                record.pieces_per_package,
                record.note,
                record.modified_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_modifications(
        &self,
        sheet_id: &EntityId,
    ) -> Result<BTreeMap<String, ModificationRecord>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT cut_id, thickness, weight_lbs, pieces_per_package, note, modified_at
             FROM sheet_modifications WHERE cut_sheet_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![sheet_id], |row| {
                let cut_id: String = row.get(0)?;
                let record = ModificationRecord {
                    thickness: row.get(1)?,
                    weight_lbs: row.get(2)?,
                    pieces_per_package: row.get(3)?,
                    note: row.get(4)?,
                    modified_at: row.get(5)?,
                };
                Ok((cut_id, record))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(rows)
    }

    pub fn get_removed_cut(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
    ) -> Result<Option<RemovedCut>, StoreError> {
        let removed = self
            .conn()
            .query_row(
                "SELECT cut_id, cut_name, reason, removed_at
                 FROM sheet_removed_cuts WHERE cut_sheet_id = ?1 AND cut_id = ?2",
                params![sheet_id, cut_id],
                map_removed_cut,
            )
            .optional()?;
        Ok(removed)
    }

    pub fn insert_removed_cut(
        &self,
        sheet_id: &EntityId,
        removed: &RemovedCut,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO sheet_removed_cuts (cut_sheet_id, cut_id, cut_name, reason, removed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sheet_id,
                removed.cut_id,
                removed.cut_name,
                removed.reason,
                removed.removed_at,
            ],
        )?;
        Ok(())
    }

    pub fn delete_removed_cut(&self, sheet_id: &EntityId, cut_id: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "DELETE FROM sheet_removed_cuts WHERE cut_sheet_id = ?1 AND cut_id = ?2",
            params![sheet_id, cut_id],
        )?;
        Ok(())
    }

    pub fn list_removed_cuts(&self, sheet_id: &EntityId) -> Result<Vec<RemovedCut>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT cut_id, cut_name, reason, removed_at
             FROM sheet_removed_cuts WHERE cut_sheet_id = ?1
             ORDER BY removed_at, cut_id",
        )?;
        let removed = stmt
            .query_map(params![sheet_id], map_removed_cut)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(removed)
    }

    pub fn get_added_cut(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
    ) -> Result<Option<AddedCut>, StoreError> {
        let added = self
            .conn()
            .query_row(
                "SELECT cut_id, cut_name, thickness, pieces_per_package, note, added_at
                 FROM sheet_added_cuts WHERE cut_sheet_id = ?1 AND cut_id = ?2",
                params![sheet_id, cut_id],
                map_added_cut,
            )
            .optional()?;
        Ok(added)
    }

    pub fn insert_added_cut(&self, sheet_id: &EntityId, added: &AddedCut) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO sheet_added_cuts (
                cut_sheet_id, cut_id, cut_name, thickness, pieces_per_package, note, added_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sheet_id,
                added.cut_id,
                added.cut_name,
                added.thickness,
                added.pieces_per_package,
                added.note,
                added.added_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_added_cuts(&self, sheet_id: &EntityId) -> Result<Vec<AddedCut>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT cut_id, cut_name, thickness, pieces_per_package, note, added_at
             FROM sheet_added_cuts WHERE cut_sheet_id = ?1
             ORDER BY added_at, cut_id",
        )?;
        let added = stmt
            .query_map(params![sheet_id], map_added_cut)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(added)
    }

    /// Templates owned by an organization
    pub fn list_templates(&self, producer_org_id: &str) -> Result<Vec<TemplateRef>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT id, template_name, animal_type FROM cut_sheets
             WHERE is_template = 1 AND producer_org_id = ?1
             ORDER BY template_name",
        )?;
        let templates = stmt
            .query_map(params![producer_org_id], |row| {
                Ok(TemplateRef {
                    id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    animal_type: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    }
}

fn map_modification(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModificationRecord> {
    Ok(ModificationRecord {
        thickness: row.get(0)?,
        weight_lbs: row.get(1)?,
        pieces_per_package: row.get(2)?,
        note: row.get(3)?,
        modified_at: row.get(4)?,
    })
}

fn map_removed_cut(row: &rusqlite::Row<'_>) -> rusqlite::Result<RemovedCut> {
    Ok(RemovedCut {
        cut_id: row.get(0)?,
        cut_name: row.get(1)?,
        reason: row.get(2)?,
        removed_at: row.get(3)?,
    })
}

fn map_added_cut(row: &rusqlite::Row<'_>) -> rusqlite::Result<AddedCut> {
    Ok(AddedCut {
        cut_id: row.get(0)?,
        cut_name: row.get(1)?,
        thickness: row.get(2)?,
        pieces_per_package: row.get(3)?,
        note: row.get(4)?,
        added_at: row.get(5)?,
    })
}
