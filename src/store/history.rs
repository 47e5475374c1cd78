//! Change history rows - append-only
//!
//! Nothing in this module updates or deletes; the ledger only grows.

use chrono::Utc;
use rusqlite::params;
use serde_json::Value;

use super::{column_json, Store, StoreError};
use crate::core::identity::EntityId;
use crate::core::session::PartyRole;
use crate::entities::history::{ChangeCategory, ChangeType, HistoryEntry, NewHistoryEntry};

const ENTRY_COLUMNS: &str = "id, cut_sheet_id, processing_order_id, changed_by_user_id,
        changed_by_org_id, changed_by_role, change_type, change_category,
        change_summary, previous_state, new_state, changed_fields,
        affected_cut_id, affected_package_id, created_at";

impl Store {
    /// Append one ledger entry, stamping the store clock
    pub fn append_history(&self, entry: NewHistoryEntry) -> Result<i64, StoreError> {
        let previous = entry
            .previous_state
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn().execute(
            "INSERT INTO cut_sheet_history (
                cut_sheet_id, processing_order_id, changed_by_user_id,
                changed_by_org_id, changed_by_role, change_type, change_category,
                change_summary, previous_state, new_state, changed_fields,
                affected_cut_id, affected_package_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                entry.cut_sheet_id,
                entry.processing_order_id,
                entry.changed_by_user_id,
                entry.changed_by_org_id,
                entry.changed_by_role,
                entry.change_type,
                entry.change_category,
                entry.change_summary,
                previous,
                serde_json::to_string(&entry.new_state)?,
                serde_json::to_string(&entry.changed_fields)?,
                entry.affected_cut_id,
                entry.affected_package_id,
                Utc::now(),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// All entries for a document, newest first
    pub fn history(&self, sheet_id: &EntityId) -> Result<Vec<HistoryEntry>, StoreError> {
        self.query_history(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM cut_sheet_history
                 WHERE cut_sheet_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ),
            params![sheet_id],
        )
    }

    pub fn history_by_category(
        &self,
        sheet_id: &EntityId,
        category: ChangeCategory,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.query_history(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM cut_sheet_history
                 WHERE cut_sheet_id = ?1 AND change_category = ?2
                 ORDER BY created_at DESC, id DESC"
            ),
            params![sheet_id, category],
        )
    }

    pub fn history_by_role(
        &self,
        sheet_id: &EntityId,
        role: PartyRole,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.query_history(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM cut_sheet_history
                 WHERE cut_sheet_id = ?1 AND changed_by_role = ?2
                 ORDER BY created_at DESC, id DESC"
            ),
            params![sheet_id, role],
        )
    }

    /// The `new_state` of the unique `created` entry
    pub fn original_state(&self, sheet_id: &EntityId) -> Result<Option<Value>, StoreError> {
        let entries = self.query_history(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM cut_sheet_history
                 WHERE cut_sheet_id = ?1 AND change_type = ?2
                 ORDER BY created_at ASC, id ASC LIMIT 1"
            ),
            params![sheet_id, ChangeType::Created],
        )?;
        Ok(entries.into_iter().next().map(|entry| entry.new_state))
    }

    fn query_history(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut stmt = self.conn().prepare(sql)?;
        let entries = stmt
            .query_map(params, |row| {
                let previous_state = row
                    .get::<_, Option<String>>(9)?
                    .map(|text| column_json(9, &text))
                    .transpose()?;
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    cut_sheet_id: row.get(1)?,
                    processing_order_id: row.get(2)?,
                    changed_by_user_id: row.get(3)?,
                    changed_by_org_id: row.get(4)?,
                    changed_by_role: row.get(5)?,
                    change_type: row.get(6)?,
                    change_category: row.get(7)?,
                    change_summary: row.get(8)?,
                    previous_state,
                    new_state: column_json(10, &row.get::<_, String>(10)?)?,
                    changed_fields: column_json(11, &row.get::<_, String>(11)?)?,
                    affected_cut_id: row.get(12)?,
                    affected_package_id: row.get(13)?,
                    created_at: row.get(14)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use serde_json::json;

    fn entry_for(sheet_id: &EntityId, category: ChangeCategory, role: PartyRole) -> NewHistoryEntry {
        NewHistoryEntry {
            cut_sheet_id: *sheet_id,
            processing_order_id: Some("order_1".to_string()),
            changed_by_user_id: "usr_1".to_string(),
            changed_by_org_id: "org_1".to_string(),
            changed_by_role: role,
            change_type: ChangeType::Updated,
            change_category: category,
            change_summary: "test".to_string(),
            previous_state: Some(json!({"x": 1})),
            new_state: json!({"x": 2}),
            changed_fields: vec!["x".to_string()],
            affected_cut_id: None,
            affected_package_id: None,
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);

        let id = store
            .append_history(entry_for(&sheet_id, ChangeCategory::General, PartyRole::Producer))
            .unwrap();
        assert!(id > 0);

        let entries = store.history(&sheet_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].previous_state, Some(json!({"x": 1})));
        assert_eq!(entries[0].new_state, json!({"x": 2}));
        assert_eq!(entries[0].changed_fields, vec!["x"]);
    }

    #[test]
    fn test_newest_first_ordering() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);

        for category in [
            ChangeCategory::InitialCreation,
            ChangeCategory::CutRemoved,
            ChangeCategory::WeightEntered,
        ] {
            store
                .append_history(entry_for(&sheet_id, category, PartyRole::Processor))
                .unwrap();
        }

        let entries = store.history(&sheet_id).unwrap();
        assert_eq!(entries[0].change_category, ChangeCategory::WeightEntered);
        assert_eq!(entries[2].change_category, ChangeCategory::InitialCreation);
    }

    #[test]
    fn test_category_and_role_filters() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);

        store
            .append_history(entry_for(&sheet_id, ChangeCategory::CutRemoved, PartyRole::Processor))
            .unwrap();
        store
            .append_history(entry_for(&sheet_id, ChangeCategory::General, PartyRole::Producer))
            .unwrap();

        let removed = store
            .history_by_category(&sheet_id, ChangeCategory::CutRemoved)
            .unwrap();
        assert_eq!(removed.len(), 1);

        let producer = store.history_by_role(&sheet_id, PartyRole::Producer).unwrap();
        assert_eq!(producer.len(), 1);
        assert_eq!(producer[0].change_category, ChangeCategory::General);
    }

    #[test]
    fn test_original_state_requires_created_entry() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);

        store
            .append_history(entry_for(&sheet_id, ChangeCategory::General, PartyRole::Producer))
            .unwrap();
        assert!(store.original_state(&sheet_id).unwrap().is_none());

        let mut created = entry_for(&sheet_id, ChangeCategory::InitialCreation, PartyRole::Producer);
        created.change_type = ChangeType::Created;
        created.previous_state = None;
        created.new_state = json!({"animal_type": "beef"});
        store.append_history(created).unwrap();

        let original = store.original_state(&sheet_id).unwrap().unwrap();
        assert_eq!(original, json!({"animal_type": "beef"}));
    }
}
