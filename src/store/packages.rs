//! Produced package rows

use rusqlite::{params, OptionalExtension};

use super::{Store, StoreError};
use crate::core::identity::EntityId;
use crate::entities::package::ProducedPackage;

impl Store {
    /// Next free package number for a `(sheet, cut)` pair
    pub fn next_package_number(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
    ) -> Result<i64, StoreError> {
        let max: Option<i64> = self.conn().query_row(
            "SELECT MAX(package_number) FROM produced_packages
             WHERE cut_sheet_id = ?1 AND cut_id = ?2",
            params![sheet_id, cut_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// Insert a package row; a number collision maps to `PackageNumberTaken`
    ///
    /// The UNIQUE index on `(cut_sheet_id, cut_id, package_number)` is what
    /// turns the read-max-then-insert race into a retryable conflict instead
    /// of a silent duplicate.
    pub fn insert_package(&self, package: &ProducedPackage) -> Result<(), StoreError> {
        let result = self.conn().execute(
            "INSERT INTO produced_packages (
                id, cut_sheet_id, cut_id, cut_name, primal_id, package_number,
                quantity_in_package, actual_weight_lbs, thickness,
                processing_style, processor_added, processor_notes,
                livestock_tracking_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                package.id,
                package.cut_sheet_id,
                package.cut_id,
                package.cut_name,
                package.primal_id,
                package.package_number,
                package.quantity_in_package,
                package.actual_weight_lbs,
                package.thickness,
                package.processing_style,
                package.processor_added,
                package.processor_notes,
                package.livestock_tracking_id,
                package.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::PackageNumberTaken {
                    cut_id: package.cut_id.clone(),
                    package_number: package.package_number,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_package(&self, id: &EntityId) -> Result<Option<ProducedPackage>, StoreError> {
        let package = self
            .conn()
            .query_row(
                "SELECT id, cut_sheet_id, cut_id, cut_name, primal_id, package_number,
                        quantity_in_package, actual_weight_lbs, thickness,
                        processing_style, processor_added, processor_notes,
                        livestock_tracking_id, created_at
                 FROM produced_packages WHERE id = ?1",
                params![id],
                map_package,
            )
            .optional()?;
        Ok(package)
    }

    pub fn update_package_weight(
        &self,
        id: &EntityId,
        weight_lbs: f64,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE produced_packages SET actual_weight_lbs = ?2 WHERE id = ?1",
            params![id, weight_lbs],
        )?;
        Ok(())
    }

    pub fn delete_package(&self, id: &EntityId) -> Result<(), StoreError> {
        self.conn()
            .execute("DELETE FROM produced_packages WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn list_packages(&self, sheet_id: &EntityId) -> Result<Vec<ProducedPackage>, StoreError> {
        let mut stmt = self.conn().prepare(
            "SELECT id, cut_sheet_id, cut_id, cut_name, primal_id, package_number,
                    quantity_in_package, actual_weight_lbs, thickness,
                    processing_style, processor_added, processor_notes,
                    livestock_tracking_id, created_at
             FROM produced_packages WHERE cut_sheet_id = ?1
             ORDER BY cut_id, package_number",
        )?;
        let packages = stmt
            .query_map(params![sheet_id], map_package)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(packages)
    }
}

fn map_package(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProducedPackage> {
    Ok(ProducedPackage {
        id: row.get(0)?,
        cut_sheet_id: row.get(1)?,
        cut_id: row.get(2)?,
        cut_name: row.get(3)?,
        primal_id: row.get(4)?,
        package_number: row.get(5)?,
        quantity_in_package: row.get(6)?,
        actual_weight_lbs: row.get(7)?,
        thickness: row.get(8)?,
        processing_style: row.get(9)?,
        processor_added: row.get(10)?,
        processor_notes: row.get(11)?,
        livestock_tracking_id: row.get(12)?,
        created_at: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use chrono::Utc;

    fn package(sheet_id: &EntityId, cut_id: &str, number: i64) -> ProducedPackage {
        ProducedPackage {
            id: EntityId::new(EntityPrefix::Pkg),
            cut_sheet_id: *sheet_id,
            cut_id: cut_id.to_string(),
            cut_name: cut_id.to_string(),
            primal_id: None,
            package_number: number,
            quantity_in_package: 2,
            actual_weight_lbs: None,
            thickness: None,
            processing_style: None,
            processor_added: false,
            processor_notes: None,
            livestock_tracking_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_number_assignment_starts_at_one() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);
        assert_eq!(store.next_package_number(&sheet_id, "ribeye").unwrap(), 1);

        store.insert_package(&package(&sheet_id, "ribeye", 1)).unwrap();
        assert_eq!(store.next_package_number(&sheet_id, "ribeye").unwrap(), 2);
        // A different cut on the same sheet numbers independently.
        assert_eq!(store.next_package_number(&sheet_id, "t_bone").unwrap(), 1);
    }

    #[test]
    fn test_duplicate_number_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);

        store.insert_package(&package(&sheet_id, "ribeye", 1)).unwrap();
        let err = store
            .insert_package(&package(&sheet_id, "ribeye", 1))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::PackageNumberTaken { package_number: 1, .. }
        ));
    }

    #[test]
    fn test_weight_update_and_delete() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);
        let pkg = package(&sheet_id, "ribeye", 1);
        store.insert_package(&pkg).unwrap();

        store.update_package_weight(&pkg.id, 1.75).unwrap();
        let loaded = store.get_package(&pkg.id).unwrap().unwrap();
        assert_eq!(loaded.actual_weight_lbs, Some(1.75));

        store.delete_package(&pkg.id).unwrap();
        assert!(store.get_package(&pkg.id).unwrap().is_none());
    }

    #[test]
    fn test_listing_orders_by_cut_then_number() {
        let store = Store::open_in_memory().unwrap();
        let sheet_id = EntityId::new(EntityPrefix::Sheet);

        store.insert_package(&package(&sheet_id, "t_bone", 1)).unwrap();
        store.insert_package(&package(&sheet_id, "ribeye", 2)).unwrap();
        store.insert_package(&package(&sheet_id, "ribeye", 1)).unwrap();

        let packages = store.list_packages(&sheet_id).unwrap();
        let keys: Vec<(String, i64)> = packages
            .into_iter()
            .map(|p| (p.cut_id, p.package_number))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("ribeye".to_string(), 1),
                ("ribeye".to_string(), 2),
                ("t_bone".to_string(), 1)
            ]
        );
    }
}
