//! In-process extension store

use parking_lot::Mutex;

use crate::filter::Filter;
use crate::record::{Extension, NewExtension};
use crate::store::ExtensionStore;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<Extension>,
}

/// Store that keeps records in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records. Ids continue after the highest one.
    pub fn with_records(records: impl IntoIterator<Item = Extension>) -> Self {
        let mut rows: Vec<Extension> = records.into_iter().collect();
        rows.sort_by_key(|r| r.id);
        let next_id = rows.last().map_or(0, |r| r.id);
        Self {
            table: Mutex::new(Table { next_id, rows }),
        }
    }

    pub fn len(&self) -> usize {
        self.table.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExtensionStore for MemoryStore {
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn create(&self, record: NewExtension) -> Result<Extension> {
        let mut table = self.table.lock();
        if table.rows.iter().any(|r| r.slug == record.slug) {
            return Err(Error::DuplicateSlug { slug: record.slug });
        }
        table.next_id += 1;
        let created = record.into_record(table.next_id);
        table.rows.push(created.clone());
        Ok(created)
    }

    fn find(&self, id: i64) -> Result<Option<Extension>> {
        Ok(self.table.lock().rows.iter().find(|r| r.id == id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Extension>> {
        Ok(self.table.lock().rows.iter().find(|r| r.slug == slug).cloned())
    }

    fn all(&self, filter: &Filter) -> Result<Vec<Extension>> {
        Ok(filter.apply(&self.table.lock().rows))
    }

    fn save(&self, record: &Extension) -> Result<()> {
        let mut table = self.table.lock();
        replace_row(&mut table.rows, record)
    }
}

/// Replace the row with `record.id`, keeping the slug unique.
pub(crate) fn replace_row(rows: &mut [Extension], record: &Extension) -> Result<()> {
    if rows.iter().any(|r| r.id != record.id && r.slug == record.slug) {
        return Err(Error::DuplicateSlug {
            slug: record.slug.clone(),
        });
    }
    let row = rows
        .iter_mut()
        .find(|r| r.id == record.id)
        .ok_or(Error::RecordNotFound { id: record.id })?;
    *row = record.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_are_sequential_and_slugs_unique() {
        let store = MemoryStore::new();
        let a = store.create(NewExtension::new("users")).unwrap();
        let b = store.create(NewExtension::new("menus")).unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert!(matches!(
            store.create(NewExtension::new("users")),
            Err(Error::DuplicateSlug { slug }) if slug == "users"
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn save_updates_in_place() {
        let store = MemoryStore::new();
        let mut menus = store.create(NewExtension::new("menus")).unwrap();
        menus.enabled = true;
        store.save(&menus).unwrap();

        assert_eq!(store.find(menus.id).unwrap(), Some(menus));
    }

    #[test]
    fn save_rejects_unknown_id_and_slug_collision() {
        let store = MemoryStore::new();
        store.create(NewExtension::new("users")).unwrap();
        let mut menus = store.create(NewExtension::new("menus")).unwrap();

        let ghost = NewExtension::new("ghost").into_record(42);
        assert!(matches!(store.save(&ghost), Err(Error::RecordNotFound { id: 42 })));

        menus.slug = "users".into();
        assert!(matches!(store.save(&menus), Err(Error::DuplicateSlug { .. })));
    }

    #[test]
    fn seeded_store_continues_ids() {
        let store = MemoryStore::with_records([
            NewExtension::new("b").into_record(7),
            NewExtension::new("a").into_record(3),
        ]);
        let c = store.create(NewExtension::new("c")).unwrap();

        assert_eq!(c.id, 8);
        let ids: Vec<i64> = store.all(&Filter::all()).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 7, 8]);
    }
}
