//! The store contract

use crate::filter::{Field, Filter};
use crate::record::{Extension, NewExtension};
use crate::Result;

/// Persistence for installed extension records.
///
/// Implementations own slug uniqueness and id assignment. Ids are never
/// reused, even across process restarts.
pub trait ExtensionStore: Send + Sync {
    /// Create the backing storage if it does not exist yet.
    ///
    /// Calling this on storage that already exists is a success.
    fn prepare(&self) -> Result<()>;

    /// Persist a new record and return it with its assigned id.
    fn create(&self, record: NewExtension) -> Result<Extension>;

    fn find(&self, id: i64) -> Result<Option<Extension>>;

    fn find_by_slug(&self, slug: &str) -> Result<Option<Extension>>;

    /// Records matching `filter`, in id order.
    fn all(&self, filter: &Filter) -> Result<Vec<Extension>>;

    /// Overwrite the record with the same id.
    fn save(&self, record: &Extension) -> Result<()>;

    /// Enabled records, with the caller's conditions applied after the base one.
    fn enabled(&self, filter: Option<&Filter>) -> Result<Vec<Extension>> {
        self.all(&scoped(true, filter))
    }

    /// Disabled records, with the caller's conditions applied after the base one.
    fn disabled(&self, filter: Option<&Filter>) -> Result<Vec<Extension>> {
        self.all(&scoped(false, filter))
    }
}

fn scoped(enabled: bool, filter: Option<&Filter>) -> Filter {
    let base = Filter::eq(Field::Enabled, enabled);
    match filter {
        Some(extra) => base.merge(extra),
        None => base,
    }
}
