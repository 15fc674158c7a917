use crate::{ColumnDescriptor, Entity, ErrorKind, Result, TableDescriptor};
use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

static GLOBAL: LazyLock<Catalog> = LazyLock::new(Catalog::new);

/// Cache of the table descriptors, keyed by type identity.
///
/// Reads share the lock, a miss builds the descriptor outside of it and the first insert wins.
#[derive(Default, Debug)]
pub struct Catalog {
    tables: RwLock<HashMap<TypeId, Arc<TableDescriptor>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process wide instance used by [`Entity::describe`].
    pub fn global() -> &'static Catalog {
        &GLOBAL
    }

    pub fn describe<E: Entity>(&self) -> Result<Arc<TableDescriptor>> {
        self.register_with(TypeId::of::<E>(), type_name::<E>(), E::declare)
    }

    /// Descriptor of an already registered type.
    pub fn describe_id(&self, id: TypeId) -> Result<Arc<TableDescriptor>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                ErrorKind::MissingTableDescriptor {
                    type_name: "<unregistered type>",
                }
                .into()
            })
    }

    pub fn describe_column<E: Entity>(&self, field: &str) -> Result<ColumnDescriptor> {
        Ok(self.describe::<E>()?.column_by_field(field)?.clone())
    }

    /// Returns the descriptor of `id`, building it with `declare` on the first request.
    pub fn register_with(
        &self,
        id: TypeId,
        type_name: &'static str,
        declare: impl FnOnce() -> TableDescriptor,
    ) -> Result<Arc<TableDescriptor>> {
        if let Some(table) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(table.clone());
        }
        let table = declare();
        if table.name.is_empty() {
            return Err(ErrorKind::MissingTableDescriptor { type_name }.into());
        }
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.entry(id).or_insert_with(|| Arc::new(table)).clone())
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnRef, Value};
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    struct Unmapped;
    struct Mapped;

    static DECLARED: AtomicUsize = AtomicUsize::new(0);

    fn mapped() -> TableDescriptor {
        DECLARED.fetch_add(1, Ordering::Relaxed);
        TableDescriptor {
            type_name: "Mapped",
            name: "mapped",
            columns: vec![ColumnDescriptor {
                column_ref: ColumnRef::new("id", "mapped", ""),
                field: "id",
                value: Value::Int64(None),
                identifier: true,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn missing_table_name() {
        let catalog = Catalog::new();
        let error = catalog
            .register_with(TypeId::of::<Unmapped>(), "Unmapped", TableDescriptor::default)
            .expect_err("No table name");
        assert!(matches!(
            error.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::MissingTableDescriptor {
                type_name: "Unmapped"
            })
        ));
        assert!(catalog.describe_id(TypeId::of::<Unmapped>()).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn concurrent_first_access_shares_one_descriptor() {
        let catalog = Catalog::new();
        let tables = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        catalog
                            .register_with(TypeId::of::<Mapped>(), "Mapped", mapped)
                            .expect("Mapped type")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("Thread"))
                .collect::<Vec<_>>()
        });
        let first = catalog
            .describe_id(TypeId::of::<Mapped>())
            .expect("Registered");
        assert!(tables.iter().all(|t| Arc::ptr_eq(t, &first)));
        assert_eq!(catalog.len(), 1);
        assert!(DECLARED.load(Ordering::Relaxed) >= 1);
        assert!(first.column_by_field("missing").is_err());
    }
}
