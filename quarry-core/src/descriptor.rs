use crate::{ErrorKind, Result, Value};
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};
use std::{borrow::Cow, time::Duration};

/// Fully qualified reference to a table column.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Column name.
    pub name: &'static str,
    /// Table name.
    pub table: &'static str,
    /// Schema name (may be empty).
    pub schema: &'static str,
}

impl ColumnRef {
    pub const fn new(name: &'static str, table: &'static str, schema: &'static str) -> Self {
        Self {
            name,
            table,
            schema,
        }
    }
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            name: Cow::Borrowed(self.table),
            schema: Cow::Borrowed(self.schema),
            alias: Cow::Borrowed(""),
        }
    }
}

/// Table reference as it appears in a `FROM` or `JOIN` clause.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    pub schema: Cow<'static, str>,
    pub alias: Cow<'static, str>,
}

impl TableRef {
    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.alias.is_empty() {
            result.push_str(&self.alias);
        } else {
            if !self.schema.is_empty() {
                result.push_str(&self.schema);
                result.push('.');
            }
            result.push_str(&self.name);
        }
        result
    }
}

/// Mapping of one entity field to one table column.
#[derive(Default, Debug, Clone)]
pub struct ColumnDescriptor {
    /// Column identity.
    pub column_ref: ColumnRef,
    /// Name of the mapped field.
    pub field: &'static str,
    /// Explicit SQL type override (empty => inferred from `value`).
    pub column_type: &'static str,
    /// `NULL` prototype describing the provider data type.
    pub value: Value,
    /// Part of the row identity, used in the `WHERE` of update, delete, reload and exists.
    pub identifier: bool,
    /// Generated by the storage on insert.
    pub auto_increment: bool,
    pub nullable: bool,
    /// Computed by the storage, never written.
    pub computed: bool,
    /// Written on insert, never updated.
    pub read_only: bool,
    /// Position inside the table descriptor.
    pub ordinal: usize,
    pub size: Option<u32>,
    /// The storage provides a default value.
    pub has_default: bool,
    /// SQL providing the value: the default of a defaulted column or the generation expression
    /// of a computed one.
    pub expression: Option<&'static str>,
    /// Sequence feeding the column, for the dialects that use them.
    pub sequence: Option<&'static str>,
}

impl ColumnDescriptor {
    pub fn name(&self) -> &'static str {
        self.column_ref.name
    }
    pub fn table(&self) -> &'static str {
        self.column_ref.table
    }
    /// The column is part of the `INSERT` column list.
    pub fn insertable(&self) -> bool {
        !self.auto_increment && !self.computed
    }
    /// The column is part of the `UPDATE` set list.
    pub fn updatable(&self) -> bool {
        !self.identifier && !self.auto_increment && !self.computed && !self.read_only
    }
    /// The value is written by the application (and therefore covered by the checksum).
    pub fn persisted(&self) -> bool {
        !self.computed
    }
    /// The storage fills this column, the instance must be refreshed after writing.
    pub fn generated(&self) -> bool {
        self.auto_increment || self.computed || self.has_default
    }
}

impl<'a> From<&'a ColumnDescriptor> for &'a ColumnRef {
    fn from(value: &'a ColumnDescriptor) -> Self {
        &value.column_ref
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    #[default]
    OneToOne,
    OneToMany,
}

impl ToTokens for RelationKind {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            RelationKind::OneToOne => quote!(::quarry::RelationKind::OneToOne),
            RelationKind::OneToMany => quote!(::quarry::RelationKind::OneToMany),
        });
    }
}

/// Compositional association with another mapped type.
#[derive(Default, Debug, Clone)]
pub struct RelationDescriptor {
    /// Name of the field holding the related instances.
    pub field: &'static str,
    pub kind: RelationKind,
    /// Table name of the related type.
    pub target: &'static str,
    /// Column of this table carrying the key.
    pub local_column: &'static str,
    /// Column of the related table matching `local_column`.
    pub foreign_column: &'static str,
    pub allow_preload: bool,
}

/// Operations the table allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub select: bool,
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
    pub truncate: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            select: true,
            insert: true,
            update: true,
            delete: true,
            truncate: false,
        }
    }
}

/// Result caching policy of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub enabled: bool,
    pub timeout: Duration,
}

/// Static description of how a type maps to a table.
#[derive(Default, Debug, Clone)]
pub struct TableDescriptor {
    /// Rust type name, used in messages.
    pub type_name: &'static str,
    pub name: &'static str,
    pub schema: &'static str,
    pub columns: Vec<ColumnDescriptor>,
    pub relations: Vec<RelationDescriptor>,
    pub capabilities: Capabilities,
    pub cache: Option<CachePolicy>,
}

impl TableDescriptor {
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            name: Cow::Borrowed(self.name),
            schema: Cow::Borrowed(self.schema),
            alias: Cow::Borrowed(""),
        }
    }

    /// `schema.name`, or just `name` without schema.
    pub fn full_name(&self) -> String {
        self.table_ref().full_name()
    }

    /// Lookup by column name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Lookup by mapped field name, failing when the member is not mapped.
    pub fn column_by_field(&self, field: &str) -> Result<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .ok_or_else(|| {
                ErrorKind::MissingColumnDescriptor {
                    type_name: self.type_name,
                    member: field.to_string(),
                }
                .into()
            })
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &ColumnDescriptor> + Clone {
        self.columns.iter().filter(|c| c.identifier)
    }

    pub fn relation(&self, field: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.field == field)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some_and(|v| v.enabled)
    }
}
