use crate::{
    decode_column::{FieldKind, option_str},
    decode_table::TableMetadata,
};
use proc_macro2::TokenStream;
use quarry_core::RelationKind;
use quote::quote;

/// Body of `Entity::declare`.
pub(crate) fn encode_descriptor(table: &TableMetadata) -> TokenStream {
    let struct_name = table.item.ident.to_string();
    let name = &table.name;
    let schema = &table.schema;
    let columns = table.columns().enumerate().map(|(ordinal, (field, c))| {
        let ty = &field.ty;
        let field = field.ident.to_string();
        let column = &c.name;
        let column_type = &c.column_type;
        let identifier = c.identifier;
        let auto_increment = c.auto_increment;
        let nullable = c.nullable;
        let computed = c.computed;
        let read_only = c.read_only;
        let size = c.size.map_or(quote!(None), |v| quote!(Some(#v)));
        let has_default = c.has_default;
        let expression = option_str(&c.expression);
        let sequence = option_str(&c.sequence);
        quote! {
            ::quarry::ColumnDescriptor {
                column_ref: ::quarry::ColumnRef::new(#column, #name, #schema),
                field: #field,
                column_type: #column_type,
                value: <#ty as ::quarry::AsValue>::as_empty_value(),
                identifier: #identifier,
                auto_increment: #auto_increment,
                nullable: #nullable,
                computed: #computed,
                read_only: #read_only,
                ordinal: #ordinal,
                size: #size,
                has_default: #has_default,
                expression: #expression,
                sequence: #sequence,
            }
        }
    });
    let relations = table.fields.iter().filter_map(|f| {
        let FieldKind::Relation(relation) = &f.kind else {
            return None;
        };
        let field = f.ident.to_string();
        let kind = if relation.decoded.list {
            RelationKind::OneToMany
        } else {
            RelationKind::OneToOne
        };
        let target = &relation.target;
        let local = &relation.local;
        let foreign = &relation.foreign;
        let allow_preload = relation.preload;
        Some(quote! {
            ::quarry::RelationDescriptor {
                field: #field,
                kind: #kind,
                target: <#target as ::quarry::Entity>::TABLE_NAME,
                local_column: #local,
                foreign_column: #foreign,
                allow_preload: #allow_preload,
            }
        })
    });
    let writable = !table.read_only;
    let truncate = table.truncate;
    let cache = table.cache.map_or(quote!(None), |seconds| {
        quote! {
            Some(::quarry::CachePolicy {
                enabled: true,
                timeout: ::std::time::Duration::from_secs(#seconds),
            })
        }
    });
    quote! {
        ::quarry::TableDescriptor {
            type_name: #struct_name,
            name: #name,
            schema: #schema,
            columns: vec![#(#columns),*],
            relations: vec![#(#relations),*],
            capabilities: ::quarry::Capabilities {
                select: true,
                insert: #writable,
                update: #writable,
                delete: #writable,
                truncate: #truncate,
            },
            cache: #cache,
        }
    }
}
