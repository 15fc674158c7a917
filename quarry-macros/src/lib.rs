mod decode_column;
mod decode_table;
mod encode_descriptor;
mod from_row;
mod load_relations;
mod value_enum;

use decode_column::FieldKind;
use decode_table::decode_table;
use encode_descriptor::encode_descriptor;
use from_row::from_row;
use load_relations::load_relations;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemEnum, ItemStruct, parse_macro_input};
use value_enum::value_enum;

#[proc_macro_derive(Entity, attributes(quarry))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let table = decode_table(item);
    let item = &table.item;
    let name = &item.ident;
    let vis = &item.vis;
    let (impl_generics, type_generics, where_clause) = item.generics.split_for_impl();
    let table_name = &table.name;
    let schema_name = &table.schema;
    let declare = encode_descriptor(&table);
    let from_row = from_row(&table);
    let load_relations = load_relations(&table);
    let column_refs = table.columns().map(|(field, column)| {
        let ident = &field.ident;
        let column = &column.name;
        quote! {
            #[allow(non_upper_case_globals)]
            #vis const #ident: ::quarry::ColumnRef =
                ::quarry::ColumnRef::new(#column, #table_name, #schema_name);
        }
    });
    let row = table.columns().map(|(field, _)| {
        let ident = &field.ident;
        let ty = &field.ty;
        quote!(<#ty as ::quarry::AsValue>::as_value(::std::clone::Clone::clone(&self.#ident)))
    });
    let set_column = table.columns().map(|(field, column)| {
        let ident = &field.ident;
        let ty = &field.ty;
        let column = &column.name;
        quote!(#column => self.#ident = <#ty as ::quarry::AsValue>::try_from_value(value)?)
    });
    let checksum = table.checksum().map(|field| {
        let ident = &field.ident;
        quote! {
            const TRACKS_CHECKSUM: bool = true;

            fn checksum(&self) -> Option<u64> {
                self.#ident
            }

            fn set_checksum(&mut self, checksum: Option<u64>) {
                self.#ident = checksum;
            }
        }
    });
    let validate = table.validate.as_ref().map(|path| {
        quote! {
            fn validate(&self) -> ::quarry::Result<()> {
                #path(self)
            }
        }
    });
    if table
        .fields
        .iter()
        .all(|f| !matches!(f.kind, FieldKind::Column(..)))
    {
        panic!("`{}` must map at least one column", name);
    }
    quote! {
        impl #impl_generics #name #type_generics #where_clause {
            #(#column_refs)*
        }

        impl #impl_generics ::quarry::Entity for #name #type_generics #where_clause {
            const TABLE_NAME: &'static str = #table_name;

            #checksum

            fn declare() -> ::quarry::TableDescriptor {
                #declare
            }

            #from_row

            fn row(&self) -> ::std::vec::Vec<::quarry::Value> {
                vec![#(#row),*]
            }

            fn set_column(&mut self, column: &str, value: ::quarry::Value) -> ::quarry::Result<()> {
                match column {
                    #(#set_column,)*
                    _ => {
                        return Err(::quarry::ErrorKind::MissingColumnDescriptor {
                            type_name: ::std::any::type_name::<Self>(),
                            member: column.to_string(),
                        }
                        .into());
                    }
                }
                Ok(())
            }

            #validate

            #load_relations
        }
    }
    .into()
}

/// Stores a fieldless enum by variant name, `#[quarry(name = "..")]` renames a variant.
#[proc_macro_derive(ValueEnum, attributes(quarry))]
pub fn derive_value_enum(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemEnum);
    value_enum(&item).into()
}
