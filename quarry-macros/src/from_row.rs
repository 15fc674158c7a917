use crate::{decode_column::FieldKind, decode_table::TableMetadata};
use proc_macro2::TokenStream;
use quote::quote;

/// `Entity::from_row`: each column is taken out of the row by label and converted with
/// `AsValue`. Missing labels fail unless the field is an `Option`.
pub(crate) fn from_row(table: &TableMetadata) -> TokenStream {
    let struct_name = table.item.ident.to_string();
    let fields = table.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        match &f.kind {
            FieldKind::Column(column) => {
                let name = &column.name;
                let take = if column.nullable {
                    quote!(row.take_column(#name).unwrap_or(::quarry::Value::Null))
                } else {
                    quote! {
                        row.take_column(#name).ok_or_else(|| ::quarry::Error::msg(format!(
                            "Column `{}` does not exist in the row provided",
                            #name
                        )))?
                    }
                };
                quote! {
                    #ident: <#ty as ::quarry::AsValue>::try_from_value(#take).with_context(|| {
                        format!("While decoding column `{}` of `{}`", #name, #struct_name)
                    })?
                }
            }
            FieldKind::Checksum => quote!(#ident: None),
            FieldKind::Relation(..) | FieldKind::Ignored => {
                quote!(#ident: ::std::default::Default::default())
            }
        }
    });
    quote! {
        fn from_row(mut row: ::quarry::RowLabeled) -> ::quarry::Result<Self> {
            use ::quarry::Context;
            Ok(Self {
                #(#fields),*
            })
        }
    }
}
