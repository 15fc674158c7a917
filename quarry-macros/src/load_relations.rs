use crate::{decode_column::FieldKind, decode_table::TableMetadata};
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn load_relations(table: &TableMetadata) -> Option<TokenStream> {
    let loads: Vec<_> = table
        .fields
        .iter()
        .filter_map(|f| {
            let FieldKind::Relation(relation) = &f.kind else {
                return None;
            };
            let ident = &f.ident;
            let field = ident.to_string();
            let target = &relation.target;
            let assign = if relation.decoded.list {
                quote!(self.#ident = related)
            } else if relation.decoded.boxed {
                quote!(self.#ident = related.into_iter().next().map(::std::boxed::Box::new))
            } else {
                quote!(self.#ident = related.into_iter().next())
            };
            Some(quote! {
                if let Some(nested) = preload.get(#field) {
                    if let Some(related) = session
                        .load_related::<Self, #target>(&*self, #field, nested)
                        .await?
                    {
                        #assign;
                    }
                }
            })
        })
        .collect();
    if loads.is_empty() {
        return None;
    }
    Some(quote! {
        fn load_relations<'a, X: ::quarry::Executor>(
            &'a mut self,
            session: &'a mut ::quarry::Session<X>,
            preload: &'a ::quarry::Preload,
        ) -> ::quarry::future::BoxFuture<'a, ::quarry::Result<()>> {
            ::std::boxed::Box::pin(async move {
                #(#loads)*
                Ok(())
            })
        }
    })
}
