use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Fields, ItemEnum, LitStr, parse::ParseBuffer};

/// `AsValue` for a fieldless enum, stored by variant name.
pub(crate) fn value_enum(item: &ItemEnum) -> TokenStream {
    let name = &item.ident;
    let type_name = name.to_string();
    let variants: Vec<_> = item
        .variants
        .iter()
        .map(|variant| {
            if !matches!(variant.fields, Fields::Unit) {
                panic!(
                    "`{}::{}` has fields, `ValueEnum` supports only unit variants",
                    name, variant.ident
                );
            }
            let mut label = variant.ident.to_string();
            for attr in &variant.attrs {
                if !attr.meta.path().is_ident("quarry") {
                    continue;
                }
                let Ok(list) = attr.meta.require_list() else {
                    panic!("Error while parsing `quarry`, use it like: `#[quarry(name = \"..\")]`");
                };
                let _ = list.parse_nested_meta(|arg| {
                    if !arg.path.is_ident("name") {
                        panic!(
                            "Unknown attribute `{}` inside quarry macro",
                            arg.path.to_token_stream()
                        );
                    }
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[quarry(name = \"..\")]`");
                    };
                    label = value.value();
                    Ok(())
                });
            }
            (&variant.ident, label)
        })
        .collect();
    let to_label = variants
        .iter()
        .map(|(ident, label)| quote!(#name::#ident => #label));
    let from_label = variants
        .iter()
        .map(|(ident, label)| quote!(#label => Ok(#name::#ident)));
    quote! {
        impl ::quarry::AsValue for #name {
            fn as_empty_value() -> ::quarry::Value {
                ::quarry::Value::Varchar(None)
            }
            fn as_value(self) -> ::quarry::Value {
                let label: &str = match self {
                    #(#to_label,)*
                };
                ::quarry::Value::Varchar(Some(label.to_string()))
            }
            fn try_from_value(value: ::quarry::Value) -> ::quarry::Result<Self> {
                match value {
                    ::quarry::Value::Varchar(Some(ref v)) | ::quarry::Value::Unknown(Some(ref v)) => {
                        match v.as_str() {
                            #(#from_label,)*
                            _ => Err(::quarry::Error::msg(format!(
                                "`{}` is not a variant of `{}`",
                                v, #type_name
                            ))),
                        }
                    }
                    _ => Err(::quarry::Error::msg(format!(
                        "Cannot convert {:?} into `{}`",
                        value, #type_name
                    ))),
                }
            }
        }
    }
}
