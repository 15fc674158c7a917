use crate::matches_path;
use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Shape of a field type, as seen by the derive macros.
#[derive(Clone)]
pub struct TypeDecoded {
    /// The type once `Option`, `Box` and `Vec` are removed.
    pub inner: Type,
    /// Wrapped in `Option`.
    pub nullable: bool,
    /// Wrapped in `Box` (inside the `Option`, if any).
    pub boxed: bool,
    /// A `Vec` of `inner`.
    pub list: bool,
}

fn first_generic(ty: &TypePath) -> Option<&Type> {
    let PathArguments::AngleBracketed(arguments) = &ty.path.segments.last()?.arguments else {
        return None;
    };
    arguments.args.iter().find_map(|v| match v {
        GenericArgument::Type(v) => Some(v),
        _ => None,
    })
}

/// Removes the wrappers the mapping understands: `Option<T>`, `Box<T>`, `Option<Box<T>>` and
/// `Vec<T>`. Recognition is syntactic, aliases of these types are taken as plain values.
pub fn decode_type(ty: &Type) -> TypeDecoded {
    let mut result = TypeDecoded {
        inner: ty.clone(),
        nullable: false,
        boxed: false,
        list: false,
    };
    loop {
        let Type::Path(path) = &result.inner else {
            return result;
        };
        let (nullable, boxed, list) = (
            matches_path(&path.path, &["std", "option", "Option"]),
            matches_path(&path.path, &["std", "boxed", "Box"]),
            matches_path(&path.path, &["std", "vec", "Vec"]),
        );
        if !(nullable || boxed || list) || result.list {
            return result;
        }
        let Some(generic) = first_generic(path).cloned() else {
            return result;
        };
        if list && matches!(&generic, Type::Path(v) if v.path.is_ident("u8")) {
            // Vec<u8> is a blob
            return result;
        }
        result.nullable |= nullable;
        result.boxed |= boxed;
        result.list |= list;
        result.inner = generic;
    }
}

impl TypeDecoded {
    /// Name of the inner type, for messages.
    pub fn inner_name(&self) -> String {
        self.inner.to_token_stream().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn wrappers_are_removed() {
        let decoded = decode_type(&parse_quote!(Option<Box<Customer>>));
        assert!(decoded.nullable && decoded.boxed && !decoded.list);
        assert_eq!(decoded.inner_name(), "Customer");

        let decoded = decode_type(&parse_quote!(std::vec::Vec<OrderLine>));
        assert!(decoded.list && !decoded.nullable);
        assert_eq!(decoded.inner_name(), "OrderLine");

        let decoded = decode_type(&parse_quote!(Vec<u8>));
        assert!(!decoded.list);

        let decoded = decode_type(&parse_quote!(Option<Vec<u8>>));
        assert!(decoded.nullable && !decoded.list);

        let decoded = decode_type(&parse_quote!(i64));
        assert!(!decoded.nullable && !decoded.boxed && !decoded.list);
    }
}
