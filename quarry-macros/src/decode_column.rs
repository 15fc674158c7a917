use proc_macro2::TokenStream;
use quarry_core::{TypeDecoded, decode_type};
use quote::ToTokens;
use syn::{Field, Ident, LitBool, LitInt, LitStr, Type, meta::ParseNestedMeta, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) name: String,
    pub(crate) column_type: String,
    pub(crate) nullable: bool,
    pub(crate) identifier: bool,
    pub(crate) auto_increment: bool,
    pub(crate) computed: bool,
    pub(crate) read_only: bool,
    pub(crate) size: Option<u32>,
    pub(crate) has_default: bool,
    pub(crate) expression: Option<String>,
    pub(crate) sequence: Option<String>,
}

pub(crate) struct RelationMetadata {
    pub(crate) target: Type,
    pub(crate) decoded: TypeDecoded,
    pub(crate) local: String,
    pub(crate) foreign: String,
    pub(crate) preload: bool,
}

pub(crate) enum FieldKind {
    Column(ColumnMetadata),
    Relation(RelationMetadata),
    /// `Option<u64>` holding the checksum of the loaded row.
    Checksum,
    /// Not mapped, `Default::default()` when materialized.
    Ignored,
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) kind: FieldKind,
}

impl FieldMetadata {
    pub(crate) fn column(&self) -> Option<&ColumnMetadata> {
        match &self.kind {
            FieldKind::Column(v) => Some(v),
            _ => None,
        }
    }
}

fn flag(arg: &ParseNestedMeta, name: &str) -> bool {
    let Err(..) = arg.value() else {
        // value() is Err for Meta::Path
        panic!("Error while parsing `{name}`, use it like: `#[quarry({name})]`");
    };
    true
}

fn string(arg: &ParseNestedMeta, name: &str) -> String {
    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
        panic!("Error while parsing `{name}`, use it like: `#[quarry({name} = \"..\")]`");
    };
    v.value()
}

fn decode_relation(arg: &ParseNestedMeta) -> (String, String) {
    let mut local = None;
    let mut foreign = None;
    let result = arg.parse_nested_meta(|nested| {
        if nested.path.is_ident("local") {
            local = Some(string(&nested, "local"));
        } else if nested.path.is_ident("foreign") {
            foreign = Some(string(&nested, "foreign"));
        } else {
            panic!(
                "Unknown argument `{}` of `relation`",
                nested.path.to_token_stream()
            );
        }
        Ok(())
    });
    match (result, local, foreign) {
        (Ok(..), Some(local), Some(foreign)) => (local, foreign),
        _ => panic!(
            "Error while parsing `relation`, use it like: `#[quarry(relation(local = \"Id\", foreign = \"ParentId\"))]`"
        ),
    }
}

pub(crate) fn decode_column(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let decoded = decode_type(&field.ty);
    let mut name = ident.to_string();
    if name.starts_with('_') {
        name.remove(0);
    }
    let mut column = ColumnMetadata {
        name,
        column_type: String::new(),
        nullable: decoded.nullable,
        identifier: false,
        auto_increment: false,
        computed: false,
        read_only: false,
        size: None,
        has_default: false,
        expression: None,
        sequence: None,
    };
    let mut relation = None;
    let mut preload = true;
    let mut checksum = false;
    let mut ignore = false;
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("quarry") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `quarry`, use it like: `#[quarry(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                column.name = string(&arg, "name");
            } else if arg.path.is_ident("column_type") {
                column.column_type = string(&arg, "column_type");
            } else if arg.path.is_ident("size") {
                let Ok(v) = arg
                    .value()
                    .and_then(ParseBuffer::parse::<LitInt>)
                    .and_then(|v| v.base10_parse::<u32>())
                else {
                    panic!("Error while parsing `size`, use it like: `#[quarry(size = 50)]`");
                };
                column.size = Some(v);
            } else if arg.path.is_ident("identifier") {
                column.identifier = flag(&arg, "identifier");
                column.nullable = false;
            } else if arg.path.is_ident("auto_increment") {
                column.auto_increment = flag(&arg, "auto_increment");
            } else if arg.path.is_ident("computed") {
                column.computed = flag(&arg, "computed");
            } else if arg.path.is_ident("read_only") {
                column.read_only = flag(&arg, "read_only");
            } else if arg.path.is_ident("default") {
                column.has_default = true;
                if arg.input.peek(syn::Token![=]) {
                    column.expression = Some(string(&arg, "default"));
                }
            } else if arg.path.is_ident("expression") {
                column.expression = Some(string(&arg, "expression"));
            } else if arg.path.is_ident("sequence") {
                column.sequence = Some(string(&arg, "sequence"));
            } else if arg.path.is_ident("relation") {
                relation = Some(decode_relation(&arg));
            } else if arg.path.is_ident("preload") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitBool>) else {
                    panic!("Error while parsing `preload`, use it like: `#[quarry(preload = false)]`");
                };
                preload = v.value;
            } else if arg.path.is_ident("checksum") {
                checksum = flag(&arg, "checksum");
            } else if arg.path.is_ident("ignore") {
                ignore = flag(&arg, "ignore");
            } else {
                panic!(
                    "Unknown attribute `{}` inside quarry macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    let kind = if ignore {
        FieldKind::Ignored
    } else if checksum {
        if !decoded.nullable || decoded.inner.to_token_stream().to_string() != "u64" {
            panic!("The checksum field `{ident}` must be a `Option<u64>`");
        }
        FieldKind::Checksum
    } else if let Some((local, foreign)) = relation {
        if !decoded.list && !decoded.nullable {
            panic!(
                "The relation field `{ident}` must be a `Vec<T>` (one to many) or an `Option<T>` (one to one)"
            );
        }
        FieldKind::Relation(RelationMetadata {
            target: decoded.inner.clone(),
            decoded,
            local,
            foreign,
            preload,
        })
    } else {
        FieldKind::Column(column)
    };
    FieldMetadata {
        ident,
        ty: field.ty.clone(),
        kind,
    }
}

/// Tokens of an optional string.
pub(crate) fn option_str(value: &Option<String>) -> TokenStream {
    match value {
        Some(v) => quote::quote!(Some(#v)),
        None => quote::quote!(None),
    }
}
