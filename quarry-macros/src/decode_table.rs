use crate::decode_column::{ColumnMetadata, FieldKind, FieldMetadata, decode_column};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{ItemStruct, LitInt, LitStr, Path, parse::ParseBuffer};

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) schema: String,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) read_only: bool,
    pub(crate) truncate: bool,
    /// Seconds the cached results of the table live.
    pub(crate) cache: Option<u64>,
    pub(crate) validate: Option<Path>,
}

impl TableMetadata {
    pub(crate) fn columns(&self) -> impl Iterator<Item = (&FieldMetadata, &ColumnMetadata)> {
        self.fields.iter().filter_map(|f| f.column().map(|c| (f, c)))
    }

    pub(crate) fn checksum(&self) -> Option<&FieldMetadata> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::Checksum))
    }
}

pub(crate) fn decode_table(item: ItemStruct) -> TableMetadata {
    let fields: Vec<_> = item.fields.iter().map(decode_column).collect();
    let mut name = item.ident.to_string().to_case(Case::Snake);
    let mut schema = String::new();
    let mut read_only = false;
    let mut truncate = false;
    let mut cache = None;
    let mut validate = None;
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("quarry") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `quarry`, use it like: `#[quarry(attribute = value, ..)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `name`, use it like: `#[quarry(name = \"my_table\")]`"
                    );
                };
                name = value.value();
            } else if arg.path.is_ident("schema") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `schema`, use it like: `#[quarry(schema = \"my_schema\")]`"
                    );
                };
                schema = value.value();
            } else if arg.path.is_ident("read_only") {
                read_only = true;
            } else if arg.path.is_ident("truncate") {
                truncate = true;
            } else if arg.path.is_ident("cache") {
                let Ok(value) = arg
                    .value()
                    .and_then(ParseBuffer::parse::<LitInt>)
                    .and_then(|v| v.base10_parse::<u64>())
                else {
                    panic!("Error while parsing `cache`, use it like: `#[quarry(cache = 60)]` (seconds)");
                };
                cache = Some(value);
            } else if arg.path.is_ident("validate") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<Path>) else {
                    panic!(
                        "Error while parsing `validate`, use it like: `#[quarry(validate = Self::check)]`"
                    );
                };
                validate = Some(value);
            } else {
                panic!(
                    "Unknown attribute `{}` inside quarry macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    if fields
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Checksum))
        .count()
        > 1
    {
        panic!("`{}` declares more than one checksum field", item.ident);
    }
    TableMetadata {
        item,
        name,
        schema,
        fields,
        read_only,
        truncate,
        cache,
        validate,
    }
}
