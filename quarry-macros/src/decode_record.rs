use crate::decode_field::{FieldMetadata, decode_field};
use syn::{Fields, ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct RecordMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) type_name: String,
    pub(crate) table: Option<String>,
    pub(crate) schema: Option<String>,
    pub(crate) escape_reserved: bool,
    pub(crate) fields: Vec<FieldMetadata>,
}

pub(crate) fn decode_record(item: ItemStruct) -> RecordMetadata {
    if !item.generics.params.is_empty() {
        panic!("Record `{}` cannot be generic", item.ident);
    }
    let Fields::Named(named) = &item.fields else {
        panic!(
            "Record `{}` must have named fields, tuple and unit structs are not supported",
            item.ident
        );
    };
    let fields = named.named.iter().map(decode_field).collect();
    let mut table = None;
    let mut schema = None;
    let mut escape_reserved = false;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("quarry") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `quarry`, use it like: `#[quarry(attribute = value, ..)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") || arg.path.is_ident("table") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[quarry(name = \"my_table\")]`");
                };
                table = Some(value.value());
            } else if arg.path.is_ident("schema") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `schema`, use it like: `#[quarry(schema = \"my_schema\")]`");
                };
                schema = Some(value.value());
            } else if arg.path.is_ident("escape_reserved") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `escape_reserved`, use it like: `#[quarry(escape_reserved)]`");
                };
                escape_reserved = true;
            } else {
                panic!("Unknown attribute `{}` inside quarry macro", quote::ToTokens::to_token_stream(&arg.path));
            }
            Ok(())
        });
    }
    RecordMetadata {
        type_name: item.ident.to_string(),
        item,
        table,
        schema,
        escape_reserved,
        fields,
    }
}
