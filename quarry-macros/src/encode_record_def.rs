use crate::{RecordMetadata, decode_field::optional_str};
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn encode_record_def(record: &RecordMetadata) -> TokenStream {
    let name = &record.item.ident;
    let type_name = &record.type_name;
    let schema = optional_str(&record.schema);
    let table = optional_str(&record.table);
    let escape_reserved = record.escape_reserved;
    let fields = record.fields.iter().map(|f| {
        let field = &f.name;
        let column = optional_str(&f.column);
        let sequence = optional_str(&f.sequence);
        let primary_key = f.primary_key;
        let generated = f.generated;
        let ignore = f.ignore;
        let length = match f.length {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        let nullable = match f.nullable {
            Some(v) => quote!(Some(#v)),
            None => quote!(None),
        };
        let (value, relation) = match &f.relation {
            Some(relation) => {
                let linked = &relation.linked;
                let local_columns = &relation.local_columns;
                (
                    quote!(::quarry::Value::Null),
                    quote!(Some(::quarry::RelationDef {
                        linked: <#linked as ::quarry::Record>::record_def,
                        local_columns: vec![#(#local_columns),*],
                    })),
                )
            }
            None if f.ignore => (quote!(::quarry::Value::Null), quote!(None)),
            None => {
                let ty = &f.ty;
                (
                    quote!(<#ty as ::quarry::AsValue>::as_empty_value()),
                    quote!(None),
                )
            }
        };
        quote! {
            ::quarry::FieldDef {
                column: #column,
                length: #length,
                nullable: #nullable,
                primary_key: #primary_key,
                generated: #generated,
                sequence: #sequence,
                relation: #relation,
                ignore: #ignore,
                ..::quarry::FieldDef::new(#field, #value)
            }
        }
    });
    quote! {
        impl ::quarry::Record for #name {
            fn record_def() -> &'static ::quarry::RecordDef {
                static RESULT: ::std::sync::LazyLock<::quarry::RecordDef> =
                    ::std::sync::LazyLock::new(|| ::quarry::RecordDef {
                        type_id: ::std::any::TypeId::of::<#name>,
                        type_name: #type_name,
                        schema: #schema,
                        table: #table,
                        escape_reserved: #escape_reserved,
                        fields: vec![#(#fields),*],
                    });
                &RESULT
            }
        }
    }
}
