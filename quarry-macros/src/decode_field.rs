use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Expr, ExprLit, Field, GenericArgument, Ident, Lit, LitBool, LitInt, LitStr, PathArguments,
    Type, ext::IdentExt, parse::ParseBuffer,
};

/// How a relation field stores the linked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Holder {
    Plain,
    Boxed,
    Optional,
    OptionalBoxed,
}

pub(crate) struct RelationMetadata {
    pub(crate) linked: Type,
    pub(crate) holder: Holder,
    pub(crate) local_columns: Vec<String>,
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) length: Option<u32>,
    pub(crate) nullable: Option<bool>,
    pub(crate) primary_key: bool,
    pub(crate) generated: bool,
    pub(crate) sequence: Option<String>,
    pub(crate) relation: Option<RelationMetadata>,
    pub(crate) ignore: bool,
}

/// Generic argument of `Wrapper<T>` when the last path segment is `wrapper`.
fn unwrap_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(v) => Some(v),
        _ => None,
    }
}

fn decode_holder(ty: &Type) -> (Type, Holder) {
    if let Some(inner) = unwrap_generic(ty, "Option") {
        if let Some(inner) = unwrap_generic(inner, "Box") {
            return (inner.clone(), Holder::OptionalBoxed);
        }
        return (inner.clone(), Holder::Optional);
    }
    if let Some(inner) = unwrap_generic(ty, "Box") {
        return (inner.clone(), Holder::Boxed);
    }
    (ty.clone(), Holder::Plain)
}

fn decode_columns(expr: Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(v), ..
        }) => Some(vec![v.value()]),
        Expr::Tuple(tuple) => tuple
            .elems
            .into_iter()
            .map(|v| match v {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(v), ..
                }) => Some(v.value()),
                _ => None,
            })
            .collect(),
        Expr::Paren(v) => decode_columns(*v.expr),
        _ => None,
    }
}

pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Record fields must be named, tuple structs are not supported");
    let mut metadata = FieldMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        column: None,
        length: None,
        nullable: None,
        primary_key: false,
        generated: false,
        sequence: None,
        relation: None,
        ignore: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("quarry") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `quarry`, use it like: `#[quarry(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") || arg.path.is_ident("column") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[quarry(name = \"my_column\")]`");
                };
                metadata.column = Some(v.value());
            } else if arg.path.is_ident("length") {
                let Ok(v) = arg
                    .value()
                    .and_then(ParseBuffer::parse::<LitInt>)
                    .and_then(|v| v.base10_parse::<u32>())
                else {
                    panic!("Error while parsing `length`, use it like: `#[quarry(length = 40)]`");
                };
                metadata.length = Some(v);
            } else if arg.path.is_ident("nullable") {
                metadata.nullable = Some(match arg.value() {
                    // value() is Err for Meta::Path
                    Err(..) => true,
                    Ok(v) => {
                        let Ok(v) = v.parse::<LitBool>() else {
                            panic!("Error while parsing `nullable`, use it like: `#[quarry(nullable = false)]`");
                        };
                        v.value
                    }
                });
            } else if arg.path.is_ident("primary_key") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `primary_key`, use it like: `#[quarry(primary_key)]`");
                };
                metadata.primary_key = true;
            } else if arg.path.is_ident("generated") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `generated`, use it like: `#[quarry(generated)]`");
                };
                metadata.generated = true;
            } else if arg.path.is_ident("sequence") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `sequence`, use it like: `#[quarry(sequence = \"schema.my_seq\")]`");
                };
                metadata.sequence = Some(v.value());
                metadata.generated = true;
            } else if arg.path.is_ident("relation") {
                let Some(local_columns) = arg
                    .value()
                    .and_then(ParseBuffer::parse::<Expr>)
                    .ok()
                    .and_then(decode_columns)
                    .filter(|v| !v.is_empty())
                else {
                    panic!("Error while parsing `relation`, use it like: `#[quarry(relation = \"customer_id\")]` or `#[quarry(relation = (\"k1\", \"k2\", ..))]`");
                };
                let (linked, holder) = decode_holder(&field.ty);
                metadata.relation = Some(RelationMetadata {
                    linked,
                    holder,
                    local_columns,
                });
            } else if arg.path.is_ident("ignore") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `ignore`, use it like: `#[quarry(ignore)]`");
                };
                metadata.ignore = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside quarry macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    if metadata.relation.is_some() && (metadata.primary_key || metadata.generated) {
        panic!(
            "Field `{}` is a relation, declare `primary_key` and `generated` on its local columns instead",
            metadata.name
        );
    }
    metadata
}

/// `Option<&'static str>` literal.
pub(crate) fn optional_str(value: &Option<String>) -> TokenStream {
    match value {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    }
}
