use crate::{
    RecordMetadata,
    decode_field::{FieldMetadata, Holder},
};
use proc_macro2::TokenStream;
use quote::quote;

fn linked_access(field: &FieldMetadata, holder: Holder) -> (TokenStream, TokenStream) {
    let ident = &field.ident;
    match holder {
        Holder::Plain => (
            quote!(Some(&self.#ident as &dyn ::quarry::Fields)),
            quote!(Some(&mut self.#ident as &mut dyn ::quarry::Fields)),
        ),
        Holder::Boxed => (
            quote!(Some(&*self.#ident as &dyn ::quarry::Fields)),
            quote!(Some(&mut *self.#ident as &mut dyn ::quarry::Fields)),
        ),
        Holder::Optional => (
            quote!(self.#ident.as_ref().map(|v| v as &dyn ::quarry::Fields)),
            quote!(Some(
                self.#ident.get_or_insert_with(::std::default::Default::default)
                    as &mut dyn ::quarry::Fields
            )),
        ),
        Holder::OptionalBoxed => (
            quote!(self.#ident.as_deref().map(|v| v as &dyn ::quarry::Fields)),
            quote!(Some(
                &mut **self.#ident.get_or_insert_with(::std::default::Default::default)
                    as &mut dyn ::quarry::Fields
            )),
        ),
    }
}

pub(crate) fn encode_fields(record: &RecordMetadata) -> TokenStream {
    let name = &record.item.ident;
    let type_name = &record.type_name;
    let scalars = record
        .fields
        .iter()
        .filter(|f| !f.ignore && f.relation.is_none())
        .collect::<Vec<_>>();
    let get = scalars.iter().map(|f| {
        let ident = &f.ident;
        let field = &f.name;
        quote! {
            #field => Some(::quarry::AsValue::as_value(::std::clone::Clone::clone(&self.#ident))),
        }
    });
    let set = scalars.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let field = &f.name;
        quote! {
            #field => {
                self.#ident = <#ty as ::quarry::AsValue>::try_from_value(value)?;
                Ok(())
            }
        }
    });
    let (linked, linked_mut): (Vec<_>, Vec<_>) = record
        .fields
        .iter()
        .filter(|f| !f.ignore)
        .filter_map(|f| {
            let relation = f.relation.as_ref()?;
            let field = &f.name;
            let (get, get_mut) = linked_access(f, relation.holder);
            Some((quote!(#field => #get,), quote!(#field => #get_mut,)))
        })
        .unzip();
    quote! {
        impl ::quarry::Fields for #name {
            fn get_field(&self, name: &str) -> Option<::quarry::Value> {
                match name {
                    #(#get)*
                    _ => None,
                }
            }

            fn set_field(&mut self, name: &str, value: ::quarry::Value) -> ::quarry::Result<()> {
                match name {
                    #(#set)*
                    _ => Err(::quarry::QuarryError::validation(format!(
                        "Record {} has no scalar field `{}`",
                        #type_name, name
                    ))),
                }
            }

            fn linked(&self, name: &str) -> Option<&dyn ::quarry::Fields> {
                match name {
                    #(#linked)*
                    _ => None,
                }
            }

            fn linked_mut(&mut self, name: &str) -> Option<&mut dyn ::quarry::Fields> {
                match name {
                    #(#linked_mut)*
                    _ => None,
                }
            }
        }
    }
}
