mod decode_field;
mod decode_record;
mod encode_fields;
mod encode_record_def;

use decode_record::{RecordMetadata, decode_record};
use encode_fields::encode_fields;
use encode_record_def::encode_record_def;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `Fields` and `Record`.
///
/// ```ignore
/// #[derive(Default, Record)]
/// #[quarry(name = "orders", schema = "sales")]
/// struct Order {
///     #[quarry(primary_key, generated)]
///     id: Option<i64>,
///     #[quarry(name = "order_status", length = 20)]
///     status: String,
///     #[quarry(relation = "customer_id")]
///     customer: Option<Box<Customer>>,
///     #[quarry(ignore)]
///     cached_total: f64,
/// }
/// ```
#[proc_macro_derive(Record, attributes(quarry))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let record = decode_record(parse_macro_input!(input as ItemStruct));
    let fields = encode_fields(&record);
    let record_def = encode_record_def(&record);
    quote! {
        #fields
        #record_def
    }
    .into()
}
