#![forbid(unsafe_code)]
use proc_macro::TokenStream;
use syn::DeriveInput;

#[macro_use]
mod error;

mod common;
mod derive_record;

#[allow(unused, reason = "some functions are only used at runtime")]
#[path = "../../src/shared.rs"]
mod shared;

#[proc_macro_derive(Record, attributes(argtag, argtag_help, argtag_default))]
pub fn derive_record(tts: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(tts as DeriveInput);
    derive_record::expand(&input).into()
}
