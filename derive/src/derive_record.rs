use heck::AsShoutySnakeCase;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, FieldsNamed};

use crate::common::{FieldAttrs, opt_lit, wrap_anon_item};
use crate::error::{Result, catch_errors};

pub fn expand(input: &DeriveInput) -> TokenStream {
    assert_no_generics!(input);

    match catch_errors(|| match &input.data {
        Data::Struct(syn::DataStruct { fields: syn::Fields::Named(fields), .. }) => {
            expand_for_named_struct(&input.ident, fields)
        }
        Data::Struct(_) => abort!(input.ident, "only structs with named fields can be records"),
        _ => abort!(Span::call_site(), "only structs can be records"),
    }) {
        Ok(tts) => wrap_anon_item(tts),
        Err(mut tts) => {
            tts.extend(wrap_anon_item(fallback(&input.ident)));
            tts
        }
    }
}

// Keep the type usable so that errors elsewhere do not cascade.
fn fallback(ident: &Ident) -> TokenStream {
    let name = ident.unraw().to_string();
    quote! {
        #[automatically_derived]
        impl __rt::Field for #ident {
            fn shape() -> __rt::Shape {
                __rt::unreachable!()
            }
            fn from_value(_: __rt::Value) -> __rt::Result<Self, __rt::ValueError> {
                __rt::unreachable!()
            }
        }

        #[automatically_derived]
        impl __rt::Record for #ident {
            const NAME: &'static __rt::str = #name;
            const FIELDS: &'static [__rt::FieldMeta] = &[];
            fn from_values(_: __rt::Vec<__rt::Value>) -> __rt::Result<Self, __rt::ValueError> {
                __rt::unreachable!()
            }
        }
    }
}

fn expand_for_named_struct(ident: &Ident, fields: &FieldsNamed) -> Result<TokenStream> {
    let name = ident.unraw().to_string();

    let mut metas = Vec::with_capacity(fields.named.len());
    let mut inits = Vec::with_capacity(fields.named.len());
    for field in &fields.named {
        let Some(field_ident) = &field.ident else { continue };
        let ty = &field.ty;
        let attrs = FieldAttrs::parse_attrs(&field.attrs);

        let field_name = field_ident.unraw().to_string();
        let value_name = AsShoutySnakeCase(&field_name).to_string();
        let primary = opt_lit(attrs.primary.as_ref());
        let help = opt_lit(attrs.help.as_ref());
        let default = opt_lit(attrs.default.as_ref());
        let doc = &attrs.doc;
        metas.push(quote! {
            __rt::FieldMeta {
                name: #field_name,
                value_name: #value_name,
                primary: #primary,
                help: #help,
                default: #default,
                doc: #doc,
                shape: <#ty as __rt::Field>::shape,
            }
        });
        inits.push(quote! { #field_ident: __rt::take_field(&mut _values)? });
    }

    Ok(quote! {
        #[automatically_derived]
        impl __rt::Field for #ident {
            fn shape() -> __rt::Shape {
                __rt::record_shape::<Self>()
            }

            fn from_value(value: __rt::Value) -> __rt::Result<Self, __rt::ValueError> {
                __rt::record_from_value::<Self>(value)
            }
        }

        #[automatically_derived]
        impl __rt::Record for #ident {
            const NAME: &'static __rt::str = #name;
            const FIELDS: &'static [__rt::FieldMeta] = &[#(#metas),*];

            fn from_values(
                values: __rt::Vec<__rt::Value>,
            ) -> __rt::Result<Self, __rt::ValueError> {
                #[allow(unused_mut)]
                let mut _values = values.into_iter();
                __rt::Ok(Self { #(#inits),* })
            }
        }
    })
}
