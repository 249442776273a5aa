use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, quote};
use syn::spanned::Spanned;
use syn::{Attribute, LitStr};

use crate::error::try_syn;
use crate::shared::Annotation;

pub fn wrap_anon_item(tts: impl ToTokens) -> TokenStream {
    quote! {
        const _: () = {
            use ::argtag::__private as __rt;
            #tts
        };
    }
}

trait OptionExt<T> {
    fn set_once(&mut self, span: Span, v: T);
}
impl<T> OptionExt<T> for Option<T> {
    fn set_once(&mut self, span: Span, v: T) {
        if self.is_none() {
            *self = Some(v);
        } else {
            emit_error!(span, "duplicated attribute");
        }
    }
}

/// Raw annotations of a field. Contents are kept verbatim and only
/// interpreted at runtime.
#[derive(Default)]
pub struct FieldAttrs {
    pub primary: Option<LitStr>,
    pub help: Option<LitStr>,
    pub default: Option<LitStr>,
    pub doc: Doc,
}

impl FieldAttrs {
    pub fn parse_attrs(attrs: &[Attribute]) -> Self {
        let mut this = Self::default();
        for attr in attrs {
            this.doc.extend_from_attr(attr);
            let Some(key) = Annotation::ALL.into_iter().find(|a| attr.path().is_ident(a.name()))
            else {
                continue;
            };
            let Some(lit) = try_syn(parse_lit_str(attr)) else { continue };
            let slot = match key {
                Annotation::Primary => &mut this.primary,
                Annotation::Help => &mut this.help,
                Annotation::Default => &mut this.default,
            };
            slot.set_once(attr.path().span(), lit);
        }
        this.doc.post_process();
        this
    }
}

/// Accept both `#[key("...")]` and `#[key = "..."]`.
fn parse_lit_str(attr: &Attribute) -> syn::Result<LitStr> {
    match &attr.meta {
        syn::Meta::List(_) => attr.parse_args::<LitStr>(),
        syn::Meta::NameValue(m) => match &m.value {
            syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) => Ok(s.clone()),
            v => Err(syn::Error::new(v.span(), "expecting a string literal")),
        },
        syn::Meta::Path(p) => Err(syn::Error::new(
            p.span(),
            format!(r#"expecting `{0}("...")` or `{0} = "..."`"#, attr.path().to_token_stream()),
        )),
    }
}

/// Wrap an optional literal into `Some("..")` or `None`.
pub fn opt_lit(v: Option<&LitStr>) -> TokenStream {
    match v {
        Some(lit) => quote! { __rt::Some(#lit) },
        None => quote! { __rt::None },
    }
}

/// Collect doc-comments into a single string.
///
/// Paragraph (consecutive doc-comments without blank lines) are joined with space. In the result,
/// the first line is the summary, and each of rest lines corresponds to a paragraph.
#[derive(Default, PartialEq)]
pub struct Doc(pub String);

impl Doc {
    fn post_process(&mut self) {
        let len = self.0.trim_ascii_end().len();
        self.0.truncate(len);
    }

    fn extend_from_attr(&mut self, attr: &Attribute) {
        if !attr.path().is_ident("doc") {
            return;
        }
        let syn::Meta::NameValue(m) = &attr.meta else { return };
        if let syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(s), .. }) = &m.value {
            let s = s.value();
            let s = s.trim_ascii();
            if s.is_empty() {
                if !self.0.ends_with('\n') {
                    self.0.push('\n');
                }
            } else {
                if !self.0.is_empty() && !self.0.ends_with('\n') {
                    self.0.push(' ');
                }
                self.0.push_str(s);
            }
        } else {
            emit_error!(m.value, "only literal doc comment is supported yet");
        }
    }
}

impl ToTokens for Doc {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.0.to_tokens(tokens);
    }
}
