//! Error accumulation for the derive macro, in the manner of proc-macro-error.
//!
//! Ref: <https://crates.io/crates/proc-macro-error>
use std::cell::Cell;

use proc_macro2::{Span, TokenStream};
use quote::quote_spanned;

thread_local! {
    static ERROR_TTS: Cell<Option<TokenStream>> = const { Cell::new(None) };
}

// For unrecoverable errors.
pub type Result<T, E = ()> = std::result::Result<T, E>;

macro_rules! emit_error {
    ($src:expr, $($tt:tt)+) => {
        crate::error::emit_error(syn::spanned::Spanned::span(&$src), &format!($($tt)+))
    };
}

macro_rules! abort {
    ($src:expr, $($tt:tt)+) => {{
        emit_error!($src, $($tt)+);
        return Err(());
    }};
}

fn push(tts: TokenStream) {
    let mut all = ERROR_TTS.take().unwrap_or_default();
    all.extend(tts);
    ERROR_TTS.set(Some(all));
}

/// Record a syn error and continue with `None`.
pub fn try_syn<T>(ret: syn::Result<T>) -> Option<T> {
    ret.map_err(|err| push(err.to_compile_error())).ok()
}

pub fn emit_error(span: Span, msg: &str) {
    push(quote_spanned! {span=> ::std::compile_error! { #msg } });
}

/// Run `f`, returning all errors emitted during it as `compile_error!`s.
pub fn catch_errors<T>(f: impl FnOnce() -> Result<T>) -> Result<T, TokenStream> {
    struct Guard(Option<TokenStream>);
    impl Drop for Guard {
        fn drop(&mut self) {
            ERROR_TTS.set(self.0.take());
        }
    }

    let _guard = Guard(ERROR_TTS.replace(None));
    let ret = f();
    match (ret, ERROR_TTS.take()) {
        (Ok(v), None) => Ok(v),
        (_, Some(err)) if !err.is_empty() => Err(err),
        (_, _) => unreachable!("aborted without an error"),
    }
}

// Hard error without fallback. `Field` requires `'static` and cannot be
// implemented even in fallback impl.
macro_rules! assert_no_generics {
    ($input:expr) => {
        if let Err(err) = crate::error::check_no_generics(&$input.generics) {
            return err;
        }
    };
}

pub fn check_no_generics(generics: &syn::Generics) -> Result<(), TokenStream> {
    if generics.params.is_empty()
        && generics.where_clause.as_ref().is_none_or(|w| w.predicates.is_empty())
    {
        Ok(())
    } else {
        Err(syn::Error::new(Span::call_site(), "records cannot be generic").into_compile_error())
    }
}
