use std::ffi::{OsStr, OsString};
use std::fmt;

use os_str_bytes::OsStrBytesExt;
use ref_cast::RefCast;

use crate::ValueError;

/// A raw input token.
#[derive(Debug, RefCast)]
#[repr(transparent)]
pub(crate) struct Token(OsStr);

impl Token {
    /// Does this token look like an option or flag name, ie. start with `-`?
    pub(crate) fn is_flag_shaped(&self) -> bool {
        self.0.starts_with('-')
    }

    pub(crate) fn as_os_str(&self) -> &OsStr {
        &self.0
    }

    pub(crate) fn to_str(&self) -> Result<&str, ValueError> {
        self.0.to_str().ok_or_else(|| ValueError::InvalidUtf8(self.0.to_owned()))
    }
}

/// Handle of a token in a [`TokenStream`]. Stays valid when other tokens are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenId(usize);

/// An order-preserving sequence of tokens that supports O(1) removal of any
/// token while it is being scanned.
///
/// Tokens live in an arena and are chained by `prev`/`next` indices. Removal
/// unlinks a slot and never moves other tokens.
pub(crate) struct TokenStream {
    tokens: Vec<OsString>,
    links: Vec<Link>,
    head: Option<usize>,
    len: usize,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

impl TokenStream {
    pub(crate) fn new(tokens: Vec<OsString>) -> Self {
        let len = tokens.len();
        let links = (0..len)
            .map(|i| Link { prev: i.checked_sub(1), next: Some(i + 1).filter(|&n| n < len) })
            .collect();
        Self { tokens, links, head: (len > 0).then_some(0), len }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn head(&self) -> Option<TokenId> {
        self.head.map(TokenId)
    }

    pub(crate) fn next(&self, id: TokenId) -> Option<TokenId> {
        self.links[id.0].next.map(TokenId)
    }

    pub(crate) fn prev(&self, id: TokenId) -> Option<TokenId> {
        self.links[id.0].prev.map(TokenId)
    }

    pub(crate) fn get(&self, id: TokenId) -> &Token {
        Token::ref_cast(&self.tokens[id.0])
    }

    /// Unlink `id` and reconnect its neighbors. `id` must not be used afterwards.
    pub(crate) fn remove(&mut self, id: TokenId) -> OsString {
        let Link { prev, next } = self.links[id.0];
        match prev {
            Some(p) => self.links[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.links[n].prev = prev;
        }
        self.links[id.0] = Link { prev: None, next: None };
        self.len -= 1;
        std::mem::take(&mut self.tokens[id.0])
    }

    /// Iterate over the remaining tokens in order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Token> + '_ {
        std::iter::successors(self.head(), |&id| self.next(id)).map(|id| self.get(id))
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tok) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", tok.as_os_str().to_string_lossy())?;
        }
        Ok(())
    }
}

impl fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(Token::as_os_str)).finish()
    }
}
