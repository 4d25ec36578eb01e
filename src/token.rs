//! Service token types for the dependency-resolution runtime.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique symbolic identifier.
///
/// Symbols are identity-compared: two symbols are equal only if they came from
/// the same `Symbol::new` call, regardless of label. The label is carried for
/// diagnostics only.
///
/// # Examples
///
/// ```rust
/// use tangle_di::Symbol;
///
/// let a = Symbol::new("database");
/// let b = Symbol::new("database");
/// assert_ne!(a, b); // same label, distinct identities
/// assert_eq!(a, a);
/// assert_eq!(a.label(), "database");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    id: u64,
    label: &'static str,
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

impl Symbol {
    /// Allocates a fresh symbol with the given diagnostic label.
    pub fn new(label: &'static str) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            label,
        }
    }

    /// The diagnostic label this symbol was created with.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}({})", self.label, self.id)
    }
}

/// Opaque identifier for a requested capability.
///
/// A token is one of three shapes, all compared by identity rather than
/// structure:
///
/// - **Type**: a constructible type used as its own identifier
///   (`Token::of::<T>()`). Equality is `TypeId` equality; the type name rides
///   along for diagnostics.
/// - **Name**: a plain string token.
/// - **Symbol**: a unique symbolic value, for capabilities that must never
///   collide with anything else.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{Token, Symbol};
///
/// struct Database;
///
/// let by_type = Token::of::<Database>();
/// let by_name = Token::name("connection-string");
/// let by_symbol = Token::symbol(Symbol::new("request-id"));
///
/// assert_eq!(by_type, Token::of::<Database>());
/// assert_eq!(by_name, Token::name("connection-string"));
/// assert_ne!(by_symbol, Token::symbol(Symbol::new("request-id")));
/// ```
#[derive(Debug, Clone)]
pub enum Token {
    /// A concrete type used as its own identifier.
    Type(TypeId, &'static str),
    /// A plain string token.
    Name(&'static str),
    /// A unique symbolic token.
    Symbol(Symbol),
}

impl Token {
    /// Token for a concrete type, usable as its own default implementation.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Token for a plain string identifier.
    #[inline]
    pub fn name(name: &'static str) -> Self {
        Token::Name(name)
    }

    /// Token for a unique symbol.
    #[inline]
    pub fn symbol(symbol: Symbol) -> Self {
        Token::Symbol(symbol)
    }

    /// Human-readable name for error messages and rendered trees.
    pub fn display_name(&self) -> String {
        match self {
            Token::Type(_, name) => (*name).to_string(),
            Token::Name(name) => format!("\"{}\"", name),
            Token::Symbol(sym) => sym.to_string(),
        }
    }
}

// Identity comparison only: TypeId for types, string content for names,
// interned id for symbols. The type-name string is ignored.
impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type(a, _), Token::Type(b, _)) => a == b,
            (Token::Name(a), Token::Name(b)) => a == b,
            (Token::Symbol(a), Token::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl std::hash::Hash for Token {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Token::Symbol(sym) => {
                2u8.hash(state);
                sym.hash(state);
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Secondary key for keyed service registrations.
///
/// Orthogonal to the token: several descriptors registered under the same
/// token can each carry a distinct `ServiceKey` and be looked up individually
/// via `get_keyed`, without affecting ordinary last-wins resolution.
///
/// # Examples
///
/// ```rust
/// use tangle_di::ServiceKey;
///
/// let primary = ServiceKey::name("primary");
/// assert_eq!(primary, ServiceKey::name("primary"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    /// String-named key.
    Name(&'static str),
    /// Unique symbolic key.
    Symbol(Symbol),
}

impl ServiceKey {
    /// String-named key.
    #[inline]
    pub fn name(name: &'static str) -> Self {
        ServiceKey::Name(name)
    }

    /// Unique symbolic key.
    #[inline]
    pub fn symbol(symbol: Symbol) -> Self {
        ServiceKey::Symbol(symbol)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Name(name) => write!(f, "\"{}\"", name),
            ServiceKey::Symbol(sym) => write!(f, "{}", sym),
        }
    }
}

/// Helper for creating type tokens.
#[inline]
pub fn token_of<T: 'static>() -> Token {
    Token::of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tokens_compare_by_type_id() {
        struct A;
        struct B;
        assert_eq!(Token::of::<A>(), Token::of::<A>());
        assert_ne!(Token::of::<A>(), Token::of::<B>());
    }

    #[test]
    fn name_tokens_compare_by_content() {
        assert_eq!(Token::name("db"), Token::name("db"));
        assert_ne!(Token::name("db"), Token::name("cache"));
    }

    #[test]
    fn symbol_tokens_are_unique() {
        let s = Symbol::new("s");
        assert_eq!(Token::symbol(s), Token::symbol(s));
        assert_ne!(Token::symbol(s), Token::symbol(Symbol::new("s")));
    }

    #[test]
    fn variants_never_compare_equal() {
        struct A;
        assert_ne!(Token::of::<A>(), Token::name("A"));
        assert_ne!(Token::name("s"), Token::symbol(Symbol::new("s")));
    }
}
