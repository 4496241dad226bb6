//! SQL identifiers that are safe to interpolate into statement text.
//!
//! Values always travel as bound parameters; identifiers cannot, so every
//! identifier jobly writes into SQL goes through [`Ident`]:
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow anything except NUL and render `"` as `""`
//! - Parts may be dotted (`public.users`)
//!
//! The entity layer never builds identifiers from strings at all: it uses the
//! closed [`Table`] set.

use crate::error::{JoblyError, JoblyResult};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
}

impl IdentPart {
    /// The name with quoting removed.
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A validated SQL identifier (table or column name, optionally schema-qualified).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string.
    ///
    /// Accepts `users`, `public.users`, `"CamelCase"` and mixes such as
    /// `public."UserTable"`.
    pub fn parse(s: &str) -> JoblyResult<Self> {
        if s.is_empty() {
            return Err(invalid("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(invalid("identifier cannot contain NUL character"));
        }

        let mut chars = s.chars().peekable();
        let mut parts = vec![parse_part(&mut chars)?];
        while let Some(c) = chars.next() {
            if c != '.' {
                return Err(invalid(format!(
                    "expected '.' between identifier parts, got '{c}'"
                )));
            }
            if chars.peek().is_none() {
                return Err(invalid("trailing '.' in identifier"));
            }
            parts.push(parse_part(&mut chars)?);
        }

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn invalid(message: impl Into<String>) -> JoblyError {
    JoblyError::InvalidArgument(message.into())
}

fn parse_part(chars: &mut Peekable<Chars<'_>>) -> JoblyResult<IdentPart> {
    if chars.peek() == Some(&'"') {
        chars.next();
        return parse_quoted(chars);
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' {
            break;
        }
        let ok = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !ok {
            return Err(invalid(format!("invalid character in identifier: '{c}'")));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(invalid("empty identifier segment"));
    }
    Ok(IdentPart::Unquoted(name))
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> JoblyResult<IdentPart> {
    let mut name = String::new();
    loop {
        match chars.next() {
            // `""` inside a quoted part is an escaped quote.
            Some('"') if chars.peek() == Some(&'"') => {
                chars.next();
                name.push('"');
            }
            Some('"') => break,
            Some(c) => name.push(c),
            None => return Err(invalid("unclosed quoted identifier")),
        }
    }
    if name.is_empty() {
        return Err(invalid("empty quoted identifier"));
    }
    Ok(IdentPart::Quoted(name))
}

/// The relations jobly owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Companies,
    Jobs,
    Users,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Table::Companies => "companies",
            Table::Jobs => "jobs",
            Table::Users => "users",
        }
    }

    /// The natural key column used to address a single row.
    pub const fn key_column(self) -> &'static str {
        match self {
            Table::Companies => "handle",
            Table::Jobs => "id",
            Table::Users => "username",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert an input into an [`Ident`].
pub trait IntoIdent {
    fn into_ident(self) -> JoblyResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> JoblyResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> JoblyResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for Table {
    fn into_ident(self) -> JoblyResult<Ident> {
        Ok(Ident {
            parts: vec![IdentPart::Unquoted(self.as_str().to_string())],
        })
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> JoblyResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> JoblyResult<Ident> {
        Ident::parse(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_and_dotted() {
        assert_eq!(Ident::parse("users").unwrap().to_sql(), "users");
        assert_eq!(Ident::parse("public.users").unwrap().to_sql(), "public.users");
        assert_eq!(Ident::parse("my_var$1").unwrap().to_sql(), "my_var$1");
    }

    #[test]
    fn quoted_round_trips_escapes() {
        let ident = Ident::parse(r#"public."has""quote""#).unwrap();
        assert_eq!(ident.to_sql(), r#"public."has""quote""#);
        assert_eq!(
            ident.parts()[1],
            IdentPart::Quoted(r#"has"quote"#.to_string())
        );
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "",
            "1table",
            "my table",
            "schema..table",
            "schema.",
            ".users",
            r#""unclosed"#,
            r#""""#,
            "name=$1; DROP TABLE users",
            "a\0b",
        ] {
            let err = Ident::parse(bad).unwrap_err();
            assert!(err.is_invalid_argument(), "{bad:?} -> {err}");
        }
    }

    #[test]
    fn table_renders_relation_name() {
        assert_eq!(Table::Companies.into_ident().unwrap().to_sql(), "companies");
        assert_eq!(Table::Jobs.to_string(), "jobs");
        assert_eq!(Table::Users.key_column(), "username");
    }
}
