//! Access-control list parsing.
//!
//! The catalog stores privileges as `aclitem` text such as
//! `alice=arwdDxt*/owner`: grantee, privilege letters (a trailing `*` marks
//! the grant option) and grantor. An empty grantee means PUBLIC.

use serde::Serialize;

use crate::error::{DumpError, Result};

/// A single privilege letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    References,
    Trigger,
    Execute,
    Usage,
    Create,
    Connect,
    Temporary,
}

impl Privilege {
    pub fn from_char(c: char) -> Option<Self> {
        let p = match c {
            'r' => Privilege::Select,
            'a' => Privilege::Insert,
            'w' => Privilege::Update,
            'd' => Privilege::Delete,
            'D' => Privilege::Truncate,
            'x' => Privilege::References,
            't' => Privilege::Trigger,
            'X' => Privilege::Execute,
            'U' => Privilege::Usage,
            'C' => Privilege::Create,
            'c' => Privilege::Connect,
            'T' => Privilege::Temporary,
            _ => return None,
        };
        Some(p)
    }

    /// SQL keyword for GRANT statements.
    pub fn keyword(&self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::Truncate => "TRUNCATE",
            Privilege::References => "REFERENCES",
            Privilege::Trigger => "TRIGGER",
            Privilege::Execute => "EXECUTE",
            Privilege::Usage => "USAGE",
            Privilege::Create => "CREATE",
            Privilege::Connect => "CONNECT",
            Privilege::Temporary => "TEMPORARY",
        }
    }

    /// Every privilege that applies to an object type, used to collapse a
    /// full set into `ALL`.
    pub fn all_for(object_type: &str) -> &'static [Privilege] {
        match object_type {
            "SEQUENCE" => &[Privilege::Select, Privilege::Update, Privilege::Usage],
            "PROTOCOL" => &[Privilege::Select, Privilege::Insert],
            _ => &[
                Privilege::Select,
                Privilege::Insert,
                Privilege::Update,
                Privilege::Delete,
                Privilege::Truncate,
                Privilege::References,
                Privilege::Trigger,
            ],
        }
    }
}

/// One parsed `aclitem`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Acl {
    /// Quoted role name; empty for PUBLIC.
    pub grantee: String,
    /// Privileges granted without grant option, in canonical order.
    pub privileges: Vec<Privilege>,
    /// Privileges granted with grant option, in canonical order.
    pub grantable: Vec<Privilege>,
}

impl Acl {
    pub fn is_public(&self) -> bool {
        self.grantee.is_empty()
    }

    /// Role name as it appears in GRANT statements.
    pub fn grantee_sql(&self) -> &str {
        if self.is_public() {
            "PUBLIC"
        } else {
            &self.grantee
        }
    }
}

/// Parse one `aclitem` string.
pub fn parse_acl(item: &str) -> Result<Acl> {
    let (grantee, rest) = split_grantee(item)
        .ok_or_else(|| DumpError::decode("privileges", format!("malformed aclitem '{}'", item)))?;
    let privs = rest.split('/').next().unwrap_or_default();

    let mut acl = Acl {
        grantee,
        ..Default::default()
    };
    let mut chars = privs.chars().peekable();
    while let Some(c) = chars.next() {
        let privilege = Privilege::from_char(c).ok_or_else(|| {
            DumpError::decode("privileges", format!("unknown privilege '{}' in '{}'", c, item))
        })?;
        if chars.peek() == Some(&'*') {
            chars.next();
            acl.grantable.push(privilege);
        } else {
            acl.privileges.push(privilege);
        }
    }
    acl.privileges.sort();
    acl.grantable.sort();
    Ok(acl)
}

/// Parse the comma-separated `array_to_string(acl, ',')` form.
pub fn parse_acl_list(list: &str) -> Result<Vec<Acl>> {
    split_acl_list(list)
        .into_iter()
        .filter(|item| !item.is_empty())
        .map(parse_acl)
        .collect()
}

/// Split off the grantee, honouring double-quoted role names.
fn split_grantee(item: &str) -> Option<(String, &str)> {
    if let Some(quoted) = item.strip_prefix('"') {
        let mut end = None;
        let bytes = quoted.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                end = Some(i);
                break;
            }
            i += 1;
        }
        let end = end?;
        let rest = quoted[end + 1..].strip_prefix('=')?;
        Some((format!("\"{}\"", &quoted[..end]), rest))
    } else {
        let (grantee, rest) = item.split_once('=')?;
        Some((grantee.to_string(), rest))
    }
}

/// Split on commas outside double quotes.
fn split_acl_list(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_acl_with_grant_option() {
        let acl = parse_acl("alice=arw*/gpadmin").unwrap();
        assert_eq!(acl.grantee, "alice");
        assert_eq!(acl.privileges, vec![Privilege::Select, Privilege::Insert]);
        assert_eq!(acl.grantable, vec![Privilege::Update]);
    }

    #[test]
    fn test_empty_grantee_is_public() {
        let acl = parse_acl("=r/gpadmin").unwrap();
        assert!(acl.is_public());
        assert_eq!(acl.grantee_sql(), "PUBLIC");
    }

    #[test]
    fn test_quoted_grantee() {
        let acl = parse_acl("\"Data, \"\"Team\"\"\"=U/gpadmin").unwrap();
        assert_eq!(acl.grantee, "\"Data, \"\"Team\"\"\"");
        assert_eq!(acl.privileges, vec![Privilege::Usage]);
    }

    #[test]
    fn test_parse_acl_list() {
        let acls = parse_acl_list("gpadmin=arwdDxt/gpadmin,\"A,B\"=r/gpadmin").unwrap();
        assert_eq!(acls.len(), 2);
        assert_eq!(acls[0].privileges.len(), 7);
        assert_eq!(acls[1].grantee, "\"A,B\"");
        assert!(parse_acl_list("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_acl() {
        assert!(parse_acl("noequals").is_err());
        assert!(parse_acl("bob=q/gpadmin").is_err());
    }
}
