//! Comment, owner and privilege statements that follow an object.

use crate::catalog::metadata::ObjectMetadata;
use crate::classify::acl::{Acl, Privilege};
use crate::ident::quote_literal;

/// Kind of object metadata is rendered for; decides the keywords used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    ExternalTable,
    ForeignTable,
    View,
    MaterializedView,
    Sequence,
    Index,
    Rule,
    Trigger,
    EventTrigger,
    Protocol,
}

impl ObjectKind {
    /// Keyword after `COMMENT ON`, also the TOC object type.
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Table | ObjectKind::ExternalTable => "TABLE",
            ObjectKind::ForeignTable => "FOREIGN TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED VIEW",
            ObjectKind::Sequence => "SEQUENCE",
            ObjectKind::Index => "INDEX",
            ObjectKind::Rule => "RULE",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::EventTrigger => "EVENT TRIGGER",
            ObjectKind::Protocol => "PROTOCOL",
        }
    }

    /// Keyword after `ALTER` for ownership changes. None when the object
    /// has no owner of its own.
    pub fn owner_keyword(&self) -> Option<&'static str> {
        match self {
            ObjectKind::ExternalTable => Some("EXTERNAL TABLE"),
            ObjectKind::Index | ObjectKind::Rule | ObjectKind::Trigger => None,
            other => Some(other.keyword()),
        }
    }

    /// Keyword after `GRANT ... ON`. None when the object takes no grants.
    pub fn privilege_keyword(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Table
            | ObjectKind::ExternalTable
            | ObjectKind::ForeignTable
            | ObjectKind::View
            | ObjectKind::MaterializedView => Some("TABLE"),
            ObjectKind::Sequence => Some("SEQUENCE"),
            ObjectKind::Protocol => Some("PROTOCOL"),
            ObjectKind::Index | ObjectKind::Rule | ObjectKind::Trigger | ObjectKind::EventTrigger => {
                None
            }
        }
    }
}

/// Render the statements for one object's metadata, each preceded by a
/// blank line. `name` is the object as it is referenced in those
/// statements (for rules and triggers, `name ON table`).
pub fn render_object_metadata(meta: Option<&ObjectMetadata>, name: &str, kind: ObjectKind) -> String {
    let Some(meta) = meta else {
        return String::new();
    };
    let mut out = String::new();

    if !meta.comment.is_empty() {
        out.push_str(&format!(
            "\n\nCOMMENT ON {} {} IS {};",
            kind.keyword(),
            name,
            quote_literal(&meta.comment)
        ));
    }

    if let Some(keyword) = kind.owner_keyword() {
        if !meta.owner.is_empty() {
            out.push_str(&format!("\n\nALTER {} {} OWNER TO {};", keyword, name, meta.owner));
        }
    }

    if let Some(keyword) = kind.privilege_keyword() {
        if !meta.privileges.is_empty() {
            out.push_str(&render_privileges(&meta.privileges, &meta.owner, name, keyword));
        }
    }

    out
}

fn render_privileges(acls: &[Acl], owner: &str, name: &str, keyword: &str) -> String {
    let mut out = format!("\n\nREVOKE ALL ON {} {} FROM PUBLIC;", keyword, name);
    if !owner.is_empty() {
        out.push_str(&format!("\nREVOKE ALL ON {} {} FROM {};", keyword, name, owner));
    }
    for acl in acls {
        if !acl.privileges.is_empty() {
            out.push_str(&format!(
                "\nGRANT {} ON {} {} TO {};",
                privilege_list(&acl.privileges, keyword),
                keyword,
                name,
                acl.grantee_sql()
            ));
        }
        if !acl.grantable.is_empty() {
            out.push_str(&format!(
                "\nGRANT {} ON {} {} TO {} WITH GRANT OPTION;",
                privilege_list(&acl.grantable, keyword),
                keyword,
                name,
                acl.grantee_sql()
            ));
        }
    }
    out
}

fn privilege_list(privileges: &[Privilege], keyword: &str) -> String {
    if privileges == Privilege::all_for(keyword) {
        return "ALL".to_string();
    }
    privileges
        .iter()
        .map(|p| p.keyword())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::acl::parse_acl_list;

    #[test]
    fn test_no_metadata_renders_nothing() {
        assert_eq!(render_object_metadata(None, "t", ObjectKind::Table), "");
        let empty = ObjectMetadata::default();
        assert_eq!(render_object_metadata(Some(&empty), "t", ObjectKind::Table), "");
    }

    #[test]
    fn test_index_comment_only() {
        let meta = ObjectMetadata::with_comment("This is an index comment.");
        assert_eq!(
            render_object_metadata(Some(&meta), "testindex", ObjectKind::Index),
            "\n\nCOMMENT ON INDEX testindex IS 'This is an index comment.';"
        );
    }

    #[test]
    fn test_comment_quotes_are_doubled() {
        let meta = ObjectMetadata::with_comment("it's");
        assert!(render_object_metadata(Some(&meta), "public.t", ObjectKind::Table)
            .contains("IS 'it''s';"));
    }

    #[test]
    fn test_owner_skipped_for_ownerless_kinds() {
        let meta = ObjectMetadata {
            owner: "gpadmin".into(),
            ..Default::default()
        };
        assert_eq!(render_object_metadata(Some(&meta), "i", ObjectKind::Index), "");
        assert_eq!(
            render_object_metadata(Some(&meta), "public.ext", ObjectKind::ExternalTable),
            "\n\nALTER EXTERNAL TABLE public.ext OWNER TO gpadmin;"
        );
    }

    #[test]
    fn test_table_privileges() {
        let meta = ObjectMetadata {
            owner: "gpadmin".into(),
            comment: "facts".into(),
            privileges: parse_acl_list("gpadmin=arwdDxt/gpadmin,analyst=r/gpadmin,=r*/gpadmin").unwrap(),
        };
        assert_eq!(
            render_object_metadata(Some(&meta), "public.sales", ObjectKind::Table),
            "\n\nCOMMENT ON TABLE public.sales IS 'facts';\
             \n\nALTER TABLE public.sales OWNER TO gpadmin;\
             \n\nREVOKE ALL ON TABLE public.sales FROM PUBLIC;\
             \nREVOKE ALL ON TABLE public.sales FROM gpadmin;\
             \nGRANT ALL ON TABLE public.sales TO gpadmin;\
             \nGRANT SELECT ON TABLE public.sales TO analyst;\
             \nGRANT SELECT ON TABLE public.sales TO PUBLIC WITH GRANT OPTION;"
        );
    }

    #[test]
    fn test_sequence_privileges_collapse_to_all() {
        let meta = ObjectMetadata {
            privileges: parse_acl_list("loader=rwU/gpadmin").unwrap(),
            ..Default::default()
        };
        assert!(render_object_metadata(Some(&meta), "public.s", ObjectKind::Sequence)
            .contains("GRANT ALL ON SEQUENCE public.s TO loader;"));
    }
}
