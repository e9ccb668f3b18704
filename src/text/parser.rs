// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recursive-descent parser building a [`Tree`] from the token stream.
//!
//! Each entry is `key = value` or `key { ... }`; brace and bracket matching
//! is purely structural (depth-bounded, not a pushdown automaton), and an
//! entry's own key determines where its value lands in the tree.

use super::lexer::{Lexer, Token};
use super::tree::{NodeId, NodeKind, Tree};
use crate::error::{bad_semantic, Result};

const MAX_PARSE_DEPTH: usize = 256;

/// Parses a full metadata text block into a tree rooted at `root_node`.
pub fn parse(buf: &[u8]) -> Result<Tree> {
    let mut tree = Tree::new();
    let mut lexer = Lexer::new(buf);
    let root = tree.root;
    parse_child_body(&mut lexer, &mut tree, root, 0)?;
    Ok(tree)
}

/// `child_body := (ws | comment | entry)*`. Returns when it hits EOF or an
/// unmatched `}` -- the latter is how a nested call returns control to its
/// caller; at the top level it simply terminates parsing early, per spec.
fn parse_child_body(lexer: &mut Lexer, tree: &mut Tree, parent: NodeId, depth: usize) -> Result<()> {
    if depth > MAX_PARSE_DEPTH {
        return Err(bad_semantic("metadata nesting exceeds the supported depth"));
    }
    loop {
        match lexer.next_token() {
            Token::Eof => return Ok(()),
            Token::CurlyClose => return Ok(()),
            Token::Comment(_) => continue,
            Token::Ident(key_bytes) => {
                if key_bytes.is_empty() {
                    continue;
                }
                let key = String::from_utf8_lossy(key_bytes).into_owned();
                match lexer.next_token() {
                    Token::Equals => {
                        let value = parse_value(lexer, tree, &key, depth)?;
                        tree.append_child(parent, value);
                    }
                    Token::CurlyOpen => {
                        let child = tree.alloc(&key, NodeKind::Child(None));
                        tree.append_child(parent, child);
                        parse_child_body(lexer, tree, child, depth + 1)?;
                    }
                    other => {
                        return Err(bad_semantic(format!(
                            "expected '=' or '{{' after identifier '{}', found {:?}",
                            key, other
                        )))
                    }
                }
            }
            // Stray punctuation or a value with no key: the format is not
            // adversarial and real metadata never emits this, but skip
            // rather than abort.
            _ => continue,
        }
    }
}

/// `value := ws* ( STRING | INTEGER | list )`.
fn parse_value(lexer: &mut Lexer, tree: &mut Tree, key: &str, depth: usize) -> Result<NodeId> {
    match lexer.next_token() {
        Token::String(bytes) => {
            let s = String::from_utf8_lossy(bytes).into_owned();
            Ok(tree.alloc(key, NodeKind::String(s)))
        }
        Token::Integer(v) => Ok(tree.alloc(key, NodeKind::Integer(v))),
        Token::BracketOpen => parse_list(lexer, tree, key, depth),
        other => Err(bad_semantic(format!(
            "expected a value for '{}', found {:?}",
            key, other
        ))),
    }
}

/// `list := '[' ws* ( element ( ',' ws* element )* )? ']'`. Elements become
/// ordered child nodes of a `List` node: integer elements keyed `"integer"`,
/// string elements keyed by their own value.
fn parse_list(lexer: &mut Lexer, tree: &mut Tree, key: &str, depth: usize) -> Result<NodeId> {
    if depth > MAX_PARSE_DEPTH {
        return Err(bad_semantic("metadata nesting exceeds the supported depth"));
    }
    let list = tree.alloc(key, NodeKind::List(None));
    loop {
        match lexer.next_token() {
            Token::BracketClose => return Ok(list),
            Token::Comma => continue,
            Token::String(bytes) => {
                let s = String::from_utf8_lossy(bytes).into_owned();
                let elem = tree.alloc(&s.clone(), NodeKind::String(s));
                tree.append_child(list, elem);
            }
            Token::Integer(v) => {
                let elem = tree.alloc("integer", NodeKind::Integer(v));
                tree.append_child(list, elem);
            }
            Token::Eof => return Err(bad_semantic("unterminated list")),
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tree::NodeKind;

    #[test]
    fn parses_nested_metadata_and_resolves_paths() {
        let input = br#"
vg1 {
    extent_size = 8192
    physical_volumes {
        pv0 {
            id = "XYZ-123"
            dev_size = 1048576
            pe_start = 2048
            pe_count = 64
        }
    }
    logical_volumes {
        root {
            segment_count = 1
            segment1 {
                start_extent = 0
                extent_count = 4
                stripe_count = 1
                stripes = [ "pv0", 0 ]
            }
        }
    }
}
"#;
        let tree = parse(input).unwrap();
        let node = tree
            .get_key_path("vg1/logical_volumes/root/segment1/extent_count", tree.root)
            .unwrap();
        match tree.node(node).kind {
            NodeKind::Integer(v) => assert_eq!(v, 4),
            _ => panic!("wrong kind"),
        }

        let stripes = tree
            .get_key_path("vg1/logical_volumes/root/segment1/stripes", tree.root)
            .unwrap();
        let elems: Vec<_> = tree.children(stripes).map(|id| tree.node(id).clone()).collect();
        assert_eq!(elems.len(), 2);
        match &elems[0].kind {
            NodeKind::String(s) => assert_eq!(s, "pv0"),
            _ => panic!("wrong kind"),
        }
        match &elems[1].kind {
            NodeKind::Integer(v) => assert_eq!(*v, 0),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn comments_and_whitespace_are_tolerated() {
        let input = b"# top comment\nvg1 {\n\t# indented comment\n  extent_size = 4096\n}\n";
        let tree = parse(input).unwrap();
        let node = tree.get_key_path("vg1/extent_size", tree.root).unwrap();
        match tree.node(node).kind {
            NodeKind::Integer(v) => assert_eq!(v, 4096),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn string_values_are_not_unescaped() {
        let input = br#"id = "a\"b""#;
        let tree = parse(input).unwrap();
        let node = tree.get_key_path("id", tree.root).unwrap();
        match &tree.node(node).kind {
            NodeKind::String(s) => assert_eq!(s, r#"a\"b"#),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn lv_lookup_on_missing_name_returns_none() {
        let input = b"vg1 { logical_volumes { root { segment_count = 1 } } }";
        let tree = parse(input).unwrap();
        assert!(tree
            .get_key_path("vg1/logical_volumes/nonexistent/segment_count", tree.root)
            .is_none());
    }
}
