//! The ternary search trie that maps `(method, path)` to a registered
//! handler, with inline support for `:name` captures and a terminal `*`
//! wildcard.
//!
//! Grounded on `original_source/router/tree.go`: a node per byte,
//! `lt`/`eq`/`gt` children for ordinary ternary search, plus a capture
//! alternative consulted whenever the literal branch runs dry. The
//! teacher's node graphs (e.g. `router-core/src/app/gateway.rs`'s
//! `PathTrie`-less linear scan) don't have an equivalent structure to
//! imitate directly, so this module follows spec.md §9's own design
//! note instead: an arena (`Vec<Node<H>>`) addressed by `usize` indices
//! rather than a tree of owned pointers, which keeps the whole trie in
//! one contiguous allocation and sidesteps lifetime gymnastics.

use std::cmp::Ordering;

use super::pattern::{CaptureVar, Method, RoutePattern};

struct Node<H> {
    byte: u8,
    lt: Option<usize>,
    eq: Option<usize>,
    gt: Option<usize>,
    /// The capture alternative reachable from the level this node's
    /// `eq` edge leads into: tried only once the literal `eq` subtree
    /// fails to match the remaining input.
    eq_capture: Option<usize>,
    var_name: Option<String>,
    is_wildcard: bool,
    handlers: [Option<H>; Method::ALL.len()],
}

impl<H> Node<H> {
    fn literal(byte: u8) -> Self {
        Node {
            byte,
            lt: None,
            eq: None,
            gt: None,
            eq_capture: None,
            var_name: None,
            is_wildcard: false,
            handlers: Default::default(),
        }
    }

    fn capture(name: String, is_wildcard: bool) -> Self {
        Node {
            byte: 0,
            lt: None,
            eq: None,
            gt: None,
            eq_capture: None,
            var_name: Some(name),
            is_wildcard,
            handlers: Default::default(),
        }
    }
}

/// Outcome of looking a request up in the trie. Distinguishes "no route
/// registered for this path" from "a route exists, but not for this
/// verb" so the caller can answer 404 vs. 405 (spec.md §7).
pub enum Lookup<'a, H> {
    Matched {
        handler: &'a H,
        params: Vec<(String, String)>,
    },
    MethodNotAllowed,
    NotFound,
}

/// A method-aware path trie. `H` is the opaque handler payload stored
/// at the node a pattern terminates on (spec.md §4.2).
pub struct Trie<H> {
    nodes: Vec<Node<H>>,
    root: Option<usize>,
    root_capture: Option<usize>,
}

impl<H> Default for Trie<H> {
    fn default() -> Self {
        Trie {
            nodes: Vec::new(),
            root: None,
            root_capture: None,
        }
    }
}

enum Slot {
    Top,
    Eq(usize),
}

impl<H: Clone> Trie<H> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node<H>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn insert_byte(nodes: &mut Vec<Node<H>>, root: &mut Option<usize>, byte: u8) -> usize {
        let Some(mut idx) = *root else {
            let new = {
                nodes.push(Node::literal(byte));
                nodes.len() - 1
            };
            *root = Some(new);
            return new;
        };
        loop {
            match byte.cmp(&nodes[idx].byte) {
                Ordering::Equal => return idx,
                Ordering::Less => match nodes[idx].lt {
                    Some(next) => idx = next,
                    None => {
                        nodes.push(Node::literal(byte));
                        let new = nodes.len() - 1;
                        nodes[idx].lt = Some(new);
                        return new;
                    }
                },
                Ordering::Greater => match nodes[idx].gt {
                    Some(next) => idx = next,
                    None => {
                        nodes.push(Node::literal(byte));
                        let new = nodes.len() - 1;
                        nodes[idx].gt = Some(new);
                        return new;
                    }
                },
            }
        }
    }

    fn ensure_capture(&mut self, slot: &Slot, var: &CaptureVar) -> usize {
        let existing = match *slot {
            Slot::Top => self.root_capture,
            Slot::Eq(parent) => self.nodes[parent].eq_capture,
        };
        if let Some(idx) = existing {
            return idx;
        }
        let idx = self.push(Node::capture(var.name.clone(), var.is_wildcard));
        match *slot {
            Slot::Top => self.root_capture = Some(idx),
            Slot::Eq(parent) => self.nodes[parent].eq_capture = Some(idx),
        }
        idx
    }

    /// Register `pattern`'s template under `pattern.method()`, storing
    /// `handler` at the node the template terminates on. Re-inserting
    /// the same template (even under a different method) reuses the
    /// existing trie nodes; only the method-indexed handler slot is
    /// written.
    pub fn insert(&mut self, pattern: &RoutePattern, handler: H) {
        let bytes = pattern.template().as_bytes();
        let len = bytes.len();
        let mut captures = pattern.captures().iter().peekable();
        let mut slot = Slot::Top;
        let mut i = 0usize;

        while i < len {
            if let Some(cap) = captures.peek().copied().filter(|c| c.offset == i) {
                captures.next();
                let cap_idx = self.ensure_capture(&slot, cap);
                if cap.is_wildcard {
                    self.nodes[cap_idx].handlers[pattern.method().index()] = Some(handler);
                    return;
                }
                i = cap.name_end;
                slot = Slot::Eq(cap_idx);
                continue;
            }

            let byte = bytes[i];
            let node_idx = match slot {
                Slot::Top => Self::insert_byte(&mut self.nodes, &mut self.root, byte),
                Slot::Eq(parent) => {
                    let mut eq_root = self.nodes[parent].eq;
                    let idx = Self::insert_byte(&mut self.nodes, &mut eq_root, byte);
                    self.nodes[parent].eq = eq_root;
                    idx
                }
            };
            slot = Slot::Eq(node_idx);
            i += 1;
        }

        if let Slot::Eq(idx) = slot {
            self.nodes[idx].handlers[pattern.method().index()] = Some(handler);
        }
    }

    /// Match `method` and `path` against the trie (spec.md §4.2). The
    /// literal branch always wins over a capture at the same level: a
    /// registered `/users/me` beats `/users/:id` for the literal
    /// input, matching the original's precedence rule.
    pub fn lookup(&self, method: Method, path: &str) -> Lookup<'_, H> {
        let bytes = path.as_bytes();
        let mut params = Vec::new();
        match self.walk_level(self.root, self.root_capture, bytes, 0, &mut params) {
            None => Lookup::NotFound,
            Some(idx) => match &self.nodes[idx].handlers[method.index()] {
                Some(handler) => Lookup::Matched { handler, params },
                None => Lookup::MethodNotAllowed,
            },
        }
    }

    fn walk_level(
        &self,
        root: Option<usize>,
        capture: Option<usize>,
        bytes: &[u8],
        pos: usize,
        params: &mut Vec<(String, String)>,
    ) -> Option<usize> {
        if let Some(root_idx) = root {
            if let Some(found) = self.walk_bst(root_idx, bytes, pos, params) {
                return Some(found);
            }
        }
        if let Some(cap_idx) = capture {
            return self.walk_capture(cap_idx, bytes, pos, params);
        }
        None
    }

    fn walk_bst(
        &self,
        idx: usize,
        bytes: &[u8],
        pos: usize,
        params: &mut Vec<(String, String)>,
    ) -> Option<usize> {
        if pos >= bytes.len() {
            return None;
        }
        let node = &self.nodes[idx];
        match bytes[pos].cmp(&node.byte) {
            Ordering::Less => node.lt.and_then(|lt| self.walk_bst(lt, bytes, pos, params)),
            Ordering::Greater => node.gt.and_then(|gt| self.walk_bst(gt, bytes, pos, params)),
            Ordering::Equal => {
                let next = pos + 1;
                if next == bytes.len() {
                    return Some(idx);
                }
                self.walk_level(node.eq, node.eq_capture, bytes, next, params)
            }
        }
    }

    fn walk_capture(
        &self,
        idx: usize,
        bytes: &[u8],
        pos: usize,
        params: &mut Vec<(String, String)>,
    ) -> Option<usize> {
        let node = &self.nodes[idx];
        let mark = params.len();

        if node.is_wildcard {
            let value = std::str::from_utf8(&bytes[pos..]).ok()?.to_string();
            params.push((node.var_name.clone().unwrap(), value));
            return Some(idx);
        }

        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'/')
            .map(|rel| pos + rel)
            .unwrap_or(bytes.len());
        let value = std::str::from_utf8(&bytes[pos..end]).ok()?.to_string();
        params.push((node.var_name.clone().unwrap(), value));

        if end == bytes.len() {
            return Some(idx);
        }

        let result = self.walk_level(node.eq, node.eq_capture, bytes, end, params);
        if result.is_none() {
            params.truncate(mark);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(method: Method, template: &str) -> RoutePattern {
        RoutePattern::new(method, template).unwrap()
    }

    #[test]
    fn literal_path_matches_exactly() {
        let mut trie = Trie::new();
        trie.insert(&pattern(Method::Get, "/healthz"), "health");
        match trie.lookup(Method::Get, "/healthz") {
            Lookup::Matched { handler, params } => {
                assert_eq!(*handler, "health");
                assert!(params.is_empty());
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn unknown_path_is_not_found() {
        let mut trie = Trie::new();
        trie.insert(&pattern(Method::Get, "/healthz"), "health");
        assert!(matches!(
            trie.lookup(Method::Get, "/nope"),
            Lookup::NotFound
        ));
    }

    #[test]
    fn known_path_wrong_method_is_method_not_allowed() {
        let mut trie = Trie::new();
        trie.insert(&pattern(Method::Get, "/healthz"), "health");
        assert!(matches!(
            trie.lookup(Method::Post, "/healthz"),
            Lookup::MethodNotAllowed
        ));
    }

    #[test]
    fn named_captures_populate_params_in_order() {
        let mut trie = Trie::new();
        trie.insert(
            &pattern(Method::Get, "/repos/:owner/:repo/stargazers"),
            "stars",
        );
        match trie.lookup(Method::Get, "/repos/rust-lang/rust/stargazers") {
            Lookup::Matched { handler, params } => {
                assert_eq!(*handler, "stars");
                assert_eq!(
                    params,
                    vec![
                        ("owner".to_string(), "rust-lang".to_string()),
                        ("repo".to_string(), "rust".to_string()),
                    ]
                );
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn terminal_wildcard_captures_remainder_including_empty() {
        let mut trie = Trie::new();
        trie.insert(&pattern(Method::Get, "/static/*"), "assets");

        match trie.lookup(Method::Get, "/static/css/app.css") {
            Lookup::Matched { handler, params } => {
                assert_eq!(*handler, "assets");
                assert_eq!(params, vec![("*".to_string(), "css/app.css".to_string())]);
            }
            _ => panic!("expected a match"),
        }

        match trie.lookup(Method::Get, "/static/") {
            Lookup::Matched { params, .. } => {
                assert_eq!(params, vec![("*".to_string(), "".to_string())]);
            }
            _ => panic!("expected a match with an empty tail capture"),
        }
    }

    #[test]
    fn literal_sibling_outranks_capture_at_same_level() {
        let mut trie = Trie::new();
        trie.insert(&pattern(Method::Get, "/users/me"), "self");
        trie.insert(&pattern(Method::Get, "/users/:id"), "by_id");

        match trie.lookup(Method::Get, "/users/me") {
            Lookup::Matched { handler, params } => {
                assert_eq!(*handler, "self");
                assert!(params.is_empty());
            }
            _ => panic!("literal route should win over the capture"),
        }

        match trie.lookup(Method::Get, "/users/42") {
            Lookup::Matched { handler, params } => {
                assert_eq!(*handler, "by_id");
                assert_eq!(params, vec![("id".to_string(), "42".to_string())]);
            }
            _ => panic!("expected the capture route to match"),
        }
    }

    #[test]
    fn reinserting_same_template_under_new_method_reuses_nodes() {
        let mut trie = Trie::new();
        trie.insert(&pattern(Method::Get, "/widgets/:id"), "get_widget");
        trie.insert(&pattern(Method::Delete, "/widgets/:id"), "delete_widget");

        match trie.lookup(Method::Get, "/widgets/7") {
            Lookup::Matched { handler, .. } => assert_eq!(*handler, "get_widget"),
            _ => panic!("expected GET to match"),
        }
        match trie.lookup(Method::Delete, "/widgets/7") {
            Lookup::Matched { handler, .. } => assert_eq!(*handler, "delete_widget"),
            _ => panic!("expected DELETE to match"),
        }
        assert!(matches!(
            trie.lookup(Method::Post, "/widgets/7"),
            Lookup::MethodNotAllowed
        ));
    }
}
