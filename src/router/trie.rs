//! Segment trie used to resolve a request path to a registered pattern.

/// Marks a segment that captures exactly one path segment.
pub const PARAM_MARKER: char = ':';

/// Marks a segment that captures the remainder of the path.
pub const WILDCARD_MARKER: char = '*';

/// Split a pattern or request path into its non-empty `/`-separated segments.
///
/// Decomposition stops after the first wildcard segment, so anything
/// following it in the raw string is ignored:
///
/// ```
/// use microrouter::router::parse_pattern;
///
/// assert_eq!(parse_pattern("/p/:name/b/*"), vec!["p", ":name", "b", "*"]);
/// assert_eq!(parse_pattern("/p/*name/*"), vec!["p", "*name"]);
/// ```
pub fn parse_pattern(pattern: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for part in pattern.split('/').filter(|part| !part.is_empty()) {
        parts.push(part);
        if part.starts_with(WILDCARD_MARKER) {
            break;
        }
    }
    parts
}

/// One segment level of a method's routing trie.
///
/// Only nodes that terminate a registered route carry a `pattern`; every
/// other node is structural.
#[derive(Debug, Default, Clone)]
pub struct Node {
    segment: String,
    is_wild: bool,
    pattern: Option<String>,
    children: Vec<Node>,
}

impl Node {
    /// An empty root node. It stands for no segment.
    pub fn root() -> Self {
        Self::default()
    }

    fn child(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            is_wild: segment.starts_with(PARAM_MARKER) || segment.starts_with(WILDCARD_MARKER),
            pattern: None,
            children: Vec::new(),
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn is_wild(&self) -> bool {
        self.is_wild
    }

    /// The full pattern registered at this node, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Insert `pattern`, whose decomposition is `parts`, below this node.
    ///
    /// A child is reused only when its segment text is identical to the one
    /// being inserted, so `:name` and a literal sibling such as `b` live side
    /// by side instead of the literal being folded under the parameter.
    /// Re-inserting the same pattern is a no-op on the structure.
    pub fn insert(&mut self, pattern: &str, parts: &[&str], depth: usize) {
        if depth == parts.len() {
            self.pattern = Some(pattern.to_string());
            return;
        }

        let part = parts[depth];
        let index = match self.children.iter().position(|child| child.segment == part) {
            Some(index) => index,
            None => {
                self.children.push(Node::child(part));
                self.children.len() - 1
            }
        };
        self.children[index].insert(pattern, parts, depth + 1);
    }

    /// Find the node whose registered pattern matches `parts`.
    ///
    /// A wildcard node ends the walk early and absorbs whatever segments are
    /// left. Candidates are tried depth-first, literal children before wild
    /// ones, and the first subtree that yields a registered node wins.
    pub fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if depth == parts.len() || self.segment.starts_with(WILDCARD_MARKER) {
            return self.pattern.as_ref().map(|_| self);
        }

        let part = parts[depth];
        let literal = self.children.iter().filter(|child| !child.is_wild && child.segment == part);
        let wild = self.children.iter().filter(|child| child.is_wild);
        literal.chain(wild).find_map(|child| child.search(parts, depth + 1))
    }

    /// Every pattern registered at or below this node, depth-first.
    pub fn patterns(&self) -> Vec<&str> {
        let mut patterns = Vec::new();
        self.collect_patterns(&mut patterns);
        patterns
    }

    fn collect_patterns<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(pattern) = &self.pattern {
            out.push(pattern);
        }
        for child in &self.children {
            child.collect_patterns(out);
        }
    }
}
