//! Tests for pattern decomposition, the trie and the route table.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::parser::Method;
    use crate::router::{extract_params, parse_pattern, Node, RouteTable};

    fn new_test_table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/", "index");
        table.register(Method::GET, "/hello/:name", "hello");
        table.register(Method::GET, "/hello/b/c", "hello_b_c");
        table.register(Method::GET, "/hi/:name", "hi");
        table.register(Method::GET, "/assets/*filepath", "assets");
        table
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_pattern() {
        let cases: [(&str, &[&str]); 5] = [
            ("/p/*", &["p", "*"]),
            ("/p/:name", &["p", ":name"]),
            ("/p/*name/*", &["p", "*name"]),
            ("/p/:name/b/*", &["p", ":name", "b", "*"]),
            ("//p///q/", &["p", "q"]),
        ];
        for (pattern, want) in cases {
            assert_eq!(parse_pattern(pattern), want, "pattern {pattern}");
        }
        assert!(parse_pattern("/").is_empty());
    }

    #[test]
    fn test_resolve() {
        let table = new_test_table();
        let cases = [
            ("/hello/geek", "/hello/:name", params(&[("name", "geek")])),
            ("/hello/frank", "/hello/:name", params(&[("name", "frank")])),
            ("/hello/b/c", "/hello/b/c", params(&[])),
            ("/hi/there", "/hi/:name", params(&[("name", "there")])),
            ("/assets/233.jpg", "/assets/*filepath", params(&[("filepath", "233.jpg")])),
            ("/assets/css/a.css", "/assets/*filepath", params(&[("filepath", "css/a.css")])),
            ("/", "/", params(&[])),
        ];

        for (path, pattern, want) in cases {
            let found = table.resolve(Method::GET, path).unwrap_or_else(|| panic!("no match for {path}"));
            assert_eq!(found.pattern, pattern, "path {path}");
            assert_eq!(found.params, want, "path {path}");
        }
    }

    #[test]
    fn test_resolve_returns_registered_handler() {
        let table = new_test_table();
        assert_eq!(*table.resolve(Method::GET, "/hello/b/c").unwrap().handler, "hello_b_c");
        assert_eq!(*table.resolve(Method::GET, "/hello/x").unwrap().handler, "hello");
    }

    #[test]
    fn test_literal_sibling_does_not_leak_into_param_route() {
        let table = new_test_table();
        // `/hello/b/c` is a literal route, so another middle segment must not match it.
        assert!(table.resolve(Method::GET, "/hello/x/c").is_none());
    }

    #[test]
    fn test_literal_wins_regardless_of_registration_order() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/users/:id", "by_id");
        table.register(Method::GET, "/users/me", "me");

        assert_eq!(table.resolve(Method::GET, "/users/me").unwrap().pattern, "/users/me");
        let other = table.resolve(Method::GET, "/users/42").unwrap();
        assert_eq!(other.pattern, "/users/:id");
        assert_eq!(other.params, params(&[("id", "42")]));
    }

    #[test]
    fn test_param_route_reached_by_backtracking() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/docs/intro", "intro");
        table.register(Method::GET, "/docs/:page/edit", "edit");

        let found = table.resolve(Method::GET, "/docs/intro/edit").unwrap();
        assert_eq!(found.pattern, "/docs/:page/edit");
        assert_eq!(found.params, params(&[("page", "intro")]));
    }

    #[test]
    fn test_unregistered_method_or_path() {
        let table = new_test_table();
        assert!(table.resolve(Method::POST, "/hello/geek").is_none());
        assert!(table.resolve(Method::GET, "/nothing").is_none());
        // structural node without a pattern
        assert!(table.resolve(Method::GET, "/hello").is_none());
        // wildcard needs at least one segment
        assert!(table.resolve(Method::GET, "/assets").is_none());
        assert!(table.resolve(Method::GET, "/hello/geek/extra").is_none());
    }

    #[test]
    fn test_bare_wildcard_captures_nothing() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/files/*", "files");
        let found = table.resolve(Method::GET, "/files/a/b").unwrap();
        assert_eq!(found.pattern, "/files/*");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_duplicate_registration_last_handler_wins() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/ping", "first");
        table.register(Method::GET, "/ping", "second");

        assert_eq!(table.len(), 1);
        assert_eq!(*table.resolve(Method::GET, "/ping").unwrap().handler, "second");
        assert_eq!(table.root(Method::GET).unwrap().children().len(), 1);
    }

    #[test]
    fn test_routes_listed_in_registration_order() {
        let mut table = new_test_table();
        table.register(Method::POST, "/login", "login");

        let routes: Vec<_> = table.routes().collect();
        assert_eq!(routes.first(), Some(&(Method::GET, "/")));
        assert_eq!(routes.last(), Some(&(Method::POST, "/login")));
        assert_eq!(routes.len(), 6);
    }

    #[test]
    fn test_node_structure() {
        let mut root = Node::root();
        root.insert("/hello/:name", &parse_pattern("/hello/:name"), 0);
        root.insert("/hello/b/c", &parse_pattern("/hello/b/c"), 0);

        let hello = &root.children()[0];
        assert_eq!(hello.segment(), "hello");
        assert!(!hello.is_wild());
        assert!(hello.pattern().is_none());

        let segments: Vec<_> = hello.children().iter().map(|c| (c.segment(), c.is_wild())).collect();
        assert_eq!(segments, vec![(":name", true), ("b", false)]);
        assert_eq!(root.patterns(), vec!["/hello/:name", "/hello/b/c"]);
    }

    #[test]
    fn test_extract_params_with_wildcard_tail() {
        let parts = parse_pattern("/p/go/b/x/y");
        let found = extract_params("/p/:lang/b/*rest", &parts);
        assert_eq!(found, params(&[("lang", "go"), ("rest", "x/y")]));
    }
}
