//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde::Deserialize;

    use crate::parser::{HttpRequest, Method, HttpVersion, Error, parse_request, request_len};

    fn json_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "example.com".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    #[test]
    fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::GET);
        assert_eq!(result.path, "/index.html");
        assert_eq!(result.query, "");
        assert_eq!(result.version, HttpVersion::Http11);
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert!(result.body.is_empty());
    }

    #[test]
    fn test_case_insensitive_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nhost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert!(result.has_header("Host"));
        assert!(result.has_header("HOST"));
        assert_eq!(result.get_header("hOsT").unwrap(), "example.com");
    }

    #[test]
    fn test_missing_host_header() {
        let request = b"GET /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MissingHeader(ref h)) if h == "Host"));
    }

    #[test]
    fn test_http10_without_host() {
        let request = b"GET /index.html HTTP/1.0\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.version, HttpVersion::Http10);
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_invalid_method() {
        let request = b"BREW /pot HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "BREW"));
    }

    #[test]
    fn test_invalid_http_version() {
        let request = b"GET /index.html HTTP/9.9\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidVersion(ref v)) if v == "HTTP/9.9"));
    }

    #[test]
    fn test_target_must_be_a_path() {
        let request = b"GET index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidPath(ref p)) if p == "index.html"));
    }

    #[test]
    fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(ref line)) if line == "InvalidHeader"));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(parse_request(b""), Err(Error::EmptyRequest)));
        assert!(matches!(parse_request(b"\r\n\r\n"), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_malformed_request_lines() {
        let requests: [&[u8]; 3] = [b"GET\r\n", b"GET  HTTP/1.1\r\nHost: a\r\n\r\n", b"INVALID REQUEST"];
        for request in requests {
            assert!(matches!(parse_request(request), Err(Error::MalformedRequestLine(_))));
        }
    }

    #[test]
    fn test_all_methods() {
        for method in Method::ALL {
            let request = format!("{method} /x HTTP/1.1\r\nHost: example.com\r\n\r\n");
            assert_eq!(parse_request(request.as_bytes()).unwrap().method, method);
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_headers_with_multiple_colons_and_whitespace() {
        let request = b"GET / HTTP/1.1\r\nHost:  example.com  \r\nX-Test: value:with:colons\r\nX-Empty:\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("X-Test").unwrap(), "value:with:colons");
        assert_eq!(result.headers.get("X-Empty").unwrap(), "");
    }

    #[test]
    fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_path_is_split_from_query() {
        let request = b"GET /search?q=test%20query&filter=name:john&page=1&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.path, "/search");
        assert_eq!(result.query, "q=test%20query&filter=name:john&page=1&page=2");
        assert_eq!(result.get_query_param("q").unwrap(), "test query");
        assert_eq!(result.get_query_param("filter").unwrap(), "name:john");
        // first occurrence wins
        assert_eq!(result.get_query_param("page").unwrap(), "1");
        assert_eq!(result.request_uri(), "/search?q=test%20query&filter=name:john&page=1&page=2");
    }

    #[test]
    fn test_query_parameters_without_values() {
        let request = b"GET /search?q=test&flag&empty= HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_query_param("flag").unwrap(), "");
        assert_eq!(result.get_query_param("empty").unwrap(), "");
        assert!(result.has_query_param("q"));
        assert!(!result.has_query_param("missing"));
    }

    #[test]
    fn test_malformed_utf8_in_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: \xFF\xFF\xFF\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref s)) if s == "Invalid UTF-8"));
    }

    #[test]
    fn test_body_follows_blank_line() {
        let request = b"POST /api/users HTTP/1.1\r\n\
            Host: example.com\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 15\r\n\
            \r\n\
            {\"name\":\"geek\"}trailing";

        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::POST);
        assert_eq!(result.body, b"{\"name\":\"geek\"}".to_vec());
    }

    #[test]
    fn test_invalid_content_length() {
        let request = b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: lots\r\n\r\nbody";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidContentLength(ref v)) if v == "lots"));
    }

    #[test]
    fn test_request_len() {
        assert_eq!(request_len(b"GET / HTTP/1.1\r\nHost: a\r\n").unwrap(), None);

        let head = b"GET / HTTP/1.1\r\nHost: a\r\n\r\n";
        assert_eq!(request_len(head).unwrap(), Some(head.len()));

        let post = b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 10\r\n\r\nabc";
        assert_eq!(request_len(post).unwrap(), Some(post.len() - 3 + 10));
    }

    #[test]
    fn test_request_len_saturates_on_huge_content_length() {
        let request = b"POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 18446744073709551615\r\n\r\n";
        assert_eq!(request_len(request).unwrap(), Some(usize::MAX));
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let request = b"GET /hello/a%20b/my%20file.css?x=%20 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.path, "/hello/a b/my file.css");
        assert_eq!(result.raw_path, "/hello/a%20b/my%20file.css");
        assert_eq!(result.request_uri(), "/hello/a%20b/my%20file.css?x=%20");
        assert_eq!(result.get_query_param("x").unwrap(), " ");
    }

    #[test]
    fn test_form_value_prefers_body() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string());
        let request = HttpRequest::with_body(
            Method::POST,
            "/login?user=query&next=%2Fhome",
            HttpVersion::Http11,
            headers,
            b"user=body+user&password=p%40ss".to_vec(),
        );

        assert_eq!(request.form_value("user").as_deref(), Some("body user"));
        assert_eq!(request.form_value("password").as_deref(), Some("p@ss"));
        assert_eq!(request.form_value("next").as_deref(), Some("/home"));
        assert_eq!(request.form_value("missing"), None);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
        email: String,
    }

    #[test]
    fn test_json_parsing() {
        let body = r#"{"name":"John Doe","email":"john@example.com"}"#.as_bytes().to_vec();
        let request = HttpRequest::with_body(Method::POST, "/api/users", HttpVersion::Http11, json_headers(), body.clone());
        assert!(request.is_json());

        let user: TestUser = request.json().unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "john@example.com");

        let mut plain = json_headers();
        plain.insert("Content-Type".to_string(), "text/plain".to_string());
        let request = HttpRequest::with_body(Method::POST, "/api/users", HttpVersion::Http11, plain, body);
        let result: Result<TestUser, _> = request.json();
        assert!(matches!(result, Err(Error::MissingHeader(_))));

        let invalid = r#"{"name":"John Doe","email":}"#.as_bytes().to_vec();
        let request = HttpRequest::with_body(Method::POST, "/api/users", HttpVersion::Http11, json_headers(), invalid);
        let result: Result<TestUser, _> = request.json();
        assert!(matches!(result, Err(Error::JsonError(_))));
    }

    #[test]
    fn test_display_impls() {
        assert_eq!(Method::DELETE.to_string(), "DELETE");
        assert_eq!(HttpVersion::Http10.to_string(), "HTTP/1.0");
        assert_eq!(HttpVersion::Http20.to_string(), "HTTP/2");
        assert_eq!(HttpVersion::default(), HttpVersion::Http11);
    }
}
