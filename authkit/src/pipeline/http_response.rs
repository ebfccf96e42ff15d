use axum::response::IntoResponse;
use http::header::SET_COOKIE;
use http::HeaderName;
use http::HeaderValue;
use http::Response;

use super::merge;
use super::Cookie;
use super::Headers;
use super::ResponsePipeline;
use super::Session;

/// [`ResponsePipeline`] over an `http::Response`, the type axum serves.
///
/// Cookies and session live beside the native response until [`unbox`]:
/// `Set-Cookie` headers present at construction are parsed into the cookie
/// list, and a [`Session`] found in the response extensions is taken over.
/// Unboxing writes them back, one `Set-Cookie` header per cookie and the
/// session as a response extension for the host's session layer.
///
/// Header names follow `http` semantics: case-insensitive, reported in
/// lowercase.
///
/// [`unbox`]: ResponsePipeline::unbox
#[derive(Debug, Clone)]
pub struct HttpResponsePipeline<B> {
    response: Response<B>,
    cookies: Vec<Cookie<'static>>,
    session: Session,
    touched: bool,
}

impl<B> HttpResponsePipeline<B> {
    pub fn new(mut response: Response<B>) -> Self {
        let set_cookies: Vec<HeaderValue> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .cloned()
            .collect();
        response.headers_mut().remove(SET_COOKIE);

        let cookies = merge::merge_cookies(
            Vec::new(),
            set_cookies.iter().filter_map(parse_set_cookie),
        );
        let session = response
            .extensions_mut()
            .remove::<Session>()
            .unwrap_or_default();

        Self {
            response,
            cookies,
            session,
            touched: false,
        }
    }
}

impl<B> From<Response<B>> for HttpResponsePipeline<B> {
    fn from(response: Response<B>) -> Self {
        Self::new(response)
    }
}

impl<B> ResponsePipeline for HttpResponsePipeline<B> {
    type Response = Response<B>;

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        for (name, value) in self.response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(header_value_string(value));
        }
        headers
    }

    fn header(&self, name: &str) -> Vec<String> {
        self.response
            .headers()
            .get_all(name)
            .iter()
            .map(header_value_string)
            .collect()
    }

    fn with_headers<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, values) in merge::group_by_name(pairs) {
            let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
                tracing::warn!(header = %name, "Skipping header with invalid name");
                continue;
            };

            let values: Vec<HeaderValue> = values
                .iter()
                .filter_map(|value| match HeaderValue::from_str(value) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(header = %name, "Skipping invalid header value");
                        None
                    }
                })
                .collect();

            if header_name == SET_COOKIE {
                let cookies: Vec<Cookie<'static>> =
                    values.iter().filter_map(parse_set_cookie).collect();
                self.cookies = merge::merge_cookies(self.cookies, cookies);
                continue;
            }

            let headers = self.response.headers_mut();
            headers.remove(&header_name);
            for value in values {
                headers.append(header_name.clone(), value);
            }
        }
        self
    }

    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.cookies.clone()
    }

    fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies.iter().find(|c| c.name() == name).cloned()
    }

    fn with_cookies<I>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = Cookie<'static>>,
    {
        self.cookies = merge::merge_cookies(self.cookies, cookies);
        self
    }

    fn session(&self) -> Session {
        self.session.clone()
    }

    fn with_session<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.session.insert_all(pairs);
        self
    }

    fn without_session<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.session.remove_all(keys);
        self
    }

    fn unbox(mut self) -> Response<B> {
        let headers = self.response.headers_mut();
        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(_) => {
                    tracing::warn!(cookie = %cookie.name(), "Dropping cookie not representable as a header");
                }
            }
        }

        self.response.extensions_mut().insert(self.session);
        self.response
    }

    fn touch(mut self) -> Self {
        self.touched = true;
        self
    }

    fn is_touched(&self) -> bool {
        self.touched
    }
}

impl<B> IntoResponse for HttpResponsePipeline<B>
where
    Response<B>: IntoResponse,
{
    fn into_response(self) -> axum::response::Response {
        self.unbox().into_response()
    }
}

fn parse_set_cookie(value: &HeaderValue) -> Option<Cookie<'static>> {
    let parsed = value
        .to_str()
        .ok()
        .and_then(|s| Cookie::parse(s.to_string()).ok());

    if parsed.is_none() {
        tracing::warn!("Dropping unparsable Set-Cookie header");
    }
    parsed
}

fn header_value_string(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    fn pipeline_with_headers(headers: &[(&str, &str)]) -> HttpResponsePipeline<()> {
        let mut builder = Response::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        HttpResponsePipeline::new(builder.body(()).unwrap())
    }

    fn expected(entries: &[(&str, &[&str])]) -> Headers {
        entries
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_with_headers_overrides_and_inserts() {
        let pipeline = pipeline_with_headers(&[("A", "1")]);

        let pipeline = pipeline.with_headers([("A", "2"), ("B", "3")]);

        assert_eq!(pipeline.headers(), expected(&[("a", &["2"]), ("b", &["3"])]));
        assert_eq!(pipeline.header("A"), vec!["2"]);
    }

    #[test]
    fn test_with_headers_accumulates_within_call() {
        let pipeline = pipeline_with_headers(&[]).with_headers([("k", "v1"), ("k", "v2")]);

        assert_eq!(pipeline.header("k"), vec!["v1", "v2"]);
    }

    #[test]
    fn test_with_headers_does_not_accumulate_across_calls() {
        let pipeline = pipeline_with_headers(&[("k", "a"), ("k", "b")])
            .with_headers([("k", "c")])
            .with_headers([("k", "d")]);

        assert_eq!(pipeline.header("k"), vec!["d"]);
    }

    #[test]
    fn test_with_headers_leaves_other_names_untouched() {
        let pipeline = pipeline_with_headers(&[("keep", "1"), ("change", "2")])
            .with_headers([("change", "3")]);

        assert_eq!(pipeline.header("keep"), vec!["1"]);
        assert_eq!(pipeline.header("change"), vec!["3"]);
    }

    #[test]
    fn test_with_headers_empty_input_is_identity() {
        let pipeline = pipeline_with_headers(&[("A", "1")]);
        let before = pipeline.headers();

        let pipeline = pipeline.with_headers(Vec::<(String, String)>::new());

        assert_eq!(pipeline.headers(), before);
    }

    #[test]
    fn test_with_headers_skips_invalid_names_and_values() {
        let pipeline = pipeline_with_headers(&[("A", "1"), ("C", "2")])
            .with_headers([("bad name", "x"), ("C", "bad\nvalue"), ("C", "3"), ("B", "ok")]);

        assert_eq!(pipeline.header("A"), vec!["1"]);
        assert_eq!(pipeline.header("B"), vec!["ok"]);
        assert_eq!(pipeline.header("C"), vec!["3"]);
        assert_eq!(pipeline.headers().len(), 3);
    }

    #[test]
    fn test_with_headers_replaces_even_when_every_value_is_invalid() {
        let pipeline = pipeline_with_headers(&[("A", "1"), ("B", "2")])
            .with_headers([("A", "bad\nvalue")]);

        assert!(pipeline.header("A").is_empty());
        assert_eq!(pipeline.headers(), expected(&[("b", &["2"])]));
    }

    #[test]
    fn test_set_cookie_header_merges_into_cookies() {
        let pipeline = pipeline_with_headers(&[])
            .with_cookies([Cookie::new("x", "1"), Cookie::new("y", "2")])
            .with_headers([("Set-Cookie", "x=5"), ("Set-Cookie", "z=6")]);

        assert_eq!(
            pipeline.cookies(),
            vec![
                Cookie::new("x", "5"),
                Cookie::new("y", "2"),
                Cookie::new("z", "6"),
            ]
        );
        assert!(!pipeline.headers().contains_key("set-cookie"));

        let response = pipeline.unbox();
        let set_cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(set_cookies, vec!["x=5", "y=2", "z=6"]);
    }

    #[test]
    fn test_header_absent_is_empty() {
        let pipeline = pipeline_with_headers(&[]);

        assert!(pipeline.header("missing").is_empty());
        assert!(pipeline.header("not a header name").is_empty());
    }

    #[test]
    fn test_with_cookies_preserves_position_and_appends() {
        let pipeline = pipeline_with_headers(&[]).with_cookies([Cookie::new("x", "1")]);

        let pipeline = pipeline.with_cookies([Cookie::new("x", "2"), Cookie::new("y", "3")]);

        assert_eq!(
            pipeline.cookies(),
            vec![Cookie::new("x", "2"), Cookie::new("y", "3")]
        );
        assert_eq!(pipeline.cookie("y"), Some(Cookie::new("y", "3")));
        assert_eq!(pipeline.cookie("z"), None);
    }

    #[test]
    fn test_with_cookies_last_duplicate_wins() {
        let pipeline = pipeline_with_headers(&[]).with_cookies([
            Cookie::new("x", "1"),
            Cookie::new("x", "2"),
        ]);

        assert_eq!(pipeline.cookies(), vec![Cookie::new("x", "2")]);
    }

    #[test]
    fn test_set_cookie_headers_become_cookies() {
        let pipeline = pipeline_with_headers(&[
            ("set-cookie", "a=1; Path=/"),
            ("set-cookie", "b=2"),
            ("content-type", "text/plain"),
        ]);

        assert_eq!(pipeline.cookie("a").map(|c| c.value().to_string()), Some("1".to_string()));
        assert_eq!(pipeline.cookies().len(), 2);
        assert!(pipeline.header("set-cookie").is_empty());
        assert_eq!(pipeline.header("content-type"), vec!["text/plain"]);
    }

    #[test]
    fn test_with_session_last_value_wins() {
        let pipeline = pipeline_with_headers(&[]).with_session([("k", "v1"), ("k", "v2")]);

        assert_eq!(pipeline.session().get("k"), Some("v2"));
    }

    #[test]
    fn test_with_session_overrides_existing() {
        let pipeline = pipeline_with_headers(&[])
            .with_session([("k", "old"), ("other", "kept")])
            .with_session([("k", "new")]);

        let session = pipeline.session();
        assert_eq!(session.get("k"), Some("new"));
        assert_eq!(session.get("other"), Some("kept"));
    }

    #[test]
    fn test_without_session_removes_present_and_absent_keys() {
        let pipeline = pipeline_with_headers(&[])
            .with_session([("a", "1"), ("b", "2")])
            .without_session(["a", "never-set"]);

        let session = pipeline.session();
        assert!(!session.contains_key("a"));
        assert!(!session.contains_key("never-set"));
        assert_eq!(session.get("b"), Some("2"));
    }

    #[test]
    fn test_unbox_writes_cookies_and_session() {
        let response = pipeline_with_headers(&[("A", "1")])
            .with_cookies([Cookie::new("x", "1"), Cookie::new("y", "2")])
            .with_session([("user", "alice")])
            .unbox();

        let set_cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(set_cookies, vec!["x=1", "y=2"]);
        assert_eq!(response.headers().get("a").unwrap(), "1");

        let session = response.extensions().get::<Session>().unwrap();
        assert_eq!(session.get("user"), Some("alice"));
    }

    #[test]
    fn test_rewrapping_unboxed_response_keeps_content() {
        let pipeline = pipeline_with_headers(&[("A", "1")])
            .with_cookies([Cookie::new("x", "1")])
            .with_session([("user", "alice")]);

        let rewrapped = HttpResponsePipeline::new(pipeline.clone().unbox());

        assert_eq!(rewrapped.headers(), pipeline.headers());
        assert_eq!(rewrapped.cookies(), pipeline.cookies());
        assert_eq!(rewrapped.session(), pipeline.session());
    }

    #[test]
    fn test_transformers_leave_clones_unchanged() {
        let original = pipeline_with_headers(&[("A", "1")]).with_session([("k", "v")]);

        let changed = original
            .clone()
            .with_headers([("A", "2")])
            .without_session(["k"])
            .touch();

        assert_eq!(original.header("A"), vec!["1"]);
        assert_eq!(original.session().get("k"), Some("v"));
        assert!(!original.is_touched());
        assert_eq!(changed.header("A"), vec!["2"]);
        assert!(changed.is_touched());
    }

    #[test]
    fn test_touch_is_idempotent() {
        let pipeline = pipeline_with_headers(&[("A", "1")])
            .with_cookies([Cookie::new("x", "1")])
            .with_session([("k", "v")]);
        assert!(!pipeline.is_touched());

        let once = pipeline.touch();
        let twice = once.clone().touch();

        assert!(once.is_touched());
        assert!(twice.is_touched());
        assert_eq!(once.headers(), twice.headers());
        assert_eq!(once.cookies(), twice.cookies());
        assert_eq!(once.session(), twice.session());
    }

    #[test]
    fn test_into_response() {
        let pipeline = HttpResponsePipeline::new(Response::new(axum::body::Body::empty()))
            .with_headers([("X-Auth-Token", "abc")]);

        let response = pipeline.into_response();
        assert_eq!(response.headers().get("x-auth-token").unwrap(), "abc");
    }

    proptest! {
        /// Property: every name passed to `with_headers` ends up with exactly
        /// the values supplied in that call; other names keep their values.
        #[test]
        fn with_headers_overrides_by_name(
            initial in prop::collection::vec(("[a-e]", "[0-9]{1,2}"), 0..8),
            update in prop::collection::vec(("[a-c]", "[0-9]{1,2}"), 0..8),
        ) {
            let mut builder = Response::builder();
            for (name, value) in &initial {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let pipeline = HttpResponsePipeline::new(builder.body(()).unwrap());
            let before = pipeline.headers();

            let after = pipeline.with_headers(update.clone()).headers();

            let mut supplied: HashMap<&str, Vec<String>> = HashMap::new();
            for (name, value) in &update {
                supplied.entry(name.as_str()).or_default().push(value.clone());
            }

            for (name, values) in &after {
                match supplied.get(name.as_str()) {
                    Some(expected) => {
                        prop_assert_eq!(values, expected);
                    }
                    None => {
                        prop_assert_eq!(Some(values), before.get(name));
                    }
                }
            }
            for name in supplied.keys() {
                prop_assert!(after.contains_key(*name));
            }
        }
    }
}
