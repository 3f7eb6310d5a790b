//! In-process requests against the dashboard router
//!
//! A [`TestRequest`] goes through `tower::ServiceExt::oneshot`, so nothing
//! listens on a port. The whole body is buffered when the call completes and
//! every check on [`TestResponse`] is synchronous.
//!
//! ```rust,ignore
//! let status: serde_json::Value = testing::post(app.router(), "/admin/refresh")
//!     .bearer_token(&token)
//!     .execute()
//!     .await
//!     .assert_ok()
//!     .assert_json_path("data.phase", json!("done"))
//!     .json();
//! ```

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tower::ServiceExt;

/// A request waiting to be sent to a router.
pub struct TestRequest {
    router: Router,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Body,
}

pub fn get(router: Router, uri: &str) -> TestRequest {
    TestRequest::new(router, Method::GET, uri)
}

pub fn post(router: Router, uri: &str) -> TestRequest {
    TestRequest::new(router, Method::POST, uri)
}

impl TestRequest {
    fn new(router: Router, method: Method, uri: &str) -> Self {
        Self {
            router,
            method,
            uri: uri.to_string(),
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    pub fn bearer_token(mut self, token: &str) -> Self {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header value");
        self.headers.insert(header::AUTHORIZATION, value);
        self
    }

    pub fn json_body<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Body::from(serde_json::to_vec(body).expect("body serializes"));
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    pub async fn execute(self) -> TestResponse {
        let mut request = Request::builder()
            .method(self.method)
            .uri(&self.uri)
            .body(self.body)
            .expect("request builds");
        *request.headers_mut() = self.headers;

        let response = self.router.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");

        TestResponse { status, headers, body }
    }
}

/// A buffered response from [`TestRequest::execute`].
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_accepted(self) -> Self {
        self.assert_status(StatusCode::ACCEPTED)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_conflict(self) -> Self {
        self.assert_status(StatusCode::CONFLICT)
    }

    pub fn assert_too_many_requests(self) -> Self {
        self.assert_status(StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn assert_bad_gateway(self) -> Self {
        self.assert_status(StatusCode::BAD_GATEWAY)
    }

    pub fn assert_header(self, name: &str, expected: &str) -> Self {
        let actual = self.headers.get(name).and_then(|v| v.to_str().ok());
        assert_eq!(actual, Some(expected), "header {name}");
        self
    }

    pub fn assert_json(self) -> Self {
        let content_type = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(
            content_type.starts_with("application/json"),
            "content type was {content_type:?}"
        );
        self
    }

    /// Compares the value at a dotted path. Numeric segments index arrays,
    /// so `checks.0.name` reads the first check's name.
    pub fn assert_json_path(self, path: &str, expected: Value) -> Self {
        let body: Value = self.json();
        let actual = lookup(&body, path).unwrap_or_else(|| panic!("{path} missing from {body}"));
        assert_eq!(actual, &expected, "at {path}");
        self
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("body is JSON of the expected shape")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |node, segment| match segment.parse::<usize>() {
        Ok(index) => node.get(index),
        Err(_) => node.get(segment),
    })
}
