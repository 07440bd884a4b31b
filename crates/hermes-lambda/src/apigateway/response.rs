//! Response formatters.
//!
//! Each factory takes [`ResponseOptions`] and returns a pure function from
//! handler data to an [`ApiGatewayProxyResponse`]. No state is shared between
//! calls.
//!
//! | Formatter | Input | Default status | `Content-Type` |
//! |-----------|-------|----------------|----------------|
//! | [`response_json`] | any `Serialize` | 200 | `application/json` |
//! | [`response_html`] | `String` | 200 | `text/html` |
//! | [`response_media_file`] | bytes | 200 | `application/octet-stream` |
//! | [`response_redirect`] | URL | 302 | none (`Location` is set) |

use super::ApiGatewayProxyResponse;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::Serialize;

/// The `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// The `Location` header name.
pub const LOCATION: &str = "Location";

/// `Content-Type` of JSON responses.
pub const HEADER_TYPE_JSON: &str = "application/json";

/// `Content-Type` of HTML responses.
pub const HEADER_TYPE_HTML: &str = "text/html";

/// `Content-Type` of binary responses.
pub const HEADER_TYPE_OCTET: &str = "application/octet-stream";

/// `Content-Type` of plain-text responses.
pub const HEADER_TYPE_PLAIN: &str = "text/plain";

const DOCTYPE: &str = "<!DOCTYPE html>";

/// Options shared by every formatter.
///
/// Extra headers are merged over the formatter's own headers, so a caller
/// can replace `Content-Type` by passing it explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseOptions {
    status_code: Option<u16>,
    content_type: Option<String>,
    headers: IndexMap<String, String>,
    multi_value_headers: Option<IndexMap<String, Vec<String>>>,
    is_base64_encoded: Option<bool>,
    cookies: Option<Vec<String>>,
}

impl ResponseOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    #[must_use]
    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Replaces the formatter's default `Content-Type`.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a multi-value header.
    #[must_use]
    pub fn multi_value_header(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.multi_value_headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), values);
        self
    }

    /// Sets `isBase64Encoded` explicitly.
    #[must_use]
    pub fn base64_encoded(mut self, encoded: bool) -> Self {
        self.is_base64_encoded = Some(encoded);
        self
    }

    /// Adds a `Set-Cookie` value.
    #[must_use]
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.get_or_insert_with(Vec::new).push(cookie.into());
        self
    }

    fn build(
        &self,
        default_status: u16,
        default_content_type: Option<&str>,
        body: String,
    ) -> ApiGatewayProxyResponse {
        let mut headers = IndexMap::new();
        if let Some(content_type) = self.content_type.as_deref().or(default_content_type) {
            headers.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        }
        headers.extend(self.headers.clone());

        ApiGatewayProxyResponse {
            status_code: self.status_code.unwrap_or(default_status),
            headers,
            multi_value_headers: self.multi_value_headers.clone(),
            body,
            is_base64_encoded: self.is_base64_encoded,
            cookies: self.cookies.clone(),
        }
    }
}

/// Serializes handler data as a JSON body.
pub fn response_json<T: Serialize + 'static>(
    options: ResponseOptions,
) -> impl Fn(T) -> anyhow::Result<ApiGatewayProxyResponse> + Clone + Send + Sync + 'static {
    move |data| {
        let body = serde_json::to_string(&data)?;
        Ok(options.build(200, Some(HEADER_TYPE_JSON), body))
    }
}

/// Wraps an HTML document, adding the doctype when it is missing.
pub fn response_html(
    options: ResponseOptions,
) -> impl Fn(String) -> anyhow::Result<ApiGatewayProxyResponse> + Clone + Send + Sync + 'static {
    move |html| {
        let body = if has_doctype(&html) {
            html
        } else {
            format!("{DOCTYPE}{html}")
        };
        Ok(options.build(200, Some(HEADER_TYPE_HTML), body))
    }
}

/// Base64-encodes a binary payload.
///
/// The response is marked `isBase64Encoded` unless the options say otherwise.
pub fn response_media_file<T: AsRef<[u8]> + 'static>(
    options: ResponseOptions,
) -> impl Fn(T) -> anyhow::Result<ApiGatewayProxyResponse> + Clone + Send + Sync + 'static {
    move |bytes| {
        let mut response = options.build(200, Some(HEADER_TYPE_OCTET), STANDARD.encode(bytes));
        response.is_base64_encoded.get_or_insert(true);
        Ok(response)
    }
}

/// Redirects to the URL returned by the handler.
pub fn response_redirect(
    options: ResponseOptions,
) -> impl Fn(String) -> anyhow::Result<ApiGatewayProxyResponse> + Clone + Send + Sync + 'static {
    move |url| {
        let mut response = options.build(302, None, String::new());
        let mut headers = IndexMap::from([(LOCATION.to_string(), url)]);
        headers.extend(response.headers);
        response.headers = headers;
        Ok(response)
    }
}

fn has_doctype(html: &str) -> bool {
    html.trim_start()
        .get(..DOCTYPE.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(DOCTYPE))
}
