//! Inbound request context.
//!
//! Passed explicitly to report providers instead of being read from
//! ambient per-request state.

use std::collections::HashMap;

use url::Url;

use crate::error::{ReportError, ReportResult};

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

/// The parts of the current HTTP request a report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    scheme: String,
    /// Host with optional port, e.g. `crm.example.com:8443`.
    host: String,
    /// Mount point of the application, empty or starting with `/`.
    path_base: String,
    /// Header names are stored lower-case.
    headers: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.into(),
            path_base: String::new(),
            headers: HashMap::new(),
        }
    }

    /// Build a context from an absolute URL; the URL path becomes the path base.
    ///
    /// Credentials, query and fragment are dropped. Default ports are
    /// omitted from the host.
    pub fn parse(raw: &str) -> ReportResult<Self> {
        let url = Url::parse(raw).map_err(|e| ReportError::InvalidRequestUrl(e.to_string()))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                ReportError::InvalidRequestUrl(format!("{} url has no host", url.scheme()))
            })?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self::new(url.scheme(), &host).with_path_base(url.path()))
    }

    pub fn with_path_base(mut self, path_base: &str) -> Self {
        let trimmed = path_base.trim_matches('/');
        self.path_base = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.trim().to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path_base(&self) -> &str {
        &self.path_base
    }

    /// Base URL of the application, without a trailing slash.
    ///
    /// `X-Forwarded-Proto` and `X-Forwarded-Host` override the request's
    /// own scheme and host; only their first entry is used.
    pub fn base_application_url(&self) -> String {
        let first = |name: &str| {
            self.header(name)
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let scheme = first(FORWARDED_PROTO).unwrap_or(&self.scheme);
        let host = first(FORWARDED_HOST).unwrap_or(&self.host);
        format!("{}://{}{}", scheme.to_ascii_lowercase(), host, self.path_base)
    }
}
