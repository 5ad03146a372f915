//! Response view built from one finished transfer.

mod content_type;

pub use content_type::parse_content_type;

use std::borrow::Cow;
use std::time::Duration;

use crate::transport::TransferInfo;

/// Status codes reported as redirects. 201 (Created) is included since it
/// carries a `Location` for the new resource.
const REDIRECT_CODES: [u32; 6] = [201, 301, 302, 303, 307, 308];

/// Final result of a scheduled request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    url: String,
    status: u32,
    content_type: Option<String>,
    charset: Option<String>,
    body: Vec<u8>,
    time: Duration,
    start: Duration,
}

impl Response {
    /// Builds the response from a completed transfer. `time` excludes the
    /// connection setup, which grows when many connections open at once.
    pub fn from_transfer(info: &TransferInfo) -> Self {
        let (content_type, charset) = match info
            .content_type
            .as_deref()
            .and_then(parse_content_type)
        {
            Some((media, charset)) => (Some(media), charset),
            None => (None, None),
        };
        Self {
            url: info.effective_url.clone(),
            status: info.status,
            content_type,
            charset,
            body: info.body.clone(),
            time: info.total_time.saturating_sub(info.connect_time),
            start: info.connect_time,
        }
    }

    /// Effective URL after redirects.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Transfer time minus connection setup.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Connection setup time.
    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        REDIRECT_CODES.contains(&self.status)
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    #[cfg(test)]
    pub(crate) fn for_status(status: u32) -> Self {
        Self {
            url: "https://example.com/".to_string(),
            status,
            content_type: None,
            charset: None,
            body: Vec::new(),
            time: Duration::ZERO,
            start: Duration::ZERO,
        }
    }
}
