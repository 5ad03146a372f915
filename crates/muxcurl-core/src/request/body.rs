//! Request body: raw bytes or urlencoded form fields.

/// Body sent with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    /// Pre-serialized payload sent as is.
    Raw(Vec<u8>),
    /// Form fields, sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Raw(bytes) => bytes.is_empty(),
            Body::Form(fields) => fields.is_empty(),
        }
    }

    /// Serialized bytes, or `None` when there is nothing to send.
    pub fn encode(&self) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }
        match self {
            Body::Empty => None,
            Body::Raw(bytes) => Some(bytes.clone()),
            Body::Form(fields) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields.iter())
                    .finish();
                Some(encoded.into_bytes())
            }
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Raw(s.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Raw(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Raw(bytes)
    }
}
