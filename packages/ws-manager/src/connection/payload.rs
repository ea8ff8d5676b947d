//! Inbound message payloads
//!
//! Payloads are passed to listeners exactly as the transport delivered them.
//! Nothing in this crate interprets their contents.

/// Body of a single inbound data message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame
    Text(String),
    /// Binary frame
    Binary(Vec<u8>),
}

impl Payload {
    /// Borrow the payload as text, if it arrived as a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }

    /// Size of the payload in bytes
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Binary(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_accessors() {
        let payload = Payload::from("ping");
        assert!(payload.is_text());
        assert_eq!(payload.as_text(), Some("ping"));
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn test_binary_is_not_text() {
        let payload = Payload::from(vec![0u8, 159, 146, 150]);
        assert!(!payload.is_text());
        assert_eq!(payload.as_text(), None);
        assert_eq!(payload.len(), 4);
        assert!(!payload.is_empty());
    }
}
