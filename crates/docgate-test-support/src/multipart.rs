//! Hand-rolled `multipart/form-data` bodies for router tests.

/// Builder for a multipart body with a fixed boundary.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    /// Start a new body with a fixed test boundary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: "docgate-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    /// Append a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Append a file part.
    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Finish the body, returning the `Content-Type` header value and the
    /// encoded bytes.
    #[must_use]
    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_fields_and_terminator() {
        let (content_type, body) = MultipartBody::new()
            .text("pages", "1-2")
            .file("file", "a.pdf", "application/pdf", b"%PDF")
            .build();
        let rendered = String::from_utf8_lossy(&body);
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert!(rendered.contains("name=\"pages\""));
        assert!(rendered.contains("filename=\"a.pdf\""));
        assert!(rendered.ends_with("--docgate-test-boundary--\r\n"));
    }
}
