//! Comment request bodies

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub incident_id: String,
    pub markdown_to_html: bool,
    pub text: String,
}

impl NewComment {
    /// Plain-text comment
    pub fn new(incident_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { incident_id: incident_id.into(), markdown_to_html: false, text: text.into() }
    }

    pub fn markdown(mut self) -> Self {
        self.markdown_to_html = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRef {
    pub comment_id: String,
}

impl CommentRef {
    pub fn new(comment_id: impl Into<String>) -> Self {
        Self { comment_id: comment_id.into() }
    }
}
