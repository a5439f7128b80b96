use std::fmt;

use regex::Regex;

/// Kind of Instagram link the backend knows how to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Post,
    Story { username: String },
}

impl MediaKind {
    /// Classify a link by its path: `/p/` is a post,
    /// `/stories/<user>/` is a story. Anything else is unsupported.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        if url.contains("/p/") {
            return Some(Self::Post);
        }

        let re = Regex::new(r"/stories/([^/?#]+)").ok()?;
        re.captures(url).map(|caps| Self::Story {
            username: caps[1].to_string(),
        })
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Post => write!(f, "post"),
            MediaKind::Story { username } => write!(f, "story by {}", username),
        }
    }
}
