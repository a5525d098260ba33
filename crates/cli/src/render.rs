use docbot_archive::ClassDoc;
use docbot_indexer::AmbiguousNameError;
use serde::Serialize;
use std::sync::Arc;

pub(crate) const NOT_FOUND_REPLY: &str = "Sorry, I never heard of that class.";

/// Outcome of one lookup, ready to be printed as chat text or JSON
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum Reply {
    Found { query: String, doc: Arc<ClassDoc> },
    NotFound { query: String },
    Ambiguous { query: String, candidates: Vec<String> },
}

impl Reply {
    pub(crate) fn from_lookup(
        query: &str,
        result: Result<Option<Arc<ClassDoc>>, AmbiguousNameError>,
    ) -> Self {
        let query = query.to_string();
        match result {
            Ok(Some(doc)) => Self::Found { query, doc },
            Ok(None) => Self::NotFound { query },
            Err(err) => Self::Ambiguous {
                query,
                candidates: err.candidates,
            },
        }
    }

    pub(crate) fn text(&self) -> String {
        match self {
            Self::Found { doc, .. } => render_doc(doc),
            Self::NotFound { .. } => NOT_FOUND_REPLY.to_string(),
            Self::Ambiguous { candidates, .. } => {
                format!("Which one do you mean? ({})", candidates.join(", "))
            }
        }
    }
}

/// Short chat reply: header, first sentence, link.
pub(crate) fn render_doc(doc: &ClassDoc) -> String {
    let mut header = format!("{} {}", doc.kind.as_str(), doc.name.full);
    if doc.deprecated {
        header.push_str(" [deprecated]");
    }
    if let Some(since) = &doc.since {
        header.push_str(&format!(" (since {since})"));
    }

    let mut lines = vec![header];
    let summary = first_sentence(&doc.description);
    if !summary.is_empty() {
        lines.push(summary);
    }
    if let Some(url) = &doc.url {
        lines.push(url.clone());
    }
    lines.join("\n")
}

/// Text up to and including the first period that ends a sentence, whitespace collapsed
pub(crate) fn first_sentence(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '.' && chars.peek().map_or(true, |(_, next)| *next == ' ') {
            return collapsed[..=idx].to_string();
        }
    }
    collapsed
}
