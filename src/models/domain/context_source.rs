use std::path::Path;

/// Document formats the loader can turn into text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Markdown,
}

impl DocumentKind {
    /// Picks a kind from the declared content type, falling back to the file
    /// extension when the content type is missing or generic.
    pub fn detect(content_type: Option<&str>, filename: Option<&str>) -> Option<Self> {
        let from_mime = content_type.and_then(|ct| {
            let essence = ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase();
            match essence.as_str() {
                "application/pdf" => Some(DocumentKind::Pdf),
                "text/plain" => Some(DocumentKind::PlainText),
                "text/markdown" | "text/x-markdown" => Some(DocumentKind::Markdown),
                _ => None,
            }
        });

        from_mime.or_else(|| {
            let extension = Path::new(filename?)
                .extension()?
                .to_str()?
                .to_ascii_lowercase();
            match extension.as_str() {
                "pdf" => Some(DocumentKind::Pdf),
                "txt" | "text" => Some(DocumentKind::PlainText),
                "md" | "markdown" => Some(DocumentKind::Markdown),
                _ => None,
            }
        })
    }
}

/// Input accepted by context ingestion.
#[derive(Clone, Debug)]
pub enum ContextSource {
    Document {
        filename: Option<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
    Transcript {
        url: String,
    },
}

impl ContextSource {
    pub fn describe(&self) -> String {
        match self {
            ContextSource::Document { filename, .. } => filename
                .clone()
                .unwrap_or_else(|| "uploaded document".to_string()),
            ContextSource::Transcript { url } => url.clone(),
        }
    }
}
