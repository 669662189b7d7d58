//! The extracted document and its accessor options.

use crate::filters::filter_unicode;
use crate::ole::doc::Bookmark;

/// Options controlling what the accessors return.
///
/// The default enables everything: unicode punctuation is flattened to
/// ASCII, footers ride along with headers, and textboxes from both the body
/// and the headers are included.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Convert common Unicode punctuation (smart quotes, dashes, wide
    /// spaces) to ASCII equivalents
    pub filter_unicode: bool,
    /// Append footers to the value returned by [`Document::headers`]
    pub include_footers: bool,
    /// Include header/footer textboxes in [`Document::textboxes`]
    pub include_headers_and_footers: bool,
    /// Include body textboxes in [`Document::textboxes`]
    pub include_body: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            filter_unicode: true,
            include_footers: true,
            include_headers_and_footers: true,
            include_body: true,
        }
    }
}

/// The text of one Word document, partitioned into semantic regions.
///
/// The raw region strings are public; the accessor methods apply the
/// optional filtering described by [`ExtractOptions`].
///
/// # Examples
///
/// ```no_run
/// use longan::ExtractOptions;
///
/// let doc = longan::extract("report.doc")?;
/// println!("{}", doc.body(&ExtractOptions::default()));
/// # Ok::<(), longan::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub body: String,
    pub footnotes: String,
    pub endnotes: String,
    pub headers: String,
    pub footers: String,
    pub annotations: String,
    pub textboxes: String,
    pub header_textboxes: String,
    /// Bookmarks found in the document (legacy format only)
    pub bookmarks: Vec<Bookmark>,
}

impl Document {
    fn filtered(&self, value: &str, opts: &ExtractOptions) -> String {
        if opts.filter_unicode {
            filter_unicode(value)
        } else {
            value.to_string()
        }
    }

    /// The main body text.
    pub fn body(&self, opts: &ExtractOptions) -> String {
        self.filtered(&self.body, opts)
    }

    /// Footnote text.
    pub fn footnotes(&self, opts: &ExtractOptions) -> String {
        self.filtered(&self.footnotes, opts)
    }

    /// Endnote text.
    pub fn endnotes(&self, opts: &ExtractOptions) -> String {
        self.filtered(&self.endnotes, opts)
    }

    /// Header text, optionally with footers appended.
    pub fn headers(&self, opts: &ExtractOptions) -> String {
        let mut value = self.headers.clone();
        if opts.include_footers {
            value.push_str(&self.footers);
        }
        self.filtered(&value, opts)
    }

    /// Footer text on its own.
    pub fn footers(&self, opts: &ExtractOptions) -> String {
        self.filtered(&self.footers, opts)
    }

    /// Comment/annotation text.
    pub fn annotations(&self, opts: &ExtractOptions) -> String {
        self.filtered(&self.annotations, opts)
    }

    /// Textbox content, joined with newlines per the include flags.
    pub fn textboxes(&self, opts: &ExtractOptions) -> String {
        let mut parts = Vec::new();
        if opts.include_body {
            parts.push(self.textboxes.as_str());
        }
        if opts.include_headers_and_footers {
            parts.push(self.header_textboxes.as_str());
        }
        self.filtered(&parts.join("\n"), opts)
    }

    /// Bookmarks recorded in the document.
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }
}
