use scraper::{ElementRef, Html};

const BLOCK_ELEMENTS: [&str; 19] = [
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "ul",
    "ol",
    "table",
    "tr",
    "article",
    "section",
    "header",
    "figure",
    "figcaption",
];

/// Elements whose content never reaches the text output.
const SKIPPED_ELEMENTS: [&str; 7] = ["head", "script", "style", "noscript", "template", "svg", "iframe"];

/// Configuration for plain text output
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Preserve paragraph structure with blank lines between blocks
    pub preserve_paragraphs: bool,

    /// Wrap lines at specified width (0 = no wrapping)
    pub line_width: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { preserve_paragraphs: true, line_width: 0 }
    }
}

/// Plain text formatter for converting archived HTML to readable text
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Convert HTML content to plain text
    pub fn convert(&self, html: &str) -> String {
        convert_to_text(html, &self.config)
    }
}

/// Convert HTML content to plain text with specified configuration
pub fn convert_to_text(html: &str, config: &TextConfig) -> String {
    let text = if config.preserve_paragraphs { extract_text_with_paragraphs(html) } else { extract_plain_text(html) };

    let final_text = if config.line_width > 0 { wrap_text(&text, config.line_width) } else { text };

    final_text.trim().to_string()
}

/// Extract plain text from HTML, stripping all tags
fn extract_plain_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut writer = TextWriter::default();
    for text in document.root_element().text() {
        writer.push_text(text);
    }
    writer.out
}

/// Extract text from HTML while preserving paragraph structure
fn extract_text_with_paragraphs(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut writer = TextWriter::default();
    walk(document.root_element(), &mut writer);
    writer.out
}

fn walk(element: ElementRef<'_>, writer: &mut TextWriter) {
    let tag_name = element.value().name();

    if SKIPPED_ELEMENTS.contains(&tag_name) {
        return;
    }

    match tag_name {
        "br" => {
            writer.request_newlines(1);
            return;
        }
        "hr" => {
            writer.request_newlines(2);
            writer.push_word("---");
            writer.request_newlines(2);
            return;
        }
        "pre" => {
            writer.request_newlines(2);
            writer.push_preformatted(&element.text().collect::<String>());
            writer.request_newlines(2);
            return;
        }
        "li" => {
            writer.request_newlines(1);
            writer.push_word("*");
            writer.pending_space = true;
        }
        "td" | "th" => writer.pending_space = true,
        _ => {}
    }

    let is_block = BLOCK_ELEMENTS.contains(&tag_name);
    if is_block {
        writer.request_newlines(2);
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            writer.push_text(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            walk(child_element, writer);
        }
    }

    if is_block {
        writer.request_newlines(2);
    } else if tag_name == "li" {
        writer.request_newlines(1);
    }
}

/// Accumulates words, collapsing whitespace and deferring line breaks until
/// the next word so that trailing breaks never pile up.
#[derive(Default)]
struct TextWriter {
    out: String,
    pending_newlines: usize,
    pending_space: bool,
}

impl TextWriter {
    fn request_newlines(&mut self, count: usize) {
        self.pending_newlines = self.pending_newlines.max(count);
    }

    fn push_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }

        for word in text.split_whitespace() {
            self.push_word(word);
            self.pending_space = true;
        }

        if !text.is_empty() && !text.ends_with(char::is_whitespace) {
            self.pending_space = false;
        }
    }

    fn push_word(&mut self, word: &str) {
        self.flush_separator();
        self.out.push_str(word);
    }

    fn push_preformatted(&mut self, text: &str) {
        let text = text.trim_matches('\n');
        if text.is_empty() {
            return;
        }
        self.flush_separator();
        self.out.push_str(text);
    }

    fn flush_separator(&mut self) {
        if !self.out.is_empty() {
            if self.pending_newlines > 0 {
                let trimmed_len = self.out.trim_end_matches(' ').len();
                self.out.truncate(trimmed_len);
                self.out.push_str(&"\n".repeat(self.pending_newlines));
            } else if self.pending_space && !self.out.ends_with(['\n', ' ']) {
                self.out.push(' ');
            }
        }
        self.pending_newlines = 0;
        self.pending_space = false;
    }
}

/// Wrap text to specified line width, keeping existing line breaks
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    text.lines()
        .map(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() { String::new() } else { wrap_words(&words, width) }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap a slice of words to specified width
fn wrap_words(words: &[&str], width: usize) -> String {
    let mut lines = Vec::new();
    let mut current_line = Vec::new();
    let mut current_length = 0;

    for &word in words {
        let word_len = word.chars().count();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}
