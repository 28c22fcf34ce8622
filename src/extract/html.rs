use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href=['"]?([^'" >]+)"#).unwrap());
static SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)src=['"]?([^'" >]+)"#).unwrap());
static BLOCK_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</p\s*>|<br\s*/?>|</div\s*>|</li\s*>|</h[1-6]\s*>|</tr\s*>").unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static DANGLING_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z/!][^>]*\z").unwrap());
static MULTI_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\x0B\x0C]+").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub text: String,
    pub links: Vec<String>,
    pub images: Vec<String>,
}

/// Decode raw bytes, replacing invalid sequences, and extract.
pub fn extract_bytes(raw: &[u8]) -> Extracted {
    extract(&String::from_utf8_lossy(raw))
}

/// Tolerant scan of `html` into plain text plus link and image targets.
///
/// Paragraph structure survives as blank lines between blocks.
pub fn extract(html: &str) -> Extracted {
    let html = SCRIPT_RE.replace_all(html, "");
    let html = STYLE_RE.replace_all(&html, "");

    // attributes vanish with the tags, so collect them first
    let links = capture_all(&HREF_RE, &html);
    let images = capture_all(&SRC_RE, &html);

    let marked = BLOCK_END_RE.replace_all(&html, "\n");
    let stripped = TAG_RE.replace_all(&marked, " ");
    let stripped = DANGLING_TAG_RE.replace(&stripped, " ");

    Extracted {
        text: normalize_whitespace(&stripped),
        links,
        images,
    }
}

fn capture_all(re: &Regex, haystack: &str) -> Vec<String> {
    re.captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = MULTI_NEWLINE_RE.replace_all(&text, "\n\n");
    let text = HSPACE_RE.replace_all(&text, " ");
    let trimmed: Vec<&str> = text.split('\n').map(str::trim).collect();
    let joined = trimmed.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn assert_clean(text: &str) {
        assert!(!text.contains('<') && !text.contains('>'), "tag leaked: {text:?}");
        assert!(!text.contains("\n\n\n"), "blank run: {text:?}");
        assert_eq!(text, text.trim());
    }

    #[test]
    fn script_is_dropped() {
        let out = extract("<p>Hello World</p><script>evil()</script>");
        assert_eq!(out.text, "Hello World");
    }

    #[test]
    fn script_and_style_span_lines_and_case() {
        let html = "<STYLE type=\"text/css\">\nbody { color: red }\n</Style><p>kept</p>\
                    <Script>\nvar x = '<p>no</p>';\n</SCRIPT>";
        assert_eq!(extract(html).text, "kept");
    }

    #[test]
    fn links_and_images_in_any_quoting() {
        let html = r#"<a href="https://a.example/x">a</a><a HREF='/rel'>b</a><a href=bare>c</a>
                      <img src="/img/one.png"><img src=two.gif alt="x">"#;
        let out = extract(html);
        assert_eq!(out.links, vec!["https://a.example/x", "/rel", "bare"]);
        assert_eq!(out.images, vec!["/img/one.png", "two.gif"]);
    }

    #[test]
    fn script_src_is_not_an_image() {
        let out = extract(r#"<script src="/tracker.js"></script><img src="/cat.jpg">"#);
        assert_eq!(out.images, vec!["/cat.jpg"]);
    }

    #[test]
    fn block_tags_become_paragraph_breaks() {
        let out = extract("<div><p>First para.</p>\n\n\n<p>Second para.</p></div>");
        assert_eq!(out.text, "First para.\n\nSecond para.");
    }

    #[test]
    fn inline_tags_become_spaces() {
        let out = extract("<p>one<b>two</b>   three\tfour</p>");
        assert_eq!(out.text, "one two three four");
    }

    #[test]
    fn line_breaks_keep_lines() {
        let out = extract("line one<br>line two<br/>line three");
        assert_eq!(out.text, "line one\nline two\nline three");
    }

    #[test]
    fn carriage_returns_are_newlines() {
        let out = extract("<p>a</p>\r\n\r\n\r\n<p>b</p>");
        assert_eq!(out.text, "a\n\nb");
    }

    #[test]
    fn unclosed_markup_degrades() {
        let out = extract("<p>text before <div class=\"never closed");
        assert_eq!(out.text, "text before");
        assert_clean(&out.text);

        let out = extract("<script>alert(1)");
        assert_clean(&out.text);
    }

    #[test]
    fn comparison_operator_is_text() {
        assert_eq!(extract("<p>a < b</p>").text, "a < b");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let out = extract_bytes(b"<p>caf\xe9 ok</p>");
        assert!(out.text.starts_with("caf"));
        assert!(out.text.ends_with("ok"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract(""), Extracted::default());
        assert_eq!(extract("   <br>  \n "), Extracted::default());
    }

    #[test]
    fn article_fixture() {
        let out = extract(&fixture("article"));
        assert_clean(&out.text);
        assert!(out.text.contains("Rust Corpus Notes"));
        assert!(!out.text.contains("trackVisit"));
        assert!(!out.text.contains("font-family"));
        assert_eq!(out.links, vec!["https://example.org/about", "/archive/2024", "contact.html"]);
        assert_eq!(out.images, vec!["/static/banner.png", "diagram.svg"]);
        assert!(out.text.contains("\n\n"));
    }

    #[test]
    fn broken_fixture() {
        let out = extract(&fixture("broken"));
        assert_clean(&out.text);
        assert!(out.text.contains("Survives the mess"));
    }
}
