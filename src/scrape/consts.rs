use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: Lazy<Selector> = Lazy::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: Lazy<Regex> = Lazy::new(|| Regex::new($regex).unwrap());
    };
}

// Search result anchors, most specific first.
selector!(RESULT_VIM_FOCUS, "a.js-vim-focus.custom-a");
selector!(RESULT_MD5_HREF, "a[href*='md5']");
selector!(RESULT_BOOK_TITLE, ".book-title a");

// Download anchors inside known container structures.
selector!(LINKS_EXTERNAL_ID, "#external-downloads a");
selector!(LINKS_EXTERNAL_CLASS, ".external-downloads a");
selector!(LINKS_DATA_SECTION, "[data-section='downloads'] a");
// Anywhere on the page.
selector!(LINKS_ANYWHERE, "a[href*='libgen'], a[href*='download'], .download-link");

// "Author Name [en]"; the capture cannot cross a newline or a bracket.
regex!(AUTHOR_BEFORE_LANG, r"([^\[\n]+)\s\[[a-z]{2}\]");
regex!(AUTHOR_LINE, r"^[A-Za-z\s,.]+$");
regex!(YEAR, r"\b(19|20)\d{2}\b");
regex!(LANGUAGE, r"(\w+)\s+\[([a-z]{2})\]");
regex!(FORMAT, r"(?i)\b(EPUB|PDF|MOBI|AZW3|TXT|DOC|DOCX)\b");
regex!(SIZE, r"(\d+\.?\d*\s*[MKG]B)");
