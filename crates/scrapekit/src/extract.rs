//! Readable-content extraction from raw HTML
//!
//! Strips code and page chrome, picks the most likely content container,
//! flattens it to lines of text and rebuilds a paragraph-only HTML body.
//! Never fails; odd input yields less (or no) content.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

/// Maximum length of a title derived from the first paragraph
const FALLBACK_TITLE_CHARS: usize = 200;

/// Class tokens that mark sidebar navigation
const SIDEBAR_CLASSES: &[&str] = &["sidebar", "leftbar", "left-nav", "leftnavbar"];

/// Elements whose boundaries start a new line of text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "body", "caption", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hr", "html", "li", "main", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

static TITLE: LazyLock<Selector> = LazyLock::new(|| parse_selector("title"));
static CODE: LazyLock<Selector> = LazyLock::new(|| parse_selector("script, style, noscript"));
static MAIN: LazyLock<Selector> = LazyLock::new(|| parse_selector("main"));
static ARTICLE: LazyLock<Selector> = LazyLock::new(|| parse_selector("article"));
static DIV: LazyLock<Selector> = LazyLock::new(|| parse_selector("div"));
static CHROME: LazyLock<Selector> = LazyLock::new(|| {
    let classes: Vec<String> = SIDEBAR_CLASSES.iter().map(|c| format!(".{c}")).collect();
    parse_selector(&format!("nav, aside, {}", classes.join(", ")))
});
static PAGINATION_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:previous|next)\b").expect("static regex"));

fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Output of [`extract`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Cleaned body, one `<p>` per line of text
    pub content_html: String,
    /// `<title>` text, or the start of the first paragraph
    pub title: String,
    /// `lang` attribute of the document root
    pub language: Option<String>,
}

/// Extract readable content, title and language from an HTML document.
pub fn extract(html: &str) -> Extracted {
    let mut document = Html::parse_document(html);

    let title = document
        .root_element()
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();
    let language = document_language(&document);

    remove_matching(&mut document, &CODE);
    remove_matching(&mut document, &CHROME);

    let root = document.root_element();
    let main = select_main(root);

    let mut text = String::new();
    collect_text(main, &mut text);
    let text = PAGINATION_WORDS.replace_all(&text, "");

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let content_html: String = lines
        .iter()
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect();

    let title = if title.is_empty() {
        lines
            .first()
            .map(|line| line.chars().take(FALLBACK_TITLE_CHARS).collect())
            .unwrap_or_default()
    } else {
        title
    };

    Extracted {
        content_html,
        title,
        language,
    }
}

fn document_language(document: &Html) -> Option<String> {
    let root = document.root_element().value();
    root.attr("lang")
        .or_else(|| root.attr("xml:lang"))
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// Detach every element matching `selector` from the tree.
fn remove_matching(document: &mut Html, selector: &Selector) {
    // Html::select walks the whole arena including detached nodes, so
    // matching is scoped to the attached tree under the root element.
    let ids: Vec<_> = document
        .root_element()
        .select(selector)
        .map(|el| el.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// `<main>`, else `<article>`, else the div with the most text, else `root`.
fn select_main(root: ElementRef<'_>) -> ElementRef<'_> {
    if let Some(main) = root.select(&MAIN).next() {
        return main;
    }
    if let Some(article) = root.select(&ARTICLE).next() {
        return article;
    }

    root.select(&DIV)
        .fold(None::<(usize, ElementRef)>, |best, div| {
            let len = div.text().map(|t| t.chars().count()).sum::<usize>();
            match best {
                Some((best_len, _)) if best_len >= len => best,
                _ => Some((len, div)),
            }
        })
        .map(|(_, div)| div)
        .unwrap_or(root)
}

/// Append the text under `element`, breaking lines at block boundaries.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                let block = BLOCK_ELEMENTS.contains(&name);
                if block || name == "br" {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
