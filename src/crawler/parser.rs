//! HTML parser for category listings and film pages
//!
//! This module handles parsing wiki markup to extract:
//! - Candidate titles and the next-page link from category listings
//! - Poster, description and genre signals from film pages

use crate::checkpoint::DetailInfo;
use crate::CrawlError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Minimum length of a paragraph used as a description
const MIN_DESCRIPTION_CHARS: usize = 60;

/// Infobox images narrower than this are icons, not posters
const MIN_POSTER_WIDTH: u32 = 50;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect("static selector is valid"));
    };
}

selector!(MW_PAGES, "#mw-pages");
selector!(MW_CONTENT, "#mw-content-text");
selector!(FIRST_HEADING, "#firstHeading");
selector!(LIST_ITEM, "li");
selector!(LINK, "a[href]");
selector!(REL_NEXT, "a[rel~='next'][href]");
selector!(GENRE_LABEL, ".genre");
selector!(INFOBOX, "table.infobox");
selector!(INFOBOX_IMG, "table.infobox img");
selector!(INFOBOX_ROW, "table.infobox tr");
selector!(ROW_HEADER, "th");
selector!(ROW_CELL, "td");
selector!(PARSER_OUTPUT, ".mw-parser-output");
selector!(PARAGRAPH, "div.mw-parser-output > p");
selector!(OG_IMAGE, "meta[property='og:image']");
selector!(OG_DESCRIPTION, "meta[property='og:description']");
selector!(OG_ANY, "meta[property^='og:']");
selector!(CATLINK, "#catlinks a");

#[allow(clippy::expect_used)]
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*(?:\d+|[a-z]|note \d+|citation needed)\s*\]")
        .expect("citation regex is valid")
});

/// A title listed on a category page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntity {
    pub title: String,

    /// Absolute URL of the film's page
    pub detail_url: String,

    /// Listing labels: the page heading plus any genre labels on the item
    pub labels: Vec<String>,
}

/// Contents of one category listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPage {
    pub entities: Vec<CandidateEntity>,

    /// Absolute URL of the next listing page, if any
    pub next_page: Option<String>,
}

/// Parses a category listing page
///
/// # Rules
///
/// - A page with neither `#mw-pages` nor `#mw-content-text` is not a category
///   page and fails with a parse error
/// - A category page without `#mw-pages` lists nothing
/// - Entities are the first `a[href]` of each `#mw-pages li` with non-empty text
/// - The next page is the `#mw-pages` anchor reading "next page", or `a[rel=next]`
///
/// # Arguments
///
/// * `html` - The page body
/// * `page_url` - The URL the page was fetched from, used to resolve links
pub fn parse_category_page(html: &str, page_url: &str) -> Result<CategoryPage, CrawlError> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);

    let mw_pages = document.select(&MW_PAGES).next();
    if mw_pages.is_none() && document.select(&MW_CONTENT).next().is_none() {
        return Err(parse_error(
            page_url,
            "not a category page (no #mw-pages or #mw-content-text)",
        ));
    }

    let Some(mw_pages) = mw_pages else {
        return Ok(CategoryPage::default());
    };

    let page_labels: Vec<String> = document
        .select(&FIRST_HEADING)
        .next()
        .map(element_text)
        .filter(|heading| !heading.is_empty())
        .into_iter()
        .collect();

    let mut entities = Vec::new();
    for item in mw_pages.select(&LIST_ITEM) {
        let Some(anchor) = item.select(&LINK).next() else {
            continue;
        };

        let title = element_text(anchor);
        let detail_url = anchor.value().attr("href").and_then(|h| resolve_link(h, &base));
        let Some(detail_url) = detail_url.filter(|_| !title.is_empty()) else {
            continue;
        };

        let mut labels = page_labels.clone();
        labels.extend(item.select(&GENRE_LABEL).filter_map(|genre| {
            let label = genre
                .value()
                .attr("title")
                .map(normalize_whitespace)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| element_text(genre));
            Some(label).filter(|l| !l.is_empty())
        }));

        entities.push(CandidateEntity {
            title,
            detail_url,
            labels,
        });
    }

    let next_page = mw_pages
        .select(&LINK)
        .find(|a| element_text(*a).eq_ignore_ascii_case("next page"))
        .or_else(|| document.select(&REL_NEXT).next())
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_link(href, &base));

    Ok(CategoryPage {
        entities,
        next_page,
    })
}

/// Parses a film page into its poster, description and genre signals
///
/// # Rules
///
/// - **poster**: first infobox image that is not a `data:` URI and is at least
///   50px wide when a width is declared; falls back to `og:image`
/// - **description**: first top-level paragraph with at least 60 characters
///   once citation markers are removed; falls back to `og:description`
/// - **genres**: the infobox "Genre" row, split per entry, plus the page's
///   category links
///
/// A page with no infobox, no `.mw-parser-output` and no `og:` metadata fails
/// with a parse error.
pub fn parse_detail_page(html: &str, page_url: &str) -> Result<DetailInfo, CrawlError> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);

    let has_infobox = document.select(&INFOBOX).next().is_some();
    let has_content = document.select(&PARSER_OUTPUT).next().is_some();
    let has_og = document.select(&OG_ANY).next().is_some();
    if !has_infobox && !has_content && !has_og {
        return Err(parse_error(
            page_url,
            "no infobox, article body or og metadata",
        ));
    }

    let poster_url = extract_poster(&document, &base);
    let description = extract_description(&document);
    let genres = extract_genres(&document);

    Ok(DetailInfo::new(poster_url, description, genres))
}

fn extract_poster(document: &Html, base: &Url) -> Option<String> {
    let infobox_image = document
        .select(&INFOBOX_IMG)
        .filter(|img| {
            img.value()
                .attr("width")
                .and_then(|w| w.trim().trim_end_matches("px").parse::<u32>().ok())
                .map_or(true, |width| width >= MIN_POSTER_WIDTH)
        })
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))
        .and_then(|src| resolve_image(src, base));

    infobox_image.or_else(|| meta_content(document, &OG_IMAGE))
}

fn extract_description(document: &Html) -> Option<String> {
    document
        .select(&PARAGRAPH)
        .map(|p| strip_citations(&p.text().collect::<String>()))
        .find(|text| text.chars().count() >= MIN_DESCRIPTION_CHARS)
        .or_else(|| meta_content(document, &OG_DESCRIPTION).map(|d| strip_citations(&d)))
}

fn extract_genres(document: &Html) -> Vec<String> {
    let mut genres = Vec::new();

    for row in document.select(&INFOBOX_ROW) {
        let is_genre_row = row
            .select(&ROW_HEADER)
            .next()
            .map(|th| element_text(th).eq_ignore_ascii_case("genre"))
            .unwrap_or(false);
        if !is_genre_row {
            continue;
        }
        if let Some(cell) = row.select(&ROW_CELL).next() {
            // text nodes split at <br> and list items; commas separate the rest
            for fragment in cell.text() {
                genres.extend(
                    fragment
                        .split([',', '\n'])
                        .map(normalize_whitespace)
                        .filter(|g| !g.is_empty()),
                );
            }
        }
    }

    genres.extend(
        document
            .select(&CATLINK)
            .map(element_text)
            .filter(|c| !c.is_empty()),
    );

    genres
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(normalize_whitespace)
        .filter(|c| !c.is_empty())
}

/// Resolves an image source; protocol-relative sources are forced to https
fn resolve_image(src: &str, base: &Url) -> Option<String> {
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    resolve_link(src, base)
}

/// Resolves a link against the page URL, keeping only http(s) targets
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn strip_citations(text: &str) -> String {
    normalize_whitespace(&CITATION.replace_all(text, ""))
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_base(page_url: &str) -> Result<Url, CrawlError> {
    Url::parse(page_url).map_err(|e| parse_error(page_url, &format!("invalid page URL: {}", e)))
}

fn parse_error(url: &str, message: &str) -> CrawlError {
    CrawlError::Parse {
        url: url.to_string(),
        message: message.to_string(),
    }
}
