//! DOM fact extraction.
//!
//! Selector lists mirror the class naming conventions common on storefronts:
//! `.product-image`, `.breadcrumb`, `.trust-badge` and so on. Matching is on
//! class substrings where the conventions vary.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use croscope_protocols::{
    CallToAction, CtaKind, DomFacts, FormFacts, Heading, ImageFacts, StructureMetrics, TrustKind,
    TrustSignal,
};

const CTA: &str = r#"button, input[type="submit"], input[type="button"], [role="button"], a.btn, a.button, a.cta, a[class*="btn"], a[class*="button"], a[class*="add-to-cart"], a[class*="buy"]"#;
const FORM_FIELDS: &str = "input, select, textarea";
const PRODUCT_IMAGES: &str = r#".product-image img, .product-photo img, .gallery img, .image-gallery img, [class*="product"] img"#;
const TRUST: &str = r#".trust, .security, .badge, .verified, .guarantee, .testimonial, .review, .rating, [class*="trust"], [class*="security"], [class*="verified"], [class*="testimonial"], [class*="review"], [class*="rating"]"#;
const NAV_LINKS: &str = "nav a, .menu a, .navigation a, header a";
const BREADCRUMBS: &str = r#".breadcrumb, .breadcrumbs, [class*="breadcrumb"], nav[aria-label*="breadcrumb"], nav[aria-label*="Breadcrumb"], .navigation-path"#;
const DESCRIPTIONS: &str = r#".product-description, .description, [class*="description"], .product-details, .details, .product-info"#;
const OFFERS: &str = r#".offer, .discount, .coupon, .promo, .sale, [class*="offer"], [class*="discount"], [class*="coupon"]"#;
const FAQ: &str = r#".faq, .frequently-asked, [class*="faq"], h1, h2, h3, h4, h5, h6"#;
const CONTAINERS: &str = "div, section, article";

const PROMINENT_CLASSES: &[&str] = &["primary", "main", "prominent", "hero", "cta"];
const PERSUASIVE_WORDS: &[&str] = &["buy", "get", "save", "free", "now", "today", "limited", "exclusive"];
const ACTION_WORDS: &[&str] = &["add", "shop", "order", "purchase", "subscribe"];

const MAX_CTA_TEXT: usize = 100;
const MAX_SIGNAL_TEXT: usize = 200;

/// Extract structured facts from `html` served at `page_url`.
pub fn extract(html: &str, page_url: &Url) -> DomFacts {
    let doc = Html::parse_document(html);

    DomFacts {
        title: first_text(&doc, "title"),
        meta_description: select(&doc, r#"meta[name="description"]"#)
            .first()
            .and_then(|m| m.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        headings: headings(&doc),
        ctas: ctas(&doc),
        forms: forms(&doc),
        images: images(&doc),
        trust_signals: trust_signals(&doc),
        metrics: metrics(&doc, html, page_url),
    }
}

fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => doc.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Whitespace-collapsed text content.
fn text_of(el: &ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn truncate(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    select(doc, css)
        .first()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

fn class_string(el: &ElementRef<'_>) -> String {
    el.value().classes().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn headings(doc: &Html) -> Vec<Heading> {
    select(doc, "h1, h2, h3, h4, h5, h6")
        .iter()
        .filter_map(|h| {
            let level = h.value().name().strip_prefix('h')?.parse().ok()?;
            let text = text_of(h);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn ctas(doc: &Html) -> Vec<CallToAction> {
    select(doc, CTA)
        .iter()
        .filter_map(|el| {
            let element = el.value();
            let kind = match (element.name(), element.attr("type")) {
                ("a", _) => CtaKind::Link,
                ("input", Some("submit")) | ("button", Some("submit")) => CtaKind::Submit,
                _ => CtaKind::Button,
            };
            let text = match element.name() {
                "input" => element.attr("value").unwrap_or_default().trim().to_string(),
                _ => text_of(el),
            };
            let text = if text.is_empty() {
                element.attr("aria-label").unwrap_or_default().trim().to_string()
            } else {
                text
            };
            if text.is_empty() {
                return None;
            }

            let classes = class_string(el);
            Some(CallToAction {
                prominent: PROMINENT_CLASSES.iter().any(|c| classes.contains(c)),
                persuasive: is_persuasive(&text),
                href: element.attr("href").map(str::to_string),
                text: truncate(text, MAX_CTA_TEXT),
                kind,
            })
        })
        .collect()
}

/// Urgency or value words score 10, plain action verbs 5; 10 or more reads as persuasive.
fn is_persuasive(text: &str) -> bool {
    let lower = text.to_lowercase();
    let score: usize = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            if PERSUASIVE_WORDS.contains(&w) {
                10
            } else if ACTION_WORDS.contains(&w) {
                5
            } else {
                0
            }
        })
        .sum();
    score >= 10
}

fn forms(doc: &Html) -> Vec<FormFacts> {
    let Ok(field_selector) = Selector::parse(FORM_FIELDS) else {
        return Vec::new();
    };
    select(doc, "form")
        .iter()
        .map(|form| {
            let fields: Vec<_> = form
                .select(&field_selector)
                .filter(|f| {
                    !matches!(
                        f.value().attr("type"),
                        Some("hidden") | Some("submit") | Some("button") | Some("image") | Some("reset")
                    )
                })
                .collect();
            FormFacts {
                action: form
                    .value()
                    .attr("action")
                    .filter(|a| !a.trim().is_empty())
                    .map(str::to_string),
                method: form.value().attr("method").unwrap_or("get").to_lowercase(),
                field_count: fields.len(),
                required_fields: fields.iter().filter(|f| f.value().attr("required").is_some()).count(),
            }
        })
        .collect()
}

fn images(doc: &Html) -> Vec<ImageFacts> {
    let product_nodes: HashSet<_> = select(doc, PRODUCT_IMAGES).iter().map(|el| el.id()).collect();

    select(doc, "img")
        .iter()
        .filter_map(|img| {
            let element = img.value();
            let src = element.attr("src").or_else(|| element.attr("data-src"))?.to_string();
            let alt = element.attr("alt").map(str::to_string);
            let product = product_nodes.contains(&img.id())
                || class_string(img).contains("product")
                || alt.as_deref().is_some_and(|a| a.to_lowercase().contains("product"));
            Some(ImageFacts {
                width: element.attr("width").and_then(|w| w.trim().parse().ok()),
                height: element.attr("height").and_then(|h| h.trim().parse().ok()),
                src,
                alt,
                product,
            })
        })
        .collect()
}

fn trust_signals(doc: &Html) -> Vec<TrustSignal> {
    select(doc, TRUST)
        .iter()
        .filter_map(|el| {
            let text = text_of(el);
            let kind = trust_kind(&class_string(el), &text.to_lowercase());
            (!text.is_empty()).then(|| TrustSignal {
                kind,
                text: truncate(text, MAX_SIGNAL_TEXT),
            })
        })
        .collect()
}

fn trust_kind(classes: &str, text: &str) -> TrustKind {
    let has = |needle: &str| classes.contains(needle) || text.contains(needle);
    if has("rating") || has("stars") {
        TrustKind::Rating
    } else if has("testimonial") {
        TrustKind::Testimonial
    } else if has("review") {
        TrustKind::Review
    } else if has("guarantee") || has("money back") {
        TrustKind::Guarantee
    } else if has("ssl") || has("secure") || has("security") || has("verified") {
        TrustKind::Security
    } else {
        TrustKind::Badge
    }
}

fn metrics(doc: &Html, html: &str, page_url: &Url) -> StructureMetrics {
    let styles: Vec<String> = select(doc, "style").iter().map(|s| s.text().collect()).collect();
    let inline: Vec<&str> = select(doc, "[style]")
        .iter()
        .filter_map(|el| el.value().attr("style"))
        .collect();

    StructureMetrics {
        nav_links: select(doc, NAV_LINKS).iter().filter(|a| !text_of(a).is_empty()).count(),
        has_breadcrumbs: !select(doc, BREADCRUMBS).is_empty(),
        path_depth: page_url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).count())
            .unwrap_or(0),
        font_families: font_families(&styles, &inline),
        positioned_elements: positioned_re().map_or(0, |re| inline.iter().filter(|s| re.is_match(s)).count()),
        empty_containers: select(doc, CONTAINERS)
            .iter()
            .filter(|el| el.text().all(|t| t.trim().is_empty()))
            .count(),
        has_description: !select(doc, DESCRIPTIONS).is_empty(),
        offers: select(doc, OFFERS).len(),
        has_viewport_meta: !select(doc, r#"meta[name="viewport"]"#).is_empty(),
        html_bytes: html.len(),
        script_count: select(doc, "script").len(),
        has_return_policy: return_policy_re().is_some_and(|re| {
            select(doc, "body")
                .first()
                .is_some_and(|body| re.is_match(&text_of(body)))
        }),
        has_faq: faq_re().is_some_and(|re| select(doc, FAQ).iter().any(|el| re.is_match(&text_of(el)))),
        distinct_colors: distinct_colors(&styles),
    }
}

fn font_families(styles: &[String], inline: &[&str]) -> usize {
    let Some(re) = font_family_re() else {
        return 0;
    };
    styles
        .iter()
        .map(String::as_str)
        .chain(inline.iter().copied())
        .flat_map(|css| re.captures_iter(css))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches("!important").trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

fn distinct_colors(styles: &[String]) -> usize {
    let Some(re) = color_re() else {
        return 0;
    };
    styles
        .iter()
        .flat_map(|css| re.captures_iter(css))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

fn font_family_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)font-family\s*:\s*([^;}]+)").ok()).as_ref()
}

fn positioned_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)position\s*:\s*(absolute|fixed)").ok()).as_ref()
}

fn color_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"color\s*:\s*(#[0-9a-fA-F]{6}\b|#[0-9a-fA-F]{3}\b|rgba?\([^)]+\))").ok())
        .as_ref()
}

fn return_policy_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(returns?|refunds?|guarantee)").ok()).as_ref()
}

fn faq_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)faq|frequently.{0,10}asked").ok()).as_ref()
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
