//! Structural CRO framework.
//!
//! Scores five categories from DOM facts alone. Each category starts at 100
//! and loses fixed points per failed check; the overall score is the integer
//! mean of the five.

use croscope_protocols::{
    CategoryAssessment, DomFacts, FrameworkCategory, Priority, Recommendation, StructuralReport,
};

/// Source attribution for recommendations produced here.
pub const SOURCE: &str = "structural";

const MAX_NAV_LINKS: usize = 15;
const MAX_PATH_DEPTH: usize = 4;
const MAX_FONT_FAMILIES: usize = 2;
const MAX_POSITIONED: usize = 5;
const MAX_EMPTY_CONTAINERS: usize = 10;
const MAX_TITLE_CHARS: usize = 60;
const MIN_PRODUCT_IMAGES: usize = 2;
const MIN_TRUST_SIGNALS: usize = 2;
const MAX_COLORS: usize = 8;
const MAX_HTML_BYTES: usize = 1_500_000;
const MAX_SCRIPTS: usize = 40;

/// Run the framework. `None` when the DOM carries nothing to score.
pub fn analyze(dom: &DomFacts) -> Option<StructuralReport> {
    if dom.is_empty() {
        return None;
    }

    let categories = vec![
        navigation(dom),
        display(dom),
        information(dom),
        technical(dom),
        psychological(dom),
    ];
    let total: u32 = categories.iter().map(|c| u32::from(c.score)).sum();
    let overall_score = (total / categories.len() as u32) as u8;

    Some(StructuralReport {
        overall_score,
        categories,
    })
}

struct Assessor {
    category: FrameworkCategory,
    score: u8,
    issues: Vec<String>,
    strengths: Vec<String>,
    recommendations: Vec<Recommendation>,
}

impl Assessor {
    fn new(category: FrameworkCategory) -> Self {
        Self {
            category,
            score: 100,
            issues: Vec::new(),
            strengths: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn penalize(&mut self, points: u8, issue: impl Into<String>) -> &mut Self {
        self.score = self.score.saturating_sub(points);
        self.issues.push(issue.into());
        self
    }

    fn recommend(
        &mut self,
        category: FrameworkCategory,
        priority: Priority,
        issue: impl Into<String>,
        solution: &str,
        impact: &str,
    ) {
        self.recommendations.push(Recommendation {
            category: category.as_str().to_string(),
            priority,
            issue: issue.into(),
            solution: solution.to_string(),
            impact: Some(impact.to_string()),
            source: SOURCE.to_string(),
        });
    }

    fn strength(&mut self, text: impl Into<String>) {
        self.strengths.push(text.into());
    }

    fn finish(self) -> CategoryAssessment {
        CategoryAssessment {
            category: self.category,
            score: self.score,
            issues: self.issues,
            strengths: self.strengths,
            recommendations: self.recommendations,
        }
    }
}

fn navigation(dom: &DomFacts) -> CategoryAssessment {
    use FrameworkCategory::Navigation;
    let m = &dom.metrics;
    let mut a = Assessor::new(Navigation);

    if m.has_breadcrumbs {
        a.strength("Breadcrumb navigation present");
    } else {
        a.penalize(20, "No breadcrumb navigation found").recommend(
            Navigation,
            Priority::Medium,
            "Missing breadcrumb navigation",
            "Add breadcrumb navigation to help users understand their location",
            "Could reduce bounce rate by 5-10%",
        );
    }

    if m.nav_links > MAX_NAV_LINKS {
        a.penalize(15, format!("Too many navigation links ({})", m.nav_links))
            .recommend(
                Navigation,
                Priority::Medium,
                format!("Navigation has {} links", m.nav_links),
                "Simplify navigation to 7-12 main links, use dropdown menus",
                "Could improve user experience and reduce cognitive load",
            );
    } else if m.nav_links > 0 {
        a.strength(format!("Focused navigation ({} links)", m.nav_links));
    }

    if m.path_depth > MAX_PATH_DEPTH {
        a.penalize(10, format!("Page is {} levels deep", m.path_depth))
            .recommend(
                Navigation,
                Priority::Low,
                format!("Page depth is {} levels", m.path_depth),
                "Restructure site architecture to reduce page depth",
                "Could improve SEO and user navigation",
            );
    }

    a.finish()
}

fn display(dom: &DomFacts) -> CategoryAssessment {
    use FrameworkCategory::Display;
    let m = &dom.metrics;
    let mut a = Assessor::new(Display);

    if m.font_families > MAX_FONT_FAMILIES {
        a.penalize(20, format!("Too many fonts used ({})", m.font_families))
            .recommend(
                Display,
                Priority::High,
                format!("Using {} different fonts", m.font_families),
                "Limit to 1-2 font families for consistent design",
                "Could improve visual hierarchy and brand consistency",
            );
    } else {
        a.strength("Consistent typography");
    }

    if m.positioned_elements > MAX_POSITIONED {
        a.penalize(15, "Many absolutely positioned elements detected")
            .recommend(
                Display,
                Priority::Medium,
                "High number of absolutely positioned elements",
                "Review layout for potential overlapping content",
                "Could prevent content overlap and improve readability",
            );
    }

    if m.empty_containers > MAX_EMPTY_CONTAINERS {
        a.penalize(10, "Many empty containers (potential whitespace issues)");
    }

    a.finish()
}

fn information(dom: &DomFacts) -> CategoryAssessment {
    use FrameworkCategory::Information;
    let m = &dom.metrics;
    let mut a = Assessor::new(Information);

    let title = dom.h1().or(dom.title.as_deref());
    match title {
        Some(title) if title.chars().count() > MAX_TITLE_CHARS => {
            a.penalize(10, format!("Product title too long ({} chars)", title.chars().count()))
                .recommend(
                    Information,
                    Priority::Medium,
                    "Product title exceeds 60 characters",
                    "Shorten product titles to improve readability",
                    "Could improve user comprehension and SEO",
                );
        }
        Some(_) => a.strength("Concise page title"),
        None => {
            a.penalize(10, "No page title or main heading");
        }
    }

    if m.has_description || dom.meta_description.is_some() {
        a.strength("Product description present");
    } else {
        a.penalize(25, "No product descriptions found").recommend(
            Information,
            Priority::High,
            "Missing product descriptions",
            "Add detailed product descriptions to build trust",
            "Could increase conversions by 15-20%",
        );
    }

    let product_images = dom.images.iter().filter(|i| i.product).count();
    if product_images < MIN_PRODUCT_IMAGES {
        a.penalize(20, format!("Only {} product image(s) found", product_images))
            .recommend(
                Information,
                Priority::High,
                format!("Insufficient product images ({})", product_images),
                "Add at least 2-4 high-quality product images",
                "Could increase conversions by 10-15%",
            );
    } else {
        a.strength(format!("{} product images", product_images));
    }

    if m.offers == 0 {
        a.penalize(15, "No promotional offers or coupons visible")
            .recommend(
                Information,
                Priority::Medium,
                "No visible offers or promotions",
                "Add promotional offers or discount codes",
                "Could increase conversions by 8-12%",
            );
    } else {
        a.strength("Promotional offers visible");
    }

    a.finish()
}

fn technical(dom: &DomFacts) -> CategoryAssessment {
    use FrameworkCategory::Technical;
    let m = &dom.metrics;
    let mut a = Assessor::new(Technical);

    if m.has_viewport_meta {
        a.strength("Mobile viewport configured");
    } else {
        a.penalize(20, "No mobile viewport meta tag").recommend(
            Technical,
            Priority::High,
            "Missing viewport meta tag",
            "Add <meta name='viewport' content='width=device-width, initial-scale=1'>",
            "Essential for mobile responsiveness",
        );
    }

    let large = dom.images.iter().filter(|i| i.is_oversized()).count();
    if large > 0 {
        a.penalize(10, format!("{} very large images detected", large))
            .recommend(
                Technical,
                Priority::Medium,
                format!("{} images are very large", large),
                "Optimize image sizes and use responsive images",
                "Could improve page load speed by 20-30%",
            );
    }

    if m.html_bytes > MAX_HTML_BYTES || m.script_count > MAX_SCRIPTS {
        a.penalize(
            10,
            format!(
                "Heavy page ({} KB of HTML, {} scripts)",
                m.html_bytes / 1024,
                m.script_count
            ),
        )
        .recommend(
            Technical,
            Priority::Medium,
            "Page weight is high",
            "Defer non-critical scripts and trim server-rendered markup",
            "Could improve first contentful paint",
        );
    }

    a.finish()
}

fn psychological(dom: &DomFacts) -> CategoryAssessment {
    use FrameworkCategory::Psychological;
    let m = &dom.metrics;
    let mut a = Assessor::new(Psychological);

    if dom.trust_signals.len() < MIN_TRUST_SIGNALS {
        a.penalize(20, "Insufficient trust signals").recommend(
            Psychological,
            Priority::High,
            "Few or no trust badges visible",
            "Add security badges, testimonials, and guarantees",
            "Could increase conversions by 12-18%",
        );
    } else {
        a.strength(format!("{} trust signals", dom.trust_signals.len()));
    }

    if m.has_return_policy {
        a.strength("Return policy mentioned");
    } else {
        a.penalize(15, "No clear return policy mentioned").recommend(
            Psychological,
            Priority::Medium,
            "Return policy not clearly visible",
            "Make return policy prominent and easily accessible",
            "Could reduce purchase hesitation and increase trust",
        );
    }

    if m.has_faq {
        a.strength("FAQ section present");
    } else {
        a.penalize(10, "No FAQ section found").recommend(
            Psychological,
            Priority::Medium,
            "No FAQ section visible",
            "Add FAQ section to address common concerns",
            "Could reduce support requests and increase conversions",
        );
    }

    if m.distinct_colors > MAX_COLORS {
        a.penalize(10, format!("Many different colors used ({})", m.distinct_colors))
            .recommend(
                Psychological,
                Priority::Low,
                "Color palette may be too diverse",
                "Limit color palette to 3-5 main colors for consistency",
                "Could improve brand consistency and visual appeal",
            );
    }

    if !dom.ctas.is_empty() && !dom.ctas.iter().any(|c| c.persuasive) {
        a.penalize(10, "Calls to action lack persuasive wording")
            .recommend(
                Psychological,
                Priority::Medium,
                "CTA copy is generic",
                "Use value or urgency wording on primary buttons",
                "Could lift click-through on primary actions",
            );
    }

    a.finish()
}

#[cfg(test)]
#[path = "structural_tests.rs"]
mod tests;
