//! Prompt sent with the screenshot to LLM vision backends.

use std::fmt::Write;

use crate::types::CaptureArtifact;

const RESPONSE_SHAPE: &str = r#"{
  "overall_score": 0-100,
  "category_scores": {
    "navigation": 0-100,
    "display": 0-100,
    "information": 0-100,
    "technical": 0-100,
    "psychological": 0-100
  },
  "recommendations": [
    {
      "category": "navigation|display|information|technical|psychological",
      "priority": "high|medium|low",
      "issue": "what is wrong",
      "solution": "what to change",
      "impact": "expected effect on conversions"
    }
  ],
  "insights": ["notable observation"],
  "visual_issues": ["visual problem"],
  "mobile_issues": ["mobile problem"]
}"#;

/// Build the CRO analysis prompt for `artifact`.
pub fn build_cro_prompt(artifact: &CaptureArtifact) -> String {
    let dom = &artifact.dom;
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a conversion rate optimization expert. Analyze the attached screenshot of {}.",
        artifact.target
    );
    prompt.push_str("\nPage facts extracted from the HTML:\n");
    let _ = writeln!(prompt, "- Title: {}", dom.title.as_deref().unwrap_or("(none)"));
    if let Some(h1) = dom.h1() {
        let _ = writeln!(prompt, "- Main heading: {}", h1);
    }
    let _ = writeln!(prompt, "- Headings: {}", dom.headings.len());
    let _ = writeln!(
        prompt,
        "- Calls to action: {} ({} prominent)",
        dom.ctas.len(),
        dom.ctas.iter().filter(|c| c.prominent).count()
    );
    let _ = writeln!(prompt, "- Forms: {}", dom.forms.len());
    let _ = writeln!(
        prompt,
        "- Images: {} ({} product images)",
        dom.images.len(),
        dom.images.iter().filter(|i| i.product).count()
    );
    let _ = writeln!(prompt, "- Trust signals: {}", dom.trust_signals.len());
    let _ = writeln!(prompt, "- Navigation links: {}", dom.metrics.nav_links);

    let sample: Vec<&str> = dom.ctas.iter().take(5).map(|c| c.text.as_str()).collect();
    if !sample.is_empty() {
        let _ = writeln!(prompt, "- CTA labels: {}", sample.join(" | "));
    }

    prompt.push_str(
        "\nEvaluate visual hierarchy, trust signals, CTA prominence, mobile friendliness, \
         color use, clarity of the value proposition and friction points.\n",
    );
    prompt.push_str("\nRespond with a single JSON object of this shape and nothing else:\n");
    prompt.push_str(RESPONSE_SHAPE);
    prompt.push('\n');
    prompt
}
