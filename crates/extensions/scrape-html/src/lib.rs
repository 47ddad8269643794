//! Scraping service for croscope.
//!
//! Fetches the page over HTTP and extracts [`DomFacts`](croscope_protocols::DomFacts)
//! on the blocking pool. Extraction is synchronous and never fails on bad
//! markup; the HTML parser recovers the same way a browser does.

mod extract;
mod service;

pub use extract::extract;
pub use service::HtmlScraper;
