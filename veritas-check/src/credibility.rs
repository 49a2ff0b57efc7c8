//! Source Credibility Table
//!
//! Static mapping of known publisher domains to a 0..100 trust score and a
//! category. A built-in table covers major wire services, fact-checkers,
//! health agencies and journals; `[[credibility]]` config entries extend it or
//! override built-in domains.

use crate::types::{SourceCategory, SourceRef};
use reqwest::Url;
use veritas_common::config::CredibilityEntry;

/// Score for domains not in the table
pub const UNKNOWN_CREDIBILITY: u8 = 50;

/// One known publisher domain
#[derive(Debug, Clone, PartialEq)]
pub struct KnownSource {
    /// Registrable domain, lowercase, without `www.`
    pub domain: String,
    pub publisher: String,
    pub score: u8,
    pub category: SourceCategory,
}

const BUILTIN: &[(&str, &str, u8, SourceCategory)] = &[
    ("reuters.com", "Reuters", 92, SourceCategory::NewsAgency),
    ("apnews.com", "Associated Press", 92, SourceCategory::NewsAgency),
    ("afp.com", "AFP", 90, SourceCategory::NewsAgency),
    ("factcheck.org", "FactCheck.org", 90, SourceCategory::FactCheck),
    ("snopes.com", "Snopes", 88, SourceCategory::FactCheck),
    ("politifact.com", "PolitiFact", 88, SourceCategory::FactCheck),
    ("fullfact.org", "Full Fact", 87, SourceCategory::FactCheck),
    ("who.int", "World Health Organization", 95, SourceCategory::Government),
    ("cdc.gov", "CDC", 95, SourceCategory::Government),
    ("fda.gov", "FDA", 94, SourceCategory::Government),
    ("nih.gov", "NIH", 95, SourceCategory::Government),
    ("nhs.uk", "NHS", 93, SourceCategory::Government),
    ("nature.com", "Nature", 94, SourceCategory::Academic),
    ("science.org", "Science", 94, SourceCategory::Academic),
    ("thelancet.com", "The Lancet", 93, SourceCategory::Academic),
    ("nejm.org", "NEJM", 94, SourceCategory::Academic),
    ("bbc.com", "BBC", 88, SourceCategory::News),
    ("bbc.co.uk", "BBC", 88, SourceCategory::News),
    ("nytimes.com", "The New York Times", 85, SourceCategory::News),
    ("theguardian.com", "The Guardian", 84, SourceCategory::News),
    ("washingtonpost.com", "The Washington Post", 84, SourceCategory::News),
    ("npr.org", "NPR", 86, SourceCategory::News),
    ("wikipedia.org", "Wikipedia", 70, SourceCategory::Reference),
    ("britannica.com", "Encyclopaedia Britannica", 85, SourceCategory::Reference),
];

#[derive(Debug, Clone)]
pub struct CredibilityTable {
    sources: Vec<KnownSource>,
}

impl Default for CredibilityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().trim_end_matches('.').to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

impl CredibilityTable {
    pub fn builtin() -> Self {
        let sources = BUILTIN
            .iter()
            .map(|(domain, publisher, score, category)| KnownSource {
                domain: domain.to_string(),
                publisher: publisher.to_string(),
                score: *score,
                category: *category,
            })
            .collect();
        Self { sources }
    }

    /// Built-in table extended with config entries; an entry for an existing
    /// domain replaces it. Scores above 100 are clamped.
    pub fn with_entries(entries: &[CredibilityEntry]) -> Self {
        let mut table = Self::builtin();
        for entry in entries {
            let domain = normalize_domain(&entry.domain);
            if domain.is_empty() {
                continue;
            }
            let source = KnownSource {
                publisher: entry.publisher.clone().unwrap_or_else(|| domain.clone()),
                domain: domain.clone(),
                score: entry.score.min(100),
                category: SourceCategory::parse(&entry.category),
            };
            match table.sources.iter_mut().find(|s| s.domain == domain) {
                Some(existing) => *existing = source,
                None => table.sources.push(source),
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Most specific entry whose domain equals `host` or is a parent of it
    pub fn lookup_host(&self, host: &str) -> Option<&KnownSource> {
        let host = normalize_domain(host);
        self.sources
            .iter()
            .filter(|s| host == s.domain || host.ends_with(&format!(".{}", s.domain)))
            .max_by_key(|s| s.domain.len())
    }

    pub fn lookup_url(&self, url: &str) -> Option<&KnownSource> {
        let parsed = Url::parse(url).ok()?;
        self.lookup_host(parsed.host_str()?)
    }

    /// Build a `SourceRef` for a search hit
    ///
    /// Known domains take their score, category and publisher from the table.
    /// Unknown ones score [`UNKNOWN_CREDIBILITY`] and use `publisher_hint`, or
    /// the host name when no hint is given.
    pub fn source_ref(&self, url: &str, title: &str, publisher_hint: Option<&str>) -> SourceRef {
        match self.lookup_url(url) {
            Some(known) => SourceRef {
                url: url.to_string(),
                title: title.to_string(),
                publisher: known.publisher.clone(),
                credibility_score: known.score,
                category: known.category,
            },
            None => {
                let host = Url::parse(url)
                    .ok()
                    .and_then(|u| u.host_str().map(normalize_domain))
                    .unwrap_or_else(|| url.to_string());
                SourceRef {
                    url: url.to_string(),
                    title: title.to_string(),
                    publisher: publisher_hint
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .unwrap_or(host),
                    credibility_score: UNKNOWN_CREDIBILITY,
                    category: SourceCategory::Unknown,
                }
            }
        }
    }
}
