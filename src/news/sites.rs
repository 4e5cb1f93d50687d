//! Seed sites and the seed-substring link filter

use url::Url;

/// Agriculture news sites crawled on every fetch
pub const SEED_SITES: [&str; 7] = [
    "https://www.modernfarmer.com/",
    "https://www.livemint.com/industry/agriculture",
    "https://www.thehindu.com/topic/Agriculture/",
    "https://www.business-standard.com/industry/agriculture",
    "https://www.thehindubusinessline.com/economy/agri-business/",
    "https://icar.org.in/news-highlights",
    "https://indianexpress.com/about/agriculture/",
];

/// What part of a seed is searched for inside candidate links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// The full seed URL (drops category/index pages under a seed path)
    #[default]
    SeedUrl,
    /// The seed host only (drops every link on a seed domain)
    SeedDomain,
}

/// Approximate exclusion filter: a link is dropped if it contains any
/// needle as a plain substring
#[derive(Debug, Clone)]
pub struct SeedFilter {
    needles: Vec<String>,
}

impl SeedFilter {
    pub fn new<S: AsRef<str>>(seeds: &[S], mode: FilterMode) -> Self {
        let needles = seeds
            .iter()
            .filter_map(|seed| {
                let seed = seed.as_ref();
                match mode {
                    FilterMode::SeedUrl => Some(seed.to_string()),
                    FilterMode::SeedDomain => Url::parse(seed)
                        .ok()
                        .and_then(|u| u.host_str().map(str::to_string)),
                }
            })
            .filter(|n| !n.is_empty())
            .collect();

        Self { needles }
    }

    pub fn keeps(&self, link: &str) -> bool {
        !self.needles.iter().any(|needle| link.contains(needle.as_str()))
    }

    pub fn apply(&self, links: Vec<String>) -> Vec<String> {
        links.into_iter().filter(|l| self.keeps(l)).collect()
    }
}
