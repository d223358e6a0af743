//! Human/bot classification by user agent

/// Substrings that mark a user agent as automated, matched case-insensitively
pub const DEFAULT_BOT_PATTERNS: &[&str] = &[
    "bot",
    "crawl",
    "spider",
    "slurp",
    "headless",
    "lighthouse",
    "facebookexternalhit",
    "curl/",
    "wget/",
    "python-requests",
    "python-urllib",
    "go-http-client",
    "okhttp",
    "axios/",
    "node-fetch",
    "uptime",
    "monitor",
];

/// Pattern-list heuristic separating people from automated clients
#[derive(Debug, Clone)]
pub struct BotClassifier {
    patterns: Vec<String>,
}

impl BotClassifier {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A visit without a user agent counts as a bot; browsers always send one.
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return true;
        };
        let ua = ua.to_lowercase();
        self.patterns.iter().any(|p| ua.contains(p.as_str()))
    }
}

impl Default for BotClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_BOT_PATTERNS)
    }
}
