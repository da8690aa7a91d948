use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Desktop browser user agents the catalog site accepts without a challenge page
pub const BROWSER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Supplies the `User-Agent` value for each outgoing request
pub trait UserAgentSource: Send + Sync + fmt::Debug {
    fn next_agent(&self) -> String;
}

/// Always returns the same agent
#[derive(Debug, Clone)]
pub struct StaticAgent(String);

impl StaticAgent {
    pub fn new(agent: impl Into<String>) -> Self {
        Self(agent.into())
    }
}

impl Default for StaticAgent {
    fn default() -> Self {
        Self::new(BROWSER_AGENTS[0])
    }
}

impl UserAgentSource for StaticAgent {
    fn next_agent(&self) -> String {
        self.0.clone()
    }
}

/// Cycles through a fixed list of agents, one per request
#[derive(Debug)]
pub struct RotatingAgent {
    agents: Vec<String>,
    cursor: AtomicUsize,
}

impl RotatingAgent {
    /// Returns `None` when `agents` is empty.
    pub fn new<I, S>(agents: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let agents: Vec<String> = agents.into_iter().map(Into::into).collect();
        if agents.is_empty() {
            return None;
        }
        Some(Self {
            agents,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn browsers() -> Self {
        Self {
            agents: BROWSER_AGENTS.iter().map(|s| s.to_string()).collect(),
            cursor: AtomicUsize::new(0),
        }
    }
}

impl UserAgentSource for RotatingAgent {
    fn next_agent(&self) -> String {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        self.agents[index].clone()
    }
}
