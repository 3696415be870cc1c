//! Robot classification
//!
//! Decides whether a request comes from an automated client based on its
//! User-Agent string. Every caller goes through [`is_robot`] so the pattern
//! below stays the only definition of "robot" in the service.

use http::{HeaderMap, header};
use once_cell::sync::Lazy;
use regex::Regex;

/// Known automation signatures, compiled once per process.
static ROBOT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        // Crawlers that link to an info page ("+http://www.google.com/bot.html")
        r"(?:\+https?://)",
        // A standalone "bot" token ("ezooms.bot@", "/bot.php", "TweetedTimes Bot/")
        r"|(?i:\Wbot\W)",
        // Search engines, SEO crawlers and archivers
        r"|(?i:googlebot|bingbot|yandexbot|baiduspider|duckduckbot|slurp|sogou|exabot)",
        r"|(?i:mj12bot|ahrefsbot|semrushbot|dotbot|blexbot|ezooms|petalbot)",
        r"|(?i:archive\.org_bot|ia_archiver|crawler|spider)",
        // Bare library clients with no browser token
        r"|(?:^Go [0-9.]+ package http)|(?:^Go-http-client/)",
        r"|(?:^Java/)|(?:^Python-urllib/)|(?:^python-requests/)",
        r"|(?:^curl/)|(?i:^wget/)|(?:^libwww-perl/)",
    ))
    .expect("valid robot regex")
});

/// Reports whether `user_agent` identifies an automated client.
///
/// Matching is substring based: a browser-looking string that also carries a
/// bot token is still a robot. The empty string is never a robot.
pub fn is_robot(user_agent: &str) -> bool {
    !user_agent.is_empty() && ROBOT_PATTERN.is_match(user_agent)
}

/// Header-level view of [`is_robot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RobotClassifier;

impl RobotClassifier {
    /// Classify a request by its `User-Agent` header. A missing or non-UTF-8
    /// header counts as an empty string.
    pub fn classify(&self, headers: &HeaderMap) -> bool {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        is_robot(user_agent)
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    const ROBOTS: &[&str] = &[
        "Mozilla/5.0 (compatible; TweetedTimes Bot/1.0; +http://tweetedtimes.com)",
        "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)",
        "Mozilla/5.0 (compatible; MJ12bot/v1.4.3; http://www.majestic12.co.uk/bot.php?+)",
        "Go 1.1 package http",
        "Java/1.7.0_25\t0.003\t0.003",
        "Python-urllib/2.6",
        "Mozilla/5.0 (compatible; archive.org_bot +http://www.archive.org/details/archive.org_bot)",
        "Mozilla/5.0 (compatible; Ezooms/1.0; ezooms.bot@gmail.com)",
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        "Go-http-client/1.1",
        "python-requests/2.31.0",
        "curl/8.4.0",
        "Mozilla/5.0 (compatible; AhrefsBot/7.0)",
    ];

    const HUMANS: &[&str] = &[
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
        // Robot tokens only count at the start for library clients
        "Mozilla/5.0 Java/ applet",
    ];

    #[test]
    fn test_known_robots_match() {
        for ua in ROBOTS {
            assert!(is_robot(ua), "{ua} not a robot");
        }
    }

    #[test]
    fn test_browsers_do_not_match() {
        for ua in HUMANS {
            assert!(!is_robot(ua), "{ua} classified as robot");
        }
    }

    #[test]
    fn test_empty_user_agent_is_human() {
        assert!(!is_robot(""));
    }

    #[test]
    fn test_browser_with_bot_token_is_robot() {
        assert!(is_robot(
            "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; bingbot/2.0) Chrome/116.0 Safari/537.36"
        ));
    }

    #[test]
    fn test_classify_reads_user_agent_header() {
        let classifier = RobotClassifier;
        let mut headers = HeaderMap::new();
        assert!(!classifier.classify(&headers));

        headers.insert(header::USER_AGENT, HeaderValue::from_static("Python-urllib/3.11"));
        assert!(classifier.classify(&headers));
    }
}
