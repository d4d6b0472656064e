// src/crawl/robots.rs
// =============================================================================
// A small robots.txt parser.
//
// Only three directives matter to the crawler:
// - User-agent:  starts (or extends) a rule group
// - Disallow:    path prefix the group may not fetch
// - Crawl-delay: seconds to wait between requests
//
// Consecutive User-agent lines belong to the same group; a User-agent line
// that follows a directive starts a new group. Exactly one group is chosen
// for the crawler's user agent:
//   exact match -> substring match -> "*" -> none (everything allowed)
// =============================================================================

use std::time::Duration;

use tracing::debug;

/// One User-agent block of a robots.txt file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsRuleGroup {
    pub user_agents: Vec<String>,
    pub disallow: Vec<String>,
    pub crawl_delay: Option<f64>,
}

impl RobotsRuleGroup {
    fn is_empty(&self) -> bool {
        self.user_agents.is_empty() && self.disallow.is_empty() && self.crawl_delay.is_none()
    }
}

// Splits robots.txt text into rule groups, in file order.
pub fn parse_robots_txt(text: &str) -> Vec<RobotsRuleGroup> {
    let mut groups = Vec::new();
    let mut current = RobotsRuleGroup::default();
    // true once the current group has seen a rule line
    let mut has_rules = false;

    for raw in text.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => {
                if has_rules {
                    groups.push(std::mem::take(&mut current));
                    has_rules = false;
                }
                current.user_agents.push(value.to_string());
            }
            "disallow" => {
                current.disallow.push(value.to_string());
                has_rules = true;
            }
            "crawl-delay" => {
                match value.parse::<f64>() {
                    // Values too large for a Duration count as unparseable
                    Ok(delay) if delay >= 0.0 && Duration::try_from_secs_f64(delay).is_ok() => {
                        current.crawl_delay = Some(delay)
                    }
                    _ => debug!(value, "ignoring unparseable crawl-delay"),
                }
                has_rules = true;
            }
            "allow" => has_rules = true,
            _ => {}
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

// Picks the group that applies to `user_agent`.
pub fn choose_group<'a>(
    groups: &'a [RobotsRuleGroup],
    user_agent: &str,
) -> Option<&'a RobotsRuleGroup> {
    let agent = user_agent.to_ascii_lowercase();

    let exact = groups.iter().find(|g| {
        g.user_agents
            .iter()
            .any(|ua| !ua.is_empty() && ua.to_ascii_lowercase() == agent)
    });

    exact
        .or_else(|| {
            groups.iter().find(|g| {
                g.user_agents.iter().any(|ua| {
                    !ua.is_empty() && ua != "*" && agent.contains(&ua.to_ascii_lowercase())
                })
            })
        })
        .or_else(|| groups.iter().find(|g| g.user_agents.iter().any(|ua| ua == "*")))
}

/// True if `path` starts with any non-empty disallow prefix.
pub fn is_blocked(path: &str, disallows: &[String]) -> bool {
    disallows
        .iter()
        .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
}

/// The rules that apply to one crawl session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsPolicy {
    pub disallow: Vec<String>,
    pub crawl_delay: Duration,
}

impl RobotsPolicy {
    /// No restrictions, no delay
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn from_robots_txt(text: &str, user_agent: &str) -> Self {
        let groups = parse_robots_txt(text);
        match choose_group(&groups, user_agent) {
            Some(group) => Self {
                disallow: group.disallow.clone(),
                crawl_delay: group
                    .crawl_delay
                    .and_then(|delay| Duration::try_from_secs_f64(delay).ok())
                    .unwrap_or_default(),
            },
            None => Self::permissive(),
        }
    }

    pub fn is_allowed(&self, path: &str) -> bool {
        !is_blocked(path, &self.disallow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_group_blocks_prefix() {
        let policy =
            RobotsPolicy::from_robots_txt("User-agent: *\nDisallow: /private\nCrawl-delay: 0", "a11y-guardian/0.1");
        assert!(!policy.is_allowed("/private"));
        assert!(!policy.is_allowed("/private/page.html"));
        assert!(!policy.is_allowed("/privateer"));
        assert!(policy.is_allowed("/public"));
        assert_eq!(policy.crawl_delay, Duration::ZERO);
    }

    #[test]
    fn test_empty_text_is_permissive() {
        let policy = RobotsPolicy::from_robots_txt("", "bot");
        assert_eq!(policy, RobotsPolicy::permissive());
        assert!(policy.is_allowed("/anything"));
    }

    #[test]
    fn test_group_selection_order() {
        let text = "\
# comment line
User-agent: *
Disallow: /all

User-agent: a11y-guardian
Disallow: /substring

User-agent: A11y-Guardian/0.1
Disallow: /exact
Crawl-delay: 1.5
";
        let groups = parse_robots_txt(text);
        assert_eq!(groups.len(), 3);

        let exact = choose_group(&groups, "a11y-guardian/0.1").unwrap();
        assert_eq!(exact.disallow, vec!["/exact"]);
        assert_eq!(exact.crawl_delay, Some(1.5));

        let substring = choose_group(&groups, "a11y-guardian/2.0 (+ci)").unwrap();
        assert_eq!(substring.disallow, vec!["/substring"]);

        let wildcard = choose_group(&groups, "otherbot").unwrap();
        assert_eq!(wildcard.disallow, vec!["/all"]);
    }

    #[test]
    fn test_no_matching_group() {
        let groups = parse_robots_txt("User-agent: googlebot\nDisallow: /");
        assert!(choose_group(&groups, "a11y-guardian").is_none());
        assert!(RobotsPolicy::from_robots_txt("User-agent: googlebot\nDisallow: /", "a11y-guardian")
            .is_allowed("/"));
    }

    #[test]
    fn test_consecutive_user_agents_share_a_group() {
        let groups = parse_robots_txt(
            "User-agent: alpha\nUser-agent: beta\nDisallow: /x\nUser-agent: gamma\nDisallow: /y",
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user_agents, vec!["alpha", "beta"]);
        assert_eq!(choose_group(&groups, "beta").unwrap().disallow, vec!["/x"]);
    }

    #[test]
    fn test_case_insensitive_directives_and_inline_comments() {
        let policy = RobotsPolicy::from_robots_txt(
            "USER-AGENT: *\ndisallow: /tmp # scratch space\nCRAWL-DELAY: 2",
            "bot",
        );
        assert_eq!(policy.disallow, vec!["/tmp"]);
        assert_eq!(policy.crawl_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_oversized_crawl_delay_is_ignored() {
        let groups = parse_robots_txt("User-agent: *\nDisallow: /private\nCrawl-delay: 1e20");
        assert_eq!(groups[0].crawl_delay, None);

        let policy = RobotsPolicy::from_robots_txt(
            "User-agent: *\nDisallow: /private\nCrawl-delay: 1e20",
            "bot",
        );
        assert_eq!(policy.crawl_delay, Duration::ZERO);
        assert!(!policy.is_allowed("/private"));

        for value in ["inf", "NaN", "-3"] {
            let text = format!("User-agent: *\nCrawl-delay: {}", value);
            assert_eq!(RobotsPolicy::from_robots_txt(&text, "bot").crawl_delay, Duration::ZERO);
        }
    }

    #[test]
    fn test_empty_disallow_blocks_nothing() {
        assert!(!is_blocked("/", &["".to_string()]));
        assert!(is_blocked("/", &["/".to_string()]));
    }
}
