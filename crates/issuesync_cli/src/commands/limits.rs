use issuesync::github::{GitHubRateLimits, RateLimitResource};

use crate::commands::shared::{OutputFormat, github_client, print_rows};
use crate::config::Config;

/// Show GitHub quota for the resources the sync spends.
pub(crate) async fn handle_limits(
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = github_client(config, None, true)?;
    let rate_limits = client.get_rate_limits().await?;
    let items = github_rate_limits_to_display(&rate_limits.resources);
    print_rows(&items, output)
}

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl RateLimitDisplay {
    pub(crate) fn from_github_resource(name: &str, resource: &RateLimitResource) -> Self {
        // Older Enterprise servers omit `used`
        let used = if resource.used > 0 {
            resource.used
        } else {
            resource.limit.saturating_sub(resource.remaining)
        };
        let usage_percent = if resource.limit > 0 {
            (used as f64 / resource.limit as f64) * 100.0
        } else {
            0.0
        };
        let reset_at = resource.reset_at();
        let reset_duration = reset_at.signed_duration_since(chrono::Utc::now());
        let reset_in = if reset_duration.num_seconds() > 0 {
            format_duration(reset_duration)
        } else {
            "now".to_string()
        };

        Self {
            resource: name.to_string(),
            limit: resource.limit.to_string(),
            used: used.to_string(),
            remaining: resource.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }
}

/// Rows for core, graphql and search, in that order, skipping absent ones.
pub(crate) fn github_rate_limits_to_display(limits: &GitHubRateLimits) -> Vec<RateLimitDisplay> {
    let mut items = vec![RateLimitDisplay::from_github_resource("core", &limits.core)];
    if let Some(ref r) = limits.graphql {
        items.push(RateLimitDisplay::from_github_resource("graphql", r));
    }
    if let Some(ref r) = limits.search {
        items.push(RateLimitDisplay::from_github_resource("search", r));
    }
    items
}

/// Format a duration in a human-readable way.
fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_resource(limit: usize, used: usize, remaining: usize) -> RateLimitResource {
        RateLimitResource {
            limit,
            used,
            remaining,
            reset: 2_000_000_000,
        }
    }

    #[test]
    fn format_duration_handles_seconds_minutes_and_hours() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::seconds(120)), "2m");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(3600)), "1h");
        assert_eq!(format_duration(chrono::Duration::seconds(3900)), "1h 5m");
    }

    #[test]
    fn github_rate_limits_to_display_skips_absent_resources() {
        let limits = GitHubRateLimits {
            core: sample_resource(5000, 1000, 4000),
            search: None,
            graphql: Some(sample_resource(5000, 50, 4950)),
        };

        let display = github_rate_limits_to_display(&limits);
        let names: Vec<_> = display.iter().map(|d| d.resource.as_str()).collect();
        assert_eq!(names, vec!["core", "graphql"]);
    }

    #[test]
    fn rate_limit_display_from_resource_formats_percent_and_reset() {
        let display = RateLimitDisplay::from_github_resource("core", &sample_resource(100, 25, 75));

        assert_eq!(display.resource, "core");
        assert_eq!(display.limit, "100");
        assert_eq!(display.used, "25");
        assert_eq!(display.remaining, "75");
        assert_eq!(display.usage_percent, "25.0%");
        assert!(display.reset_at.contains("UTC"));
    }

    #[test]
    fn rate_limit_display_derives_used_when_missing() {
        let display = RateLimitDisplay::from_github_resource("core", &sample_resource(60, 0, 45));
        assert_eq!(display.used, "15");
        assert_eq!(display.usage_percent, "25.0%");
    }
}
