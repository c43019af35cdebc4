use clap::ValueEnum;
use issuesync::github::GitHubClient;
use issuesync::linear::LinearClient;
use issuesync::platform::ApiRateLimiter;
use serde::Serialize;
use tabled::Tabled;

use crate::config::{Config, ConfigError};

/// Output format for listings.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Render rows as a rounded table or pretty JSON.
pub(crate) fn render_rows<T: Tabled + Serialize>(
    items: &[T],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => {
            let mut table = tabled::Table::new(items);
            table.with(tabled::settings::Style::rounded());
            Ok(table.to_string())
        }
        OutputFormat::Json => serde_json::to_string_pretty(items),
    }
}

pub(crate) fn print_rows<T: Tabled + Serialize>(
    items: &[T],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_rows(items, format)?);
    Ok(())
}

fn limiter(rps: u32, no_rate_limit: bool) -> Option<ApiRateLimiter> {
    if no_rate_limit {
        None
    } else {
        ApiRateLimiter::optional(rps)
    }
}

/// Build a GitHub client from the configured token.
pub(crate) fn github_client(
    config: &Config,
    token: Option<&str>,
    no_rate_limit: bool,
) -> Result<GitHubClient, Box<dyn std::error::Error>> {
    let token = token
        .or(config.github.token.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConfigError::Missing(vec!["github.token"]))?;
    let rate_limiter = limiter(config.github.rps, no_rate_limit);
    let client = match config.github.api_url.as_deref() {
        Some(api_url) => GitHubClient::with_api_url(api_url, token, rate_limiter)?,
        None => GitHubClient::new(token, rate_limiter)?,
    };
    Ok(client)
}

/// Build a Linear client from the configured API key.
pub(crate) fn linear_client(
    config: &Config,
    api_key: Option<&str>,
    no_rate_limit: bool,
) -> Result<LinearClient, Box<dyn std::error::Error>> {
    let api_key = api_key
        .or(config.linear.api_key.as_deref())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ConfigError::Missing(vec!["linear.api_key"]))?;
    let rate_limiter = limiter(config.linear.rps, no_rate_limit);
    Ok(LinearClient::new(api_key, rate_limiter)?)
}

/// Show the quota recorded from the last GitHub response.
pub(crate) fn display_final_rate_limit(client: &GitHubClient, is_tty: bool) {
    let Some(rate) = client.last_rate_limit() else {
        return;
    };

    if is_tty {
        println!(
            "\nGitHub rate limit after sync: {}/{} remaining",
            rate.remaining, rate.limit
        );
    } else {
        tracing::info!(
            remaining = rate.remaining,
            limit = rate.limit,
            "Rate limit after sync"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Count")]
        count: usize,
    }

    fn rows() -> Vec<Row> {
        vec![Row {
            name: "core".to_string(),
            count: 3,
        }]
    }

    #[test]
    fn output_format_default_is_table() {
        assert!(matches!(OutputFormat::default(), OutputFormat::Table));
    }

    #[test]
    fn render_rows_table_uses_renamed_headers() {
        let table = render_rows(&rows(), OutputFormat::Table).unwrap();
        assert!(table.contains("Name"));
        assert!(table.contains("core"));
    }

    #[test]
    fn render_rows_json_uses_field_names() {
        let json = render_rows(&rows(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "core");
        assert_eq!(value[0]["count"], 3);
    }

    #[test]
    fn limiter_respects_flag_and_zero_rate() {
        assert!(limiter(10, false).is_some());
        assert!(limiter(10, true).is_none());
        assert!(limiter(0, false).is_none());
    }

    #[test]
    fn clients_require_credentials() {
        let config = Config::default();
        let err = github_client(&config, None, true).unwrap_err();
        assert!(err.to_string().contains("github.token"));
        let err = linear_client(&config, None, true).unwrap_err();
        assert!(err.to_string().contains("linear.api_key"));
    }

    #[test]
    fn clients_build_with_credentials() {
        let config = Config::default();
        assert!(github_client(&config, Some("ghp_x"), false).is_ok());
        assert!(linear_client(&config, Some("lin_x"), false).is_ok());
    }
}
