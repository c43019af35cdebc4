use issuesync::platform::Team;

use crate::commands::shared::{OutputFormat, linear_client, print_rows};
use crate::config::Config;

#[derive(Debug, serde::Serialize, tabled::Tabled)]
pub(crate) struct TeamRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "ID")]
    pub id: String,
}

impl From<Team> for TeamRow {
    fn from(team: Team) -> Self {
        Self {
            key: team.key,
            name: team.name,
            id: team.id,
        }
    }
}

/// List Linear teams, sorted by key.
pub(crate) async fn handle_teams(
    output: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = linear_client(config, None, true)?;
    let mut rows: Vec<TeamRow> = client.teams().await?.into_iter().map(TeamRow::from).collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    print_rows(&rows, output)
}
