use crate::cli::Cli;
use crate::commands::{load_config, open_store, require_user, CommandError, Result};
use crate::output::{format_output, OutputData};

pub async fn run(cli: &Cli, limit: i64, token: Option<&str>) -> Result<()> {
    if limit < 1 {
        return Err(CommandError::InvalidInput(
            "--limit must be at least 1".into(),
        ));
    }
    let config = load_config(cli)?;
    let user_id = require_user(&config, token)?;
    let store = open_store(&config).await?;

    let entries = store.recent_searches(&user_id, limit).await?;
    format_output(&OutputData::History(entries), &cli.output)
}
