use anyhow::Result;
use clap::Args;

use crate::config::GlobalArgs;

#[derive(Args, Debug)]
pub struct RecordClickArgs {
    /// Brand link carrying mid, bid and blid parameters (defaults to a blank page)
    pub url: Option<String>,
}

pub async fn run(global: &GlobalArgs, args: RecordClickArgs) -> Result<()> {
    let location = args.url.as_deref().unwrap_or(super::BLANK_PAGE);
    let analytics = super::open_analytics(global, location).await?;
    let outcome = analytics.record_click(None).await;
    println!("{}", super::show::describe_outcome(&outcome));
    Ok(())
}
