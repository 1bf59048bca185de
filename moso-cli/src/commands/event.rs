use anyhow::Result;
use clap::Args;

use crate::config::GlobalArgs;

#[derive(Args, Debug)]
pub struct RecordEventArgs {
    /// Wallet address to credit
    #[arg(long)]
    pub wallet: String,

    /// Event type
    #[arg(long = "type", default_value = "login")]
    pub event_type: String,

    /// Current page URL (captured before relaying)
    #[arg(long, default_value = super::BLANK_PAGE)]
    pub url: String,
}

pub async fn run(global: &GlobalArgs, args: RecordEventArgs) -> Result<()> {
    let analytics = super::open_analytics(global, &args.url).await?;
    let outcome = analytics
        .record_event_named(&args.wallet, &args.event_type)
        .await?;
    println!("{}", super::show::describe_outcome(&outcome));
    Ok(())
}
