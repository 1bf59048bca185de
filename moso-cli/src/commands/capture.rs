use anyhow::Result;
use clap::Args;

use crate::config::GlobalArgs;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Page URL the visitor landed on
    pub url: String,
}

pub async fn run(global: &GlobalArgs, args: CaptureArgs) -> Result<()> {
    let analytics = super::open_analytics(global, &args.url).await?;

    // initialize already captured the page; report what is now pending
    match analytics.pending_referral().await {
        Some(record) if record.link == args.url => {
            println!(
                "Captured referral from marketer {} at {}",
                record.marketer_id,
                super::show::format_millis(record.timestamp)
            );
        }
        Some(record) => {
            println!(
                "URL carries no referral link; marketer {} is still pending",
                record.marketer_id
            );
        }
        None => println!("URL carries no referral link"),
    }

    if let Some(sub_id) = analytics.sub_id().await {
        println!("Sub id:      {}", sub_id);
    }
    if let Some(campaign_id) = analytics.campaign_id().await {
        println!("Campaign id: {}", campaign_id);
    }
    Ok(())
}
