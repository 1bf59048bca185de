use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use moso_core::RelayOutcome;
use moso_core::relay::ClickRejection;

use crate::config::GlobalArgs;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(global: &GlobalArgs, args: ShowArgs) -> Result<()> {
    let analytics = super::open_analytics(global, super::BLANK_PAGE).await?;

    let pending = analytics.pending_referral().await;
    let last_send = analytics.last_send_timestamp().await;
    let sub_id = analytics.sub_id().await;
    let campaign_id = analytics.campaign_id().await;

    if args.json {
        let value = serde_json::json!({
            "storage_type": analytics.options().storage_type.as_str(),
            "pending_referral": pending,
            "last_send_timestamp": last_send,
            "sub_id": sub_id,
            "campaign_id": campaign_id,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Storage:          {}", analytics.options().storage_type);
    match pending {
        Some(record) => {
            println!("Pending referral: marketer {}", record.marketer_id);
            println!("  link:           {}", record.link);
            println!("  captured:       {}", format_millis(record.timestamp));
        }
        None => println!("Pending referral: none"),
    }
    match last_send {
        Some(millis) => println!("Last send:        {}", format_millis(millis)),
        None => println!("Last send:        never"),
    }
    println!("Sub id:           {}", sub_id.as_deref().unwrap_or("-"));
    println!("Campaign id:      {}", campaign_id.as_deref().unwrap_or("-"));
    Ok(())
}

/// Render epoch millis as RFC 3339, falling back to the raw number.
pub fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// One-line description of a relay outcome.
pub fn describe_outcome(outcome: &RelayOutcome) -> String {
    match outcome {
        RelayOutcome::NoRecord => "Nothing to relay".to_string(),
        RelayOutcome::Expired { age_millis } => {
            format!("Referral expired ({} hours old)", age_millis / 3_600_000)
        }
        RelayOutcome::Suppressed {
            since_last_send_millis,
        } => format!(
            "Skipped, last send was {} ms ago",
            since_last_send_millis
        ),
        RelayOutcome::Incomplete(ClickRejection::InvalidUrl) => "Link is not a URL".to_string(),
        RelayOutcome::Incomplete(ClickRejection::MissingParam(name)) => {
            format!("Link is missing {}", name)
        }
        RelayOutcome::StoreFailed(e) => format!("Storage failed: {}", e),
        RelayOutcome::Sent => "Relayed".to_string(),
        RelayOutcome::Rejected => "Endpoint rejected the request".to_string(),
        RelayOutcome::TransportFailed(e) => format!("Request failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_millis_renders_rfc3339() {
        assert_eq!(format_millis(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn describe_missing_click_param() {
        let outcome = RelayOutcome::Incomplete(ClickRejection::MissingParam("blid"));
        assert_eq!(describe_outcome(&outcome), "Link is missing blid");
    }

    #[test]
    fn describe_expired_in_hours() {
        let outcome = RelayOutcome::Expired {
            age_millis: 8 * 24 * 3_600_000,
        };
        assert_eq!(describe_outcome(&outcome), "Referral expired (192 hours old)");
    }
}
