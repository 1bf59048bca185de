//! Brand-link click payloads.

use crate::page::QueryParams;
use crate::transport::{CLICK_WALLET_PLACEHOLDER, RelayPayload};

/// Parameters a click link must carry, in the order they are checked.
pub const CLICK_PARAMS: [&str; 3] = ["mid", "bid", "blid"];

/// Why a URL could not be turned into a click payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickRejection {
    InvalidUrl,
    MissingParam(&'static str),
}

/// Build the click payload for `link`.
pub fn click_payload(link: &str) -> Result<RelayPayload, ClickRejection> {
    let params = QueryParams::parse(link).ok_or(ClickRejection::InvalidUrl)?;

    let [mid, bid, blid] = CLICK_PARAMS.map(|name| params.get(name));
    let missing = |name: &'static str| ClickRejection::MissingParam(name);

    Ok(RelayPayload::Click {
        link: link.to_string(),
        wallet_address: CLICK_WALLET_PLACEHOLDER.to_string(),
        mid: mid.ok_or_else(|| missing("mid"))?,
        bid: bid.ok_or_else(|| missing("bid"))?,
        blid: blid.ok_or_else(|| missing("blid"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_link_builds_payload() {
        let link = "https://brand.example/p?bid=b1&mid=m2&blid=l3";
        let payload = click_payload(link).unwrap();

        assert_eq!(
            payload,
            RelayPayload::Click {
                link: link.to_string(),
                wallet_address: CLICK_WALLET_PLACEHOLDER.to_string(),
                bid: "b1".to_string(),
                mid: "m2".to_string(),
                blid: "l3".to_string(),
            }
        );
    }

    #[test]
    fn missing_params_are_reported_in_check_order() {
        assert_eq!(
            click_payload("https://x/?bid=1"),
            Err(ClickRejection::MissingParam("mid"))
        );
        assert_eq!(
            click_payload("https://x/?mid=1&blid=3"),
            Err(ClickRejection::MissingParam("bid"))
        );
        assert_eq!(
            click_payload("https://x/?mid=1&bid=2"),
            Err(ClickRejection::MissingParam("blid"))
        );
    }

    #[test]
    fn relative_link_is_invalid() {
        assert_eq!(click_payload("/p?bid=1&mid=2&blid=3"), Err(ClickRejection::InvalidUrl));
    }
}
