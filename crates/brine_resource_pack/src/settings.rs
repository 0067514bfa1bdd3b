use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Delay between consecutive replies of the identifier-bearing handshake.
///
/// Some consumers of the connection assume time passes between the
/// `Accepted` and `SuccessfullyLoaded` replies and misbehave when both arrive
/// in one burst.
pub const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(80);

/// Policy used to answer resource pack pushes.
///
/// Deserializes from camelCase keys (`autoAccept`, `autoAcceptForced`,
/// `logPackets`, `reportDownloaded`, `stageDelayMs`); missing keys keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourcePackSettings {
    /// Accept packs the server does not require.
    pub auto_accept: bool,
    /// Accept packs the server marks as forced.
    pub auto_accept_forced: bool,
    /// Log every push as it arrives.
    pub log_packets: bool,
    /// Report `Downloaded` between `Accepted` and `SuccessfullyLoaded`.
    ///
    /// Off by default. Only some server-side extensions look for it.
    pub report_downloaded: bool,
    #[serde(rename = "stageDelayMs", deserialize_with = "deserialize_millis")]
    pub stage_delay: Duration,
}

impl Default for ResourcePackSettings {
    fn default() -> Self {
        Self {
            auto_accept: true,
            auto_accept_forced: true,
            log_packets: true,
            report_downloaded: false,
            stage_delay: DEFAULT_STAGE_DELAY,
        }
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
