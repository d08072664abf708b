//! Runtime settings.
//!
//! Plain data with defaults matching the overlay's behaviour. Hosts adjust
//! fields directly, or through [`Out::Configure`](crate::flow::Out::Configure)
//! while the loop is running. The overlay itself is configured through its
//! page URL (`?channels=a,b&stats=true`), see [`Settings::from_query`].

use instant::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Arrival buffer size. Older queued emotes are overwritten past this.
    pub capacity: usize,
    /// Drain period: one emote is admitted per tick.
    pub tick_period: Duration,
    /// Frame gap after which new spawn requests are dropped.
    pub stale_after: Duration,
    /// Upper clamp for the frame delta handed to emote updates.
    pub max_delta: Duration,
    /// Emotes taken from a single chat message; the rest are ignored.
    pub max_per_burst: usize,
    /// Chat channels the event source should join.
    pub channels: Vec<String>,
    /// Show the active/queued counters.
    pub show_stats: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: 50,
            tick_period: Duration::from_millis(500),
            stale_after: Duration::from_millis(1000),
            max_delta: Duration::from_secs(1),
            max_per_burst: 12,
            channels: Vec::new(),
            show_stats: false,
        }
    }
}

impl Settings {
    /// Defaults overridden by URL query parameters.
    ///
    /// `channels` takes a comma separated list and `channel` a single name;
    /// both may be given and are merged. `stats=true` enables the counters.
    /// Unknown parameters are ignored. A leading `?` is accepted.
    pub fn from_query(query: &str) -> Self {
        let mut settings = Self::default();
        let mut channel_lists: Vec<String> = Vec::new();
        for (key, value) in query_pairs(query) {
            match key {
                "channels" | "channel" => {
                    channel_lists.push(value.replace("%2C", ",").replace("%2c", ","))
                }
                "stats" => settings.show_stats = value == "true",
                _ => log::debug!("ignoring query parameter {}", key),
            }
        }
        settings.channels = channel_lists
            .iter()
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "null")
            .map(str::to_owned)
            .collect();
        settings
    }

    /// Read settings from the current page URL.
    #[cfg(target_arch = "wasm32")]
    pub fn from_location() -> anyhow::Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window available"))?;
        let search = window
            .location()
            .search()
            .map_err(|e| anyhow::anyhow!("could not read location: {:?}", e))?;
        Ok(Self::from_query(&search))
    }
}

fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}
