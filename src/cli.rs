use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// gh-pr-notify: get notified once when one of your open pull requests is approved
#[derive(Parser, Debug)]
#[command(name = "gh-pr-notify", version, about)]
pub struct Cli {
    /// Poll interval (e.g. 30s, 1.5m, 1h30m; units ns, us, ms, s, m, h)
    #[arg(long, env = "GH_PR_NOTIFY_INTERVAL", default_value = "60s", value_parser = parse_interval)]
    pub interval: Duration,

    /// Whose open pull requests to watch (GitHub login, or @me for the gh user)
    #[arg(long, env = "GH_PR_NOTIFY_AUTHOR", default_value = "@me")]
    pub author: String,

    /// macOS notification sound ("none" to disable)
    #[arg(long, env = "GH_PR_NOTIFY_SOUND", default_value = "default")]
    pub sound: String,

    /// Disable macOS desktop notifications
    #[arg(long, env = "GH_PR_NOTIFY_NO_DESKTOP")]
    pub no_desktop: bool,

    /// Bark device key for iOS push notifications
    #[arg(long, env = "GH_PR_NOTIFY_BARK_KEY", hide_env_values = true)]
    pub bark_key: Option<String>,

    /// Bark server URL
    #[arg(long, env = "GH_PR_NOTIFY_BARK_SERVER", default_value = crate::notification::bark::DEFAULT_SERVER)]
    pub bark_server: String,

    /// Bark notification sound name
    #[arg(long, env = "GH_PR_NOTIFY_BARK_SOUND", default_value = "")]
    pub bark_sound: String,

    /// Slack incoming-webhook URL
    #[arg(long, env = "GH_PR_NOTIFY_SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    /// Webhook URL(s) that receive signed `pr_approved` events
    #[arg(long, env = "GH_PR_NOTIFY_WEBHOOK_URLS", value_delimiter = ',')]
    pub webhook_url: Vec<String>,

    /// Secret used to sign webhook bodies (HMAC-SHA256)
    #[arg(long, env = "GH_PR_NOTIFY_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// State file location [default: ~/.local/state/gh-pr-notify/state.json]
    #[arg(long, env = "GH_PR_NOTIFY_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Maximum number of review-status lookups in flight at once
    #[arg(long, env = "GH_PR_NOTIFY_LOOKUP_CONCURRENCY", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub lookup_concurrency: u16,

    /// Don't notify for PRs that are already approved the first time they are seen
    #[arg(long, env = "GH_PR_NOTIFY_SKIP_INITIALLY_APPROVED")]
    pub skip_initially_approved: bool,

    /// Run a single poll and exit
    #[arg(long)]
    pub once: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "GH_PR_NOTIFY_LOG_JSON")]
    pub log_json: bool,
}

/// Parse a Go-style duration: one or more `<number><unit>` pairs, where the
/// number may carry a decimal fraction (`1.5m`) and the unit is one of `ns`,
/// `us` (or `µs`), `ms`, `s`, `m`, `h`. Zero and values that overflow are
/// rejected.
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    let out_of_range = || format!("duration '{}' is out of range", s);

    let mut total_nanos: u64 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let int_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration '{}'", s));
        }

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos: u64 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(format!("missing unit in duration '{}'", s)),
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, s)),
        };
        rest = &rest[unit_len..];

        let whole: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| out_of_range())?
        };
        let mut nanos = whole.checked_mul(unit_nanos).ok_or_else(out_of_range)?;

        // Digits past nanosecond precision cannot change the result.
        let frac_digits = &frac_part[..frac_part.len().min(19)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| out_of_range())?;
            let scale = 10u128.pow(frac_digits.len() as u32);
            let frac_nanos = u64::try_from(numerator * u128::from(unit_nanos) / scale)
                .map_err(|_| out_of_range())?;
            nanos = nanos.checked_add(frac_nanos).ok_or_else(out_of_range)?;
        }

        total_nanos = total_nanos.checked_add(nanos).ok_or_else(out_of_range)?;
    }

    if total_nanos == 0 {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(Duration::from_nanos(total_nanos))
}
