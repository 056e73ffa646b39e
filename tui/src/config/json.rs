use std::time::Duration;

use orchestrator::configs::{DashboardConfig, Palette, PollIntervals, Rgb};

/// Loads a [`DashboardConfig`] from a JSON file, on top of `base`.
///
/// # Errors
/// Returns a human-readable string if the file cannot be read or parsed.
pub fn load_dashboard(path: &str, base: DashboardConfig) -> Result<DashboardConfig, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read '{path}': {e}"))?;

    parse_dashboard(&content, base)
}

/// Overrides the fields of `base` present in `content`.
///
/// # Errors
/// Returns a human-readable string naming the first invalid field.
pub fn parse_dashboard(content: &str, base: DashboardConfig) -> Result<DashboardConfig, String> {
    let val: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;

    if !val.is_object() {
        return Err("config must be a JSON object".into());
    }

    let mut config = base;

    if let Some(url) = opt_str(&val, "api_base_url")? {
        if url.trim().is_empty() {
            return Err("api_base_url must not be empty".into());
        }
        config.api_base_url = url.trim().to_string();
    }

    if let Some(token) = opt_str(&val, "token")? {
        config.token = Some(token.to_string());
    }

    if let Some(role) = opt_str(&val, "role")? {
        config.role = role.parse()?;
    }

    if let Some(ms) = opt_millis(&val, "request_timeout_ms")? {
        config.request_timeout = Some(ms);
    }

    if !val["intervals"].is_null() {
        config.intervals = load_intervals(&val["intervals"], config.intervals)?;
    }

    if !val["palette"].is_null() {
        config.palette = load_palette(&val["palette"])?;
    }

    Ok(config)
}

fn load_intervals(val: &serde_json::Value, base: PollIntervals) -> Result<PollIntervals, String> {
    let field = |key: &str, current: Duration| -> Result<Duration, String> {
        Ok(opt_millis(val, key)?.unwrap_or(current))
    };

    let intervals = PollIntervals {
        uptime: field("uptime_ms", base.uptime)?,
        online_peers: field("online_peers_ms", base.online_peers)?,
        results: field("results_ms", base.results)?,
        logs: field("logs_ms", base.logs)?,
        start_grace: field("start_grace_ms", base.start_grace)?,
    };

    let periods = [
        intervals.uptime,
        intervals.online_peers,
        intervals.results,
        intervals.logs,
    ];
    if periods.iter().any(Duration::is_zero) {
        return Err("poll intervals must be positive".into());
    }

    Ok(intervals)
}

fn load_palette(val: &serde_json::Value) -> Result<Palette, String> {
    let colors = val
        .as_array()
        .ok_or("palette must be an array")?
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| "palette must contain strings".to_string())
                .and_then(Rgb::from_hex)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Palette::new(colors))
}

fn opt_str<'a>(val: &'a serde_json::Value, key: &str) -> Result<Option<&'a str>, String> {
    match &val[key] {
        serde_json::Value::Null => Ok(None),
        v => v
            .as_str()
            .map(Some)
            .ok_or_else(|| format!("{key} must be a string")),
    }
}

fn opt_millis(val: &serde_json::Value, key: &str) -> Result<Option<Duration>, String> {
    match &val[key] {
        serde_json::Value::Null => Ok(None),
        v => v
            .as_u64()
            .map(|ms| Some(Duration::from_millis(ms)))
            .ok_or_else(|| format!("{key} must be a non-negative integer")),
    }
}

#[cfg(test)]
mod tests {
    use orchestrator::configs::Role;

    use super::*;

    fn base() -> DashboardConfig {
        DashboardConfig::new(Role::Trainer, None)
    }

    #[test]
    fn empty_object_keeps_defaults() {
        let config = parse_dashboard("{}", base()).unwrap();
        assert_eq!(config.api_base_url, api::DEFAULT_BASE_URL);
        assert_eq!(config.intervals, PollIntervals::default());
        assert_eq!(config.role, Role::Trainer);
    }

    #[test]
    fn fields_override_the_base() {
        let content = r##"{
            "api_base_url": "https://decentrify.example/api",
            "role": "peer",
            "request_timeout_ms": 2500,
            "intervals": { "results_ms": 500 },
            "palette": ["#000000", "ffffff"]
        }"##;

        let config = parse_dashboard(content, base()).unwrap();
        assert_eq!(config.api_base_url, "https://decentrify.example/api");
        assert_eq!(config.role, Role::Peer);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.intervals.results, Duration::from_millis(500));
        assert_eq!(config.intervals.logs, Duration::from_secs(2));
        assert_eq!(config.palette.color(1), Rgb(255, 255, 255));
    }

    #[test]
    fn invalid_fields_are_named() {
        let err = parse_dashboard(r#"{ "role": "admin" }"#, base()).unwrap_err();
        assert!(err.contains("admin"));

        let err = parse_dashboard(r#"{ "intervals": { "logs_ms": 0 } }"#, base()).unwrap_err();
        assert!(err.contains("positive"));

        let err = parse_dashboard(r#"{ "token": 3 }"#, base()).unwrap_err();
        assert!(err.contains("token"));

        assert!(parse_dashboard("[]", base()).is_err());
    }
}
