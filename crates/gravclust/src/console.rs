//! Colored console output for clustering runs.
//!
//! A `tracing` layer that formats engine events. Initialized by
//! [`cluster`](crate::cluster) and [`cluster_with`](crate::cluster_with)
//! when the `console` feature is enabled.

use std::fmt;
use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the console layer.
///
/// Safe to call multiple times; only the first call has effect. Does
/// nothing if another global subscriber is already set.
pub fn init() {
    INIT.get_or_init(|| {
        let mut filter = EnvFilter::from_default_env();
        for directive in ["gravclust_engine=info", "gravclust=warn"] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ClusterConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats gravclust events with colors.
pub struct ClusterConsoleLayer;

impl<S: Subscriber> Layer<S> for ClusterConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("gravclust") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{output}");
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    strategy: Option<String>,
    path: Option<String>,
    reason: Option<String>,
    error: Option<String>,
    left: Option<String>,
    right: Option<String>,
    composite: Option<String>,
    leaf_count: Option<u64>,
    merges: Option<u64>,
    last_sequence: Option<u64>,
    duration_ms: Option<u64>,
    pair_evaluations: Option<u64>,
    cache_hits: Option<u64>,
    rescans: Option<u64>,
    evictions: Option<u64>,
    step: Option<u64>,
    live: Option<u64>,
    exponent: Option<f64>,
    value: Option<f64>,
    weight: Option<f64>,
    cache: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let s = format!("{value:?}").trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "strategy" => self.strategy = Some(s),
            "path" => self.path = Some(s),
            "reason" => self.reason = Some(s),
            "error" => self.error = Some(s),
            "left" => self.left = Some(s),
            "right" => self.right = Some(s),
            "composite" => self.composite = Some(s),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_debug(field, &value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "leaf_count" => self.leaf_count = Some(value),
            "merges" => self.merges = Some(value),
            "last_sequence" => self.last_sequence = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "pair_evaluations" => self.pair_evaluations = Some(value),
            "cache_hits" => self.cache_hits = Some(value),
            "rescans" => self.rescans = Some(value),
            "evictions" => self.evictions = Some(value),
            "step" => self.step = Some(value),
            "live" => self.live = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "exponent" => self.exponent = Some(value),
            "value" => self.value = Some(value),
            "weight" => self.weight = Some(value),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "cache" {
            self.cache = Some(value);
        }
    }
}

fn format_event(v: &EventVisitor) -> String {
    match v.event.as_deref().unwrap_or("") {
        "cluster_start" => format_start(v),
        "cluster_end" => format_end(v),
        "cluster_trivial" => format_trivial(v),
        "cluster_cancelled" => format_cancelled(v),
        "cluster_aborted" => format_aborted(v),
        "merge" => format_merge(v),
        "config_fallback" => format_fallback(v),
        _ => String::new(),
    }
}

fn count(n: Option<u64>) -> String {
    n.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn prefix(tag: &str) -> String {
    format!(
        "{} {} {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{tag}]").bright_cyan()
    )
}

fn format_start(v: &EventVisitor) -> String {
    let cache = if v.cache.unwrap_or(false) { "on" } else { "off" };
    format!(
        "{} {} leaves, exponent ({}), index ({}), cache ({})",
        prefix("Cluster"),
        count(v.leaf_count).bright_yellow(),
        v.exponent.unwrap_or(0.0).to_string().yellow(),
        v.strategy.as_deref().unwrap_or("?").white().bold(),
        cache.white(),
    )
}

fn format_end(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} Clustering ended: {} merges in {}",
        prefix("Cluster"),
        count(v.merges).bright_yellow(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
    );

    output.push_str("\n\n");
    let border = "═".repeat(58);
    output.push_str(&format!("╔{border}╗").bright_cyan().to_string());
    output.push('\n');
    for (label, value) in [
        ("Merges:", v.merges),
        ("Pair evaluations:", v.pair_evaluations),
        ("Cache hits:", v.cache_hits),
        ("Best-partner rescans:", v.rescans),
        ("Evictions:", v.evictions),
    ] {
        output.push_str(&format!(
            "{}  {:<24}{:>30}  {}",
            "║".bright_cyan(),
            label,
            count(value),
            "║".bright_cyan()
        ));
        output.push('\n');
    }
    output.push_str(&format!("╚{border}╝").bright_cyan().to_string());
    output.push('\n');
    output
}

fn format_trivial(v: &EventVisitor) -> String {
    format!(
        "{} {} leaves, nothing to merge",
        prefix("Cluster"),
        count(v.leaf_count).bright_yellow()
    )
}

fn format_cancelled(v: &EventVisitor) -> String {
    format!(
        "{} Cancelled after {} merges",
        prefix("Cluster"),
        count(v.merges).bright_red().bold()
    )
}

fn format_aborted(v: &EventVisitor) -> String {
    format!(
        "{} Aborted after merge {}: {}",
        prefix("Cluster"),
        count(v.last_sequence).bright_red().bold(),
        v.error.as_deref().unwrap_or("unknown error"),
    )
}

fn format_merge(v: &EventVisitor) -> String {
    format!(
        "    {} Merge {:>7} | {} + {} -> {} | value {:.6e} | weight {} | {} live",
        "->".bright_blue(),
        count(v.step).white(),
        v.left.as_deref().unwrap_or("?"),
        v.right.as_deref().unwrap_or("?"),
        v.composite.as_deref().unwrap_or("?").bright_green(),
        v.value.unwrap_or(0.0),
        v.weight.unwrap_or(0.0),
        count(v.live),
    )
}

fn format_fallback(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {} not loaded ({}), using defaults",
        timestamp().bright_black(),
        "WARN".bright_yellow(),
        "[Config]".bright_cyan(),
        v.path.as_deref().unwrap_or("?").white(),
        v.reason.as_deref().unwrap_or("unknown"),
    )
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{:5}.{:03}", d.as_secs() % 100_000, d.subsec_millis()))
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unknown_event_is_silent() {
        let v = EventVisitor {
            event: Some("rescan".to_string()),
            ..Default::default()
        };
        assert!(format_event(&v).is_empty());
    }

    #[test]
    fn test_aborted_reports_last_sequence() {
        let v = EventVisitor {
            event: Some("cluster_aborted".to_string()),
            last_sequence: Some(4_200),
            error: Some("Degenerate distance".to_string()),
            ..Default::default()
        };
        let out = format_event(&v);
        assert!(out.contains("4,200"));
        assert!(out.contains("Degenerate distance"));
    }

    #[test]
    fn test_end_summary_lists_counters() {
        let v = EventVisitor {
            event: Some("cluster_end".to_string()),
            merges: Some(12_345),
            cache_hits: Some(7),
            ..Default::default()
        };
        let out = format_event(&v);
        assert!(out.contains("12,345"));
        assert!(out.contains("Cache hits:"));
    }
}
