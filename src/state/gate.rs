//! Update gate
//!
//! Decides from the first transaction page whether the registry changed since
//! the last full crawl. A crawl older than the refresh period is redone even
//! when the site looks unchanged.

use crate::crawler::Document;
use crate::extract::latest_transaction_date;
use crate::state::{CrawlState, CrawlStateStore};
use crate::Result;
use chrono::{DateTime, Duration, Utc};

/// Why the gate decided the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    /// No usable baseline (first run or unreadable state)
    NoBaseline,
    /// The newest transaction date moved
    SiteChanged,
    /// Unchanged, but the last crawl is older than the refresh period
    RefreshDue,
    /// Unchanged and recent
    Unchanged,
    /// Crawl requested regardless of the baseline
    Forced,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoBaseline => "no baseline",
            Self::SiteChanged => "site changed",
            Self::RefreshDue => "refresh due",
            Self::Unchanged => "unchanged",
            Self::Forced => "forced",
        }
    }
}

/// Outcome of the update gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub proceed: bool,
    pub reason: GateReason,
    /// State to persist when the gate exits
    pub new_state: CrawlState,
}

/// Compares the registry's newest transaction date with the baseline
pub fn decide(
    site_date: &str,
    previous: Option<&CrawlState>,
    now: DateTime<Utc>,
    refresh_after: Duration,
) -> GateDecision {
    let Some(previous) = previous else {
        return GateDecision {
            proceed: true,
            reason: GateReason::NoBaseline,
            new_state: CrawlState::fresh(now, site_date),
        };
    };

    let unchanged = previous.last_seen_transaction_date == site_date;
    let recent = now - previous.last_crawl_timestamp < refresh_after;

    if unchanged && recent {
        let mut new_state = previous.clone();
        new_state.last_launch = Some(now);
        return GateDecision {
            proceed: false,
            reason: GateReason::Unchanged,
            new_state,
        };
    }

    GateDecision {
        proceed: true,
        reason: if unchanged {
            GateReason::RefreshDue
        } else {
            GateReason::SiteChanged
        },
        new_state: CrawlState::fresh(now, site_date),
    }
}

/// Gate contract on a parsed first transaction page
pub fn should_crawl(
    first_page: &Document,
    previous: Option<&CrawlState>,
    now: DateTime<Utc>,
    refresh_after: Duration,
) -> GateDecision {
    decide(&latest_transaction_date(first_page), previous, now, refresh_after)
}

/// Runs the gate against a state store: load, decide, save
///
/// An unreadable baseline is logged and treated as missing. With `force`,
/// the crawl proceeds and the baseline is reset to this run.
pub fn run_gate(
    store: &dyn CrawlStateStore,
    first_page: &Document,
    now: DateTime<Utc>,
    refresh_days: u32,
    force: bool,
) -> Result<GateDecision> {
    let previous = match store.load() {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Ignoring unreadable crawl state ({}), forcing a full crawl", e);
            None
        }
    };

    let site_date = latest_transaction_date(first_page);
    let mut decision = decide(
        &site_date,
        previous.as_ref(),
        now,
        Duration::days(i64::from(refresh_days)),
    );

    if force && !decision.proceed {
        decision = GateDecision {
            proceed: true,
            reason: GateReason::Forced,
            new_state: CrawlState::fresh(now, site_date.as_str()),
        };
    }

    store.save(&decision.new_state)?;

    if decision.proceed {
        tracing::info!(
            "Update gate: crawling ({}), newest transaction on the registry: {:?}",
            decision.reason.as_str(),
            site_date
        );
    } else {
        tracing::info!(
            "Update gate: registry unchanged since {}, skipping the transaction crawl",
            decision.new_state.last_crawl_timestamp
        );
    }

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FileStateStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn baseline(days_ago: i64, site_date: &str) -> CrawlState {
        CrawlState {
            last_launch: None,
            last_crawl_timestamp: now() - Duration::days(days_ago),
            last_seen_transaction_date: site_date.to_string(),
        }
    }

    fn first_page(date: &str) -> Document {
        Document::parse(&format!(
            r#"<table id="tblTransactionSearchResult">
                <tr><th>h</th></tr><tr><th>h</th></tr>
                <tr><td><span>EU1</span></td><td><span>10-0</span></td><td><span>{}</span></td></tr>
            </table>"#,
            date
        ))
    }

    #[test]
    fn test_first_run_crawls() {
        let decision = decide("2024-05-30", None, now(), Duration::days(90));

        assert!(decision.proceed);
        assert_eq!(decision.reason, GateReason::NoBaseline);
        assert_eq!(decision.new_state.last_seen_transaction_date, "2024-05-30");
        assert_eq!(decision.new_state.last_crawl_timestamp, now());
    }

    #[test]
    fn test_unchanged_and_recent_skips() {
        let previous = baseline(10, "2024-05-30");
        let decision = decide("2024-05-30", Some(&previous), now(), Duration::days(90));

        assert!(!decision.proceed);
        assert_eq!(decision.reason, GateReason::Unchanged);
        assert_eq!(
            decision.new_state.last_crawl_timestamp,
            previous.last_crawl_timestamp
        );
        assert_eq!(decision.new_state.last_launch, Some(now()));
    }

    #[test]
    fn test_changed_site_crawls() {
        let previous = baseline(1, "2024-05-30");
        let decision = decide("2024-05-31", Some(&previous), now(), Duration::days(90));

        assert!(decision.proceed);
        assert_eq!(decision.reason, GateReason::SiteChanged);
        assert_eq!(decision.new_state.last_seen_transaction_date, "2024-05-31");
    }

    #[test]
    fn test_refresh_period_forces_crawl() {
        let previous = baseline(90, "2024-05-30");
        let decision = decide("2024-05-30", Some(&previous), now(), Duration::days(90));

        assert!(decision.proceed);
        assert_eq!(decision.reason, GateReason::RefreshDue);
        assert_eq!(decision.new_state.last_crawl_timestamp, now());
    }

    #[test]
    fn test_gate_reads_first_data_row() {
        let decision = should_crawl(&first_page("2024-05-31 09:00:00"), None, now(), Duration::days(90));
        assert_eq!(
            decision.new_state.last_seen_transaction_date,
            "2024-05-31 09:00:00"
        );
    }

    #[test]
    fn test_second_run_is_gated() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("last_update.txt"));
        let page = first_page("2024-05-31 09:00:00");

        let first = run_gate(&store, &page, now(), 90, false).unwrap();
        let second = run_gate(&store, &page, now() + Duration::hours(1), 90, false).unwrap();

        assert!(first.proceed);
        assert!(!second.proceed);
        assert_eq!(
            store.load().unwrap().unwrap().last_seen_transaction_date,
            "2024-05-31 09:00:00"
        );
    }

    #[test]
    fn test_malformed_state_forces_crawl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_update.txt");
        std::fs::write(&path, "garbage\n").unwrap();
        let store = FileStateStore::new(&path);

        let decision = run_gate(&store, &first_page("2024-05-31"), now(), 90, false).unwrap();

        assert!(decision.proceed);
        assert_eq!(decision.reason, GateReason::NoBaseline);
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_force_overrides_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("last_update.txt"));
        store.save(&baseline(1, "2024-05-31")).unwrap();

        let decision = run_gate(&store, &first_page("2024-05-31"), now(), 90, true).unwrap();

        assert!(decision.proceed);
        assert_eq!(decision.reason, GateReason::Forced);
    }
}
