use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use valen_core::config::ValenConfig;
use valen_core::display::{self, next_refresh_delay};
use valen_core::{Engine, Report, StatusCode};

/// One-line digest of a report, e.g. `ok=5 issues=1 offline=0 (DNS: Issues)`
pub fn summary_line(report: &Report) -> String {
    if !report.is_available() {
        return "report unavailable".to_string();
    }

    let (mut ok, mut issues, mut offline) = (0, 0, 0);
    for facility in report.visible() {
        match facility.overall() {
            StatusCode::Good => ok += 1,
            StatusCode::Fail => offline += 1,
            _ => issues += 1,
        }
    }

    let mut line = format!("ok={} issues={} offline={}", ok, issues, offline);
    if let Some(dns) = report.get(valen_core::model::DNS_FACILITY_ID) {
        line.push_str(&format!(" (DNS: {})", display::facility_label(dns.overall())));
    }
    line
}

/// Re-read the snapshot on every refresh boundary until interrupted
pub async fn run_watch(config: &ValenConfig) {
    loop {
        let engine = Engine::cycle(config);
        println!("{}", summary_line(engine.report()));

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let delay = next_refresh_delay(now, engine.refresh_interval());
        info!(secs = delay.as_secs(), "next refresh");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping watch");
                break;
            }
        }
    }
}
