use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ValenConfig;
use crate::dns;
use crate::envelope::Envelope;
use crate::legacy;
use crate::model::{DEFAULT_REFRESH_INTERVAL, Report};
use crate::registry::{Registry, build_registry};
use crate::source::{FileSource, SnapshotSource};
use crate::status::StatusCode;

/// Why a snapshot or notice could not be applied
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {location}: {source}")]
    Unavailable {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("malformed legacy snapshot at line {line}: {reason}")]
    Legacy { line: usize, reason: String },
    #[error("notice is empty")]
    EmptyNotice,
}

/// Wire format of the snapshot source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Json,
    /// Line-oriented `key=value` format of the first-generation monitor
    Legacy,
}

/// The report for one evaluation cycle.
///
/// An `Engine` is meant to be built per cycle (per request, per tick). Loads
/// are all-or-nothing: a failed load leaves the current report as it was and
/// is only logged. [`Engine::refresh`] starts a new cycle by discarding the
/// current report before loading, so nothing carries over from an earlier
/// successful load.
#[derive(Clone, Debug)]
pub struct Engine {
    report: Report,
    default_refresh_interval: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_default_refresh_interval(DEFAULT_REFRESH_INTERVAL)
    }

    /// Zero falls back to [`DEFAULT_REFRESH_INTERVAL`]
    pub fn with_default_refresh_interval(secs: u64) -> Self {
        let default_refresh_interval = if secs > 0 {
            secs
        } else {
            DEFAULT_REFRESH_INTERVAL
        };
        Self {
            report: Report::empty(default_refresh_interval),
            default_refresh_interval,
        }
    }

    /// Run one full cycle against the files named in `config`
    pub fn cycle(config: &ValenConfig) -> Self {
        let mut engine = Self::with_default_refresh_interval(config.refresh_interval);
        let snapshot = FileSource::new(&config.report_file);
        let notice = FileSource::new(&config.notice_file);
        engine.refresh(&snapshot, config.format, Some(&notice));
        engine
    }

    /// Discard the current report and load a fresh one
    pub fn refresh(
        &mut self,
        snapshot: &dyn SnapshotSource,
        format: SnapshotFormat,
        notice: Option<&dyn SnapshotSource>,
    ) {
        self.reset();
        match format {
            SnapshotFormat::Json => self.load(snapshot),
            SnapshotFormat::Legacy => self.load_legacy(snapshot),
        }
        if let Some(notice) = notice {
            self.load_notice(notice);
        }
    }

    /// Back to an empty, unavailable report
    pub fn reset(&mut self) {
        self.report = Report::empty(self.default_refresh_interval);
    }

    pub fn load(&mut self, source: &dyn SnapshotSource) {
        if let Err(e) = self.try_load(source) {
            warn!(source = %source.describe(), error = %e, "snapshot not loaded");
        }
    }

    pub fn try_load(&mut self, source: &dyn SnapshotSource) -> Result<(), LoadError> {
        let bytes = read(source)?;
        let envelope = Envelope::from_slice(&bytes)?;

        let timestamp = envelope.timestamp();
        let refresh_interval = envelope.refresh_interval();
        let mut facilities = build_registry(envelope.facilities);
        dns::synthesize(&mut facilities);

        debug!(
            source = %source.describe(),
            facilities = facilities.len(),
            ?timestamp,
            "snapshot loaded"
        );
        self.install(facilities, timestamp, refresh_interval);
        Ok(())
    }

    pub fn load_legacy(&mut self, source: &dyn SnapshotSource) {
        if let Err(e) = self.try_load_legacy(source) {
            warn!(source = %source.describe(), error = %e, "legacy snapshot not loaded");
        }
    }

    pub fn try_load_legacy(&mut self, source: &dyn SnapshotSource) -> Result<(), LoadError> {
        let bytes = read(source)?;
        let snapshot = legacy::parse(&String::from_utf8_lossy(&bytes))?;

        debug!(
            source = %source.describe(),
            facilities = snapshot.facilities.len(),
            timestamp = ?snapshot.timestamp,
            "legacy snapshot loaded"
        );
        self.install(
            snapshot.facilities,
            snapshot.timestamp,
            snapshot.refresh_interval,
        );
        Ok(())
    }

    pub fn load_notice(&mut self, source: &dyn SnapshotSource) {
        match self.try_load_notice(source) {
            Ok(()) => {}
            Err(LoadError::EmptyNotice) => debug!(source = %source.describe(), "notice is empty"),
            Err(e) => debug!(source = %source.describe(), error = %e, "no notice"),
        }
    }

    /// Leading and trailing whitespace is dropped; an empty notice is an error
    /// and leaves any current notice in place. A lone `0` counts as empty.
    pub fn try_load_notice(&mut self, source: &dyn SnapshotSource) -> Result<(), LoadError> {
        let bytes = read(source)?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim();
        if text.is_empty() || text == "0" {
            return Err(LoadError::EmptyNotice);
        }
        self.report.site_notice = Some(text.to_string());
        Ok(())
    }

    fn install(&mut self, facilities: Registry, timestamp: Option<i64>, refresh_interval: Option<u64>) {
        // The notice comes from its own source and survives a snapshot reload.
        let site_notice = self.report.site_notice.take();
        self.report = Report {
            facilities,
            timestamp,
            refresh_interval: refresh_interval.unwrap_or(self.default_refresh_interval),
            site_notice,
        };
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    pub fn overall(&self, id: &str) -> StatusCode {
        self.report.overall(id)
    }

    pub fn is_available(&self) -> bool {
        self.report.is_available()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.report.timestamp
    }

    pub fn refresh_interval(&self) -> u64 {
        self.report.refresh_interval
    }

    pub fn site_notice(&self) -> Option<&str> {
        self.report.site_notice.as_deref()
    }
}

fn read(source: &dyn SnapshotSource) -> Result<Vec<u8>, LoadError> {
    source.read().map_err(|e| LoadError::Unavailable {
        location: source.describe(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DNS_FACILITY_ID;
    use crate::source::MemorySource;

    const SNAPSHOT: &str = r#"{
        "ts": 1700000000,
        "refresh_interval": 300,
        "facilities": [
            {"hostname": "www.wesnoth.org", "name": "Website", "dns": 1, "status": 1},
            {"hostname": "forums.wesnoth.org", "dns": "1",
             "instances": [{"id": "web1", "status": 1}, {"id": "web2", "status": 0}]},
            {"hostname": null, "name": "Orphan", "dns": 1},
            {"hostname": "server.wesnoth.org", "dns": "0", "hidden": true}
        ]
    }"#;

    fn loaded() -> Engine {
        let mut engine = Engine::new();
        engine.try_load(&MemorySource::from(SNAPSHOT)).unwrap();
        engine
    }

    #[test]
    fn test_load_builds_report() {
        let engine = loaded();

        assert!(engine.is_available());
        assert_eq!(engine.timestamp(), Some(1_700_000_000));
        assert_eq!(engine.refresh_interval(), 300);

        let ids: Vec<&str> = engine.report().facilities.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec![DNS_FACILITY_ID, "www.wesnoth.org", "forums.wesnoth.org", "server.wesnoth.org"]
        );

        assert_eq!(engine.overall(DNS_FACILITY_ID), StatusCode::DnsBad);
        assert_eq!(engine.overall("www.wesnoth.org"), StatusCode::Good);
        assert_eq!(engine.overall("forums.wesnoth.org"), StatusCode::Incomplete);
        assert_eq!(engine.overall("server.wesnoth.org"), StatusCode::DnsBad);
        assert_eq!(engine.overall("Orphan"), StatusCode::Unknown);

        let dns = engine.report().get(DNS_FACILITY_ID).unwrap();
        assert_eq!(dns.status, Some(StatusCode::Incomplete));
        assert_eq!(dns.broken_dns_hostnames(), ["server.wesnoth.org".to_string()]);
    }

    #[test]
    fn test_n_facilities_give_n_plus_one_entries() {
        let json = r#"{"ts": 1, "facilities": [
            {"hostname": "c.org", "dns": 1},
            {"hostname": "a.org", "dns": 1},
            {"hostname": "b.org", "dns": 1}
        ]}"#;
        let mut engine = Engine::new();
        engine.try_load(&MemorySource::from(json)).unwrap();

        let ids: Vec<&str> = engine.report().facilities.keys().map(String::as_str).collect();
        assert_eq!(ids, vec![DNS_FACILITY_ID, "c.org", "a.org", "b.org"]);
    }

    #[test]
    fn test_hostname_collision_keeps_later_record() {
        let json = r#"{"ts": 1, "facilities": [
            {"hostname": "a.org", "name": "Old", "dns": 1},
            {"hostname": "a.org", "name": "New", "dns": 0}
        ]}"#;
        let mut engine = Engine::new();
        engine.try_load(&MemorySource::from(json)).unwrap();

        assert_eq!(engine.report().len(), 2);
        let facility = engine.report().get("a.org").unwrap();
        assert_eq!(facility.name, "New");
        assert_eq!(engine.overall("a.org"), StatusCode::DnsBad);
    }

    #[test]
    fn test_empty_facility_list_still_gets_dns_summary() {
        let mut engine = Engine::new();
        engine
            .try_load(&MemorySource::from(r#"{"ts": 5, "facilities": []}"#))
            .unwrap();

        assert_eq!(engine.report().len(), 1);
        assert_eq!(
            engine.report().get(DNS_FACILITY_ID).unwrap().status,
            Some(StatusCode::Fail)
        );
        assert_eq!(engine.overall(DNS_FACILITY_ID), StatusCode::Fail);
    }

    #[test]
    fn test_missing_ts_means_unavailable() {
        let mut engine = Engine::new();
        engine
            .try_load(&MemorySource::from(r#"{"facilities": [{"hostname": "a.org", "dns": 1}]}"#))
            .unwrap();

        assert!(!engine.is_available());
        assert_eq!(engine.report().len(), 2);
    }

    #[test]
    fn test_imperfect_entries_keep_snapshot_available() {
        let mut engine = Engine::new();
        engine
            .try_load(&MemorySource::from(
                r#"{"ts": 1, "facilities": [
                    null,
                    {"hostname": "a.org", "dns": 1,
                     "links": [{"url": "https://a.org/", "title": null}],
                     "instances": [{"id": 1, "status": 1}]}
                ]}"#,
            ))
            .unwrap();

        assert!(engine.is_available());
        let ids: Vec<&str> = engine.report().facilities.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["DNS", "a.org"]);
        let facility = &engine.report().facilities["a.org"];
        assert_eq!(facility.links[0].title, "");
        assert_eq!(facility.instances[0].id, "1");
        assert_eq!(engine.overall("a.org"), StatusCode::Good);
    }

    #[test]
    fn test_malformed_snapshot_is_not_applied() {
        let mut engine = loaded();
        let before = engine.report().clone();

        for bad in [r#"{"ts": 2, "facilities": [{"hostname": "x.org""#, r#"{"ts": 2}"#, "", "null"] {
            let err = engine.try_load(&MemorySource::from(bad)).unwrap_err();
            assert!(matches!(err, LoadError::Malformed(_)), "input {:?}", bad);
            engine.load(&MemorySource::from(bad));
            assert_eq!(engine.report(), &before);
        }
    }

    #[test]
    fn test_unreadable_source_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileSource::new(dir.path().join("report.json"));

        let mut engine = Engine::new();
        assert!(matches!(
            engine.try_load(&missing),
            Err(LoadError::Unavailable { .. })
        ));
        engine.load(&missing);

        assert!(!engine.is_available());
        assert!(engine.report().is_empty());
        assert_eq!(engine.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn test_refresh_discards_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, SNAPSHOT).unwrap();
        let source = FileSource::new(&path);

        let mut engine = Engine::new();
        engine.refresh(&source, SnapshotFormat::Json, None);
        assert!(engine.is_available());
        assert_eq!(engine.refresh_interval(), 300);

        std::fs::remove_file(&path).unwrap();
        engine.refresh(&source, SnapshotFormat::Json, None);

        assert!(!engine.is_available());
        assert!(engine.report().is_empty());
        assert_eq!(engine.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn test_refresh_interval_override() {
        let mut engine = Engine::with_default_refresh_interval(120);
        engine
            .try_load(&MemorySource::from(r#"{"ts": 1, "refresh_interval": -1, "facilities": []}"#))
            .unwrap();
        assert_eq!(engine.refresh_interval(), 120);

        engine
            .try_load(&MemorySource::from(r#"{"ts": 1, "refresh_interval": 60, "facilities": []}"#))
            .unwrap();
        assert_eq!(engine.refresh_interval(), 60);

        assert_eq!(
            Engine::with_default_refresh_interval(0).refresh_interval(),
            DEFAULT_REFRESH_INTERVAL
        );
    }

    #[test]
    fn test_notice_trimmed() {
        let mut engine = Engine::new();
        engine
            .try_load_notice(&MemorySource::from("\n  Planned maintenance at 18:00 UTC.  \n"))
            .unwrap();
        assert_eq!(engine.site_notice(), Some("Planned maintenance at 18:00 UTC."));
    }

    #[test]
    fn test_blank_notice_is_no_notice() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.try_load_notice(&MemorySource::from(" \n\t ")),
            Err(LoadError::EmptyNotice)
        ));
        assert_eq!(engine.site_notice(), None);
    }

    #[test]
    fn test_zero_notice_is_no_notice() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.try_load_notice(&MemorySource::from(" 0\n")),
            Err(LoadError::EmptyNotice)
        ));
        assert_eq!(engine.site_notice(), None);

        engine.try_load_notice(&MemorySource::from("00")).unwrap();
        assert_eq!(engine.site_notice(), Some("00"));
    }

    #[test]
    fn test_notice_survives_snapshot_load() {
        let mut engine = Engine::new();
        engine.load_notice(&MemorySource::from("Heads up"));
        engine.load(&MemorySource::from(SNAPSHOT));
        assert_eq!(engine.site_notice(), Some("Heads up"));
    }

    #[test]
    fn test_refresh_legacy_format() {
        let mut engine = Engine::new();
        engine.refresh(
            &MemorySource::from("ts=10\nwww.wesnoth.org=1\nserver.wesnoth.org=0\n"),
            SnapshotFormat::Legacy,
            Some(&MemorySource::from("notice")),
        );

        assert!(engine.is_available());
        assert_eq!(engine.report().len(), 2);
        assert!(engine.report().get(DNS_FACILITY_ID).is_none());
        assert_eq!(engine.overall("server.wesnoth.org"), StatusCode::Fail);
        assert_eq!(engine.site_notice(), Some("notice"));
    }

    #[test]
    fn test_cycle_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let report_file = dir.path().join("report.json");
        let notice_file = dir.path().join("notice.html");
        std::fs::write(&report_file, SNAPSHOT).unwrap();
        std::fs::write(&notice_file, "Down for upgrades").unwrap();

        let config = ValenConfig {
            report_file,
            notice_file,
            refresh_interval: 60,
            ..ValenConfig::default()
        };
        let engine = Engine::cycle(&config);

        assert!(engine.is_available());
        assert_eq!(engine.report().len(), 4);
        assert_eq!(engine.site_notice(), Some("Down for upgrades"));
    }

    #[test]
    fn test_format_names() {
        let format: SnapshotFormat = serde_yaml::from_str("legacy").unwrap();
        assert_eq!(format, SnapshotFormat::Legacy);
        assert_eq!(SnapshotFormat::default(), SnapshotFormat::Json);
    }
}
