//! First-generation snapshot format.
//!
//! One `key=value` pair per line. `ts` and `refresh_interval` are reserved
//! keys; every other key is a facility id mapped to `-1` (unknown), `0` (fail)
//! or `1` (good). Blank lines and lines starting with `#` are ignored.
//!
//! The format carries no DNS data and no instances, so facilities read from it
//! are treated as resolving fine and no DNS summary is derived.

use tracing::debug;

use crate::engine::LoadError;
use crate::model::Facility;
use crate::registry::Registry;
use crate::status::StatusCode;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegacySnapshot {
    pub timestamp: Option<i64>,
    pub refresh_interval: Option<u64>,
    pub facilities: Registry,
}

pub fn parse(text: &str) -> Result<LegacySnapshot, LoadError> {
    let mut snapshot = LegacySnapshot::default();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(malformed(line_no, "expected key=value"));
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "" => return Err(malformed(line_no, "empty key")),
            "ts" => {
                let ts = value
                    .parse::<i64>()
                    .map_err(|_| malformed(line_no, "timestamp is not an integer"))?;
                snapshot.timestamp = Some(ts);
            }
            "refresh_interval" => {
                let secs = value
                    .parse::<i64>()
                    .map_err(|_| malformed(line_no, "refresh interval is not an integer"))?;
                snapshot.refresh_interval = u64::try_from(secs).ok().filter(|s| *s > 0);
            }
            id => {
                let status = match value {
                    "-1" => StatusCode::Unknown,
                    "0" => StatusCode::Fail,
                    "1" => StatusCode::Good,
                    _ => return Err(malformed(line_no, "status must be -1, 0 or 1")),
                };

                if status == StatusCode::Unknown {
                    debug!(%id, "skipping legacy facility with unknown status");
                    snapshot.facilities.shift_remove(id);
                    continue;
                }

                let mut facility = Facility::probed(id);
                facility.dns = StatusCode::Good;
                facility.status = Some(status);
                snapshot.facilities.insert(id.to_string(), facility);
            }
        }
    }

    Ok(snapshot)
}

fn malformed(line: usize, reason: &str) -> LoadError {
    LoadError::Legacy {
        line,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_snapshot() {
        let text = "\
# written by valen 1.x
ts=1330000000
refresh_interval=600

www.wesnoth.org=1
server.wesnoth.org = 0
";
        let snapshot = parse(text).unwrap();
        assert_eq!(snapshot.timestamp, Some(1_330_000_000));
        assert_eq!(snapshot.refresh_interval, Some(600));

        let ids: Vec<&str> = snapshot.facilities.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["www.wesnoth.org", "server.wesnoth.org"]);
        assert_eq!(snapshot.facilities["www.wesnoth.org"].overall(), StatusCode::Good);
        assert_eq!(snapshot.facilities["server.wesnoth.org"].overall(), StatusCode::Fail);
    }

    #[test]
    fn test_unknown_entries_skipped() {
        let snapshot = parse("a.org=1\nb.org=-1\n").unwrap();
        assert_eq!(snapshot.facilities.len(), 1);
        assert!(!snapshot.facilities.contains_key("b.org"));
    }

    #[test]
    fn test_later_entries_win() {
        let snapshot = parse("a.org=1\na.org=0\n").unwrap();
        assert_eq!(snapshot.facilities["a.org"].status, Some(StatusCode::Fail));

        let snapshot = parse("a.org=1\na.org=-1\n").unwrap();
        assert!(snapshot.facilities.is_empty());
    }

    #[test]
    fn test_non_positive_interval_ignored() {
        let snapshot = parse("refresh_interval=0\n").unwrap();
        assert_eq!(snapshot.refresh_interval, None);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(parse("a.org"), Err(LoadError::Legacy { line: 1, .. })));
        assert!(matches!(parse("ok=1\n=1"), Err(LoadError::Legacy { line: 2, .. })));
        assert!(matches!(parse("a.org=2"), Err(LoadError::Legacy { .. })));
        assert!(matches!(parse("ts=yesterday"), Err(LoadError::Legacy { .. })));
    }
}
