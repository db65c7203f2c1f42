use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stable identity of a worker: the id of the worker's dedicated channel.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self(channel_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session state and running total for one worker.
///
/// `clock_in_timestamp` is present iff the worker has an open session.
/// `accumulated_minutes` only ever grows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    #[serde(default, alias = "ingreso", deserialize_with = "deserialize_clock_in")]
    pub clock_in_timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "total_minutos")]
    pub accumulated_minutes: f64,
}

impl WorkerRecord {
    pub fn is_clocked_in(&self) -> bool {
        self.clock_in_timestamp.is_some()
    }
}

fn deserialize_clock_in<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    parse_timestamp(trimmed).map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid clock-in timestamp `{trimmed}`"))
    })
}

/// Parses an RFC 3339 timestamp, or a naive ISO-8601 one read as host
/// local time.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    // Documents written by the previous bot carry naive local timestamps.
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive_local_to_utc(&Local, naive))
}

fn naive_local_to_utc<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Wall time skipped by a DST jump: use the offset in force around it.
        None => {
            let offset = zone.offset_from_utc_datetime(&naive).fix().local_minus_utc();
            (naive - Duration::seconds(i64::from(offset))).and_utc()
        }
    }
}
