use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::CloudError;

/// A decoded Proxmox task handle.
///
/// The wire format is nine colon-separated segments:
/// `UPID:{node}:{pid}:{pstart}:{starttime}:{type}:{id}:{user}:{comment}`
/// where `pid`, `pstart` and `starttime` are hex-encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upid {
    pub raw: String,
    pub node: String,
    pub pid: u32,
    pub pstart: u64,
    pub starttime: i64,
    pub task_type: String,
    pub id: String,
    pub user: String,
    pub comment: String,
}

impl Upid {
    pub fn parse(raw: &str) -> Result<Self, CloudError> {
        let segments: Vec<&str> = raw.splitn(9, ':').collect();
        if segments.len() != 9 || segments[0] != "UPID" || segments[1].is_empty() {
            return Err(CloudError::InvalidUpid(raw.to_string()));
        }

        let hex = |segment: &str| {
            u64::from_str_radix(segment, 16)
                .map_err(|_| CloudError::InvalidUpid(raw.to_string()))
        };

        Ok(Upid {
            raw: raw.to_string(),
            node: segments[1].to_string(),
            pid: hex(segments[2])? as u32,
            pstart: hex(segments[3])?,
            starttime: hex(segments[4])? as i64,
            task_type: segments[5].to_string(),
            id: segments[6].to_string(),
            user: segments[7].to_string(),
            comment: segments[8].to_string(),
        })
    }

    /// Task start time according to the handle itself.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.starttime, 0)
    }
}

impl FromStr for Upid {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Upid::parse(s)
    }
}

impl fmt::Display for Upid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "UPID:pve1:0003B4E2:0779E2A5:66A8C4B2:qmcreate:123:root@pam!provision:";

    #[test]
    fn decodes_all_segments() {
        let upid = Upid::parse(SAMPLE).unwrap();
        assert_eq!(upid.node, "pve1");
        assert_eq!(upid.pid, 0x0003B4E2);
        assert_eq!(upid.pstart, 0x0779E2A5);
        assert_eq!(upid.starttime, 0x66A8C4B2);
        assert_eq!(upid.task_type, "qmcreate");
        assert_eq!(upid.id, "123");
        assert_eq!(upid.user, "root@pam!provision");
        assert_eq!(upid.comment, "");
    }

    #[test]
    fn exposes_start_time() {
        let upid = Upid::parse(SAMPLE).unwrap();
        assert_eq!(upid.started_at().unwrap().timestamp(), 0x66A8C4B2);
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(Upid::parse("TASK:pve1:0:0:0:qmcreate:1:root@pam:").is_err());
    }

    #[test]
    fn rejects_truncated_handle() {
        assert!(Upid::parse("UPID:pve1:0003B4E2").is_err());
    }

    #[test]
    fn rejects_non_hex_fields() {
        assert!(Upid::parse("UPID:pve1:xyz:0779E2A5:66A8C4B2:qmcreate:1:root@pam:").is_err());
    }

    #[test]
    fn roundtrips_through_display() {
        let upid: Upid = SAMPLE.parse().unwrap();
        assert_eq!(upid.to_string(), SAMPLE);
    }
}
