// Per-block-device I/O counters from /proc/diskstats
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use nix::sys::stat::{major, minor, stat};
use thiserror::Error;

const DISKSTATS: &str = "/proc/diskstats";

#[derive(Error, Debug)]
pub enum DeviceStatError {
    #[error("cannot obtain device metadata for {}: {source}", path.display())]
    Lookup { path: PathBuf, source: nix::Error },
}

pub type Result<T> = std::result::Result<T, DeviceStatError>;

/// Kernel identity of a block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub major: u32,
    pub minor: u32,
}

impl DeviceIdentity {
    /// Decompose a packed rdev into (major, minor).
    pub fn from_rdev(rdev: u64) -> Self {
        Self {
            major: major(rdev) as u32,
            minor: minor(rdev) as u32,
        }
    }
}

/// Transfer direction, selecting the read or write counter columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// I/O operation and sector counters for one device, one direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIoStats {
    pub io_ops: u64,
    pub sectors: u64,
}

/// Resolve a device path to its kernel (major, minor) identity.
pub fn device_identity<P: AsRef<Path>>(path: P) -> Result<DeviceIdentity> {
    let path = path.as_ref();
    let st = stat(path).map_err(|source| DeviceStatError::Lookup {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DeviceIdentity::from_rdev(st.st_rdev))
}

/// Read the I/O counters of the device at `path` for one direction.
/// Returns Ok(None) when /proc/diskstats is unavailable or carries no row
/// for the device; only a failed identity lookup is an error.
pub fn device_io_stats<P: AsRef<Path>>(path: P, direction: Direction) -> Result<Option<DeviceIoStats>> {
    let target = device_identity(path)?;
    Ok(stats_from(DISKSTATS, target, direction))
}

/// The stats file may be absent in constrained environments (containers);
/// that is "no data", not an error.
pub(crate) fn stats_from<P: AsRef<Path>>(
    path: P,
    target: DeviceIdentity,
    direction: Direction,
) -> Option<DeviceIoStats> {
    let file = File::open(path).ok()?;
    find_device_row(BufReader::new(file), target, direction)
}

/// Scan rows for the target identity and extract its counters.
///
/// Two row formats exist: the legacy 7-field partition format and the
/// extended format with 10 or more fields. The counter columns differ:
///
///   fields  direction  io_ops  sectors
///   7       In         3       4
///   7       Out        5       6
///   >=10    In         3       5
///   >=10    Out        7       9
///
/// Rows with any other field count, unparsable major/minor, or unparsable
/// counter columns are skipped and the scan continues.
fn find_device_row<R: BufRead>(
    input: R,
    target: DeviceIdentity,
    direction: Direction,
) -> Option<DeviceIoStats> {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let fields: Vec<&str> = line.split_whitespace().collect();

        let (io_idx, sect_idx) = match (fields.len(), direction) {
            (7, Direction::In) => (3, 4),
            (7, Direction::Out) => (5, 6),
            (n, Direction::In) if n >= 10 => (3, 5),
            (n, Direction::Out) if n >= 10 => (7, 9),
            _ => continue,
        };

        let row = match (fields[0].parse::<u32>(), fields[1].parse::<u32>()) {
            (Ok(major), Ok(minor)) => DeviceIdentity { major, minor },
            _ => continue,
        };
        if row != target {
            continue;
        }

        match (fields[io_idx].parse::<u64>(), fields[sect_idx].parse::<u64>()) {
            (Ok(io_ops), Ok(sectors)) => return Some(DeviceIoStats { io_ops, sectors }),
            _ => continue,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::makedev;

    const SDA1: DeviceIdentity = DeviceIdentity { major: 8, minor: 1 };

    fn write_diskstats(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diskstats");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_from_rdev_roundtrip() {
        let ident = DeviceIdentity::from_rdev(makedev(8, 17));
        assert_eq!(
            ident,
            DeviceIdentity {
                major: 8,
                minor: 17
            }
        );
    }

    #[test]
    fn test_extended_format_columns() {
        // 14-field row: io/sector columns are (3,5) reading, (7,9) writing
        let (_dir, path) = write_diskstats(
            "   8       0 sda 961 1438 63316 886 121 330 3584 859 0 1130 1746\n   8       1 sda1 100 10 200 20 300 30 400 40 0 50 60\n",
        );
        assert_eq!(
            stats_from(&path, SDA1, Direction::In),
            Some(DeviceIoStats {
                io_ops: 100,
                sectors: 200
            })
        );
        assert_eq!(
            stats_from(&path, SDA1, Direction::Out),
            Some(DeviceIoStats {
                io_ops: 300,
                sectors: 400
            })
        );
    }

    #[test]
    fn test_legacy_format_columns() {
        // 7-field row: io/sector columns are (3,4) reading, (5,6) writing
        let (_dir, path) = write_diskstats("8 1 sda1 11 22 33 44\n");
        assert_eq!(
            stats_from(&path, SDA1, Direction::In),
            Some(DeviceIoStats {
                io_ops: 11,
                sectors: 22
            })
        );
        assert_eq!(
            stats_from(&path, SDA1, Direction::Out),
            Some(DeviceIoStats {
                io_ops: 33,
                sectors: 44
            })
        );
    }

    #[test]
    fn test_unrecognized_field_count_is_skipped() {
        // 8 fields is neither format
        let (_dir, path) = write_diskstats("8 1 sda1 1 2 3 4 5\n");
        assert_eq!(stats_from(&path, SDA1, Direction::In), None);
    }

    #[test]
    fn test_no_matching_identity() {
        let (_dir, path) = write_diskstats("8 2 sda2 11 22 33 44\n");
        assert_eq!(stats_from(&path, SDA1, Direction::In), None);
    }

    #[test]
    fn test_unparsable_major_minor_is_skipped() {
        let (_dir, path) = write_diskstats("x 1 bad 11 22 33 44\n8 y bad 11 22 33 44\n");
        assert_eq!(stats_from(&path, SDA1, Direction::In), None);
    }

    #[test]
    fn test_unparsable_counter_skips_row_and_scan_continues() {
        // First row matches the identity but its write sector column is
        // corrupt; the second, duplicate row must still be found.
        let (_dir, path) = write_diskstats("8 1 sda1 11 22 33 bad\n8 1 sda1 55 66 77 88\n");
        assert_eq!(
            stats_from(&path, SDA1, Direction::Out),
            Some(DeviceIoStats {
                io_ops: 77,
                sectors: 88
            })
        );
    }

    #[test]
    fn test_missing_stats_file_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-diskstats");
        assert_eq!(stats_from(&path, SDA1, Direction::In), None);
    }

    #[test]
    fn test_device_io_stats_live() {
        // /dev/null always stats; whether a row exists depends on the host
        assert!(device_io_stats("/dev/null", Direction::In).is_ok());
    }

    #[test]
    fn test_device_identity_lookup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-device");
        assert!(device_identity(&missing).is_err());
    }
}
