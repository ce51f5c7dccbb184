// Swap area enumeration and I/O aggregation over /proc/swaps
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::debug;
use crate::diskstats::{self, Direction};
use crate::vmstat;

const SWAPS: &str = "/proc/swaps";
const DISKSTATS: &str = "/proc/diskstats";
const VMSTAT: &str = "/proc/vmstat";

/// Block device paths in the swap listing carry this prefix.
pub const DEV_PREFIX: &str = "/dev/";

#[derive(Error, Debug)]
pub enum SwapAreasError {
    #[error("cannot open {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SwapAreasError>;

/// Swap I/O totals for one direction across all matched swap areas.
/// `got_data` distinguishes "zero activity" from "nothing observable".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwapActivity {
    pub io_ops: u64,
    pub sectors: u64,
    pub pages: u64,
    pub got_data: bool,
}

/// Aggregate swap device statistics for one direction.
///
/// `device` filters the swap areas: empty or "all" aggregates every block
/// device and additionally reads the host-wide page counters; any other
/// name selects areas by path prefix, with "/dev/" prepended when missing.
pub fn gather(device: &str, direction: Direction) -> Result<SwapActivity> {
    gather_from(
        Path::new(SWAPS),
        Path::new(DISKSTATS),
        Path::new(VMSTAT),
        device,
        direction,
    )
}

fn gather_from(
    swaps_path: &Path,
    diskstats_path: &Path,
    vmstat_path: &Path,
    device: &str,
    direction: Direction,
) -> Result<SwapActivity> {
    let mut totals = SwapActivity::default();
    let filter = normalize_filter(device);

    // Host-wide page counters only apply to the unfiltered aggregate.
    if filter.is_none() {
        let counters = vmstat::counters_from(vmstat_path);
        totals.pages = match direction {
            Direction::In => counters.pages_in,
            Direction::Out => counters.pages_out,
        };
        totals.got_data = counters.present;
    }

    let file = File::open(swaps_path).map_err(|source| SwapAreasError::SourceUnavailable {
        path: swaps_path.to_path_buf(),
        source,
    })?;

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        // First token is the swap area path; the header and swap files
        // never carry the device prefix.
        let area = match line.split_whitespace().next() {
            Some(area) => area,
            None => continue,
        };
        if !area.starts_with(DEV_PREFIX) {
            continue;
        }
        if let Some(ref wanted) = filter {
            if !area.starts_with(wanted.as_str()) {
                continue;
            }
        }

        // One unreadable device must not abort the aggregation.
        let target = match diskstats::device_identity(area) {
            Ok(target) => target,
            Err(e) => {
                debug!("skipping swap area {}: {}", area, e);
                continue;
            }
        };
        if let Some(stats) = diskstats::stats_from(diskstats_path, target, direction) {
            totals.io_ops = totals.io_ops.saturating_add(stats.io_ops);
            totals.sectors = totals.sectors.saturating_add(stats.sectors);
            totals.got_data = true;
        }
    }

    Ok(totals)
}

/// Empty and "all" mean no filter; a bare device name gets the device
/// prefix prepended, an already-prefixed one is used as is.
fn normalize_filter(device: &str) -> Option<String> {
    match device {
        "" | "all" => None,
        d if d.starts_with(DEV_PREFIX) => Some(d.to_string()),
        d => Some(format!("{}{}", DEV_PREFIX, d)),
    }
}
