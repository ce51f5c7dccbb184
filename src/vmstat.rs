// Cumulative swap page counters from /proc/vmstat
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const VMSTAT: &str = "/proc/vmstat";

const PAGES_IN_TAG: &str = "pswpin ";
const PAGES_OUT_TAG: &str = "pswpout ";

/// Pages swapped in/out since boot.
/// When `present` is false the source was unreadable or incomplete and
/// both counters are zero, never partial.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageCounters {
    pub pages_in: u64,
    pub pages_out: u64,
    pub present: bool,
}

/// Read the pswpin/pswpout counters.
pub fn read_page_counters() -> PageCounters {
    counters_from(VMSTAT)
}

pub(crate) fn counters_from<P: AsRef<Path>>(path: P) -> PageCounters {
    match File::open(path) {
        Ok(file) => scan_counters(BufReader::new(file)),
        Err(_) => PageCounters::default(),
    }
}

/// Scan lines for both tags, stopping as soon as both have been seen.
/// A tagged line with an unparsable value counts as seen with value zero.
fn scan_counters<R: BufRead>(input: R) -> PageCounters {
    let mut pages_in = None;
    let mut pages_out = None;

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        if pages_in.is_none() && line.starts_with(PAGES_IN_TAG) {
            pages_in = Some(tag_value(&line));
        } else if pages_out.is_none() && line.starts_with(PAGES_OUT_TAG) {
            pages_out = Some(tag_value(&line));
        }

        if let (Some(pages_in), Some(pages_out)) = (pages_in, pages_out) {
            return PageCounters {
                pages_in,
                pages_out,
                present: true,
            };
        }
    }

    PageCounters::default()
}

fn tag_value(line: &str) -> u64 {
    line.split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_vmstat(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmstat");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_both_counters_found() {
        let (_dir, path) = write_vmstat(
            "nr_free_pages 123\npswpin 42\nnr_dirty 9\npswpout 77\npgfault 1\n",
        );
        let counters = counters_from(&path);
        assert_eq!(
            counters,
            PageCounters {
                pages_in: 42,
                pages_out: 77,
                present: true
            }
        );
    }

    #[test]
    fn test_order_does_not_matter() {
        let (_dir, path) = write_vmstat("pswpout 5\npswpin 3\n");
        let counters = counters_from(&path);
        assert_eq!(counters.pages_in, 3);
        assert_eq!(counters.pages_out, 5);
        assert!(counters.present);
    }

    #[test]
    fn test_missing_one_tag_reports_nothing() {
        let (_dir, path) = write_vmstat("pswpin 42\npgfault 1\n");
        assert_eq!(counters_from(&path), PageCounters::default());
    }

    #[test]
    fn test_tag_must_be_whole_token() {
        // "pswpindex" must not satisfy the pswpin tag
        let (_dir, path) = write_vmstat("pswpindex 42\npswpout 7\n");
        assert_eq!(counters_from(&path), PageCounters::default());
    }

    #[test]
    fn test_missing_file_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let counters = counters_from(dir.path().join("no-vmstat"));
        assert_eq!(counters, PageCounters::default());
    }

    #[test]
    fn test_malformed_value_counts_as_zero() {
        let (_dir, path) = write_vmstat("pswpin garbage\npswpout 9\n");
        let counters = counters_from(&path);
        assert_eq!(counters.pages_in, 0);
        assert_eq!(counters.pages_out, 9);
        assert!(counters.present);
    }

    #[test]
    fn test_read_live_counters() {
        // Hosts without swap may legitimately report nothing; must not panic
        let _ = read_page_counters();
    }

    #[test]
    fn test_first_occurrence_wins() {
        let (_dir, path) = write_vmstat("pswpin 1\npswpout 2\npswpin 100\n");
        let counters = counters_from(&path);
        assert_eq!(counters.pages_in, 1);
        assert_eq!(counters.pages_out, 2);
    }
}
