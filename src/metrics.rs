// Metric registration table and dispatcher
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use thiserror::Error;

use crate::capacity::{self, CapacityError};
use crate::diskstats::Direction;
use crate::swaps::{self, SwapAreasError};

#[derive(Error, Debug)]
pub enum MetricError {
    #[error("unsupported metric key: {0}")]
    UnknownMetric(String),
    #[error("malformed metric key: {0}")]
    MalformedKey(String),
    #[error("Invalid first parameter.")]
    InvalidFirstParameter,
    #[error("Invalid second parameter.")]
    InvalidSecondParameter,
    #[error("Too many parameters.")]
    TooManyParameters,
    #[error("Cannot obtain swap information.")]
    NoSwapData,
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    SwapAreas(#[from] SwapAreasError),
}

pub type Result<T> = std::result::Result<T, MetricError>;

/// Result of one metric evaluation, formatted by Display for the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Unsigned(u64),
    Float(f64),
    /// Device I/O operations, sectors transferred, pages swapped.
    Activity { io_ops: u64, sectors: u64, pages: u64 },
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Unsigned(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{:.4}", v),
            MetricValue::Activity {
                io_ops,
                sectors,
                pages,
            } => write!(f, "{} {} {}", io_ops, sectors, pages),
        }
    }
}

type Handler = fn(&[&str]) -> Result<MetricValue>;

/// One registered metric.
pub struct Metric {
    pub key: &'static str,
    pub description: &'static str,
    pub handler: Handler,
}

/// Registration table handed to the dispatcher at startup.
pub const METRICS: &[Metric] = &[
    Metric {
        key: "system.swap.size",
        description: "Returns Swap space size in bytes or in percentage from total.",
        handler: swap_size,
    },
    Metric {
        key: "system.swap.in",
        description: "Swap in (from device into memory) statistics.",
        handler: swap_in,
    },
    Metric {
        key: "system.swap.out",
        description: "Swap out (from memory onto device) statistics.",
        handler: swap_out,
    },
];

/// Evaluate a metric key of the form `name` or `name[p1,p2]`.
pub fn dispatch(key: &str) -> Result<MetricValue> {
    let (name, params) = parse_key(key)?;
    let metric = METRICS
        .iter()
        .find(|m| m.key == name)
        .ok_or_else(|| MetricError::UnknownMetric(name.to_string()))?;
    (metric.handler)(&params)
}

/// Split a key into its name and bracketed parameter list.
fn parse_key(key: &str) -> Result<(&str, Vec<&str>)> {
    let open = match key.find('[') {
        Some(open) => open,
        None => return Ok((key, Vec::new())),
    };
    if !key.ends_with(']') {
        return Err(MetricError::MalformedKey(key.to_string()));
    }
    let name = &key[..open];
    let inner = &key[open + 1..key.len() - 1];
    if inner.contains('[') || inner.contains(']') {
        return Err(MetricError::MalformedKey(key.to_string()));
    }
    Ok((name, inner.split(',').map(str::trim).collect()))
}

fn swap_size(params: &[&str]) -> Result<MetricValue> {
    if params.len() > 1 {
        return Err(MetricError::TooManyParameters);
    }
    let mode = params.first().copied().unwrap_or("");
    let cap = capacity::read()?;

    match mode {
        "" | "total" => Ok(MetricValue::Unsigned(cap.total)),
        "free" => Ok(MetricValue::Unsigned(cap.free)),
        "used" => Ok(MetricValue::Unsigned(cap.used())),
        "pfree" => Ok(MetricValue::Float(cap.free_percent()?)),
        "pused" => Ok(MetricValue::Float(cap.used_percent()?)),
        _ => Err(MetricError::InvalidFirstParameter),
    }
}

fn swap_in(params: &[&str]) -> Result<MetricValue> {
    swap_activity(params, Direction::In)
}

fn swap_out(params: &[&str]) -> Result<MetricValue> {
    swap_activity(params, Direction::Out)
}

fn swap_activity(params: &[&str], direction: Direction) -> Result<MetricValue> {
    if params.len() > 2 {
        return Err(MetricError::TooManyParameters);
    }
    let device = params.first().copied().unwrap_or("");
    let mode = params.get(1).copied().unwrap_or("");

    let stats = swaps::gather(device, direction)?;
    if !stats.got_data {
        return Err(MetricError::NoSwapData);
    }

    match mode {
        "" => Ok(MetricValue::Activity {
            io_ops: stats.io_ops,
            sectors: stats.sectors,
            pages: stats.pages,
        }),
        "count" => Ok(MetricValue::Unsigned(stats.io_ops)),
        "sectors" => Ok(MetricValue::Unsigned(stats.sectors)),
        "pages" => {
            // Page counters are host-wide; they cannot be attributed
            // to a single named device.
            if !device.is_empty() && device != "all" {
                return Err(MetricError::InvalidSecondParameter);
            }
            Ok(MetricValue::Unsigned(stats.pages))
        }
        _ => Err(MetricError::InvalidSecondParameter),
    }
}
