// swap-probe - Swap capacity and swap I/O activity probe
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::{Parser, Subcommand};

use swap_probe::diskstats::Direction;
use swap_probe::error;
use swap_probe::metrics::{dispatch, METRICS};
use swap_probe::{capacity, swaps};

#[derive(Parser)]
#[command(name = "swap-probe")]
#[command(about = "Swap capacity and swap I/O activity probe")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one metric key, e.g. 'system.swap.in[sda1,sectors]'
    Get {
        /// Metric key with optional bracketed parameters
        key: String,
    },
    /// List the supported metric keys
    List,
    /// Show a swap overview
    Status,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Get { key }) => get(&key),
        Some(Commands::List) => list(),
        Some(Commands::Status) => status(),
        None => {
            // No subcommand provided, show help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            return;
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn get(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let value = dispatch(key)?;
    println!("{}", value);
    Ok(())
}

fn list() -> Result<(), Box<dyn std::error::Error>> {
    for metric in METRICS {
        println!("{:<18} {}", metric.key, metric.description);
    }
    Ok(())
}

/// Format bytes as human-readable size
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.0} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Show swap capacity and activity
fn status() -> Result<(), Box<dyn std::error::Error>> {
    let cap = capacity::read()?;

    println!("Swap:");
    if cap.total > 0 {
        println!("  Total:         {}", format_size(cap.total));
        println!(
            "  Used:          {} ({:.0}%)",
            format_size(cap.used()),
            cap.used_percent()?
        );
        println!("  Free:          {}", format_size(cap.free));
    } else {
        println!("  none");
    }

    println!("\nActivity:");
    for (label, direction) in [("In", Direction::In), ("Out", Direction::Out)] {
        match swaps::gather("", direction) {
            Ok(activity) if activity.got_data => {
                println!(
                    "  {:<5} {} ops, {} sectors, {} pages",
                    format!("{}:", label),
                    activity.io_ops,
                    activity.sectors,
                    activity.pages
                );
            }
            Ok(_) => println!("  {:<5} no data", format!("{}:", label)),
            Err(e) => println!("  {:<5} {}", format!("{}:", label), e),
        }
    }

    Ok(())
}
