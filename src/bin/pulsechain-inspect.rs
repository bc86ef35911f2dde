#![forbid(unsafe_code)]
//! Inspect a saved chain (the JSON body of `GET /`) and report its integrity.

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;

use pulsechain::blockchain::{validate_block, validate_chain, Block};

#[derive(Parser, Debug)]
#[command(name = "pulsechain-inspect", about = "Check a PulseChain chain dump", version)]
struct Cli {
    /// JSON file holding an array of blocks.
    file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let content = std::fs::read_to_string(&cli.file)
        .map_err(|e| format!("Failed to read {}: {}", cli.file.display(), e))?;
    let chain: Vec<Block> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse chain: {}", e))?;

    let header = |name: &str| {
        Cell::new(name)
            .fg(TableColor::Cyan)
            .add_attribute(Attribute::Bold)
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header("Index"),
            header("Time"),
            header("BPM"),
            header("Hash"),
            header("Prev"),
            header("Status"),
        ]);

    for (i, block) in chain.iter().enumerate() {
        let status = if i == 0 {
            if *block == Block::genesis() {
                Ok(())
            } else {
                Err("not the genesis block".to_string())
            }
        } else {
            validate_block(block, &chain[i - 1]).map_err(|e| e.to_string())
        };

        let (label, color) = match &status {
            Ok(()) => ("ok".to_string(), TableColor::Green),
            Err(reason) => (reason.clone(), TableColor::Red),
        };

        table.add_row(vec![
            Cell::new(format!("#{}", block.index)).fg(TableColor::White),
            Cell::new(format_timestamp(block.timestamp)).fg(TableColor::Grey),
            Cell::new(block.bpm).fg(TableColor::White),
            Cell::new(short_hash(&block.hash)).fg(TableColor::Magenta),
            Cell::new(short_hash(&block.prev_hash)).fg(TableColor::Grey),
            Cell::new(label).fg(color),
        ]);
    }

    println!("{}", table);
    println!();

    match validate_chain(&chain) {
        Ok(()) => {
            println!(
                "{}",
                format!("✅ Chain valid ({} blocks)", chain.len()).green().bold()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("❌ {}", e).red().bold());
            std::process::exit(1);
        }
    }
}

fn short_hash(hash: &str) -> String {
    match hash.get(..16) {
        _ if hash.is_empty() => "-".to_string(),
        Some(prefix) if hash.len() > 16 => format!("{}…", prefix),
        _ => hash.to_string(),
    }
}

fn format_timestamp(timestamp_ms: u64) -> String {
    use chrono::DateTime;

    match DateTime::from_timestamp_millis(timestamp_ms as i64) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Invalid".to_string(),
    }
}
