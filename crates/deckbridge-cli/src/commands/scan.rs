//! Layout scan: find which container children hold each deck's text.

use std::path::Path;

use anyhow::{Context, Result};
use deckbridge_core::{LayoutScan, UiaReader, scan_layout};
use owo_colors::OwoColorize;

use crate::Overrides;
use crate::config;

pub fn run(config_path: &Path, targets: &[String], json: bool) -> Result<()> {
    let config = config::resolve(config_path, &Overrides::default())?;
    let mut reader = UiaReader::new(config.reader.clone());

    let scan = scan_layout(&mut reader, targets).with_context(|| {
        format!(
            "could not read window '{}' (anchor '{}')",
            config.reader.window_title, config.reader.anchor
        )
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scan)?);
    } else {
        print_table(&scan, targets);
    }
    Ok(())
}

fn print_table(scan: &LayoutScan, targets: &[String]) {
    println!("Container has {} children", scan.child_count);
    println!("{}", "-".repeat(40));

    for found in &scan.matches {
        match found.side {
            Some(side) => println!(
                "{:>5}  {:<5}  {}",
                found.index.bold(),
                side.cyan(),
                found.text
            ),
            None => println!("{:>5}  {}", found.index.bold(), found.text),
        }
    }

    if !targets.is_empty() {
        for target in targets {
            if !scan.matches.iter().any(|m| &m.text == target) {
                println!("{} '{}' not found", "warning:".yellow(), target);
            }
        }
    }
}
