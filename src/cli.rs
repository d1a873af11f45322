//! Command-line front-end
//!
//! Supports:
//! - Checking a program for empty required slots
//! - Re-saving a program in canonical form
//! - Dumping the frame tree with slot addresses
//! - Writing an empty program
//! - Showing where config and logs live

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config_paths::Locations;
use crate::frame::FrameId;
use crate::persist::{self, DocumentHeaders};
use crate::slot::{for_each_unit, SlotId};
use crate::store::FrameStore;
use crate::validation::LineFrameMap;

/// Structured frame-based program files
#[derive(Parser, Debug)]
#[command(name = "trellis", version, about = "Inspect and rewrite .spy frame programs")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Load a program and report frames with errors
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Load a program and save it again
    Resave {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Write here instead of overwriting FILE
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Print the frame tree with ids and slot units
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the frames as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Write an empty program
    New {
        /// Write here instead of standard output
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Show the config file and current log file locations
    Paths,
}

/// Run one command, writing its report to `out`
pub fn run(command: CliCommand, out: &mut impl Write) -> Result<()> {
    match command {
        CliCommand::Check { file } => {
            let document = persist::read_file(&file)?;
            let report = error_report(&document.store, &document.line_map);
            if report.is_empty() {
                writeln!(out, "{}: ok", file.display())?;
            } else {
                write!(out, "{}", report)?;
            }
        }

        CliCommand::Resave { file, output } => {
            let document = persist::read_file(&file)?;
            let target = output.unwrap_or(file);
            persist::write_file(&target, &document.store, &document.headers)?;
            writeln!(out, "saved {}", target.display())?;
        }

        CliCommand::Dump { file, json } => {
            let document = persist::read_file(&file)?;
            if json {
                let mut frames: Vec<_> = document.store.frames().collect();
                frames.sort_by_key(|f| f.id);
                let text = serde_json::to_string_pretty(&frames)
                    .context("Failed to serialize frames")?;
                writeln!(out, "{}", text)?;
            } else {
                write!(out, "{}", dump_tree(&document.store))?;
            }
        }

        CliCommand::New { output } => {
            let text = persist::save(&FrameStore::new(), &DocumentHeaders::default()).text;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    writeln!(out, "created {}", path.display())?;
                }
                None => write!(out, "{}", text)?,
            }
        }

        CliCommand::Paths => {
            let locations = Locations::resolve().context("No config directory available")?;
            write!(out, "{}", paths_report(&locations))?;
        }
    }
    Ok(())
}

/// One `name: path` line per location
pub fn paths_report(locations: &Locations) -> String {
    format!(
        "config: {}\nlogs: {}\nlog file: {}\n",
        locations.config_file.display(),
        locations.logs_dir.display(),
        locations.log_file.display()
    )
}

/// One line per error: 1-based file line, frame, message
pub fn error_report(store: &FrameStore, line_map: &LineFrameMap) -> String {
    let mut report = String::new();
    for (line, id) in line_map.iter() {
        let Some(frame) = store.get(id) else {
            continue;
        };
        if let Some(error) = &frame.error {
            let _ = writeln!(report, "line {}: frame {}: {}", line + 1, id, error);
        }
        for e in &frame.slot_errors {
            let _ = writeln!(
                report,
                "line {}: frame {} label {} slot {}: {}",
                line + 1,
                id,
                e.label,
                e.slot,
                e.message
            );
        }
    }
    report
}

/// Indented tree of every section: frame ids, types and editable slot units
pub fn dump_tree(store: &FrameStore) -> String {
    let mut out = String::new();
    let mut stack: Vec<(FrameId, usize)> = FrameId::SECTIONS.iter().rev().map(|&s| (s, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(frame) = store.get(id) else {
            continue;
        };
        let indent = "  ".repeat(depth);
        let mut flags = Vec::new();
        if frame.is_collapsed() {
            flags.push("collapsed");
        }
        if frame.is_frozen() {
            flags.push("frozen");
        }
        if frame.disabled {
            flags.push("disabled");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        let _ = writeln!(out, "{}{} {}{}", indent, id, frame.frame_type.name(), flags);

        for (&label, structure) in &frame.labels {
            for_each_unit(structure, &SlotId::root(), |unit| {
                let _ = writeln!(
                    out,
                    "{}    {}:{} {:?} {:?}",
                    indent, label, unit.id, unit.kind, unit.text
                );
            });
        }

        for &joint in frame.joint_children.iter().rev() {
            stack.push((joint, depth));
        }
        for &child in frame.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    out
}
