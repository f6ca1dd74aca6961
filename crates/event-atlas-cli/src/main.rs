// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_atlas_core::config::AtlasConfig;
use event_atlas_core::{EventSession, FeedSource, LoadStatus, Popup};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feed URL or GeoJSON file path
    #[arg(short, long, env = "EVENT_ATLAS_FEED")]
    feed: Option<String>,

    /// Config file (defaults to event_atlas.json in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load status, counts and date span
    Summary,
    /// List filter rows
    Categories,
    /// Apply show/hide toggles in order and print what stays visible
    Visible {
        /// Hide every category before applying --show
        #[arg(long)]
        none: bool,
        /// Category to hide (repeatable)
        #[arg(long)]
        hide: Vec<String>,
        /// Category to show (repeatable)
        #[arg(long)]
        show: Vec<String>,
    },
    /// Print the popup of every event in a category
    Inspect {
        category: String,
        /// Emit the escaped HTML fragment instead of text
        #[arg(long)]
        html: bool,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    // A second logger (tests, embedding) is not worth failing the run over
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AtlasConfig::load_from(path),
        None => AtlasConfig::load(),
    }
    .context("Failed to read event atlas configuration")?;

    let feed = cli.feed.clone().unwrap_or_else(|| config.feed.clone());
    let source = FeedSource::parse(&feed);

    let mut session: EventSession = EventSession::new(config.show_icons);
    let status = session.load(&source);
    println!("{}", status);
    if status == LoadStatus::Failed {
        std::process::exit(1);
    }

    match cli.command {
        Commands::Summary => print_summary(&session),
        Commands::Categories => print_categories(&session),
        Commands::Visible { none, hide, show } => {
            if none {
                session.select_none();
            }
            for category in &hide {
                toggle(&mut session, category, false);
            }
            for category in &show {
                toggle(&mut session, category, true);
            }
            print_visible(&session);
        }
        Commands::Inspect { category, html } => {
            let mut found = false;
            for event in session.events_in(&category) {
                found = true;
                let popup = Popup::for_event(event);
                if html {
                    println!("{}", popup.to_html());
                } else {
                    println!(
                        "#{} ({:.4}, {:.4})",
                        event.index, event.position.lat, event.position.lon
                    );
                    for line in popup.lines() {
                        println!("  {}", line);
                    }
                }
            }
            if !found {
                println!("No events in category '{}'", category);
            }
        }
    }

    Ok(())
}

fn print_summary(session: &EventSession) {
    println!("Events: {}", session.events().len());
    println!("Skipped records: {}", session.skipped().len());
    for skipped in session.skipped() {
        println!("  feature #{}: {}", skipped.index, skipped.reason);
    }
    println!("Categories: {}", session.registry().len());
    if let Some((first, last)) = session.date_span() {
        println!("Date span: {} .. {}", first, last);
    }
    println!("Visible: {}", session.visible_count());
}

fn print_categories(session: &EventSession) {
    for row in &session.panel().rows {
        let mark = if row.checked { "[x]" } else { "[ ]" };
        println!(
            "{} {:>6} {:<28} {} {}",
            mark,
            row.count,
            row.label,
            row.id,
            row.icon.unwrap_or("")
        );
    }
    println!("Visible: {}", session.panel().visible_total);
}

fn toggle(session: &mut EventSession, category: &str, visible: bool) {
    if session.registry().get(category).is_none() {
        println!("No category named '{}'", category);
        return;
    }
    if let Some(change) = session.set_category_visible(category, visible) {
        println!(
            "{} {} (visible: {})",
            if change.visible { "Shown:" } else { "Hidden:" },
            category,
            change.visible_total
        );
    }
}

fn print_visible(session: &EventSession) {
    println!("Visible: {}", session.visible_count());
    match session.zoom_target() {
        Some(b) => {
            println!(
                "Bounds: lat {:.4}..{:.4}, lon {:.4}..{:.4}",
                b.min_lat, b.max_lat, b.min_lon, b.max_lon
            );
            let c = b.center();
            println!("Center: {:.4}, {:.4}", c.lat, c.lon);
        }
        None => println!("Bounds: none (nothing visible)"),
    }
}
