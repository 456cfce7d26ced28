//! `radar` - CLI for techradar
//!
//! This binary manages radar blips and reports their status and layout.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;

use techradar::cli::{
    BlipCommand, Cli, Command, CompetencyCommand, ConfigCommand, LayoutCommand, ListCommand,
    StatusCommand,
};
use techradar::seed::seed_defaults;
use techradar::status::StatusMap;
use techradar::{
    classify_all, full_radar_layout, half_arc_layout, init_logging, BlipRecord, BlipStatus,
    Config, HistoryEntry, Quadrant, Ring, RingCounts, StatusCounts, Storage,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Blip(cmd) => handle_blip(&config, cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Layout(cmd) => handle_layout(&config, &cmd),
        Command::Competency(cmd) => handle_competency(&config, cmd),
        Command::Seed => handle_seed(&config),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening radar database {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_blip(config: &Config, cmd: BlipCommand) -> Result<()> {
    let mut storage = open_storage(config)?;
    match cmd {
        BlipCommand::Add(args) => {
            let blip = storage.create(&args.to_new_blip())?;
            println!(
                "Added blip {} '{}' to {} / {}",
                blip.id, blip.name, blip.quadrant, blip.ring
            );
        }
        BlipCommand::Update(args) => {
            let before = storage.get(args.id)?.blip.ring;
            let blip = storage.update(args.id, &args.to_update())?;
            if blip.ring == before {
                println!("Updated blip {} '{}'", blip.id, blip.name);
            } else {
                println!(
                    "Updated blip {} '{}', moved {} -> {}",
                    blip.id, blip.name, before, blip.ring
                );
            }
        }
        BlipCommand::Delete { id } => {
            let blip = storage.delete(id)?;
            println!("Deleted blip {} '{}'", blip.id, blip.name);
        }
        BlipCommand::Show { id, json } => {
            let record = storage.get(id)?;
            if json {
                return print_json(&record);
            }
            print_record(&record);
        }
        BlipCommand::History { id, json } => {
            let history = storage.history(id)?;
            if json {
                return print_json(&history);
            }
            for entry in &history {
                println!("{}", format_history(entry));
            }
        }
    }
    Ok(())
}

fn print_record(record: &BlipRecord) {
    let blip = &record.blip;
    println!("{} (#{})", blip.name, blip.id);
    println!("  Quadrant:    {}", blip.quadrant.label());
    println!("  Ring:        {} ({})", blip.ring, blip.ring.guidance());
    if let Some(description) = &blip.description {
        println!("  Description: {description}");
    }
    if let Some(rationale) = &blip.rationale {
        println!("  Rationale:   {rationale}");
    }
    if let Some(area) = &record.competency_area {
        println!("  Competency:  {}", area.name);
    }
    println!("  Created:     {}", blip.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Updated:     {}", blip.updated_at.format("%Y-%m-%d %H:%M"));
    println!();
    println!("History:");
    for entry in &record.history {
        println!("  {}", format_history(entry));
    }
}

fn format_history(entry: &HistoryEntry) -> String {
    let movement = match entry.from_ring {
        Some(from) => format!("{from} -> {}", entry.to_ring),
        None => format!("placed in {}", entry.to_ring),
    };
    match &entry.note {
        Some(note) => format!(
            "{}  {movement}  ({note})",
            entry.created_at.format("%Y-%m-%d")
        ),
        None => format!("{}  {movement}", entry.created_at.format("%Y-%m-%d")),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListedBlip<'a> {
    #[serde(flatten)]
    record: &'a BlipRecord,
    status: BlipStatus,
}

fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let period = config.period(cmd.period)?;
    let storage = open_storage(config)?;
    let records = storage.list()?;
    let statuses = classify_all(&records, period, Utc::now());

    let shown = cmd.filter().apply(&records, &statuses);
    let listed: Vec<ListedBlip<'_>> = shown
        .into_iter()
        .map(|record| ListedBlip {
            record,
            status: status_of(&statuses, record),
        })
        .collect();

    if cmd.json {
        return print_json(&listed);
    }

    if listed.is_empty() {
        println!("No blips match.");
        return Ok(());
    }
    println!(
        "{:>5}  {:<24} {:<20} {:<8} {}",
        "ID", "NAME", "QUADRANT", "RING", "STATUS"
    );
    for item in &listed {
        let blip = &item.record.blip;
        println!(
            "{:>5}  {:<24} {:<20} {:<8} {}",
            blip.id, blip.name, blip.quadrant, blip.ring, item.status
        );
    }
    println!();
    println!("{} blips, status over the last {period}", listed.len());
    Ok(())
}

fn status_of(statuses: &StatusMap, record: &BlipRecord) -> BlipStatus {
    statuses
        .get(&record.blip.id)
        .copied()
        .unwrap_or(BlipStatus::Unchanged)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    period_days: u32,
    statuses: StatusCounts,
    rings: RingCounts,
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> Result<()> {
    let period = config.period(cmd.period)?;
    let storage = open_storage(config)?;
    let records = storage.list()?;
    let statuses = classify_all(&records, period, Utc::now());

    let report = StatusReport {
        period_days: period.get(),
        statuses: StatusCounts::from_map(&statuses),
        rings: RingCounts::from_blips(records.iter().map(|r| &r.blip)),
    };

    if cmd.json {
        return print_json(&report);
    }

    let stats = storage.stats()?;
    println!("radar status (last {period})");
    println!("----------------------------");
    println!("Database:      {}", storage.path().display());
    println!("Blips:         {}", report.rings.total);
    println!("Transitions:   {}", stats.total_history_entries);
    println!();
    for ring in Ring::ALL {
        println!("  {:<12} {}", ring.as_str(), report.rings.get(ring));
    }
    println!();
    for status in BlipStatus::ALL {
        println!("  {:<12} {}", status.as_str(), report.statuses.get(status));
    }
    Ok(())
}

fn handle_layout(config: &Config, cmd: &LayoutCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let records = storage.list()?;

    let positions = match cmd.quadrant {
        Some(quadrant) => half_arc_layout(&records, Quadrant::from(quadrant), &config.layout),
        None => full_radar_layout(&records, &config.layout),
    };

    if cmd.json {
        return print_json(&positions);
    }

    let names: HashMap<i64, &str> = records
        .iter()
        .map(|r| (r.blip.id, r.blip.name.as_str()))
        .collect();
    for position in &positions {
        println!(
            "{:>5}  {:<24} x={:>8.2} y={:>8.2} angle={:>7.2} r={:>7.2}",
            position.blip_id,
            names.get(&position.blip_id).copied().unwrap_or("?"),
            position.x,
            position.y,
            position.angle_deg,
            position.radius
        );
    }
    Ok(())
}

fn handle_competency(config: &Config, cmd: CompetencyCommand) -> Result<()> {
    let storage = open_storage(config)?;
    match cmd {
        CompetencyCommand::Add {
            name,
            category,
            description,
        } => {
            let area = storage.create_competency_area(
                &name,
                category.as_deref(),
                description.as_deref(),
            )?;
            println!("Added competency area {} '{}'", area.id, area.name);
        }
        CompetencyCommand::List { json } => {
            let areas = storage.list_competency_areas()?;
            if json {
                return print_json(&areas);
            }
            for area in &areas {
                match &area.category {
                    Some(category) => println!("{:>5}  {}  [{category}]", area.id, area.name),
                    None => println!("{:>5}  {}", area.id, area.name),
                }
            }
        }
    }
    Ok(())
}

fn handle_seed(config: &Config) -> Result<()> {
    let mut storage = open_storage(config)?;
    let report = seed_defaults(&mut storage)?;
    if report.is_empty() {
        println!("Database already has content, nothing seeded.");
    } else {
        println!(
            "Seeded {} competency areas and {} blips.",
            report.competency_areas, report.blips
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                return print_json(config);
            }
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Storage]");
            println!("  Database path:      {}", config.database_path().display());
            println!();
            println!("[Radar]");
            println!("  Default period:     {} days", config.radar.default_period_days);
            println!("  Period choices:     {:?}", config.radar.period_choices);
            println!();
            println!("[Layout]");
            println!("  Canvas size:        {}", config.layout.canvas_size);
            println!("  Margin:             {}", config.layout.margin);
            println!("  Lanes:              {}", config.layout.lanes);
            println!(
                "  Half-arc canvas:    {} x {}",
                config.layout.half_arc_width, config.layout.half_arc_height
            );
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
