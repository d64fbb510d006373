use crate::commands::{print_json, write_output, Context};
use crate::error::invalid_input;
use crate::util::{
    format_temperature, format_timestamp_datetime, ingest_settings, now_utc, parse_shipment_id,
};
use anyhow::Result;
use clap::{ArgAction, Args};
use coldchain_core::{ShipmentRecord, ShipmentStatus};
use coldchain_sync::{csv_template, shipments_to_csv, Ingestor};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV, XLSX or XLS file
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// in-transit, delivered or delayed
    #[arg(long)]
    pub status: Option<String>,
    /// Only shipments with unread alerts
    #[arg(long, action = ArgAction::SetTrue)]
    pub alerting: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DeletedOutput {
    deleted: usize,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    path: PathBuf,
    shipments: usize,
}

pub fn import(ctx: &Context<'_>, args: ImportArgs) -> Result<()> {
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let report = ingestor.import_path(&args.file, now_utc())?;

    if ctx.json {
        return print_json(&report);
    }
    println!(
        "imported {} shipments from {} (replaced {})",
        report.created, report.file, report.replaced
    );
    if report.alerts > 0 {
        println!("alerts raised: {}", report.alerts);
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

pub fn list(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    let status = match args.status.as_deref() {
        Some(raw) => Some(ShipmentStatus::parse(raw).ok_or_else(|| {
            invalid_input(format!(
                "invalid status '{raw}': expected in-transit|delivered|delayed"
            ))
        })?),
        None => None,
    };

    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let shipments: Vec<ShipmentRecord> = ingestor
        .shipments(now_utc())?
        .into_iter()
        .filter(|s| status.map_or(true, |status| s.status == status))
        .filter(|s| !args.alerting || s.unread_alert_count() > 0)
        .collect();

    if ctx.json {
        return print_json(&shipments);
    }
    if shipments.is_empty() {
        println!("no shipments");
        return Ok(());
    }
    for shipment in &shipments {
        println!(
            "{}  {}  [{}]  {} -> {}  {}  unread alerts: {}",
            shipment.id,
            shipment.number,
            shipment.status.as_str(),
            shipment.origin.city,
            shipment.destination.city,
            format_temperature(shipment.current_temperature),
            shipment.unread_alert_count()
        );
    }
    Ok(())
}

pub fn show(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let id = parse_shipment_id(&args.id)?;
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let shipment = ingestor.shipment(&id, now_utc())?;

    if ctx.json {
        return print_json(&shipment);
    }
    println!("{} ({})", shipment.id, shipment.number);
    println!("status: {}", shipment.status.as_str());
    println!("carrier: {}", shipment.carrier);
    println!("contents: {}", shipment.contents);
    println!("bill of lading: {}", shipment.bill_of_lading);
    println!(
        "route: {}, {} -> {}, {}",
        shipment.origin.city,
        shipment.origin.country,
        shipment.destination.city,
        shipment.destination.country
    );
    println!("departed: {}", format_timestamp_datetime(shipment.departure_time));
    println!("eta: {}", format_timestamp_datetime(shipment.estimated_delivery));
    println!(
        "temperature: {}",
        format_temperature(shipment.current_temperature)
    );
    if let Some(contacts) = shipment.contacts.as_ref().filter(|c| !c.is_empty()) {
        let fields = [
            contacts.sender_name.as_deref(),
            contacts.organization.as_deref(),
            contacts.phone.as_deref(),
            contacts.email.as_deref(),
        ];
        let joined: Vec<&str> = fields.into_iter().flatten().collect();
        println!("contact: {}", joined.join(", "));
    }
    if !shipment.journey.is_empty() {
        println!("journey:");
        for point in &shipment.journey {
            println!(
                "  {}  {}  {:.1}°C  {}",
                format_timestamp_datetime(point.timestamp),
                point.location,
                point.temperature,
                point.status.as_str()
            );
        }
    }
    if !shipment.alerts.is_empty() {
        println!("alerts:");
        for alert in &shipment.alerts {
            let marker = if alert.read { " " } else { "*" };
            println!(
                "  {marker} {}  {}  {}  {}",
                alert.id,
                alert.kind.as_str(),
                format_timestamp_datetime(alert.timestamp),
                alert.message
            );
        }
    }
    Ok(())
}

pub fn delete(ctx: &Context<'_>, args: DeleteArgs) -> Result<()> {
    let id = parse_shipment_id(&args.id)?;
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    ingestor.delete(&id)?;

    if ctx.json {
        print_json(&DeletedOutput { deleted: 1 })?;
    } else {
        println!("deleted {id}");
    }
    Ok(())
}

pub fn clear(ctx: &Context<'_>) -> Result<()> {
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let deleted = ingestor.clear()?;

    if ctx.json {
        print_json(&DeletedOutput { deleted })?;
    } else {
        println!("deleted {deleted} shipments");
    }
    Ok(())
}

pub fn export(ctx: &Context<'_>, args: ExportArgs) -> Result<()> {
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let shipments = ingestor.shipments(now_utc())?;
    let csv = shipments_to_csv(&shipments)?;
    write_output(args.output.as_deref(), &csv)?;

    if let Some(path) = args.output {
        if ctx.json {
            print_json(&ExportOutput {
                path,
                shipments: shipments.len(),
            })?;
        } else {
            println!("exported {} shipments to {}", shipments.len(), path.display());
        }
    }
    Ok(())
}

pub fn template(args: TemplateArgs) -> Result<()> {
    let template = csv_template()?;
    write_output(args.output.as_deref(), &template)
}
