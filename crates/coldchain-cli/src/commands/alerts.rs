use crate::commands::calls::{build_dispatcher, notify_alert};
use crate::commands::{print_json, Context};
use crate::util::{
    format_temperature, format_timestamp_datetime, ingest_settings, now_utc, parse_alert_id,
    parse_shipment_id,
};
use anyhow::Result;
use clap::{ArgAction, Args};
use coldchain_core::{AlertId, ShipmentId};
use coldchain_notify::FollowReport;
use coldchain_sync::{Ingestor, ThresholdAlert};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct AlertsArgs {
    /// Limit to one shipment
    pub id: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    pub unread: bool,
}

#[derive(Debug, Args)]
pub struct AckArgs {
    pub shipment: String,
    pub alert: String,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Place a notification call for every new alert
    #[arg(long, action = ArgAction::SetTrue)]
    pub call: bool,
}

#[derive(Debug, Serialize)]
struct AckOutput {
    shipment_id: ShipmentId,
    alert_id: AlertId,
    changed: bool,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    alerts: Vec<ThresholdAlert>,
    calls: Vec<FollowReport>,
}

pub fn list_alerts(ctx: &Context<'_>, args: AlertsArgs) -> Result<()> {
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let now = now_utc();
    let shipments = match args.id.as_deref() {
        Some(raw) => vec![ingestor.shipment(&parse_shipment_id(raw)?, now)?],
        None => ingestor.shipments(now)?,
    };

    let mut alerts: Vec<ThresholdAlert> = shipments
        .into_iter()
        .flat_map(|shipment| {
            let shipment_id = shipment.id;
            shipment
                .alerts
                .into_iter()
                .map(move |alert| ThresholdAlert {
                    shipment_id: shipment_id.clone(),
                    alert,
                })
        })
        .filter(|entry| !args.unread || !entry.alert.read)
        .collect();
    alerts.sort_by(|a, b| b.alert.timestamp.cmp(&a.alert.timestamp));

    if ctx.json {
        return print_json(&alerts);
    }
    if alerts.is_empty() {
        println!("no alerts");
        return Ok(());
    }
    for entry in &alerts {
        let marker = if entry.alert.read { " " } else { "*" };
        println!(
            "{marker} {}  {}  {}  {}  {}",
            entry.shipment_id,
            entry.alert.id,
            entry.alert.kind.as_str(),
            format_timestamp_datetime(entry.alert.timestamp),
            entry.alert.message
        );
    }
    Ok(())
}

pub fn ack(ctx: &Context<'_>, args: AckArgs) -> Result<()> {
    let shipment_id = parse_shipment_id(&args.shipment)?;
    let alert_id = parse_alert_id(&args.alert)?;
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let changed = ingestor.mark_alert_read(&shipment_id, alert_id)?;

    if ctx.json {
        return print_json(&AckOutput {
            shipment_id,
            alert_id,
            changed,
        });
    }
    if changed {
        println!("marked {alert_id} as read");
    } else {
        println!("{alert_id} was already read");
    }
    Ok(())
}

pub fn check(ctx: &Context<'_>, args: CheckArgs) -> Result<()> {
    let repo = ctx.store.shipments();
    let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
    let now = now_utc();
    let alerts = ingestor.check_temperature_thresholds(now)?;

    let mut calls = Vec::new();
    if args.call && !alerts.is_empty() {
        let cache = ctx.store.calls(&ctx.config.owner);
        let dispatcher = build_dispatcher(ctx.config, &cache)?;
        for entry in &alerts {
            let shipment = ingestor.shipment(&entry.shipment_id, now)?;
            calls.push(notify_alert(ctx, &dispatcher, &shipment, &entry.alert)?);
        }
    }

    if ctx.json {
        return print_json(&CheckOutput { alerts, calls });
    }
    if alerts.is_empty() {
        println!("all shipments within range");
        return Ok(());
    }
    for entry in &alerts {
        println!(
            "{}  {}  {}",
            entry.shipment_id,
            format_temperature(entry.alert.temperature),
            entry.alert.message
        );
    }
    for report in &calls {
        println!(
            "call {}: {}",
            report.record.id,
            report.record.status.as_str()
        );
    }
    Ok(())
}
