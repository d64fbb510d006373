use crate::commands::{print_json, Context};
use crate::error::{invalid_input, precondition};
use crate::util::{format_timestamp_datetime, ingest_settings, now_utc, parse_shipment_id};
use anyhow::{Context as _, Result};
use clap::{ArgAction, Args};
use coldchain_config::AppConfig;
use coldchain_core::{
    normalize_phone_target, Alert, CallRecord, ShipmentDetails, ShipmentRecord,
};
use coldchain_notify::{
    Dispatcher, FollowOutcome, FollowReport, HistorySource, HttpCallTransport, PollPolicy,
};
use coldchain_store::CallHistory;
use coldchain_sync::Ingestor;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Phone number to call instead of the configured one
    #[arg(long)]
    pub to: Option<String>,
    /// Attach this shipment's details to the call
    #[arg(long)]
    pub shipment: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
    /// Return after placing the call instead of polling its status
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_wait: bool,
}

pub fn call(ctx: &Context<'_>, args: CallArgs) -> Result<()> {
    let target = resolve_target(ctx.config, args.to.as_deref())?;
    let shipment = match args.shipment.as_deref() {
        Some(raw) => {
            let id = parse_shipment_id(raw)?;
            let repo = ctx.store.shipments();
            let ingestor = Ingestor::new(&repo, ingest_settings(ctx.config));
            Some(ingestor.shipment(&id, now_utc())?)
        }
        None => None,
    };
    let alert = shipment.as_ref().and_then(latest_unread_critical);
    let message = match (args.message, shipment.as_ref()) {
        (Some(message), _) if !message.trim().is_empty() => message,
        (_, Some(shipment)) => alert
            .map(|alert| alert.message.clone())
            .unwrap_or_else(|| status_message(shipment)),
        _ => return Err(invalid_input("either --message or --shipment is required")),
    };
    let details = shipment
        .as_ref()
        .map(|shipment| shipment_details(shipment, alert));

    let cache = ctx.store.calls(&ctx.config.owner);
    let dispatcher = build_dispatcher(ctx.config, &cache)?;
    let record = dispatcher.dispatch(&target, &message, details);

    if args.no_wait {
        if ctx.json {
            return print_json(&record);
        }
        print_record(&record);
        return Ok(());
    }

    let report = follow(ctx, &dispatcher, record)?;
    if ctx.json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

pub fn history(ctx: &Context<'_>) -> Result<()> {
    let cache = ctx.store.calls(&ctx.config.owner);
    let dispatcher = build_dispatcher(ctx.config, &cache)?;
    let view = dispatcher.call_history()?;

    if ctx.json {
        return print_json(&view);
    }
    if view.source == HistorySource::Cache {
        println!("call service unreachable, showing locally stored calls");
    }
    if view.calls.is_empty() {
        println!("no calls");
        return Ok(());
    }
    for call in &view.calls {
        println!(
            "{}  {}  {}  {}  {}s  {}",
            format_timestamp_datetime(call.timestamp),
            call.id,
            call.to,
            call.status.as_str(),
            call.duration,
            call.message
        );
    }
    Ok(())
}

/// Places a call for a freshly raised alert and follows it.
pub fn notify_alert(
    ctx: &Context<'_>,
    dispatcher: &Dispatcher<'_, HttpCallTransport>,
    shipment: &ShipmentRecord,
    alert: &Alert,
) -> Result<FollowReport> {
    let target = resolve_target(ctx.config, None)?;
    let record = dispatcher.dispatch(
        &target,
        &alert.message,
        Some(shipment_details(shipment, Some(alert))),
    );
    follow(ctx, dispatcher, record)
}

pub fn build_dispatcher<'a>(
    config: &AppConfig,
    cache: &'a dyn CallHistory,
) -> Result<Dispatcher<'a, HttpCallTransport>> {
    let transport = HttpCallTransport::new(
        config.transport.base_url.clone(),
        Duration::from_secs(config.transport.timeout_seconds),
        config.transport.user_agent.as_deref(),
    )
    .with_context(|| "build call transport")?;
    let policy = PollPolicy {
        max_attempts: config.polling.max_attempts,
        interval: Duration::from_secs(config.polling.interval_seconds),
    };
    Ok(Dispatcher::new(transport, cache, policy))
}

fn follow(
    ctx: &Context<'_>,
    dispatcher: &Dispatcher<'_, HttpCallTransport>,
    record: CallRecord,
) -> Result<FollowReport> {
    if !record.is_terminal() && !ctx.json {
        println!("call {} placed, waiting for it to settle", record.id);
    }
    let handle = dispatcher.spawn_follow(record);
    for update in handle.updates().iter() {
        dispatcher.record_update(&update);
        debug!(call = %update.id, status = update.status.as_str(), "call update");
        if !ctx.json {
            println!("  {}", update.status.as_str());
        }
    }
    Ok(handle.finish(dispatcher)?)
}

fn resolve_target(config: &AppConfig, to: Option<&str>) -> Result<String> {
    match to {
        Some(raw) => normalize_phone_target(raw)
            .ok_or_else(|| invalid_input(format!("invalid phone number: {raw}"))),
        None => config
            .notifications
            .phone
            .clone()
            .ok_or_else(|| precondition("notification phone number is not configured")),
    }
}

fn latest_unread_critical(shipment: &ShipmentRecord) -> Option<&Alert> {
    shipment
        .alerts
        .iter()
        .filter(|alert| !alert.read && alert.is_temperature_critical())
        .max_by_key(|alert| alert.timestamp)
}

fn status_message(shipment: &ShipmentRecord) -> String {
    match shipment.current_temperature {
        Some(temperature) => format!(
            "Shipment {} ({}) is {} at {:.1}°C",
            shipment.number,
            shipment.contents,
            shipment.status.as_str(),
            temperature
        ),
        None => format!(
            "Shipment {} ({}) is {}",
            shipment.number,
            shipment.contents,
            shipment.status.as_str()
        ),
    }
}

fn shipment_details(shipment: &ShipmentRecord, alert: Option<&Alert>) -> ShipmentDetails {
    let latest = shipment.latest_reading();
    ShipmentDetails {
        shipment_id: Some(shipment.id.clone()),
        number: Some(shipment.number.clone()),
        contents: Some(shipment.contents.clone()),
        temperature: alert
            .and_then(|alert| alert.temperature)
            .or(shipment.current_temperature),
        location: alert
            .and_then(|alert| alert.location.clone())
            .or_else(|| latest.map(|reading| reading.location.clone())),
    }
}

fn print_record(record: &CallRecord) {
    if record.id.is_local() {
        println!(
            "call to {} could not be placed; stored local record {}",
            record.to, record.id
        );
    } else {
        println!("call {} to {}: {}", record.id, record.to, record.status.as_str());
    }
}

fn print_report(report: &FollowReport) {
    print_record(&report.record);
    match report.outcome {
        FollowOutcome::Stale => println!(
            "no final status after {} polls; last known status {}",
            report.attempts,
            report.record.status.as_str()
        ),
        FollowOutcome::Cancelled => println!("stopped following the call"),
        FollowOutcome::Completed | FollowOutcome::Failed => {}
    }
}
