use crate::assemble::{assemble_shipment, dedupe_ids, reading_from_row, AssembleContext};
use crate::csv_file::parse_csv;
use crate::error::{IngestError, Result};
use crate::upload::{validate_upload, UploadKind};
use crate::workbook::parse_workbook;
use chrono::FixedOffset;
use coldchain_core::{
    append_alert, evaluate_latest, refresh_statuses, Alert, AlertId, ShipmentField, ShipmentId,
    ShipmentRecord, Thresholds,
};
use coldchain_store::ShipmentRepository;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub owner: String,
    pub thresholds: Option<Thresholds>,
    pub notification_target: Option<String>,
    pub max_upload_bytes: u64,
    pub reporting_offset: FixedOffset,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub file: String,
    pub created: usize,
    pub replaced: usize,
    pub alerts: usize,
    pub shipment_ids: Vec<ShipmentId>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdAlert {
    pub shipment_id: ShipmentId,
    pub alert: Alert,
}

/// Turns uploads into the owner's shipment set and maintains it afterwards.
pub struct Ingestor<'a> {
    repo: &'a dyn ShipmentRepository,
    settings: IngestSettings,
}

impl<'a> Ingestor<'a> {
    pub fn new(repo: &'a dyn ShipmentRepository, settings: IngestSettings) -> Self {
        Self { repo, settings }
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Imports a file from disk. The size is checked before the file is read.
    pub fn import_path(&self, path: &Path, now_utc: i64) -> Result<ImportReport> {
        let thresholds = self.require_preconditions()?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size = fs::metadata(path)?.len();
        let kind = validate_upload(&file_name, size, self.settings.max_upload_bytes)?;
        let data = fs::read(path)?;
        self.import_validated(&file_name, kind, &data, thresholds, now_utc)
    }

    pub fn import_bytes(&self, file_name: &str, data: &[u8], now_utc: i64) -> Result<ImportReport> {
        let thresholds = self.require_preconditions()?;
        let kind = validate_upload(file_name, data.len() as u64, self.settings.max_upload_bytes)?;
        self.import_validated(file_name, kind, data, thresholds, now_utc)
    }

    fn import_validated(
        &self,
        file_name: &str,
        kind: UploadKind,
        data: &[u8],
        thresholds: Thresholds,
        now_utc: i64,
    ) -> Result<ImportReport> {
        let ctx = AssembleContext {
            owner: self.settings.owner.clone(),
            thresholds,
            offset: self.settings.reporting_offset,
            now_utc,
            source_file: Some(file_name.to_string()),
        };

        let (mut shipments, mut warnings) = match kind {
            UploadKind::Csv => build_from_csv(data, &ctx)?,
            UploadKind::Workbook => build_from_workbook(data, &ctx)?,
        };
        if shipments.is_empty() {
            return Err(IngestError::Empty(file_name.to_string()));
        }
        dedupe_ids(&mut shipments, &mut warnings);
        debug!(
            file = file_name,
            shipments = shipments.len(),
            warnings = warnings.len(),
            "upload parsed"
        );

        let replaced = self
            .repo
            .replace_for_owner(&self.settings.owner, &shipments)
            .map_err(|err| {
                warn!(owner = %self.settings.owner, error = %err, "shipment replace failed");
                IngestError::Store(err)
            })?;

        Ok(ImportReport {
            file: file_name.to_string(),
            created: shipments.len(),
            replaced,
            alerts: shipments.iter().map(|s| s.alerts.len()).sum(),
            shipment_ids: shipments.into_iter().map(|s| s.id).collect(),
            warnings,
        })
    }

    fn require_preconditions(&self) -> Result<Thresholds> {
        let target = self
            .settings
            .notification_target
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if target.is_empty() {
            return Err(IngestError::Precondition(
                "notification phone number is not configured",
            ));
        }
        self.require_thresholds()
    }

    fn require_thresholds(&self) -> Result<Thresholds> {
        let thresholds = self.settings.thresholds.ok_or(IngestError::Precondition(
            "temperature thresholds are not configured",
        ))?;
        Thresholds::new(thresholds.min, thresholds.max).map_err(|_| {
            IngestError::Precondition("minimum temperature threshold must be lower than the maximum")
        })
    }

    /// Stored shipments with statuses derived at `now_utc`.
    pub fn shipments(&self, now_utc: i64) -> Result<Vec<ShipmentRecord>> {
        let mut shipments = self.repo.list(&self.settings.owner)?;
        for shipment in &mut shipments {
            refresh_statuses(shipment, now_utc);
        }
        Ok(shipments)
    }

    pub fn shipment(&self, id: &ShipmentId, now_utc: i64) -> Result<ShipmentRecord> {
        let mut shipment = self.load(id)?;
        refresh_statuses(&mut shipment, now_utc);
        Ok(shipment)
    }

    /// Returns `false` when the alert was already read.
    pub fn mark_alert_read(&self, id: &ShipmentId, alert_id: AlertId) -> Result<bool> {
        let mut shipment = self.load(id)?;
        let already_read = shipment
            .alerts
            .iter()
            .find(|alert| alert.id == alert_id)
            .map(|alert| alert.read)
            .ok_or_else(|| IngestError::NotFound(format!("alert {alert_id}")))?;
        if already_read {
            return Ok(false);
        }
        shipment.mark_alert_read(alert_id);
        self.repo.update(&shipment)?;
        Ok(true)
    }

    /// Re-checks every shipment's latest reading against the current thresholds
    /// and stores a critical alert for each one out of range. Shipments that
    /// already carry an unread critical alert within the last hour are skipped.
    pub fn check_temperature_thresholds(&self, now_utc: i64) -> Result<Vec<ThresholdAlert>> {
        let thresholds = self.require_thresholds()?;
        let mut raised = Vec::new();
        for mut shipment in self.repo.list(&self.settings.owner)? {
            let Some(alert) = evaluate_latest(
                &shipment.temperature_history,
                thresholds,
                now_utc,
                &shipment.origin.city,
            ) else {
                continue;
            };
            if !append_alert(&mut shipment.alerts, alert.clone()) {
                debug!(shipment = %shipment.id, "recent unread critical alert, skipped");
                continue;
            }
            self.repo.update(&shipment)?;
            raised.push(ThresholdAlert {
                shipment_id: shipment.id,
                alert,
            });
        }
        Ok(raised)
    }

    pub fn delete(&self, id: &ShipmentId) -> Result<()> {
        if !self.repo.delete(&self.settings.owner, id)? {
            return Err(IngestError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self.repo.delete_for_owner(&self.settings.owner)?)
    }

    fn load(&self, id: &ShipmentId) -> Result<ShipmentRecord> {
        self.repo
            .get(&self.settings.owner, id)?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))
    }
}

fn build_from_csv(data: &[u8], ctx: &AssembleContext) -> Result<(Vec<ShipmentRecord>, Vec<String>)> {
    let parsed = parse_csv(data)?;
    let mut warnings = parsed.warnings;
    let shipments = parsed
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let label = format!("row {}", index + 1);
            assemble_shipment(row, Vec::new(), true, ctx, &label, &mut warnings)
        })
        .collect();
    Ok((shipments, warnings))
}

fn build_from_workbook(
    data: &[u8],
    ctx: &AssembleContext,
) -> Result<(Vec<ShipmentRecord>, Vec<String>)> {
    let parsed = parse_workbook(data)?;
    let mut warnings = parsed.warnings;
    if parsed.metadata.is_empty() && parsed.readings.is_empty() {
        return Ok((Vec::new(), warnings));
    }

    let origin = parsed
        .metadata
        .text(ShipmentField::OriginCity)
        .unwrap_or_default();
    let readings = parsed
        .readings
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let label = format!("reading {}", index + 1);
            reading_from_row(row, ctx.offset, &origin, &label, &mut warnings)
        })
        .collect();
    let shipment = assemble_shipment(&parsed.metadata, readings, false, ctx, "shipment", &mut warnings);
    Ok((vec![shipment], warnings))
}
