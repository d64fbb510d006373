use crate::error::{Result, StoreError};
use crate::repo::CallHistory;
use chrono::Utc;
use coldchain_core::{CallId, CallRecord, CallStatus, ShipmentDetails, ShipmentId};
use rusqlite::{params, Connection, Row};

const CALL_COLUMNS: &str = "id, to_number, from_number, status, duration, timestamp, message,
    shipment_id, shipment_number, shipment_contents, shipment_temperature, shipment_location";

/// Call cache for one owner.
pub struct CallsRepo<'a> {
    conn: &'a Connection,
    owner: &'a str,
}

impl<'a> CallsRepo<'a> {
    pub fn new(conn: &'a Connection, owner: &'a str) -> Self {
        Self { conn, owner }
    }

    pub fn clear(&self) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM calls WHERE owner = ?1;", [self.owner])?;
        Ok(deleted)
    }
}

impl CallHistory for CallsRepo<'_> {
    fn upsert(&self, call: &CallRecord) -> Result<()> {
        let details = call.shipment_details.as_ref();
        self.conn.execute(
            "INSERT INTO calls (
                owner, id, to_number, from_number, status, duration, timestamp, message,
                shipment_id, shipment_number, shipment_contents, shipment_temperature,
                shipment_location, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(owner, id) DO UPDATE SET
                to_number = excluded.to_number,
                from_number = excluded.from_number,
                status = excluded.status,
                duration = excluded.duration,
                timestamp = excluded.timestamp,
                message = excluded.message,
                shipment_id = excluded.shipment_id,
                shipment_number = excluded.shipment_number,
                shipment_contents = excluded.shipment_contents,
                shipment_temperature = excluded.shipment_temperature,
                shipment_location = excluded.shipment_location,
                updated_at = excluded.updated_at;",
            params![
                self.owner,
                call.id.as_str(),
                call.to,
                call.from,
                call.status.as_str(),
                call.duration,
                call.timestamp,
                call.message,
                details.and_then(|d| d.shipment_id.as_ref().map(|id| id.as_str())),
                details.and_then(|d| d.number.as_deref()),
                details.and_then(|d| d.contents.as_deref()),
                details.and_then(|d| d.temperature),
                details.and_then(|d| d.location.as_deref()),
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &CallId) -> Result<Option<CallRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CALL_COLUMNS} FROM calls WHERE owner = ?1 AND id = ?2;"
        ))?;
        let mut rows = stmt.query(params![self.owner, id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(call_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<CallRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CALL_COLUMNS}
             FROM calls
             WHERE owner = ?1
             ORDER BY timestamp DESC, updated_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([self.owner])?;
        let mut calls = Vec::new();
        while let Some(row) = rows.next()? {
            calls.push(call_from_row(row)?);
        }
        Ok(calls)
    }
}

fn call_from_row(row: &Row<'_>) -> Result<CallRecord> {
    let id_raw: String = row.get(0)?;
    let id = CallId::new(&id_raw).map_err(|_| StoreError::InvalidId(id_raw.clone()))?;
    let status_raw: String = row.get(3)?;
    let status = CallStatus::parse(&status_raw).ok_or(StoreError::InvalidValue {
        field: "call status",
        value: status_raw,
    })?;

    let shipment_id: Option<String> = row.get(7)?;
    let details = ShipmentDetails {
        shipment_id: shipment_id
            .as_deref()
            .map(ShipmentId::new)
            .transpose()
            .map_err(|_| StoreError::InvalidId(shipment_id.clone().unwrap_or_default()))?,
        number: row.get(8)?,
        contents: row.get(9)?,
        temperature: row.get(10)?,
        location: row.get(11)?,
    };
    let has_details = details.shipment_id.is_some()
        || details.number.is_some()
        || details.contents.is_some()
        || details.temperature.is_some()
        || details.location.is_some();

    Ok(CallRecord {
        id,
        to: row.get(1)?,
        from: row.get(2)?,
        status,
        duration: row.get(4)?,
        timestamp: row.get(5)?,
        message: row.get(6)?,
        shipment_details: has_details.then_some(details),
    })
}
