use crate::error::{Result, StoreError};
use crate::repo::ShipmentRepository;
use crate::subscribe::{Snapshot, Subscribers};
use coldchain_core::{
    Alert, AlertId, AlertKind, Contacts, JourneyPoint, Place, PointStatus, ShipmentId,
    ShipmentRecord, ShipmentStatus, TemperatureReading, Thresholds,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::mpsc::Receiver;

const SHIPMENT_COLUMNS: &str = "id, owner, number, bill_of_lading, carrier, contents, status,
    origin_city, origin_country, destination_city, destination_country,
    departure_time, estimated_delivery, current_temperature,
    sender_name, sender_role, organization, phone, email, source_file";

pub struct ShipmentsRepo<'a> {
    conn: &'a Connection,
    subscribers: &'a Subscribers,
}

impl<'a> ShipmentsRepo<'a> {
    pub fn new(conn: &'a Connection, subscribers: &'a Subscribers) -> Self {
        Self { conn, subscribers }
    }

    pub fn count_for_owner(&self, owner: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shipments WHERE owner = ?1;",
            [owner],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn notify(&self, owner: &str) -> Result<()> {
        if self.subscribers.watches(owner) {
            let snapshot = load_shipments(self.conn, owner, None)?;
            self.subscribers.publish(owner, &snapshot);
        }
        Ok(())
    }

    fn notify_each(&self, shipments: &[ShipmentRecord]) -> Result<()> {
        let mut owners: Vec<&str> = shipments.iter().map(|s| s.owner.as_str()).collect();
        owners.sort_unstable();
        owners.dedup();
        for owner in owners {
            self.notify(owner)?;
        }
        Ok(())
    }
}

impl ShipmentRepository for ShipmentsRepo<'_> {
    fn list(&self, owner: &str) -> Result<Vec<ShipmentRecord>> {
        load_shipments(self.conn, owner, None)
    }

    fn get(&self, owner: &str, id: &ShipmentId) -> Result<Option<ShipmentRecord>> {
        let mut found = load_shipments(self.conn, owner, Some(id))?;
        Ok(found.pop())
    }

    fn create(&self, shipment: &ShipmentRecord) -> Result<()> {
        self.insert_batch(std::slice::from_ref(shipment))
    }

    fn insert_batch(&self, shipments: &[ShipmentRecord]) -> Result<()> {
        if shipments.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        insert_batch_inner(&tx, shipments)?;
        tx.commit()?;
        self.notify_each(shipments)
    }

    fn update(&self, shipment: &ShipmentRecord) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE shipments SET
                number = ?3, bill_of_lading = ?4, carrier = ?5, contents = ?6, status = ?7,
                origin_city = ?8, origin_country = ?9,
                destination_city = ?10, destination_country = ?11,
                departure_time = ?12, estimated_delivery = ?13, current_temperature = ?14,
                sender_name = ?15, sender_role = ?16, organization = ?17, phone = ?18,
                email = ?19, source_file = ?20
             WHERE owner = ?1 AND id = ?2;",
            params![
                shipment.owner,
                shipment.id.as_str(),
                shipment.number,
                shipment.bill_of_lading,
                shipment.carrier,
                shipment.contents,
                shipment.status.as_str(),
                shipment.origin.city,
                shipment.origin.country,
                shipment.destination.city,
                shipment.destination.country,
                shipment.departure_time,
                shipment.estimated_delivery,
                shipment.current_temperature,
                contact_field(shipment, |c| c.sender_name.as_deref()),
                contact_field(shipment, |c| c.role.as_deref()),
                contact_field(shipment, |c| c.organization.as_deref()),
                contact_field(shipment, |c| c.phone.as_deref()),
                contact_field(shipment, |c| c.email.as_deref()),
                shipment.source_file,
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(shipment.id.to_string()));
        }

        for table in ["shipment_readings", "shipment_journey", "shipment_alerts"] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE owner = ?1 AND shipment_id = ?2;"),
                params![shipment.owner, shipment.id.as_str()],
            )?;
        }
        insert_children(&tx, shipment)?;
        tx.commit()?;
        self.notify(&shipment.owner)
    }

    fn delete(&self, owner: &str, id: &ShipmentId) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM shipments WHERE owner = ?1 AND id = ?2;",
            params![owner, id.as_str()],
        )?;
        if deleted > 0 {
            self.notify(owner)?;
        }
        Ok(deleted > 0)
    }

    fn delete_for_owner(&self, owner: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM shipments WHERE owner = ?1;", [owner])?;
        self.notify(owner)?;
        Ok(deleted)
    }

    fn subscribe(&self, owner: &str) -> Result<Receiver<Snapshot>> {
        let initial = load_shipments(self.conn, owner, None)?;
        Ok(self.subscribers.add(owner, initial))
    }

    /// Runs delete and insert in one transaction, so readers never see a partial set.
    fn replace_for_owner(&self, owner: &str, shipments: &[ShipmentRecord]) -> Result<usize> {
        if let Some(foreign) = shipments.iter().find(|s| s.owner != owner) {
            return Err(StoreError::InvalidValue {
                field: "owner",
                value: foreign.owner.clone(),
            });
        }
        let tx = self.conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM shipments WHERE owner = ?1;", [owner])?;
        insert_batch_inner(&tx, shipments)?;
        tx.commit()?;
        self.notify(owner)?;
        Ok(deleted)
    }
}

fn insert_batch_inner(conn: &Connection, shipments: &[ShipmentRecord]) -> Result<()> {
    let mut next_position: HashMap<&str, i64> = HashMap::new();
    for shipment in shipments {
        let owner = shipment.owner.as_str();
        let position = match next_position.get(owner) {
            Some(position) => *position,
            None => conn.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM shipments WHERE owner = ?1;",
                [owner],
                |row| row.get(0),
            )?,
        };
        insert_shipment(conn, shipment, position)?;
        next_position.insert(owner, position + 1);
    }
    Ok(())
}

fn insert_shipment(conn: &Connection, shipment: &ShipmentRecord, position: i64) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM shipments WHERE owner = ?1 AND id = ?2;",
            params![shipment.owner, shipment.id.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(StoreError::DuplicateShipment(shipment.id.to_string()));
    }

    conn.execute(
        "INSERT INTO shipments (
            owner, id, position, number, bill_of_lading, carrier, contents, status,
            origin_city, origin_country, destination_city, destination_country,
            departure_time, estimated_delivery, current_temperature,
            sender_name, sender_role, organization, phone, email, source_file)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18, ?19, ?20, ?21);",
        params![
            shipment.owner,
            shipment.id.as_str(),
            position,
            shipment.number,
            shipment.bill_of_lading,
            shipment.carrier,
            shipment.contents,
            shipment.status.as_str(),
            shipment.origin.city,
            shipment.origin.country,
            shipment.destination.city,
            shipment.destination.country,
            shipment.departure_time,
            shipment.estimated_delivery,
            shipment.current_temperature,
            contact_field(shipment, |c| c.sender_name.as_deref()),
            contact_field(shipment, |c| c.role.as_deref()),
            contact_field(shipment, |c| c.organization.as_deref()),
            contact_field(shipment, |c| c.phone.as_deref()),
            contact_field(shipment, |c| c.email.as_deref()),
            shipment.source_file,
        ],
    )?;
    insert_children(conn, shipment)
}

fn insert_children(conn: &Connection, shipment: &ShipmentRecord) -> Result<()> {
    let owner = shipment.owner.as_str();
    let id = shipment.id.as_str();

    let mut readings = conn.prepare(
        "INSERT INTO shipment_readings
            (owner, shipment_id, seq, timestamp, location, value, value_f, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
    )?;
    for (seq, reading) in shipment.temperature_history.iter().enumerate() {
        readings.execute(params![
            owner,
            id,
            seq as i64,
            reading.timestamp,
            reading.location,
            reading.value,
            reading.value_f,
            reading.status.as_str(),
        ])?;
    }

    let mut journey = conn.prepare(
        "INSERT INTO shipment_journey
            (owner, shipment_id, seq, location, timestamp, temperature, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
    )?;
    for (seq, point) in shipment.journey.iter().enumerate() {
        journey.execute(params![
            owner,
            id,
            seq as i64,
            point.location,
            point.timestamp,
            point.temperature,
            point.status.as_str(),
        ])?;
    }

    let mut alerts = conn.prepare(
        "INSERT INTO shipment_alerts
            (id, owner, shipment_id, seq, kind, message, timestamp, location, read,
             temperature, threshold_min, threshold_max)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
    )?;
    for (seq, alert) in shipment.alerts.iter().enumerate() {
        alerts.execute(params![
            alert.id.to_string(),
            owner,
            id,
            seq as i64,
            alert.kind.as_str(),
            alert.message,
            alert.timestamp,
            alert.location,
            alert.read,
            alert.temperature,
            alert.threshold.map(|t| t.min),
            alert.threshold.map(|t| t.max),
        ])?;
    }

    Ok(())
}

fn contact_field<'s>(
    shipment: &'s ShipmentRecord,
    pick: impl Fn(&'s Contacts) -> Option<&'s str>,
) -> Option<&'s str> {
    shipment.contacts.as_ref().and_then(pick)
}

fn load_shipments(
    conn: &Connection,
    owner: &str,
    only: Option<&ShipmentId>,
) -> Result<Vec<ShipmentRecord>> {
    let only = only.map(|id| id.as_str());

    let mut stmt = conn.prepare(&format!(
        "SELECT {SHIPMENT_COLUMNS}
         FROM shipments
         WHERE owner = ?1 AND (?2 IS NULL OR id = ?2)
         ORDER BY position ASC;"
    ))?;
    let mut rows = stmt.query(params![owner, only])?;
    let mut shipments = Vec::new();
    while let Some(row) = rows.next()? {
        shipments.push(shipment_from_row(row)?);
    }
    if shipments.is_empty() {
        return Ok(shipments);
    }

    let mut readings = load_readings(conn, owner, only)?;
    let mut journey = load_journey(conn, owner, only)?;
    let mut alerts = load_alerts(conn, owner, only)?;
    for shipment in &mut shipments {
        let key = shipment.id.as_str();
        shipment.temperature_history = readings.remove(key).unwrap_or_default();
        shipment.journey = journey.remove(key).unwrap_or_default();
        shipment.alerts = alerts.remove(key).unwrap_or_default();
    }
    Ok(shipments)
}

fn load_readings(
    conn: &Connection,
    owner: &str,
    only: Option<&str>,
) -> Result<HashMap<String, Vec<TemperatureReading>>> {
    let mut stmt = conn.prepare(
        "SELECT shipment_id, timestamp, location, value, value_f, status
         FROM shipment_readings
         WHERE owner = ?1 AND (?2 IS NULL OR shipment_id = ?2)
         ORDER BY shipment_id ASC, seq ASC;",
    )?;
    let mut rows = stmt.query(params![owner, only])?;
    let mut map: HashMap<String, Vec<TemperatureReading>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let shipment_id: String = row.get(0)?;
        let status: String = row.get(5)?;
        map.entry(shipment_id).or_default().push(TemperatureReading {
            timestamp: row.get(1)?,
            location: row.get(2)?,
            value: row.get(3)?,
            value_f: row.get(4)?,
            status: parse_point_status(status)?,
        });
    }
    Ok(map)
}

fn load_journey(
    conn: &Connection,
    owner: &str,
    only: Option<&str>,
) -> Result<HashMap<String, Vec<JourneyPoint>>> {
    let mut stmt = conn.prepare(
        "SELECT shipment_id, location, timestamp, temperature, status
         FROM shipment_journey
         WHERE owner = ?1 AND (?2 IS NULL OR shipment_id = ?2)
         ORDER BY shipment_id ASC, seq ASC;",
    )?;
    let mut rows = stmt.query(params![owner, only])?;
    let mut map: HashMap<String, Vec<JourneyPoint>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let shipment_id: String = row.get(0)?;
        let status: String = row.get(4)?;
        map.entry(shipment_id).or_default().push(JourneyPoint {
            location: row.get(1)?,
            timestamp: row.get(2)?,
            temperature: row.get(3)?,
            status: parse_point_status(status)?,
        });
    }
    Ok(map)
}

fn load_alerts(
    conn: &Connection,
    owner: &str,
    only: Option<&str>,
) -> Result<HashMap<String, Vec<Alert>>> {
    let mut stmt = conn.prepare(
        "SELECT shipment_id, id, kind, message, timestamp, location, read,
                temperature, threshold_min, threshold_max
         FROM shipment_alerts
         WHERE owner = ?1 AND (?2 IS NULL OR shipment_id = ?2)
         ORDER BY shipment_id ASC, seq ASC;",
    )?;
    let mut rows = stmt.query(params![owner, only])?;
    let mut map: HashMap<String, Vec<Alert>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let shipment_id: String = row.get(0)?;
        map.entry(shipment_id).or_default().push(alert_from_row(row)?);
    }
    Ok(map)
}

fn shipment_from_row(row: &Row<'_>) -> Result<ShipmentRecord> {
    let id_raw: String = row.get(0)?;
    let id = ShipmentId::new(&id_raw).map_err(|_| StoreError::InvalidId(id_raw.clone()))?;
    let status_raw: String = row.get(6)?;
    let status = ShipmentStatus::parse(&status_raw).ok_or(StoreError::InvalidValue {
        field: "status",
        value: status_raw,
    })?;

    let contacts = Contacts {
        sender_name: row.get(14)?,
        role: row.get(15)?,
        organization: row.get(16)?,
        phone: row.get(17)?,
        email: row.get(18)?,
    };

    Ok(ShipmentRecord {
        id,
        owner: row.get(1)?,
        number: row.get(2)?,
        bill_of_lading: row.get(3)?,
        carrier: row.get(4)?,
        contents: row.get(5)?,
        status,
        origin: Place {
            city: row.get(7)?,
            country: row.get(8)?,
        },
        destination: Place {
            city: row.get(9)?,
            country: row.get(10)?,
        },
        departure_time: row.get(11)?,
        estimated_delivery: row.get(12)?,
        current_temperature: row.get(13)?,
        temperature_history: Vec::new(),
        journey: Vec::new(),
        alerts: Vec::new(),
        contacts: (!contacts.is_empty()).then_some(contacts),
        source_file: row.get(19)?,
    })
}

fn alert_from_row(row: &Row<'_>) -> Result<Alert> {
    let id_raw: String = row.get(1)?;
    let id = AlertId::from_str(&id_raw).map_err(|_| StoreError::InvalidId(id_raw.clone()))?;
    let kind_raw: String = row.get(2)?;
    let kind = AlertKind::parse(&kind_raw).ok_or(StoreError::InvalidValue {
        field: "alert kind",
        value: kind_raw,
    })?;
    let threshold_min: Option<f64> = row.get(8)?;
    let threshold_max: Option<f64> = row.get(9)?;

    Ok(Alert {
        id,
        kind,
        message: row.get(3)?,
        timestamp: row.get(4)?,
        location: row.get(5)?,
        read: row.get(6)?,
        temperature: row.get(7)?,
        threshold: match (threshold_min, threshold_max) {
            (Some(min), Some(max)) => Some(Thresholds { min, max }),
            _ => None,
        },
    })
}

fn parse_point_status(raw: String) -> Result<PointStatus> {
    PointStatus::parse(&raw).ok_or(StoreError::InvalidValue {
        field: "point status",
        value: raw,
    })
}
