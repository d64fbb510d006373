pub mod db;
pub mod error;
pub mod memory;
pub mod migrate;
pub mod paths;
pub mod repo;
pub mod subscribe;

use crate::error::Result;
use crate::subscribe::Subscribers;
use rusqlite::Connection;
use std::path::Path;

pub use error::{StoreError, StoreErrorKind};
pub use memory::{MemoryCalls, MemoryShipments};
pub use repo::{CallHistory, CallsRepo, ShipmentRepository, ShipmentsRepo};
pub use subscribe::Snapshot;

pub struct Store {
    conn: Connection,
    subscribers: Subscribers,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::open(path)?;
        Ok(Self {
            conn,
            subscribers: Subscribers::default(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Ok(Self {
            conn,
            subscribers: Subscribers::default(),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        migrate::run_migrations(&self.conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        migrate::schema_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn shipments(&self) -> ShipmentsRepo<'_> {
        ShipmentsRepo::new(&self.conn, &self.subscribers)
    }

    pub fn calls<'a>(&'a self, owner: &'a str) -> CallsRepo<'a> {
        CallsRepo::new(&self.conn, owner)
    }
}
