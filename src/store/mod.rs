// src/store/mod.rs
//
// Snapshot store for the two uploaded tables. Uploads build a complete
// table, persist it, then swap the Arc under a short write lock; a report
// clones both Arcs under one read lock and therefore always computes over
// a consistent (tickets, thresholds) pair — never a torn table.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{SlaThreshold, Ticket};

const TICKETS_FILE: &str = "tickets.json";
const SLA_FILE: &str = "sla.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketTable {
    pub upload_id: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub rows: Vec<Ticket>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub upload_id: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub rows: Vec<SlaThreshold>,
}

#[derive(Default)]
struct Tables {
    tickets: Option<Arc<TicketTable>>,
    thresholds: Option<Arc<ThresholdTable>>,
}

#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    data_dir: PathBuf,
    tables: RwLock<Tables>,
}

impl Store {
    /// Opens the store under `data_dir`, reloading any persisted tables.
    /// An unreadable snapshot file is logged and skipped rather than
    /// refusing to start.
    pub fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;

        let tables = Tables {
            tickets: load_table(&data_dir.join(TICKETS_FILE)).map(Arc::new),
            thresholds: load_table(&data_dir.join(SLA_FILE)).map(Arc::new),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                data_dir,
                tables: RwLock::new(tables),
            }),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }

    /// Wholesale replacement, last-write-wins. Persist first, then swap.
    pub fn replace_tickets(&self, table: TicketTable) -> anyhow::Result<Arc<TicketTable>> {
        persist_table(&self.inner.data_dir.join(TICKETS_FILE), &table)?;
        let table = Arc::new(table);
        self.inner.tables.write().tickets = Some(table.clone());
        Ok(table)
    }

    pub fn replace_thresholds(&self, table: ThresholdTable) -> anyhow::Result<Arc<ThresholdTable>> {
        persist_table(&self.inner.data_dir.join(SLA_FILE), &table)?;
        let table = Arc::new(table);
        self.inner.tables.write().thresholds = Some(table.clone());
        Ok(table)
    }

    /// Consistent snapshot pair, or `None` until both uploads have landed.
    pub fn snapshot(&self) -> Option<(Arc<TicketTable>, Arc<ThresholdTable>)> {
        let tables = self.inner.tables.read();
        match (&tables.tickets, &tables.thresholds) {
            (Some(tickets), Some(thresholds)) => Some((tickets.clone(), thresholds.clone())),
            _ => None,
        }
    }
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read snapshot file");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt snapshot file ignored");
            None
        }
    }
}

/// Write-to-temp then rename, so a crash mid-write cannot leave a torn
/// file behind.
fn persist_table<T: Serialize>(path: &Path, table: &T) -> anyhow::Result<()> {
    let bytes = serde_json::to_vec(table)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}
