//! Stable port assignment for forwarded services
//!
//! Each service label keeps the port it was first given for as long as that
//! port stays free. Assignments are drawn from a dedicated high range
//! (41000-41999 by default) that is unlikely to collide with the usual
//! development ports.
//!
//! The table lives at `<state_dir>/ports.json`:
//!
//! ```json
//! {"assignments": {"web": {"label": "web", "port": 41000, "assignedAt": "..."}}}
//! ```
//!
//! It is read once per allocator and written only on `save()`, so two
//! processes allocating at the same time can race.

use crate::cache::write_atomic;
use crate::config::PortsConfig;
use crate::error::{PrebakeError, PrebakeResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::{Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A port held by one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortAssignment {
    pub label: String,
    pub port: u16,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PortTable {
    #[serde(default)]
    assignments: BTreeMap<String, PortAssignment>,
}

/// Liveness check for a candidate port
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Whether `port` can be bound right now
    async fn is_free(&self, port: u16) -> bool;
}

/// Probe by binding a TCP listener on the loopback interface
pub struct TcpBindProbe;

#[async_trait]
impl PortProbe for TcpBindProbe {
    async fn is_free(&self, port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Port {} unavailable: {}", port, e);
                false
            }
        }
    }
}

/// Port allocator over a persisted assignment table
pub struct PortAllocator {
    path: PathBuf,
    range: RangeInclusive<u16>,
    table: PortTable,
    probe: Box<dyn PortProbe>,
}

impl PortAllocator {
    /// Load the table at `path`. A missing or corrupt table starts empty.
    pub async fn load(path: &Path, config: &PortsConfig, probe: Box<dyn PortProbe>) -> Self {
        let table = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt port table {}: {}", path.display(), e);
                PortTable::default()
            }),
            Err(_) => PortTable::default(),
        };

        Self {
            path: path.to_path_buf(),
            range: config.range_start..=config.range_end,
            table,
            probe,
        }
    }

    /// Return the port for `label`, reusing its previous port while free.
    ///
    /// Candidates are scanned from the bottom of the range, skipping ports
    /// held by other labels and ports that fail the probe. Probes run one
    /// at a time so the lowest free port always wins.
    pub async fn allocate(&mut self, label: &str) -> PrebakeResult<PortAssignment> {
        if let Some(previous) = self.table.assignments.get(label) {
            if self.probe.is_free(previous.port).await {
                debug!("Reusing port {} for {}", previous.port, label);
                return Ok(previous.clone());
            }
            info!("Port {} for {} is in use, reassigning", previous.port, label);
        }

        let claimed: HashSet<u16> = self
            .table
            .assignments
            .values()
            .filter(|a| a.label != label)
            .map(|a| a.port)
            .collect();

        for port in self.range.clone() {
            if claimed.contains(&port) || !self.probe.is_free(port).await {
                continue;
            }

            let assignment = PortAssignment {
                label: label.to_string(),
                port,
                assigned_at: Utc::now(),
            };
            self.table
                .assignments
                .insert(label.to_string(), assignment.clone());
            info!("Assigned port {} to {}", port, label);
            return Ok(assignment);
        }

        Err(PrebakeError::PortsExhausted {
            start: *self.range.start(),
            end: *self.range.end(),
        })
    }

    /// All known assignments, keyed by label
    pub fn get_allocations(&self) -> &BTreeMap<String, PortAssignment> {
        &self.table.assignments
    }

    /// Persist the table, creating its directory if needed
    pub async fn save(&self) -> PrebakeResult<()> {
        let content = serde_json::to_string_pretty(&self.table)?;
        write_atomic(&self.path, content.as_bytes()).await
    }
}
