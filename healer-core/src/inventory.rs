//! Device inventory and fleet presence metrics.
//!
//! The inventory is an external source of truth; the healer only reads it as a
//! JSON array of records and never derives the watch list from it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::metrics::escape_label;

/// One entry of the device inventory. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeviceRecord {
    #[serde(default)]
    pub serial: Option<String>,
    /// Only an explicit `true` counts as online.
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub model: Option<String>,
}

/// Fleet-wide presence totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct FleetSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

impl FleetSummary {
    pub fn from_records(records: &[DeviceRecord]) -> Self {
        let total = records.len();
        let online = records.iter().filter(|r| r.present).count();
        Self {
            total,
            online,
            offline: total - online,
        }
    }
}

/// Read an inventory file (JSON array of [`DeviceRecord`]).
pub fn load_inventory(path: &Path) -> Result<Vec<DeviceRecord>, InventoryError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| InventoryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Prometheus text block describing fleet presence.
pub fn render_fleet_metrics(records: &[DeviceRecord]) -> String {
    let summary = FleetSummary::from_records(records);
    let mut out = String::new();

    push_gauge(&mut out, "stf_devices_total", "Total number of STF devices", summary.total);
    push_gauge(&mut out, "stf_devices_online", "Number of online STF devices", summary.online);
    push_gauge(&mut out, "stf_devices_offline", "Number of offline STF devices", summary.offline);

    out.push_str("# HELP stf_device_online Device online status (1 = online, 0 = offline)\n");
    out.push_str("# TYPE stf_device_online gauge\n");
    for record in records {
        let serial = record.serial.as_deref().unwrap_or("unknown");
        let model = record.model.as_deref().unwrap_or("unknown").replace('"', "");
        out.push_str(&format!(
            "stf_device_online{{serial=\"{}\",model=\"{}\"}} {}\n",
            escape_label(serial),
            escape_label(&model),
            u8::from(record.present)
        ));
    }
    out
}

fn push_gauge(out: &mut String, name: &str, help: &str, value: usize) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} gauge\n"));
    out.push_str(&format!("{name} {value}\n"));
}
