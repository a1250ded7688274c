//! Per-step output: integrated totals at root, and sectional data.

use std::io::Write;

use actuator_types::error::ActuatorResult;
use actuator_types::state::ActuatorNode;
use glam::DVec3;
use serde::Serialize;

use crate::loads::LoadVector;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuatorSummary {
    pub label: String,
    #[serde(rename = "type")]
    pub actuator_type: String,
    pub root: usize,
    pub owners: Vec<usize>,
    pub num_nodes: usize,
    pub loads: LoadVector,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestepReport {
    pub step: u64,
    pub time: f64,
    pub epoch: u64,
    pub actuators: Vec<ActuatorSummary>,
}

impl TimestepReport {
    pub fn summary(&self, label: &str) -> Option<&ActuatorSummary> {
        self.actuators.iter().find(|a| a.label == label)
    }

    pub fn to_json(&self) -> ActuatorResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// One JSON object per line, for appending step after step.
    pub fn write_json_line<W: Write>(&self, out: &mut W) -> ActuatorResult<()> {
        serde_json::to_writer(&mut *out, self)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// Sectional state of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRecord {
    pub position: DVec3,
    pub flow_velocity: DVec3,
    pub relative_velocity: DVec3,
    pub aoa: f64,
    pub cl: f64,
    pub cd: f64,
    pub lift: f64,
    pub drag: f64,
    pub force: DVec3,
}

impl From<&ActuatorNode> for SectionRecord {
    fn from(n: &ActuatorNode) -> Self {
        SectionRecord {
            position: n.position,
            flow_velocity: n.flow_velocity,
            relative_velocity: n.relative_velocity,
            aoa: n.aoa,
            cl: n.cl,
            cd: n.cd,
            lift: n.lift,
            drag: n.drag,
            force: n.force,
        }
    }
}
