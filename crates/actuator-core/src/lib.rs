//! Actuator coupling to a partitioned Cartesian mesh.
//!
//! Partition and rank-local fields, influence resolution, actuator models
//! (wing, rotor disk, line), load reduction and the per-step registry.

pub mod actuator;
pub mod comm;
pub mod disk;
pub mod field;
pub mod influence;
pub mod line;
pub mod loads;
pub mod partition;
pub mod registry;
pub mod report;
pub mod wing;

pub use actuator::{ActuatorModel, FlowSampler, SourceWriter};
pub use field::ParallelMesh;
pub use partition::{PartitionMap, SpatialPartition};
pub use registry::{ActuatorFactory, ActuatorRegistry};
pub use report::TimestepReport;
