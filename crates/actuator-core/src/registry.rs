// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Actuator Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Construction of actuators from configuration and the per-step driver.
//!
//! Per timestep, for every actuator:
//! resolve ownership → sample → compute loads → project → reduce.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use actuator_math::kernel::validate_resolution;
use actuator_math::polar::AeroDataProvider;
use actuator_types::config::{ActuatorConfig, SimulationConfig};
use actuator_types::error::{ActuatorError, ActuatorResult};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::actuator::ActuatorModel;
use crate::comm::ScopedComm;
use crate::disk::RotorDisk;
use crate::field::{MeshSampler, MeshWriter, ParallelMesh};
use crate::influence::{InfluenceResolver, Ownership, RootLoad};
use crate::line::ActuatorLine;
use crate::loads::{node_contributions, LoadIntegrator, LoadVector};
use crate::partition::SpatialPartition;
use crate::report::{ActuatorSummary, SectionRecord, TimestepReport};
use crate::wing::FixedWing;

/// Everything a constructor needs besides its own geometry block.
pub struct BuildContext<'a> {
    pub config: &'a ActuatorConfig,
    pub id: usize,
    pub density: f64,
    pub polars: &'a dyn AeroDataProvider,
}

pub type ActuatorConstructor = fn(&BuildContext<'_>) -> ActuatorResult<Box<dyn ActuatorModel>>;

/// Identifier → constructor table.
#[derive(Clone)]
pub struct ActuatorFactory {
    constructors: BTreeMap<String, ActuatorConstructor>,
}

impl std::fmt::Debug for ActuatorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl Default for ActuatorFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ActuatorFactory {
    /// Empty table.
    pub fn new() -> Self {
        ActuatorFactory {
            constructors: BTreeMap::new(),
        }
    }

    /// `FixedWing`, `RotorDisk` and `ActuatorLine`.
    pub fn with_builtins() -> Self {
        let mut constructors: BTreeMap<String, ActuatorConstructor> = BTreeMap::new();
        constructors.insert(FixedWing::IDENTIFIER.to_string(), FixedWing::create);
        constructors.insert(RotorDisk::IDENTIFIER.to_string(), RotorDisk::create);
        constructors.insert(ActuatorLine::IDENTIFIER.to_string(), ActuatorLine::create);
        ActuatorFactory { constructors }
    }

    pub fn register(&mut self, identifier: &str, ctor: ActuatorConstructor) -> ActuatorResult<()> {
        if self.constructors.contains_key(identifier) {
            return Err(ActuatorError::DuplicateActuatorType(identifier.to_string()));
        }
        self.constructors.insert(identifier.to_string(), ctor);
        Ok(())
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, ctx: &BuildContext<'_>) -> ActuatorResult<Box<dyn ActuatorModel>> {
        let ctor = self
            .constructors
            .get(&ctx.config.actuator_type)
            .ok_or_else(|| ActuatorError::UnknownActuatorType {
                actuator: ctx.config.label.clone(),
                identifier: ctx.config.actuator_type.clone(),
            })?;
        ctor(ctx)
    }
}

/// All actuators of a simulation, in configuration order.
pub struct ActuatorRegistry {
    actuators: Vec<Box<dyn ActuatorModel>>,
    ownership: Vec<Option<Ownership>>,
    index: HashMap<String, usize>,
    resolver: InfluenceResolver,
    step: u64,
}

impl ActuatorRegistry {
    /// Build every actuator and resolve its ownership on `partition`.
    pub fn build<P: SpatialPartition + ?Sized>(
        config: &SimulationConfig,
        factory: &ActuatorFactory,
        polars: &dyn AeroDataProvider,
        partition: &P,
    ) -> ActuatorResult<Self> {
        config.validate()?;
        let mut actuators = Vec::with_capacity(config.actuators.len());
        let mut index = HashMap::with_capacity(config.actuators.len());
        for (id, act) in config.actuators.iter().enumerate() {
            if index.insert(act.label.clone(), id).is_some() {
                return Err(ActuatorError::DuplicateActuator(act.label.clone()));
            }
            let ctx = BuildContext {
                config: act,
                id,
                density: config.density_for(act),
                polars,
            };
            actuators.push(factory.create(&ctx)?);
        }

        let mut registry = ActuatorRegistry {
            ownership: vec![None; actuators.len()],
            actuators,
            index,
            resolver: InfluenceResolver::new(config.root_policy),
            step: 0,
        };
        registry.resolve_influence(partition)?;
        for act in &registry.actuators {
            let info = act.info();
            info!(
                label = %info.label,
                kind = act.type_name(),
                nodes = act.nodes().len(),
                owners = ?info.procs,
                root = ?info.root_proc,
                "actuator registered"
            );
        }
        Ok(registry)
    }

    /// Recompute owner sets and roots; root counts restart at zero.
    /// Fails if a kernel is too narrow for the partition's cells.
    pub fn resolve_influence<P: SpatialPartition + ?Sized>(
        &mut self,
        partition: &P,
    ) -> ActuatorResult<()> {
        let cell_size = partition.cell_size();
        for act in &self.actuators {
            validate_resolution(act.label(), act.epsilon(), cell_size)?;
        }
        let mut load = RootLoad::default();
        for (act, slot) in self.actuators.iter_mut().zip(self.ownership.iter_mut()) {
            let bbox = act.bounding_box();
            let ownership = self
                .resolver
                .resolve(act.label(), &bbox, partition, &mut load)?;
            act.core_mut().set_ownership(&ownership);
            *slot = Some(ownership);
        }
        Ok(())
    }

    /// Mark every ownership and reduced total stale; the next `advance`
    /// re-resolves.
    pub fn post_regrid(&mut self) {
        for (act, slot) in self.actuators.iter_mut().zip(self.ownership.iter_mut()) {
            act.core_mut().invalidate();
            *slot = None;
        }
    }

    fn resolved_for(&self, epoch: u64) -> Option<Vec<&Ownership>> {
        self.ownership
            .iter()
            .map(|o| o.as_ref().filter(|o| o.epoch == epoch))
            .collect()
    }

    /// One coupling step against `mesh`. Sources are added to whatever the
    /// mesh already holds; clear them first with
    /// [`ParallelMesh::zero_source`] if the step starts from zero.
    pub fn advance(&mut self, mesh: &mut ParallelMesh, time: f64) -> ActuatorResult<TimestepReport> {
        let epoch = mesh.epoch();
        if self.resolved_for(epoch).is_none() {
            self.resolve_influence(mesh.partition())?;
            for act in &self.actuators {
                let info = act.info();
                info!(
                    label = %info.label,
                    epoch,
                    owners = ?info.procs,
                    root = ?info.root_proc,
                    "ownership re-resolved"
                );
            }
        }
        let ownership: Vec<Ownership> = self
            .resolved_for(epoch)
            .ok_or_else(|| ActuatorError::Partition("ownership resolution failed".to_string()))?
            .into_iter()
            .cloned()
            .collect();

        let t0 = Instant::now();
        {
            let shared: &ParallelMesh = mesh;
            self.actuators
                .par_iter_mut()
                .zip(ownership.par_iter())
                .try_for_each(|(act, own)| -> ActuatorResult<()> {
                    let label = act.label().to_string();
                    let comm = ScopedComm::new(&label, own, epoch)?;
                    let sampler = MeshSampler::new(shared, comm)?;
                    act.sample_state(&sampler)?;
                    act.compute_loads()
                })?;
        }
        let t_loads = t0.elapsed();

        for (act, own) in self.actuators.iter().zip(&ownership) {
            let comm = ScopedComm::new(act.label(), own, epoch)?;
            let mut writer = MeshWriter::new(mesh, comm)?;
            act.project_forces(&mut writer)?;
        }
        let t_project = t0.elapsed() - t_loads;

        let mut summaries = Vec::with_capacity(self.actuators.len());
        for (act, own) in self.actuators.iter_mut().zip(&ownership) {
            let label = act.label().to_string();
            let parts = node_contributions(
                &label,
                act.nodes(),
                own,
                mesh.partition(),
                &act.load_reference(),
            )?;
            let reduced = LoadIntegrator::reduce(&label, parts, own)?;
            summaries.push(ActuatorSummary {
                label,
                actuator_type: act.type_name().to_string(),
                root: reduced.root,
                owners: own.owners.iter().copied().collect(),
                num_nodes: act.nodes().len(),
                loads: reduced.totals,
            });
            act.core_mut().set_reduced(reduced);
        }

        self.step += 1;
        debug!(
            step = self.step,
            time,
            actuators = self.actuators.len(),
            loads_us = t_loads.as_micros() as u64,
            project_us = t_project.as_micros() as u64,
            total_us = t0.elapsed().as_micros() as u64,
            "actuator step"
        );
        Ok(TimestepReport {
            step: self.step,
            time,
            epoch,
            actuators: summaries,
        })
    }

    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.actuators.iter().map(|a| a.label())
    }

    pub fn get(&self, label: &str) -> Option<&dyn ActuatorModel> {
        self.index.get(label).map(|&i| self.actuators[i].as_ref())
    }

    /// Current ownership of `label`; `None` while stale.
    pub fn ownership(&self, label: &str) -> Option<&Ownership> {
        self.index
            .get(label)
            .and_then(|&i| self.ownership[i].as_ref())
    }

    pub fn integrated_loads(&self, label: &str, rank: usize) -> ActuatorResult<LoadVector> {
        let act = self.get(label).ok_or_else(|| {
            ActuatorError::config(label, "no actuator with this label is registered")
        })?;
        act.integrated_loads(rank).copied()
    }

    /// Sectional data of `label`, available on its root like the totals.
    pub fn sections(&self, label: &str, rank: usize) -> ActuatorResult<Vec<SectionRecord>> {
        let act = self.get(label).ok_or_else(|| {
            ActuatorError::config(label, "no actuator with this label is registered")
        })?;
        act.integrated_loads(rank)?;
        Ok(act.nodes().iter().map(SectionRecord::from).collect())
    }

    pub fn step(&self) -> u64 {
        self.step
    }
}
