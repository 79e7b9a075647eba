//! Parallel reflector
//!
//! Each round splits the pending types into one batch per worker. Every batch
//! starts from the same version of the partial metamodel and threads its own
//! copy through the factories; the versions are merged when the round ends.

use crate::error::{ReflectionError, ReflectionResult};
use crate::metamodel::{Metamodel, PartialMetamodel};
use crate::reflect::{AssemblyInfo, TypeCatalog};

use super::{Reflect, Reflector};

/// Reflector that introspects each round on scoped worker threads
#[derive(Debug)]
pub struct ParallelReflector {
    reflector: Reflector,
    workers: usize,
}

impl ParallelReflector {
    /// Run `reflector` in parallel with the configured worker count
    pub fn new(reflector: Reflector) -> Self {
        let workers = reflector.config().worker_count();
        Self { reflector, workers }
    }

    /// Override the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Worker count
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The wrapped reflector
    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    fn round(
        &self,
        catalog: &TypeCatalog,
        pending: &[String],
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let batch_size = pending.len().div_ceil(self.workers).max(1);
        let reflector = &self.reflector;
        let base = &metamodel;
        let results = crossbeam::scope(|scope| {
            let handles: Vec<_> = pending
                .chunks(batch_size)
                .map(|batch| {
                    scope.spawn(move |_| {
                        batch.iter().try_fold(base.clone(), |version, name| {
                            reflector.introspect_type(catalog, name, version)
                        })
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(ReflectionError::initialisation("reflector worker panicked")))
                })
                .collect::<Vec<_>>()
        })
        .map_err(|_| ReflectionError::initialisation("reflector worker panicked"))?;

        log::debug!(
            "round of {} types in {} batches",
            pending.len(),
            results.len()
        );
        let mut merged = metamodel.clone();
        let mut dropped = Vec::new();
        for result in results {
            let version = result?;
            dropped.extend(pending.iter().filter(|name| !version.contains(name)).cloned());
            merged = merged.merge(version);
        }
        // Other batches still hold these as placeholders from the shared base
        Ok(dropped.iter().fold(merged, |m, name| m.without(name)))
    }
}

impl Reflect for ParallelReflector {
    fn reflect(&self, assemblies: &[AssemblyInfo]) -> ReflectionResult<Metamodel> {
        let mut catalog = self.reflector.prepare(assemblies)?;
        let mut metamodel = self.reflector.seed(&catalog);
        loop {
            let pending = metamodel.placeholders();
            if pending.is_empty() {
                break;
            }
            self.reflector.load_speculative(&mut catalog, &pending);
            metamodel = self.round(&catalog, &pending, metamodel)?;
        }
        self.reflector.complete(&catalog, metamodel)
    }
}
