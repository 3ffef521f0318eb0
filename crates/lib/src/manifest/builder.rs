//! Pipeline dependency graph and manifest serialization.
//!
//! Pipelines are registered with [`ManifestBuilder::add`], which records the
//! edge from each pipeline to its build pipeline. Nothing is registered as a
//! side effect of constructing a pipeline.
//!
//! [`ManifestBuilder::serialize`] orders the pipelines topologically so that a
//! build root is always generated before its dependents, runs the input binding
//! protocol for each of them and assembles the manifest document.

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, info};

use crate::container::{SourceSpec, Spec};
use crate::error::{ManifestError, Result};
use crate::osbuild::Manifest;
use crate::pipeline::{Inputs, Pipeline};

/// Collects pipelines and serializes them into a [`Manifest`].
#[derive(Default)]
pub struct ManifestBuilder {
  pipelines: Vec<Box<dyn Pipeline>>,
}

impl std::fmt::Debug for ManifestBuilder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ManifestBuilder")
      .field("pipelines", &self.pipelines.iter().map(|p| p.name()).collect::<Vec<_>>())
      .finish()
  }
}

impl ManifestBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a fully configured pipeline.
  ///
  /// Export the pipeline before adding it: the builder takes ownership.
  pub fn add(&mut self, pipeline: impl Pipeline + 'static) -> Result<()> {
    if self.pipelines.iter().any(|p| p.name() == pipeline.name()) {
      return Err(ManifestError::DuplicatePipeline(pipeline.name().to_string()));
    }
    debug!(pipeline = %pipeline.name(), build = ?pipeline.build(), "registered pipeline");
    self.pipelines.push(Box::new(pipeline));
    Ok(())
  }

  pub fn pipeline(&self, name: &str) -> Option<&dyn Pipeline> {
    self.pipelines.iter().find(|p| p.name() == name).map(|p| p.as_ref())
  }

  /// Unresolved container references, per pipeline name.
  pub fn container_sources(&self) -> BTreeMap<String, Vec<SourceSpec>> {
    self
      .pipelines
      .iter()
      .filter(|p| !p.container_sources().is_empty())
      .map(|p| (p.name().to_string(), p.container_sources().to_vec()))
      .collect()
  }

  /// The dependency graph: one node per pipeline (weight = index), one edge
  /// from each build pipeline to each of its dependents.
  fn graph(&self) -> Result<DiGraph<usize, ()>> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for (idx, p) in self.pipelines.iter().enumerate() {
      nodes.insert(p.name(), graph.add_node(idx));
    }

    for p in &self.pipelines {
      let Some(build) = p.build() else {
        continue;
      };
      let Some(&build_idx) = nodes.get(build) else {
        return Err(ManifestError::UnknownBuildPipeline {
          pipeline: p.name().to_string(),
          build: build.to_string(),
        });
      };
      graph.add_edge(build_idx, nodes[p.name()], ());
    }

    Ok(graph)
  }

  /// Pipeline names in generation order, build roots first.
  pub fn generation_order(&self) -> Result<Vec<String>> {
    let order = self.ordered_indices()?;
    Ok(order.into_iter().map(|i| self.pipelines[i].name().to_string()).collect())
  }

  /// Indices of the pipelines to serialize, in generation order.
  ///
  /// Pipelines that are neither exported nor a transitive build dependency of
  /// an exported pipeline are pruned. Nothing is pruned if nothing is exported.
  fn ordered_indices(&self) -> Result<Vec<usize>> {
    let graph = self.graph()?;
    let sorted = toposort(&graph, None).map_err(|_| ManifestError::CycleDetected)?;

    let exported: Vec<NodeIndex> = graph
      .node_indices()
      .filter(|&n| self.pipelines[graph[n]].is_exported())
      .collect();
    if exported.is_empty() {
      return Ok(sorted.into_iter().map(|n| graph[n]).collect());
    }

    // each pipeline has at most one build pipeline, so dependencies form chains
    let mut keep = vec![false; self.pipelines.len()];
    for start in exported {
      let mut current = Some(start);
      while let Some(n) = current {
        if keep[graph[n]] {
          break;
        }
        keep[graph[n]] = true;
        current = graph.neighbors_directed(n, Direction::Incoming).next();
      }
    }

    for n in graph.node_indices() {
      if !keep[graph[n]] {
        debug!(
          pipeline = %self.pipelines[graph[n]].name(),
          dependents = graph.neighbors_directed(n, Direction::Outgoing).count(),
          "pruning unexported pipeline"
        );
      }
    }

    Ok(sorted.into_iter().map(|n| graph[n]).filter(|&i| keep[i]).collect())
  }

  /// Serialize all pipelines with their resolved containers.
  ///
  /// Each pipeline is bound to `containers[name]` (empty if absent), generated
  /// and unbound, in generation order. A pipeline is always unbound before an
  /// error is returned, so the builder can be serialized again.
  pub fn serialize(&mut self, containers: &BTreeMap<String, Vec<Spec>>) -> Result<Manifest> {
    let order = self.ordered_indices()?;
    let mut manifest = Manifest::default();

    for idx in order {
      let pipeline = &mut self.pipelines[idx];
      let specs = containers.get(pipeline.name()).cloned().unwrap_or_default();

      pipeline.bind_inputs(Inputs::new(specs.clone()))?;
      let result = pipeline.serialize();
      pipeline.unbind_inputs()?;
      let wire = result?;

      for spec in &specs {
        manifest.sources.add_container(spec);
      }
      for data in pipeline.inline_data() {
        manifest.sources.add_inline(&data);
      }

      info!(pipeline = %wire.name, stages = wire.stages.len(), "serialized pipeline");
      manifest.pipelines.push(wire);
    }

    Ok(manifest)
  }
}
