//! Sketch snapshots
//!
//! A [`SketchRecord`] is the persisted form of a sketch: its nodes, entities
//! and constraints plus the closed profiles detected when it was exported.
//! Records are stored as pretty RON on disk and as JSON at the web boundary.

use std::collections::HashSet;
use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{Sketch, SketchConstraint, SketchEntity, SketchError, SketchNode, SketchResult};

/// Serializable snapshot of a sketch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchRecord {
    /// Plane the sketch lies on
    pub plane_id: Uuid,
    /// Nodes in creation order
    pub nodes: Vec<SketchNode>,
    /// Entities in creation order
    pub entities: Vec<SketchEntity>,
    /// Constraints
    pub constraints: Vec<SketchConstraint>,
    /// Closed profiles at export time (derived, ignored on load)
    #[serde(default)]
    pub profiles: Vec<Vec<DVec2>>,
}

impl SketchRecord {
    /// Serialize to pretty RON
    pub fn to_ron(&self) -> SketchResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SketchError::Serialize(e.to_string()))
    }

    /// Parse from RON
    pub fn from_ron(content: &str) -> SketchResult<Self> {
        ron::from_str(content).map_err(|e| SketchError::Deserialize(e.to_string()))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> SketchResult<String> {
        serde_json::to_string(self).map_err(|e| SketchError::Serialize(e.to_string()))
    }

    /// Parse from JSON
    pub fn from_json(content: &str) -> SketchResult<Self> {
        serde_json::from_str(content).map_err(|e| SketchError::Deserialize(e.to_string()))
    }

    /// Save to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> SketchResult<()> {
        let path = path.as_ref();
        let content = self.to_ron()?;
        std::fs::write(path, content).map_err(|e| SketchError::Io(e.to_string()))?;
        info!("Saved sketch record to {:?}", path);
        Ok(())
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> SketchResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SketchError::Io(e.to_string()))?;
        let record = Self::from_ron(&content)?;
        info!("Loaded sketch record from {:?}", path);
        Ok(record)
    }

    /// Check that every reference in the record resolves
    pub fn validate(&self) -> SketchResult<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id) {
                return Err(SketchError::Deserialize(format!(
                    "duplicate node {}",
                    node.id
                )));
            }
        }

        let mut entity_ids = HashSet::new();
        for entity in &self.entities {
            if !entity_ids.insert(entity.id) {
                return Err(SketchError::Deserialize(format!(
                    "duplicate entity {}",
                    entity.id
                )));
            }
            if let Some(node) = entity.node_ids().into_iter().find(|n| !node_ids.contains(n)) {
                return Err(SketchError::DanglingNode {
                    entity: entity.id,
                    node,
                });
            }
        }

        for constraint in &self.constraints {
            if let Some(missing) = constraint
                .entity_ids
                .iter()
                .find(|id| !entity_ids.contains(*id))
            {
                return Err(SketchError::EntityNotFound(*missing));
            }
        }
        Ok(())
    }
}

impl Sketch {
    /// Snapshot the sketch, including its current closed profiles
    pub fn export_record(&self, plane_id: Uuid) -> SketchRecord {
        SketchRecord {
            plane_id,
            nodes: self.nodes_iter().copied().collect(),
            entities: self.entities.clone(),
            constraints: self.constraints.clone(),
            profiles: self.closed_contours(),
        }
    }

    /// Replace the whole sketch state with a record
    ///
    /// The record is validated first; on error the sketch is left unchanged.
    /// Connections are recomputed, unreferenced nodes are dropped and stored
    /// profiles are not used.
    pub fn load_record(&mut self, record: SketchRecord) -> SketchResult<()> {
        record.validate()?;

        self.clear();
        for node in record.nodes {
            self.node_order.push(node.id);
            self.nodes.insert(node.id, node);
        }
        self.entities = record.entities;
        self.constraints = record.constraints;
        self.refresh_connections();
        self.remove_orphan_nodes();

        info!(
            "Loaded sketch with {} nodes, {} entities and {} constraints",
            self.nodes.len(),
            self.entities.len(),
            self.constraints.len()
        );
        Ok(())
    }
}
