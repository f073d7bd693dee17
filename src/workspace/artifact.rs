use crate::effects::SideEffectCollector;
use crate::error::ArtifactError;
use crate::fragment::ParamDecl;
use crate::graph::{GraphHandle, GraphNode, NodeId, NodeKind, Param, Value};
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};

/// What a persisted box is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordKind {
    Operation(String),
    Input(String),
    /// A call of the custom box with this name.
    Fragment(String),
}

/// A persisted box. Ids are local to the enclosing record, numbered in
/// creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: RecordKind,
    pub params: BTreeMap<String, Param>,
    pub inputs: Vec<(String, Value)>,
    pub outputs: Vec<String>,
}

/// The canonical content of a workspace or custom box. Independent of the
/// session-wide node ids, so equal bodies produce equal records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub name: String,
    pub inputs: Vec<String>,
    pub parameters: Vec<ParamDecl>,
    pub nodes: Vec<NodeRecord>,
    pub outputs: Vec<(String, Value)>,
    pub side_effects: Vec<NodeId>,
}

impl GraphRecord {
    pub(crate) fn from_nodes(
        name: &str,
        inputs: &[String],
        parameters: &[ParamDecl],
        nodes: &[GraphNode],
        outputs: &[(String, Value)],
        effects: &SideEffectCollector,
    ) -> Self {
        let local: AHashMap<NodeId, NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i as NodeId))
            .collect();
        let relabel = |value: &Value| match value {
            Value::Handle(h) => match local.get(&h.node) {
                Some(&id) => Value::Handle(GraphHandle::new(id, h.output.clone())),
                None => value.clone(),
            },
            other => other.clone(),
        };
        let relabel_all = |entries: &[(String, Value)]| -> Vec<(String, Value)> {
            entries
                .iter()
                .map(|(n, v)| (n.clone(), relabel(v)))
                .collect()
        };

        let nodes = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| NodeRecord {
                id: i as NodeId,
                kind: match &node.kind {
                    NodeKind::Operation(op) => RecordKind::Operation(op.clone()),
                    NodeKind::Input(slot) => RecordKind::Input(slot.clone()),
                    NodeKind::Instance(instance) => {
                        RecordKind::Fragment(instance.definition().name().to_string())
                    }
                },
                params: node.params.clone(),
                inputs: relabel_all(&node.inputs),
                outputs: node.outputs.clone(),
            })
            .collect();

        Self {
            name: name.to_string(),
            inputs: inputs.to_vec(),
            parameters: parameters.to_vec(),
            nodes,
            outputs: relabel_all(outputs),
            side_effects: effects
                .nodes()
                .iter()
                .filter_map(|id| local.get(id).copied())
                .collect(),
        }
    }
}

/// A validated workspace and every custom box it depends on, ready to be
/// stored under `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWorkspace {
    pub path: String,
    pub root: GraphRecord,
    /// One entry per distinct custom box, in the order they were reached.
    pub fragments: Vec<GraphRecord>,
}

impl SavedWorkspace {
    pub fn fragment(&self, name: &str) -> Option<&GraphRecord> {
        self.fragments.iter().find(|f| f.name == name)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(saved, _)| saved) // bincode 2 returns (data, bytes_read)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }

    /// Writes the encoded workspace to a file.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|source| ArtifactError::Io {
            path: path.to_string(),
            source,
        })?;
        file.write_all(&bytes).map_err(|source| ArtifactError::Io {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|source| ArtifactError::Io {
                path: path.to_string(),
                source,
            })?;
        Self::from_bytes(&bytes)
    }
}
