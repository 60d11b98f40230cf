//! Node types for the content-addressed include tree.
//!
//! Every node is encoded with the standard bincode configuration and stored
//! in the [`ObjectStore`], so a node's identity is the content hash of its
//! encoding. Structurally equal nodes (same file content, same children,
//! same probe bits) always share one reference, which deduplicates identical
//! headers across translation units sharing a store.

use serde::{Deserialize, Serialize};
use trawl_source::FileCharacteristic;
use trawl_store::{ObjectRef, ObjectStore, StoreError};

/// A file that contributed content to the translation unit.
///
/// Pairs a path with the content reference of the file's bytes. Several
/// `FileNode`s may share one content reference: a symlink and its target
/// produce two nodes with different paths and the same content.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FileNode {
    /// The path under which the content was referenced. Synthetic buffers
    /// use a display name such as `<built-in>`.
    pub path: String,
    /// Reference to the file's bytes in the object store.
    pub content: ObjectRef,
}

impl FileNode {
    /// Stores this node and returns its content-addressed reference.
    pub fn store_in(&self, store: &ObjectStore) -> Result<ObjectRef, StoreError> {
        store.store_node(self)
    }

    /// Loads a node previously stored with [`store_in`](Self::store_in).
    pub fn load(store: &ObjectStore, r: ObjectRef) -> Result<Self, StoreError> {
        store.load_node(r)
    }
}

/// One file's role in the inclusion graph.
///
/// Children are listed in inclusion order together with the byte offset in
/// this file at which each `#include` occurred; the probe bits record, in
/// evaluation order, the result of every `__has_include`-style check made
/// while this file was the active frame. Both orderings are required for a
/// deterministic replay.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct IncludeNode {
    /// Header classification of this file.
    pub characteristic: FileCharacteristic,
    /// Reference to this file's [`FileNode`].
    pub file: ObjectRef,
    /// Child includes as (node reference, byte offset in this file), in
    /// inclusion order.
    pub includes: Vec<(ObjectRef, u32)>,
    /// Results of `__has_include` probes evaluated in this file, in order.
    pub probes: Vec<bool>,
}

impl IncludeNode {
    /// Stores this node and returns its content-addressed reference.
    pub fn store_in(&self, store: &ObjectStore) -> Result<ObjectRef, StoreError> {
        store.store_node(self)
    }

    /// Loads a node previously stored with [`store_in`](Self::store_in).
    pub fn load(store: &ObjectStore, r: ObjectRef) -> Result<Self, StoreError> {
        store.load_node(r)
    }
}

/// One entry in the [`FileManifest`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Reference to the [`FileNode`] for this path.
    pub file: ObjectRef,
    /// Size of the file in bytes as declared by the front end, used to
    /// validate a replay without re-reading the filesystem.
    pub size: u64,
}

/// Flat list of every distinct file path that contributed content.
///
/// Ordered by first use during the scan, followed by the path-sorted files
/// that were only reached through a precompiled header. The ordering is
/// deterministic: scanning an unchanged translation unit twice produces a
/// byte-identical manifest.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct FileManifest {
    /// The manifest entries.
    pub entries: Vec<ManifestEntry>,
}

impl FileManifest {
    /// Stores this manifest and returns its content-addressed reference.
    pub fn store_in(&self, store: &ObjectStore) -> Result<ObjectRef, StoreError> {
        store.store_node(self)
    }

    /// Loads a manifest previously stored with [`store_in`](Self::store_in).
    pub fn load(store: &ObjectStore, r: ObjectRef) -> Result<Self, StoreError> {
        store.load_node(r)
    }
}

/// The externally visible handle for the full preprocessing shape of one
/// translation unit.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct IncludeTreeRoot {
    /// The [`IncludeNode`] for the main file.
    pub main: ObjectRef,
    /// The [`FileManifest`] covering every contributing file.
    pub manifest: ObjectRef,
    /// Content of the precompiled header configured for the translation
    /// unit, if any.
    pub pch: Option<ObjectRef>,
}

impl IncludeTreeRoot {
    /// Stores this root and returns its content-addressed reference, the
    /// single identity for the whole tree, usable as a cache key.
    pub fn store_in(&self, store: &ObjectStore) -> Result<ObjectRef, StoreError> {
        store.store_node(self)
    }

    /// Loads a root previously stored with [`store_in`](Self::store_in).
    pub fn load(store: &ObjectStore, r: ObjectRef) -> Result<Self, StoreError> {
        store.load_node(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_node_roundtrip() {
        let store = ObjectStore::new();
        let content = store.store(b"int x;");
        let node = FileNode {
            path: "/src/a.h".to_string(),
            content,
        };
        let r = node.store_in(&store).unwrap();
        assert_eq!(FileNode::load(&store, r).unwrap(), node);
    }

    #[test]
    fn equal_nodes_share_identity() {
        let store = ObjectStore::new();
        let content = store.store(b"int x;");
        let a = FileNode {
            path: "/src/a.h".to_string(),
            content,
        };
        let b = a.clone();
        assert_eq!(a.store_in(&store).unwrap(), b.store_in(&store).unwrap());
    }

    #[test]
    fn include_node_preserves_child_order() {
        let store = ObjectStore::new();
        let file = store.store(b"main");
        let child_a = store.store(b"a");
        let child_b = store.store(b"b");
        let node = IncludeNode {
            characteristic: FileCharacteristic::User,
            file: FileNode {
                path: "/m.c".into(),
                content: file,
            }
            .store_in(&store)
            .unwrap(),
            includes: vec![(child_a, 120), (child_b, 200)],
            probes: vec![true, false, true],
        };
        let r = node.store_in(&store).unwrap();
        let back = IncludeNode::load(&store, r).unwrap();
        assert_eq!(back.includes, vec![(child_a, 120), (child_b, 200)]);
        assert_eq!(back.probes, vec![true, false, true]);
    }

    #[test]
    fn probe_order_changes_identity() {
        let store = ObjectStore::new();
        let file = store.store(b"f");
        let base = IncludeNode {
            characteristic: FileCharacteristic::System,
            file,
            includes: vec![],
            probes: vec![true, false],
        };
        let mut flipped = base.clone();
        flipped.probes = vec![false, true];
        assert_ne!(
            base.store_in(&store).unwrap(),
            flipped.store_in(&store).unwrap()
        );
    }

    #[test]
    fn root_roundtrip_with_pch() {
        let store = ObjectStore::new();
        let main = store.store(b"main node");
        let manifest = FileManifest::default().store_in(&store).unwrap();
        let pch = store.store(b"pch bytes");
        let root = IncludeTreeRoot {
            main,
            manifest,
            pch: Some(pch),
        };
        let r = root.store_in(&store).unwrap();
        assert_eq!(IncludeTreeRoot::load(&store, r).unwrap(), root);
    }

    #[test]
    fn manifest_order_changes_identity() {
        let store = ObjectStore::new();
        let a = ManifestEntry {
            file: store.store(b"a"),
            size: 1,
        };
        let b = ManifestEntry {
            file: store.store(b"b"),
            size: 1,
        };
        let m1 = FileManifest {
            entries: vec![a, b],
        };
        let m2 = FileManifest {
            entries: vec![b, a],
        };
        assert_ne!(m1.store_in(&store).unwrap(), m2.store_in(&store).unwrap());
    }
}
