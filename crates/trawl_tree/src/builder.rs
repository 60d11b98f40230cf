//! Stack-discipline construction of include trees from preprocessing events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use trawl_source::{FileCharacteristic, SessionEnd, SourceFile, SourceId, SourceOrigin};
use trawl_store::{FileContentCache, ObjectRef, ObjectStore, StoreError};

use crate::node::{FileManifest, FileNode, IncludeNode, IncludeTreeRoot, ManifestEntry};

/// An in-progress frame for one currently-open file.
///
/// Frames live in a strict LIFO stack mirroring the lexical nesting of
/// inclusion: a frame is pushed when its file is entered and finalized into
/// an immutable [`IncludeNode`] when the file is exited, after every nested
/// include inside it has itself been finalized.
struct Frame {
    id: SourceId,
    characteristic: FileCharacteristic,
    file: ObjectRef,
    includes: Vec<(ObjectRef, u32)>,
    probes: Vec<bool>,
}

/// Builds an [`IncludeTreeRoot`] from the ordered event stream of one
/// preprocessing session.
///
/// Event handlers follow a record-first-failure policy: once any handler
/// fails (typically because a file's content could not be read), the error
/// is stored, every subsequent event becomes a no-op, and the error is
/// surfaced when the root is taken. The driving front end never has to
/// special-case abrupt termination mid-scan.
///
/// Call-sequence violations (an exit event that does not match the open
/// frame, a probe with no frame open, taking the root before finalization)
/// indicate the front end and consumer have desynchronized and panic
/// unconditionally.
pub struct IncludeTreeBuilder {
    store: Arc<ObjectStore>,
    contents: Arc<FileContentCache>,
    stack: Vec<Frame>,
    /// FileNode refs already resolved this session, keyed by per-session id
    /// so guarded re-inclusion does not re-hash or re-list the file.
    node_for_file: HashMap<SourceId, ObjectRef>,
    /// Files already placed in the manifest via enter events; the finalize
    /// sweep skips these.
    seen: HashSet<SourceId>,
    manifest: Vec<ManifestEntry>,
    /// The predefines buffer is recorded once per session, specially: it
    /// has no on-disk path and never appears in the manifest.
    predefines: Option<ObjectRef>,
    pch: Option<ObjectRef>,
    finalized: bool,
    error: Option<StoreError>,
}

impl IncludeTreeBuilder {
    /// Creates a builder writing nodes into `store` and resolving file
    /// content through `contents`.
    pub fn new(store: Arc<ObjectStore>, contents: Arc<FileContentCache>) -> Self {
        Self {
            store,
            contents,
            stack: Vec::new(),
            node_for_file: HashMap::new(),
            seen: HashSet::new(),
            manifest: Vec::new(),
            predefines: None,
            pch: None,
            finalized: false,
            error: None,
        }
    }

    /// Handles a file-entered event: resolves the file's node and pushes a
    /// new frame for it.
    pub fn file_entered(&mut self, file: &SourceFile) {
        if self.error.is_some() {
            return;
        }
        let node = match self.node_for(file) {
            Ok(node) => node,
            Err(e) => {
                self.error = Some(e);
                return;
            }
        };
        self.stack.push(Frame {
            id: file.id,
            characteristic: file.characteristic,
            file: node,
            includes: Vec::new(),
            probes: Vec::new(),
        });
    }

    /// Handles a file-exited event: pops the frame for `child`, finalizes it
    /// into an [`IncludeNode`], and records it in the `parent` frame at the
    /// given byte offset.
    pub fn file_exited(&mut self, parent: SourceId, child: SourceId, offset: u32) {
        if self.error.is_some() {
            return;
        }
        let frame = self
            .stack
            .pop()
            .expect("file_exited with no open frame");
        assert_eq!(frame.id, child, "exited file is not the active frame");

        let node = match self.finish_frame(frame) {
            Ok(node) => node,
            Err(e) => {
                self.error = Some(e);
                return;
            }
        };

        let top = self
            .stack
            .last_mut()
            .expect("file_exited popped the root frame before finalization");
        assert_eq!(top.id, parent, "exit event does not return to the including file");
        top.includes.push((node, offset));
    }

    /// Records the boolean result of a `__has_include`-style probe in the
    /// currently active frame.
    pub fn has_include_probe(&mut self, result: bool) {
        if self.error.is_some() {
            return;
        }
        let top = self
            .stack
            .last_mut()
            .expect("has_include probe with no open frame");
        top.probes.push(result);
    }

    /// Performs the end-of-session sweep.
    ///
    /// Files the front end read through a precompiled header, without ever
    /// entering them via include events, must still appear in the manifest
    /// for a replay to find them. They arrive in nondeterministic
    /// enumeration order, so they are visited sorted by logical path, which
    /// is stable across runs. If a precompiled header is configured, its
    /// content reference is recorded on the root.
    pub fn finalize(&mut self, session: &SessionEnd) {
        assert!(!self.finalized, "finalize called twice");
        self.finalized = true;
        if self.error.is_some() {
            return;
        }

        let mut unseen: Vec<&SourceFile> = session
            .included_files
            .iter()
            .filter(|f| !f.is_buffer() && !self.seen.contains(&f.id))
            .collect();
        unseen.sort_by_key(|f| f.path().map(|p| p.to_path_buf()));

        for file in unseen {
            self.seen.insert(file.id);
            if let Err(e) = self.add_to_file_list(file) {
                self.error = Some(e);
                return;
            }
        }

        if let Some(pch_path) = &session.pch_path {
            match self.contents.content_ref_for(pch_path) {
                Ok(r) => self.pch = Some(r),
                Err(e) => self.error = Some(e),
            }
        }
    }

    /// Consumes the builder and produces the stored root.
    ///
    /// Returns the recorded failure instead of a partial tree if any event
    /// handler failed. Must only be called after [`finalize`](Self::finalize),
    /// with exactly the main file's frame left open.
    pub fn into_root(mut self) -> Result<(IncludeTreeRoot, ObjectRef), StoreError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        assert!(self.finalized, "into_root called before finalize");
        assert_eq!(
            self.stack.len(),
            1,
            "main file must be the only frame left open"
        );

        let main_frame = self.stack.pop().expect("main frame");
        let main = self.finish_frame(main_frame)?;
        let manifest = FileManifest {
            entries: std::mem::take(&mut self.manifest),
        }
        .store_in(&self.store)?;

        let root = IncludeTreeRoot {
            main,
            manifest,
            pch: self.pch,
        };
        let root_ref = root.store_in(&self.store)?;
        Ok((root, root_ref))
    }

    fn finish_frame(&self, frame: Frame) -> Result<ObjectRef, StoreError> {
        IncludeNode {
            characteristic: frame.characteristic,
            file: frame.file,
            includes: frame.includes,
            probes: frame.probes,
        }
        .store_in(&self.store)
    }

    /// Resolves or creates the [`FileNode`] reference for an entered file.
    fn node_for(&mut self, file: &SourceFile) -> Result<ObjectRef, StoreError> {
        if let Some(node) = self.node_for_file.get(&file.id) {
            return Ok(*node);
        }
        let node = match &file.origin {
            SourceOrigin::Buffer { name, bytes } => match self.predefines {
                Some(node) => node,
                None => {
                    let content = self.store.store(bytes);
                    let node = FileNode {
                        path: name.clone(),
                        content,
                    }
                    .store_in(&self.store)?;
                    self.predefines = Some(node);
                    node
                }
            },
            SourceOrigin::OnDisk { .. } => {
                self.seen.insert(file.id);
                self.add_to_file_list(file)?
            }
        };
        self.node_for_file.insert(file.id, node);
        Ok(node)
    }

    /// Creates the FileNode(s) for an on-disk file and appends them to the
    /// manifest.
    ///
    /// When the file's real path differs from its logical path (a symlink
    /// alias), both paths get a node sharing one content reference, the
    /// real path first. Returns the node for the logical path.
    fn add_to_file_list(&mut self, file: &SourceFile) -> Result<ObjectRef, StoreError> {
        let SourceOrigin::OnDisk {
            path,
            real_path,
            size,
        } = &file.origin
        else {
            unreachable!("synthetic buffers are never listed in the manifest");
        };

        let content = self.contents.content_ref_for(path)?;

        if let Some(real) = real_path {
            if real != path {
                let alias = FileNode {
                    path: real.to_string_lossy().into_owned(),
                    content,
                }
                .store_in(&self.store)?;
                self.manifest.push(ManifestEntry {
                    file: alias,
                    size: *size,
                });
            }
        }

        let node = FileNode {
            path: path.to_string_lossy().into_owned(),
            content,
        }
        .store_in(&self.store)?;
        self.manifest.push(ManifestEntry {
            file: node,
            size: *size,
        });
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn make_builder() -> (tempfile::TempDir, Arc<ObjectStore>, IncludeTreeBuilder) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ObjectStore::new());
        let contents = Arc::new(FileContentCache::new(Arc::clone(&store)));
        let builder = IncludeTreeBuilder::new(Arc::clone(&store), contents);
        (dir, store, builder)
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn on_disk(id: u32, path: &Path, content_len: u64) -> SourceFile {
        SourceFile::on_disk(
            SourceId::from_raw(id),
            FileCharacteristic::User,
            path,
            content_len,
        )
    }

    #[test]
    fn nested_includes_record_structure() {
        let (dir, store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "#include \"a.h\"\nint main() {}\n");
        let a = write_file(dir.path(), "a.h", "#include \"b.h\"\n");
        let hb = write_file(dir.path(), "b.h", "int b;\n");

        let main_f = on_disk(0, &main, 30);
        let a_f = on_disk(1, &a, 15);
        let b_f = on_disk(2, &hb, 7);

        b.file_entered(&main_f);
        b.file_entered(&a_f);
        b.has_include_probe(true);
        b.file_entered(&b_f);
        b.file_exited(a_f.id, b_f.id, 40);
        b.file_exited(main_f.id, a_f.id, 120);
        b.has_include_probe(false);
        b.finalize(&SessionEnd::new());

        let (root, _id) = b.into_root().unwrap();
        let main_node = IncludeNode::load(&store, root.main).unwrap();
        assert_eq!(main_node.includes.len(), 1);
        assert_eq!(main_node.includes[0].1, 120);
        assert_eq!(main_node.probes, vec![false]);

        let a_node = IncludeNode::load(&store, main_node.includes[0].0).unwrap();
        assert_eq!(a_node.includes.len(), 1);
        assert_eq!(a_node.includes[0].1, 40);
        assert_eq!(a_node.probes, vec![true]);

        let b_node = IncludeNode::load(&store, a_node.includes[0].0).unwrap();
        assert!(b_node.includes.is_empty());
        let b_file = FileNode::load(&store, b_node.file).unwrap();
        assert_eq!(store.get(b_file.content).unwrap(), b"int b;\n");
    }

    #[test]
    fn guarded_reinclusion_lists_file_once() {
        let (dir, store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "x");
        let guard = write_file(dir.path(), "guard.h", "#pragma once\n");

        let main_f = on_disk(0, &main, 1);
        let guard_f = on_disk(1, &guard, 13);

        b.file_entered(&main_f);
        b.file_entered(&guard_f);
        b.file_exited(main_f.id, guard_f.id, 10);
        b.file_entered(&guard_f);
        b.file_exited(main_f.id, guard_f.id, 25);
        b.finalize(&SessionEnd::new());

        let (root, _) = b.into_root().unwrap();
        let manifest = FileManifest::load(&store, root.manifest).unwrap();
        // main.c + guard.h, despite guard.h being entered twice.
        assert_eq!(manifest.entries.len(), 2);

        let main_node = IncludeNode::load(&store, root.main).unwrap();
        assert_eq!(main_node.includes.len(), 2);
        // Both child nodes reference the same FileNode.
        let c0 = IncludeNode::load(&store, main_node.includes[0].0).unwrap();
        let c1 = IncludeNode::load(&store, main_node.includes[1].0).unwrap();
        assert_eq!(c0.file, c1.file);
    }

    #[test]
    fn identical_content_under_two_paths_shares_content_ref() {
        let (dir, store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        let a = write_file(dir.path(), "a.h", "same bytes");
        let bb = write_file(dir.path(), "b.h", "same bytes");

        let main_f = on_disk(0, &main, 1);
        let a_f = on_disk(1, &a, 10);
        let b_f = on_disk(2, &bb, 10);

        b.file_entered(&main_f);
        b.file_entered(&a_f);
        b.file_exited(main_f.id, a_f.id, 0);
        b.file_entered(&b_f);
        b.file_exited(main_f.id, b_f.id, 20);
        b.finalize(&SessionEnd::new());

        let (root, _) = b.into_root().unwrap();
        let manifest = FileManifest::load(&store, root.manifest).unwrap();
        assert_eq!(manifest.entries.len(), 3);
        let node_a = FileNode::load(&store, manifest.entries[1].file).unwrap();
        let node_b = FileNode::load(&store, manifest.entries[2].file).unwrap();
        assert_ne!(node_a.path, node_b.path);
        assert_eq!(node_a.content, node_b.content);
    }

    #[test]
    fn symlink_alias_gets_two_manifest_entries_one_content() {
        let (dir, store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        let real = write_file(dir.path(), "real.h", "real header");

        let main_f = on_disk(0, &main, 1);
        let linked = SourceFile::on_disk(
            SourceId::from_raw(1),
            FileCharacteristic::User,
            dir.path().join("link.h"),
            11,
        )
        .with_real_path(&real);
        // The logical path need not exist on disk when a real path is
        // supplied; content is read through the cache by logical path in
        // production, so mirror the alias here with a real file.
        std::fs::write(dir.path().join("link.h"), "real header").unwrap();

        b.file_entered(&main_f);
        b.file_entered(&linked);
        b.file_exited(main_f.id, linked.id, 5);
        b.finalize(&SessionEnd::new());

        let (root, _) = b.into_root().unwrap();
        let manifest = FileManifest::load(&store, root.manifest).unwrap();
        // main.c, then the real-path alias, then the logical path.
        assert_eq!(manifest.entries.len(), 3);
        let alias = FileNode::load(&store, manifest.entries[1].file).unwrap();
        let logical = FileNode::load(&store, manifest.entries[2].file).unwrap();
        assert!(alias.path.ends_with("real.h"));
        assert!(logical.path.ends_with("link.h"));
        assert_eq!(alias.content, logical.content);
    }

    #[test]
    fn predefines_buffer_excluded_from_manifest() {
        let (dir, store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        let predefines =
            SourceFile::buffer(SourceId::from_raw(0), "<built-in>", b"#define __X__ 1".to_vec());
        let main_f = on_disk(1, &main, 1);

        b.file_entered(&main_f);
        b.file_entered(&predefines);
        b.file_exited(main_f.id, predefines.id, 0);
        b.finalize(&SessionEnd::new());

        let (root, _) = b.into_root().unwrap();
        let manifest = FileManifest::load(&store, root.manifest).unwrap();
        assert_eq!(manifest.entries.len(), 1, "only main.c is listed");

        let main_node = IncludeNode::load(&store, root.main).unwrap();
        let pre_node = IncludeNode::load(&store, main_node.includes[0].0).unwrap();
        let pre_file = FileNode::load(&store, pre_node.file).unwrap();
        assert_eq!(pre_file.path, "<built-in>");
        assert_eq!(store.get(pre_file.content).unwrap(), b"#define __X__ 1");
    }

    #[test]
    fn pch_only_files_swept_in_path_order() {
        let (dir, store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        let z = write_file(dir.path(), "z.h", "z");
        let a = write_file(dir.path(), "a.h", "a");
        let pch = write_file(dir.path(), "tu.pch", "pch blob");

        let main_f = on_disk(0, &main, 1);
        b.file_entered(&main_f);

        // Extra files arrive in an arbitrary enumeration order.
        let mut session = SessionEnd::new();
        session.included_files.push(on_disk(5, &z, 1));
        session.included_files.push(on_disk(3, &a, 1));
        session.included_files.push(main_f.clone());
        session.pch_path = Some(pch);
        b.finalize(&session);

        let (root, _) = b.into_root().unwrap();
        assert!(root.pch.is_some());
        assert_eq!(store.get(root.pch.unwrap()).unwrap(), b"pch blob");

        let manifest = FileManifest::load(&store, root.manifest).unwrap();
        let paths: Vec<String> = manifest
            .entries
            .iter()
            .map(|e| FileNode::load(&store, e.file).unwrap().path)
            .collect();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("main.c"), "entered files come first");
        assert!(paths[1].ends_with("a.h"), "swept files are path-sorted");
        assert!(paths[2].ends_with("z.h"));
    }

    #[test]
    fn identical_scans_produce_identical_roots() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_file(dir.path(), "main.c", "#include \"a.h\"\n");
        let a = write_file(dir.path(), "a.h", "int a;\n");
        let extra = write_file(dir.path(), "extra.h", "int e;\n");

        let scan = |flip_order: bool| {
            let store = Arc::new(ObjectStore::new());
            let contents = Arc::new(FileContentCache::new(Arc::clone(&store)));
            let mut b = IncludeTreeBuilder::new(Arc::clone(&store), contents);
            let main_f = on_disk(0, &main, 15);
            let a_f = on_disk(1, &a, 7);
            b.file_entered(&main_f);
            b.file_entered(&a_f);
            b.file_exited(main_f.id, a_f.id, 0);
            let mut session = SessionEnd::new();
            let extra_f = on_disk(2, &extra, 7);
            if flip_order {
                session.included_files.push(extra_f);
                session.included_files.push(a_f);
            } else {
                session.included_files.push(a_f);
                session.included_files.push(extra_f);
            }
            b.finalize(&session);
            b.into_root().unwrap().1
        };

        assert_eq!(scan(false), scan(true));
    }

    #[test]
    fn unreadable_file_poisons_and_surfaces_at_the_end() {
        let (dir, _store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        let main_f = on_disk(0, &main, 1);
        let missing = SourceFile::on_disk(
            SourceId::from_raw(1),
            FileCharacteristic::User,
            dir.path().join("missing.h"),
            0,
        );

        b.file_entered(&main_f);
        b.file_entered(&missing);
        // Subsequent events are accepted but ignored.
        b.has_include_probe(true);
        b.file_exited(main_f.id, missing.id, 8);
        b.finalize(&SessionEnd::new());

        let err = b.into_root().unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    #[should_panic(expected = "not the active frame")]
    fn mismatched_exit_panics() {
        let (dir, _store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        let a = write_file(dir.path(), "a.h", "a");
        let main_f = on_disk(0, &main, 1);
        let a_f = on_disk(1, &a, 1);

        b.file_entered(&main_f);
        b.file_entered(&a_f);
        b.file_exited(a_f.id, main_f.id, 0);
    }

    #[test]
    #[should_panic(expected = "no open frame")]
    fn probe_without_frame_panics() {
        let (_dir, _store, mut b) = make_builder();
        b.has_include_probe(true);
    }

    #[test]
    #[should_panic(expected = "before finalize")]
    fn root_before_finalize_panics() {
        let (dir, _store, mut b) = make_builder();
        let main = write_file(dir.path(), "main.c", "m");
        b.file_entered(&on_disk(0, &main, 1));
        let _ = b.into_root();
    }
}
