//! Module-dependency records and the aggregated dependency record.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trawl_store::ObjectRef;

/// Identity of a compiler module: name plus the context hash of the
/// configuration it was discovered under.
///
/// This is the deduplication key across an entire multi-TU scan session:
/// two scans that discover the "same" module produce equal `ModuleId`s and
/// converge to one entry from the caller's point of view.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ModuleId {
    /// The module's name.
    pub name: String,
    /// Hash of the compilation configuration relevant to module identity.
    pub context_hash: String,
}

/// A module discovered from source as required by the translation unit.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ModuleDeps {
    /// The module's identity.
    pub id: ModuleId,
    /// Whether the main file imports this module directly (as opposed to
    /// transitively through another module).
    pub imported_by_main_file: bool,
}

/// A module supplied as an already-compiled artifact rather than discovered
/// from source.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PrebuiltModuleDep {
    /// The module's name.
    pub module_name: String,
    /// On-disk path of the compiled module file.
    pub module_file: PathBuf,
}

/// The kinds of output a module build can materialize.
///
/// Passed to the caller-supplied module-output lookup; the dependency
/// aggregator only ever asks for [`ModuleFile`](Self::ModuleFile).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModuleOutputKind {
    /// The compiled module file itself.
    ModuleFile,
    /// A make-format dependency file for the module build.
    DependencyFile,
}

/// The aggregated dependency information for one translation unit.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Hash of the effective compilation configuration.
    pub context_hash: String,
    /// The original command line rewritten to be dependency-free: argv[0]
    /// dropped, implicit-module caching flags removed, explicit module-file
    /// flags appended.
    pub command_line: Vec<String>,
    /// Every file path the translation unit depends on, in report order.
    pub file_deps: Vec<PathBuf>,
    /// Identities of modules the main file imports directly, in encounter
    /// order.
    pub module_deps: Vec<ModuleId>,
    /// Modules supplied prebuilt.
    pub prebuilt_module_deps: Vec<PrebuiltModuleDep>,
    /// Snapshot of every path the front end touched, when access tracking
    /// was enabled for the scan.
    pub fs_tree: Option<ObjectRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_equality_is_name_plus_context() {
        let a = ModuleId {
            name: "Foo".into(),
            context_hash: "abc".into(),
        };
        let same = ModuleId {
            name: "Foo".into(),
            context_hash: "abc".into(),
        };
        let other_ctx = ModuleId {
            name: "Foo".into(),
            context_hash: "def".into(),
        };
        assert_eq!(a, same);
        assert_ne!(a, other_ctx);
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = DependencyRecord {
            context_hash: "ctx".into(),
            command_line: vec!["-c".into(), "a.c".into()],
            file_deps: vec![PathBuf::from("a.c"), PathBuf::from("a.h")],
            module_deps: vec![ModuleId {
                name: "M".into(),
                context_hash: "ctx".into(),
            }],
            prebuilt_module_deps: vec![PrebuiltModuleDep {
                module_name: "P".into(),
                module_file: PathBuf::from("/pcm/P.pcm"),
            }],
            fs_tree: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: DependencyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
