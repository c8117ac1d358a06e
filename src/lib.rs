//! eagerlink — build-time class file patcher
//!
//! Given an entry class and a directory of locally compiled classes,
//! eagerlink computes the transitive set of class names reachable from
//! the entry that are not present locally — external references the
//! platform runtime is expected to supply — and rewrites the entry
//! class's `<clinit>` so each of them is eagerly resolved at load time.
//! A missing platform class then fails immediately at class load instead
//! of at some arbitrary later point of first use.
//!
//! ## Architecture
//!
//! - **classfile**: decoding and re-encoding of the class file
//!   structures the tool touches
//! - **scan**: bytecode reference decoding plus the work-queue traversal
//!   that partitions reachable classes into local and external
//! - **patch**: the idempotent `<clinit>` rewrite
//! - **store**: the class store trait and its directory implementation
//!
//! ```text
//! entry name → ClassScanner (refs + ClassStore) → external set
//!            → ClinitPatcher(external set) → rewritten entry bytes
//!            → ClassStore::write
//! ```

pub mod classfile;
pub mod common;
pub mod patch;
pub mod scan;
pub mod store;

use std::path::PathBuf;

use tracing::info;

pub use common::error::{Error, Result};
pub use patch::ClinitPatcher;
pub use scan::{ClassScanner, ScanReport};
pub use store::{ClassStore, DirClassStore};

/// One patch run: where the compiled classes live and which class to
/// scan from and rewrite
#[derive(Debug, Clone)]
pub struct Options {
    pub class_root: PathBuf,
    pub entry: String,
}

/// Scan from the entry class and patch it in place under the class root
pub fn run(options: &Options) -> Result<ScanReport> {
    let store = DirClassStore::new(&options.class_root);
    run_with_store(&store, &options.entry)
}

/// Scan from `entry`, patch its `<clinit>`, and write the result back.
/// Accepts the dotted form of the entry name and normalizes it to the
/// internal form. The store is written exactly once, after all reads.
pub fn run_with_store<S: ClassStore>(store: &S, entry: &str) -> Result<ScanReport> {
    let entry = entry.replace('.', "/");
    let report = ClassScanner::new(store).run(&entry)?;
    for name in &report.external {
        info!("found reference: {name}");
    }
    info!("patching {entry}");
    let bytes = store.read(&entry)?;
    let patched = ClinitPatcher::new(&report.external).patch(&bytes)?;
    store.write(&entry, &patched)?;
    Ok(report)
}
