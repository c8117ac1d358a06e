//! Work-queue traversal classifying reachable classes as local or external

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::{debug, info};

use crate::classfile::ClassFile;
use crate::common::error::{Error, Result};
use crate::store::ClassStore;

use super::refs::class_references;

/// Everything a finished scan produced: the classes visited, in visit
/// order, and the external set in sorted order.
#[derive(Debug)]
pub struct ScanReport {
    pub scanned: Vec<String>,
    pub external: BTreeSet<String>,
}

/// Breadth-first scanner over the dependency graph rooted at one entry
/// class. State is per-run; construct a fresh scanner for every entry.
pub struct ClassScanner<'a, S: ClassStore> {
    store: &'a S,
    seen: HashSet<String>,
    queue: VecDeque<String>,
    external: BTreeSet<String>,
}

impl<'a, S: ClassStore> ClassScanner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            seen: HashSet::new(),
            queue: VecDeque::new(),
            external: BTreeSet::new(),
        }
    }

    /// Classify a discovered name. The first classification is permanent:
    /// a name once recorded as external stays external for the whole run,
    /// even if a class file of that name appears in the store later.
    pub fn enqueue(&mut self, name: &str) {
        if !self.seen.insert(name.to_string()) {
            return;
        }
        if self.store.exists(name) {
            self.queue.push_back(name.to_string());
        } else {
            debug!("external reference {name}");
            self.external.insert(name.to_string());
        }
    }

    /// External names recorded so far
    pub fn external(&self) -> &BTreeSet<String> {
        &self.external
    }

    /// Drain the graph reachable from `entry`. The entry must be present
    /// in the store: it is the patch target, and classifying it as
    /// external would mean patching a class that cannot be written back.
    pub fn run(mut self, entry: &str) -> Result<ScanReport> {
        if !self.store.exists(entry) {
            return Err(Error::not_found(entry));
        }
        self.enqueue(entry);

        let mut scanned = Vec::new();
        while let Some(name) = self.queue.pop_front() {
            info!("scanning {name}");
            let bytes = self.store.read(&name)?;
            let class = ClassFile::from_bytes(&bytes).map_err(|error| match error {
                Error::Format { message } => {
                    Error::format_error(format!("{name}: {message}"))
                }
                other => other,
            })?;
            for reference in class_references(&class)? {
                self.enqueue(&reference);
            }
            scanned.push(name);
        }

        Ok(ScanReport { scanned, external: self.external })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::classfile::defs::{access_flags, major_versions, MAGIC};
    use crate::classfile::{ClassfileWritable, ConstantPool};

    struct MapStore {
        classes: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MapStore {
        fn new() -> Self {
            Self { classes: RefCell::new(HashMap::new()) }
        }

        fn insert(&self, name: &str, bytes: Vec<u8>) {
            self.classes.borrow_mut().insert(name.to_string(), bytes);
        }
    }

    impl ClassStore for MapStore {
        fn exists(&self, name: &str) -> bool {
            self.classes.borrow().contains_key(name)
        }

        fn read(&self, name: &str) -> Result<Vec<u8>> {
            self.classes
                .borrow()
                .get(name)
                .cloned()
                .ok_or_else(|| Error::not_found(name))
        }

        fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
            self.insert(name, bytes.to_vec());
            Ok(())
        }
    }

    fn empty_class(name: &str) -> Vec<u8> {
        let mut pool = ConstantPool::new();
        let this_class = pool.add_class(name).unwrap();
        let super_class = pool.add_class("java/lang/Object").unwrap();
        ClassFile {
            magic: MAGIC,
            minor_version: 0,
            major_version: major_versions::JAVA_8,
            constant_pool: pool,
            access_flags: access_flags::ACC_PUBLIC | access_flags::ACC_SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
        .to_classfile_bytes()
    }

    #[test]
    fn test_missing_entry_fails_fast() {
        let store = MapStore::new();
        let result = ClassScanner::new(&store).run("pkg/Gone");
        assert!(matches!(result, Err(Error::NotFound { name }) if name == "pkg/Gone"));
    }

    #[test]
    fn test_entry_with_no_references() {
        let store = MapStore::new();
        store.insert("pkg/Main", empty_class("pkg/Main"));
        let report = ClassScanner::new(&store).run("pkg/Main").unwrap();
        assert_eq!(report.scanned, vec!["pkg/Main"]);
        assert!(report.external.is_empty());
    }

    #[test]
    fn test_first_classification_is_permanent() {
        let store = MapStore::new();
        let mut scanner = ClassScanner::new(&store);
        scanner.enqueue("pkg/Late");
        assert!(scanner.external().contains("pkg/Late"));

        // The class appearing mid-run does not reclassify the name.
        store.insert("pkg/Late", empty_class("pkg/Late"));
        scanner.enqueue("pkg/Late");
        assert!(scanner.external().contains("pkg/Late"));
        assert!(scanner.queue.is_empty());
    }

    #[test]
    fn test_malformed_local_class_is_fatal() {
        let store = MapStore::new();
        store.insert("pkg/Main", vec![0xde, 0xad, 0xbe, 0xef]);
        let result = ClassScanner::new(&store).run("pkg/Main");
        assert!(matches!(result, Err(Error::Format { .. })));
    }
}
