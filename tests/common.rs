// Common test utilities

use std::fs;

use tempfile::TempDir;

use eagerlink::classfile::defs::{access_flags, major_versions, MAGIC};
use eagerlink::classfile::{
    AttributeInfo, ClassFile, ClassfileWritable, CodeAttribute, ConstantPool, MethodInfo,
};
use eagerlink::DirClassStore;

/// Builder for the small synthetic classes the integration suites use
pub struct TestClass {
    pub class: ClassFile,
}

impl TestClass {
    pub fn new(name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.add_class(name).unwrap();
        let super_class = pool.add_class("java/lang/Object").unwrap();
        Self {
            class: ClassFile {
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
            },
        }
    }

    pub fn pool(&mut self) -> &mut ConstantPool {
        &mut self.class.constant_pool
    }

    /// Add a method whose body is the given Code attribute
    pub fn add_method(&mut self, flags: u16, name: &str, descriptor: &str, code: CodeAttribute) {
        let name_index = self.class.constant_pool.add_utf8(name).unwrap();
        let descriptor_index = self.class.constant_pool.add_utf8(descriptor).unwrap();
        let code_name_index = self.class.constant_pool.add_utf8("Code").unwrap();
        let mut method = MethodInfo::new(flags, name_index, descriptor_index);
        method
            .attributes
            .push(AttributeInfo::new(code_name_index, code.to_bytes()));
        self.class.methods.push(method);
    }

    /// Add a method carrying no Code attribute at all
    pub fn add_bare_method(&mut self, flags: u16, name: &str, descriptor: &str) {
        let name_index = self.class.constant_pool.add_utf8(name).unwrap();
        let descriptor_index = self.class.constant_pool.add_utf8(descriptor).unwrap();
        self.class
            .methods
            .push(MethodInfo::new(flags, name_index, descriptor_index));
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.class.to_classfile_bytes()
    }
}

/// Temporary class root seeded with the given classes
pub fn class_root(classes: &[(&str, Vec<u8>)]) -> (TempDir, DirClassStore) {
    let dir = TempDir::new().unwrap();
    for (name, bytes) in classes {
        let path = dir.path().join(format!("{name}.class"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
    }
    let store = DirClassStore::new(dir.path());
    (dir, store)
}
