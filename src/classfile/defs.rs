//! Generic classfile-specific definitions

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Name of the one-time static initializer
pub const CLINIT_NAME: &str = "<clinit>";

/// Descriptor of the one-time static initializer
pub const CLINIT_DESCRIPTOR: &str = "()V";

/// Class-level marker attribute recording that a class was already patched.
/// Unknown attributes are ignored by the JVM, so the marker is inert at runtime.
pub const PATCHED_ATTRIBUTE: &str = "EagerlinkPatched";

/// Well-known attribute names the patcher has to open or shift
pub const CODE_ATTRIBUTE: &str = "Code";
pub const STACK_MAP_TABLE_ATTRIBUTE: &str = "StackMapTable";
pub const LINE_NUMBER_TABLE_ATTRIBUTE: &str = "LineNumberTable";
pub const LOCAL_VARIABLE_TABLE_ATTRIBUTE: &str = "LocalVariableTable";
pub const LOCAL_VARIABLE_TYPE_TABLE_ATTRIBUTE: &str = "LocalVariableTypeTable";

/// File extension of a compiled class in a class root
pub const CLASS_EXT: &str = ".class";

/// The JVM caps a method's bytecode array at u16 range
pub const MAX_CODE_LENGTH: usize = 65535;

/// JVM version constants
pub mod major_versions {
    pub const JAVA_6_0: u16 = 50;
    pub const JAVA_8: u16 = 52;
    pub const JAVA_11: u16 = 55;
    pub const JAVA_17: u16 = 61;
    pub const JAVA_21: u16 = 65;
}

/// Access flags for classes, fields, and methods
pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MODULE: u16 = 0x8000;
}
