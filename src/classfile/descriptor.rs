//! Resolution of CONSTANT_Class operands to loadable class names

/// Resolve the class a CONSTANT_Class entry asks the loader for.
///
/// Plain internal names pass through unchanged. Array descriptors unwrap
/// to their base element regardless of dimensionality; arrays of
/// primitives name no loadable class at all.
pub fn referenced_class(name: &str) -> Option<&str> {
    let element = name.trim_start_matches('[');
    if element.len() == name.len() {
        Some(name)
    } else {
        element.strip_prefix('L')?.strip_suffix(';')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_passes_through() {
        assert_eq!(referenced_class("pkg/Outer$Inner"), Some("pkg/Outer$Inner"));
    }

    #[test]
    fn test_array_unwraps_to_base_element() {
        assert_eq!(referenced_class("[Ljava/lang/String;"), Some("java/lang/String"));
        assert_eq!(referenced_class("[[[Lpkg/Missing;"), Some("pkg/Missing"));
    }

    #[test]
    fn test_primitive_array_names_nothing() {
        assert_eq!(referenced_class("[I"), None);
        assert_eq!(referenced_class("[[J"), None);
    }
}
