//! Static catalog of named page configurations

use once_cell::sync::Lazy;

use super::PageConfig;

/// Configuration used before any card has been probed
pub const DEFAULT_CONFIG_NAME: &str = "PAGE_4";

// The single page entries keep a 16 byte payload, so a full write runs
// past the named page into the three that follow it.
static REGISTRY: Lazy<Vec<PageConfig>> = Lazy::new(|| {
    vec![
        PageConfig::new("PAGE_4", 4, 16, "Page 4 (first user page)"),
        PageConfig::new("PAGE_5", 5, 16, "Page 5"),
        PageConfig::new("PAGE_6", 6, 16, "Page 6"),
        PageConfig::new("PAGE_7", 7, 16, "Page 7"),
        PageConfig::new("MULTI_PAGE", 4, 64, "Pages 4-7 block read"),
    ]
});

/// Find a named configuration
pub fn lookup(name: &str) -> Option<PageConfig> {
    REGISTRY.iter().find(|c| c.name() == name).cloned()
}

/// All registered names, in catalog order
pub fn names() -> Vec<String> {
    REGISTRY.iter().map(|c| c.name().to_string()).collect()
}

pub fn default_config() -> PageConfig {
    REGISTRY[0].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let config = lookup("PAGE_6").unwrap();
        assert_eq!(config.page_number(), 6);
        assert_eq!(config.byte_address(), 24);
        assert_eq!(config.max_data_size(), 16);
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("PAGE_9").is_none());
        assert!(lookup("page_4").is_none());
    }

    #[test]
    fn test_multi_page_block() {
        let config = lookup("MULTI_PAGE").unwrap();
        assert_eq!(config.byte_address(), 16);
        assert_eq!(config.max_data_size(), 64);
    }

    #[test]
    fn test_default_is_page_4() {
        assert_eq!(default_config().name(), DEFAULT_CONFIG_NAME);
        assert_eq!(names(), vec!["PAGE_4", "PAGE_5", "PAGE_6", "PAGE_7", "MULTI_PAGE"]);
    }
}
