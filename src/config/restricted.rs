use crate::config::default::DEFAULT_CONFIG;
use crate::sanitizer::SanitizerConfig;

lazy_static! {
    /// The default policy without images and with links limited to the web and in-page anchors.
    pub static ref RESTRICTED_CONFIG: SanitizerConfig = {
        let mut config = DEFAULT_CONFIG.clone();
        config.allowed_elements.remove(&local_name!("img"));
        config.allowed_empty_elements.remove(&local_name!("img"));
        config.allowed_schemes = vec!["https://", "http://", "#"];
        config
    };
}
