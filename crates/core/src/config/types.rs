use serde::{Deserialize, Serialize};

use crate::resolver::ResolverConfig;

/// Root configuration.
///
/// Every section is optional in the file; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
}
