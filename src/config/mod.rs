use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisSettings;
use crate::classifier::{Signature, SignatureTable};
use crate::convert::{ConversionSettings, Converter};
use crate::error::{Result, ShiftError};
use crate::ir::Dialect;

/// Top-level configuration from `.ruleshift.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionSettings,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Extra classifier signatures appended to the built-in table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default)]
    pub extra_signatures: Vec<SignatureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub keyword: String,
    pub weight: u32,
    pub dialect: Dialect,
}

impl ClassifierSettings {
    /// Built-in table plus configured extras.
    pub fn signature_table(&self) -> SignatureTable {
        let mut table = SignatureTable::new();
        for entry in &self.extra_signatures {
            table.push(Signature::keyword(&entry.keyword, entry.weight, entry.dialect));
        }
        table
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.conversion.sid_offset == 0 {
            return Err(ShiftError::Config("conversion.sid_offset must be positive".into()));
        }
        if let Some(entry) = self
            .classifier
            .extra_signatures
            .iter()
            .find(|e| e.keyword.trim().is_empty() || e.weight == 0)
        {
            return Err(ShiftError::Config(format!(
                "classifier signature '{}' needs a keyword and a positive weight",
                entry.keyword
            )));
        }
        Ok(())
    }

    /// Converter wired with this configuration.
    pub fn converter(&self) -> Converter {
        Converter::new(self.conversion.clone()).with_signatures(self.classifier.signature_table())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# ruleshift configuration

[conversion]
# Offset between Snort and Suricata user SID ranges.
sid_offset = 1000000
renumber_sids = true

# Promote tcp/udp to http, tls or dns when keyword heuristics match.
promote_protocols = true

# Snort-bound: add a reference to malware rules that have none.
inject_reference = true
reference = "url,virustotal.com"

# Suricata-bound: metadata stamped on rules that have none.
metadata_marker = "converted_from snort"

[analysis]
# Recommend fast_pattern for Snort rules with contents longer than this.
fast_pattern_min_length = 50

# Extra dialect signatures for the classifier.
# [[classifier.extra_signatures]]
# keyword = "flowbits:"
# weight = 1
# dialect = "suricata"
"#
    }
}
