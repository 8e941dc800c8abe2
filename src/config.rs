use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Well-known identities and object IDs for one deployment. Everything an
/// operation needs besides its own flags lives here, so a command line can
/// stay as short as the original one-shot scripts.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpsConfig {
    /// Fullnode JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Admin mnemonic; `KIOSK_OPS_MNEMONIC` overrides it.
    #[serde(default)]
    pub admin_mnemonic: String,

    /// Optional second identity for buyer-side runs.
    #[serde(default)]
    pub buyer_mnemonic: Option<String>,

    /// The published asset-tokenization package.
    #[serde(default)]
    pub asset_tokenization_package: String,

    /// The personal-kiosk extension package on this network.
    #[serde(default)]
    pub personal_kiosk_package: String,

    /// The kiosk transfer-policy rules package on this network.
    #[serde(default)]
    pub rules_package: String,

    /// AssetCap object guarding mint/supply for the published asset.
    #[serde(default)]
    pub asset_cap: String,

    /// Fully qualified tokenized-asset type, e.g.
    /// `0xP::tokenized_asset::TokenizedAsset<0xQ::template::TEMPLATE>`.
    #[serde(default)]
    pub tokenized_asset_type: String,

    /// Default item operated on when a command takes no `--item`.
    #[serde(default)]
    pub tokenized_asset_id: Option<String>,

    /// Kiosk targeted by place/lock/list/delist when no `--kiosk` is given.
    #[serde(default)]
    pub target_kiosk: Option<String>,

    /// Shared TransferPolicy object for the tokenized-asset type.
    #[serde(default)]
    pub transfer_policy: Option<String>,

    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,
}

fn default_rpc_url() -> String {
    "https://fullnode.testnet.sui.io:443".to_string()
}

fn default_gas_budget() -> u64 {
    100_000_000
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            admin_mnemonic: String::new(),
            buyer_mnemonic: None,
            asset_tokenization_package: String::new(),
            personal_kiosk_package: String::new(),
            rules_package: String::new(),
            asset_cap: String::new(),
            tokenized_asset_type: String::new(),
            tokenized_asset_id: None,
            target_kiosk: None,
            transfer_policy: None,
            gas_budget: default_gas_budget(),
        }
    }
}

impl OpsConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .context(format!("Failed to read config file: {}", config_path.display()))?;
            let mut config: Self = toml::from_str(&contents)
                .context(format!("Failed to parse config file: {}", config_path.display()))?;
            config.apply_env();
            Ok(config)
        } else {
            // Create default config so the operator has something to edit;
            // the env mnemonic applies after the save so it never hits disk
            let mut config = Self::default();
            config.save_to(&config_path)?;
            config.apply_env();
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .context(format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(mnemonic) = std::env::var("KIOSK_OPS_MNEMONIC") {
            if !mnemonic.trim().is_empty() {
                self.admin_mnemonic = mnemonic;
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".kiosk-ops").join("config.toml"))
    }

    pub fn target_kiosk(&self) -> Result<&str> {
        self.target_kiosk
            .as_deref()
            .context("No target kiosk configured; set `target_kiosk` or pass --kiosk")
    }

    pub fn tokenized_asset_id(&self) -> Result<&str> {
        self.tokenized_asset_id
            .as_deref()
            .context("No tokenized asset configured; set `tokenized_asset_id` or pass --item")
    }

    pub fn transfer_policy(&self) -> Result<&str> {
        self.transfer_policy
            .as_deref()
            .context("No transfer policy configured; set `transfer_policy` or pass --policy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_created_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = OpsConfig::load_from(path.clone()).unwrap();
        assert_eq!(config.gas_budget, 100_000_000);
        assert!(path.exists());

        // Second load reads the file that was just written
        let reloaded = OpsConfig::load_from(path).unwrap();
        assert_eq!(reloaded.rpc_url, config.rpc_url);
    }

    #[test]
    fn test_env_mnemonic_applies_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::env::set_var("KIOSK_OPS_MNEMONIC", "word word word");
        let config = OpsConfig::load_from(path.clone()).unwrap();
        std::env::remove_var("KIOSK_OPS_MNEMONIC");

        assert_eq!(config.admin_mnemonic, "word word word");
        // The mnemonic stays out of the file that was just created
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("word word word"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
rpc_url = "http://localhost:9000"
target_kiosk = "0xabc"
"#,
        )
        .unwrap();

        let config = OpsConfig::load_from(path).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:9000");
        assert_eq!(config.target_kiosk.as_deref(), Some("0xabc"));
        assert_eq!(config.gas_budget, 100_000_000);
    }

    #[test]
    fn test_missing_optionals_report_hint() {
        let config = OpsConfig::default();
        let err = config.target_kiosk().unwrap_err();
        assert!(err.to_string().contains("--kiosk"));
    }
}
