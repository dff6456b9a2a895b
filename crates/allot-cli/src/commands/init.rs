use std::path::Path;

use anyhow::bail;
use tracing::info;

use allot_core::AllotConfig;

pub const CONFIG_FILE: &str = "allot.toml";

/// Write a scaffold `allot.toml` into `dir`. Refuses to overwrite.
pub fn init(dir: &Path) -> anyhow::Result<()> {
    let output = dir.join(CONFIG_FILE);
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    std::fs::create_dir_all(dir)?;
    std::fs::write(&output, AllotConfig::scaffold().to_toml_string()?)?;
    info!(path = %output.display(), "scaffold written");
    println!("✓ Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_loadable_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();

        let config = AllotConfig::from_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, AllotConfig::scaffold());
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "# mine\n").unwrap();

        let err = init(dir.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(),
            "# mine\n"
        );
    }
}
