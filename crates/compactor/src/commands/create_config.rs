use anyhow::Context;
use std::path::Path;

pub fn run(output: &Path) -> anyhow::Result<()> {
    compactor_core::create_example_config(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Created {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compactor_core::{CompactConfig, ConfigLoader};

    #[test]
    fn test_create_config_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compact.json");
        run(&path).unwrap();

        let config = ConfigLoader::load(Some(&path), false).unwrap();
        assert_eq!(config, CompactConfig::default());
    }
}
