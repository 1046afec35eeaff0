pub fn run() -> anyhow::Result<()> {
    println!("compactor {}", env!("CARGO_PKG_VERSION"));
    println!("Context compaction for long-running agent sessions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        let result = run();
        assert!(result.is_ok());
    }
}
