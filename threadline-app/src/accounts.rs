//! The account list: one identifier per line, blanks skipped.

use std::path::Path;

use anyhow::Context;

pub fn read_accounts(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("can't read accounts file: {}", path.display()))?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_blank_lines_and_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "alice\n\n  bob  \n\t\ncarol").unwrap();

        let accounts = read_accounts(file.path()).unwrap();
        assert_eq!(accounts, ["alice", "bob", "carol"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_accounts("does/not/exist.txt").unwrap_err();
        assert!(err.to_string().contains("accounts file"));
    }
}
