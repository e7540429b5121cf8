//! Parsing of `stackql --version` output

use stackql_core::{Error, Result};

/// Version of an installed StackQL binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Release version, e.g. `v1.2.3`
    pub version: String,
    /// Short commit hash of the build
    pub sha: String,
}

/// Parse the first line of `stackql --version` output.
///
/// The second whitespace token is the version. The short sha is the fourth
/// token when there is one, otherwise the third, with any surrounding
/// parentheses trimmed.
pub fn parse_version_line(output: &str) -> Result<VersionInfo> {
    let line = output.lines().next().unwrap_or("");
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let version = tokens
        .get(1)
        .ok_or_else(|| Error::VersionParse(format!("no version token in '{}'", line)))?;

    let sha = tokens
        .get(3)
        .or_else(|| tokens.get(2))
        .map(|token| token.trim_matches(|c| c == '(' || c == ')'))
        .filter(|sha| !sha.is_empty())
        .ok_or_else(|| Error::VersionParse(format!("no commit hash in '{}'", line)))?;

    Ok(VersionInfo {
        version: version.to_string(),
        sha: sha.to_string(),
    })
}
