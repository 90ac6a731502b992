// Reading the configuration file and merging it with the command line.

use log::warn;
use std::path::{Path, PathBuf};

use crate::kiosk::*;

pub const DEFAULT_STORE_PATH: &str = "votes.csv";

fn default_admin_code() -> Option<String> {
    Some(DEFAULT_ADMIN_CODE.to_string())
}

/// The content of the JSON configuration file.
///
/// A missing `adminCode` keeps the default code, an explicit `null` disables it.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KioskConfig {
    #[serde(rename = "storePath")]
    pub store_path: Option<String>,
    pub candidates: Option<Vec<String>>,
    #[serde(rename = "adminCode", default = "default_admin_code")]
    pub admin_code: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

/// The configuration file, with the directory it was read from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LoadedConfig {
    pub config: KioskConfig,
    pub root: PathBuf,
}

/// The final settings of a kiosk, after applying defaults and command line overrides.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KioskSettings {
    pub store_path: PathBuf,
    pub candidates: Vec<String>,
    pub admin_code: Option<String>,
    pub output_path: Option<String>,
}

pub fn read_config(path: &str) -> KioskResult<LoadedConfig> {
    let config_str = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: KioskConfig =
        serde_json::from_str(&config_str).context(ParsingConfigSnafu { path })?;
    debug!("read_config: {:?}", config);
    let root = Path::new(path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    Ok(LoadedConfig { config, root })
}

/// Merges the command line arguments with the configuration file.
///
/// Relative store paths in the configuration file are relative to the directory of this
/// file. Paths given on the command line are used as is.
pub fn resolve_settings(loaded: Option<LoadedConfig>, args: &Args) -> KioskResult<KioskSettings> {
    let (config, root) = match loaded {
        Some(l) => (Some(l.config), l.root),
        None => (None, PathBuf::new()),
    };

    let store_path: PathBuf = match (&args.store, config.as_ref().and_then(|c| c.store_path.clone())) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => root.join(p),
        (None, None) => PathBuf::from(DEFAULT_STORE_PATH),
    };
    if store_path.as_os_str().is_empty() {
        whatever!("The path of the vote file may not be empty");
    }

    let candidates: Vec<String> = args
        .candidates
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.candidates.clone()))
        .unwrap_or_else(|| DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect());

    let admin_code = match config.as_ref() {
        Some(c) => c.admin_code.clone(),
        None => default_admin_code(),
    };
    if let Some(code) = admin_code.as_deref() {
        if check_id_format(code).is_ok() {
            warn!(
                "The admin code {:?} is also a valid voter ID: this voter will not be able to vote",
                code
            );
        }
    }

    let output_path = args
        .out
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.output_path.clone()))
        .filter(|s| !s.is_empty());

    Ok(KioskSettings {
        store_path,
        candidates,
        admin_code,
        output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(l: &[&str]) -> Args {
        let mut all = vec!["votekiosk"];
        all.extend_from_slice(l);
        Args::parse_from(all)
    }

    fn write_config(dir: &tempfile::TempDir, content: &str) -> String {
        let p = dir.path().join("kiosk.json");
        fs::write(&p, content).unwrap();
        p.display().to_string()
    }

    #[test]
    fn defaults() {
        let s = resolve_settings(None, &args(&[])).unwrap();
        assert_eq!(s.store_path, PathBuf::from("votes.csv"));
        assert_eq!(s.candidates, vec!["John".to_string(), "Jane".to_string()]);
        assert_eq!(s.admin_code.as_deref(), Some("1234567891"));
        assert_eq!(s.output_path, None);
    }

    #[test]
    fn config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"storePath": "data/votes.csv", "candidates": ["Alice", "Bob", "Carol"], "adminCode": "99999999999"}"#,
        );
        let loaded = read_config(&path).unwrap();
        let s = resolve_settings(Some(loaded), &args(&[])).unwrap();
        assert_eq!(s.store_path, dir.path().join("data/votes.csv"));
        assert_eq!(s.candidates.len(), 3);
        assert_eq!(s.admin_code.as_deref(), Some("99999999999"));
    }

    #[test]
    fn null_admin_code_disables_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"adminCode": null}"#);
        let s = resolve_settings(Some(read_config(&path).unwrap()), &args(&[])).unwrap();
        assert_eq!(s.admin_code, None);

        let path = write_config(&dir, r#"{"candidates": ["A", "B"]}"#);
        let s = resolve_settings(Some(read_config(&path).unwrap()), &args(&[])).unwrap();
        assert_eq!(s.admin_code.as_deref(), Some(DEFAULT_ADMIN_CODE));
    }

    #[test]
    fn command_line_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{"storePath": "votes.csv", "candidates": ["Alice", "Bob"], "outputPath": "summary.json"}"#,
        );
        let loaded = read_config(&path).unwrap();
        let s = resolve_settings(
            Some(loaded),
            &args(&[
                "--store",
                "/tmp/other.csv",
                "--candidates",
                "John",
                "--candidates",
                "Jane",
                "--out",
                "stdout",
            ]),
        )
        .unwrap();
        assert_eq!(s.store_path, PathBuf::from("/tmp/other.csv"));
        assert_eq!(s.candidates, vec!["John".to_string(), "Jane".to_string()]);
        assert_eq!(s.output_path.as_deref(), Some("stdout"));
    }

    #[test]
    fn config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json").display().to_string();
        assert!(matches!(
            read_config(&missing),
            Err(KioskError::OpeningConfig { .. })
        ));
        let path = write_config(&dir, r#"{"storPath": "votes.csv"}"#);
        assert!(matches!(
            read_config(&path),
            Err(KioskError::ParsingConfig { .. })
        ));
        assert!(matches!(
            resolve_settings(None, &args(&["--store", ""])),
            Err(KioskError::Whatever { .. })
        ));
    }
}
