//! Reader for `evaluation.ini` style configuration files.

use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Section-aware INI reader.
///
/// Files look like:
/// ```ini
/// [evaluation]
/// maxmatchdistance = 30
/// miniousimilarity = 0.3
/// ignoredframesize = 0
///
/// [debug]
/// verbosity = 3
/// ```
///
/// Section and key names are case-insensitive. Lines starting with `;` or `#` are comments.
#[derive(Debug, Default)]
pub struct IniFile {
    path: String,
    values: HashMap<(String, String), String>,
}

impl IniFile {
    /// Read the INI file at the given path.
    pub fn new<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref().to_string_lossy().to_string();
        let file = File::open(&file_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open configuration file '{}': {}", path, e),
            ))
        })?;

        let reader = BufReader::new(file);
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        Ok(Self::from_lines(path, lines.iter().map(String::as_str)))
    }

    /// Parse INI content held in memory.
    pub fn parse(content: &str) -> Self {
        Self::from_lines("<memory>".to_string(), content.lines())
    }

    fn from_lines<'a>(path: String, lines: impl Iterator<Item = &'a str>) -> Self {
        let mut section = String::new();
        let mut values = HashMap::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_lowercase();
                continue;
            }
            if let Some(split) = line.find(['=', ':']) {
                let key = line[..split].trim().to_lowercase();
                let value = line[split + 1..].trim().to_string();
                values.insert((section.clone(), key), value);
            }
        }

        Self { path, values }
    }

    /// Raw value of `key` in `section`, if present and non-empty.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.values
            .get(&(section.to_lowercase(), key.to_lowercase()))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value parsed as a float.
    pub fn get_f64(&self, section: &str, key: &str) -> Result<Option<f64>> {
        self.get(section, key)
            .map(|value| {
                value.parse::<f64>().map_err(|e| {
                    Error::InvalidConfig(format!(
                        "value for '{}.{}' in {} is not a number: {}",
                        section, key, self.path, e
                    ))
                })
            })
            .transpose()
    }

    /// Value parsed as a flag; accepts `0`/`1` (or any number) and `true`/`false`.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        let Some(value) = self.get(section, key) else {
            return Ok(None);
        };
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(Some(true)),
            "false" | "no" | "off" => Ok(Some(false)),
            other => other.parse::<f64>().map(|v| Some(v != 0.0)).map_err(|_| {
                Error::InvalidConfig(format!(
                    "value for '{}.{}' in {} is not a flag: {}",
                    section, key, self.path, value
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_ini() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[evaluation]").unwrap();
        writeln!(file, "maxmatchdistance = 12.5").unwrap();
        writeln!(file, "alldataevaluated=1").unwrap();
        writeln!(file, "; a comment").unwrap();
        writeln!(file, "ignoredframesize =").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "[Debug]").unwrap();
        writeln!(file, "Verbosity: 4").unwrap();
        file
    }

    #[test]
    fn test_get_values() {
        let file = create_temp_ini();
        let ini = IniFile::new(file.path()).unwrap();

        assert_eq!(ini.get("evaluation", "maxmatchdistance"), Some("12.5"));
        assert_eq!(ini.get_f64("evaluation", "maxmatchdistance").unwrap(), Some(12.5));
        assert_eq!(ini.get_bool("evaluation", "alldataevaluated").unwrap(), Some(true));
        assert_eq!(ini.get_f64("debug", "verbosity").unwrap(), Some(4.0));
    }

    #[test]
    fn test_empty_and_missing_values() {
        let file = create_temp_ini();
        let ini = IniFile::new(file.path()).unwrap();

        assert_eq!(ini.get("evaluation", "ignoredframesize"), None);
        assert_eq!(ini.get("evaluation", "nonexistent"), None);
        assert_eq!(ini.get("plot", "maxmatchdistance"), None);
    }

    #[test]
    fn test_invalid_number() {
        let ini = IniFile::parse("[evaluation]\nminiousimilarity = high\n");
        assert!(matches!(
            ini.get_f64("evaluation", "miniousimilarity"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_value_names_source_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[evaluation]\nalldataevaluated = maybe").unwrap();
        let ini = IniFile::new(file.path()).unwrap();

        match ini.get_bool("evaluation", "alldataevaluated") {
            Err(Error::InvalidConfig(message)) => {
                assert!(message.contains(&*file.path().to_string_lossy()));
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(IniFile::new("/nonexistent/evaluation.ini").is_err());
    }
}
