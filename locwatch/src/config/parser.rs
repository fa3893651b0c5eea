//! INI → `ConfigFile` mapping.
//!
//! The single place where INI key names map to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` into a `ConfigFile`, overlaying values on the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("acquisition")) {
        if let Some(v) = get_u64(section, "acquisition", "update_interval_ms")? {
            if v == 0 {
                return Err(invalid("acquisition", "update_interval_ms", "0", "must be greater than zero"));
            }
            config.acquisition.update_interval_ms = v;
        }
        if let Some(v) = get_u64(section, "acquisition", "fastest_interval_ms")? {
            config.acquisition.fastest_interval_ms = v;
        }
        if let Some(v) = section.get("priority") {
            config.acquisition.priority = v.parse().map_err(|_| {
                invalid(
                    "acquisition",
                    "priority",
                    v,
                    "must be one of: high_accuracy, balanced, low_power, no_power",
                )
            })?;
        }
        if config.acquisition.fastest_interval_ms > config.acquisition.update_interval_ms {
            return Err(invalid(
                "acquisition",
                "fastest_interval_ms",
                &config.acquisition.fastest_interval_ms.to_string(),
                "must not exceed update_interval_ms",
            ));
        }
    }

    if let Some(section) = ini.section(Some("keep_alive")) {
        if let Some(v) = section.get("enabled") {
            config.keep_alive.enabled = parse_bool(v);
        }
        if let Some(v) = get_u64(section, "keep_alive", "initial_delay_ms")? {
            config.keep_alive.initial_delay_ms = v;
        }
        if let Some(v) = get_u64(section, "keep_alive", "interval_ms")? {
            if v == 0 {
                return Err(invalid("keep_alive", "interval_ms", "0", "must be greater than zero"));
            }
            config.keep_alive.interval_ms = v;
        }
        if let Some(v) = get_u64(section, "keep_alive", "connect_timeout_ms")? {
            if v == 0 {
                return Err(invalid(
                    "keep_alive",
                    "connect_timeout_ms",
                    "0",
                    "must be greater than zero",
                ));
            }
            config.keep_alive.connect_timeout_ms = v;
        }
    }

    if let Some(section) = ini.section(Some("connectivity")) {
        if let Some(v) = section.get("probe_address") {
            let v = v.trim();
            if !v.contains(':') {
                return Err(invalid("connectivity", "probe_address", v, "expected host:port"));
            }
            config.connectivity.probe_address = v.to_string();
        }
        if let Some(v) = get_u64(section, "connectivity", "timeout_ms")? {
            config.connectivity.timeout_ms = v;
        }
    }

    if let Some(section) = ini.section(Some("flow")) {
        if let Some(v) = section.get("resume_policy") {
            config.flow.resume_policy = v.parse().map_err(|_| {
                invalid("flow", "resume_policy", v, "must be one of: from_permission, full_gate")
            })?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn get_u64(section: &Properties, name: &str, key: &str) -> Result<Option<u64>, ConfigFileError> {
    section
        .get(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| invalid(name, key, v, "expected a whole number of milliseconds"))
        })
        .transpose()
}

/// Accepts true/false, yes/no, 1/0, on/off (case-insensitive).
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::ResumePolicy;
    use crate::session::Priority;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(content).unwrap())
    }

    #[test]
    fn test_parse_all_sections() {
        let config = parse(
            "[acquisition]\n\
             update_interval_ms = 3000\n\
             fastest_interval_ms = 1500\n\
             priority = balanced\n\
             [keep_alive]\n\
             enabled = on\n\
             initial_delay_ms = 500\n\
             interval_ms = 250\n\
             connect_timeout_ms = 4000\n\
             [connectivity]\n\
             probe_address = 8.8.8.8:53\n\
             timeout_ms = 900\n\
             [flow]\n\
             resume_policy = full_gate\n\
             [logging]\n\
             directory = /var/log/locwatch\n\
             file = run.log\n",
        )
        .unwrap();

        assert_eq!(config.acquisition.update_interval_ms, 3000);
        assert_eq!(config.acquisition.fastest_interval_ms, 1500);
        assert_eq!(config.acquisition.priority, Priority::BalancedPowerAccuracy);
        assert!(config.keep_alive.enabled);
        assert_eq!(config.keep_alive.initial_delay_ms, 500);
        assert_eq!(config.keep_alive.interval_ms, 250);
        assert_eq!(config.keep_alive.connect_timeout_ms, 4000);
        assert_eq!(config.connectivity.probe_address, "8.8.8.8:53");
        assert_eq!(config.connectivity.timeout_ms, 900);
        assert_eq!(config.flow.resume_policy, ResumePolicy::FullGate);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/locwatch"));
        assert_eq!(config.logging.file, "run.log");
    }

    #[test]
    fn test_fastest_above_update_rejected() {
        let err = parse("[acquisition]\nupdate_interval_ms = 1000\nfastest_interval_ms = 2000\n")
            .unwrap_err();
        assert!(err.to_string().contains("fastest_interval_ms"));
    }

    #[test]
    fn test_non_numeric_interval_rejected() {
        let err = parse("[keep_alive]\ninterval_ms = soon\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, ref value, .. } if key == "interval_ms" && value == "soon"
        ));
    }

    #[test]
    fn test_zero_update_interval_rejected() {
        assert!(parse("[acquisition]\nupdate_interval_ms = 0\nfastest_interval_ms = 0\n").is_err());
    }

    #[test]
    fn test_probe_address_needs_port() {
        assert!(parse("[connectivity]\nprobe_address = example.com\n").is_err());
    }

    #[test]
    fn test_parse_bool_values() {
        for v in ["true", "TRUE", "yes", "1", "on", " On "] {
            assert!(parse_bool(v), "{v}");
        }
        for v in ["false", "no", "0", "off", "maybe"] {
            assert!(!parse_bool(v), "{v}");
        }
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
    }
}
