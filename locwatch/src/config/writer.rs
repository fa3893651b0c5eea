//! `ConfigFile` → commented INI text.

use super::settings::ConfigFile;

/// Render the configuration with explanatory comments.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[acquisition]
; Desired interval between location updates, in milliseconds
update_interval_ms = {}
; Fastest interval the consumer can handle (must not exceed update_interval_ms)
fastest_interval_ms = {}
; Accuracy/power trade-off: high_accuracy, balanced, low_power, no_power
priority = {}

[keep_alive]
; Restart the session periodically whenever it is not connected
enabled = {}
; Delay before the first check, in milliseconds
initial_delay_ms = {}
; Period between checks, in milliseconds
interval_ms = {}
; Abandon a connect that has not completed after this long, in milliseconds
connect_timeout_ms = {}

[connectivity]
; host:port opened to decide whether the network is reachable
probe_address = {}
; Connect timeout for the probe, in milliseconds
timeout_ms = {}

[flow]
; Where to resume after a permission grant:
;   from_permission - re-check only the permission
;   full_gate       - re-run every check
resume_policy = {}

[logging]
directory = {}
file = {}
"#,
        config.acquisition.update_interval_ms,
        config.acquisition.fastest_interval_ms,
        config.acquisition.priority,
        config.keep_alive.enabled,
        config.keep_alive.initial_delay_ms,
        config.keep_alive.interval_ms,
        config.keep_alive.connect_timeout_ms,
        config.connectivity.probe_address,
        config.connectivity.timeout_ms,
        config.flow.resume_policy,
        config.logging.directory.display(),
        config.logging.file,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_section() {
        let text = to_config_string(&ConfigFile::default());
        for section in ["[acquisition]", "[keep_alive]", "[connectivity]", "[flow]", "[logging]"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("priority = high_accuracy"));
        assert!(text.contains("resume_policy = from_permission"));
        assert!(text.contains("enabled = false"));
    }
}
