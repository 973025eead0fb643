//! Diff-style dump of raw vs. resolved property values

use crate::{PropertyResolver, PropertyValue, ResolveError, ACTIVATE_ON_PROFILE};
use std::fmt::Write;

const REPORT_START: &str = "*********** Environment Dump ************";
const REPORT_END: &str = "*********** End of Environment Dump ************";

/// Destination for the environment dump
pub trait ReportSink {
    /// Whether debug output would be recorded at all
    fn debug_enabled(&self) -> bool;

    fn debug(&self, report: &str);
}

/// Sink writing to `tracing` at debug level under `cloud_config_env::report`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn debug_enabled(&self) -> bool {
        tracing::enabled!(target: "cloud_config_env::report", tracing::Level::DEBUG)
    }

    fn debug(&self, report: &str) {
        tracing::debug!(target: "cloud_config_env::report", "\n{}", report);
    }
}

/// Write the environment dump to `sink`, building it only if the sink wants it
pub fn dump_env(resolver: &dyn PropertyResolver, sink: &dyn ReportSink) {
    if sink.debug_enabled() {
        sink.debug(&report(resolver));
    }
}

/// Render every visible property with its source, raw and resolved value
///
/// Sources gated on inactive profiles and sources that cannot list their
/// keys are skipped. A key's line carries a second value only when the
/// resolved value differs from the raw one; resolution failures are shown
/// inline as `Error(..)`.
pub fn report(resolver: &dyn PropertyResolver) -> String {
    let Some(env) = resolver.as_configurable() else {
        return format!("Environment is not configurable: {}\n", resolver.type_name());
    };

    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{REPORT_START}");
    let _ = writeln!(out, "* active profiles: [{}]", env.active_profiles().join(", "));

    for source in env.property_sources() {
        if !env.is_active(source) {
            continue;
        }
        let Some(keys) = source.property_names() else {
            continue;
        };
        let _ = writeln!(out, "* {} ({})", source.name(), source.kind());

        for key in keys.iter().filter(|k| k.as_str() != ACTIVATE_ON_PROFILE) {
            let raw = source.get(key).unwrap_or(PropertyValue::Null);
            let resolved = resolver.resolve(key);
            out.push_str(&render_line(key, &raw, &resolved));
            out.push('\n');
        }
    }

    let _ = writeln!(out, "{REPORT_END}");
    out
}

fn render_line(
    key: &str,
    raw: &PropertyValue,
    resolved: &Result<Option<PropertyValue>, ResolveError>,
) -> String {
    let mut line = match raw {
        PropertyValue::Null => format!(" - {key} = null"),
        PropertyValue::Text(s) => format!(" - {key} = \"{}\"", escape(s)),
        other => format!(" - {key} = {} ({})", other, other.type_name()),
    };

    match resolved {
        Ok(value) if same_value(raw, value.as_ref()) => {}
        Ok(Some(value)) => {
            let _ = write!(line, " = \"{}\"", escape(&value.to_string()));
        }
        Ok(None) => line.push_str(" = null"),
        Err(e) => {
            let _ = write!(line, " = Error({e})");
        }
    }

    line
}

/// Null raw values match an absent resolution
fn same_value(raw: &PropertyValue, resolved: Option<&PropertyValue>) -> bool {
    match (raw, resolved) {
        (PropertyValue::Null, None) => true,
        (PropertyValue::Null, Some(v)) => v.is_null(),
        (raw, Some(v)) => raw == v,
        (_, None) => false,
    }
}

/// Escape a value so it stays on one line inside double quotes
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Environment, MapPropertySource, PropertySnapshot, RandomValuePropertySource};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    fn source(name: &str, pairs: &[(&str, PropertyValue)]) -> MapPropertySource {
        pairs
            .iter()
            .fold(MapPropertySource::new(name, BTreeMap::new()), |s, (k, v)| {
                s.with_property(*k, v.clone())
            })
    }

    fn prod_env() -> Environment {
        Environment::new(Vec::new(), vec!["prod".to_string()])
    }

    #[test]
    fn test_empty_environment() {
        let env = Environment::default();
        assert_eq!(
            report(&env),
            "*********** Environment Dump ************\n\
             * active profiles: []\n\
             *********** End of Environment Dump ************\n"
        );
    }

    #[test]
    fn test_raw_and_resolved_values() {
        let mut env = prod_env();
        env.push_last(source("override", &[("suffix", "prod".into())]));
        env.push_last(source(
            "test",
            &[("app.name", "demo-${suffix}".into()), ("app.port", 8080.into())],
        ));

        let out = report(&env);
        assert!(out.contains("* active profiles: [prod]\n"));
        assert!(out.contains("* test (MapPropertySource)\n"));
        assert!(out.contains(" - app.name = \"demo-${suffix}\" = \"demo-prod\"\n"));
        assert!(out.contains(" - app.port = 8080 (Integer)\n"));
        assert!(out.contains(" - suffix = \"prod\"\n"));
    }

    #[test]
    fn test_overridden_value_shows_winner() {
        let mut env = Environment::default();
        env.push_last(source("cli", &[("server.port", "9090".into())]));
        env.push_last(source("file", &[("server.port", 8888.into())]));

        let out = report(&env);
        assert!(out.contains(" - server.port = \"9090\"\n"));
        assert!(out.contains(" - server.port = 8888 (Integer) = \"9090\"\n"));
    }

    #[test]
    fn test_inactive_profile_source_is_skipped() {
        let mut env = prod_env();
        env.push_last(source(
            "staging-only",
            &[(ACTIVATE_ON_PROFILE, "staging".into()), ("staging.key", "x".into())],
        ));

        let out = report(&env);
        assert!(!out.contains("staging-only"));
        assert!(!out.contains("staging.key"));
    }

    #[test]
    fn test_activation_key_is_not_reported() {
        let mut env = prod_env();
        env.push_last(source(
            "prod-only",
            &[(ACTIVATE_ON_PROFILE, "prod".into()), ("prod.key", "x".into())],
        ));

        let out = report(&env);
        assert!(out.contains("* prod-only (MapPropertySource)\n"));
        assert!(out.contains(" - prod.key = \"x\"\n"));
        assert!(!out.contains(ACTIVATE_ON_PROFILE));
    }

    #[test]
    fn test_non_enumerable_source_is_skipped() {
        let mut env = Environment::default();
        env.push_last(RandomValuePropertySource);
        let out = report(&env);
        assert!(!out.contains("random"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_resolution_error_is_inline() {
        let mut env = Environment::default();
        env.push_last(source(
            "file",
            &[("bad", "${missing}".into()), ("good", "ok".into())],
        ));

        let out = report(&env);
        assert!(out.contains(
            " - bad = \"${missing}\" = Error(Could not resolve placeholder 'missing' in value \"${missing}\")\n"
        ));
        assert!(out.contains(" - good = \"ok\"\n"));
        assert!(out.ends_with("*********** End of Environment Dump ************\n"));
    }

    #[test]
    fn test_null_raw_value() {
        let mut env = Environment::default();
        env.push_last(source("high", &[("a", PropertyValue::Null), ("b", PropertyValue::Null)]));
        env.push_last(source("low", &[("a", "fallback".into())]));

        let out = report(&env);
        assert!(out.contains(" - a = null = \"fallback\"\n"));
        assert!(out.contains(" - b = null\n"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut env = Environment::default();
        env.push_last(source("file", &[("msg", "say \"hi\"\nbye\t\\".into())]));

        let out = report(&env);
        assert!(out.contains(" - msg = \"say \\\"hi\\\"\\nbye\\t\\\\\"\n"));
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape("a\u{1}b"), "a\\u0001b");
        assert_eq!(escape("\u{8}\u{c}\r"), "\\b\\f\\r");
        assert_eq!(escape("한글"), "한글");
    }

    #[test]
    fn test_non_configurable_resolver() {
        let snapshot = PropertySnapshot::default();
        let out = report(&snapshot);
        assert!(out.starts_with("Environment is not configurable: "));
        assert!(out.contains("PropertySnapshot"));
        assert_eq!(out.lines().count(), 1);
    }

    struct RecordingSink {
        enabled: bool,
        reports: RefCell<Vec<String>>,
    }

    impl ReportSink for RecordingSink {
        fn debug_enabled(&self) -> bool {
            self.enabled
        }

        fn debug(&self, report: &str) {
            self.reports.borrow_mut().push(report.to_string());
        }
    }

    #[test]
    fn test_dump_env_respects_sink_level() {
        let env = Environment::default();

        let disabled = RecordingSink {
            enabled: false,
            reports: RefCell::new(Vec::new()),
        };
        dump_env(&env, &disabled);
        assert!(disabled.reports.borrow().is_empty());

        let enabled = RecordingSink {
            enabled: true,
            reports: RefCell::new(Vec::new()),
        };
        dump_env(&env, &enabled);
        assert_eq!(enabled.reports.borrow().len(), 1);
        assert!(enabled.reports.borrow()[0].starts_with(REPORT_START));
    }

    #[test]
    fn test_tracing_sink_without_subscriber_is_disabled() {
        assert!(!TracingSink.debug_enabled());
    }
}
