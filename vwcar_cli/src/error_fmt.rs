//! Human-readable error descriptions and structured JSON error formatting.

use vwcar_core::{BuildError, ReplayError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCarParams => {
                "What happened: No car params were provided to the session.\nLikely causes: The [car] table was not mapped into the builder.\nHow to fix: Ensure the session is built via Session::from_config or with_car_params(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A platform/transmission combination the car cannot have, or out-of-range [limits].\nHow to fix: Edit the config file, then rerun. See etc/vwcar.toml for a sample."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<ReplayError>() {
        return match re {
            ReplayError::MalformedRow { line, reason } => format!(
                "What happened: Frame log row {line} could not be read ({reason}).\nLikely causes: Missing column, non-numeric value, or an unknown control/plan field.\nHow to fix: Rows must be frame,source,message,signal,value with a numeric value."
            ),
            ReplayError::UnknownBus { line, bus } => format!(
                "What happened: Frame log row {line} names an unknown source {bus:?}.\nLikely causes: Bus numbering from a different harness.\nHow to fix: Use pt/0 or cam/2 for CAN rows, or control/plan/radar/param/valid."
            ),
            ReplayError::FrameOrder { line, frame, last } => format!(
                "What happened: Frame log row {line} goes back in time (frame {frame} after {last}).\nLikely causes: Concatenated or unsorted logs.\nHow to fix: Sort the log by frame before replaying."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nLikely causes: Typo in a key, wrong value type, or a missing [car] table.\nHow to fix: {}",
            te.message()
        );
    }

    // String-based heuristics for errors coming from config validation
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("car.")
        || lower.starts_with("limits.")
        || lower.starts_with("buttons.")
        || lower.starts_with("lead.")
        || lower.starts_with("logging.")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range value in the TOML.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("read config") || lower.contains("open frame log") {
        return format!(
            "What happened: A file could not be opened ({msg}).\nLikely causes: Wrong path or missing permissions.\nHow to fix: Check the --config / --input paths."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 config, 4 replay input, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<toml::de::Error>().is_some()
    {
        return 3;
    }
    if err.downcast_ref::<ReplayError>().is_some() {
        return 4;
    }
    let lower = err.to_string().to_ascii_lowercase();
    if ["car.", "limits.", "buttons.", "lead.", "logging."]
        .iter()
        .any(|p| lower.starts_with(p))
    {
        return 3;
    }
    1
}

pub fn error_kind_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCarParams => "MissingCarParams",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    if let Some(re) = err.downcast_ref::<ReplayError>() {
        return match re {
            ReplayError::MalformedRow { .. } => "MalformedRow",
            ReplayError::UnknownBus { .. } => "UnknownBus",
            ReplayError::FrameOrder { .. } => "FrameOrder",
        };
    }
    match exit_code_for_error(err) {
        3 => "InvalidConfig",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = error_kind_name(err);
    let message = humanize(err);
    if let Some(re) = err.downcast_ref::<ReplayError>() {
        let line = match re {
            ReplayError::MalformedRow { line, .. }
            | ReplayError::UnknownBus { line, .. }
            | ReplayError::FrameOrder { line, .. } => *line,
        };
        return json!({ "reason": reason, "details": { "line": line }, "message": message })
            .to_string();
    }
    json!({ "reason": reason, "message": message }).to_string()
}
