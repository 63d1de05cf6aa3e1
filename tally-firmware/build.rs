//! Build script for tally-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates scoreboard.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sections and keys the firmware parser understands
const SECTIONS: [(&str, &[&str]); 5] = [
    (
        "loop",
        &[
            "quantum_ms",
            "first_refresh_quanta",
            "refresh_quanta",
            "rescan_refreshes",
        ],
    ),
    ("serial", &["default_mode"]),
    ("clock", &["baseline_date", "baseline_time"]),
    ("bus", &["timeout_ms"]),
    ("indicator", &["blink_period_ms", "blink_count"]),
];

/// Output dialects accepted for `serial.default_mode`
const MODES: [&str; 3] = ["terminal", "pc_console", "scoreboard"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate scoreboard.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=scoreboard.toml");

    let config_path = Path::new("scoreboard.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: scoreboard.toml not found!                               ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a scoreboard.toml configuration file.       ║\n\
            ║  Please create one in the tally-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read scoreboard.toml                           ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in scoreboard.toml                   ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_sections(&config);
    validate_loop(&config);
    validate_serial(&config);
    validate_clock(&config);
    validate_bus_and_indicator(&config);

    println!("cargo:warning=scoreboard.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build with a boxed list of errors
fn fail(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Only known sections and keys, each section a table, no stray root keys
///
/// Key lists match the firmware's runtime parser in `config::toml`.
fn validate_sections(config: &toml::Value) {
    let mut errors = Vec::new();

    let root = match config.as_table() {
        Some(t) => t,
        None => return,
    };

    for (name, value) in root {
        let Some((_, keys)) = SECTIONS.iter().find(|(section, _)| *section == name.as_str()) else {
            errors.push(format!("unknown section or key '{}'", name));
            continue;
        };
        let Some(table) = value.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }

    fail("Unknown sections or keys in scoreboard.toml", &errors);
}

/// Check an optional integer key against an inclusive range
fn check_range(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match config.get(section).and_then(|s| s.get(key)) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

fn validate_loop(config: &toml::Value) {
    let mut errors = Vec::new();

    check_range(config, "loop", "quantum_ms", 1, 1000, &mut errors);
    check_range(config, "loop", "first_refresh_quanta", 1, 65535, &mut errors);
    check_range(config, "loop", "refresh_quanta", 1, 65535, &mut errors);
    check_range(config, "loop", "rescan_refreshes", 0, 65535, &mut errors);

    fail("Invalid [loop] configuration", &errors);
}

fn validate_serial(config: &toml::Value) {
    let mut errors = Vec::new();

    match config.get("serial").and_then(|s| s.get("default_mode")) {
        None => {}
        Some(toml::Value::String(mode)) if MODES.contains(&mode.as_str()) => {}
        Some(_) => errors.push(
            "[serial] default_mode must be 'terminal', 'pc_console' or 'scoreboard'".to_string(),
        ),
    }

    fail("Invalid [serial] configuration", &errors);
}

/// `YYYY-MM-DD` within 2000-2063
fn valid_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) = (
        parts[0].parse::<u32>(),
        parts[1].parse::<u32>(),
        parts[2].parse::<u32>(),
    ) else {
        return false;
    };
    let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (2000..=2063).contains(&year) && (1..=days).contains(&day)
}

/// `HH:MM:SS`
fn valid_time(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.len() != 2) {
        return false;
    }
    match (
        parts[0].parse::<u32>(),
        parts[1].parse::<u32>(),
        parts[2].parse::<u32>(),
    ) {
        (Ok(h), Ok(m), Ok(s)) => h < 24 && m < 60 && s < 60,
        _ => false,
    }
}

fn validate_clock(config: &toml::Value) {
    let mut errors = Vec::new();
    let clock = config.get("clock");

    match clock.and_then(|c| c.get("baseline_date")) {
        None => {}
        Some(toml::Value::String(d)) if valid_date(d) => {}
        Some(_) => errors.push("[clock] baseline_date must be YYYY-MM-DD in 2000-2063".to_string()),
    }

    match clock.and_then(|c| c.get("baseline_time")) {
        None => {}
        Some(toml::Value::String(t)) if valid_time(t) => {}
        Some(_) => errors.push("[clock] baseline_time must be HH:MM:SS".to_string()),
    }

    fail("Invalid [clock] configuration", &errors);
}

fn validate_bus_and_indicator(config: &toml::Value) {
    let mut errors = Vec::new();

    check_range(config, "bus", "timeout_ms", 1, 1000, &mut errors);
    check_range(config, "indicator", "blink_period_ms", 2, 65535, &mut errors);
    check_range(config, "indicator", "blink_count", 0, 255, &mut errors);

    fail("Invalid [bus] or [indicator] configuration", &errors);
}
