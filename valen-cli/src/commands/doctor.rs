use std::path::Path;

use valen_core::config::ValenConfig;
use valen_core::source::FileSource;
use valen_core::{Engine, LoadError, SnapshotFormat};

#[derive(Debug)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl Check {
    fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            hint: None,
        }
    }

    fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// One line per check, plus a hint line when the check carries one
    fn render(&self, color: bool) -> String {
        let icon = if self.passed { "✓" } else { "✗" };
        let icon = match (color, self.passed) {
            (false, _) => icon.to_string(),
            (true, true) => format!("\x1b[32m{}\x1b[0m", icon),
            (true, false) => format!("\x1b[31m{}\x1b[0m", icon),
        };

        let mut out = format!("  {} {}: {}\n", icon, self.name, self.message);
        if let Some(hint) = &self.hint {
            out.push_str(&format!("    └─ {}\n", hint));
        }
        out
    }
}

pub fn run_doctor(
    config: &ValenConfig,
    config_path: Option<&Path>,
    color: bool,
) -> Result<(), String> {
    println!("Valen Doctor\n");

    match config_path {
        Some(path) => println!("Configuration: {}", path.display()),
        None => println!("Configuration: defaults (no valen.yaml found)"),
    }
    println!();

    let checks = [check_report(config), check_notice(config)];
    for check in &checks {
        print!("{}", check.render(color));
    }
    println!();

    let failed = checks.iter().filter(|c| !c.passed).count();
    if failed == 0 {
        println!("All checks passed!");
        Ok(())
    } else {
        Err(format!("{} check(s) failed", failed))
    }
}

pub fn check_report(config: &ValenConfig) -> Check {
    let source = FileSource::new(&config.report_file);
    let mut engine = Engine::with_default_refresh_interval(config.refresh_interval);

    let result = match config.format {
        SnapshotFormat::Json => engine.try_load(&source),
        SnapshotFormat::Legacy => engine.try_load_legacy(&source),
    };

    match result {
        Ok(()) if engine.is_available() => Check::ok(
            "report",
            format!(
                "{} facilities, refresh every {}s",
                engine.report().len(),
                engine.refresh_interval()
            ),
        ),
        Ok(()) => Check::fail("report", "parsed, but has no timestamp")
            .with_hint("The front-end will show the report as unavailable"),
        Err(e @ LoadError::Unavailable { .. }) => Check::fail("report", e.to_string())
            .with_hint("Check that the monitor is running and report_file is correct"),
        Err(e) => Check::fail("report", e.to_string())
            .with_hint("The monitor may still be writing the file; try again shortly"),
    }
}

/// A missing or blank notice is normal and still passes
pub fn check_notice(config: &ValenConfig) -> Check {
    let mut engine = Engine::new();
    match engine.try_load_notice(&FileSource::new(&config.notice_file)) {
        Ok(()) => Check::ok("notice", "site notice present"),
        Err(LoadError::EmptyNotice) => Check::ok("notice", "empty, no notice shown"),
        Err(LoadError::Unavailable { .. }) => Check::ok("notice", "not present, no notice shown"),
        Err(e) => Check::fail("notice", e.to_string()),
    }
}
