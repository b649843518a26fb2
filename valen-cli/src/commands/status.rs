use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

use valen_core::config::ValenConfig;
use valen_core::display::{self, Light};
use valen_core::model::{Facility, Report};
use valen_core::Engine;

/// Exit code when no usable report could be loaded
pub const EXIT_UNAVAILABLE: i32 = 2;

const UNAVAILABLE_MESSAGE: &str =
    "The status report is currently unavailable. Please try again later.";

pub fn run_status(config: &ValenConfig, json: bool, all: bool, color: bool) -> i32 {
    let engine = Engine::cycle(config);
    let report = engine.report();
    let show_hidden = all || config.show_hidden;

    if json {
        println!("{}", render_json(report, show_hidden));
    } else if report.is_available() {
        print!("{}", render_text(report, show_hidden, unix_now(), color));
    } else {
        println!("{}", UNAVAILABLE_MESSAGE);
    }

    if report.is_available() { 0 } else { EXIT_UNAVAILABLE }
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn facilities(report: &Report, show_hidden: bool) -> Vec<&Facility> {
    if show_hidden {
        report.facilities.values().collect()
    } else {
        report.visible().collect()
    }
}

fn paint(text: &str, light: Light, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    let code = match light {
        Light::Green => "\x1b[32m",
        Light::Yellow => "\x1b[33m",
        Light::Red => "\x1b[31m",
    };
    format!("{}{}\x1b[0m", code, text)
}

pub fn render_text(report: &Report, show_hidden: bool, now: i64, color: bool) -> String {
    let mut out = String::new();

    let _ = write!(out, "Site Status");
    if let Some(ts) = report.timestamp {
        let _ = write!(out, " (updated {} ago)", display::format_age(now.saturating_sub(ts)));
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Refreshing every {}",
        display::format_age(report.refresh_interval as i64)
    );

    if let Some(notice) = &report.site_notice {
        let _ = writeln!(out, "\nNotice: {}", notice);
    }
    let _ = writeln!(out);

    for facility in facilities(report, show_hidden) {
        let status = facility.overall();
        let light = Light::facility(status);
        let label = format!("[{:<7}]", display::facility_label(status));

        let _ = write!(out, "{} {}", paint(&label, light, color), facility.name);
        if let Some(hostname) = &facility.hostname {
            if hostname != &facility.name {
                let _ = write!(out, " ({})", hostname);
            }
        }
        if facility.response_time.is_some() {
            let _ = write!(
                out,
                " - last response time: {}",
                display::format_response_time(facility.response_time)
            );
        }
        let _ = writeln!(out);

        if let Some(desc) = &facility.description {
            let _ = writeln!(out, "          {}", desc);
        }

        if !facility.links.is_empty() {
            let links: Vec<String> = facility
                .links
                .iter()
                .map(|l| format!("{} <{}>", l.title, l.url))
                .collect();
            let _ = writeln!(out, "          {}", links.join(" \u{2022} "));
        }

        let broken = facility.broken_dns_hostnames();
        if !broken.is_empty() {
            let _ = writeln!(
                out,
                "          {}",
                paint(
                    "The following domain names are unavailable, compromised, or incorrectly configured:",
                    Light::Red,
                    color
                )
            );
            for hostname in broken {
                let _ = writeln!(out, "            - {}", hostname);
            }
        }

        for instance in &facility.instances {
            let light = Light::instance(instance.status);
            let _ = writeln!(
                out,
                "          {} {} ({})",
                instance.id,
                paint(display::instance_label(instance.status), light, color),
                display::format_response_time(instance.response_time)
            );
        }
    }

    out
}

pub fn render_json(report: &Report, show_hidden: bool) -> Value {
    let facilities: Vec<Value> = facilities(report, show_hidden)
        .into_iter()
        .map(|facility| {
            let status = facility.overall();
            json!({
                "id": facility.id,
                "name": facility.name,
                "overall": status.code(),
                "label": display::facility_label(status),
                "light": Light::facility(status),
                "facility": facility,
            })
        })
        .collect();

    json!({
        "available": report.is_available(),
        "ts": report.timestamp,
        "refresh_interval": report.refresh_interval,
        "site_notice": report.site_notice,
        "facilities": facilities,
    })
}
