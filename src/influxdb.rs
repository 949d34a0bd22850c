//! InfluxDB v2 telemetry sink.
//!
//! Points are written one at a time in line protocol with second precision:
//!
//! ```text
//! measurement temperature=24.5,humidity=48,pressure=1009.5 1700000000
//! ```

use std::{fmt::Write as _, time::Duration};

use anyhow::{Context, anyhow, bail};
use chrono::Utc;
use ureq::Agent;

use crate::{capability::TelemetrySink, config::InfluxDbConfig, error::Fault};

pub struct InfluxWriter {
    agent: Agent,
    write_url: String,
    token: String,
    org: String,
    bucket: String,
}

impl InfluxWriter {
    pub fn new(config: &InfluxDbConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();

        Self {
            agent,
            write_url: format!("{}/api/v2/write", config.url.trim_end_matches('/')),
            token: config.token.clone(),
            org: config.org.clone(),
            bucket: config.bucket.clone(),
        }
    }

    pub fn write(&self, series: &str, fields: &[(&str, f64)]) -> Result<(), anyhow::Error> {
        let body = line_protocol(series, fields, Utc::now().timestamp())?;

        let response = self
            .agent
            .post(&self.write_url)
            .query("org", &self.org)
            .query("bucket", &self.bucket)
            .query("precision", "s")
            .set("Authorization", &format!("Token {}", self.token))
            .set("Content-Type", "text/plain; charset=utf-8")
            .send_string(&body);

        match response {
            Ok(response) if response.status() == 204 => Ok(()),
            Ok(response) => Err(anyhow!("Unexpected status {}", response.status())),
            Err(ureq::Error::Status(code, response)) => {
                let message = response.into_string().unwrap_or_default();
                Err(anyhow!("InfluxDB rejected write with status {code}: {message}"))
            }
            Err(e) => Err(e).context("Failed to reach InfluxDB"),
        }
    }
}

impl TelemetrySink for InfluxWriter {
    fn publish(&mut self, series: &str, fields: &[(&str, f64)]) -> Result<(), Fault> {
        self.write(series, fields).map_err(Fault::sink)
    }
}

/// Formats one point. Non-finite values are dropped; a point left without
/// fields is an error.
pub fn line_protocol(
    series: &str,
    fields: &[(&str, f64)],
    timestamp: i64,
) -> Result<String, anyhow::Error> {
    let mut line = escape(series, &[',', ' ']);
    let mut any_previous_fields = false;

    for (key, value) in fields.iter().filter(|(_, v)| v.is_finite()) {
        line.push(if any_previous_fields { ',' } else { ' ' });
        line.push_str(&escape(key, &[',', '=', ' ']));
        write!(line, "={value}")?;
        any_previous_fields = true;
    }

    if !any_previous_fields {
        bail!("No finite field values for {series}");
    }

    write!(line, " {timestamp}")?;
    Ok(line)
}

fn escape(s: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
