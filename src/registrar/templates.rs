//! Embedded `tera` templates for systemd units and nginx vhosts.

use anyhow::{Context, Result};
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

const UNIT_TEMPLATE_NAME: &str = "unit.service";
const VHOST_TEMPLATE_NAME: &str = "vhost.conf";

const UNIT_TEMPLATE: &str = r"[Unit]
Description={{ app_name }}
After=network.target

[Service]
Type=simple
ExecStart={{ exec_start }}
WorkingDirectory={{ working_dir }}
{% for line in env -%}
Environment={{ line }}
{% endfor -%}
User={{ uid }}
Group={{ gid }}
Restart=always
RestartSec=5
StandardOutput=journal
StandardError=journal

[Install]
WantedBy=multi-user.target
";

const VHOST_TEMPLATE: &str = r#"server {
    listen 80;
    listen [::]:80;
    server_name {{ host }};

    return 301 https://$host$request_uri;
}

server {
    listen 443 ssl http2;
    listen [::]:443 ssl http2;
    server_name {{ host }};

    ssl_certificate {{ cert_dir }}/fullchain.pem;
    ssl_certificate_key {{ cert_dir }}/privkey.pem;

    access_log {{ log_dir }}/access.log;
    error_log {{ log_dir }}/error.log;

    location / {
        proxy_pass http://127.0.0.1:{{ port }};
        proxy_http_version 1.1;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection "upgrade";
    }
}
"#;

/// Data for one systemd unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSpec {
    /// Unit name, also used as the description
    pub app_name: String,
    /// Full command line after dependency substitution
    pub exec_start: String,
    /// `NAME=value` entries
    pub env: Vec<String>,
    /// Install directory
    pub working_dir: String,
    /// Service user id
    pub uid: u32,
    /// Service group id
    pub gid: u32,
}

/// Data for one reverse-proxy vhost.
#[derive(Debug, Clone, Serialize)]
pub struct VhostSpec {
    /// Public hostname
    pub host: String,
    /// Local port the service listens on
    pub port: u16,
    /// Directory for access and error logs
    pub log_dir: String,
    /// Directory expected to hold `fullchain.pem` and `privkey.pem`
    pub cert_dir: String,
}

/// Escape `%` so systemd does not treat it as a specifier.
fn escape_specifiers(value: &str) -> String {
    value.replace('%', "%%")
}

/// Quote an environment entry for an `Environment=` line.
fn quote_env(entry: &str) -> String {
    let escaped = escape_specifiers(entry).replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn engine() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(vec![
        (UNIT_TEMPLATE_NAME, UNIT_TEMPLATE),
        (VHOST_TEMPLATE_NAME, VHOST_TEMPLATE),
    ])
    .context("Failed to load built-in templates")?;
    Ok(tera)
}

/// Render a unit file.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn render_unit(spec: &UnitSpec) -> Result<String> {
    let prepared = UnitSpec {
        exec_start: escape_specifiers(&spec.exec_start),
        env: spec.env.iter().map(|entry| quote_env(entry)).collect(),
        ..spec.clone()
    };
    let context = TeraContext::from_serialize(&prepared).context("Invalid unit data")?;
    engine()?
        .render(UNIT_TEMPLATE_NAME, &context)
        .with_context(|| format!("Failed to render unit for {}", spec.app_name))
}

/// Render a vhost file.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub fn render_vhost(spec: &VhostSpec) -> Result<String> {
    let context = TeraContext::from_serialize(spec).context("Invalid vhost data")?;
    engine()?
        .render(VHOST_TEMPLATE_NAME, &context)
        .with_context(|| format!("Failed to render vhost for {}", spec.host))
}
