//! Built-in pattern template catalog.
//!
//! Read-only, constructed once, shared by concurrent readers for the
//! process lifetime. Tasks never mutate it.

use serde::Serialize;

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternTemplate {
    /// Stable identifier.
    pub id: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Pattern source.
    pub pattern: &'static str,
    /// Suggested flags.
    pub flags: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Sample text the pattern matches, when one is useful.
    pub sample: Option<&'static str>,
}

const TEMPLATES: &[PatternTemplate] = &[
    PatternTemplate {
        id: "email",
        label: "Email address",
        pattern: r"[\w.+-]+@[\w-]+\.[\w.-]+",
        flags: "g",
        description: "Email addresses in free-form text",
        sample: Some("contact us at support@example.com or sales@example.org"),
    },
    PatternTemplate {
        id: "url",
        label: "URL",
        pattern: r"https?://[^\s/$.?#][^\s]*",
        flags: "gi",
        description: "HTTP and HTTPS URLs",
        sample: Some("see https://example.com/docs for details"),
    },
    PatternTemplate {
        id: "ipv4",
        label: "IPv4 address",
        pattern: r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
        flags: "g",
        description: "Dotted-quad IPv4 addresses",
        sample: Some("gateway 192.168.0.1, dns 8.8.8.8"),
    },
    PatternTemplate {
        id: "iso-date",
        label: "ISO date",
        pattern: r"\d{4}-\d{2}-\d{2}",
        flags: "g",
        description: "Dates in YYYY-MM-DD form",
        sample: Some("released 2024-03-15, patched 2024-04-02"),
    },
    PatternTemplate {
        id: "hex-color",
        label: "Hex color",
        pattern: r"#(?:[0-9a-fA-F]{3}){1,2}\b",
        flags: "g",
        description: "CSS hex color codes, short or long form",
        sample: Some("background: #fff; color: #1a2b3c;"),
    },
    PatternTemplate {
        id: "number",
        label: "Number",
        pattern: r"-?\d+(?:\.\d+)?",
        flags: "g",
        description: "Integers and decimals with optional sign",
        sample: Some("temperature -3.5, humidity 82"),
    },
    PatternTemplate {
        id: "whitespace-runs",
        label: "Whitespace runs",
        pattern: r"\s{2,}",
        flags: "g",
        description: "Two or more consecutive whitespace characters",
        sample: Some("collapse   these    runs"),
    },
    PatternTemplate {
        id: "uuid",
        label: "UUID",
        pattern: r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        flags: "gi",
        description: "RFC 4122 UUIDs",
        sample: Some("request 550e8400-e29b-41d4-a716-446655440000 failed"),
    },
];

/// The built-in catalog.
pub fn builtin_patterns() -> &'static [PatternTemplate] {
    TEMPLATES
}
