use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PetRegistryError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "database.properties";
pub const DEFAULT_URL: &str = "sqlite://pet_registry.db";
pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_DRIVER: &str = "sqlite";

const KEY_URL: &str = "db.url";
const KEY_USERNAME: &str = "db.username";
const KEY_PASSWORD: &str = "db.password";
const KEY_DRIVER: &str = "db.driver";

/// Connection settings for the registry database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub driver: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            driver: DEFAULT_DRIVER.to_string(),
        }
    }
}

impl DbConfig {
    /// Read settings from a properties file, failing if it cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::info!("Loaded database settings from {}", path.display());
        Ok(Self::from_properties(&text))
    }

    /// Load settings from a properties file.
    ///
    /// A missing or unreadable file is not an error: the defaults are kept and a
    /// warning is logged. Keys absent from the file also keep their defaults.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) => config,
            Err(PetRegistryError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("{} not found, using default database settings", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!(
                    "Could not read {}: {}. Using default database settings",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Parse text in the Java properties format over the defaults.
    ///
    /// Keys end at the first unescaped `=`, `:` or whitespace. `#` and `!` start
    /// comment lines, a trailing odd run of `\` joins the next line, and `\:`,
    /// `\=`, `\ `, `\\`, `\t`, `\n`, `\r`, `\f` and `\uXXXX` are unescaped.
    /// Unknown keys are ignored with a warning.
    pub fn from_properties(text: &str) -> Self {
        let mut config = Self::default();

        for line in logical_lines(text) {
            let (key, value) = split_entry(&line);
            match key.as_str() {
                KEY_URL => config.url = value,
                KEY_USERNAME => config.username = value,
                KEY_PASSWORD => config.password = value,
                KEY_DRIVER => config.driver = value,
                _ => log::warn!("Ignoring unknown database setting: {}", key),
            }
        }

        config
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// An odd number of trailing backslashes escapes the line break.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Join continued lines and drop blanks and comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        let line = raw.trim_start_matches(is_blank);
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if continues(line) {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if continuing {
        lines.push(current);
    }

    lines
}

/// Split a logical line into its unescaped key and value.
fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(after) = rest.strip_prefix(['=', ':']) {
        rest = after.trim_start_matches(is_blank);
    }

    (unescape(&line[..key_end]), unescape(rest))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .filter(|_| hex.len() == 4);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        log::warn!("Malformed unicode escape in settings: \\u{}", hex);
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
