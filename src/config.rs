use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Installed-package identifier, written `{from}_{to}` (e.g. `en_fr`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub from: String,
    pub to: String,
}

impl LanguagePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

fn is_language_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl FromStr for LanguagePair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| Error::InvalidLanguagePair(s.to_string()))?;
        if !is_language_code(from) || !is_language_code(to) || from == to {
            return Err(Error::InvalidLanguagePair(s.to_string()));
        }
        Ok(Self::new(from.to_ascii_lowercase(), to.to_ascii_lowercase()))
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

/// Parses a package setting where `None` (or an empty value) means nothing is selected.
pub fn parse_package(value: &str) -> Result<Option<LanguagePair>, Error> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value.parse().map(Some)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            other => Err(format!("invalid device: {other}")),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the Argos engine needs, handed to the gateway explicitly rather than
/// through the process environment.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub command: PathBuf,
    pub device: Device,
    pub packages_dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("argos-translate"),
            device: Device::Cpu,
            packages_dir: PathBuf::from("models/argostranslate/data/argos-translate/packages"),
        }
    }
}
