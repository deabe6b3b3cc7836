//! The translation engine boundary.
//!
//! The engine is a black box keyed by a language pair: the crate only resolves
//! languages, asks for a translator between two of them, and hands it text.
//! [`ArgosGateway`] drives the `argos-translate` command line over installed
//! packages; [`StaticGateway`] runs an in-process function, which is what tests
//! and dry runs use.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::config::{GatewayConfig, LanguagePair};
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Language {
    pub code: String,
}

pub trait Translator {
    fn translate(&self, text: &str) -> Result<String, Error>;
}

pub trait TranslationGateway: Send + Sync {
    fn resolve_language(&self, code: &str) -> Option<Language>;
    fn get_translation(&self, from: &Language, to: &Language) -> Option<Box<dyn Translator>>;
}

/// Resolves both languages and the translator between them.
pub fn translator_for(
    gateway: &dyn TranslationGateway,
    from_code: &str,
    to_code: &str,
) -> Result<Box<dyn Translator>, Error> {
    let (Some(from), Some(to)) = (gateway.resolve_language(from_code), gateway.resolve_language(to_code))
    else {
        return Err(Error::LanguagePackageMissing {
            from: from_code.to_string(),
            to: to_code.to_string(),
        });
    };
    gateway
        .get_translation(&from, &to)
        .ok_or_else(|| Error::TranslationUnavailable {
            from: from_code.to_string(),
            to: to_code.to_string(),
        })
}

/// Language pairs available locally.
#[derive(Clone, Debug, Default)]
pub struct InstalledPackages {
    pairs: Vec<LanguagePair>,
}

/// Reads the pair out of a package directory name such as `translate-en_de-1_0`
/// or plain `en_de`.
pub fn parse_package_dir_name(name: &str) -> Option<LanguagePair> {
    let name = name.strip_prefix("translate-").unwrap_or(name);
    let fragment = name.split('-').next()?;
    fragment.parse().ok()
}

impl InstalledPackages {
    pub fn from_pairs(pairs: impl IntoIterator<Item = LanguagePair>) -> Self {
        let mut installed = Self::default();
        for pair in pairs {
            if !installed.pairs.contains(&pair) {
                installed.pairs.push(pair);
            }
        }
        installed
    }

    /// Lists package directories under `dir`. A missing directory means nothing is installed.
    pub fn scan(dir: &Path) -> Result<Self, Error> {
        if !dir.is_dir() {
            log::warn!("packages directory {} does not exist", dir.display());
            return Ok(Self::default());
        }
        let mut pairs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match parse_package_dir_name(&name.to_string_lossy()) {
                Some(pair) => pairs.push(pair),
                None => log::debug!("ignoring {}", entry.path().display()),
            }
        }
        pairs.sort_by_key(|p| p.to_string());
        log::info!("found {} installed packages in {}", pairs.len(), dir.display());
        Ok(Self::from_pairs(pairs))
    }

    pub fn pairs(&self) -> &[LanguagePair] {
        &self.pairs
    }

    pub fn has_language(&self, code: &str) -> bool {
        self.pairs.iter().any(|p| p.from == code || p.to == code)
    }

    fn has_pair(&self, from: &str, to: &str) -> bool {
        self.pairs.iter().any(|p| p.from == from && p.to == to)
    }

    /// Packages needed to get from `from` to `to`: the direct pair, or two pairs
    /// through one pivot language.
    pub fn route(&self, from: &str, to: &str) -> Option<Vec<LanguagePair>> {
        if from == to {
            return None;
        }
        if self.has_pair(from, to) {
            return Some(vec![LanguagePair::new(from, to)]);
        }
        self.pairs
            .iter()
            .filter(|first| first.from == from && first.to != to)
            .find(|first| self.has_pair(&first.to, to))
            .map(|first| vec![first.clone(), LanguagePair::new(first.to.clone(), to)])
    }

    fn resolve(&self, code: &str) -> Option<Language> {
        self.has_language(code).then(|| Language { code: code.to_string() })
    }
}

pub struct ArgosGateway {
    config: GatewayConfig,
    packages: InstalledPackages,
}

impl ArgosGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, Error> {
        let packages = InstalledPackages::scan(&config.packages_dir)?;
        Ok(Self { config, packages })
    }

    pub fn packages(&self) -> &InstalledPackages {
        &self.packages
    }
}

impl TranslationGateway for ArgosGateway {
    fn resolve_language(&self, code: &str) -> Option<Language> {
        self.packages.resolve(code)
    }

    fn get_translation(&self, from: &Language, to: &Language) -> Option<Box<dyn Translator>> {
        let route = self.packages.route(&from.code, &to.code)?;
        log::debug!(
            "route {} -> {}: {}",
            from.code,
            to.code,
            route.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
        Some(Box::new(ArgosTranslator {
            config: self.config.clone(),
            pair: LanguagePair::new(from.code.clone(), to.code.clone()),
        }))
    }
}

/// One `argos-translate` invocation per call; the engine pivots on its own.
struct ArgosTranslator {
    config: GatewayConfig,
    pair: LanguagePair,
}

impl Translator for ArgosTranslator {
    fn translate(&self, text: &str) -> Result<String, Error> {
        let mut child = Command::new(&self.config.command)
            .args(["--from-lang", &self.pair.from, "--to-lang", &self.pair.to])
            .env("ARGOS_DEVICE_TYPE", self.config.device.as_str())
            .env("ARGOS_PACKAGES_DIR", &self.config.packages_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Engine(format!("cannot start {}: {e}", self.config.command.display())))?;

        let stdin = child.stdin.take();
        let input = text.to_string();
        let feeder = std::thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Ok(()),
        });

        let output = child.wait_with_output()?;
        if let Ok(Err(e)) = feeder.join() {
            log::warn!("writing to translation engine: {e}");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Engine(format!("{} ({})", stderr.trim(), output.status)));
        }

        let mut translated = String::from_utf8_lossy(&output.stdout).into_owned();
        if !text.ends_with('\n') && translated.ends_with('\n') {
            translated.pop();
            if translated.ends_with('\r') {
                translated.pop();
            }
        }
        Ok(translated)
    }
}

type TranslateFn = dyn Fn(&str, &LanguagePair) -> Result<String, Error> + Send + Sync;

/// In-process gateway over a fixed set of pairs.
pub struct StaticGateway {
    packages: InstalledPackages,
    translate: Arc<TranslateFn>,
}

impl StaticGateway {
    pub fn new<F>(pairs: impl IntoIterator<Item = LanguagePair>, translate: F) -> Self
    where
        F: Fn(&str, &LanguagePair) -> Result<String, Error> + Send + Sync + 'static,
    {
        Self {
            packages: InstalledPackages::from_pairs(pairs),
            translate: Arc::new(translate),
        }
    }

    /// Returns its input unchanged for every installed pair.
    pub fn echo(pairs: impl IntoIterator<Item = LanguagePair>) -> Self {
        Self::new(pairs, |text, _| Ok(text.to_string()))
    }
}

impl TranslationGateway for StaticGateway {
    fn resolve_language(&self, code: &str) -> Option<Language> {
        self.packages.resolve(code)
    }

    fn get_translation(&self, from: &Language, to: &Language) -> Option<Box<dyn Translator>> {
        self.packages.route(&from.code, &to.code)?;
        Some(Box::new(StaticTranslator {
            pair: LanguagePair::new(from.code.clone(), to.code.clone()),
            translate: Arc::clone(&self.translate),
        }))
    }
}

struct StaticTranslator {
    pair: LanguagePair,
    translate: Arc<TranslateFn>,
}

impl Translator for StaticTranslator {
    fn translate(&self, text: &str) -> Result<String, Error> {
        (self.translate)(text, &self.pair)
    }
}
