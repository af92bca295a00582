use crate::stage::{
    StageKind, DEFAULT_COMPUTE_VERSION, DEFAULT_TESSELLATION_VERSION, DEFAULT_VERSION,
};
#[cfg(feature = "validate")]
use naga::valid::{Capabilities, ValidationFlags, Validator};
#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "config-file")]
use std::fs::File;
#[cfg(feature = "config-file")]
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
#[cfg(feature = "validate")]
use std::str::FromStr;

pub const CONFIG_FILE: &str = "glslgen.yml";

#[derive(Debug, Clone)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
pub struct Config {
    /// Directory generated `.glsl` files are written to.
    pub out: PathBuf,
    /// Rust module of `include_str!` statics for the written files.
    pub generated: PathBuf,

    pub version: String,
    pub tessellation_version: String,
    pub compute_version: String,

    #[cfg(feature = "validate")]
    pub validation_flags: ValidationFlags,
    #[cfg(feature = "validate")]
    pub capabilities: Capabilities,
}

macro_rules! path_field {
    ($field: ident, $source: ident, $env_var: literal, $root: ident, $default: literal) => {
        let $field = std::env::var($env_var)
            .ok()
            .map(|value| PathBuf::from(value))
            .or($source.as_ref().map(|c: &Config| c.$field.clone()))
            .unwrap_or($root.as_ref().join("src").join($default));
    };
}

macro_rules! version_field {
    ($field: ident, $source: ident, $env_var: literal, $default: expr) => {
        let $field = std::env::var($env_var)
            .ok()
            .or($source.as_ref().map(|c: &Config| c.$field.clone()))
            .unwrap_or_else(|| $default.to_string());
    };
}

impl Default for Config {
    fn default() -> Self {
        Config::init(".")
    }
}

impl Config {
    #[allow(clippy::let_and_return)]
    pub fn init(root: impl AsRef<Path>) -> Config {
        #[cfg(feature = "config-file")]
        let local: Option<Config> = Config::load_from_file(root.as_ref().join(CONFIG_FILE));
        #[cfg(not(feature = "config-file"))]
        let local: Option<Config> = None;

        path_field!(out, local, "GLSLGEN_OUT", root, "gen");
        path_field!(generated, local, "GLSLGEN_GEN", root, "shaders.rs");

        version_field!(version, local, "GLSLGEN_VERSION", DEFAULT_VERSION);
        version_field!(
            tessellation_version,
            local,
            "GLSLGEN_TESS_VERSION",
            DEFAULT_TESSELLATION_VERSION
        );
        version_field!(
            compute_version,
            local,
            "GLSLGEN_COMPUTE_VERSION",
            DEFAULT_COMPUTE_VERSION
        );

        #[cfg(feature = "validate")]
        let validation_flags = std::env::var("GLSLGEN_VALIDATION")
            .ok()
            .and_then(|env| u8::from_str(&env).ok().and_then(ValidationFlags::from_bits))
            .or_else(|| local.as_ref().map(|l| l.validation_flags))
            .unwrap_or_else(ValidationFlags::all);

        #[cfg(feature = "validate")]
        let capabilities = std::env::var("GLSLGEN_CAPABILITIES")
            .ok()
            .and_then(|env| u8::from_str(&env).ok().and_then(Capabilities::from_bits))
            .or_else(|| local.as_ref().map(|l| l.capabilities))
            .unwrap_or_else(Capabilities::all);

        let result = Config {
            out,
            generated,
            version,
            tessellation_version,
            compute_version,
            #[cfg(feature = "validate")]
            validation_flags,
            #[cfg(feature = "validate")]
            capabilities,
        };

        #[cfg(feature = "config-file")]
        {
            if local.is_none() {
                if let Err(err) = result.write_to_file(root.as_ref().join(CONFIG_FILE)) {
                    log::warn!("unable to write {}: {}", CONFIG_FILE, err);
                }
            }
        }

        result
    }

    #[cfg(feature = "config-file")]
    pub fn load_from_file(path: impl AsRef<Path>) -> Option<Config> {
        let path = path.as_ref();

        if !path.exists() || !path.is_file() {
            return None;
        }

        let file = File::open(path).ok()?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).ok()
    }

    #[cfg(feature = "config-file")]
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();

        if path.exists() {
            std::fs::remove_file(path)?;
        } else if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?
            }
        }

        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        serde_yaml::to_writer(writer, self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    /// GLSL version used for stages that do not set one explicitly.
    pub fn version_for(&self, kind: StageKind) -> &str {
        match kind {
            StageKind::TessControl | StageKind::TessEval => &self.tessellation_version,
            StageKind::Compute => &self.compute_version,
            _ => &self.version,
        }
    }

    #[cfg(feature = "validate")]
    pub fn validator(&self) -> Validator {
        Validator::new(self.validation_flags, self.capabilities)
    }

    /// Output directory relative to the generated module, which is how
    /// `include_str!` resolves paths.
    pub fn out_relative(&self) -> &Path {
        self.generated
            .parent()
            .and_then(|parent| self.out.strip_prefix(parent).ok())
            .unwrap_or(&self.out)
    }
}
