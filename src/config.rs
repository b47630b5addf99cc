//! Connection profile resolution.
//!
//! Values come from two layers: explicit command-line arguments and an
//! optional INI file with an `[AD]` section. For each field the argument wins,
//! then the file, then nothing. Empty strings count as absent in both layers.
//! The four connection fields (`server`, `user`, `password`, `base`) must all
//! be present before any network I/O happens.
use std::fmt;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

/// Filter used when none is given.
pub const DEFAULT_FILTER: &str = "(objectClass=user)";
/// Output file used when none is given.
pub const DEFAULT_OUTPUT: &str = "AD_Users.xlsx";
/// INI section holding the connection keys.
pub const CONFIG_SECTION: &str = "AD";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing connection parameters: {}", fields.join(", "))]
    MissingConfiguration { fields: Vec<&'static str> },
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] ini::ParseError),
}

/// Connection values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct ConnectionArgs {
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub base: Option<String>,
    pub starttls: bool,
}

impl ConnectionArgs {
    /// True when all four connection fields were given explicitly.
    pub fn is_complete(&self) -> bool {
        [&self.server, &self.user, &self.password, &self.base]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Connection values read from the `[AD]` section of a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSettings {
    pub server: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub base: Option<String>,
    pub starttls: Option<bool>,
}

impl FileSettings {
    /// Parse INI text. Values are taken literally: no escapes, quotes or
    /// interpolation. Keys match case-insensitively.
    pub fn from_ini_str(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str_opt(contents, parse_options())?;
        Ok(Self::from_ini(&ini))
    }

    /// Read and parse an INI file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let ini =
            Ini::load_from_file_opt(&path, parse_options()).map_err(|source| ConfigError::Read {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        Ok(Self::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Self {
        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Self::default();
        };
        let get = |key: &str| {
            section
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            server: get("server"),
            user: get("user"),
            password: get("password"),
            base: get("base"),
            starttls: get("starttls").and_then(|v| parse_bool(&v)),
        }
    }
}

fn parse_options() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Everything a pipeline run needs, fully resolved.
#[derive(Clone)]
pub struct ConnectionProfile {
    pub server: String,
    pub user: String,
    pub password: String,
    pub base: String,
    pub filter: String,
    pub output: PathBuf,
    pub starttls: bool,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("base", &self.base)
            .field("filter", &self.filter)
            .field("output", &self.output)
            .field("starttls", &self.starttls)
            .finish()
    }
}

fn pick(arg: &Option<String>, file: &Option<String>) -> Option<String> {
    arg.as_ref()
        .filter(|s| !s.is_empty())
        .or(file.as_ref().filter(|s| !s.is_empty()))
        .cloned()
}

/// Merge arguments over file settings and enforce the required fields.
pub fn resolve(
    args: &ConnectionArgs,
    file: &FileSettings,
    filter: &str,
    output: &Path,
) -> Result<ConnectionProfile, ConfigError> {
    let server = pick(&args.server, &file.server);
    let user = pick(&args.user, &file.user);
    let password = pick(&args.password, &file.password);
    let base = pick(&args.base, &file.base);

    let mut missing = Vec::new();
    for (name, value) in [
        ("server", &server),
        ("user", &user),
        ("password", &password),
        ("base", &base),
    ] {
        if value.is_none() {
            missing.push(name);
        }
    }
    let (Some(server), Some(user), Some(password), Some(base)) = (server, user, password, base)
    else {
        return Err(ConfigError::MissingConfiguration { fields: missing });
    };

    let filter = if filter.trim().is_empty() {
        DEFAULT_FILTER
    } else {
        filter
    };

    Ok(ConnectionProfile {
        server,
        user,
        password,
        base,
        filter: filter.to_string(),
        output: output.to_path_buf(),
        starttls: args.starttls || file.starttls.unwrap_or(false),
    })
}

/// Usage help is shown instead of running when there is neither a config file
/// nor a complete set of explicit connection arguments.
pub fn should_show_help(config: Option<&Path>, args: &ConnectionArgs) -> bool {
    config.is_none() && !args.is_complete()
}
