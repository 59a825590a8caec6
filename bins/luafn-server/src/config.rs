use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "luafn-server", about = "Lua-backed function provider")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the configured functions over HTTP
    Serve(ConfigArgs),
    /// Print every function signature as JSON
    Functions(ConfigArgs),
    /// Call a configured function with plain JSON arguments
    Call(CallArgs),
    /// Run a Lua file ending in `return <function>`
    Exec(ExecArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "luafn.toml", env = "LUAFN_CONFIG")]
    pub config: String,
}

#[derive(Args, Clone, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Function name
    pub name: String,
    /// Arguments, one JSON document each
    pub args: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct ExecArgs {
    /// Lua file to run
    pub file: PathBuf,
    /// Arguments, one JSON document each
    pub args: Vec<String>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Inline Lua source.
    #[serde(default)]
    pub lua: Option<String>,
    /// Lua source file, relative to the config file.
    #[serde(default)]
    pub lua_file: Option<PathBuf>,
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_api_port() -> u16 {
    9300
}
fn default_bind() -> String {
    "127.0.0.1".to_string()
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        let base_dir = Path::new(path).parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&content, base_dir)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    pub fn parse(content: &str, base_dir: PathBuf) -> Result<Self, toml::de::Error> {
        let mut config: ServerConfig = toml::from_str(content)?;
        config.base_dir = base_dir;
        Ok(config)
    }

    /// Lua source text, from exactly one of `lua` and `lua_file`.
    pub fn source(&self) -> Result<String, ServerError> {
        match (&self.lua, &self.lua_file) {
            (Some(inline), None) => Ok(inline.clone()),
            (None, Some(file)) => {
                let path = self.base_dir.join(file);
                std::fs::read_to_string(&path).map_err(|e| ServerError::Config {
                    context: "lua_file",
                    detail: format!("'{}': {e}", path.display()),
                })
            }
            (Some(_), Some(_)) => Err(ServerError::Config {
                context: "lua",
                detail: "set either `lua` or `lua_file`, not both".to_string(),
            }),
            (None, None) => Err(ServerError::Config {
                context: "lua",
                detail: "one of `lua` or `lua_file` is required".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::parse("lua = 'function f() return 1 end'", PathBuf::new()).unwrap();
        assert_eq!(config.api_port, 9300);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.source().unwrap(), "function f() return 1 end");
    }

    #[test]
    fn lua_file_is_relative_to_the_config() {
        let dir = std::env::temp_dir().join(format!("luafn-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("fns.lua"), "function g() return 2 end").unwrap();

        let config = ServerConfig::parse("api_port = 9400\nlua_file = 'fns.lua'", dir.clone()).unwrap();
        assert_eq!(config.api_port, 9400);
        assert_eq!(config.source().unwrap(), "function g() return 2 end");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn exactly_one_source_is_required() {
        let none = ServerConfig::parse("", PathBuf::new()).unwrap();
        assert!(matches!(none.source(), Err(ServerError::Config { context: "lua", .. })));

        let both = ServerConfig::parse("lua = 'x'\nlua_file = 'y.lua'", PathBuf::new()).unwrap();
        assert!(matches!(both.source(), Err(ServerError::Config { context: "lua", .. })));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ServerConfig::parse("luaa = 'typo'", PathBuf::new()).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ServerConfig::load("/nonexistent/luafn.toml").unwrap_err();
        assert!(matches!(err, ServerError::Config { context: "read", .. }));
    }
}
