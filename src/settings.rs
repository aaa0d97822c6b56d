use std::env;

use serde::Deserialize;
use tracing::info;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    /// "file" reads a .env file, anything else uses the server environment.
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub prefix: Option<String>,
    /// Name or path of the external PNG optimizer binary.
    #[serde(default = "default_optimizer_bin")]
    pub optimizer_bin: String,
    /// Upper bound on concurrent optimizer invocations.
    #[serde(default = "default_optimizer_slots")]
    pub optimizer_slots: usize,
}

fn default_env() -> String {
    "file".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_optimizer_bin() -> String {
    "pngquant".to_string()
}

fn default_optimizer_slots() -> usize {
    2
}

pub fn get_config() -> Config {
    let env_var = env::var("env").unwrap_or("file".to_string());
    if env_var == "file" {
        info!("using .env file as environtment variable");
        let _ = dotenvy::dotenv();
    } else {
        info!("using server environtment as environtment variable");
    }
    envy::from_env::<Config>().unwrap()
}
