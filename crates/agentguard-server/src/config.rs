use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_file: PathBuf,
    pub auto_seed: bool,
    pub skip_background_services: bool,
    pub port: u16,
    pub gemini_model: String,
    /// Program plus leading arguments; `--nl <text> --model <model>` is
    /// appended per invocation.
    pub generator_command: Vec<String>,
    pub generator_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from("agentguard.db"),
            auto_seed: true,
            skip_background_services: false,
            port: 5073,
            gemini_model: "models/gemini-2.5-pro".to_string(),
            generator_command: vec![
                "python3".to_string(),
                "scripts/generate_policy.py".to_string(),
            ],
            generator_timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("DATABASE_FILE") {
            if !v.is_empty() {
                cfg.database_file = PathBuf::from(v);
            }
        }
        if let Ok(v) = env::var("AUTO_SEED") {
            cfg.auto_seed = v.to_lowercase() == "true";
        }
        if let Ok(v) = env::var("SKIP_BACKGROUND_SERVICES") {
            cfg.skip_background_services = v.to_lowercase() == "true";
        }
        if let Ok(v) = env::var("AGENTGUARD_PORT").or_else(|_| env::var("PORT")) {
            if let Ok(n) = v.parse() {
                cfg.port = n;
            }
        }
        if let Ok(v) = env::var("GEMINI_MODEL") {
            cfg.gemini_model = v;
        }
        if let Ok(v) = env::var("AGENTGUARD_GENERATOR_CMD") {
            let parts: Vec<String> = v.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                cfg.generator_command = parts;
            }
        }
        if let Ok(v) = env::var("AGENTGUARD_GENERATOR_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                cfg.generator_timeout = Duration::from_secs(n);
            }
        }
        cfg
    }
}
