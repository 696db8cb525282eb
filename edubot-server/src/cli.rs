use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "edubot-server",
    about = "EduBot Server - Empathetic tutoring chat API",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    #[arg(short, long, env = "EDUBOT_PORT", default_value = "8000")]
    pub port: u16,

    #[arg(long, env = "EDUBOT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Comma-separated CORS origins. Empty allows any origin.
    #[arg(long, env = "EDUBOT_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["edubot-server"]);
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.host, "127.0.0.1");
        assert!(cli.allowed_origins.is_empty());
    }

    #[test]
    fn test_origin_list() {
        let cli = Cli::parse_from([
            "edubot-server",
            "--allowed-origins",
            "https://edubot.example,https://app.example",
            "-p",
            "9000",
        ]);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.allowed_origins, vec!["https://edubot.example", "https://app.example"]);
    }
}
