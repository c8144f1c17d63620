pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::adapters::gemini::{DEFAULT_FALLBACK_MODEL, DEFAULT_MODEL, GEMINI_API_BASE};
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use std::time::Duration;

    #[derive(Clone, Parser)]
    #[command(name = "roof-order-etl")]
    #[command(about = "Extract a roofing work-order PDF into schema-validated JSON with Gemini")]
    pub struct CliConfig {
        /// Work-order PDF to extract
        #[arg(short, long, default_value = "work_order.pdf")]
        pub input: String,

        #[arg(long, default_value = ".")]
        pub output_path: String,

        #[arg(long, default_value = "roof_order_output.json")]
        pub output_file: String,

        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        pub api_key: Option<String>,

        #[arg(long, default_value = GEMINI_API_BASE)]
        pub api_base: String,

        #[arg(long, default_value = DEFAULT_MODEL)]
        pub model: String,

        #[arg(long, default_value = DEFAULT_FALLBACK_MODEL)]
        pub fallback_model: String,

        /// Never retry with the fallback model
        #[arg(long)]
        pub no_fallback: bool,

        #[arg(long, default_value = "120")]
        pub timeout_seconds: u64,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log process CPU/memory per phase")]
        pub monitor: bool,

        #[arg(short, long, help = "Do not echo the extracted JSON to stdout")]
        pub quiet: bool,

        #[arg(long, help = "Print the prompt without calling the API")]
        pub dry_run: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    // 手動實作 Debug，避免 API key 出現在日誌中
    impl std::fmt::Debug for CliConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CliConfig")
                .field("input", &self.input)
                .field("output_path", &self.output_path)
                .field("output_file", &self.output_file)
                .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
                .field("api_base", &self.api_base)
                .field("model", &self.model)
                .field("fallback_model", &self.fallback_model)
                .field("no_fallback", &self.no_fallback)
                .field("timeout_seconds", &self.timeout_seconds)
                .field("dry_run", &self.dry_run)
                .finish()
        }
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_file(&self) -> &str {
            &self.output_file
        }

        fn api_base(&self) -> &str {
            &self.api_base
        }

        fn api_key(&self) -> Option<&str> {
            self.api_key.as_deref()
        }

        fn model(&self) -> &str {
            &self.model
        }

        fn fallback_model(&self) -> Option<&str> {
            if self.no_fallback {
                None
            } else {
                Some(&self.fallback_model)
            }
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(self.timeout_seconds)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("input", &self.input)?;
            validation::validate_file_extension("input", &self.input, &["pdf"])?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_non_empty_string("output_file", &self.output_file)?;
            validation::validate_url("api_base", &self.api_base)?;
            validation::validate_non_empty_string("model", &self.model)?;
            validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 600)?;

            // dry run 不會呼叫 API
            if !self.dry_run {
                let key = validation::validate_required_field("GOOGLE_API_KEY", &self.api_key)?;
                validation::validate_non_empty_string("GOOGLE_API_KEY", key)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::utils::error::EtlError;

        fn parse(args: &[&str]) -> CliConfig {
            let mut argv = vec!["roof-order-etl"];
            argv.extend_from_slice(args);
            CliConfig::try_parse_from(argv).unwrap()
        }

        #[test]
        fn test_defaults() {
            let config = parse(&["--api-key", "k"]);
            assert_eq!(config.input_path(), "work_order.pdf");
            assert_eq!(config.output_file(), "roof_order_output.json");
            assert_eq!(config.model(), "gemini-2.5-pro");
            assert_eq!(config.fallback_model(), Some("gemini-2.5-flash"));
            assert_eq!(config.request_timeout(), Duration::from_secs(120));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_no_fallback_flag() {
            let config = parse(&["--api-key", "k", "--no-fallback"]);
            assert_eq!(config.fallback_model(), None);
        }

        #[test]
        fn test_rejects_non_pdf_input() {
            let config = parse(&["--api-key", "k", "--input", "order.xlsx"]);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_missing_key_only_matters_outside_dry_run() {
            let mut config = parse(&["--api-key", "k"]);
            config.api_key = None;
            let err = config.validate().unwrap_err();
            assert!(matches!(err, EtlError::MissingConfigError { .. }));

            config.dry_run = true;
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_debug_redacts_api_key() {
            let config = parse(&["--api-key", "super-secret"]);
            let printed = format!("{:?}", config);
            assert!(!printed.contains("super-secret"));
            assert!(printed.contains("<redacted>"));
        }
    }
}
