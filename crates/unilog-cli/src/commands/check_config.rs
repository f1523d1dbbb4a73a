//! Check-config command
//!
//! Usage: unilog check-config [--open-sinks]

use clap::Args;
use std::time::Duration;
use unilog_logging::{Format, LoggingConfig};

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// Also open every sink (creates the log file and its directory)
    #[arg(long)]
    pub open_sinks: bool,
}

/// Execute check-config command
pub fn execute(args: CheckConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = LoggingConfig::from_env()?;
    print!("{}", describe(&config));

    if args.open_sinks {
        let logger = config.build()?;
        logger.shutdown(Duration::from_secs(2));
        println!("sinks: ok");
    }
    Ok(())
}

/// Human-readable summary of a resolved configuration
pub fn describe(config: &LoggingConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("level: {}\n", config.level));
    out.push_str(&format!(
        "environment: {} (production: {})\n",
        config.environment,
        config.is_production()
    ));
    out.push_str(&format!("source: {}\n", config.source));
    out.push_str(&format!("noisy modules: {}\n", config.noisy_modules.join(",")));
    for sink in config.sink_configs() {
        let format = match sink.format {
            Format::Json => "json",
            Format::Console { .. } => "console",
        };
        out.push_str(&format!(
            "sink {}: {:?} format={} min_level={}\n",
            sink.name, sink.destination, format, sink.min_level
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use unilog_logging::Level;

    #[test]
    fn test_describe_default() {
        let text = describe(&LoggingConfig::default());
        assert!(text.contains("level: INFO\n"));
        assert!(text.contains("environment: development (production: false)\n"));
        assert!(text.contains("sink console: Stdout format=console min_level=INFO\n"));
        assert!(!text.contains("sink file"));
    }

    #[test]
    fn test_describe_file_sink() {
        let config = LoggingConfig::default()
            .with_level(Level::Debug)
            .with_environment("prod")
            .with_file_logging("logs/app.log");
        let text = describe(&config);
        assert!(text.contains("(production: true)"));
        assert!(text.contains("sink file: File"));
        assert!(text.contains("format=json min_level=DEBUG"));
    }
}
