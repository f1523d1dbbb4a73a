//! Redact command
//!
//! Usage: unilog redact [--json] [--input <FILE>]

use clap::Args;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use unilog_logging::SensitiveDataFilter;

#[derive(Debug, Args)]
pub struct RedactArgs {
    /// Treat each line as a JSON document and redact it structurally
    #[arg(long)]
    pub json: bool,

    /// Input file path (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Execute redact command
pub fn execute(args: RedactArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    redact_lines(reader, &mut out, args.json)?;
    out.flush()?;
    Ok(())
}

/// Redact every line of `reader` into `out`
///
/// In JSON mode, lines that do not parse fall back to text redaction.
pub fn redact_lines<R: BufRead, W: Write>(
    reader: R,
    out: &mut W,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = SensitiveDataFilter::default();
    for line in reader.lines() {
        let line = line?;
        let redacted = if json {
            match serde_json::from_str::<serde_json::Value>(&line) {
                Ok(value) => filter.filter_structured(&value).to_string(),
                Err(_) => filter.filter_message(&line),
            }
        } else {
            filter.filter_message(&line)
        };
        writeln!(out, "{}", redacted)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_text_lines() {
        let input = "password=SuperSecret123\nhello\ncard 4111 1111 1111 1111\n";
        let mut out = Vec::new();
        redact_lines(input.as_bytes(), &mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "password=REDACTED\nhello\ncard XXXX-XXXX-XXXX-XXXX\n"
        );
    }

    #[test]
    fn test_redact_json_lines() {
        let input = "{\"user\":{\"api_key\":\"sk-abc123\"},\"n\":5}\nnot json token=x\n";
        let mut out = Vec::new();
        redact_lines(input.as_bytes(), &mut out, true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"user\":{\"api_key\":\"REDACTED\"},\"n\":5}\nnot json token=REDACTED\n"
        );
    }
}
