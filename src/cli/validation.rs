use crate::cli::args::CliArgs;
use crate::output::OutputFormat;
use crate::sort::SortOrder;
use crate::utils;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    for raw in &args.filter {
        utils::parse_key_value(raw).map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
    }
    for raw in &args.range {
        utils::parse_range_flag(raw).map_err(|e| format!("invalid --range '{raw}': {e}"))?;
    }
    if let Some(raw) = args.sort.as_deref() {
        if SortOrder::parse(raw).is_none() {
            return Err(format!(
                "invalid --sort '{raw}': expected KEY-DIRECTION, e.g. price-asc"
            ));
        }
    }
    if let Some(raw) = args.format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}': expected text or json"));
        }
    }
    if let Some(n) = args.page_number {
        if n == 0 {
            return Err("invalid --page-number, pages are 1-based".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected a positive number of seconds".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("cardsift").chain(argv.iter().copied()))
    }

    #[test]
    fn rejects_malformed_flags() {
        assert!(validate(&parse(&["--filter", "colorRed"])).is_err());
        assert!(validate(&parse(&["--range", "price=30:20"])).is_err());
        assert!(validate(&parse(&["--sort", "price"])).is_err());
        assert!(validate(&parse(&["--fmt", "yaml"])).is_err());
        assert!(validate(&parse(&["--page-number", "0"])).is_err());
    }

    #[test]
    fn accepts_well_formed_flags() {
        let args = parse(&[
            "--filter",
            "color=Red",
            "--range",
            "price=20:",
            "--sort",
            "price-asc",
            "--fmt",
            "json",
        ]);
        assert!(validate(&args).is_ok());
    }
}
