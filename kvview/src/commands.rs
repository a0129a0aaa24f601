//! CLI command implementations.

use std::io::{self, Write};

use kvrows::{
    parse_prefix, render, run_query, Config, Error, FilterSpec, OutputFormat, Store, StoreTarget,
};

/// Flags for a single view run.
#[derive(Debug, Default)]
pub struct ViewOptions<'a> {
    pub json: bool,
    pub url: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub exclude: Option<&'a str>,
    pub include: Option<&'a str>,
}

/// List the entries under the prefix and print them.
///
/// Flags are validated before the store is touched. Nothing is printed
/// unless every entry was read and transformed successfully.
pub fn view(opts: &ViewOptions) -> kvrows::Result<()> {
    let filter = FilterSpec::from_flags(opts.include, opts.exclude)?;
    let prefix = opts
        .prefix
        .map(parse_prefix)
        .ok_or(Error::MissingOption("prefix"))?;

    let config = Config::load()?;
    let target = StoreTarget::resolve(opts.url, &config)?;
    tracing::debug!(store = %target, %prefix, "viewing");

    let rows = {
        let store = Store::open(&target, &config)?;
        run_query(&store, &prefix, &filter)?
    };

    let format = if opts.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let mut out = io::stdout().lock();
    render(&rows, format, config.max_cell_width, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_filters_fail_before_io() {
        let opts = ViewOptions {
            url: Some("/nonexistent/kv.duckdb"),
            prefix: Some("logs"),
            include: Some("ts"),
            exclude: Some("url"),
            ..Default::default()
        };
        assert!(matches!(view(&opts), Err(Error::UsageConflict)));
    }

    #[test]
    fn test_missing_prefix_fails_before_io() {
        let opts = ViewOptions {
            url: Some("/nonexistent/kv.duckdb"),
            ..Default::default()
        };
        assert!(matches!(view(&opts), Err(Error::MissingOption("prefix"))));
    }
}
