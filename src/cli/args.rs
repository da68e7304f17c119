use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cardsift",
    version,
    about = "attribute-driven CMS list filtering engine",
    long_about = "Cardsift filters, sorts and paginates attribute-annotated card lists the way the in-page widget does: it gathers every paginated source page up front, evaluates the filter controls found in the markup, and prints the resulting set.\n\nExamples:\n  cardsift -p ./saved-listing.html --filter color=Red\n  cardsift -u https://site.tld/listing?page=1 --range price=20:30 --sort price-asc\n  cardsift -p listing.html --search gamma --format json -o report.json\n\nTip: Use --config to persist settings and keep invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "FILE",
        help_heading = "Input",
        help = "Saved page to load the list from."
    )]
    pub page: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "URL to fetch the list page from."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.cardsift/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'f',
        long = "flt",
        visible_alias = "filter",
        value_name = "CATEGORY=VALUE",
        action = ArgAction::Append,
        help_heading = "Filtering",
        help = "Accept a discrete value for a category (repeatable)."
    )]
    pub filter: Vec<String>,

    #[arg(
        short = 'r',
        long = "rg",
        visible_alias = "range",
        value_name = "CATEGORY=FROM:TO",
        action = ArgAction::Append,
        help_heading = "Filtering",
        help = "Bound a numeric category; either side may be blank (repeatable)."
    )]
    pub range: Vec<String>,

    #[arg(
        short = 's',
        long = "se",
        visible_alias = "search",
        value_name = "TEXT",
        help_heading = "Filtering",
        help = "Global search across every field (the * category)."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'S',
        long = "srt",
        visible_alias = "sort",
        value_name = "KEY-DIRECTION",
        help_heading = "Filtering",
        help = "Sort order, e.g. price-asc or name-desc."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'n',
        long = "pn",
        visible_alias = "page-number",
        value_name = "N",
        help_heading = "Pagination",
        help = "Page to display when the list paginates."
    )]
    pub page_number: Option<usize>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout for source-page fetches."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the report to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        long = "fmt",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Report format: text or json (inferred from --out when omitted)."
    )]
    pub format: Option<String>,

    #[arg(
        long = "tags",
        help_heading = "Output",
        help = "Also print the active filter tag chips."
    )]
    pub tags: bool,

    #[arg(
        long = "filter-data",
        help_heading = "Output",
        help = "Also print the filter-data snapshot (counts, pages, available values)."
    )]
    pub filter_data: bool,
}
