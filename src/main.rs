use clap::{Parser, ValueEnum};
use env_logger::Builder;
use log::LevelFilter;
use log::{error, info, warn};

mod alias;
mod error;
mod output;
mod portfolio;
mod pricer;
mod quote;
mod referential;

use output::{ChartOutput, ConsoleOutput, CsvOutput, OdsOutput, Output};
use pricer::{PortfolioIndicators, tickers_to_price};
use quote::{FileRequester, NullRequester, QuoteProvider, Requester, YahooRequester};
use referential::Referential;

use error::Error;

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum SpotSource {
    Null,
    File,
    Yahoo,
}

impl std::fmt::Display for SpotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputType {
    Csv,
    Ods,
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

/// Performance report of a stock portfolio priced with live market data
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Portfolio file (columns Ticker, Quantity, PurchasePrice)
    #[clap(default_value = "portfolio.csv", short, long, value_parser)]
    portfolio: String,

    /// report file
    #[clap(default_value = "portfolio_performance_report.csv", short, long, value_parser)]
    report: String,

    /// report type
    #[clap(default_value_t = OutputType::Csv, short = 't', long, value_parser)]
    output_type: OutputType,

    /// chart file (png)
    #[clap(default_value = "portfolio_distribution.png", short, long, value_parser)]
    chart: String,

    /// one bar per ticker instead of one bar per holding
    #[clap(long)]
    group_chart: bool,

    /// spot source
    #[clap(default_value_t = SpotSource::Yahoo, short, long, value_parser)]
    spot_source: SpotSource,

    /// price file (columns Ticker, Price), used by the file spot source
    #[clap(long, value_parser, required_if_eq("spot_source", "file"))]
    prices: Option<String>,
}

fn make_requester(source: SpotSource, prices: Option<&str>) -> Result<Box<dyn Requester>, Error> {
    let value: Box<dyn Requester> = match source {
        SpotSource::Null => Box::new(NullRequester),
        SpotSource::File => {
            let filename = prices
                .ok_or_else(|| Error::new_marketdata("file spot source needs a price file"))?;
            Box::new(FileRequester::new(filename)?)
        }
        SpotSource::Yahoo => Box::new(YahooRequester::new()?),
    };
    Ok(value)
}

fn run(args: Args) -> Result<(), Error> {
    //
    // Load portfolio
    let portfolio = Referential::load_portfolio(&args.portfolio)?;
    info!(
        "loading portfolio {} done, {} holding(s)",
        portfolio.name,
        portfolio.records.len()
    );

    //
    // market data
    let requester = make_requester(args.spot_source, args.prices.as_deref())?;
    let mut provider = QuoteProvider::new(requester);
    info!("fetching live market data from {}", args.spot_source);
    provider.fetch_all(tickers_to_price(&portfolio));

    //
    // compute indicators
    let indicators = PortfolioIndicators::from_portfolio(&portfolio, &provider);
    for failure in indicators.failures.iter() {
        warn!("holding excluded {}", failure);
    }
    let unpriced = indicators
        .failures
        .iter()
        .filter(|failure| failure.is_price_unavailable())
        .count();
    info!(
        "compute portfolio done, priced:{} unpriced:{} invalid:{}",
        indicators.positions.len(),
        unpriced,
        indicators.failures.len() - unpriced
    );

    //
    // write outputs
    let mut report: Box<dyn Output + '_> = match args.output_type {
        OutputType::Csv => Box::new(CsvOutput::new(&args.report, &indicators)),
        OutputType::Ods => Box::new(OdsOutput::new(&args.report, &indicators)?),
    };
    report.write()?;
    info!("write report {} done", args.report);

    ConsoleOutput::new(std::io::stdout().lock(), &indicators).write()?;

    ChartOutput::new(&args.chart, &indicators, args.group_chart).write()?;
    info!("write chart {} done", args.chart);

    Ok(())
}

fn main() -> Result<(), Error> {
    //
    // cli arg
    let args = Args::parse();

    //
    // logger
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_default_env();
    builder.init();

    run(args).inspect_err(|error| error!("{}", error))
}
