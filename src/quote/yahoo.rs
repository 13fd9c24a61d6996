use super::{Quote, Requester};
use crate::alias::DateTime;
use crate::error::Error;

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new_marketdata(format!("not json format : {error}"))
    }
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    meta: YahooChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn make_time(timestamp: i64) -> Option<DateTime> {
    chrono::DateTime::from_timestamp(timestamp, 0)
}

/// Latest close of the day, or the regular market price when no close is published yet.
fn parse_quote(ticker: &str, body: &str) -> Result<Quote, Error> {
    let request_result: YahooResult = serde_json::from_str(body)?;
    if let Some(error) = request_result.chart.error {
        return Err(Error::new_marketdata(format!(
            "yahoo error on ticker:{ticker} code:{} description:{}",
            error.code, error.description
        )));
    }
    let result = request_result
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| Error::new_marketdata(format!("no result for ticker:{ticker}")))?;

    let last_close = result.indicators.quote.first().and_then(|quote| {
        quote
            .close
            .iter()
            .enumerate()
            .rev()
            .find_map(|(position, close)| close.map(|close| (position, close)))
    });

    match last_close {
        Some((position, close)) => Ok(Quote::new(
            ticker,
            close,
            result.timestamp.get(position).copied().and_then(make_time),
        )),
        None => {
            let price = result.meta.regular_market_price.ok_or_else(|| {
                Error::new_marketdata(format!("no price available for ticker:{ticker}"))
            })?;
            Ok(Quote::new(
                ticker,
                price,
                result.meta.regular_market_time.and_then(make_time),
            ))
        }
    }
}

pub struct YahooRequester {
    reqwest_client: Client,
}

impl YahooRequester {
    pub fn new() -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Expires", HeaderValue::from_static("-1"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        headers.insert("User-Agent", HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/54.0.2840.99 Safari/537.36"));

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|error| Error::new_marketdata(format!("failed to init reqwest : {error}")))?;

        Ok(Self {
            reqwest_client: client,
        })
    }

    fn request_data(&self, ticker: &str) -> Result<String, Error> {
        let url = make_url(ticker)?;
        debug!("request data from url {}", url);
        let output = self
            .reqwest_client
            .get(url)
            .send()
            .map_err(|error| {
                Error::new_marketdata(format!("failed to request ticker:{ticker} error:{error}"))
            })?
            .text()
            .map_err(|error| {
                Error::new_marketdata(format!(
                    "failed to read body from request ticker:{ticker} error:{error}"
                ))
            })?;
        debug!("request result: {}", output);
        Ok(output)
    }
}

/// Chart url of the last trading day, the ticker being one percent-encoded path segment.
fn make_url(ticker: &str) -> Result<Url, Error> {
    let mut url = Url::parse(CHART_URL)
        .map_err(|error| Error::new_marketdata(format!("invalid chart url : {error}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::new_marketdata(format!("cannot build chart url for {ticker}")))?
        .pop_if_empty()
        .push(ticker);
    url.query_pairs_mut()
        .append_pair("range", "1d")
        .append_pair("interval", "1d");
    Ok(url)
}

impl Requester for YahooRequester {
    fn request(&self, ticker: &str) -> Result<Quote, Error> {
        info!("try to request quote for {}", ticker);
        let body = self.request_data(ticker)?;
        let quote = parse_quote(ticker, &body)?;
        info!("request quote for {} done", ticker);
        Ok(quote)
    }
}
