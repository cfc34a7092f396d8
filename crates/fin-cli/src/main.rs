//! Command-line interface for fin-research
//!
//! # Usage
//!
//! ```bash
//! # Keys may also live in a .env file
//! export ALPHA_VANTAGE_API_KEY=...
//! export SERPER_API_KEY=...
//! export GEMINI_API_KEY=...
//!
//! cargo run -p fin-cli -- "Apple" --select 1 --output apple.md
//! ```

use anyhow::Context;
use clap::Parser;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use fin_llm::providers::GeminiProvider;
use fin_research::{
    Disambiguation, PipelineStart, ReportPipeline, ResearchConfig, ResearchError, ResolvedTicker,
    Stage, StageError, TickerCandidate,
};
use fin_utils::LogFormat;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "fin-research")]
#[command(about = "Generate a Markdown research report for a company", long_about = None)]
struct Args {
    /// Company name or ticker symbol
    query: String,

    /// Candidate to use (1-based) if the query matches several tickers
    #[arg(short, long)]
    select: Option<usize>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Matches listed when asking which company was meant
const MAX_LISTED: usize = 5;

fn candidates_table(candidates: &[TickerCandidate]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Symbol", "Name", "Type", "Region", "Currency", "Score"]);

    for (i, c) in candidates.iter().take(MAX_LISTED).enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            c.symbol.clone(),
            c.name.clone(),
            c.instrument_type.clone(),
            c.region.clone(),
            c.currency.clone(),
            format!("{:.2}", c.match_score),
        ]);
    }

    table
}

/// Ask on stdin which candidate to use. `None` means no answer was given.
fn prompt_selection(choice: &Disambiguation) -> io::Result<Option<String>> {
    let candidates = choice.candidates();
    println!(
        "'{}' matches several tickers:\n{}",
        choice.query(),
        candidates_table(candidates)
    );
    print!("Select a company [1-{}]: ", candidates.len().min(MAX_LISTED));
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        // EOF
        println!();
        return Ok(None);
    }

    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

/// Resolve a pending choice from `--select` or the terminal
fn choose(choice: &Disambiguation, preselected: Option<usize>) -> anyhow::Result<Option<ResolvedTicker>> {
    let index = match preselected {
        Some(index) => index,
        None => match prompt_selection(choice)? {
            Some(answer) => answer.parse::<usize>().map_err(|_| {
                ResearchError::InvalidInput(format!("'{answer}' is not a candidate number"))
            })?,
            None => return Ok(None),
        },
    };

    Ok(Some(choice.select(index)?))
}

fn halt(err: &StageError) -> ExitCode {
    tracing::debug!("{err:?}");
    eprintln!("{err}");
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    fin_utils::load_dotenv();
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    fin_utils::init_tracing_with(format, "warn,fin_research=info");

    let config = ResearchConfig::from_env()?;
    let gemini_key = config
        .gemini_api_key
        .clone()
        .context("GEMINI_API_KEY is required but not set")?;
    let llm = Arc::new(GeminiProvider::new(gemini_key)?);
    let pipeline = ReportPipeline::from_config(&config, llm)?;

    let ticker = match pipeline.begin(&args.query).await {
        Ok(PipelineStart::Ready(ticker)) => ticker,
        Ok(PipelineStart::AwaitingSelection(choice)) => match choose(&choice, args.select) {
            Ok(Some(ticker)) => ticker,
            Ok(None) => {
                println!("No company selected. Run again with --select N to continue.");
                return Ok(ExitCode::SUCCESS);
            }
            Err(e) => match e.downcast::<ResearchError>() {
                Ok(source) => return Ok(halt(&StageError::new(Stage::TickerResolution, source))),
                Err(e) => return Err(e),
            },
        },
        Err(e) => return Ok(halt(&e)),
    };

    tracing::info!("Researching {}", ticker);

    let report = match pipeline.run(&ticker).await {
        Ok(report) => report,
        Err(e) => return Ok(halt(&e)),
    };

    let markdown = report.to_markdown();
    match &args.output {
        Some(path) => {
            std::fs::write(path, &markdown)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{markdown}"),
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "fin-research",
            "Apple",
            "--select",
            "2",
            "--output",
            "apple.md",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(args.query, "Apple");
        assert_eq!(args.select, Some(2));
        assert_eq!(args.output, Some(PathBuf::from("apple.md")));
        assert!(args.json_logs);
    }

    #[test]
    fn test_candidates_table_lists_top_matches() {
        let candidates: Vec<TickerCandidate> = ["AAPL", "APLE", "APLD", "APLT", "APLS", "APLM"]
            .iter()
            .map(|symbol| TickerCandidate {
                symbol: (*symbol).to_string(),
                name: format!("{symbol} Inc"),
                region: "United States".to_string(),
                instrument_type: "Equity".to_string(),
                currency: "USD".to_string(),
                match_score: 0.5,
            })
            .collect();

        let rendered = candidates_table(&candidates).to_string();
        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("APLS"));
        assert!(!rendered.contains("APLM"));
    }

    #[test]
    fn test_query_required() {
        assert!(Args::try_parse_from(["fin-research"]).is_err());
    }
}
