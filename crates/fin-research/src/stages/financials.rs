//! Financial statement analysis: ratios from the latest annual period plus a narrative

use crate::api::MarketData;
use crate::cache::{CacheKey, TtlCache};
use crate::error::{Result, ResearchError};
use crate::model::{
    FinancialAnalysis, FinancialStatementSet, KeyFigure, Metric, Narrative, RatioReport,
    ResolvedTicker, line_items,
};
use crate::narrative::{NarrativeGenerator, NarrativeRequest};
use crate::report::{format_amount, ratio_lines};
use std::sync::Arc;

/// Headline figures shown next to the ratios: (label, statement selector, line item)
const KEY_FIGURES: [(&str, StatementKind, &str); 5] = [
    ("Total revenue", StatementKind::Income, line_items::TOTAL_REVENUE),
    ("Net income", StatementKind::Income, line_items::NET_INCOME),
    ("Total liabilities", StatementKind::Balance, line_items::TOTAL_LIABILITIES),
    ("Shareholder equity", StatementKind::Balance, line_items::TOTAL_SHAREHOLDER_EQUITY),
    ("Operating cash flow", StatementKind::CashFlow, line_items::OPERATING_CASHFLOW),
];

#[derive(Debug, Clone, Copy)]
enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

fn lookup(
    statements: &FinancialStatementSet,
    kind: StatementKind,
    item: &str,
    period: &str,
) -> Option<f64> {
    let statement = match kind {
        StatementKind::Income => &statements.income_statement,
        StatementKind::Balance => &statements.balance_sheet,
        StatementKind::CashFlow => &statements.cash_flow,
    };
    statement.value(item, period)
}

/// Compute the standard ratios for one fiscal period
///
/// A missing, non-finite or zero input makes only the affected ratio unavailable.
pub fn compute_ratios(statements: &FinancialStatementSet, period: &str) -> RatioReport {
    let income = |item| lookup(statements, StatementKind::Income, item, period);
    let balance = |item| lookup(statements, StatementKind::Balance, item, period);

    let revenue = income(line_items::TOTAL_REVENUE);
    let gross_profit = match (revenue, income(line_items::COST_OF_REVENUE)) {
        (Some(revenue), Some(cost)) => Some(revenue - cost),
        _ => income(line_items::GROSS_PROFIT),
    };

    RatioReport {
        gross_margin: Metric::ratio(gross_profit, revenue),
        net_margin: Metric::ratio(income(line_items::NET_INCOME), revenue),
        debt_to_equity: Metric::ratio(
            balance(line_items::TOTAL_LIABILITIES),
            balance(line_items::TOTAL_SHAREHOLDER_EQUITY),
        ),
        current_ratio: Metric::ratio(
            balance(line_items::TOTAL_CURRENT_ASSETS),
            balance(line_items::TOTAL_CURRENT_LIABILITIES),
        ),
    }
}

fn key_figures(statements: &FinancialStatementSet, period: &str) -> Vec<KeyFigure> {
    KEY_FIGURES
        .iter()
        .filter_map(|&(label, kind, item)| {
            lookup(statements, kind, item, period).map(|value| KeyFigure {
                label: label.to_string(),
                value,
            })
        })
        .collect()
}

/// Retrieves annual statements and explains them
pub struct FinancialAnalyzer {
    market: Arc<dyn MarketData>,
    cache: TtlCache,
    narrator: Arc<dyn NarrativeGenerator>,
}

impl FinancialAnalyzer {
    pub fn new(
        market: Arc<dyn MarketData>,
        cache: TtlCache,
        narrator: Arc<dyn NarrativeGenerator>,
    ) -> Self {
        Self {
            market,
            cache,
            narrator,
        }
    }

    /// Statements, ratios and narrative for a ticker
    ///
    /// Only missing statement data fails the stage. A narrative that cannot be
    /// generated is marked unavailable and the figures are kept.
    pub async fn analyze_financials(
        &self,
        ticker: &ResolvedTicker,
        company: &str,
    ) -> Result<FinancialAnalysis> {
        let symbol = ticker.symbol.as_str();

        let statements: FinancialStatementSet = self
            .cache
            .get_or_fetch(CacheKey::new("annual_statements", symbol), || {
                self.market.annual_statements(symbol)
            })
            .await?;

        let Some(period) = statements.latest_period().map(str::to_string) else {
            return Err(ResearchError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no annual statement data".to_string(),
            });
        };

        let ratios = compute_ratios(&statements, &period);
        let key_figures = key_figures(&statements, &period);

        let figures = ratio_lines(&ratios)
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .chain(
                key_figures
                    .iter()
                    .map(|f| format!("{}: {}", f.label, format_amount(f.value))),
            )
            .collect();

        let request = NarrativeRequest::FinancialSummary {
            company: company.to_string(),
            symbol: symbol.to_string(),
            period: period.clone(),
            figures,
        };
        let narrative = match self.narrator.generate(&request).await {
            Ok(text) => Narrative::Written { text },
            Err(e) => {
                tracing::warn!(%symbol, "Financial narrative unavailable: {}", e);
                Narrative::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Ok(FinancialAnalysis {
            statements,
            period,
            ratios,
            key_figures,
            narrative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::model::Statement;
    use crate::testing::{FakeMarketData, FakeNarrator, statements};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const PERIOD: &str = "2023-09-30";

    fn assert_close(metric: Metric, expected: f64) {
        let value = metric.value().unwrap();
        assert!((value - expected).abs() < 1e-9, "{value} != {expected}");
    }

    #[test]
    fn test_compute_ratios() {
        let ratios = compute_ratios(&statements(), PERIOD);
        assert_close(ratios.gross_margin, 0.45);
        assert_close(ratios.net_margin, 0.25);
        assert_close(ratios.debt_to_equity, 5.0);
        assert_close(ratios.current_ratio, 1.25);
    }

    #[test]
    fn test_zero_revenue_makes_margins_unavailable() {
        let mut set = statements();
        set.income_statement.insert(line_items::TOTAL_REVENUE, PERIOD, 0.0);

        let ratios = compute_ratios(&set, PERIOD);
        assert_eq!(ratios.gross_margin, Metric::Unavailable);
        assert_eq!(ratios.net_margin, Metric::Unavailable);
        assert!(ratios.debt_to_equity.is_available());
        assert!(ratios.current_ratio.is_available());
    }

    #[test]
    fn test_missing_equity_only_affects_debt_to_equity() {
        let mut set = statements();
        set.balance_sheet = Statement::default();
        set.balance_sheet.insert(line_items::TOTAL_LIABILITIES, PERIOD, 300.0e9);
        set.balance_sheet.insert(line_items::TOTAL_CURRENT_ASSETS, PERIOD, 150.0e9);
        set.balance_sheet.insert(line_items::TOTAL_CURRENT_LIABILITIES, PERIOD, 120.0e9);

        let ratios = compute_ratios(&set, PERIOD);
        assert_eq!(ratios.debt_to_equity, Metric::Unavailable);
        assert!(ratios.gross_margin.is_available());
        assert!(ratios.net_margin.is_available());
        assert!(ratios.current_ratio.is_available());
    }

    #[test]
    fn test_gross_profit_fallback() {
        let mut set = FinancialStatementSet::default();
        set.income_statement.insert(line_items::TOTAL_REVENUE, PERIOD, 200.0);
        set.income_statement.insert(line_items::GROSS_PROFIT, PERIOD, 50.0);

        let ratios = compute_ratios(&set, PERIOD);
        assert_close(ratios.gross_margin, 0.25);
        assert_eq!(ratios.net_margin, Metric::Unavailable);
    }

    #[test]
    fn test_only_latest_period_used() {
        let set = statements();
        // 2022 has revenue but nothing else
        let ratios = compute_ratios(&set, "2022-09-30");
        assert_eq!(ratios.net_margin, Metric::Unavailable);
        assert_eq!(set.latest_period(), Some(PERIOD));
    }

    fn analyzer(market: Arc<FakeMarketData>, narrator: Arc<FakeNarrator>) -> FinancialAnalyzer {
        let cache = TtlCache::new(Duration::from_secs(1800), Arc::new(ManualClock::new()));
        FinancialAnalyzer::new(market, cache, narrator)
    }

    #[tokio::test]
    async fn test_analyze_financials() {
        let market = Arc::new(FakeMarketData::healthy("AAPL", "Apple Inc"));
        let narrator = Arc::new(FakeNarrator::new("neutral"));
        let analyzer = analyzer(market.clone(), narrator.clone());
        let ticker = ResolvedTicker::new("AAPL");

        let analysis = analyzer.analyze_financials(&ticker, "Apple Inc").await.unwrap();
        assert_eq!(analysis.period, PERIOD);
        assert_eq!(
            analysis.narrative.text(),
            Some("Apple Inc is solidly profitable.")
        );
        assert_eq!(analysis.key_figures.len(), 5);
        assert_eq!(analysis.key_figures[0].label, "Total revenue");

        let requests = narrator.requests.lock().unwrap();
        let NarrativeRequest::FinancialSummary { figures, .. } = &requests[0] else {
            panic!("Expected a financial summary request");
        };
        assert!(figures.contains(&"Gross margin: 45.00%".to_string()));
        assert!(figures.contains(&"Total revenue: $400.00B".to_string()));
        drop(requests);

        analyzer.analyze_financials(&ticker, "Apple Inc").await.unwrap();
        assert_eq!(market.statement_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_newer_cash_flow_period_keeps_ratios() {
        let mut market = FakeMarketData::healthy("AAPL", "Apple Inc");
        let mut set = statements();
        set.cash_flow.insert(line_items::OPERATING_CASHFLOW, "2024-09-30", 118.0e9);
        market.statements = Some(set);
        let narrator = Arc::new(FakeNarrator::new("neutral"));
        let analyzer = analyzer(Arc::new(market), narrator);

        let analysis = analyzer
            .analyze_financials(&ResolvedTicker::new("AAPL"), "Apple Inc")
            .await
            .unwrap();
        assert_eq!(analysis.period, PERIOD);
        assert_close(analysis.ratios.gross_margin, 0.45);
        assert_close(analysis.ratios.net_margin, 0.25);
        assert_close(analysis.ratios.debt_to_equity, 5.0);
        assert_close(analysis.ratios.current_ratio, 1.25);
    }

    #[tokio::test]
    async fn test_narrative_failure_keeps_figures() {
        let market = Arc::new(FakeMarketData::healthy("AAPL", "Apple Inc"));
        let narrator = Arc::new(FakeNarrator::new("neutral").failing_on("financial_summary"));
        let analyzer = analyzer(market, narrator);

        let analysis = analyzer
            .analyze_financials(&ResolvedTicker::new("AAPL"), "Apple Inc")
            .await
            .unwrap();
        assert_close(analysis.ratios.gross_margin, 0.45);
        assert_eq!(analysis.key_figures.len(), 5);
        match analysis.narrative {
            Narrative::Unavailable { reason } => assert!(reason.contains("language model")),
            other => panic!("Expected an unavailable narrative, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_statement_data() {
        let mut market = FakeMarketData::healthy("SHELL", "Shell Co");
        market.statements = Some(FinancialStatementSet::default());
        let narrator = Arc::new(FakeNarrator::new("neutral"));
        let analyzer = analyzer(Arc::new(market), narrator.clone());

        let result = analyzer
            .analyze_financials(&ResolvedTicker::new("SHELL"), "Shell Co")
            .await;
        assert!(matches!(result, Err(ResearchError::DataUnavailable { .. })));
        assert_eq!(narrator.count("financial_summary"), 0);
    }
}
