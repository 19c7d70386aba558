//! Terminal rendering for the CLI.

use colored::{ColoredString, Colorize};

use crate::models::{
    AnalysisResult, MarketSnapshot, MarketTrend, Sentiment, SentimentAnalysis, TradeDirection,
};

/// Sub-dollar prices get 4 decimals, everything else thousands separators.
pub fn format_price(price: f64) -> String {
    if price < 1.0 {
        return format!("${price:.4}");
    }

    let fixed = format!("{price:.2}");
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("${grouped}.{fraction}")
}

pub fn format_change(change: f64) -> ColoredString {
    let text = format!("{change:.2}%");
    if change >= 0.0 {
        text.green()
    } else {
        text.red()
    }
}

fn direction_label(direction: TradeDirection) -> ColoredString {
    let text = direction.to_string();
    match direction {
        TradeDirection::Long => text.green().bold(),
        TradeDirection::Short => text.red().bold(),
        TradeDirection::Wait => text.yellow().bold(),
    }
}

fn sentiment_label(sentiment: Sentiment) -> ColoredString {
    let text = sentiment.to_string();
    match sentiment {
        Sentiment::Bullish => text.green().bold(),
        Sentiment::Bearish => text.red().bold(),
        Sentiment::Neutral => text.dimmed(),
    }
}

pub fn print_analysis(token: &str, result: &AnalysisResult) {
    println!("\n📈 Signal for {}", token.to_uppercase().bold());
    println!("==========================");
    println!("Direction:   {}", direction_label(result.direction));
    println!("Confidence:  {}", result.confidence);
    println!("Trend:       {}", result.trend);
    println!("Entry:       {}", result.entry_price);
    println!("Target:      {}", result.target_price);
    println!("PnL:         {}", result.pnl_projection);
    println!("\n💡 Rationale:\n{}", result.rationale);
}

pub fn print_market(snapshot: &MarketSnapshot) {
    let trend = match snapshot.trend {
        MarketTrend::Bullish => snapshot.trend.to_string().green().bold(),
        MarketTrend::Bearish => snapshot.trend.to_string().red().bold(),
    };

    println!(
        "\n📊 Market Monitor [{}]  {} Up / {} Down  (excl. stables, {})",
        trend,
        snapshot.up_count.to_string().green(),
        snapshot.down_count.to_string().red(),
        snapshot.updated_at.format("%H:%M:%S UTC")
    );

    if snapshot.is_empty() {
        println!("   No market data available.");
        return;
    }

    println!("{:<8} {:>16} {:>10}", "ASSET", "PRICE", "24H %");
    for coin in &snapshot.coins {
        let price = coin
            .current_price
            .map(format_price)
            .unwrap_or_else(|| "-".to_string());
        let change = coin.price_change_percentage_24h.unwrap_or_default();
        println!(
            "{:<8} {:>16} {:>10}",
            coin.symbol.to_uppercase(),
            price,
            format_change(change)
        );
    }
}

pub fn print_sentiment(analysis: &SentimentAnalysis) {
    println!("\n🎭 Current sentiment: {}", sentiment_label(analysis.sentiment));
    println!("\"{}\"", analysis.summary.italic());

    if !analysis.sources.is_empty() {
        println!("\nGrounded sources:");
        for (i, source) in analysis.sources.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, source.title, source.uri.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_are_grouped_or_precise() {
        assert_eq!(format_price(0.123456), "$0.1235");
        assert_eq!(format_price(1.5), "$1.50");
        assert_eq!(format_price(182.4), "$182.40");
        assert_eq!(format_price(97_123.456), "$97,123.46");
        assert_eq!(format_price(1_234_567.0), "$1,234,567.00");
    }
}
