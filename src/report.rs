use crate::models::{ListingExtras, PriceRecord};
use crate::pipeline::SearchOutcome;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

/// The `n` cheapest records, keeping supplied order among equal prices
pub fn top_deals(records: &[PriceRecord], n: usize) -> Vec<PriceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));
    sorted.truncate(n);
    sorted
}

fn rule(out: &mut String) {
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
}

fn write_extras(out: &mut String, extras: &ListingExtras) {
    if let Some(rating) = extras.rating.filter(|r| *r > 0.0) {
        match extras.review_count {
            Some(reviews) => {
                let _ = writeln!(out, "   ⭐ Rating: {rating:.1} ({reviews} reviews)");
            }
            None => {
                let _ = writeln!(out, "   ⭐ Rating: {rating:.1}");
            }
        }
    }
    if let Some(condition) = extras.condition.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "   📦 Status: {condition}");
    }
}

fn write_record(out: &mut String, rank: usize, record: &PriceRecord, extras: Option<&ListingExtras>) {
    let _ = writeln!(out, "{rank}. {}", record.title);
    let _ = writeln!(out, "   💰 Price: ${:.2}", record.price);
    let _ = writeln!(out, "   🏪 Website: {}", record.source);
    if let Some(extras) = extras {
        write_extras(out, extras);
    }
    let _ = writeln!(out, "   🔗 URL: {}", record.url);
    rule(out);
}

/// Every result of a search, cheapest first
pub fn render_results(outcome: &SearchOutcome) -> String {
    let mut out = String::new();

    for failure in &outcome.failures {
        let _ = writeln!(out, "⚠️  Could not search {}", failure);
    }

    if outcome.records.is_empty() {
        out.push_str("❌ No products found with valid prices.\n");
        return out;
    }

    out.push_str("\n🎯 Search Results:\n");
    rule(&mut out);
    for (i, record) in outcome.records.iter().enumerate() {
        write_record(&mut out, i + 1, record, outcome.extras.get(&record.url));
    }
    out
}

/// The best deals, as returned by [`top_deals`]
pub fn render_deals(deals: &[PriceRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🏆 Top {} Best Deals:", deals.len());
    rule(&mut out);
    for (i, record) in deals.iter().enumerate() {
        write_record(&mut out, i + 1, record, None);
    }
    out
}

/// Stored observations for a search term, oldest first
pub fn render_history(term: &str, records: &[PriceRecord]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        let _ = writeln!(out, "❌ No price history found for '{term}'");
        return out;
    }

    let _ = writeln!(out, "\n📊 Price History for '{term}':");
    rule(&mut out);
    for record in records {
        let _ = writeln!(out, "🏪 Website: {}", record.source);
        let _ = writeln!(out, "📦 Product: {}", record.title);
        let _ = writeln!(out, "💰 Price: ${:.2}", record.price);
        let _ = writeln!(
            out,
            "📅 Date: {}",
            record.observed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "🔗 URL: {}", record.url);
        rule(&mut out);
    }
    out
}
