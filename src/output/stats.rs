//! Crawl statistics and the end-of-run summary

/// Counters accumulated over a single crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Listing pages fetched and parsed successfully
    pub pages_fetched: u32,

    /// Highest listing page number a request was issued for
    pub last_page_requested: u32,

    /// Candidates produced by the listing parser
    pub candidates_seen: u64,

    /// Candidates skipped because their name was already admitted
    pub duplicates_skipped: u64,

    /// Distinct names admitted over the run
    pub distinct_names: u64,

    /// Detail page requests issued
    pub detail_fetches: u64,

    /// Detail page requests that failed and were skipped
    pub detail_failures: u64,

    /// Non-empty records appended
    pub records: u64,

    /// Records carrying a real phone number
    pub phones_found: u64,

    /// Null placeholder rows appended
    pub placeholders: u64,

    /// Empty records past the placeholder band
    pub suppressed: u64,

    /// Completed fetches discarded because the run had already stopped
    pub discarded_after_stop: u64,
}

impl CrawlStatistics {
    /// Share of records with a real phone number, as a percentage
    pub fn phone_coverage(&self) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        self.phones_found as f64 * 100.0 / self.records as f64
    }
}

/// Prints the statistics in a human-readable block
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");
    println!("Listing pages fetched:   {}", stats.pages_fetched);
    println!("Last page requested:     {}", stats.last_page_requested);
    println!("Candidates seen:         {}", stats.candidates_seen);
    println!("Duplicates skipped:      {}", stats.duplicates_skipped);
    println!("Detail fetches:          {}", stats.detail_fetches);
    println!("Detail failures:         {}", stats.detail_failures);
    println!();
    println!("Records:                 {}", stats.records);
    println!(
        "  with phone number:     {} ({:.1}%)",
        stats.phones_found,
        stats.phone_coverage()
    );
    println!("Placeholder rows:        {}", stats.placeholders);
    println!("Suppressed empty rows:   {}", stats.suppressed);
    if stats.discarded_after_stop > 0 {
        println!("Discarded after stop:    {}", stats.discarded_after_stop);
    }
}
