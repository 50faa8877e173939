//! Integration test harness
//!
//! Each module drives full crawls against wiremock servers.

mod crawl_tests;
