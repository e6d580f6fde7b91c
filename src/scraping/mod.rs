pub mod browser;
pub mod constants;
pub mod normalize;
pub mod scraper;
pub mod strategies;
pub mod time_parse;
