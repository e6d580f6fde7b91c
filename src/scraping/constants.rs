// thirtyfour (webdriver) inputs
pub const DEFAULT_BOOKING_URL: &str = "https://calendar.google.com/calendar/appointments/schedules/AcZssZ1N1ExrZA16pettGJBFNzDAUjYvxr4vwtXSD4VsdvhTy81VLXrBiEhIluJX-8E3w9RBbD3fRBhJ?ctz=America/New_York";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 775;

// chrome flags for running inside a constrained container
pub const CHROME_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-default-apps",
    "--no-first-run",
    "--no-zygote",
    "--mute-audio",
    "--disable-background-networking",
    "--disable-features=Translate,BackForwardCache",
];

// timings
pub const SCRAPE_TIMEOUT_SECS: u64 = 30;
pub const SCRAPE_CACHE_TTL_SECS: u64 = 5 * 60;
pub const NAVIGATION_TIMEOUT_MS: u64 = 8_000;
pub const READY_WAIT_MS: u64 = 5_000;
pub const READY_POLL_MS: u64 = 250;
pub const SETTLE_DELAY_MS: u64 = 2_000;
pub const PAGE_CLOSE_TIMEOUT_MS: u64 = 2_000;

// selectors on the booking page
pub const READY_SELECTOR: &str = "[data-date], [role='grid'], [role='listbox']";
pub const DATE_ATTRIBUTE: &str = "data-date";
pub const SELECTED_DAY_SELECTOR: &str = ".selected, [aria-selected='true'], .DPvwYc";
pub const TIME_ATTRIBUTES: &[&str] = &["aria-label", "data-time", "datetime"];

// normalization
pub const INFERRED_BUSINESS_DAYS: usize = 5;
pub const INFERRED_HORIZON_DAYS: i64 = 10;
pub const EARLIEST_PLAUSIBLE_HOUR: u32 = 7;
pub const LATEST_PLAUSIBLE_HOUR: u32 = 21;
