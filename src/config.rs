//! Application-level configuration constants.

use log::LevelFilter;

// Logging
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

// Offline cache
pub const CACHE_GENERATION: &str = "portfolio-v2";
pub const SERVICE_WORKER_SCRIPT: &str = "/sw.js";
pub const FALLBACK_DOCUMENT: &str = "/index.html";
pub const CONTACT_SYNC_TAG: &str = "sync-contact-form";

/// Assets fetched and stored when a new cache generation installs.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/assets/css/style.css",
    "/portfolio.js",
    "/portfolio_bg.wasm",
    "/assets/img/avatar.png",
    "/assets/img/profile.png",
    "https://fonts.googleapis.com/css2?family=Google+Sans:wght@300;400;500;700&display=swap",
    "https://fonts.googleapis.com/css2?family=Material+Symbols+Outlined:wght@300;400;500;700",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css",
];

/// Third-party origins whose responses may be cached alongside our own.
pub const TRUSTED_ORIGINS: &[&str] = &[
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
    "https://cdnjs.cloudflare.com",
];

// Particle field
pub const PARTICLE_COUNT: usize = 150;
pub const PARTICLE_MIN_RADIUS: f64 = 2.0;
pub const PARTICLE_MAX_RADIUS: f64 = 6.0;
pub const PARTICLE_DRIFT: f64 = 0.25;
pub const PARTICLE_MIN_START_OPACITY: f64 = 0.3;
pub const PARTICLE_FADE_RATE: f64 = 0.005;
pub const PARTICLE_MIN_DENSITY: f64 = 5.0;
pub const PARTICLE_MAX_DENSITY: f64 = 25.0;
pub const PARTICLE_PALETTE: &[&str] = &[
    "#3186FF", "#00A1E0", "#032D60", "#FFE432", "#FBBC04", "#00B95C",
];

pub const POINTER_EASE: f64 = 0.05;
pub const INTERACTION_RADIUS: f64 = 150.0;
pub const PUSH_SCALE: f64 = 0.5;
pub const WRAP_MARGIN: f64 = 10.0;
pub const MIN_OPACITY: f64 = 0.2;
pub const MAX_OPACITY: f64 = 1.0;

pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

// Local storage keys
pub const THEME_STORAGE_KEY: &str = "theme";
pub const VISITS_STORAGE_KEY: &str = "portfolio_visits";

// Stat counters
pub const COUNTER_DURATION_MS: u32 = 2000;
pub const COUNTER_TICK_MS: u32 = 16;

/// (label, target) pairs shown in the stats strip.
pub const STAT_COUNTERS: &[(&str, i64)] = &[
    ("Years of experience", 5),
    ("Projects delivered", 42),
    ("Certifications", 12),
    ("Cups of coffee", 1800),
];
