//! Seed data: system category vocabulary and common-merchant mappings
//!
//! Gives a fresh database a head start: the category keyword tables drive
//! the rule engine, and the merchant list pre-populates the system-wide
//! mapping scope so common Indian merchants resolve on the first stage
//! without ever reaching the AI fallback. Both seeds are idempotent.

use tracing::info;

use crate::db::Database;
use crate::error::Result;

/// System categories with the keyword sets the rule engine scores against
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "FOOD",
        &[
            "swiggy", "zomato", "restaurant", "cafe", "pizza", "biryani", "dominos", "mcdonalds",
            "kfc", "eatery", "dhaba",
        ],
    ),
    (
        "GROCERIES",
        &[
            "bigbasket", "blinkit", "zepto", "jiomart", "dmart", "grocery", "supermarket",
            "kirana",
        ],
    ),
    (
        "TRANSPORT",
        &[
            "uber", "ola", "rapido", "fuel", "petrol", "diesel", "metro", "cab", "taxi", "fastag",
            "parking",
        ],
    ),
    (
        "SHOPPING",
        &["amazon", "flipkart", "myntra", "ajio", "nykaa", "meesho", "mall", "retail"],
    ),
    (
        "ENTERTAINMENT",
        &[
            "netflix", "hotstar", "spotify", "bookmyshow", "prime video", "movie", "cinema",
            "pvr", "inox",
        ],
    ),
    (
        "UTILITIES",
        &[
            "electricity", "recharge", "broadband", "airtel", "vodafone", "bsnl", "dth",
            "postpaid", "prepaid", "gas cylinder",
        ],
    ),
    (
        "HEALTHCARE",
        &["pharmacy", "hospital", "clinic", "apollo", "medplus", "1mg", "pharmeasy", "doctor"],
    ),
    (
        "EDUCATION",
        &["udemy", "coursera", "byjus", "unacademy", "school", "college", "tuition"],
    ),
    (
        "TRAVEL",
        &[
            "irctc", "makemytrip", "goibibo", "cleartrip", "indigo", "spicejet", "oyo", "airbnb",
            "flight", "hotel",
        ],
    ),
    ("RENT", &["rent", "nestaway", "nobroker", "landlord"]),
    (
        "INVESTMENT",
        &["zerodha", "groww", "upstox", "mutual fund", "sip", "dividend"],
    ),
    // Mostly produced by the income/transfer shortcuts and manual tagging
    ("INCOME", &["salary", "stipend"]),
    ("TRANSFER", &[]),
    ("OTHER", &[]),
];

/// Common Indian merchants with their category mappings
///
/// Seeded system-wide so new users start with working lookups for the
/// merchants that dominate real statements.
pub const COMMON_MERCHANTS: &[(&str, &str, f64)] = &[
    // FOOD & DINING
    ("swiggy", "FOOD", 1.0),
    ("zomato", "FOOD", 1.0),
    ("dominos", "FOOD", 1.0),
    ("mcdonalds", "FOOD", 1.0),
    ("kfc", "FOOD", 1.0),
    ("pizza hut", "FOOD", 1.0),
    ("burger king", "FOOD", 1.0),
    ("starbucks", "FOOD", 1.0),
    ("cafe coffee day", "FOOD", 1.0),
    ("haldirams", "FOOD", 0.95),
    ("wow momo", "FOOD", 0.95),
    // GROCERIES
    ("bigbasket", "GROCERIES", 1.0),
    ("blinkit", "GROCERIES", 1.0),
    ("zepto", "GROCERIES", 1.0),
    ("dunzo", "GROCERIES", 0.95),
    ("jiomart", "GROCERIES", 1.0),
    ("dmart", "GROCERIES", 1.0),
    ("reliance fresh", "GROCERIES", 1.0),
    // TRANSPORT
    ("uber", "TRANSPORT", 1.0),
    ("ola", "TRANSPORT", 1.0),
    ("rapido", "TRANSPORT", 1.0),
    ("indian oil", "TRANSPORT", 0.95),
    ("bharat petroleum", "TRANSPORT", 0.95),
    ("fastag", "TRANSPORT", 1.0),
    ("redbus", "TRANSPORT", 1.0),
    // SHOPPING
    ("amazon", "SHOPPING", 0.95),
    ("flipkart", "SHOPPING", 0.95),
    ("myntra", "SHOPPING", 1.0),
    ("ajio", "SHOPPING", 1.0),
    ("meesho", "SHOPPING", 0.95),
    ("nykaa", "SHOPPING", 1.0),
    ("croma", "SHOPPING", 1.0),
    ("reliance digital", "SHOPPING", 1.0),
    // ENTERTAINMENT
    ("netflix", "ENTERTAINMENT", 1.0),
    ("amazon prime", "ENTERTAINMENT", 1.0),
    ("hotstar", "ENTERTAINMENT", 1.0),
    ("spotify", "ENTERTAINMENT", 1.0),
    ("bookmyshow", "ENTERTAINMENT", 1.0),
    ("pvr cinemas", "ENTERTAINMENT", 1.0),
    ("inox", "ENTERTAINMENT", 1.0),
    // UTILITIES
    ("airtel", "UTILITIES", 1.0),
    ("jio", "UTILITIES", 1.0),
    ("vodafone", "UTILITIES", 1.0),
    ("bsnl", "UTILITIES", 1.0),
    ("tata sky", "UTILITIES", 1.0),
    ("electricity bill", "UTILITIES", 1.0),
    ("phonepe", "UTILITIES", 1.0),
    ("google pay", "UTILITIES", 1.0),
    ("paytm", "UTILITIES", 1.0),
    // HEALTHCARE
    ("apollo pharmacy", "HEALTHCARE", 1.0),
    ("medplus", "HEALTHCARE", 1.0),
    ("1mg", "HEALTHCARE", 1.0),
    ("pharmeasy", "HEALTHCARE", 1.0),
    ("netmeds", "HEALTHCARE", 1.0),
    ("practo", "HEALTHCARE", 1.0),
    // EDUCATION
    ("udemy", "EDUCATION", 1.0),
    ("coursera", "EDUCATION", 1.0),
    ("byjus", "EDUCATION", 1.0),
    ("unacademy", "EDUCATION", 1.0),
    // TRAVEL
    ("makemytrip", "TRAVEL", 1.0),
    ("goibibo", "TRAVEL", 1.0),
    ("cleartrip", "TRAVEL", 1.0),
    ("irctc", "TRAVEL", 1.0),
    ("indigo", "TRAVEL", 1.0),
    ("spicejet", "TRAVEL", 1.0),
    ("air india", "TRAVEL", 1.0),
    ("oyo", "TRAVEL", 1.0),
    ("airbnb", "TRAVEL", 1.0),
    // RENT
    ("nobroker", "RENT", 0.95),
    ("nestaway", "RENT", 0.95),
    // INVESTMENT
    ("zerodha", "INVESTMENT", 1.0),
    ("groww", "INVESTMENT", 1.0),
    ("upstox", "INVESTMENT", 1.0),
    ("paytm money", "INVESTMENT", 1.0),
];

/// Summary of a seeding run
#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub mappings_created: usize,
}

/// Seed the system category vocabulary; returns the number created
pub fn seed_categories(db: &Database) -> Result<usize> {
    let mut created = 0;
    for (name, keywords) in DEFAULT_CATEGORIES {
        if db.create_category(name, keywords, true, None)? {
            created += 1;
        }
    }
    Ok(created)
}

/// Seed the common-merchant mappings; returns the number inserted
pub fn seed_merchants(db: &Database) -> Result<usize> {
    db.seed_mappings(COMMON_MERCHANTS)
}

/// Seed categories and merchant mappings
///
/// Callers holding a `Categorizer` must invalidate its category cache
/// afterwards.
pub fn seed_all(db: &Database) -> Result<SeedSummary> {
    let categories_created = seed_categories(db)?;
    let mappings_created = seed_merchants(db)?;

    info!(
        categories = categories_created,
        mappings = mappings_created,
        "Seeding completed"
    );

    Ok(SeedSummary {
        categories_created,
        mappings_created,
    })
}
