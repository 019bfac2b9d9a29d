// properties table setup and sample listings

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::Error;
use crate::core::db::{Db, Dialect};

pub const LOCATIONS: &[&str] = &[
    "Dubai Marina",
    "Downtown Dubai",
    "Palm Jumeirah",
    "Dubai Hills Estate",
    "Business Bay",
    "Jumeirah Village Circle",
    "Arabian Ranches",
    "Emirates Hills",
    "Jumeirah Beach Residence",
    "Dubai Creek Harbour",
    "Al Furjan",
    "Meydan",
    "Dubai South",
    "Dubai Silicon Oasis",
    "Al Barsha",
    "Dubai Sports City",
    "Motor City",
    "Jumeirah Lake Towers",
    "Dubai Investment Park",
];

pub const POSSESSIONS: &[&str] = &[
    "Ready",
    "Q1 2026",
    "Q2 2026",
    "Q3 2026",
    "Under Construction",
    "Q4 2025",
];

const BATCH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    Villa,
    Townhouse,
    Penthouse,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Apartment,
        PropertyType::Villa,
        PropertyType::Townhouse,
        PropertyType::Penthouse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::Villa => "Villa",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::Penthouse => "Penthouse",
        }
    }

    // (bedrooms, price in AED) ranges, inclusive
    fn ranges(self) -> ((i32, i32), (i64, i64)) {
        match self {
            PropertyType::Villa => ((4, 7), (7_000_000, 65_000_000)),
            PropertyType::Penthouse => ((3, 6), (9_000_000, 50_000_000)),
            PropertyType::Townhouse => ((3, 5), (2_800_000, 14_000_000)),
            PropertyType::Apartment => ((1, 4), (800_000, 18_000_000)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub location: &'static str,
    pub price: i64,
    pub kind: PropertyType,
    pub bedrooms: i32,
    pub available: bool,
    pub possession: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub existing: i64,
    pub inserted: usize,
}

/// Hand-picked listings inserted ahead of the random ones.
pub fn showcase() -> Vec<Listing> {
    use PropertyType::*;

    let rows: [(&'static str, i64, PropertyType, i32, bool, &'static str); 15] = [
        ("Dubai Marina", 2_450_000, Apartment, 2, true, "Ready"),
        ("Downtown Dubai", 3_800_000, Apartment, 1, true, "Ready"),
        ("Business Bay", 1_850_000, Apartment, 1, true, "Q4 2025"),
        ("Jumeirah Village Circle", 1_380_000, Apartment, 2, false, "Q2 2026"),
        ("Dubai Hills Estate", 3_100_000, Apartment, 3, true, "Ready"),
        ("Palm Jumeirah", 5_900_000, Apartment, 2, true, "Ready"),
        ("Downtown Dubai", 14_500_000, Penthouse, 3, true, "Ready"),
        ("Dubai Marina", 18_000_000, Penthouse, 4, false, "Q1 2026"),
        ("Palm Jumeirah", 32_000_000, Villa, 5, true, "Ready"),
        ("Emirates Hills", 48_000_000, Villa, 6, true, "Ready"),
        ("Arabian Ranches", 9_800_000, Villa, 4, true, "Under Construction"),
        ("Dubai Hills Estate", 15_200_000, Villa, 5, false, "Q3 2026"),
        ("Dubai Hills Estate", 4_350_000, Townhouse, 3, true, "Ready"),
        ("Arabian Ranches", 5_100_000, Townhouse, 4, true, "Q1 2026"),
        ("Jumeirah Village Circle", 3_200_000, Townhouse, 3, false, "Q4 2025"),
    ];

    rows.into_iter()
        .map(|(location, price, kind, bedrooms, available, possession)| Listing {
            location,
            price,
            kind,
            bedrooms,
            available,
            possession,
        })
        .collect()
}

/// One random listing with type-appropriate bedrooms and price.
pub fn random_listing<R: Rng>(rng: &mut R) -> Listing {
    let kind = PropertyType::ALL[rng.gen_range(0..PropertyType::ALL.len())];
    let ((min_bed, max_bed), (min_price, max_price)) = kind.ranges();

    let price = rng.gen_range(min_price..=max_price);

    Listing {
        location: LOCATIONS.choose(rng).copied().unwrap_or(LOCATIONS[0]),
        price: round_price(price),
        kind,
        bedrooms: rng.gen_range(min_bed..=max_bed),
        available: rng.gen_bool(0.8),
        possession: POSSESSIONS.choose(rng).copied().unwrap_or(POSSESSIONS[0]),
    }
}

/// `count` listings: the showcase first, then random ones.
pub fn listings(count: usize, rng_seed: Option<u64>) -> Vec<Listing> {
    let mut rng = match rng_seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut out: Vec<Listing> = showcase().into_iter().take(count).collect();
    while out.len() < count {
        out.push(random_listing(&mut rng));
    }
    out
}

// nearest 50k, so prices read like real asking prices
fn round_price(price: i64) -> i64 {
    ((price + 25_000) / 50_000) * 50_000
}

pub async fn ensure_table(db: &Db) -> Result<(), Error> {
    sqlx::query(create_table_sql(db.dialect()))
        .execute(db.pool())
        .await?;
    Ok(())
}

pub async fn count(db: &Db) -> Result<i64, Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM properties")
        .fetch_one(db.pool())
        .await?;
    Ok(n)
}

/// Create the table and fill it with `rows` listings unless it is mostly full.
pub async fn populate(
    db: &Db,
    rows: usize,
    force: bool,
    rng_seed: Option<u64>,
) -> Result<SeedReport, Error> {
    ensure_table(db).await?;

    let existing = count(db).await?;
    let threshold = (rows as i64 * 4) / 5;

    if !force && existing > 0 && existing >= threshold {
        info!(existing, "properties table already populated, skipping sample data");
        return Ok(SeedReport {
            existing,
            inserted: 0,
        });
    }

    info!(rows, "generating sample properties");
    let listings = listings(rows, rng_seed);

    let mut tx = db.pool().begin().await?;
    for chunk in listings.chunks(BATCH) {
        sqlx::query(&insert_sql(chunk))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!(inserted = listings.len(), "sample properties inserted");

    Ok(SeedReport {
        existing,
        inserted: listings.len(),
    })
}

fn create_table_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => {
            r#"CREATE TABLE IF NOT EXISTS properties (
                id          SERIAL PRIMARY KEY,
                location    TEXT NOT NULL,
                price       BIGINT NOT NULL,
                type        TEXT NOT NULL,
                bedrooms    INTEGER NOT NULL,
                available   BOOLEAN NOT NULL,
                possession  TEXT NOT NULL
            )"#
        }
        Dialect::Sqlite => {
            r#"CREATE TABLE IF NOT EXISTS properties (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                location    TEXT NOT NULL,
                price       BIGINT NOT NULL,
                type        TEXT NOT NULL,
                bedrooms    INTEGER NOT NULL,
                available   BOOLEAN NOT NULL,
                possession  TEXT NOT NULL
            )"#
        }
        Dialect::Mysql => {
            r#"CREATE TABLE IF NOT EXISTS properties (
                id          INT AUTO_INCREMENT PRIMARY KEY,
                location    VARCHAR(128) NOT NULL,
                price       BIGINT NOT NULL,
                type        VARCHAR(32) NOT NULL,
                bedrooms    INT NOT NULL,
                available   BOOLEAN NOT NULL,
                possession  VARCHAR(32) NOT NULL
            )"#
        }
    }
}

// values are generated here, never user input; quoting still escapes
fn insert_sql(rows: &[Listing]) -> String {
    let values: Vec<String> = rows
        .iter()
        .map(|l| {
            format!(
                "({}, {}, {}, {}, {}, {})",
                quote(l.location),
                l.price,
                quote(l.kind.name()),
                l.bedrooms,
                if l.available { "TRUE" } else { "FALSE" },
                quote(l.possession),
            )
        })
        .collect();

    format!(
        "INSERT INTO properties (location, price, type, bedrooms, available, possession) VALUES {}",
        values.join(", ")
    )
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
