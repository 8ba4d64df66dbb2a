//! Sample data for an empty store.
//!
//! Runs once during startup, before the listener is bound. The emptiness
//! check and the inserts are not atomic: two instances starting against the
//! same empty database can both seed it.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::{Rng, distr::Alphanumeric};
use sales_analytics_storage::{SalesData, SalesStore, StoreResult};

pub const COUNTRIES: [&str; 5] = ["Canada", "US", "Mexico", "Germany", "France"];

/// Records generated by [`SeedMode::Random`] when no count is configured
pub const DEFAULT_SEED_COUNT: usize = 100;

const DESCRIPTION_LEN: usize = 7;
const MAX_TOTAL: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    Off,
    /// One fixed record
    Fixture,
    /// `count` randomly generated records
    Random { count: usize },
}

impl SeedMode {
    pub fn parse(mode: &str, count: usize) -> Option<Self> {
        match mode.to_ascii_lowercase().as_str() {
            "off" | "none" | "false" => Some(SeedMode::Off),
            "fixture" => Some(SeedMode::Fixture),
            "random" => Some(SeedMode::Random { count }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Disabled,
    /// The store already held data
    Skipped { existing: u64 },
    Inserted { count: usize },
}

/// Earliest date a random sale can carry
pub fn seed_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn fixture() -> SalesData {
    SalesData::new(
        Some("this is a sample data".to_string()),
        seed_epoch(),
        "Canada",
        100.0,
    )
}

/// `count` sales with uniformly random country, integer total in `[0, 1000)`
/// and date in `[seed_epoch(), now)`.
pub fn random_sales<R: Rng>(rng: &mut R, count: usize, now: DateTime<Utc>) -> Vec<SalesData> {
    let epoch = seed_epoch();
    let span_ms = (now - epoch).num_milliseconds().max(1);

    (0..count)
        .map(|_| {
            let description: String = (0..DESCRIPTION_LEN)
                .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
                .collect();
            let country = COUNTRIES[rng.random_range(0..COUNTRIES.len())];
            let total = f64::from(rng.random_range(0..MAX_TOTAL));
            let date = epoch + TimeDelta::milliseconds(rng.random_range(0..span_ms));

            SalesData::new(Some(description), date, country, total)
        })
        .collect()
}

fn records_for(mode: SeedMode) -> Vec<SalesData> {
    match mode {
        SeedMode::Off => Vec::new(),
        SeedMode::Fixture => vec![fixture()],
        SeedMode::Random { count } => random_sales(&mut rand::rng(), count, Utc::now()),
    }
}

/// Insert sample data if the store is empty. Every insert is awaited; the
/// first failure is returned and nothing after it is attempted.
pub async fn seed_if_empty(store: &dyn SalesStore, mode: SeedMode) -> StoreResult<SeedOutcome> {
    if mode == SeedMode::Off {
        tracing::info!("Seeding disabled");
        return Ok(SeedOutcome::Disabled);
    }

    let existing = store.count(None).await?;
    if existing != 0 {
        tracing::info!(existing, "Store already holds sales records, skipping seed");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let records = records_for(mode);
    let count = records.len();
    for data in records {
        store.create(data).await?;
    }

    metrics::counter!("sales_seeded_records_total").increment(count as u64);
    tracing::info!(count, ?mode, "Seeded sales store");

    Ok(SeedOutcome::Inserted { count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use sales_analytics_storage::MemorySalesStore;

    #[test]
    fn random_sales_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();

        let sales = random_sales(&mut rng, 500, now);

        assert_eq!(sales.len(), 500);
        for sale in &sales {
            assert!(COUNTRIES.contains(&sale.country.as_str()));
            assert!((0.0..1000.0).contains(&sale.total));
            assert_eq!(sale.total.fract(), 0.0);
            assert!(sale.date >= seed_epoch() && sale.date < now);

            let description = sale.description.as_deref().unwrap();
            assert_eq!(description.len(), DESCRIPTION_LEN);
            assert!(
                description
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
            );
        }
    }

    #[test]
    fn parses_modes() {
        assert_eq!(SeedMode::parse("RANDOM", 5), Some(SeedMode::Random { count: 5 }));
        assert_eq!(SeedMode::parse("fixture", 5), Some(SeedMode::Fixture));
        assert_eq!(SeedMode::parse("off", 5), Some(SeedMode::Off));
        assert_eq!(SeedMode::parse("sometimes", 5), None);
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let store = MemorySalesStore::new();
        let mode = SeedMode::Random { count: 25 };

        let first = seed_if_empty(&store, mode).await.unwrap();
        let second = seed_if_empty(&store, mode).await.unwrap();

        assert_eq!(first, SeedOutcome::Inserted { count: 25 });
        assert_eq!(second, SeedOutcome::Skipped { existing: 25 });
        assert_eq!(store.len(), 25);
    }

    #[tokio::test]
    async fn fixture_seeds_one_record() {
        let store = MemorySalesStore::new();

        seed_if_empty(&store, SeedMode::Fixture).await.unwrap();

        let stored = store.find_by_id(1).await.unwrap();
        assert_eq!(SalesData::from(stored), fixture());
    }

    #[tokio::test]
    async fn disabled_mode_leaves_store_empty() {
        let store = MemorySalesStore::new();
        assert_eq!(
            seed_if_empty(&store, SeedMode::Off).await.unwrap(),
            SeedOutcome::Disabled
        );
        assert!(store.is_empty());
    }
}
