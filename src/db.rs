use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Connections kept for history capture, apart from the query pool.
const CAPTURE_POOL_SIZE: u32 = 4;

/// Pool shared by the HTTP query layer.
pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .expect("Failed to create database connection pool")
}

/// Small pool for the capture hooks. Checkout waits at most
/// `checkout_timeout`, so an exhausted pool cannot stall a business write.
pub fn create_capture_pool(
    database_url: &str,
    checkout_timeout: Duration,
) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(CAPTURE_POOL_SIZE)
        .min_idle(Some(1))
        .connection_timeout(checkout_timeout)
        .build(manager)
}
