/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Table-level queries live in `crate::models`; the `crate::store::postgres`
/// backend stitches them together into the operations the ledgers need.

pub mod migrations;
pub mod pool;
