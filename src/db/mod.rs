pub mod candidates;
pub mod dashboard;
pub mod interests;
pub mod matches;
pub mod messages;
pub mod needs;
pub mod teams;
pub mod users;
pub mod wrestlers;

pub use candidates::*;
pub use dashboard::*;
pub use interests::*;
pub use matches::*;
pub use messages::*;
pub use needs::*;
pub use teams::*;
pub use users::*;
pub use wrestlers::*;

use sqlx::{Pool, Sqlite, Transaction};

use crate::error::AppError;

/// Opens a transaction that already holds the database write lock. Reads
/// that decide a later write go through this, so two writers queue on the
/// busy timeout instead of one failing when it tries to upgrade its lock.
pub(crate) async fn begin_write(
    pool: &Pool<Sqlite>,
) -> Result<Transaction<'static, Sqlite>, AppError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
