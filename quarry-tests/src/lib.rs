mod crud;
mod errors;
mod mock;
mod queries;
mod records;
mod resolution;
mod single_flight;

pub use mock::*;
pub use records::*;

use crate::{
    crud::{crud, delete_list, upserts},
    errors::errors,
    queries::{dynamic_maps, queries, relation_queries},
    resolution::{caching, missing_table, resolution},
    single_flight::single_flight,
};
#[cfg(not(feature = "disable-sequences"))]
use crud::sequences;
use log::LevelFilter;
use quarry::Dialect;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario against the in-memory shop catalog.
pub async fn execute_tests(dialect: impl Dialect + 'static) {
    let dialect: Arc<dyn Dialect> = Arc::new(dialect);
    resolution(dialect.clone()).await;
    caching(dialect.clone()).await;
    missing_table(dialect.clone()).await;
    single_flight(dialect.clone()).await;
    crud(dialect.clone()).await;
    upserts(dialect.clone()).await;
    delete_list(dialect.clone()).await;
    #[cfg(not(feature = "disable-sequences"))]
    sequences(dialect.clone()).await;
    queries(dialect.clone()).await;
    relation_queries(dialect.clone()).await;
    dynamic_maps(dialect.clone()).await;
    errors(dialect).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
