mod batches;
mod caching;
mod concurrency;
mod products;
mod relations;
mod transactions;
mod validation;

use crate::{
    batches::batches,
    caching::caching,
    concurrency::concurrency,
    products::{product_queries, products},
    relations::relations,
    validation::validation,
};
use log::LevelFilter;
use quarry::{Connection, Session};
use std::env;
#[cfg(not(feature = "disable-transactions"))]
use transactions::transactions;

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

/// Runs every scenario on one session over `connection`.
pub async fn execute_tests<C: Connection>(connection: C) {
    let mut session = Session::new(connection);
    products(&mut session).await;
    product_queries(&mut session).await;
    concurrency(&mut session).await;
    batches(&mut session).await;
    relations(&mut session).await;
    #[cfg(not(feature = "disable-transactions"))]
    transactions(&mut session).await;
    caching(&mut session).await;
    validation(&mut session).await;
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
