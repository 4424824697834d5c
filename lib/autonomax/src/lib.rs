use std::path::Path;
use fnv::{FnvHashMap, FnvHashSet};

pub mod model;
pub mod solver;
pub mod solution;
pub mod report;

pub use instances::dataset::autonomax::{AutonomaxInstance, City, Edge, Distance, Demand, normalize};

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;


mod logging_setup {
    use super::*;
    use anyhow::{Context, Result};
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let p = p.as_ref();
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p)
                    .with_context(|| format!("unable to open log file {:?}", p))?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.try_init().context("global subscriber already set")?; }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.try_init().context("global subscriber already set")?; }
                None
            }
        };
        Ok(flush_guard)
    }

    /// Log to stderr, filtered by `RUST_LOG`, and optionally as JSON lines to `logfile`.
    /// The returned guard must be held until the program exits.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> Result<Option<WorkerGuard>> {
        build_and_set_global_subscriber(logfile, false)
    }

    #[allow(dead_code)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        build_and_set_global_subscriber(logfile, true).ok().flatten()
    }
}
pub use logging_setup::*;
