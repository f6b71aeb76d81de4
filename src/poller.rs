use std::{
    sync::{mpsc::RecvTimeoutError, Arc, Condvar, Mutex, PoisonError},
    time::Duration,
};

use rand::{thread_rng, Rng};

use crate::{
    flag_source::{refresh_store, FlagSource},
    flag_store::FlagStore,
    Error, Result,
};

/// Settings for [`PollerThread`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between two refreshes. A random jitter of up to a tenth of it is added.
    pub interval: Duration,
}

impl PollerConfig {
    /// Default delay between refreshes.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            interval: Self::DEFAULT_INTERVAL,
        }
    }
}

/// A flag refresh poller thread.
///
/// Use [`Client::start_poller_thread`](crate::Client::start_poller_thread) to get an instance of
/// it.
pub struct PollerThread {
    join_handle: std::thread::JoinHandle<()>,

    /// Used to send a stop command to the poller thread.
    stop_sender: std::sync::mpsc::Sender<()>,

    /// Holds `None` until the first refresh cycle finishes, then the outcome of that cycle.
    /// Later successes overwrite a failure with `Some(Ok(()))`, and an `Unauthorized` response
    /// always overwrites since it stops the thread.
    result: Arc<(Mutex<Option<Result<()>>>, Condvar)>,
}

impl PollerThread {
    pub(crate) fn start(
        store: Arc<FlagStore>,
        source: Box<dyn FlagSource>,
        config: PollerConfig,
    ) -> Result<PollerThread> {
        let (stop_sender, stop_receiver) = std::sync::mpsc::channel::<()>();

        let result = Arc::new((Mutex::new(None), Condvar::new()));

        let join_handle = {
            // Cloning Arc for move into thread
            let result = Arc::clone(&result);
            let update_result = move |value: Result<()>, overwrite: bool| {
                let mut slot = result.0.lock().unwrap_or_else(PoisonError::into_inner);
                if overwrite || slot.is_none() {
                    *slot = Some(value);
                    result.1.notify_all();
                }
            };

            std::thread::Builder::new()
                .name("flagset-poller".to_owned())
                .spawn(move || loop {
                    match refresh_store(&store, &*source) {
                        Ok(_) => update_result(Ok(()), true),
                        Err(Error::Unauthorized) => {
                            update_result(Err(Error::Unauthorized), true);
                            // Credentials won't fix themselves. Stop the poller thread.
                            return;
                        }
                        Err(err) => {
                            // Keep serving the current flags, we'll try again later.
                            log::warn!(target: "flagset", "error while refreshing feature flags: {:?}", err);
                            update_result(Err(err), false);
                        }
                    }

                    let timeout = jitter(config.interval, config.interval / 10);
                    match stop_receiver.recv_timeout(timeout) {
                        Err(RecvTimeoutError::Timeout) => {
                            // Timed out. Loop to refresh flags.
                        }
                        Ok(()) => {
                            log::debug!(target: "flagset", "poller thread received stop command");
                            return;
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            // When the other end of channel disconnects, calls to
                            // .recv_timeout() return immediately. Use normal thread sleep in
                            // this case.
                            std::thread::sleep(timeout);
                        }
                    }
                })?
        };

        Ok(PollerThread {
            join_handle,
            stop_sender,
            result,
        })
    }

    /// Block until the first refresh cycle finishes and return its outcome.
    ///
    /// A failed first cycle returns its error right away. The thread keeps polling, so the store
    /// may still be refreshed later on (except after [`Error::Unauthorized`], which stops it).
    pub fn wait_for_first_refresh(&self) -> Result<()> {
        let mut lock = self
            .result
            .0
            .lock()
            .map_err(|_| Error::PollerThreadPanicked)?;
        loop {
            match &*lock {
                Some(result) => return result.clone(),
                None => {
                    lock = self
                        .result
                        .1
                        .wait(lock)
                        .map_err(|_| Error::PollerThreadPanicked)?;
                }
            }
        }
    }

    /// Stop the poller thread.
    ///
    /// This function does not wait for the thread to actually stop.
    pub fn stop(&self) {
        // Error means that the receiver was dropped (thread exited). Ignoring it as there's nothing
        // useful we can do.
        let _ = self.stop_sender.send(());
    }

    /// Stop the poller thread and block waiting for it to exit.
    ///
    /// If you don't need to wait for the thread to exit, use [`PollerThread::stop`] instead.
    pub fn shutdown(self) -> Result<()> {
        self.stop();

        self.join_handle
            .join()
            .map_err(|_| Error::PollerThreadPanicked)?;

        Ok(())
    }
}

/// Apply a random jitter to `interval`.
fn jitter(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval;
    }
    interval + thread_rng().gen_range(Duration::ZERO..jitter)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    };

    use crate::{
        flag_source::{FileFlagSource, FlagSource, StaticFlagSource},
        flag_store::FlagStore,
        flags::{FeatureFlag, FlagSet},
        Error, Result,
    };

    use super::{jitter, PollerConfig, PollerThread};

    struct UnauthorizedSource;
    impl FlagSource for UnauthorizedSource {
        fn fetch(&self) -> Result<Vec<FeatureFlag>> {
            Err(Error::Unauthorized)
        }
    }

    /// Fails the first `failures` fetches, then serves a single flag.
    struct FlakySource {
        calls: AtomicUsize,
        failures: usize,
    }
    impl FlagSource for FlakySource {
        fn fetch(&self) -> Result<Vec<FeatureFlag>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "source unavailable").into())
            } else {
                Ok(vec![FeatureFlag::new("recovered")])
            }
        }
    }

    fn fast() -> PollerConfig {
        PollerConfig::default().interval(Duration::from_millis(10))
    }

    #[test]
    fn refreshes_store_from_source() {
        let store = Arc::new(FlagStore::new(FlagSet::defaults()));
        let poller = PollerThread::start(
            store.clone(),
            Box::new(StaticFlagSource(vec![FeatureFlag::new("remote")])),
            fast(),
        )
        .unwrap();

        poller.wait_for_first_refresh().unwrap();
        assert!(store.get("remote").is_some());
        assert!(store.get("beta_features").is_none());

        poller.shutdown().unwrap();
    }

    #[test]
    fn keeps_polling_after_failures() {
        let store = Arc::new(FlagStore::new(FlagSet::defaults()));
        let poller = PollerThread::start(
            store.clone(),
            Box::new(FlakySource {
                calls: AtomicUsize::new(0),
                failures: 2,
            }),
            fast(),
        )
        .unwrap();

        assert!(matches!(poller.wait_for_first_refresh(), Err(Error::Io(_))));

        // a later successful refresh replaces the first cycle's error
        let deadline = Instant::now() + Duration::from_secs(5);
        while poller.wait_for_first_refresh().is_err() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        poller.wait_for_first_refresh().unwrap();
        assert!(store.get("recovered").is_some());

        poller.shutdown().unwrap();
    }

    #[test]
    fn first_failure_does_not_block_waiters() {
        let store = Arc::new(FlagStore::new(FlagSet::defaults()));
        let poller = PollerThread::start(
            store.clone(),
            Box::new(FileFlagSource::new("tests/data/does-not-exist.json")),
            PollerConfig::default().interval(Duration::from_secs(60)),
        )
        .unwrap();

        assert!(matches!(poller.wait_for_first_refresh(), Err(Error::Io(_))));
        // the current flags keep being served
        assert_eq!(store.snapshot().len(), 3);

        poller.shutdown().unwrap();
    }

    #[test]
    fn stops_on_unauthorized() {
        let store = Arc::new(FlagStore::new(FlagSet::defaults()));
        let poller =
            PollerThread::start(store.clone(), Box::new(UnauthorizedSource), fast()).unwrap();

        assert!(matches!(
            poller.wait_for_first_refresh(),
            Err(Error::Unauthorized)
        ));
        // flags stay untouched
        assert_eq!(store.snapshot().len(), 3);

        poller.shutdown().unwrap();
    }

    #[test]
    fn jitter_stays_in_range() {
        let interval = Duration::from_secs(60);
        for _ in 0..100 {
            let d = jitter(interval, Duration::from_secs(6));
            assert!(d >= interval && d < interval + Duration::from_secs(6));
        }
        assert_eq!(jitter(interval, Duration::ZERO), interval);
    }
}
