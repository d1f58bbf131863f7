//! Process-wide embedded PostgreSQL cluster for integration tests.
//!
//! `pg-embed-setup-unpriv` keeps one cluster alive for the lifetime of the
//! test binary. Startup races between binaries surface as transient errors,
//! so the handle lookup retries a few times before giving up.

use std::time::Duration;

use pg_embedded_setup_unpriv::{BootstrapResult, ClusterHandle};

const SHARED_CLUSTER_RETRIES: usize = 5;
const SHARED_CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);
const EMBEDDED_TEST_PASSWORD: &str = "votes_embedded_test";

/// Return the shared cluster handle, retrying transient bootstrap failures.
pub fn shared_cluster_handle() -> BootstrapResult<&'static ClusterHandle> {
    ensure_stable_password();
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt >= SHARED_CLUSTER_RETRIES => return Err(error),
            Err(error) => {
                eprintln!(
                    "pg-embed: attempt {attempt}/{SHARED_CLUSTER_RETRIES} failed, retrying: {error:?}"
                );
                std::thread::sleep(SHARED_CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

/// Pin `PG_PASSWORD` so a reused data directory keeps accepting logins.
///
/// The embedded settings otherwise generate a fresh password per process
/// while `initdb` only runs once per data directory.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster bootstrap spawns any threads.
        unsafe {
            std::env::set_var("PG_PASSWORD", EMBEDDED_TEST_PASSWORD);
        }
    }
}
