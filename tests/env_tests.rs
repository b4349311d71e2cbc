//! Reads the real process environment, so everything runs in one test.

use redis_connect::{connect, Settings, DEFAULT_REDIS_URL};

#[test]
fn test_connect_reads_process_environment() {
    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // Unrelated variables that are not UTF-8 are skipped
        std::env::set_var("REDIS_CONNECT_TEST_BYTES", OsStr::from_bytes(b"\xff\xfe"));
    }

    std::env::set_var("REDIS_URL", "redis://cache-host:7000/1");

    let settings = Settings::from_env().unwrap();
    assert_eq!(settings.redis_url.as_deref(), Some("redis://cache-host:7000/1"));

    let conn = connect(None).unwrap();
    assert_eq!(conn.url(), "redis://cache-host:7000/1");
    assert_eq!(conn.db(), 1);

    let conn = connect(Some("   ")).unwrap();
    assert_eq!(conn.url(), "redis://cache-host:7000/1");

    let conn = connect(Some("redis://localhost:6380/2")).unwrap();
    assert_eq!(conn.url(), "redis://localhost:6380/2");

    std::env::remove_var("REDIS_URL");
    let conn = connect(Some("")).unwrap();
    assert_eq!(conn.url(), DEFAULT_REDIS_URL);
}
