use std::sync::{Mutex, MutexGuard};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_guard() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// # Safety
/// Callers must hold `env_guard()` so env mutations do not race.
unsafe fn clear_store_env() {
    unsafe {
        std::env::remove_var("REPLY_START_DELAY_MS");
        std::env::remove_var("REPLY_TICK_MS");
        std::env::remove_var("CHAT_TITLE_MAX_CHARS");
        std::env::remove_var("NOTIFY_CHANNEL_CAPACITY");
        std::env::remove_var("SEED_DEMO_DATA");
    }
}

#[test]
fn from_env_and_default_agree() {
    let _guard = env_guard();
    unsafe { clear_store_env() };

    let cfg = StoreConfig::from_env();
    assert_eq!(cfg, StoreConfig::default());
    assert_eq!(cfg.reply_start_delay, Duration::from_millis(500));
    assert_eq!(cfg.reply_tick, Duration::from_millis(80));
    assert_eq!(cfg.chat_title_max_chars, 30);
    assert_eq!(cfg.notify_channel_capacity, 256);
    assert!(cfg.seed_demo_data);
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_guard();
    unsafe {
        clear_store_env();
        std::env::set_var("REPLY_START_DELAY_MS", "10");
        std::env::set_var("REPLY_TICK_MS", "2");
        std::env::set_var("CHAT_TITLE_MAX_CHARS", "12");
        std::env::set_var("NOTIFY_CHANNEL_CAPACITY", "0");
        std::env::set_var("SEED_DEMO_DATA", "false");
    }

    let cfg = StoreConfig::from_env();
    assert_eq!(cfg.reply_start_delay, Duration::from_millis(10));
    assert_eq!(cfg.reply_tick, Duration::from_millis(2));
    assert_eq!(cfg.chat_title_max_chars, 12);
    assert_eq!(cfg.notify_channel_capacity, 1);
    assert!(!cfg.seed_demo_data);

    unsafe { clear_store_env() };
}

#[test]
fn from_env_ignores_unparseable_values() {
    let _guard = env_guard();
    unsafe {
        clear_store_env();
        std::env::set_var("REPLY_TICK_MS", "fast");
        std::env::set_var("SEED_DEMO_DATA", "yes");
    }

    let cfg = StoreConfig::from_env();
    assert_eq!(cfg.reply_tick, Duration::from_millis(DEFAULT_REPLY_TICK_MS));
    assert!(cfg.seed_demo_data);

    unsafe { clear_store_env() };
}

#[test]
fn for_tests_keeps_title_limit_and_skips_seed() {
    let cfg = StoreConfig::for_tests();
    assert!(cfg.reply_tick < Duration::from_millis(DEFAULT_REPLY_TICK_MS));
    assert_eq!(cfg.chat_title_max_chars, DEFAULT_CHAT_TITLE_MAX_CHARS);
    assert!(!cfg.seed_demo_data);
}
