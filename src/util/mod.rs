//! util: общие мелкие хелперы.
//!
//! Содержит:
//! - env_bool()/env_parse(): чтение ENV с мягким fallback на дефолт.
//! - parse_triplet(): разбор "x,y,z".
//! - lock_recover(): захват Mutex с восстановлением после poisoning
//!   (паника внутри задачи очереди не должна «отравлять» хост и кэш навсегда).

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// "1|true|on|yes" => Some(true), "0|false|off|no" => Some(false), иначе None.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

pub fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_bool(&v))
}

pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
}

/// Разобрать "x,y,z" (пробелы допускаются).
pub fn parse_triplet(s: &str) -> Option<(i32, i32, i32)> {
    let mut it = s.split(',').map(|p| p.trim().parse::<i32>());
    let x = it.next()?.ok()?;
    let y = it.next()?.ok()?;
    let z = it.next()?.ok()?;
    if it.next().is_some() {
        return None;
    }
    Some((x, y, z))
}

#[inline]
pub fn lock_recover<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
