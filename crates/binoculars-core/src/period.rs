//! 주기 문자열 파싱.
//!
//! 콜렉터의 `--query-period` 값은 단위 접미사 duration 문법을 따른다
//! (`"1h"`, `"90m"`, `"1h30m"`, `"1.5h"`, `"300ms"`).
//! 단위: ns, us(µs), ms, s, m, h. 음수 주기는 허용하지 않으며
//! 최댓값은 `i64::MAX` 나노초다.

use std::time::Duration;

use crate::error::CoreError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// 부호 있는 64비트 나노초 한계 (약 292년)
const MAX_NANOS: u128 = i64::MAX as u128;

/// 소수부 최대 유효 자릿수
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// 주기 문자열을 [`Duration`]으로 파싱
pub fn parse_period(input: &str) -> Result<Duration, CoreError> {
    let invalid = |reason: &str| CoreError::Config(format!("잘못된 주기 {input:?}: {reason}"));

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err(invalid("음수 주기"));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("빈 문자열"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| invalid("단위 누락"))?;
        let (number, tail) = rest.split_at(number_end);

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(|| invalid("알 수 없는 단위"))?;

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("숫자 누락"));
        }
        if fraction.contains('.') {
            return Err(invalid("소수점 중복"));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("범위 초과"))?
        };
        total = whole
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| invalid("범위 초과"))?;

        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits.parse().map_err(|_| invalid("잘못된 소수부"))?;
            let denominator = 10u128.pow(digits.len() as u32);
            total = total
                .checked_add(numerator * scale / denominator)
                .ok_or_else(|| invalid("범위 초과"))?;
        }

        rest = tail;
    }

    if total > MAX_NANOS {
        return Err(invalid("범위 초과"));
    }
    let nanos = u64::try_from(total).map_err(|_| invalid("범위 초과"))?;
    Ok(Duration::from_nanos(nanos))
}
