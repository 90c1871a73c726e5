// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 抓取文本解析工具
//!
//! 把站点上展示用的时长、播放量字符串转换为数值。
//! 所有函数都与区域设置无关，解析失败时返回 0 而不是错误。

/// 解析时长字符串，返回秒数
///
/// 支持 `"12:34"`、`"1:23:45"`、`"45"`、`"10 min"`、`"1h 5m 3s"` 等格式。
/// 无法识别的输入返回 0。
pub fn parse_duration(input: &str) -> i64 {
    let text = input.trim();
    if text.is_empty() {
        return 0;
    }

    if text.contains(':') {
        return parse_clock_duration(text);
    }

    if let Ok(seconds) = text.parse::<i64>() {
        return seconds.max(0);
    }

    parse_unit_duration(text)
}

fn parse_clock_duration(text: &str) -> i64 {
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return 0;
    }

    let mut total: i64 = 0;
    for part in parts {
        match part.parse::<i64>() {
            Ok(value) if value >= 0 => {
                match total.checked_mul(60).and_then(|t| t.checked_add(value)) {
                    Some(next) => total = next,
                    None => return 0,
                }
            }
            _ => return 0,
        }
    }
    total
}

fn parse_unit_duration(text: &str) -> i64 {
    let lowered = text.to_ascii_lowercase();
    let mut total: i64 = 0;
    let mut number = String::new();
    let mut matched = false;
    let mut chars = lowered.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if c.is_whitespace() {
            continue;
        }

        let mut unit = String::from(c);
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphabetic() {
                unit.push(next);
                chars.next();
            } else {
                break;
            }
        }

        let Ok(value) = number.parse::<i64>() else {
            return 0;
        };
        number.clear();

        let multiplier = match unit.as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
            "m" | "min" | "mins" | "minute" | "minutes" => 60,
            "s" | "sec" | "secs" | "second" | "seconds" => 1,
            _ => return 0,
        };
        match value
            .checked_mul(multiplier)
            .and_then(|v| total.checked_add(v))
        {
            Some(next) => total = next,
            None => return 0,
        }
        matched = true;
    }

    if !number.is_empty() || !matched {
        return 0;
    }
    total
}

/// 解析播放量字符串
///
/// 支持 `"1.2M"`、`"500K"`、`"3B"`、`"1,234"`、`"987 views"` 等格式，失败返回 0。
pub fn parse_views(input: &str) -> i64 {
    let mut text = input.trim().to_ascii_lowercase();
    for suffix in ["views", "view"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped.trim_end().to_string();
            break;
        }
    }
    if text.is_empty() {
        return 0;
    }

    let (number, multiplier) = match text.chars().last() {
        Some('k') => (&text[..text.len() - 1], 1_000f64),
        Some('m') => (&text[..text.len() - 1], 1_000_000f64),
        Some('b') => (&text[..text.len() - 1], 1_000_000_000f64),
        _ => (text.as_str(), 1f64),
    };

    let cleaned: String = number
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_' && *c != ' ')
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * multiplier).round() as i64,
        _ => 0,
    }
}

/// 把秒数格式化为 `m:ss` 或 `h:mm:ss`
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return String::new();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
