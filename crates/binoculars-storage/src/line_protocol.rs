//! InfluxDB line protocol 인코더.
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp_ns`

use binoculars_core::models::point::{FieldValue, Point};
use std::fmt::Write;

/// 측정 이름 이스케이프 (쉼표, 공백, 개행)
fn escape_measurement(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            ',' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}

/// 태그 키/값, 필드 키 이스케이프 (쉼표, 등호, 공백, 개행)
fn escape_key(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            ',' | '=' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}

fn write_field_value(value: &FieldValue, out: &mut String) {
    match value {
        FieldValue::Float(v) => {
            let _ = write!(out, "{v}");
        }
        FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        FieldValue::String(v) => {
            out.push('"');
            for c in v.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
}

/// 포인트 1개를 한 줄로 인코딩 (개행 미포함)
pub fn encode_point(point: &Point, out: &mut String) {
    escape_measurement(&point.measurement, out);

    for (key, value) in &point.tags {
        out.push(',');
        escape_key(key, out);
        out.push('=');
        escape_key(value, out);
    }

    out.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        escape_key(key, out);
        out.push('=');
        write_field_value(value, out);
    }

    if let Some(nanos) = point.timestamp.timestamp_nanos_opt() {
        let _ = write!(out, " {nanos}");
    }
}

/// 여러 포인트를 개행으로 구분해 인코딩
pub fn encode_points(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 96);
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        encode_point(point, &mut out);
    }
    out
}
