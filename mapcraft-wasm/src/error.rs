use crate::interop::obj;
use mapcraft::MapError;
use wasm_bindgen::JsValue;

pub fn ok(v: JsValue) -> JsValue {
    obj(&[("ok", true.into()), ("value", v)])
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let e = obj(&[
        ("code", code.into()),
        ("message", JsValue::from_str(&message.into())),
        ("data", data.unwrap_or(JsValue::UNDEFINED)),
    ]);
    obj(&[("ok", false.into()), ("error", e)])
}

pub fn from_map_error(e: &MapError) -> JsValue {
    let data = match e {
        MapError::Limit { what, max } => Some(obj(&[("what", (*what).into()), ("max", (*max as f64).into())])),
        MapError::NonFinite(param) => Some(obj(&[("param", (*param).into())])),
        _ => None,
    };
    err(e.code(), e.to_string(), data)
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    err("non_finite", format!("parameter '{}' must be finite", param), Some(obj(&[("param", param.into())])))
}

#[inline]
pub fn out_of_range(param: &str, min: f32, max: f32, got: f32) -> JsValue {
    let d = obj(&[
        ("param", param.into()),
        ("min", (min as f64).into()),
        ("max", (max as f64).into()),
        ("got", (got as f64).into()),
    ]);
    err("out_of_range", format!("parameter '{}' out of range", param), Some(d))
}

#[inline]
pub fn invalid_id(kind: &str, id: u32) -> JsValue {
    let d = obj(&[("kind", kind.into()), ("id", (id as f64).into())]);
    err("invalid_id", format!("invalid {} id", kind), Some(d))
}

#[inline]
pub fn invalid_tool(name: &str, mode: Option<&str>) -> JsValue {
    let d = obj(&[("name", name.into()), ("mode", mode.map_or(JsValue::UNDEFINED, JsValue::from_str))]);
    err("invalid_tool", "tool must be select, draw, polygon, rect, ellipse, connected or connect(straight|freehand)", Some(d))
}

#[inline]
pub fn parse_error(message: impl Into<String>) -> JsValue { err("parse_error", message, None) }
